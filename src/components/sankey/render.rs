use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::format::format_capacity;
use super::layout::{LinkBand, NodeBox};
use super::state::SankeyState;

const BACKGROUND: &str = "#1a1a2e";
const LABEL_FONT: &str = "12px sans-serif";

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

pub fn render(state: &SankeyState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	draw_links(state, ctx);
	draw_nodes(state, ctx);
}

fn draw_links(state: &SankeyState, ctx: &CanvasRenderingContext2d) {
	let (has_highlight, t) = (
		state.has_active_highlight(),
		ease_out_cubic(state.hover.level),
	);

	for band in state.layout.links.iter().filter(|band| !band.hidden) {
		let highlighted =
			has_highlight && state.is_highlighted(band.source) && state.is_highlighted(band.target);
		// t=0: every band at 0.35, t=1: highlighted at 0.6, others at 0.1
		let alpha = match (has_highlight, highlighted) {
			(false, _) => 0.35,
			(true, true) => 0.35 + 0.25 * t,
			(true, false) => 0.35 - 0.25 * t,
		};
		ctx.set_global_alpha(alpha);
		ctx.set_fill_style_str(state.color_for(band.branch));
		trace_band(band, ctx);
		ctx.fill();
	}
	ctx.set_global_alpha(1.0);
}

fn trace_band(band: &LinkBand, ctx: &CanvasRenderingContext2d) {
	let mid = (band.x0 + band.x1) / 2.0;
	let (y0_bottom, y1_bottom) = (band.y0 + band.thickness, band.y1 + band.thickness);
	ctx.begin_path();
	ctx.move_to(band.x0, band.y0);
	ctx.bezier_curve_to(mid, band.y0, mid, band.y1, band.x1, band.y1);
	ctx.line_to(band.x1, y1_bottom);
	ctx.bezier_curve_to(mid, y1_bottom, mid, y0_bottom, band.x0, y0_bottom);
	ctx.close_path();
}

fn draw_nodes(state: &SankeyState, ctx: &CanvasRenderingContext2d) {
	let (has_highlight, t) = (
		state.has_active_highlight(),
		ease_out_cubic(state.hover.level),
	);
	ctx.set_font(LABEL_FONT);
	ctx.set_text_baseline("middle");

	for node in &state.layout.nodes {
		if node.hidden {
			if state.is_hovered(node.index) {
				draw_stub_hint(node, t, ctx);
			}
			continue;
		}
		let dimmed = has_highlight && !state.is_highlighted(node.index);
		let alpha = if dimmed { 1.0 - 0.6 * t } else { 1.0 };

		ctx.set_global_alpha(alpha);
		ctx.set_fill_style_str(state.color_for(node.branch));
		ctx.fill_rect(node.x, node.y, node.width, node.height);

		if state.is_hovered(node.index) && t > 0.01 {
			ctx.set_stroke_style_str(&format!("rgba(255, 255, 255, {})", 0.8 * t));
			ctx.set_line_width(1.5);
			ctx.stroke_rect(node.x - 1.0, node.y - 1.0, node.width + 2.0, node.height + 2.0);
		}

		if let Some(flow) = state.graph.node(node.index) {
			ctx.set_fill_style_str(&format!("rgba(255, 255, 255, {})", alpha * 0.9));
			let label = format!("{} · {}", flow.name, format_capacity(flow.capacity()));
			let _ = ctx.fill_text(&label, node.x + node.width + 6.0, node.center_y());
		}
	}
	ctx.set_global_alpha(1.0);
}

// Collapsed branches end in an invisible stub; on hover, outline it so the
// user can see there is something to expand.
fn draw_stub_hint(node: &NodeBox, t: f64, ctx: &CanvasRenderingContext2d) {
	let dash = js_sys::Array::of2(&JsValue::from_f64(3.0), &JsValue::from_f64(3.0));
	let _ = ctx.set_line_dash(&dash);
	ctx.set_stroke_style_str(&format!("rgba(255, 255, 255, {})", 0.6 * t));
	ctx.set_line_width(1.0);
	ctx.stroke_rect(node.x, node.y - 4.0, node.width, node.height + 8.0);
	let _ = ctx.set_line_dash(&js_sys::Array::new());

	ctx.set_fill_style_str(&format!("rgba(255, 255, 255, {})", 0.7 * t));
	let _ = ctx.fill_text("click to expand", node.x + node.width + 6.0, node.center_y());
}
