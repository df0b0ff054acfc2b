use std::collections::HashSet;

use crate::flow::FlowGraph;

use super::layout::{self, SankeyLayout};

const COLORS: &[&str] = &[
	"#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
	"#bcbd22", "#17becf",
];

pub const ROOT_COLOR: &str = "#64b4ff";
// Hidden stubs are a couple of pixels tall; give the pointer some room.
pub const HIT_SLOP: f64 = 6.0;

// Seconds for a highlight to reach full strength, and to drain away.
const FADE_IN_SECS: f64 = 0.12;
const FADE_OUT_SECS: f64 = 0.25;

/// The node under the pointer, plus the one it just left while that fades.
#[derive(Clone, Debug, Default)]
pub struct HoverState {
	pub node: Option<usize>,
	/// Parent and children of `node`.
	pub neighbors: HashSet<usize>,
	/// Highlight strength in `[0, 1]`.
	pub level: f64,
	fading: Option<(usize, HashSet<usize>)>,
}

pub struct SankeyState {
	pub graph: FlowGraph,
	pub layout: SankeyLayout,
	pub hover: HoverState,
	pub width: f64,
	pub height: f64,
	/// Set whenever something visible changed outside the hover animation.
	pub needs_redraw: bool,
}

impl SankeyState {
	pub fn new(graph: FlowGraph, width: f64, height: f64) -> Self {
		let layout = layout::compute(&graph, width, height);
		Self {
			graph,
			layout,
			hover: HoverState::default(),
			width,
			height,
			needs_redraw: true,
		}
	}

	/// Swap in a rebuilt graph. Indices are not stable across builds, so any
	/// hover state is dropped.
	pub fn set_graph(&mut self, graph: FlowGraph) {
		self.graph = graph;
		self.layout = layout::compute(&self.graph, self.width, self.height);
		self.hover = HoverState::default();
		self.needs_redraw = true;
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		self.layout = layout::compute(&self.graph, width, height);
		self.needs_redraw = true;
	}

	pub fn color_for(&self, branch: Option<usize>) -> &'static str {
		branch.map_or(ROOT_COLOR, |b| COLORS[b % COLORS.len()])
	}

	/// Topmost node under the pointer. Hidden stubs count: clicking one is how
	/// a collapsed branch gets expanded.
	pub fn node_at_position(&self, x: f64, y: f64) -> Option<usize> {
		let exact = self
			.layout
			.nodes
			.iter()
			.find(|node| node.contains(x, y, 0.0));
		exact
			.or_else(|| {
				self.layout
					.nodes
					.iter()
					.find(|node| node.contains(x, y, HIT_SLOP))
			})
			.map(|node| node.index)
	}

	pub fn name_at_position(&self, x: f64, y: f64) -> Option<&str> {
		let index = self.node_at_position(x, y)?;
		self.graph.node(index).map(|node| node.name.as_str())
	}

	pub fn set_hover(&mut self, node: Option<usize>) {
		if self.hover.node == node {
			return;
		}
		let left = self
			.hover
			.node
			.take()
			.map(|idx| (idx, std::mem::take(&mut self.hover.neighbors)));
		match node {
			// Sliding from one node to the next keeps the current level.
			Some(idx) => {
				self.hover.fading = None;
				self.hover.neighbors = self
					.graph
					.parent(idx)
					.into_iter()
					.chain(self.graph.outgoing(idx).map(|link| link.target))
					.collect();
				self.hover.node = Some(idx);
			}
			None => self.hover.fading = left,
		}
		self.needs_redraw = true;
	}

	fn focus(&self) -> Option<(usize, &HashSet<usize>)> {
		match self.hover.node {
			Some(idx) => Some((idx, &self.hover.neighbors)),
			None => self
				.hover
				.fading
				.as_ref()
				.map(|(idx, neighbors)| (*idx, neighbors)),
		}
	}

	pub fn is_highlighted(&self, idx: usize) -> bool {
		self.focus()
			.is_some_and(|(node, neighbors)| node == idx || neighbors.contains(&idx))
	}

	pub fn is_hovered(&self, idx: usize) -> bool {
		self.focus().is_some_and(|(node, _)| node == idx)
	}

	pub fn has_active_highlight(&self) -> bool {
		self.focus().is_some()
	}

	/// True while the highlight is still ramping.
	pub fn is_animating(&self) -> bool {
		match self.hover.node {
			Some(_) => self.hover.level < 1.0,
			None => self.hover.level > 0.0,
		}
	}

	pub fn tick(&mut self, dt: f64) {
		let step = match self.hover.node {
			Some(_) => dt / FADE_IN_SECS,
			None => -dt / FADE_OUT_SECS,
		};
		self.hover.level = (self.hover.level + step).clamp(0.0, 1.0);
		if self.hover.level == 0.0 {
			self.hover.fading = None;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::flow::{BuildPolicy, Entity, Enumeration, build_classified};

	fn state(expansion: Option<&str>) -> SankeyState {
		let entities = vec![
			Entity::new("a1", 10u64).named("Alpha").classified("X"),
			Entity::new("a2", 20u64).named("Beta").classified("Y"),
			Entity::new("a3", 5u64).named("Gamma").classified("X"),
		];
		let policy = BuildPolicy::new(Enumeration::fixed(["X", "Y"]));
		SankeyState::new(build_classified(&entities, expansion, &policy), 800.0, 600.0)
	}

	fn center(state: &SankeyState, index: usize) -> (f64, f64) {
		let node = &state.layout.nodes[index];
		(node.x + node.width / 2.0, node.center_y())
	}

	#[test]
	fn clicks_resolve_to_node_names() {
		let state = state(Some("X"));
		let (x, y) = center(&state, 2);
		assert_eq!(state.name_at_position(x, y), Some("Alpha"));
		let (x, y) = center(&state, 1);
		assert_eq!(state.name_at_position(x, y), Some("X"));
		assert_eq!(state.name_at_position(-100.0, -100.0), None);
	}

	#[test]
	fn stubs_are_clickable_with_slop() {
		let state = state(None);
		let stub = &state.layout.nodes[4];
		assert!(stub.hidden);
		let hit = state.node_at_position(stub.x + 1.0, stub.y - HIT_SLOP / 2.0);
		assert_eq!(hit, Some(4));
		assert_eq!(state.graph.node(4).unwrap().name, "Y");
	}

	#[test]
	fn hover_collects_neighbors() {
		let mut state = state(Some("X"));
		state.set_hover(Some(1));
		let expected: HashSet<usize> = [0, 2, 3].into_iter().collect();
		assert_eq!(state.hover.neighbors, expected);
		assert!(state.is_highlighted(0));
		assert!(!state.is_highlighted(4));
	}

	#[test]
	fn hover_fades_out_and_clears() {
		let mut state = state(None);
		state.set_hover(Some(1));
		assert!(state.is_animating());
		for _ in 0..20 {
			state.tick(0.016);
		}
		assert_eq!(state.hover.level, 1.0);
		assert!(!state.is_animating());

		state.set_hover(None);
		assert!(state.is_hovered(1));
		assert!(state.is_highlighted(0));
		assert!(state.is_animating());
		for _ in 0..40 {
			state.tick(0.016);
		}
		assert_eq!(state.hover.level, 0.0);
		assert!(!state.has_active_highlight());
		assert!(!state.is_animating());
	}

	#[test]
	fn moving_between_nodes_drops_the_old_focus() {
		let mut state = state(Some("X"));
		state.set_hover(Some(2));
		state.set_hover(Some(4));
		assert!(state.is_hovered(4));
		assert!(!state.is_hovered(2));
		assert!(!state.is_highlighted(3));
	}

	#[test]
	fn new_graph_resets_hover() {
		let mut state = state(None);
		state.set_hover(Some(1));
		let entities = vec![Entity::new("z", 1u64).classified("X")];
		let policy = BuildPolicy::new(Enumeration::fixed(["X"]));
		state.set_graph(build_classified(&entities, None, &policy));
		assert!(!state.has_active_highlight());
		assert_eq!(state.layout.nodes.len(), 3);
	}

	#[test]
	fn branch_colors_cycle() {
		let state = state(None);
		assert_eq!(state.color_for(None), ROOT_COLOR);
		assert_eq!(state.color_for(Some(0)), state.color_for(Some(COLORS.len())));
	}
}
