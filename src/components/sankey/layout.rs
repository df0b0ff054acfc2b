//! Column layout: one column per tree depth, node heights proportional to
//! their flow value, bands stacked at each source.

use crate::flow::FlowGraph;

pub const NODE_WIDTH: f64 = 14.0;
pub const NODE_PADDING: f64 = 10.0;
pub const MIN_NODE_HEIGHT: f64 = 2.0;
pub const MIN_BAND_THICKNESS: f64 = 1.0;
const MARGIN_X: f64 = 24.0;
const MARGIN_Y: f64 = 24.0;
// Room to the right of the last column for labels.
const LABEL_GUTTER: f64 = 180.0;

#[derive(Clone, Debug, PartialEq)]
pub struct NodeBox {
	pub index: usize,
	pub x: f64,
	pub y: f64,
	pub width: f64,
	pub height: f64,
	pub depth: usize,
	/// Ordinal of the top-level branch this node belongs to; `None` for the root.
	pub branch: Option<usize>,
	pub hidden: bool,
}

impl NodeBox {
	pub fn contains(&self, x: f64, y: f64, slop: f64) -> bool {
		x >= self.x - slop
			&& x <= self.x + self.width + slop
			&& y >= self.y - slop
			&& y <= self.y + self.height + slop
	}

	pub fn center_y(&self) -> f64 {
		self.y + self.height / 2.0
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct LinkBand {
	pub source: usize,
	pub target: usize,
	pub x0: f64,
	pub x1: f64,
	/// Top edge of the band where it leaves the source.
	pub y0: f64,
	/// Top edge of the band where it enters the target.
	pub y1: f64,
	pub thickness: f64,
	pub branch: Option<usize>,
	pub hidden: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SankeyLayout {
	pub nodes: Vec<NodeBox>,
	pub links: Vec<LinkBand>,
}

/// Lay out `graph` in a `width` x `height` canvas.
///
/// Expects the builder's shape: a tree with links emitted parent-first.
pub fn compute(graph: &FlowGraph, width: f64, height: f64) -> SankeyLayout {
	let count = graph.nodes.len();
	let mut depths = vec![0usize; count];
	let mut branches: Vec<Option<usize>> = vec![None; count];
	let mut next_branch = 0;
	for link in &graph.links {
		if link.source >= count || link.target >= count {
			continue;
		}
		depths[link.target] = depths[link.source] + 1;
		branches[link.target] = match branches[link.source] {
			Some(branch) => Some(branch),
			None => {
				next_branch += 1;
				Some(next_branch - 1)
			}
		};
	}

	let columns = depths.iter().copied().max().map_or(0, |deepest| deepest + 1);
	let inner_height = (height - 2.0 * MARGIN_Y).max(0.0);

	// One vertical scale for every column so bands keep their thickness.
	let mut ky = f64::INFINITY;
	for column in 0..columns {
		let (total, members) = graph
			.nodes
			.iter()
			.zip(&depths)
			.filter(|(_, depth)| **depth == column)
			.fold((0.0, 0usize), |(total, members), (node, _)| {
				(total + node.value.as_f64(), members + 1)
			});
		if total > 0.0 {
			let padding = NODE_PADDING * members.saturating_sub(1) as f64;
			ky = ky.min((inner_height - padding).max(0.0) / total);
		}
	}
	if !ky.is_finite() {
		ky = 0.0;
	}

	let span = (width - 2.0 * MARGIN_X - LABEL_GUTTER - NODE_WIDTH).max(0.0);
	let step = if columns > 1 {
		span / (columns - 1) as f64
	} else {
		0.0
	};

	let mut cursor = vec![0.0; columns];
	let mut nodes: Vec<NodeBox> = graph
		.nodes
		.iter()
		.map(|node| {
			let depth = depths.get(node.index).copied().unwrap_or(0);
			let height = (node.value.as_f64() * ky).max(MIN_NODE_HEIGHT);
			let y = cursor[depth];
			cursor[depth] += height + NODE_PADDING;
			NodeBox {
				index: node.index,
				x: MARGIN_X + depth as f64 * step,
				y,
				width: NODE_WIDTH,
				height,
				depth,
				branch: branches.get(node.index).copied().flatten(),
				hidden: node.is_hidden,
			}
		})
		.collect();

	// Center each column vertically.
	for node in &mut nodes {
		let used = (cursor[node.depth] - NODE_PADDING).max(0.0);
		node.y += MARGIN_Y + ((inner_height - used) / 2.0).max(0.0);
	}

	let mut out_offset = vec![0.0; count];
	let links = graph
		.links
		.iter()
		.filter_map(|link| {
			let source = nodes.get(link.source)?;
			let target = nodes.get(link.target)?;
			// Only placeholder bands get a floor; real bands must stack within
			// their source, zero-capacity ones included.
			let weight = link.value.as_f64() * ky;
			let thickness = if link.value.is_placeholder() {
				weight.max(MIN_BAND_THICKNESS)
			} else {
				weight
			}
			.min(target.height);
			let y0 = source.y + out_offset[link.source];
			out_offset[link.source] += thickness;
			Some(LinkBand {
				source: link.source,
				target: link.target,
				x0: source.x + source.width,
				x1: target.x,
				y0,
				y1: target.y,
				thickness,
				branch: target.branch,
				hidden: target.hidden,
			})
		})
		.collect();

	SankeyLayout { nodes, links }
}
