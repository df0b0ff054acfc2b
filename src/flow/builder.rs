use log::{debug, warn};

use super::bucket::{Bucket, partition};
use super::index::NextIndex;
use super::policy::BuildPolicy;
use super::types::{Capacity, Entity, FlowGraph, FlowLink, FlowNode, FlowValue};

/// Build the Sankey graph for `entities`, grouping with `classify`.
///
/// The root (index 0) holds every bucketed entity. Each branch hangs off the
/// root with a link carrying its total. The branch named by `expansion` gets
/// one terminal child per member; every other branch gets a single hidden
/// stub so the diagram depth never changes. Indices follow pre-order.
pub fn build<F>(
	entities: &[Entity],
	expansion: Option<&str>,
	policy: &BuildPolicy,
	classify: F,
) -> FlowGraph
where
	F: Fn(&Entity) -> Option<&str>,
{
	let buckets = partition(entities, classify, &policy.branches, &policy.unknown);
	let mut ids = NextIndex::new();
	let mut graph = FlowGraph::default();

	let members: Vec<Entity> = buckets
		.iter()
		.flat_map(|bucket| bucket.members.iter().cloned())
		.collect();
	let total = buckets
		.iter()
		.try_fold(Capacity::ZERO, |total, bucket| total.checked_add(bucket.capacity))
		.unwrap_or_else(|| {
			warn!("root '{}' overflows the capacity range; saturating", policy.root_label);
			Capacity::new(u128::MAX)
		});
	let root = ids.root();
	graph.nodes.push(FlowNode {
		index: root,
		name: policy.root_label.clone(),
		value: FlowValue::Capacity(total),
		members,
		is_hidden: false,
		is_terminal: false,
	});

	for bucket in buckets {
		let expanded = expansion == Some(bucket.key.as_str());
		add_branch(&mut graph, &mut ids, root, bucket, expanded, policy);
	}

	debug!(
		"built flow graph '{}': {} nodes, {} links, expanded={:?}",
		policy.root_label,
		graph.nodes.len(),
		graph.links.len(),
		expansion
	);
	graph
}

/// [`build`] grouping by each entity's own classification.
pub fn build_classified(
	entities: &[Entity],
	expansion: Option<&str>,
	policy: &BuildPolicy,
) -> FlowGraph {
	build(entities, expansion, policy, Entity::class_key)
}

fn add_branch(
	graph: &mut FlowGraph,
	ids: &mut NextIndex,
	parent: usize,
	bucket: Bucket,
	expanded: bool,
	policy: &BuildPolicy,
) {
	let index = ids.issue();
	let value = FlowValue::Capacity(bucket.capacity);
	graph.links.push(FlowLink {
		source: parent,
		target: index,
		value,
	});
	graph.nodes.push(FlowNode {
		index,
		name: bucket.key.clone(),
		value,
		members: bucket.members.clone(),
		is_hidden: false,
		is_terminal: false,
	});

	if expanded {
		for member in bucket.members {
			add_member(graph, ids, index, member);
		}
	} else {
		add_stub(graph, ids, index, bucket.key, policy.hidden_link_placeholder_value);
	}
}

fn add_member(graph: &mut FlowGraph, ids: &mut NextIndex, parent: usize, member: Entity) {
	let index = ids.issue();
	let value = FlowValue::Capacity(member.capacity);
	graph.links.push(FlowLink {
		source: parent,
		target: index,
		value,
	});
	graph.nodes.push(FlowNode {
		index,
		name: member.display_name().to_string(),
		value,
		members: vec![member],
		is_hidden: false,
		is_terminal: true,
	});
}

// Stubs share their branch's name so clicking one expands the branch.
fn add_stub(graph: &mut FlowGraph, ids: &mut NextIndex, parent: usize, name: String, weight: f64) {
	let index = ids.issue();
	let value = FlowValue::Placeholder(weight);
	graph.links.push(FlowLink {
		source: parent,
		target: index,
		value,
	});
	graph.nodes.push(FlowNode {
		index,
		name,
		value,
		members: Vec::new(),
		is_hidden: true,
		is_terminal: false,
	});
}
