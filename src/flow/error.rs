use thiserror::Error;

/// Failures from ingesting data, loading a policy, or verifying a built graph.
///
/// Building itself never fails; anything the builder cannot classify lands in
/// the unknown branch or is dropped, depending on the policy.
#[derive(Debug, Error)]
pub enum FlowError {
	/// A capacity amount was not a non-negative base-10 integer.
	#[error("invalid capacity '{value}': expected a non-negative integer")]
	InvalidCapacity {
		/// The rejected input.
		value: String,
	},

	/// Hidden links need a finite, strictly positive weight.
	#[error("hidden link placeholder must be finite and positive, got {0}")]
	InvalidPlaceholder(f64),

	/// Branch names must be unique within one policy.
	#[error("branch '{0}' is listed more than once")]
	DuplicateBranch(String),

	/// Policy or entity JSON could not be decoded.
	#[error("malformed json: {0}")]
	Json(#[from] serde_json::Error),

	/// A link points at a node index the graph does not contain.
	#[error("link {from} -> {to} references a missing node")]
	DanglingLink {
		/// Source index of the offending link.
		from: usize,
		/// Target index of the offending link.
		to: usize,
	},

	/// Node indices must equal their position in the node list.
	#[error("node at position {expected} carries index {found}")]
	NonContiguousIndex {
		/// Position in `nodes`.
		expected: usize,
		/// Index stored on the node.
		found: usize,
	},

	/// A non-root node must be the target of exactly one link.
	#[error("node {index} is the target of {count} links")]
	ParentCount {
		/// The node index.
		index: usize,
		/// How many links target it.
		count: usize,
	},

	/// Outgoing link values overflow a `u128` byte count.
	#[error("outgoing links of node {node} overflow the capacity range")]
	CapacityOverflow {
		/// The node index.
		node: usize,
	},

	/// Outgoing link values do not add up to the node's capacity.
	#[error("node {node} holds {expected} but its outgoing links carry {actual}")]
	Conservation {
		/// The node index.
		node: usize,
		/// The node's own capacity.
		expected: u128,
		/// Sum of its outgoing capacity links.
		actual: u128,
	},
}
