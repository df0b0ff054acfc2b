use super::policy::BuildPolicy;
use super::types::FlowGraph;

/// Something that knows which node names are expandable branches.
pub trait Expandable {
	/// True if clicking a node called `name` may drill into it.
	fn is_expandable(&self, name: &str) -> bool;
}

impl Expandable for BuildPolicy {
	fn is_expandable(&self, name: &str) -> bool {
		self.is_branch(name)
	}
}

/// For first-occurrence grouping the policy has no fixed taxonomy, so the
/// built graph's top-level branches are the only source of truth.
impl Expandable for FlowGraph {
	fn is_expandable(&self, name: &str) -> bool {
		self.branches().any(|node| !node.is_hidden && node.name == name)
	}
}

/// Next expansion state after a click on the node called `clicked`.
///
/// Clicking the open branch closes it, clicking another branch switches to
/// it, and clicking anything else (members, the root) changes nothing.
pub fn next_expansion(
	clicked: &str,
	current: Option<&str>,
	branches: &impl Expandable,
) -> Option<String> {
	if current == Some(clicked) {
		None
	} else if branches.is_expandable(clicked) {
		Some(clicked.to_string())
	} else {
		current.map(str::to_string)
	}
}

/// The single drilled-into branch of a diagram, owned by the view.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ExpansionState(Option<String>);

impl ExpansionState {
	/// Everything collapsed.
	pub fn collapsed() -> Self {
		Self(None)
	}

	/// The open branch, if any.
	pub fn as_deref(&self) -> Option<&str> {
		self.0.as_deref()
	}

	/// True when no branch is open.
	pub fn is_collapsed(&self) -> bool {
		self.0.is_none()
	}

	/// Apply a click on `clicked`; see [`next_expansion`].
	pub fn toggle(&mut self, clicked: &str, branches: &impl Expandable) {
		self.0 = next_expansion(clicked, self.as_deref(), branches);
	}

	/// Collapse everything.
	pub fn reset(&mut self) {
		self.0 = None;
	}
}

impl From<Option<String>> for ExpansionState {
	fn from(state: Option<String>) -> Self {
		Self(state)
	}
}
