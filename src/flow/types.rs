use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::FlowError;

/// A datacap amount in bytes.
///
/// Backend APIs ship these as decimal strings because they overflow JS
/// numbers; `u128` leaves plenty of headroom. `+` saturates instead of
/// wrapping, so a corrupt amount can never make a branch look smaller; use
/// [`Capacity::checked_add`] where an overflow has to be detected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Capacity(u128);

impl Capacity {
	/// No datacap.
	pub const ZERO: Self = Self(0);

	/// Wrap a raw byte count.
	pub const fn new(bytes: u128) -> Self {
		Self(bytes)
	}

	/// Raw byte count.
	pub const fn get(self) -> u128 {
		self.0
	}

	/// True when nothing is allocated.
	pub const fn is_zero(self) -> bool {
		self.0 == 0
	}

	/// Addition that reports overflow instead of saturating.
	pub const fn checked_add(self, rhs: Self) -> Option<Self> {
		match self.0.checked_add(rhs.0) {
			Some(total) => Some(Self(total)),
			None => None,
		}
	}

	/// Lossy conversion for layout math.
	pub fn as_f64(self) -> f64 {
		self.0 as f64
	}
}

impl From<u64> for Capacity {
	fn from(bytes: u64) -> Self {
		Self(bytes as u128)
	}
}

impl From<u128> for Capacity {
	fn from(bytes: u128) -> Self {
		Self(bytes)
	}
}

impl Add for Capacity {
	type Output = Self;

	fn add(self, rhs: Self) -> Self {
		Self(self.0.saturating_add(rhs.0))
	}
}

impl AddAssign for Capacity {
	fn add_assign(&mut self, rhs: Self) {
		*self = *self + rhs;
	}
}

impl Sum for Capacity {
	fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
		iter.fold(Self::ZERO, Add::add)
	}
}

impl<'a> Sum<&'a Capacity> for Capacity {
	fn sum<I: Iterator<Item = &'a Capacity>>(iter: I) -> Self {
		iter.copied().sum()
	}
}

impl FromStr for Capacity {
	type Err = FlowError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let digits = s.trim();
		if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
			return Err(FlowError::InvalidCapacity { value: s.to_string() });
		}
		digits
			.parse::<u128>()
			.map(Self)
			.map_err(|_| FlowError::InvalidCapacity { value: s.to_string() })
	}
}

impl fmt::Display for Capacity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl Serialize for Capacity {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.collect_str(self)
	}
}

impl<'de> Deserialize<'de> for Capacity {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		RawAmount::deserialize(deserializer)?
			.resolve()
			.map_err(serde::de::Error::custom)
	}
}

/// An amount as it appears in API JSON: usually a decimal string, sometimes a
/// plain number for small values.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawAmount {
	Text(String),
	Number(u64),
}

impl RawAmount {
	pub(crate) fn resolve(&self) -> Result<Capacity, FlowError> {
		match self {
			Self::Text(text) => text.parse(),
			Self::Number(n) => Ok(Capacity::from(*n)),
		}
	}
}

/// A domain record: an allocator, client, or audit row with a datacap amount.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
	/// Stable identifier (allocator address, client id, ...).
	pub id: String,
	/// Human-facing name; may be missing upstream.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	/// Datacap attributed to this entity.
	pub capacity: Capacity,
	/// Pathway, audit outcome, or whatever the diagram groups by.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub classification: Option<String>,
}

impl Entity {
	/// An unnamed, unclassified entity.
	pub fn new(id: impl Into<String>, capacity: impl Into<Capacity>) -> Self {
		Self {
			id: id.into(),
			name: None,
			capacity: capacity.into(),
			classification: None,
		}
	}

	/// Attach a display name.
	pub fn named(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}

	/// Attach a classification key.
	pub fn classified(mut self, key: impl Into<String>) -> Self {
		self.classification = Some(key.into());
		self
	}

	/// The name, or the id when the name is missing or blank.
	pub fn display_name(&self) -> &str {
		self.name
			.as_deref()
			.filter(|name| !name.trim().is_empty())
			.unwrap_or(&self.id)
	}

	/// The classification key as a borrowed string.
	pub fn class_key(&self) -> Option<&str> {
		self.classification.as_deref()
	}
}

/// Weight carried by a node or link.
///
/// `Placeholder` exists only for the layout: the Sankey renderer collapses
/// zero-weight links, so hidden stubs get a tiny positive weight instead.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FlowValue {
	/// Real datacap.
	Capacity(Capacity),
	/// Layout-only weight with no data behind it.
	Placeholder(f64),
}

impl FlowValue {
	/// Weight handed to the layout.
	pub fn as_f64(self) -> f64 {
		match self {
			Self::Capacity(capacity) => capacity.as_f64(),
			Self::Placeholder(weight) => weight,
		}
	}

	/// Datacap behind this value; placeholders carry none.
	pub fn capacity(self) -> Capacity {
		match self {
			Self::Capacity(capacity) => capacity,
			Self::Placeholder(_) => Capacity::ZERO,
		}
	}

	/// True for layout-only weights.
	pub fn is_placeholder(self) -> bool {
		matches!(self, Self::Placeholder(_))
	}
}

/// One box in the diagram: the root, a branch, a member, or a hidden stub.
#[derive(Clone, Debug, PartialEq)]
pub struct FlowNode {
	/// Position in [`FlowGraph::nodes`]; 0 is the root.
	pub index: usize,
	/// Label, and the key click handling reports back.
	pub name: String,
	/// Datacap held, or a placeholder weight for stubs.
	pub value: FlowValue,
	/// Entities behind this node.
	pub members: Vec<Entity>,
	/// Stubs that only exist to end a collapsed branch.
	pub is_hidden: bool,
	/// Leaf for a single entity; clicking it changes nothing.
	pub is_terminal: bool,
}

impl FlowNode {
	/// Datacap represented by this node (zero for hidden stubs).
	pub fn capacity(&self) -> Capacity {
		self.value.capacity()
	}
}

/// A parent-to-child edge.
#[derive(Clone, Debug, PartialEq)]
pub struct FlowLink {
	/// Parent node index.
	pub source: usize,
	/// Child node index; never the root.
	pub target: usize,
	/// Flow carried, equal to the child's value.
	pub value: FlowValue,
}

/// Integer-indexed node/link description handed to the renderer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FlowGraph {
	/// Nodes in index order; `nodes[i].index == i`.
	pub nodes: Vec<FlowNode>,
	/// Parent-to-child edges.
	pub links: Vec<FlowLink>,
}

impl FlowGraph {
	/// The root node, if anything was built.
	pub fn root(&self) -> Option<&FlowNode> {
		self.nodes.first()
	}

	/// Look up a node by index.
	pub fn node(&self, index: usize) -> Option<&FlowNode> {
		self.nodes.get(index)
	}

	/// First visible node with the given name.
	pub fn node_by_name(&self, name: &str) -> Option<&FlowNode> {
		self.nodes.iter().find(|node| !node.is_hidden && node.name == name)
	}

	/// Links leaving `index`, in emission order.
	pub fn outgoing(&self, index: usize) -> impl Iterator<Item = &FlowLink> {
		self.links.iter().filter(move |link| link.source == index)
	}

	/// Direct children of `index`, in emission order.
	pub fn children(&self, index: usize) -> impl Iterator<Item = &FlowNode> {
		self.outgoing(index).filter_map(|link| self.nodes.get(link.target))
	}

	/// The top-level branches under the root.
	pub fn branches(&self) -> impl Iterator<Item = &FlowNode> {
		self.children(0)
	}

	/// Index of the node linking into `index`.
	pub fn parent(&self, index: usize) -> Option<usize> {
		self.links
			.iter()
			.find(|link| link.target == index)
			.map(|link| link.source)
	}

	/// Distance from the root; 0 for the root itself.
	pub fn depth(&self, index: usize) -> usize {
		let mut depth = 0;
		let mut current = index;
		while let Some(parent) = self.parent(current) {
			depth += 1;
			current = parent;
			if depth > self.nodes.len() {
				break;
			}
		}
		depth
	}

	/// Check the structural invariants the renderer relies on.
	///
	/// Collapsed stubs are skipped in the conservation check: their single
	/// placeholder link is a layout artifact and never sums to the parent.
	pub fn verify(&self) -> Result<(), FlowError> {
		for (position, node) in self.nodes.iter().enumerate() {
			if node.index != position {
				return Err(FlowError::NonContiguousIndex {
					expected: position,
					found: node.index,
				});
			}
		}

		let mut parents = vec![0usize; self.nodes.len()];
		for link in &self.links {
			if link.source >= self.nodes.len() || link.target >= self.nodes.len() {
				return Err(FlowError::DanglingLink {
					from: link.source,
					to: link.target,
				});
			}
			parents[link.target] += 1;
		}
		for (index, &count) in parents.iter().enumerate() {
			if count != usize::from(index != 0) {
				return Err(FlowError::ParentCount { index, count });
			}
		}

		for node in &self.nodes {
			let mut outgoing = self.outgoing(node.index).peekable();
			let collapsed = self
				.outgoing(node.index)
				.any(|link| link.value.is_placeholder());
			if outgoing.peek().is_none() || collapsed {
				continue;
			}
			let actual = outgoing
				.try_fold(Capacity::ZERO, |total, link| {
					total.checked_add(link.value.capacity())
				})
				.ok_or(FlowError::CapacityOverflow { node: node.index })?;
			if actual != node.capacity() {
				return Err(FlowError::Conservation {
					node: node.index,
					expected: node.capacity().get(),
					actual: actual.get(),
				});
			}
		}
		Ok(())
	}
}
