use log::{debug, warn};

use super::types::{Capacity, Entity};

/// Entities sharing one classification key, with their summed datacap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bucket {
	/// Classification key, also the branch name in the diagram.
	pub key: String,
	/// Members in input order.
	pub members: Vec<Entity>,
	/// Sum of member capacities.
	pub capacity: Capacity,
}

impl Bucket {
	fn empty(key: &str) -> Self {
		Self {
			key: key.to_string(),
			members: Vec::new(),
			capacity: Capacity::ZERO,
		}
	}

	fn push(&mut self, entity: Entity) {
		self.capacity = match self.capacity.checked_add(entity.capacity) {
			Some(total) => total,
			None => {
				warn!("bucket {} overflows the capacity range; saturating", self.key);
				Capacity::new(u128::MAX)
			}
		};
		self.members.push(entity);
	}
}

/// Which buckets exist and in what order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Enumeration {
	/// Whatever keys show up, in first-occurrence order.
	#[default]
	Stable,
	/// Exactly these keys in this order, present even when empty so chart
	/// colors and legends don't shift between data refreshes.
	Fixed(Vec<String>),
}

impl Enumeration {
	/// A fixed enumeration from anything string-like. Repeated keys keep
	/// their first position.
	pub fn fixed<I, S>(keys: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let mut unique: Vec<String> = Vec::new();
		for key in keys.into_iter().map(Into::into) {
			if !unique.contains(&key) {
				unique.push(key);
			}
		}
		Self::Fixed(unique)
	}

	/// True if `key` is one of the declared keys. Always false for `Stable`.
	pub fn declares(&self, key: &str) -> bool {
		match self {
			Self::Stable => false,
			Self::Fixed(keys) => keys.iter().any(|k| k == key),
		}
	}
}

/// What happens to entities without a recognised key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UnknownPolicy {
	/// Leave them out of the diagram entirely.
	Drop,
	/// Collect them into a catch-all bucket with this label.
	Surface {
		/// Branch name for the catch-all bucket.
		label: String,
	},
}

impl UnknownPolicy {
	/// Surface unknowns under `label`.
	pub fn surface(label: impl Into<String>) -> Self {
		Self::Surface {
			label: label.into(),
		}
	}

	/// The catch-all label, when unknowns are surfaced.
	pub fn label(&self) -> Option<&str> {
		match self {
			Self::Drop => None,
			Self::Surface { label } => Some(label),
		}
	}
}

/// Partition `entities` into buckets by `classify`.
///
/// With a fixed enumeration every declared key yields a bucket, in declared
/// order; keys outside it count as unknown. A surfaced unknown bucket comes
/// last and only when non-empty, unless its label is itself declared, in which
/// case it keeps its declared slot.
pub fn partition<F>(
	entities: &[Entity],
	classify: F,
	enumeration: &Enumeration,
	unknown: &UnknownPolicy,
) -> Vec<Bucket>
where
	F: Fn(&Entity) -> Option<&str>,
{
	let mut buckets: Vec<Bucket> = match enumeration {
		Enumeration::Stable => Vec::new(),
		Enumeration::Fixed(keys) => {
			let mut buckets: Vec<Bucket> = Vec::with_capacity(keys.len());
			for key in keys {
				if buckets.iter().any(|b| b.key == *key) {
					debug!("ignoring repeated branch key {key}");
					continue;
				}
				buckets.push(Bucket::empty(key));
			}
			buckets
		}
	};
	let mut unclassified = Vec::new();

	for entity in entities {
		let slot = match (classify(entity), enumeration) {
			(None, _) => None,
			(Some(key), Enumeration::Fixed(_)) => buckets.iter().position(|b| b.key == key),
			(Some(key), Enumeration::Stable) => {
				match buckets.iter().position(|b| b.key == key) {
					Some(slot) => Some(slot),
					None => {
						buckets.push(Bucket::empty(key));
						Some(buckets.len() - 1)
					}
				}
			}
		};
		match slot {
			Some(slot) => buckets[slot].push(entity.clone()),
			None => unclassified.push(entity),
		}
	}

	match unknown {
		UnknownPolicy::Drop => {
			for entity in unclassified {
				debug!(
					"dropping unclassified entity {} ({:?})",
					entity.id, entity.classification
				);
			}
		}
		UnknownPolicy::Surface { label } => {
			if !unclassified.is_empty() || enumeration.declares(label) {
				let slot = match buckets.iter().position(|b| b.key == *label) {
					Some(slot) => slot,
					None => {
						buckets.push(Bucket::empty(label));
						buckets.len() - 1
					}
				};
				for entity in unclassified {
					buckets[slot].push(entity.clone());
				}
			}
		}
	}

	buckets
}
