/// Hands out node indices during a single build.
///
/// Index 0 is reserved for the root; everything else is issued in call order,
/// so threading one counter through a pre-order walk yields contiguous indices
/// that match each node's position in the output list.
#[derive(Debug)]
pub struct NextIndex {
	next: usize,
}

impl NextIndex {
	/// A fresh counter with the root slot already taken.
	pub fn new() -> Self {
		Self { next: 1 }
	}

	/// The root's index.
	pub const fn root(&self) -> usize {
		0
	}

	/// Issue the next unused index.
	pub fn issue(&mut self) -> usize {
		let index = self.next;
		self.next += 1;
		index
	}

	/// Number of indices handed out so far, root included.
	pub fn issued(&self) -> usize {
		self.next
	}
}

impl Default for NextIndex {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn starts_after_root() {
		let mut ids = NextIndex::new();
		assert_eq!(ids.root(), 0);
		assert_eq!(ids.issued(), 1);
		assert_eq!(ids.issue(), 1);
		assert_eq!(ids.issue(), 2);
		assert_eq!(ids.issued(), 3);
	}

	#[test]
	fn fresh_counters_are_independent() {
		let mut a = NextIndex::new();
		a.issue();
		a.issue();
		let mut b = NextIndex::default();
		assert_eq!(b.issue(), 1);
		assert_eq!(a.issue(), 3);
	}
}
