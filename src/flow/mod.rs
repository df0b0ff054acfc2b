//! Flow-graph construction for datacap Sankey diagrams.
//!
//! Entities (allocators, clients, audit rows) are partitioned into branches by
//! a classification key, then flattened into an integer-indexed node/link
//! graph. One branch at a time may be drilled into; every other branch ends in
//! a hidden stub node so the diagram keeps the same depth either way.

mod bucket;
mod builder;
mod error;
mod expansion;
mod index;
mod policy;
mod types;

pub use bucket::{Bucket, Enumeration, UnknownPolicy, partition};
pub use builder::{build, build_classified};
pub use error::FlowError;
pub use expansion::{Expandable, ExpansionState, next_expansion};
pub use index::NextIndex;
pub use policy::{
	AuditOutcome, BuildPolicy, EntityRecord, HIDDEN_LINK_PLACEHOLDER_VALUE, PolicyConfig,
	UNCLASSIFIED_DEFAULT_CAPACITY, parse_entities,
};
pub use types::{Capacity, Entity, FlowGraph, FlowLink, FlowNode, FlowValue};
