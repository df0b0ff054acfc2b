use std::collections::HashSet;

use serde::Deserialize;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use super::bucket::{Enumeration, UnknownPolicy};
use super::error::FlowError;
use super::types::{Capacity, Entity, RawAmount};

/// Weight given to the link into a hidden stub node.
///
/// Rendering workaround, not data: the Sankey layout drops zero-weight links,
/// and a collapsed branch still needs a leaf to end on.
pub const HIDDEN_LINK_PLACEHOLDER_VALUE: f64 = 0.1;

/// Capacity assumed for rows that arrive without an amount (un-audited
/// allocators). Like the placeholder above, this only keeps such rows visible
/// in the diagram.
pub const UNCLASSIFIED_DEFAULT_CAPACITY: Capacity = Capacity::new(5);

const DEFAULT_ROOT_LABEL: &str = "Datacap";
const DEFAULT_UNKNOWN_LABEL: &str = "Unknown";
const NOT_AUDITED_LABEL: &str = "Not Audited";

/// Outcome of a compliance audit, in display order.
#[derive(
	Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum AuditOutcome {
	/// Audit passed without conditions.
	#[strum(to_string = "Passed", serialize = "PASSED")]
	Passed,
	/// Audit passed with follow-up conditions.
	#[strum(to_string = "Passed Conditionally", serialize = "PASSED_CONDITIONALLY")]
	PassedConditionally,
	/// Audit failed.
	#[strum(to_string = "Failed", serialize = "FAILED")]
	Failed,
}

impl AuditOutcome {
	/// Classifier for audit diagrams: maps raw upstream outcome codes onto
	/// their display labels. Anything unrecognised is left unclassified.
	pub fn classify(entity: &Entity) -> Option<&str> {
		let outcome: AuditOutcome = entity.class_key()?.parse().ok()?;
		Some(outcome.into())
	}
}

/// Per-diagram build configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct BuildPolicy {
	/// Name of the root node.
	pub root_label: String,
	/// Branch taxonomy under the root.
	pub branches: Enumeration,
	/// Weight of links into hidden stubs. See [`HIDDEN_LINK_PLACEHOLDER_VALUE`].
	pub hidden_link_placeholder_value: f64,
	/// Where entities outside the taxonomy go.
	pub unknown: UnknownPolicy,
	/// Capacity for records that arrive without one; `None` means zero.
	pub unclassified_default_capacity: Option<Capacity>,
}

impl Default for BuildPolicy {
	fn default() -> Self {
		Self {
			root_label: DEFAULT_ROOT_LABEL.to_string(),
			branches: Enumeration::Stable,
			hidden_link_placeholder_value: HIDDEN_LINK_PLACEHOLDER_VALUE,
			unknown: UnknownPolicy::surface(DEFAULT_UNKNOWN_LABEL),
			unclassified_default_capacity: None,
		}
	}
}

impl BuildPolicy {
	/// Default policy over the given taxonomy.
	pub fn new(branches: Enumeration) -> Self {
		Self {
			branches,
			..Self::default()
		}
	}

	/// Audit diagram: Passed / Passed Conditionally / Failed, with
	/// un-audited rows under "Not Audited".
	pub fn audit_outcomes() -> Self {
		Self {
			root_label: "Audits".to_string(),
			branches: Enumeration::fixed(AuditOutcome::iter().map(|o| o.to_string())),
			unknown: UnknownPolicy::surface(NOT_AUDITED_LABEL),
			unclassified_default_capacity: Some(UNCLASSIFIED_DEFAULT_CAPACITY),
			..Self::default()
		}
	}

	/// Allocator diagram over a deployment-supplied pathway taxonomy.
	pub fn pathways<I, S>(names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			root_label: "Allocators".to_string(),
			branches: Enumeration::fixed(names),
			..Self::default()
		}
	}

	/// Rename the root node.
	pub fn with_root_label(mut self, label: impl Into<String>) -> Self {
		self.root_label = label.into();
		self
	}

	/// Override the hidden-link weight.
	pub fn with_placeholder(mut self, value: f64) -> Self {
		self.hidden_link_placeholder_value = value;
		self
	}

	/// Collect unknowns under `label`.
	pub fn surface_unknown(mut self, label: impl Into<String>) -> Self {
		self.unknown = UnknownPolicy::surface(label);
		self
	}

	/// Leave unknowns out of the diagram.
	pub fn drop_unknown(mut self) -> Self {
		self.unknown = UnknownPolicy::Drop;
		self
	}

	/// Capacity to assume for records without one.
	pub fn with_unclassified_default(mut self, capacity: Option<Capacity>) -> Self {
		self.unclassified_default_capacity = capacity;
		self
	}

	/// True if `name` is a branch this policy can produce and so expand.
	pub fn is_branch(&self, name: &str) -> bool {
		self.branches.declares(name) || self.unknown.label() == Some(name)
	}

	/// Reject settings that would break the layout or make branches ambiguous.
	pub fn validate(&self) -> Result<(), FlowError> {
		let placeholder = self.hidden_link_placeholder_value;
		if !placeholder.is_finite() || placeholder <= 0.0 {
			return Err(FlowError::InvalidPlaceholder(placeholder));
		}
		if let Enumeration::Fixed(names) = &self.branches {
			let mut seen = HashSet::new();
			for name in names {
				if !seen.insert(name.as_str()) {
					return Err(FlowError::DuplicateBranch(name.clone()));
				}
			}
		}
		Ok(())
	}

	/// Turn raw API rows into entities.
	///
	/// Rows without an amount get [`Self::unclassified_default_capacity`];
	/// a malformed amount fails the whole batch.
	pub fn resolve_records(&self, records: &[EntityRecord]) -> Result<Vec<Entity>, FlowError> {
		records
			.iter()
			.map(|record| {
				let capacity = match &record.capacity {
					Some(amount) => amount.resolve()?,
					None => self.unclassified_default_capacity.unwrap_or(Capacity::ZERO),
				};
				Ok(Entity {
					id: record.id.clone(),
					name: record.name.clone(),
					capacity,
					classification: record.classification.clone(),
				})
			})
			.collect()
	}
}

/// A row as served by the stats API, before defaults are applied.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRecord {
	/// Entity identifier.
	pub id: String,
	/// Display name, if any.
	#[serde(default)]
	pub name: Option<String>,
	/// Amount in bytes; missing for un-audited rows.
	#[serde(default, alias = "datacap")]
	pub(crate) capacity: Option<RawAmount>,
	/// Classification key, if any.
	#[serde(default, alias = "pathway", alias = "outcome")]
	pub classification: Option<String>,
}

/// Decode a JSON array of API rows and resolve them under `policy`.
pub fn parse_entities(json: &str, policy: &BuildPolicy) -> Result<Vec<Entity>, FlowError> {
	let records: Vec<EntityRecord> = serde_json::from_str(json)?;
	policy.resolve_records(&records)
}

/// Deployment-supplied policy, as JSON. Every field is optional.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct PolicyConfig {
	/// Root node name.
	pub root_label: Option<String>,
	/// Fixed branch taxonomy; omitted means first-occurrence grouping.
	pub branches: Option<Vec<String>>,
	/// Hidden-link weight.
	pub hidden_link_placeholder_value: Option<f64>,
	/// Label for the catch-all branch.
	pub unknown_label: Option<String>,
	/// Set to `false` to drop unknowns instead of surfacing them.
	pub surface_unknown: Option<bool>,
	/// Capacity for rows that arrive without one.
	pub unclassified_default_capacity: Option<Capacity>,
}

impl PolicyConfig {
	/// Parse a JSON config and turn it into a validated policy.
	pub fn from_json(json: &str) -> Result<BuildPolicy, FlowError> {
		let config: Self = serde_json::from_str(json)?;
		config.into_policy()
	}

	/// Apply this config over the defaults and validate the result.
	pub fn into_policy(self) -> Result<BuildPolicy, FlowError> {
		let mut policy = BuildPolicy::default();
		if let Some(label) = self.root_label {
			policy.root_label = label;
		}
		if let Some(branches) = self.branches {
			policy.branches = Enumeration::Fixed(branches);
		}
		if let Some(value) = self.hidden_link_placeholder_value {
			policy.hidden_link_placeholder_value = value;
		}
		policy.unknown = match self.surface_unknown {
			Some(false) => UnknownPolicy::Drop,
			_ => UnknownPolicy::surface(
				self.unknown_label
					.unwrap_or_else(|| DEFAULT_UNKNOWN_LABEL.to_string()),
			),
		};
		policy.unclassified_default_capacity = self.unclassified_default_capacity;
		policy.validate()?;
		Ok(policy)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn audit_outcomes_parse_upstream_codes() {
		assert_eq!(
			"PASSED_CONDITIONALLY".parse::<AuditOutcome>().unwrap(),
			AuditOutcome::PassedConditionally
		);
		assert_eq!("failed".parse::<AuditOutcome>().unwrap(), AuditOutcome::Failed);
		assert_eq!(AuditOutcome::PassedConditionally.to_string(), "Passed Conditionally");
		assert!("NOT_AUDITED".parse::<AuditOutcome>().is_err());
	}

	#[test]
	fn audit_classifier_normalises_labels() {
		let raw = Entity::new("a", 1u64).classified("PASSED");
		assert_eq!(AuditOutcome::classify(&raw), Some("Passed"));
		let unknown = Entity::new("b", 1u64).classified("PENDING");
		assert_eq!(AuditOutcome::classify(&unknown), None);
		assert_eq!(AuditOutcome::classify(&Entity::new("c", 1u64)), None);
	}

	#[test]
	fn audit_labels_match_display() {
		for outcome in AuditOutcome::iter() {
			let label: &'static str = outcome.into();
			assert_eq!(label, outcome.to_string());
			assert!(BuildPolicy::audit_outcomes().is_branch(label));
			let coded = Entity::new("b", 1u64).classified(label);
			assert_eq!(AuditOutcome::classify(&coded), Some(label));
		}
	}

	#[test]
	fn audit_preset_declares_outcomes_and_not_audited() {
		let policy = BuildPolicy::audit_outcomes();
		assert_eq!(
			policy.branches,
			Enumeration::fixed(["Passed", "Passed Conditionally", "Failed"])
		);
		assert!(policy.is_branch("Failed"));
		assert!(policy.is_branch("Not Audited"));
		assert!(!policy.is_branch("Audits"));
		assert_eq!(policy.unclassified_default_capacity, Some(Capacity::new(5)));
		policy.validate().unwrap();
	}

	#[test]
	fn dropped_unknowns_are_not_branches() {
		let policy = BuildPolicy::pathways(["Manual"]).drop_unknown();
		assert!(policy.is_branch("Manual"));
		assert!(!policy.is_branch("Unknown"));
	}

	#[test]
	fn validate_rejects_bad_placeholders() {
		for bad in [0.0, -0.1, f64::NAN, f64::INFINITY] {
			let policy = BuildPolicy::default().with_placeholder(bad);
			assert!(matches!(policy.validate(), Err(FlowError::InvalidPlaceholder(_))));
		}
	}

	#[test]
	fn validate_rejects_duplicate_branches() {
		let policy = BuildPolicy::new(Enumeration::Fixed(vec![
			"Manual".to_string(),
			"Automatic".to_string(),
			"Manual".to_string(),
		]));
		assert!(matches!(
			policy.validate(),
			Err(FlowError::DuplicateBranch(name)) if name == "Manual"
		));
	}

	#[test]
	fn pathway_preset_collapses_repeated_names() {
		let policy = BuildPolicy::pathways(["Manual", "Automatic", "Manual"]);
		assert_eq!(policy.branches, Enumeration::fixed(["Manual", "Automatic"]));
		policy.validate().unwrap();
	}

	#[test]
	fn config_fills_in_defaults() {
		let policy = PolicyConfig::from_json("{}").unwrap();
		assert_eq!(policy, BuildPolicy::default());

		let policy = PolicyConfig::from_json(
			r#"{
				"rootLabel": "Allocators",
				"branches": ["Manual", "Automatic"],
				"hiddenLinkPlaceholderValue": 0.25,
				"unknownLabel": "Other",
				"unclassifiedDefaultCapacity": "5"
			}"#,
		)
		.unwrap();
		assert_eq!(policy.root_label, "Allocators");
		assert_eq!(policy.branches, Enumeration::fixed(["Manual", "Automatic"]));
		assert_eq!(policy.hidden_link_placeholder_value, 0.25);
		assert_eq!(policy.unknown, UnknownPolicy::surface("Other"));
		assert_eq!(policy.unclassified_default_capacity, Some(Capacity::new(5)));
	}

	#[test]
	fn config_can_drop_unknowns() {
		let policy = PolicyConfig::from_json(r#"{"surfaceUnknown": false}"#).unwrap();
		assert_eq!(policy.unknown, UnknownPolicy::Drop);
	}

	#[test]
	fn config_rejects_typos_and_bad_values() {
		assert!(matches!(
			PolicyConfig::from_json(r#"{"branchez": []}"#),
			Err(FlowError::Json(_))
		));
		assert!(matches!(
			PolicyConfig::from_json(r#"{"hiddenLinkPlaceholderValue": 0}"#),
			Err(FlowError::InvalidPlaceholder(_))
		));
	}

	#[test]
	fn records_get_default_capacity_when_missing() {
		let policy = BuildPolicy::audit_outcomes();
		let entities = parse_entities(
			r#"[
				{"id": "f01", "name": "Alpha", "datacap": "1024", "outcome": "PASSED"},
				{"id": "f02", "capacity": 2048},
				{"id": "f03", "name": "Gamma"}
			]"#,
			&policy,
		)
		.unwrap();
		assert_eq!(entities.len(), 3);
		assert_eq!(entities[0].capacity, Capacity::new(1024));
		assert_eq!(entities[0].class_key(), Some("PASSED"));
		assert_eq!(entities[1].capacity, Capacity::new(2048));
		assert_eq!(entities[2].capacity, UNCLASSIFIED_DEFAULT_CAPACITY);
	}

	#[test]
	fn records_without_default_resolve_to_zero() {
		let policy = BuildPolicy::default();
		let entities = parse_entities(r#"[{"id": "f01"}]"#, &policy).unwrap();
		assert_eq!(entities[0].capacity, Capacity::ZERO);
	}

	#[test]
	fn malformed_amounts_fail_the_batch() {
		let err = parse_entities(
			r#"[{"id": "f01", "capacity": "12 TiB"}]"#,
			&BuildPolicy::default(),
		)
		.unwrap_err();
		assert!(matches!(err, FlowError::InvalidCapacity { value } if value == "12 TiB"));
	}
}
