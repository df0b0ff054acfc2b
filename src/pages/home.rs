use leptos::prelude::*;
use log::{info, warn};

use crate::components::sankey::{SankeyCanvas, format_capacity};
use crate::flow::{
	AuditOutcome, BuildPolicy, Entity, ExpansionState, FlowError, FlowGraph, PolicyConfig, build,
	parse_entities,
};

// Sample deployment taxonomy; real deployments ship their own.
const PATHWAY_POLICY: &str = r#"{
	"rootLabel": "Allocators",
	"branches": ["Manual", "Automatic", "Market-based"],
	"unknownLabel": "Unknown"
}"#;

const ALLOCATORS: &str = r#"[
	{"id": "f03011612", "name": "Atlas Storage", "datacap": "5629499534213120", "pathway": "Manual"},
	{"id": "f03015751", "name": "Northwind Data", "datacap": "2251799813685248", "pathway": "Manual"},
	{"id": "f03018491", "name": "Open Archive", "datacap": "1125899906842624", "pathway": "Automatic"},
	{"id": "f03019922", "datacap": "562949953421312", "pathway": "Automatic"},
	{"id": "f03024417", "name": "Bazaar Pool", "datacap": "3377699720527872", "pathway": "Market-based"},
	{"id": "f03028800", "name": "Legacy Notary", "datacap": "281474976710656"}
]"#;

const AUDITS: &str = r#"[
	{"id": "f03011612", "name": "Atlas Storage", "datacap": "4503599627370496", "outcome": "PASSED"},
	{"id": "f03015751", "name": "Northwind Data", "datacap": "1125899906842624", "outcome": "PASSED_CONDITIONALLY"},
	{"id": "f03018491", "name": "Open Archive", "datacap": "562949953421312", "outcome": "FAILED"},
	{"id": "f03024417", "name": "Bazaar Pool", "datacap": "2251799813685248", "outcome": "PASSED"},
	{"id": "f03028800", "name": "Legacy Notary"}
]"#;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Diagram {
	Audits,
	Pathways,
}

#[derive(Clone)]
struct Dataset {
	policy: BuildPolicy,
	entities: Vec<Entity>,
	classify: fn(&Entity) -> Option<&str>,
}

impl Dataset {
	fn build(&self, expansion: &ExpansionState) -> FlowGraph {
		build(
			&self.entities,
			expansion.as_deref(),
			&self.policy,
			self.classify,
		)
	}
}

#[derive(Clone)]
struct SampleData {
	audits: Dataset,
	pathways: Dataset,
}

impl SampleData {
	fn load() -> Result<Self, FlowError> {
		let audit_policy = BuildPolicy::audit_outcomes();
		let audits = Dataset {
			entities: parse_entities(AUDITS, &audit_policy)?,
			policy: audit_policy,
			classify: AuditOutcome::classify,
		};

		let pathway_policy = PolicyConfig::from_json(PATHWAY_POLICY)?;
		let pathways = Dataset {
			entities: parse_entities(ALLOCATORS, &pathway_policy)?,
			policy: pathway_policy,
			classify: Entity::class_key,
		};

		info!(
			"loaded {} audit rows and {} allocators",
			audits.entities.len(),
			pathways.entities.len()
		);
		Ok(Self { audits, pathways })
	}

	fn dataset(&self, diagram: Diagram) -> &Dataset {
		match diagram {
			Diagram::Audits => &self.audits,
			Diagram::Pathways => &self.pathways,
		}
	}
}

#[component]
fn FlowExplorer(data: SampleData) -> impl IntoView {
	let data = StoredValue::new(data);
	let diagram = RwSignal::new(Diagram::Audits);
	let expansion = RwSignal::new(ExpansionState::collapsed());

	// Full rebuild on every change; the datasets are small.
	let graph = Signal::derive(move || {
		let state = expansion.get();
		let graph = data.with_value(|d| d.dataset(diagram.get()).build(&state));
		if cfg!(debug_assertions) {
			if let Err(err) = graph.verify() {
				warn!("flow graph failed verification: {err}");
			}
		}
		graph
	});

	let total = move || {
		graph
			.with(|g| g.root().map(|root| format_capacity(root.capacity())))
			.unwrap_or_default()
	};

	let on_node_click = move |name: String| {
		data.with_value(|d| {
			let policy = &d.dataset(diagram.get_untracked()).policy;
			expansion.update(|state| state.toggle(&name, policy));
		});
		info!("expansion is now {:?}", expansion.get_untracked().as_deref());
	};

	let select = move |next: Diagram| {
		diagram.set(next);
		expansion.update(ExpansionState::reset);
	};

	view! {
		<div class="flow-explorer">
			<header class="flow-toolbar">
				<button
					class:active=move || diagram.get() == Diagram::Audits
					on:click=move |_| select(Diagram::Audits)
				>
					"Audit outcomes"
				</button>
				<button
					class:active=move || diagram.get() == Diagram::Pathways
					on:click=move |_| select(Diagram::Pathways)
				>
					"Allocator pathways"
				</button>
				<button
					disabled=move || expansion.get().is_collapsed()
					on:click=move |_| expansion.update(ExpansionState::reset)
				>
					"Collapse"
				</button>
				<span class="flow-status">
					{move || match expansion.get().as_deref() {
						Some(branch) => format!("Showing {branch}"),
						None => "Click a branch to expand it".to_string(),
					}}
				</span>
				<span class="flow-total">{total}</span>
			</header>
			<div class="flow-canvas">
				<SankeyCanvas data=graph on_node_click=on_node_click fullscreen=true />
			</div>
		</div>
	}
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>
			<div class="fullscreen-graph">
				<div class="graph-overlay">
					<h1>"Datacap Flow"</h1>
					<p class="subtitle">
						"Click a branch to list its members. Click it again to collapse."
					</p>
				</div>
				{move || SampleData::load().map(|data| view! { <FlowExplorer data=data /> })}
			</div>
		</ErrorBoundary>
	}
}
