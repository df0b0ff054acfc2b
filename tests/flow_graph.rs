use datacap_flow::flow::{
	AuditOutcome, BuildPolicy, Capacity, Entity, Enumeration, ExpansionState, FlowGraph,
	FlowValue, HIDDEN_LINK_PLACEHOLDER_VALUE, PolicyConfig, build, build_classified,
	next_expansion, parse_entities,
};

fn sample() -> Vec<Entity> {
	vec![
		Entity::new("a1", 10u64).named("Alpha").classified("X"),
		Entity::new("a2", 20u64).named("Beta").classified("Y"),
		Entity::new("a3", 5u64).named("Gamma").classified("X"),
	]
}

fn sample_policy() -> BuildPolicy {
	BuildPolicy::new(Enumeration::fixed(["X", "Y"]))
}

fn root_outflow(graph: &FlowGraph) -> Capacity {
	graph.outgoing(0).map(|link| link.value.capacity()).sum()
}

#[test]
fn test_collapsed_scenario() {
	let graph = build_classified(&sample(), None, &sample_policy());
	graph.verify().unwrap();

	assert_eq!(graph.root().unwrap().capacity(), Capacity::new(35));
	for (name, capacity) in [("X", 15u128), ("Y", 20)] {
		let branch = graph.node_by_name(name).unwrap();
		assert_eq!(branch.capacity(), Capacity::new(capacity));
		let links: Vec<_> = graph.outgoing(branch.index).collect();
		assert_eq!(links.len(), 1);
		assert_eq!(
			links[0].value,
			FlowValue::Placeholder(HIDDEN_LINK_PLACEHOLDER_VALUE)
		);
		assert!(graph.node(links[0].target).unwrap().is_hidden);
	}
}

#[test]
fn test_expanded_scenario() {
	let graph = build_classified(&sample(), Some("X"), &sample_policy());
	graph.verify().unwrap();

	let x = graph.node_by_name("X").unwrap();
	let children: Vec<_> = graph.children(x.index).collect();
	assert_eq!(children.len(), 2);
	assert_eq!(children[0].name, "Alpha");
	assert_eq!(children[0].capacity(), Capacity::new(10));
	assert_eq!(children[1].name, "Gamma");
	assert_eq!(children[1].capacity(), Capacity::new(5));
	let outflow: Capacity = graph
		.outgoing(x.index)
		.map(|link| link.value.capacity())
		.sum();
	assert_eq!(outflow, x.capacity());
}

#[test]
fn test_conservation_and_partition() {
	let entities: Vec<_> = (0..40u64)
		.map(|i| {
			let entity = Entity::new(format!("f0{i}"), i * 1024 + 1);
			match i % 4 {
				0 => entity.classified("Manual"),
				1 => entity.classified("Automatic"),
				2 => entity.classified("Legacy"),
				_ => entity,
			}
		})
		.collect();
	let input_total: Capacity = entities.iter().map(|e| e.capacity).sum();
	let policy = BuildPolicy::pathways(["Manual", "Automatic"]);

	for expansion in [None, Some("Manual"), Some("Unknown")] {
		let graph = build_classified(&entities, expansion, &policy);
		graph.verify().unwrap();
		let root = graph.root().unwrap();
		assert_eq!(root.capacity(), input_total);
		assert_eq!(root_outflow(&graph), input_total);

		let mut seen: Vec<&str> = graph
			.branches()
			.flat_map(|branch| branch.members.iter().map(|e| e.id.as_str()))
			.collect();
		seen.sort_unstable();
		let mut expected: Vec<&str> = entities.iter().map(|e| e.id.as_str()).collect();
		expected.sort_unstable();
		assert_eq!(seen, expected);
	}
}

#[test]
fn test_indices_are_contiguous_and_resolve() {
	let graph = build_classified(&sample(), Some("Y"), &sample_policy());
	let indices: Vec<_> = graph.nodes.iter().map(|n| n.index).collect();
	assert_eq!(indices, (0..graph.nodes.len()).collect::<Vec<_>>());
	for link in &graph.links {
		assert!(link.source < graph.nodes.len());
		assert!(link.target < graph.nodes.len());
		assert_ne!(link.target, 0);
	}
}

#[test]
fn test_click_flow_round_trip() {
	let entities = sample();
	let policy = sample_policy();
	let mut state = ExpansionState::collapsed();

	let graph = build_classified(&entities, state.as_deref(), &policy);
	let stub = graph.nodes.iter().find(|n| n.is_hidden).unwrap();
	state.toggle(&stub.name, &policy);
	assert_eq!(state.as_deref(), Some("X"));

	let graph = build_classified(&entities, state.as_deref(), &policy);
	let alpha = graph.node_by_name("Alpha").unwrap();
	assert!(alpha.is_terminal);
	state.toggle(&alpha.name, &policy);
	assert_eq!(state.as_deref(), Some("X"));

	state.toggle("Y", &policy);
	assert_eq!(state.as_deref(), Some("Y"));
	state.toggle("Y", &policy);
	assert!(state.is_collapsed());

	let once = next_expansion("X", None, &policy);
	let twice = next_expansion("X", once.as_deref(), &policy);
	assert_eq!(twice, None);
}

#[test]
fn test_audit_pipeline_from_json() {
	let policy = PolicyConfig::from_json(
		r#"{
			"rootLabel": "Audits",
			"branches": ["Passed", "Passed Conditionally", "Failed"],
			"unknownLabel": "Not Audited",
			"unclassifiedDefaultCapacity": 5
		}"#,
	)
	.unwrap();
	assert_eq!(policy.branches, BuildPolicy::audit_outcomes().branches);

	let entities = parse_entities(
		r#"[
			{"id": "f01", "name": "Alpha", "datacap": "4096", "outcome": "PASSED"},
			{"id": "f02", "name": "Beta", "datacap": "1024", "outcome": "FAILED"},
			{"id": "f03", "name": "Gamma"}
		]"#,
		&policy,
	)
	.unwrap();

	let graph = build(&entities, Some("Not Audited"), &policy, AuditOutcome::classify);
	graph.verify().unwrap();
	let names: Vec<_> = graph.branches().map(|n| n.name.as_str()).collect();
	assert_eq!(
		names,
		["Passed", "Passed Conditionally", "Failed", "Not Audited"]
	);
	assert_eq!(
		graph.node_by_name("Passed Conditionally").unwrap().capacity(),
		Capacity::ZERO
	);
	let gamma = graph.node_by_name("Gamma").unwrap();
	assert!(gamma.is_terminal);
	assert_eq!(gamma.capacity(), Capacity::new(5));
	assert_eq!(graph.root().unwrap().capacity(), Capacity::new(4096 + 1024 + 5));
}
