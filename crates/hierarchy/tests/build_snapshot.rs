use concept_document::{DocumentId, MemoryDocumentStore};
use concept_hierarchy::{
    build_snapshot, Diagnostic, HierarchyError, IncludeKind, ResolveOptions,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn id(s: &str) -> DocumentId {
    DocumentId::from(s)
}

fn build(store: &MemoryDocumentStore, root: &str) -> concept_hierarchy::BuildOutcome {
    build_snapshot(store, id(root), &ResolveOptions::default()).expect("build succeeds")
}

#[test]
fn concepts_from_every_resolved_document_survive_a_dangling_include() {
    let store = MemoryDocumentStore::new("proj")
        .with_document(
            "data/root.json",
            json!({"external": ["domains.json", "missing.json"]}),
        )
        .with_document(
            "data/domains.json",
            json!({
                "ValueDomain": {},
                "Angle": {"directParents": ["ValueDomain"]}
            }),
        );

    let outcome = build(&store, "data/root.json");
    let snapshot = &outcome.snapshot;

    assert!(snapshot.is_concept("ValueDomain"));
    assert!(snapshot.is_concept("Angle"));
    assert_eq!(snapshot.included_documents, vec![id("data/domains.json")]);

    let unresolved: Vec<_> = snapshot.unresolved_edges().collect();
    assert_eq!(unresolved.len(), 1);
    assert_eq!(unresolved[0].path, "missing.json");
    assert_eq!(unresolved[0].kind, IncludeKind::External);

    assert!(outcome.diagnostics.contains(&Diagnostic::DocumentNotFound {
        source: id("data/root.json"),
        path: "missing.json".to_string(),
    }));
}

#[test]
fn include_cycles_terminate_and_keep_all_concepts() {
    let store = MemoryDocumentStore::new("proj")
        .with_document(
            "a.json",
            json!({"external": ["b.json"], "FromA": {}}),
        )
        .with_document(
            "b.json",
            json!({"external": ["a.json"], "FromB": {"directParents": ["FromA"]}}),
        );

    let outcome = build(&store, "a.json");
    let snapshot = &outcome.snapshot;

    // Each document is visited exactly once despite the include loop.
    assert_eq!(snapshot.included_documents, vec![id("b.json")]);
    assert!(snapshot.is_concept("FromA"));
    assert!(snapshot.is_concept("FromB"));
    assert!(snapshot.is_descendant_of("FromB", "FromA"));
}

#[test]
fn first_definition_wins_but_both_documents_are_recorded() {
    let store = MemoryDocumentStore::new("proj")
        .with_document(
            "root.json",
            json!({"external": ["first.json", "second.json"]}),
        )
        .with_document(
            "first.json",
            json!({"Shared": {"directParents": ["FromFirst"]}, "FromFirst": {}}),
        )
        .with_document(
            "second.json",
            json!({"Shared": {"directParents": ["FromSecond"]}, "FromSecond": {}}),
        );

    let outcome = build(&store, "root.json");
    let snapshot = &outcome.snapshot;

    // Extraction runs in discovery order, so first.json's definition
    // of Shared wins and second.json's is skipped.
    assert_eq!(
        snapshot.direct_parents["Shared"],
        vec!["FromFirst".to_string()]
    );
    assert!(snapshot.concepts_by_document[&id("first.json")].contains("Shared"));
    assert!(snapshot.concepts_by_document[&id("second.json")].contains("Shared"));

    let duplicate = outcome
        .diagnostics
        .iter()
        .find(|d| matches!(d, Diagnostic::DuplicateConcept { .. }))
        .expect("duplicate flagged");
    assert_eq!(
        duplicate,
        &Diagnostic::DuplicateConcept {
            name: "Shared".to_string(),
            first: id("first.json"),
            duplicate: id("second.json"),
        }
    );
}

#[test]
fn data_fragments_are_included_but_define_no_concepts() {
    let store = MemoryDocumentStore::new("proj")
        .with_document("root.json", json!({"external": ["concepts.json"]}))
        .with_document(
            "concepts.json",
            json!({
                "Angle": {"directParents": [], "data": "fragments/angle.json"}
            }),
        )
        .with_document(
            "fragments/angle.json",
            json!({"unit": "radian", "range": [0, 6.28]}),
        );

    let outcome = build(&store, "root.json");
    let snapshot = &outcome.snapshot;

    assert_eq!(
        snapshot.included_documents,
        vec![id("concepts.json"), id("fragments/angle.json")]
    );
    // The fragment's top-level entries are data, not concepts.
    assert_eq!(
        snapshot.concepts.iter().map(String::as_str).collect::<Vec<_>>(),
        vec!["Angle"]
    );

    let data_edge = snapshot
        .edges
        .iter()
        .find(|e| e.kind == IncludeKind::ConceptData)
        .expect("data edge recorded");
    assert_eq!(data_edge.target, Some(id("fragments/angle.json")));
}

#[test]
fn root_level_concepts_are_extracted() {
    let store = MemoryDocumentStore::new("proj").with_document(
        "root.json",
        json!({
            "external": [],
            "ValueDomain": {},
            "Function": {"directParents": ["ValueDomain"]}
        }),
    );

    let outcome = build(&store, "root.json");
    let snapshot = &outcome.snapshot;

    assert!(snapshot.included_documents.is_empty());
    assert!(snapshot.is_concept("Function"));
    assert_eq!(
        snapshot.concepts_by_document[&id("root.json")].len(),
        2
    );
}

#[test]
fn malformed_documents_degrade_without_aborting() {
    let store = MemoryDocumentStore::new("proj")
        .with_document(
            "root.json",
            json!({"external": ["broken.json", "good.json"]}),
        )
        .with_document("broken.json", json!(["not", "an", "object"]))
        .with_document("good.json", json!({"Kept": {}}));

    let outcome = build(&store, "root.json");

    assert!(outcome.snapshot.is_concept("Kept"));
    assert!(outcome.diagnostics.iter().any(|d| matches!(
        d,
        Diagnostic::MalformedDocument { id, .. } if id.as_str() == "broken.json"
    )));
}

#[test]
fn concept_cycle_fails_the_whole_build() {
    let store = MemoryDocumentStore::new("proj")
        .with_document("root.json", json!({"external": ["cycle.json"]}))
        .with_document(
            "cycle.json",
            json!({
                "A": {"directParents": ["B"]},
                "B": {"directParents": ["A"]}
            }),
        );

    let err = build_snapshot(&store, id("root.json"), &ResolveOptions::default()).unwrap_err();
    let HierarchyError::CycleDetected { remaining } = err;
    assert_eq!(remaining, vec!["A".to_string(), "B".to_string()]);
}

#[test]
fn rebuilds_of_the_same_graph_are_identical() {
    let store = MemoryDocumentStore::new("proj")
        .with_document(
            "root.json",
            json!({"external": ["a.json", "b.json"]}),
        )
        .with_document(
            "a.json",
            json!({
                "ValueDomain": {},
                "Angle": {"directParents": ["ValueDomain"]},
                "Length": {"directParents": ["ValueDomain"]}
            }),
        )
        .with_document(
            "b.json",
            json!({
                "Function": {"directParents": ["ValueDomain"]},
                "Sine": {"directParents": ["Function"]}
            }),
        );

    let first = build(&store, "root.json");
    for _ in 0..5 {
        let next = build(&store, "root.json");
        assert_eq!(next.snapshot, first.snapshot);
    }

    // Parent-before-child holds for every declared edge.
    let order = &first.snapshot.topological_order;
    let position = |name: &str| order.iter().position(|n| n == name).unwrap();
    for (child, parents) in &first.snapshot.direct_parents {
        for parent in parents {
            assert!(position(parent) < position(child), "{parent} before {child}");
        }
    }
}

#[test]
fn header_references_resolve_from_the_project_root() {
    let options = ResolveOptions {
        resolve_headers: true,
        ..ResolveOptions::default()
    };
    let store = MemoryDocumentStore::new("robot")
        .with_document(
            "data/root.json",
            json!({"external": ["concepts.json"], "header": "/common.json"}),
        )
        .with_document("data/concepts.json", json!({"Angle": {}}))
        .with_document("include/robot/common.json", json!({"NotAConcept": {}}));

    let outcome =
        build_snapshot(&store, id("data/root.json"), &options).expect("build succeeds");
    let snapshot = &outcome.snapshot;

    let header_edge = snapshot
        .edges
        .iter()
        .find(|e| e.kind == IncludeKind::Header)
        .expect("header edge recorded");
    assert_eq!(header_edge.target, Some(id("include/robot/common.json")));

    // Header documents contribute to the include set, not the concept set.
    assert!(snapshot
        .included_documents
        .contains(&id("include/robot/common.json")));
    assert!(!snapshot.is_concept("NotAConcept"));
}
