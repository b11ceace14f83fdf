#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::collections::BTreeSet;

use common::{create_linked, education_registry, fetch, insert, is_gone, walker};
use nodelink_core::{
    Depth, Document, Expansion, FailurePolicy, FieldMap, NodeLinkError, NodeRef, Relation,
    TreeWalker, WalkerConfig,
};
use serde_json::{json, Value};

fn uuids(list: &Value) -> BTreeSet<String> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["uuid"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn test_expansion_replaces_uuids_with_documents() {
    let registry = education_registry();
    insert(&registry, Document::with_uuid("learning_objects", "id1").with_field("name", json!("One")));
    insert(&registry, Document::with_uuid("learning_objects", "id2").with_field("name", json!("Two")));
    let root = insert(
        &registry,
        Document::with_uuid("learning_experiences", "le-1")
            .with_children("learning_objects", &["id1", "id2"]),
    );

    let expanded = walker(&registry).load_child_nodes_data(&root).unwrap();

    let list = &expanded["child_nodes"]["learning_objects"];
    assert_eq!(
        uuids(list),
        BTreeSet::from(["id1".to_string(), "id2".to_string()])
    );
    assert_eq!(list[0]["name"], json!("One"));
    // The caller's map is untouched
    assert_eq!(root["child_nodes"]["learning_objects"], json!(["id1", "id2"]));
}

#[test]
fn test_expansion_recurses_to_leaves() {
    let registry = education_registry();
    insert(&registry, Document::with_uuid("learning_resources", "lr-1"));
    insert(
        &registry,
        Document::with_uuid("learning_objects", "lo-1").with_children("learning_resources", &["lr-1"]),
    );
    let root = insert(
        &registry,
        Document::with_uuid("learning_experiences", "le-1").with_children("learning_objects", &["lo-1"]),
    );

    let expanded = walker(&registry).load_child_nodes_data(&root).unwrap();

    let grandchild = &expanded["child_nodes"]["learning_objects"][0]["child_nodes"]["learning_resources"][0];
    assert_eq!(grandchild["uuid"], json!("lr-1"));
}

#[test]
fn test_diamond_expands_shared_node_twice() {
    let registry = education_registry();
    insert(&registry, Document::with_uuid("skills", "shared"));
    insert(
        &registry,
        Document::with_uuid("learning_objects", "lo-a").with_children("skills", &["shared"]),
    );
    insert(
        &registry,
        Document::with_uuid("learning_objects", "lo-b").with_children("skills", &["shared"]),
    );
    let root = insert(
        &registry,
        Document::with_uuid("learning_experiences", "le-1")
            .with_children("learning_objects", &["lo-a", "lo-b"]),
    );

    let expanded = walker(&registry).load_child_nodes_data(&root).unwrap();

    for branch in 0..2 {
        assert_eq!(
            expanded["child_nodes"]["learning_objects"][branch]["child_nodes"]["skills"][0]["uuid"],
            json!("shared")
        );
    }
}

#[test]
fn test_cycle_through_descendants_is_detected() {
    let registry = education_registry();
    insert(
        &registry,
        Document::with_uuid("learning_objects", "lo-1").with_children("skills", &["s-1"]),
    );
    insert(
        &registry,
        Document::with_uuid("skills", "s-1").with_children("learning_objects", &["lo-1"]),
    );
    let root = insert(
        &registry,
        Document::with_uuid("learning_experiences", "le-1").with_children("learning_objects", &["lo-1"]),
    );

    let err = walker(&registry).load_child_nodes_data(&root).unwrap_err();

    assert_eq!(
        err,
        NodeLinkError::CycleDetected {
            collection: "learning_objects".to_string(),
            uuid: "lo-1".to_string(),
        }
    );
}

#[test]
fn test_cycle_back_to_root_is_reported_at_root() {
    let registry = education_registry();
    insert(
        &registry,
        Document::with_uuid("learning_objects", "lo-1").with_children("learning_experiences", &["le-1"]),
    );
    let root = insert(
        &registry,
        Document::with_uuid("learning_experiences", "le-1").with_children("learning_objects", &["lo-1"]),
    );

    let err = walker(&registry).load_child_nodes_data(&root).unwrap_err();

    assert_eq!(
        err,
        NodeLinkError::CycleDetected {
            collection: "learning_experiences".to_string(),
            uuid: "le-1".to_string(),
        }
    );
}

#[test]
fn test_missing_child_propagates_not_found() {
    let registry = education_registry();
    let root = insert(
        &registry,
        Document::with_uuid("learning_experiences", "le-1").with_children("learning_objects", &["gone"]),
    );

    let err = walker(&registry).load_child_nodes_data(&root).unwrap_err();

    assert_eq!(err, NodeLinkError::not_found("learning_objects", "gone"));
}

#[test]
fn test_immediate_parents_stop_after_one_level() {
    let registry = education_registry();
    insert(&registry, Document::with_uuid("curriculum_pathways", "cp-1"));
    create_linked(
        &registry,
        Document::with_uuid("learning_experiences", "le-1").with_parents("curriculum_pathways", &["cp-1"]),
        "LearningExperience",
    );
    let lo = create_linked(
        &registry,
        Document::with_uuid("learning_objects", "lo-1").with_parents("learning_experiences", &["le-1"]),
        "LearningObject",
    );

    let expanded = walker(&registry)
        .load_immediate_parent_nodes_data(&lo)
        .unwrap();

    let parent = &expanded["parent_nodes"]["learning_experiences"][0];
    assert_eq!(parent["uuid"], json!("le-1"));
    assert_eq!(parent["parent_nodes"]["curriculum_pathways"], json!(["cp-1"]));
    // child_nodes are left raw
    assert!(expanded["child_nodes"].as_object().unwrap().is_empty());
}

#[test]
fn test_load_nodes_data_threads_context_to_visitor() {
    let registry = education_registry();
    insert(&registry, Document::with_uuid("assessments", "a-1"));
    insert(&registry, Document::with_uuid("assessments", "a-2"));
    let root = insert(
        &registry,
        Document::with_uuid("learning_objects", "lo-1").with_children("assessments", &["a-1", "a-2"]),
    );

    struct Progress {
        completed: Vec<&'static str>,
    }
    let progress = Progress {
        completed: vec!["a-2"],
    };
    let mut visited = Vec::new();
    let mut annotate = |collection: &str, fields: &mut FieldMap, context: Option<&Progress>| {
        let uuid = fields["uuid"].as_str().unwrap_or_default().to_string();
        let done = context.is_some_and(|p| p.completed.iter().any(|c| *c == uuid));
        fields.insert("completed".to_string(), json!(done));
        visited.push(format!("{}/{}", collection, uuid));
        Ok(())
    };

    let expanded = walker(&registry)
        .load_nodes_data(
            &root,
            "learning_objects",
            Some(&progress),
            &Expansion::new(Relation::Children, Depth::Recursive),
            &mut annotate,
        )
        .unwrap();

    let list = &expanded["child_nodes"]["assessments"];
    assert_eq!(list[0]["completed"], json!(false));
    assert_eq!(list[1]["completed"], json!(true));
    assert_eq!(visited, vec!["assessments/a-1", "assessments/a-2"]);
}

#[test]
fn test_load_nodes_data_levels_limit() {
    let registry = education_registry();
    insert(&registry, Document::with_uuid("learning_resources", "lr-1"));
    insert(
        &registry,
        Document::with_uuid("learning_objects", "lo-1").with_children("learning_resources", &["lr-1"]),
    );
    let root = insert(
        &registry,
        Document::with_uuid("learning_experiences", "le-1").with_children("learning_objects", &["lo-1"]),
    );

    let expanded = walker(&registry)
        .load_nodes_data(
            &root,
            "learning_experiences",
            None::<&()>,
            &Expansion::new(Relation::Children, Depth::Levels(1)),
            &mut nodelink_core::traversal::NoopVisitor,
        )
        .unwrap();

    let child = &expanded["child_nodes"]["learning_objects"][0];
    assert_eq!(child["child_nodes"]["learning_resources"], json!(["lr-1"]));
}

#[test]
fn test_child_count_sums_all_lists() {
    let registry = education_registry();
    let fields = Document::with_uuid("learning_objects", "lo-1")
        .with_children("assessments", &["a-1", "a-2"])
        .with_children("learning_resources", &["lr-1"])
        .with_children("skills", &[])
        .get_fields(nodelink_core::TimestampFormat::Raw);

    assert_eq!(walker(&registry).get_child_node_count(&fields).unwrap(), 3);
}

#[test]
fn test_return_child_nodes_data_flattens_with_entity_type() {
    let registry = education_registry();
    insert(&registry, Document::with_uuid("assessments", "a-1"));
    insert(&registry, Document::with_uuid("learning_resources", "lr-1"));
    insert(&registry, Document::with_uuid("learning_resources", "lr-2"));
    let root = insert(
        &registry,
        Document::with_uuid("learning_objects", "lo-1")
            .with_children("learning_resources", &["lr-2", "lr-1"])
            .with_children("assessments", &["a-1"]),
    );

    let flat = walker(&registry).return_child_nodes_data(&root).unwrap();

    let tagged: Vec<(String, String)> = flat
        .iter()
        .map(|f| {
            (
                f["entity_type"].as_str().unwrap().to_string(),
                f["uuid"].as_str().unwrap().to_string(),
            )
        })
        .collect();
    assert_eq!(
        tagged,
        vec![
            ("assessments".to_string(), "a-1".to_string()),
            ("learning_resources".to_string(), "lr-2".to_string()),
            ("learning_resources".to_string(), "lr-1".to_string()),
        ]
    );
}

#[test]
fn test_delete_child_tree_removes_leaves_first() {
    // GIVEN le-1 -> lo-1 -> {lr-1, lr-2}, all linked both ways
    let registry = education_registry();
    let le = create_linked(
        &registry,
        Document::with_uuid("learning_experiences", "le-1"),
        "LearningExperience",
    );
    create_linked(
        &registry,
        Document::with_uuid("learning_objects", "lo-1").with_parents("learning_experiences", &["le-1"]),
        "LearningObject",
    );
    for uuid in ["lr-1", "lr-2"] {
        create_linked(
            &registry,
            Document::with_uuid("learning_resources", uuid).with_parents("learning_objects", &["lo-1"]),
            "LearningResource",
        );
    }
    let le = common::fetch_fields(&registry, "learning_experiences", le["uuid"].as_str().unwrap());

    // WHEN deleting everything below le-1
    let report = walker(&registry).delete_child_tree(&le).unwrap();

    // THEN children go before their parent and le-1 survives with no children
    assert_eq!(
        report.deleted,
        vec![
            NodeRef::new("learning_resources", "lr-1"),
            NodeRef::new("learning_resources", "lr-2"),
            NodeRef::new("learning_objects", "lo-1"),
        ]
    );
    for (collection, uuid) in [
        ("learning_resources", "lr-1"),
        ("learning_resources", "lr-2"),
        ("learning_objects", "lo-1"),
    ] {
        assert!(is_gone(&registry, collection, uuid));
    }
    let root = fetch(&registry, "learning_experiences", "le-1");
    assert!(root.child_nodes.is_empty());
}

#[test]
fn test_delete_detaches_from_parents_outside_the_tree() {
    // GIVEN a skill shared by a learning object and an unrelated competency
    let registry = education_registry();
    insert(&registry, Document::with_uuid("competencies", "c-1"));
    let lo = create_linked(&registry, Document::with_uuid("learning_objects", "lo-1"), "LearningObject");
    create_linked(
        &registry,
        Document::with_uuid("skills", "s-1")
            .with_parents("learning_objects", &["lo-1"])
            .with_parents("competencies", &["c-1"]),
        "Skill",
    );
    let lo = common::fetch_fields(&registry, "learning_objects", lo["uuid"].as_str().unwrap());

    walker(&registry).delete_child_tree(&lo).unwrap();

    // THEN the competency no longer points at the deleted skill
    assert!(fetch(&registry, "competencies", "c-1").child_nodes.is_empty());
}

#[test]
fn test_delete_child_tree_handles_diamond() {
    let registry = education_registry();
    create_linked(&registry, Document::with_uuid("learning_experiences", "le-1"), "LearningExperience");
    for uuid in ["lo-a", "lo-b"] {
        create_linked(
            &registry,
            Document::with_uuid("learning_objects", uuid).with_parents("learning_experiences", &["le-1"]),
            "LearningObject",
        );
    }
    create_linked(
        &registry,
        Document::with_uuid("skills", "shared").with_parents("learning_objects", &["lo-a", "lo-b"]),
        "Skill",
    );
    let root = common::fetch_fields(&registry, "learning_experiences", "le-1");

    let report = walker(&registry).delete_child_tree(&root).unwrap();

    assert_eq!(
        report.deleted,
        vec![
            NodeRef::new("skills", "shared"),
            NodeRef::new("learning_objects", "lo-a"),
            NodeRef::new("learning_objects", "lo-b"),
        ]
    );
}

#[test]
fn test_delete_respects_max_depth() {
    let registry = education_registry();
    create_linked(&registry, Document::with_uuid("learning_experiences", "le-1"), "LearningExperience");
    create_linked(
        &registry,
        Document::with_uuid("learning_objects", "lo-1").with_parents("learning_experiences", &["le-1"]),
        "LearningObject",
    );
    create_linked(
        &registry,
        Document::with_uuid("learning_resources", "lr-1").with_parents("learning_objects", &["lo-1"]),
        "LearningResource",
    );
    let shallow = TreeWalker::new(
        common::synchronizer(&registry),
        WalkerConfig { max_depth: 1 },
    );
    let root = common::fetch_fields(&registry, "learning_experiences", "le-1");

    let err = shallow.delete_child_tree(&root).unwrap_err();

    assert!(matches!(err, NodeLinkError::ValidationFailure { .. }));
    // Nothing below the limit was reached, so nothing was deleted
    assert!(!is_gone(&registry, "learning_resources", "lr-1"));
    assert!(!is_gone(&registry, "learning_objects", "lo-1"));
}

/// le-1 lists a real learning object and one that was never stored
fn tree_with_dangling_child(registry: &std::sync::Arc<nodelink_core::CollectionRegistry>) -> FieldMap {
    insert(
        registry,
        Document::with_uuid("learning_objects", "real").with_parents("learning_experiences", &["le-1"]),
    );
    insert(
        registry,
        Document::with_uuid("learning_experiences", "le-1")
            .with_children("learning_objects", &["real", "ghost"]),
    )
}

#[test]
fn test_best_effort_cascade_skips_missing_child() {
    let registry = education_registry();
    let root = tree_with_dangling_child(&registry);
    let lenient = TreeWalker::new(
        common::synchronizer(&registry).with_policy(FailurePolicy::BestEffort),
        WalkerConfig::default(),
    );

    let report = lenient.delete_tree(&root, "LearningExperience").unwrap();

    assert_eq!(
        report.deleted,
        vec![
            NodeRef::new("learning_objects", "real"),
            NodeRef::new("learning_experiences", "le-1"),
        ]
    );
    assert_eq!(report.skipped, vec![NodeRef::new("learning_objects", "ghost")]);
    assert!(is_gone(&registry, "learning_objects", "real"));
    assert!(is_gone(&registry, "learning_experiences", "le-1"));
}

#[test]
fn test_strict_cascade_stops_at_missing_child() {
    let registry = education_registry();
    let root = tree_with_dangling_child(&registry);

    let err = walker(&registry)
        .delete_tree(&root, "LearningExperience")
        .unwrap_err();

    assert_eq!(err, NodeLinkError::not_found("learning_objects", "ghost"));
    assert!(!is_gone(&registry, "learning_experiences", "le-1"));
}
