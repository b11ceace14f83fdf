//! The synchronizer and walker scenarios, against a SQLite file
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use nodelink_core::{
    CollectionRegistry, Document, LinkOp, NodeLinkConfig, ReferenceSynchronizer, Repository,
    SyncConfig, TimestampFormat, TreeWalker,
};
use nodelink_store::db::open_shared;
use nodelink_store::education_registry;
use tempfile::TempDir;

fn registry_in(dir: &TempDir) -> Arc<CollectionRegistry> {
    let conn = open_shared(dir.path().join("store.db")).unwrap();
    Arc::new(education_registry(&conn))
}

fn save(registry: &CollectionRegistry, document: Document) -> nodelink_core::FieldMap {
    registry
        .require(&document.collection)
        .unwrap()
        .save(document)
        .unwrap()
        .get_fields(TimestampFormat::Canonical)
}

#[test]
fn test_mirroring_persists_across_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let registry = registry_in(&dir);
        save(&registry, Document::with_uuid("learning_resources", "lr-1"));
        let lo = save(
            &registry,
            Document::with_uuid("learning_objects", "lo-1").with_children("learning_resources", &["lr-1"]),
        );
        ReferenceSynchronizer::new(registry.clone(), SyncConfig::default())
            .update_child_references(&lo, "LearningObject", LinkOp::Add)
            .unwrap();
    }

    let registry = registry_in(&dir);
    let child = registry
        .require("learning_resources")
        .unwrap()
        .find_by_uuid("lr-1")
        .unwrap();
    assert_eq!(child.parent_nodes.get("learning_objects"), &["lo-1".to_string()]);
    assert_eq!(child.version, 2);
}

#[test]
fn test_diff_reconcile_does_not_rewrite_kept_child() {
    let dir = TempDir::new().unwrap();
    let registry = registry_in(&dir);
    let sync = ReferenceSynchronizer::new(registry.clone(), SyncConfig::default());
    save(&registry, Document::with_uuid("skills", "x"));
    save(&registry, Document::with_uuid("skills", "y"));
    let old = save(
        &registry,
        Document::with_uuid("competencies", "c-1").with_children("skills", &["x", "y"]),
    );
    sync.update_child_references(&old, "Competency", LinkOp::Add)
        .unwrap();

    let mut doc = Document::from_fields("competencies", &old).unwrap();
    doc.child_nodes.set("skills", vec!["x".to_string()]);
    let report = sync
        .compare_and_update_child_nodes_references(
            &old,
            &doc.get_fields(TimestampFormat::Canonical),
            "Competency",
        )
        .unwrap();

    assert_eq!(report.updated.len(), 1);
    let skills = registry.require("skills").unwrap();
    assert_eq!(skills.find_by_uuid("x").unwrap().version, 2);
    assert_eq!(skills.find_by_uuid("y").unwrap().version, 3);
}

#[test]
fn test_delete_tree_leaves_nothing_behind() {
    let dir = TempDir::new().unwrap();
    let registry = registry_in(&dir);
    let walker = TreeWalker::from_config(registry.clone(), &NodeLinkConfig::default());
    let sync = walker.synchronizer();

    save(&registry, Document::with_uuid("learning_objects", "lo-1"));
    let lo = save(&registry, Document::with_uuid("learning_objects", "lo-2"));
    for uuid in ["lr-1", "lr-2"] {
        let child = save(
            &registry,
            Document::with_uuid("learning_resources", uuid).with_parents("learning_objects", &["lo-2"]),
        );
        sync.update_parent_references(&child, "LearningResource", LinkOp::Add)
            .unwrap();
    }
    let lo = registry
        .require("learning_objects")
        .unwrap()
        .find_by_uuid(lo["uuid"].as_str().unwrap())
        .unwrap()
        .get_fields(TimestampFormat::Canonical);

    let report = walker.delete_tree(&lo, "LearningObject").unwrap();

    assert_eq!(report.deleted.len(), 3);
    assert!(registry.require("learning_resources").unwrap().list().unwrap().is_empty());
    let remaining = registry.require("learning_objects").unwrap().list().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].uuid, "lo-1");
}
