//! Property tests for node map algebra and the mirroring invariant
#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::collections::BTreeSet;

use common::{education_registry, fetch, insert, synchronizer};
use nodelink_core::{Document, LinkOp, NodeMap, TimestampFormat};
use proptest::prelude::*;

const TYPES: &[&str] = &["assessments", "skills", "learning_resources"];

fn node_map() -> impl Strategy<Value = NodeMap> {
    prop::collection::vec((0..TYPES.len(), 0u8..6), 0..12).prop_map(|pairs| {
        let mut map = NodeMap::new();
        for (t, n) in pairs {
            map.add(TYPES[t], &format!("n{}", n));
        }
        map
    })
}

fn pairs(map: &NodeMap) -> BTreeSet<(String, String)> {
    map.iter_refs().map(|r| (r.collection, r.uuid)).collect()
}

proptest! {
    #[test]
    fn prop_add_is_idempotent(map in node_map(), t in 0..TYPES.len(), n in 0u8..6) {
        let mut once = map.clone();
        once.add(TYPES[t], &format!("n{}", n));
        let mut twice = once.clone();
        let changed = twice.add(TYPES[t], &format!("n{}", n));
        prop_assert!(!changed);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_diff_is_exact_set_difference(old in node_map(), new in node_map()) {
        let delta = NodeMap::diff(&old, &new);
        let old_set = pairs(&old);
        let new_set = pairs(&new);

        let removed: BTreeSet<_> = delta.removed.into_iter().map(|r| (r.collection, r.uuid)).collect();
        let added: BTreeSet<_> = delta.added.into_iter().map(|r| (r.collection, r.uuid)).collect();

        prop_assert_eq!(removed, old_set.difference(&new_set).cloned().collect::<BTreeSet<_>>());
        prop_assert_eq!(added, new_set.difference(&old_set).cloned().collect::<BTreeSet<_>>());
    }

    #[test]
    fn prop_value_round_trip_preserves_references(map in node_map()) {
        let parsed = NodeMap::from_value(&map.to_value()).unwrap();
        prop_assert_eq!(pairs(&parsed), pairs(&map));
        prop_assert_eq!(parsed.total_count(), map.total_count());
    }

    #[test]
    fn prop_reconcile_leaves_graph_mirrored(old in node_map(), new in node_map()) {
        // Every generated uuid exists in each of the three collections
        let registry = education_registry();
        for t in TYPES {
            for n in 0..6 {
                insert(&registry, Document::with_uuid(*t, format!("n{}", n)));
            }
        }
        let mut parent = Document::with_uuid("learning_objects", "lo-1");
        parent.child_nodes = old.clone();
        let old_fields = insert(&registry, parent.clone());
        let sync = synchronizer(&registry);
        sync.update_child_references(&old_fields, "LearningObject", LinkOp::Add).unwrap();

        parent.child_nodes = new.clone();
        let new_fields = parent.get_fields(TimestampFormat::Canonical);
        sync.compare_and_update_child_nodes_references(&old_fields, &new_fields, "LearningObject").unwrap();

        let expected = pairs(&new);
        for t in TYPES {
            for n in 0..6 {
                let uuid = format!("n{}", n);
                let child = fetch(&registry, t, &uuid);
                let linked = child.parent_nodes.contains("learning_objects", "lo-1");
                prop_assert_eq!(linked, expected.contains(&(t.to_string(), uuid.clone())));
                prop_assert!(child.parent_nodes.get("learning_objects").len() <= 1);
            }
        }
    }
}
