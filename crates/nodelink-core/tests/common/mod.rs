use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use nodelink_core::{
    CollectionRegistry, Document, FieldMap, InMemoryRepository, LinkOp, NodeLinkConfig,
    ReferenceSynchronizer, Repository, Result, SyncConfig, TimestampFormat, TreeWalker,
};

/// Registry with every education collection backed by an empty in-memory repository
#[allow(dead_code)]
pub fn education_registry() -> Arc<CollectionRegistry> {
    Arc::new(CollectionRegistry::education_platform(|name| {
        Arc::new(InMemoryRepository::new(name)) as Arc<dyn Repository>
    }))
}

#[allow(dead_code)]
pub fn synchronizer(registry: &Arc<CollectionRegistry>) -> ReferenceSynchronizer {
    ReferenceSynchronizer::new(registry.clone(), SyncConfig::default())
}

#[allow(dead_code)]
pub fn walker(registry: &Arc<CollectionRegistry>) -> TreeWalker {
    TreeWalker::from_config(registry.clone(), &NodeLinkConfig::default())
}

/// Save a document without touching its neighbors
#[allow(dead_code)]
pub fn insert(registry: &CollectionRegistry, document: Document) -> FieldMap {
    registry
        .require(&document.collection)
        .unwrap()
        .save(document)
        .unwrap()
        .get_fields(TimestampFormat::Canonical)
}

/// Save a document and attach it to every neighbor it lists, the way a
/// create handler would
#[allow(dead_code)]
pub fn create_linked(
    registry: &Arc<CollectionRegistry>,
    document: Document,
    entity_class: &str,
) -> FieldMap {
    let fields = insert(registry, document);
    let sync = synchronizer(registry);
    sync.validate_parent_child_nodes_references(&fields).unwrap();
    sync.update_parent_references(&fields, entity_class, LinkOp::Add)
        .unwrap();
    sync.update_child_references(&fields, entity_class, LinkOp::Add)
        .unwrap();
    fields
}

#[allow(dead_code)]
pub fn fetch(registry: &CollectionRegistry, collection: &str, uuid: &str) -> Document {
    registry
        .require(collection)
        .unwrap()
        .find_by_uuid(uuid)
        .unwrap()
}

#[allow(dead_code)]
pub fn fetch_fields(registry: &CollectionRegistry, collection: &str, uuid: &str) -> FieldMap {
    fetch(registry, collection, uuid).get_fields(TimestampFormat::Canonical)
}

#[allow(dead_code)]
pub fn is_gone(registry: &CollectionRegistry, collection: &str, uuid: &str) -> bool {
    registry
        .require(collection)
        .unwrap()
        .find_by_uuid(uuid)
        .is_err_and(|e| e.is_not_found())
}

/// Repository that lets a simulated concurrent writer win the next `n` updates
///
/// Before each sabotaged update it rewrites the stored document unchanged,
/// bumping its version, so the caller's compare-and-swap sees a conflict.
#[allow(dead_code)]
pub struct ContendedRepository {
    inner: InMemoryRepository,
    sabotage: AtomicU32,
}

#[allow(dead_code)]
impl ContendedRepository {
    pub fn new(collection: &str, conflicts: u32) -> Self {
        Self {
            inner: InMemoryRepository::new(collection),
            sabotage: AtomicU32::new(conflicts),
        }
    }
}

impl Repository for ContendedRepository {
    fn collection_name(&self) -> &str {
        self.inner.collection_name()
    }

    fn find_by_uuid(&self, uuid: &str) -> Result<Document> {
        self.inner.find_by_uuid(uuid)
    }

    fn save(&self, document: Document) -> Result<Document> {
        self.inner.save(document)
    }

    fn update(&self, document: Document) -> Result<Document> {
        let sabotage = self
            .sabotage
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if sabotage {
            let stored = self.inner.find_by_uuid(&document.uuid)?;
            self.inner.update(stored)?;
        }
        self.inner.update(document)
    }

    fn delete_by_uuid(&self, uuid: &str) -> Result<()> {
        self.inner.delete_by_uuid(uuid)
    }

    fn list(&self) -> Result<Vec<Document>> {
        self.inner.list()
    }
}
