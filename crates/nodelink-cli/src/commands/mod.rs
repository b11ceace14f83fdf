//! Subcommands and the state they share

pub mod delete;
pub mod put;
pub mod show;
pub mod update;
pub mod validate;

use std::path::Path;
use std::sync::Arc;

use nodelink_core::errors::{NodeLinkError, Result};
use nodelink_core::{
    CollectionRegistry, Document, FailurePolicy, FieldMap, NodeLinkConfig, ReferenceSynchronizer,
    Repository, TimestampFormat, TreeWalker,
};

/// Registry, synchronizer and walker over one opened store
pub struct Context {
    pub registry: Arc<CollectionRegistry>,
    pub walker: TreeWalker,
    pub failure_policy: FailurePolicy,
}

impl Context {
    /// Open (and migrate) the database and load configuration
    ///
    /// # Errors
    ///
    /// `Persistence` if the database cannot be opened, `Serialization` or
    /// `Internal` if the config file is unreadable.
    pub fn open(db: &Path, config: Option<&Path>, best_effort: bool) -> Result<Self> {
        let mut config = match config {
            Some(path) => NodeLinkConfig::load(path)?,
            None => NodeLinkConfig::default(),
        };
        if best_effort {
            config.sync.failure_policy = FailurePolicy::BestEffort;
        }

        let conn = nodelink_store::db::open_shared(db)?;
        let registry = Arc::new(nodelink_store::education_registry(&conn));
        let walker = TreeWalker::from_config(registry.clone(), &config);
        Ok(Self {
            registry,
            walker,
            failure_policy: config.sync.failure_policy,
        })
    }

    pub fn synchronizer(&self) -> &ReferenceSynchronizer {
        self.walker.synchronizer()
    }

    pub fn repository(&self, collection: &str) -> Result<&Arc<dyn Repository>> {
        self.registry.require(collection)
    }

    /// Entity class of a collection, for synchronizer calls
    pub fn entity_class(&self, collection: &str) -> Result<&str> {
        self.registry.entity_class(collection)
    }

    /// Pre-mutation reference check
    ///
    /// Under best-effort the synchronizer skips dangling neighbors itself,
    /// so the check only runs in strict mode.
    pub fn validate_before_write(&self, fields: &FieldMap) -> Result<()> {
        match self.failure_policy {
            FailurePolicy::Strict => self
                .synchronizer()
                .validate_parent_child_nodes_references(fields),
            FailurePolicy::BestEffort => Ok(()),
        }
    }

    pub fn fetch(&self, collection: &str, uuid: &str) -> Result<Document> {
        self.repository(collection)?.find_by_uuid(uuid)
    }
}

/// Read a JSON object from a file
pub fn read_json_object(path: &Path) -> Result<FieldMap> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        NodeLinkError::invalid_document(format!("cannot read {}: {}", path.display(), e))
    })?;
    match serde_json::from_str(&text)? {
        serde_json::Value::Object(fields) => Ok(fields),
        _ => Err(NodeLinkError::invalid_document(format!(
            "{} must contain a JSON object",
            path.display()
        ))),
    }
}

/// Pretty-print a document's fields to stdout
pub fn print_fields(fields: FieldMap) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::Value::Object(fields))?
    );
    Ok(())
}

pub fn canonical(document: &Document) -> FieldMap {
    document.get_fields(TimestampFormat::Canonical)
}
