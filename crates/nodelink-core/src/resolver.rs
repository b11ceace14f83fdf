//! Lookup Resolver: dereference `(collection, uuid)` into document data

use std::sync::Arc;

use serde_json::Value;

use crate::errors::Result;
use crate::model::{Document, FieldMap, TimestampFormat};
use crate::store::CollectionRegistry;

/// Outcome of resolving a stored reference
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    /// The referenced document, timestamps in canonical form
    Document(FieldMap),
    /// The collection is not registered; the uuid is handed back unchanged
    Literal(String),
}

impl Resolved {
    /// JSON to substitute for the reference (object or bare uuid string)
    pub fn into_value(self) -> Value {
        match self {
            Resolved::Document(fields) => Value::Object(fields),
            Resolved::Literal(uuid) => Value::String(uuid),
        }
    }

    pub fn as_fields(&self) -> Option<&FieldMap> {
        match self {
            Resolved::Document(fields) => Some(fields),
            Resolved::Literal(_) => None,
        }
    }
}

/// Read-only access to any registered collection by name
#[derive(Debug, Clone)]
pub struct LookupResolver {
    registry: Arc<CollectionRegistry>,
}

impl LookupResolver {
    pub fn new(registry: Arc<CollectionRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<CollectionRegistry> {
        &self.registry
    }

    /// Resolve a reference to its field map
    ///
    /// An unregistered collection is not an error here: the uuid comes back
    /// as [`Resolved::Literal`] so malformed or legacy references survive a
    /// read.
    ///
    /// # Errors
    ///
    /// `ResourceNotFound` from the repository, unchanged.
    pub fn get_document_from_collection(&self, collection: &str, uuid: &str) -> Result<Resolved> {
        match self.registry.repository(collection) {
            Some(repository) => {
                let document = repository.find_by_uuid(uuid)?;
                Ok(Resolved::Document(
                    document.get_fields(TimestampFormat::Canonical),
                ))
            }
            None => {
                tracing::debug!(collection, uuid, "unregistered collection, returning literal uuid");
                Ok(Resolved::Literal(uuid.to_string()))
            }
        }
    }

    /// Typed fetch for callers that go on to write the document
    ///
    /// # Errors
    ///
    /// `UnknownCollection` if the collection is not registered,
    /// `ResourceNotFound` if the document does not exist.
    pub fn fetch_document(&self, collection: &str, uuid: &str) -> Result<Document> {
        self.registry.require(collection)?.find_by_uuid(uuid)
    }

    /// Collection name registered for an entity class
    ///
    /// # Errors
    ///
    /// `UnknownEntityClass` if the class is not registered.
    pub fn get_collection_name(&self, entity_class: &str) -> Result<String> {
        self.registry.collection_name(entity_class).map(str::to_string)
    }
}
