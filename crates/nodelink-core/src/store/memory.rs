use std::collections::HashMap;

use chrono::Utc;
use parking_lot::RwLock;

use super::repository::Repository;
use crate::errors::{NodeLinkError, Result};
use crate::model::Document;

/// HashMap-backed repository for one collection
///
/// Used by tests and by embedders that keep the graph in process. Shared
/// across threads through an internal `RwLock`.
#[derive(Debug)]
pub struct InMemoryRepository {
    collection: String,
    documents: RwLock<HashMap<String, Document>>,
}

impl InMemoryRepository {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            documents: RwLock::new(HashMap::new()),
        }
    }

    fn not_found(&self, uuid: &str) -> NodeLinkError {
        NodeLinkError::not_found(self.collection.clone(), uuid)
    }
}

impl Repository for InMemoryRepository {
    fn collection_name(&self) -> &str {
        &self.collection
    }

    fn find_by_uuid(&self, uuid: &str) -> Result<Document> {
        match self.documents.read().get(uuid) {
            Some(document) if !document.is_deleted => Ok(document.clone()),
            _ => Err(self.not_found(uuid)),
        }
    }

    fn save(&self, mut document: Document) -> Result<Document> {
        let mut documents = self.documents.write();
        if documents.contains_key(&document.uuid) {
            return Err(NodeLinkError::AlreadyExists {
                collection: self.collection.clone(),
                uuid: document.uuid,
            });
        }

        document.collection = self.collection.clone();
        document.version = 1;
        documents.insert(document.uuid.clone(), document.clone());
        tracing::debug!(collection = %self.collection, uuid = %document.uuid, "document saved");
        Ok(document)
    }

    fn update(&self, mut document: Document) -> Result<Document> {
        let mut documents = self.documents.write();
        let stored = documents
            .get(&document.uuid)
            .ok_or_else(|| self.not_found(&document.uuid))?;

        if stored.version != document.version {
            return Err(NodeLinkError::VersionConflict {
                collection: self.collection.clone(),
                uuid: document.uuid,
                expected: document.version,
                found: stored.version,
            });
        }

        document.collection = self.collection.clone();
        document.version += 1;
        document.updated_at = Utc::now();
        documents.insert(document.uuid.clone(), document.clone());
        tracing::debug!(
            collection = %self.collection,
            uuid = %document.uuid,
            version = document.version,
            "document updated"
        );
        Ok(document)
    }

    fn delete_by_uuid(&self, uuid: &str) -> Result<()> {
        self.documents
            .write()
            .remove(uuid)
            .map(|_| ())
            .ok_or_else(|| self.not_found(uuid))?;
        tracing::debug!(collection = %self.collection, uuid, "document deleted");
        Ok(())
    }

    fn list(&self) -> Result<Vec<Document>> {
        let mut live: Vec<Document> = self
            .documents
            .read()
            .values()
            .filter(|d| !d.is_deleted)
            .cloned()
            .collect();
        live.sort_by(|a, b| a.uuid.cmp(&b.uuid));
        Ok(live)
    }
}
