//! Repository layer persisting NodeLink documents to SQLite

pub mod sqlite_repo;

use std::sync::Arc;

use nodelink_core::store::{CollectionRegistry, Repository};

use crate::db::SharedConnection;
pub use sqlite_repo::SqliteRepository;

/// Registry of the standard education collections, all on one connection
pub fn education_registry(conn: &SharedConnection) -> CollectionRegistry {
    CollectionRegistry::education_platform(|collection| {
        Arc::new(SqliteRepository::new(collection, conn.clone())) as Arc<dyn Repository>
    })
}
