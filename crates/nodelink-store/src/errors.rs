//! Error helpers for nodelink-store
//!
//! Backend failures surface as `NodeLinkError::Persistence` so callers of
//! the `Repository` trait see one error type whatever the storage.

use nodelink_core::errors::NodeLinkError;

/// Result type alias shared with nodelink-core
pub type Result<T> = nodelink_core::errors::Result<T>;

/// Create a migration error
pub fn migration_error(migration_id: &str, reason: &str) -> NodeLinkError {
    NodeLinkError::Persistence {
        message: format!("Migration {} failed: {}", migration_id, reason),
    }
}

/// Create a checksum mismatch error
pub fn checksum_mismatch(migration_id: &str, expected: &str, actual: &str) -> NodeLinkError {
    NodeLinkError::Persistence {
        message: format!(
            "Checksum mismatch for migration {}: expected {}, got {}",
            migration_id, expected, actual
        ),
    }
}

/// Create a database error from rusqlite::Error
pub fn from_rusqlite(err: rusqlite::Error) -> NodeLinkError {
    NodeLinkError::Persistence {
        message: format!("sqlite: {}", err),
    }
}

/// A stored row that no longer parses as a document
pub fn corrupt_row(collection: &str, uuid: &str, reason: impl std::fmt::Display) -> NodeLinkError {
    NodeLinkError::Persistence {
        message: format!("Corrupt row {}/{}: {}", collection, uuid, reason),
    }
}

/// Create an IO error
pub fn io_error(operation: &str, err: std::io::Error) -> NodeLinkError {
    NodeLinkError::Persistence {
        message: format!("{}: {}", operation, err),
    }
}
