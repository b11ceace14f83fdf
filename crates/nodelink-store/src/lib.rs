//! NodeLink Store - SQLite persistence for NodeLink documents
//!
//! Provides:
//! - SQLite schema with a checksummed migrations framework
//! - `SqliteRepository`, a `Repository` over one shared connection
//! - Registry construction for the standard education collections

pub mod db;
pub mod errors;
pub mod migrations;
pub mod repo;

// Re-export key types
pub use db::SharedConnection;
pub use errors::Result;
pub use repo::{education_registry, SqliteRepository};
