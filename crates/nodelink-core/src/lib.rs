//! NodeLink Core - parent/child reference integrity for document collections
//!
//! Documents in independent collections point at each other through two
//! node maps, `parent_nodes` and `child_nodes`. This crate keeps the two
//! sides of every edge mirrored and walks the resulting trees:
//! - Lookup Resolver: `(collection, uuid)` to document fields
//! - Reference Synchronizer: attach, detach and diff-reconcile edges
//! - Tree Walker: recursive expansion and leaves-first cascade delete
//!
//! Storage is behind the [`store::Repository`] trait. Repositories are
//! registered once in a [`store::CollectionRegistry`] and shared by `Arc`.

pub mod config;
pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod resolver;
pub mod store;
pub mod sync;
pub mod traversal;

// Used by the logging macros
pub use nodelink_core_types;

// Re-export commonly used types
pub use config::{FailurePolicy, NodeLinkConfig, SyncConfig, WalkerConfig};
pub use errors::{ExError, ExErrorKind, NodeLinkError, Result};
pub use model::{Document, FieldMap, NodeMap, NodeRef, Relation, TimestampFormat};
pub use resolver::{LookupResolver, Resolved};
pub use store::{CollectionRegistry, InMemoryRepository, Repository};
pub use sync::{LinkOp, ReferenceSynchronizer, SyncReport};
pub use traversal::{DeleteReport, Depth, Expansion, NodeVisitor, TreeWalker};
