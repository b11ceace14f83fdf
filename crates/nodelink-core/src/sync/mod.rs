//! Reference Synchronizer: mirror parent/child edges across documents

pub mod reference_sync;
pub mod report;

pub use reference_sync::ReferenceSynchronizer;
pub use report::{LinkOp, SyncReport};
