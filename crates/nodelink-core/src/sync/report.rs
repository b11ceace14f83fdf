use crate::model::NodeRef;

/// Add or remove the mirrored reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOp {
    Add,
    Remove,
}

/// What a synchronizer call did to each neighbor, in processing order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Neighbors whose node map changed and were written back
    pub updated: Vec<NodeRef>,
    /// Neighbors already in the requested state; not written
    pub unchanged: Vec<NodeRef>,
    /// Unresolvable neighbors passed over under `FailurePolicy::BestEffort`
    pub skipped: Vec<NodeRef>,
}

impl SyncReport {
    pub fn merge(&mut self, other: SyncReport) {
        self.updated.extend(other.updated);
        self.unchanged.extend(other.unchanged);
        self.skipped.extend(other.skipped);
    }

    /// Number of neighbors visited
    pub fn touched(&self) -> usize {
        self.updated.len() + self.unchanged.len() + self.skipped.len()
    }
}
