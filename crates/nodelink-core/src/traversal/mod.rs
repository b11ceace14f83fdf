//! Tree Walker: expansion, flattening and cascade deletion over node maps

pub mod expansion;
pub mod tree_walker;

pub use expansion::{Depth, Expansion, NodeVisitor, NoopVisitor};
pub use tree_walker::{DeleteReport, TreeWalker};
