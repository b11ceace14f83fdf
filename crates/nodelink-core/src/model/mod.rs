pub mod document;
pub mod node_map;
pub mod relation;

pub use document::{Document, FieldMap, TimestampFormat};
pub use node_map::{NodeDelta, NodeMap, NodeRef};
pub use relation::Relation;
