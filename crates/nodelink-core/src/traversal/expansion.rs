use crate::errors::Result;
use crate::model::{FieldMap, Relation};

/// How far an expansion descends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    /// Until the leaves (bounded by `WalkerConfig::max_depth`)
    Recursive,
    /// At most this many levels below the root
    Levels(usize),
}

impl Depth {
    /// Whether nodes `level` steps below the root are expanded (root is level 0)
    pub fn allows(self, level: usize) -> bool {
        match self {
            Depth::Recursive => true,
            Depth::Levels(limit) => level <= limit,
        }
    }
}

/// Which node map to expand and how deep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expansion {
    pub relation: Relation,
    pub depth: Depth,
}

impl Expansion {
    pub fn new(relation: Relation, depth: Depth) -> Self {
        Self { relation, depth }
    }

    /// Full child subtree
    pub fn child_tree() -> Self {
        Self::new(Relation::Children, Depth::Recursive)
    }

    /// Parents one level up, grandparents left as uuids
    pub fn immediate_parents() -> Self {
        Self::new(Relation::Parents, Depth::Levels(1))
    }
}

/// Hook called for every node an expansion resolves
///
/// `context` is whatever the caller handed to `load_nodes_data`, passed
/// through untouched. The visitor may annotate `fields` in place; an error
/// aborts the whole expansion.
pub trait NodeVisitor<C: ?Sized> {
    fn visit(&mut self, collection: &str, fields: &mut FieldMap, context: Option<&C>) -> Result<()>;
}

/// Visitor that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopVisitor;

impl<C: ?Sized> NodeVisitor<C> for NoopVisitor {
    fn visit(&mut self, _collection: &str, _fields: &mut FieldMap, _context: Option<&C>) -> Result<()> {
        Ok(())
    }
}

impl<C, F> NodeVisitor<C> for F
where
    C: ?Sized,
    F: FnMut(&str, &mut FieldMap, Option<&C>) -> Result<()>,
{
    fn visit(&mut self, collection: &str, fields: &mut FieldMap, context: Option<&C>) -> Result<()> {
        self(collection, fields, context)
    }
}
