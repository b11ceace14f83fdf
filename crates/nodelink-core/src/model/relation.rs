/// Which side of a parent/child edge a node map describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    /// `parent_nodes`: entities this document is a child of
    Parents,
    /// `child_nodes`: entities this document is a parent of
    Children,
}

pub const PARENT_NODES: &str = "parent_nodes";
pub const CHILD_NODES: &str = "child_nodes";

impl Relation {
    pub fn field_name(self) -> &'static str {
        match self {
            Relation::Parents => PARENT_NODES,
            Relation::Children => CHILD_NODES,
        }
    }

    /// The relation stored on the other end of the edge
    pub fn mirror(self) -> Relation {
        match self {
            Relation::Parents => Relation::Children,
            Relation::Children => Relation::Parents,
        }
    }
}
