use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;

use super::expansion::{Expansion, NodeVisitor, NoopVisitor};
use crate::config::{FailurePolicy, NodeLinkConfig, WalkerConfig};
use crate::errors::{NodeLinkError, Result};
use crate::log_op_boundary;
use crate::model::document::{nodes_of, uuid_of, FIELD_ENTITY_TYPE, FIELD_UUID};
use crate::model::{FieldMap, NodeMap, NodeRef, Relation};
use crate::resolver::{LookupResolver, Resolved};
use crate::store::CollectionRegistry;
use crate::sync::{LinkOp, ReferenceSynchronizer};

/// Outcome of a cascade delete
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteReport {
    /// Removed documents in deletion order (leaves first)
    pub deleted: Vec<NodeRef>,
    /// Missing children passed over under `FailurePolicy::BestEffort`
    pub skipped: Vec<NodeRef>,
}

/// Expands and cascade-deletes the trees formed by node maps
///
/// Every walk carries the set of nodes on the current path. Reaching a node
/// that is already on the path fails with `CycleDetected`; reaching one that
/// was seen on another branch (a diamond) is fine.
#[derive(Debug, Clone)]
pub struct TreeWalker {
    synchronizer: ReferenceSynchronizer,
    config: WalkerConfig,
}

/// Per-walk state threaded through the recursion
struct Walk {
    path: HashSet<NodeRef>,
    current: Vec<NodeRef>,
}

impl Walk {
    fn rooted_at(root: NodeRef) -> Self {
        Self {
            path: HashSet::from([root.clone()]),
            current: vec![root],
        }
    }

    fn enter(&mut self, node: &NodeRef) -> Result<()> {
        if !self.path.insert(node.clone()) {
            return Err(NodeLinkError::CycleDetected {
                collection: node.collection.clone(),
                uuid: node.uuid.clone(),
            });
        }
        self.current.push(node.clone());
        Ok(())
    }

    fn leave(&mut self) {
        if let Some(node) = self.current.pop() {
            self.path.remove(&node);
        }
    }

    fn head(&self) -> Option<&NodeRef> {
        self.current.last()
    }
}

impl TreeWalker {
    pub fn new(synchronizer: ReferenceSynchronizer, config: WalkerConfig) -> Self {
        Self {
            synchronizer,
            config,
        }
    }

    /// Walker and synchronizer sharing one registry and configuration
    pub fn from_config(registry: Arc<CollectionRegistry>, config: &NodeLinkConfig) -> Self {
        Self::new(
            ReferenceSynchronizer::new(registry, config.sync.clone()),
            config.walker.clone(),
        )
    }

    pub fn synchronizer(&self) -> &ReferenceSynchronizer {
        &self.synchronizer
    }

    fn resolver(&self) -> &LookupResolver {
        self.synchronizer.resolver()
    }

    /// Replace every child uuid with the child's recursively expanded fields
    ///
    /// # Errors
    ///
    /// * `ResourceNotFound` - a child in a registered collection is missing
    /// * `CycleDetected` - a node is its own descendant
    /// * `ValidationFailure` - the tree is deeper than `max_depth`
    pub fn load_child_nodes_data(&self, document_fields: &FieldMap) -> Result<FieldMap> {
        let uuid = uuid_hint(document_fields);
        log_op_boundary!(
            "load_child_nodes_data",
            self.expand(
                document_fields,
                root_collection_hint(document_fields),
                None::<&()>,
                &Expansion::child_tree(),
                &mut NoopVisitor,
            ),
            uuid = uuid
        )
    }

    /// Replace every parent uuid with the parent's fields, one level only
    ///
    /// # Errors
    ///
    /// `ResourceNotFound` if a parent in a registered collection is missing.
    pub fn load_immediate_parent_nodes_data(&self, document_fields: &FieldMap) -> Result<FieldMap> {
        let uuid = uuid_hint(document_fields);
        log_op_boundary!(
            "load_immediate_parent_nodes_data",
            self.expand(
                document_fields,
                root_collection_hint(document_fields),
                None::<&()>,
                &Expansion::immediate_parents(),
                &mut NoopVisitor,
            ),
            uuid = uuid
        )
    }

    /// General expansion: chosen relation and depth, with a visitor hook
    ///
    /// `visitor` sees each resolved node after its own subtree has been
    /// expanded. References into unregistered collections stay as bare
    /// uuid strings and are not visited.
    ///
    /// # Errors
    ///
    /// As [`TreeWalker::load_child_nodes_data`], plus whatever the visitor returns.
    pub fn load_nodes_data<C, V>(
        &self,
        document_fields: &FieldMap,
        collection_name: &str,
        context: Option<&C>,
        expansion: &Expansion,
        visitor: &mut V,
    ) -> Result<FieldMap>
    where
        C: ?Sized,
        V: NodeVisitor<C>,
    {
        let uuid = uuid_hint(document_fields);
        log_op_boundary!(
            "load_nodes_data",
            self.expand(document_fields, collection_name, context, expansion, visitor),
            collection = collection_name,
            uuid = uuid,
            relation = expansion.relation.field_name()
        )
    }

    /// Number of direct children across all entity types
    ///
    /// # Errors
    ///
    /// `InvalidDocument` if `child_nodes` is malformed.
    pub fn get_child_node_count(&self, document_fields: &FieldMap) -> Result<usize> {
        Ok(self.get_child_nodes(document_fields)?.total_count())
    }

    /// Raw node map stored under `key`, whether its entries are uuids or expanded
    ///
    /// # Errors
    ///
    /// `InvalidDocument` if the value under `key` is not a node map.
    pub fn get_nodes_by_key(&self, document_fields: &FieldMap, key: &str) -> Result<NodeMap> {
        document_fields
            .get(key)
            .map_or_else(|| Ok(NodeMap::new()), NodeMap::from_value)
    }

    pub fn get_child_nodes(&self, document_fields: &FieldMap) -> Result<NodeMap> {
        nodes_of(document_fields, Relation::Children)
    }

    pub fn get_parent_nodes(&self, document_fields: &FieldMap) -> Result<NodeMap> {
        nodes_of(document_fields, Relation::Parents)
    }

    /// Direct children as one flat list, each tagged with its `entity_type`
    ///
    /// Ordered by entity type, then by position in its list. A child in an
    /// unregistered collection appears as `{uuid, entity_type}` only.
    ///
    /// # Errors
    ///
    /// `ResourceNotFound` if a child in a registered collection is missing.
    pub fn return_child_nodes_data(&self, document_fields: &FieldMap) -> Result<Vec<FieldMap>> {
        let uuid = uuid_hint(document_fields);
        log_op_boundary!(
            "return_child_nodes_data",
            self.flatten_children(document_fields),
            uuid = uuid
        )
    }

    /// Cascade-delete everything below a document, leaves first
    ///
    /// Each node is detached from all of its parents before it is removed.
    /// The document itself is kept; its `child_nodes` end up empty in storage.
    ///
    /// # Errors
    ///
    /// * `ResourceNotFound` - a child or one of its parents is missing (strict policy)
    /// * `CycleDetected` - a node is its own descendant
    /// * `ValidationFailure` - the tree is deeper than `max_depth`
    ///
    /// Nodes deleted before the failure stay deleted. Under best-effort a
    /// missing child is recorded in `DeleteReport::skipped` and its siblings
    /// are still deleted.
    pub fn delete_child_tree(&self, document_fields: &FieldMap) -> Result<DeleteReport> {
        let uuid = uuid_hint(document_fields);
        log_op_boundary!(
            "delete_child_tree",
            self.delete_below(document_fields, root_collection_hint(document_fields)),
            uuid = uuid
        )
    }

    /// Cascade-delete a document's subtree, then detach and delete the document
    ///
    /// # Errors
    ///
    /// `UnknownEntityClass` if `entity_class` is not registered, otherwise as
    /// [`TreeWalker::delete_child_tree`].
    pub fn delete_tree(&self, document_fields: &FieldMap, entity_class: &str) -> Result<DeleteReport> {
        let uuid = uuid_hint(document_fields);
        log_op_boundary!(
            "delete_tree",
            self.delete_with_root(document_fields, entity_class),
            uuid = uuid,
            entity_class = entity_class
        )
    }

    fn expand<C, V>(
        &self,
        document_fields: &FieldMap,
        collection_name: &str,
        context: Option<&C>,
        expansion: &Expansion,
        visitor: &mut V,
    ) -> Result<FieldMap>
    where
        C: ?Sized,
        V: NodeVisitor<C>,
    {
        let root = NodeRef::new(collection_name, uuid_of(document_fields)?);
        let mut walk = Walk::rooted_at(root);
        let mut out = document_fields.clone();
        self.expand_level(&mut out, 1, &mut walk, context, expansion, visitor)?;
        Ok(out)
    }

    fn expand_level<C, V>(
        &self,
        fields: &mut FieldMap,
        level: usize,
        walk: &mut Walk,
        context: Option<&C>,
        expansion: &Expansion,
        visitor: &mut V,
    ) -> Result<()>
    where
        C: ?Sized,
        V: NodeVisitor<C>,
    {
        let nodes = nodes_of(fields, expansion.relation)?;
        if nodes.is_empty() || !expansion.depth.allows(level) {
            return Ok(());
        }
        self.check_depth(level, walk)?;

        let mut expanded = FieldMap::new();
        for entity_type in nodes.entity_types() {
            let mut entries = Vec::with_capacity(nodes.get(entity_type).len());
            for uuid in nodes.get(entity_type) {
                let node = NodeRef::new(entity_type, uuid.clone());
                walk.enter(&node)?;
                let entry = match self.resolver().get_document_from_collection(entity_type, uuid)? {
                    Resolved::Document(mut child) => {
                        self.expand_level(&mut child, level + 1, walk, context, expansion, visitor)?;
                        visitor.visit(entity_type, &mut child, context)?;
                        Value::Object(child)
                    }
                    literal @ Resolved::Literal(_) => literal.into_value(),
                };
                walk.leave();
                entries.push(entry);
            }
            expanded.insert(entity_type.to_string(), Value::Array(entries));
        }

        fields.insert(
            expansion.relation.field_name().to_string(),
            Value::Object(expanded),
        );
        Ok(())
    }

    fn flatten_children(&self, document_fields: &FieldMap) -> Result<Vec<FieldMap>> {
        let children = nodes_of(document_fields, Relation::Children)?;
        let mut flat = Vec::with_capacity(children.total_count());
        for child in children.iter_refs() {
            let mut fields = match self
                .resolver()
                .get_document_from_collection(&child.collection, &child.uuid)?
            {
                Resolved::Document(fields) => fields,
                Resolved::Literal(uuid) => {
                    let mut bare = FieldMap::new();
                    bare.insert(FIELD_UUID.to_string(), Value::String(uuid));
                    bare
                }
            };
            fields.insert(
                FIELD_ENTITY_TYPE.to_string(),
                Value::String(child.collection),
            );
            flat.push(fields);
        }
        Ok(flat)
    }

    fn delete_below(&self, document_fields: &FieldMap, collection_name: &str) -> Result<DeleteReport> {
        let root = NodeRef::new(collection_name, uuid_of(document_fields)?);
        let mut walk = Walk::rooted_at(root);
        let mut report = DeleteReport::default();
        self.delete_children(
            &nodes_of(document_fields, Relation::Children)?,
            1,
            &mut walk,
            &mut report,
        )?;
        Ok(report)
    }

    fn delete_with_root(&self, document_fields: &FieldMap, entity_class: &str) -> Result<DeleteReport> {
        let collection = self.resolver().get_collection_name(entity_class)?;
        let mut report = self.delete_below(document_fields, &collection)?;

        // Re-read: deleting the subtree rewrote the root's child_nodes.
        let root = self
            .resolver()
            .fetch_document(&collection, uuid_of(document_fields)?)?;
        self.detach_and_delete(&root.node_ref(), &root.parent_nodes, &mut report)?;
        Ok(report)
    }

    fn delete_children(
        &self,
        children: &NodeMap,
        level: usize,
        walk: &mut Walk,
        report: &mut DeleteReport,
    ) -> Result<()> {
        if children.is_empty() {
            return Ok(());
        }
        self.check_depth(level, walk)?;

        for child in children.iter_refs() {
            walk.enter(&child)?;
            // Fetched fresh: earlier deletions may have rewritten its child_nodes.
            match self.resolver().fetch_document(&child.collection, &child.uuid) {
                Ok(document) => {
                    self.delete_children(&document.child_nodes, level + 1, walk, report)?;
                    self.detach_and_delete(&child, &document.parent_nodes, report)?;
                }
                Err(err) if err.is_not_found() && report.deleted.contains(&child) => {
                    tracing::debug!(node = %child, "already deleted through another parent");
                }
                Err(err) if err.is_not_found() && self.is_best_effort() => {
                    tracing::debug!(node = %child, "skipping missing child");
                    if !report.skipped.contains(&child) {
                        report.skipped.push(child.clone());
                    }
                }
                Err(err) => return Err(err),
            }
            walk.leave();
        }
        Ok(())
    }

    fn detach_and_delete(
        &self,
        node: &NodeRef,
        parents: &NodeMap,
        report: &mut DeleteReport,
    ) -> Result<()> {
        self.synchronizer
            .mirror_all(node, Relation::Parents, parents, LinkOp::Remove)?;
        self.resolver()
            .registry()
            .require(&node.collection)?
            .delete_by_uuid(&node.uuid)?;
        tracing::debug!(node = %node, "deleted");
        report.deleted.push(node.clone());
        Ok(())
    }

    fn is_best_effort(&self) -> bool {
        self.synchronizer.config().failure_policy == FailurePolicy::BestEffort
    }

    fn check_depth(&self, level: usize, walk: &Walk) -> Result<()> {
        if level <= self.config.max_depth {
            return Ok(());
        }
        let (collection, uuid) = walk
            .head()
            .map(|node| (node.collection.clone(), node.uuid.clone()))
            .unwrap_or_default();
        Err(NodeLinkError::ValidationFailure {
            collection,
            uuid,
            reason: format!("tree is deeper than max_depth {}", self.config.max_depth),
        })
    }
}

fn uuid_hint(fields: &FieldMap) -> &str {
    fields.get(FIELD_UUID).and_then(Value::as_str).unwrap_or_default()
}

/// Collection of a root passed without one, from its `entity_type` field
///
/// Maps rendered by `Document::get_fields` always carry it. A hand-built map
/// without it keys the root under an empty collection.
fn root_collection_hint(fields: &FieldMap) -> &str {
    fields
        .get(FIELD_ENTITY_TYPE)
        .and_then(Value::as_str)
        .unwrap_or_default()
}
