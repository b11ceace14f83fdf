use std::sync::Arc;

use serde_json::Value;

use super::report::{LinkOp, SyncReport};
use crate::config::{FailurePolicy, SyncConfig};
use crate::errors::{NodeLinkError, Result};
use crate::log_op_boundary;
use crate::model::document::{nodes_of, uuid_of, FIELD_UUID};
use crate::model::{FieldMap, NodeMap, NodeRef, Relation};
use crate::resolver::LookupResolver;
use crate::store::CollectionRegistry;

/// Keeps `parent_nodes` / `child_nodes` mirrored on both ends of every edge
///
/// Every neighbor write is a read-modify-write guarded by the repository's
/// version check and retried on conflict. Work across neighbors is not
/// atomic: a failure part-way leaves the earlier neighbors updated.
#[derive(Debug, Clone)]
pub struct ReferenceSynchronizer {
    resolver: LookupResolver,
    config: SyncConfig,
}

impl ReferenceSynchronizer {
    pub fn new(registry: Arc<CollectionRegistry>, config: SyncConfig) -> Self {
        Self {
            resolver: LookupResolver::new(registry),
            config,
        }
    }

    /// Same synchronizer with a different failure policy
    pub fn with_policy(&self, failure_policy: FailurePolicy) -> Self {
        Self {
            resolver: self.resolver.clone(),
            config: SyncConfig {
                failure_policy,
                ..self.config.clone()
            },
        }
    }

    pub fn resolver(&self) -> &LookupResolver {
        &self.resolver
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Mirror this document into the `parent_nodes` of every listed child
    ///
    /// # Errors
    ///
    /// * `InvalidDocument` - no uuid or malformed `child_nodes`
    /// * `UnknownEntityClass` - `entity_class` not registered
    /// * `ResourceNotFound` - a child is missing (strict policy)
    /// * `VersionConflict` - retries exhausted on a contended child
    pub fn update_child_references(
        &self,
        document_fields: &FieldMap,
        entity_class: &str,
        operation: LinkOp,
    ) -> Result<SyncReport> {
        let uuid = uuid_hint(document_fields);
        log_op_boundary!(
            "update_child_references",
            self.update_references(document_fields, entity_class, Relation::Children, operation),
            uuid = uuid,
            entity_class = entity_class
        )
    }

    /// Mirror this document into the `child_nodes` of every listed parent
    ///
    /// # Errors
    ///
    /// As [`ReferenceSynchronizer::update_child_references`], for `parent_nodes`.
    pub fn update_parent_references(
        &self,
        document_fields: &FieldMap,
        entity_class: &str,
        operation: LinkOp,
    ) -> Result<SyncReport> {
        let uuid = uuid_hint(document_fields);
        log_op_boundary!(
            "update_parent_references",
            self.update_references(document_fields, entity_class, Relation::Parents, operation),
            uuid = uuid,
            entity_class = entity_class
        )
    }

    /// Apply the `child_nodes` delta between two versions of a document
    ///
    /// Children dropped from the list are detached, children new to the list
    /// are attached, children present in both are not read or written.
    ///
    /// # Errors
    ///
    /// `InvalidDocument` if the two versions carry different uuids, otherwise
    /// as [`ReferenceSynchronizer::update_child_references`].
    pub fn compare_and_update_child_nodes_references(
        &self,
        old_fields: &FieldMap,
        new_fields: &FieldMap,
        entity_class: &str,
    ) -> Result<SyncReport> {
        let uuid = uuid_hint(new_fields);
        log_op_boundary!(
            "compare_and_update_child_nodes_references",
            self.reconcile(old_fields, new_fields, entity_class, Relation::Children),
            uuid = uuid,
            entity_class = entity_class
        )
    }

    /// Apply the `parent_nodes` delta between two versions of a document
    ///
    /// # Errors
    ///
    /// As [`ReferenceSynchronizer::compare_and_update_child_nodes_references`].
    pub fn compare_and_update_parent_nodes_references(
        &self,
        old_fields: &FieldMap,
        new_fields: &FieldMap,
        entity_class: &str,
    ) -> Result<SyncReport> {
        let uuid = uuid_hint(new_fields);
        log_op_boundary!(
            "compare_and_update_parent_nodes_references",
            self.reconcile(old_fields, new_fields, entity_class, Relation::Parents),
            uuid = uuid,
            entity_class = entity_class
        )
    }

    /// Reconcile both node maps for a full update cycle
    ///
    /// # Errors
    ///
    /// As [`ReferenceSynchronizer::compare_and_update_child_nodes_references`].
    pub fn compare_and_update_nodes_references(
        &self,
        old_fields: &FieldMap,
        new_fields: &FieldMap,
        entity_class: &str,
    ) -> Result<SyncReport> {
        let uuid = uuid_hint(new_fields);
        log_op_boundary!(
            "compare_and_update_nodes_references",
            self.reconcile(old_fields, new_fields, entity_class, Relation::Parents)
                .and_then(|mut report| {
                    report.merge(self.reconcile(
                        old_fields,
                        new_fields,
                        entity_class,
                        Relation::Children,
                    )?);
                    Ok(report)
                }),
            uuid = uuid,
            entity_class = entity_class
        )
    }

    /// Check that every referenced parent and child exists
    ///
    /// Run before create (reject unknown neighbors up front) and before
    /// delete (confirm the graph is in the expected state before detaching).
    /// Always strict, whatever the configured failure policy.
    ///
    /// # Errors
    ///
    /// * `ValidationFailure` - a node map key is not a registered collection
    /// * `ResourceNotFound` - the first reference that does not resolve
    pub fn validate_parent_child_nodes_references(&self, document_fields: &FieldMap) -> Result<()> {
        let uuid = uuid_hint(document_fields);
        log_op_boundary!(
            "validate_parent_child_nodes_references",
            self.validate_references(document_fields),
            uuid = uuid
        )
    }

    fn validate_references(&self, document_fields: &FieldMap) -> Result<()> {
        for relation in [Relation::Parents, Relation::Children] {
            for neighbor in nodes_of(document_fields, relation)?.iter_refs() {
                if !self.resolver.registry().contains(&neighbor.collection) {
                    return Err(NodeLinkError::ValidationFailure {
                        collection: neighbor.collection,
                        uuid: neighbor.uuid,
                        reason: format!(
                            "{} references an unregistered collection",
                            relation.field_name()
                        ),
                    });
                }
                self.resolver
                    .get_document_from_collection(&neighbor.collection, &neighbor.uuid)?;
            }
        }
        Ok(())
    }

    fn update_references(
        &self,
        document_fields: &FieldMap,
        entity_class: &str,
        relation: Relation,
        operation: LinkOp,
    ) -> Result<SyncReport> {
        let own = NodeRef::new(
            self.resolver.get_collection_name(entity_class)?,
            uuid_of(document_fields)?,
        );
        self.mirror_all(&own, relation, &nodes_of(document_fields, relation)?, operation)
    }

    /// Mirror `own` into every neighbor listed under `relation`
    pub(crate) fn mirror_all(
        &self,
        own: &NodeRef,
        relation: Relation,
        neighbors: &NodeMap,
        operation: LinkOp,
    ) -> Result<SyncReport> {
        let mut report = SyncReport::default();
        for neighbor in neighbors.iter_refs() {
            self.mirror_edge(&neighbor, relation.mirror(), own, operation, &mut report)?;
        }
        Ok(report)
    }

    fn reconcile(
        &self,
        old_fields: &FieldMap,
        new_fields: &FieldMap,
        entity_class: &str,
        relation: Relation,
    ) -> Result<SyncReport> {
        let own_uuid = uuid_of(new_fields)?;
        let old_uuid = uuid_of(old_fields)?;
        if old_uuid != own_uuid {
            return Err(NodeLinkError::invalid_document(format!(
                "cannot reconcile {} against a different document {}",
                own_uuid, old_uuid
            )));
        }
        let own = NodeRef::new(self.resolver.get_collection_name(entity_class)?, own_uuid);

        let delta = NodeMap::diff(
            &nodes_of(old_fields, relation)?,
            &nodes_of(new_fields, relation)?,
        );
        tracing::debug!(
            uuid = own_uuid,
            relation = relation.field_name(),
            added = delta.added.len(),
            removed = delta.removed.len(),
            "computed node delta"
        );

        let mut report = SyncReport::default();
        if delta.is_empty() {
            return Ok(report);
        }
        for neighbor in &delta.removed {
            self.mirror_edge(neighbor, relation.mirror(), &own, LinkOp::Remove, &mut report)?;
        }
        for neighbor in &delta.added {
            self.mirror_edge(neighbor, relation.mirror(), &own, LinkOp::Add, &mut report)?;
        }
        Ok(report)
    }

    /// Add or remove `own` in `neighbor`'s `mirror` node map
    ///
    /// Re-reads and retries when another writer bumped the neighbor's version
    /// between our read and our write.
    fn mirror_edge(
        &self,
        neighbor: &NodeRef,
        mirror: Relation,
        own: &NodeRef,
        operation: LinkOp,
        report: &mut SyncReport,
    ) -> Result<()> {
        let repository = self.resolver.registry().require(&neighbor.collection)?;
        let mut conflicts = 0;

        loop {
            let mut document = match repository.find_by_uuid(&neighbor.uuid) {
                Ok(document) => document,
                Err(err)
                    if err.is_not_found()
                        && self.config.failure_policy == FailurePolicy::BestEffort =>
                {
                    tracing::debug!(neighbor = %neighbor, "skipping unresolvable neighbor");
                    report.skipped.push(neighbor.clone());
                    return Ok(());
                }
                Err(err) => return Err(err),
            };

            let nodes = document.nodes_mut(mirror);
            let changed = match operation {
                LinkOp::Add => nodes.add(&own.collection, &own.uuid),
                LinkOp::Remove => nodes.remove(&own.collection, &own.uuid),
            };
            if !changed {
                report.unchanged.push(neighbor.clone());
                return Ok(());
            }

            match repository.update(document) {
                Ok(_) => {
                    report.updated.push(neighbor.clone());
                    return Ok(());
                }
                Err(err)
                    if err.is_version_conflict() && conflicts < self.config.max_conflict_retries =>
                {
                    conflicts += 1;
                    tracing::debug!(neighbor = %neighbor, attempt = conflicts, "version conflict, retrying");
                }
                Err(err) => return Err(err),
            }
        }
    }
}

fn uuid_hint(fields: &FieldMap) -> &str {
    fields
        .get(FIELD_UUID)
        .and_then(Value::as_str)
        .unwrap_or_default()
}
