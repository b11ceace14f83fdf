use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::node_map::{NodeMap, NodeRef};
use super::relation::{Relation, CHILD_NODES, PARENT_NODES};
use crate::errors::{NodeLinkError, Result};

/// A document rendered as a JSON object
pub type FieldMap = serde_json::Map<String, Value>;

pub const FIELD_UUID: &str = "uuid";
pub const FIELD_IS_DELETED: &str = "is_deleted";
pub const FIELD_VERSION: &str = "version";
pub const FIELD_CREATED_TIME: &str = "created_time";
pub const FIELD_LAST_MODIFIED_TIME: &str = "last_modified_time";
/// Collection name, stamped on every rendered document
pub const FIELD_ENTITY_TYPE: &str = "entity_type";

/// How timestamps are rendered by [`Document::get_fields`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimestampFormat {
    /// Integer milliseconds since the Unix epoch
    Raw,
    /// RFC 3339, microsecond precision, `Z` suffix
    #[default]
    Canonical,
}

/// A stored entity: curriculum pathway, learning object, skill, ...
///
/// Only the structural fields are typed. Everything entity-specific lives in
/// `fields` and is patched through [`Document::apply_patch`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub uuid: String,

    /// Entity type; the name of the collection the document lives in
    pub collection: String,

    pub parent_nodes: NodeMap,
    pub child_nodes: NodeMap,

    /// Entity-specific business fields
    pub fields: FieldMap,

    pub is_deleted: bool,

    /// Write counter maintained by the repository (0 = never saved)
    pub version: u64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// New unsaved document with a generated UUIDv7
    pub fn new(collection: impl Into<String>) -> Self {
        Self::with_uuid(collection, Uuid::now_v7().to_string())
    }

    pub fn with_uuid(collection: impl Into<String>, uuid: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            uuid: uuid.into(),
            collection: collection.into(),
            parent_nodes: NodeMap::new(),
            child_nodes: NodeMap::new(),
            fields: FieldMap::new(),
            is_deleted: false,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Builder-style business field setter
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    pub fn with_parents(mut self, entity_type: &str, uuids: &[&str]) -> Self {
        self.parent_nodes
            .set(entity_type, uuids.iter().map(|u| u.to_string()).collect());
        self
    }

    pub fn with_children(mut self, entity_type: &str, uuids: &[&str]) -> Self {
        self.child_nodes
            .set(entity_type, uuids.iter().map(|u| u.to_string()).collect());
        self
    }

    pub fn node_ref(&self) -> NodeRef {
        NodeRef::new(self.collection.clone(), self.uuid.clone())
    }

    pub fn nodes(&self, relation: Relation) -> &NodeMap {
        match relation {
            Relation::Parents => &self.parent_nodes,
            Relation::Children => &self.child_nodes,
        }
    }

    pub fn nodes_mut(&mut self, relation: Relation) -> &mut NodeMap {
        match relation {
            Relation::Parents => &mut self.parent_nodes,
            Relation::Children => &mut self.child_nodes,
        }
    }

    /// Render the document as a field map
    pub fn get_fields(&self, format: TimestampFormat) -> FieldMap {
        let mut out = self.fields.clone();
        out.insert(FIELD_UUID.to_string(), Value::String(self.uuid.clone()));
        out.insert(
            FIELD_ENTITY_TYPE.to_string(),
            Value::String(self.collection.clone()),
        );
        out.insert(PARENT_NODES.to_string(), self.parent_nodes.to_value());
        out.insert(CHILD_NODES.to_string(), self.child_nodes.to_value());
        out.insert(FIELD_IS_DELETED.to_string(), Value::Bool(self.is_deleted));
        out.insert(FIELD_VERSION.to_string(), Value::from(self.version));
        out.insert(
            FIELD_CREATED_TIME.to_string(),
            render_timestamp(&self.created_at, format),
        );
        out.insert(
            FIELD_LAST_MODIFIED_TIME.to_string(),
            render_timestamp(&self.updated_at, format),
        );
        out
    }

    /// Parse a field map produced by `get_fields` (either timestamp format)
    ///
    /// # Errors
    ///
    /// Returns `InvalidDocument` if `uuid` is missing or a structural field
    /// has the wrong type.
    pub fn from_fields(collection: impl Into<String>, fields: &FieldMap) -> Result<Self> {
        let uuid = uuid_of(fields)?.to_string();
        let mut doc = Self::with_uuid(collection, uuid);

        for (key, value) in fields {
            match key.as_str() {
                FIELD_UUID | FIELD_ENTITY_TYPE => {}
                PARENT_NODES => doc.parent_nodes = NodeMap::from_value(value)?,
                CHILD_NODES => doc.child_nodes = NodeMap::from_value(value)?,
                FIELD_IS_DELETED => doc.is_deleted = parse_bool(key, value)?,
                FIELD_VERSION => {
                    doc.version = value.as_u64().ok_or_else(|| {
                        NodeLinkError::invalid_document("version must be a non-negative integer")
                    })?
                }
                FIELD_CREATED_TIME => doc.created_at = parse_timestamp(key, value)?,
                FIELD_LAST_MODIFIED_TIME => doc.updated_at = parse_timestamp(key, value)?,
                _ => {
                    doc.fields.insert(key.clone(), value.clone());
                }
            }
        }

        Ok(doc)
    }

    /// Merge a partial update into this document
    ///
    /// `parent_nodes`, `child_nodes` and `is_deleted` replace the typed
    /// fields. `version` and the timestamps belong to the repository and are
    /// ignored. A `null` business field removes the key.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDocument` if the patch tries to change `uuid` or a
    /// structural value has the wrong type. The document is left untouched
    /// in that case.
    pub fn apply_patch(&mut self, patch: &FieldMap) -> Result<()> {
        let mut next = self.clone();
        for (key, value) in patch {
            match key.as_str() {
                FIELD_UUID => {
                    if value.as_str() != Some(self.uuid.as_str()) {
                        return Err(NodeLinkError::invalid_document(format!(
                            "uuid is immutable (document {})",
                            self.uuid
                        )));
                    }
                }
                FIELD_VERSION | FIELD_CREATED_TIME | FIELD_LAST_MODIFIED_TIME
                | FIELD_ENTITY_TYPE => {}
                PARENT_NODES => next.parent_nodes = NodeMap::from_value(value)?,
                CHILD_NODES => next.child_nodes = NodeMap::from_value(value)?,
                FIELD_IS_DELETED => next.is_deleted = parse_bool(key, value)?,
                _ if value.is_null() => {
                    next.fields.remove(key);
                }
                _ => {
                    next.fields.insert(key.clone(), value.clone());
                }
            }
        }
        *self = next;
        Ok(())
    }
}

/// Read the `uuid` of a field map
///
/// # Errors
///
/// Returns `InvalidDocument` if the key is missing or not a string.
pub fn uuid_of(fields: &FieldMap) -> Result<&str> {
    fields
        .get(FIELD_UUID)
        .and_then(Value::as_str)
        .ok_or_else(|| NodeLinkError::invalid_document("document has no string uuid"))
}

/// Read one node map of a field map (absent key → empty map)
///
/// # Errors
///
/// Returns `InvalidDocument` if the value is not a node map.
pub fn nodes_of(fields: &FieldMap, relation: Relation) -> Result<NodeMap> {
    match fields.get(relation.field_name()) {
        Some(value) => NodeMap::from_value(value),
        None => Ok(NodeMap::new()),
    }
}

fn render_timestamp(ts: &DateTime<Utc>, format: TimestampFormat) -> Value {
    match format {
        TimestampFormat::Raw => Value::from(ts.timestamp_millis()),
        TimestampFormat::Canonical => {
            Value::String(ts.to_rfc3339_opts(SecondsFormat::Micros, true))
        }
    }
}

fn parse_timestamp(key: &str, value: &Value) -> Result<DateTime<Utc>> {
    let parsed = match value {
        Value::Number(n) => n
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        _ => None,
    };
    parsed.ok_or_else(|| NodeLinkError::invalid_document(format!("{} is not a timestamp", key)))
}

fn parse_bool(key: &str, value: &Value) -> Result<bool> {
    value
        .as_bool()
        .ok_or_else(|| NodeLinkError::invalid_document(format!("{} must be a bool", key)))
}
