use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{NodeLinkError, Result};

/// Address of one document: its collection (entity type) and UUID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeRef {
    pub collection: String,
    pub uuid: String,
}

impl NodeRef {
    pub fn new(collection: impl Into<String>, uuid: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            uuid: uuid.into(),
        }
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.uuid)
    }
}

/// Entity-type name → ordered list of UUIDs
///
/// Backs both `parent_nodes` and `child_nodes`. Keys iterate in sorted order
/// so that every walk over a map is deterministic; list order is whatever
/// the caller stored and is preserved by every mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeMap(BTreeMap<String, Vec<String>>);

/// Per-type changes between two versions of a node map
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeDelta {
    /// Present in the new map only, in new-list order
    pub added: Vec<NodeRef>,
    /// Present in the old map only, in old-list order
    pub removed: Vec<NodeRef>,
}

impl NodeDelta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

impl NodeMap {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// UUIDs listed under an entity type (empty when the key is absent)
    pub fn get(&self, entity_type: &str) -> &[String] {
        self.0.get(entity_type).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Replace the whole list for one entity type
    pub fn set(&mut self, entity_type: impl Into<String>, uuids: Vec<String>) {
        self.0.insert(entity_type.into(), uuids);
    }

    pub fn contains(&self, entity_type: &str, uuid: &str) -> bool {
        self.get(entity_type).iter().any(|u| u == uuid)
    }

    /// Append a UUID unless already present. Returns whether the map changed.
    pub fn add(&mut self, entity_type: &str, uuid: &str) -> bool {
        let list = self.0.entry(entity_type.to_string()).or_default();
        if list.iter().any(|u| u == uuid) {
            return false;
        }
        list.push(uuid.to_string());
        true
    }

    /// Remove every occurrence of a UUID. Returns whether the map changed.
    ///
    /// The entity-type key is kept with an empty list so readers still see
    /// the relation as declared.
    pub fn remove(&mut self, entity_type: &str, uuid: &str) -> bool {
        match self.0.get_mut(entity_type) {
            Some(list) => {
                let before = list.len();
                list.retain(|u| u != uuid);
                list.len() != before
            }
            None => false,
        }
    }

    pub fn entity_types(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Sum of all list lengths
    pub fn total_count(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_count() == 0
    }

    /// Every (entity type, uuid) pair, key order then list order
    pub fn iter_refs(&self) -> impl Iterator<Item = NodeRef> + '_ {
        self.0.iter().flat_map(|(entity_type, uuids)| {
            uuids
                .iter()
                .map(move |uuid| NodeRef::new(entity_type.clone(), uuid.clone()))
        })
    }

    /// Compute what changed between `old` and `new`
    pub fn diff(old: &NodeMap, new: &NodeMap) -> NodeDelta {
        let mut delta = NodeDelta::default();
        let entity_types: std::collections::BTreeSet<&str> =
            old.entity_types().chain(new.entity_types()).collect();

        for entity_type in entity_types {
            let old_list = old.get(entity_type);
            let new_list = new.get(entity_type);
            let old_set: HashSet<&str> = old_list.iter().map(String::as_str).collect();
            let new_set: HashSet<&str> = new_list.iter().map(String::as_str).collect();

            let mut seen = HashSet::new();
            for uuid in old_list {
                if !new_set.contains(uuid.as_str()) && seen.insert(uuid.as_str()) {
                    delta.removed.push(NodeRef::new(entity_type, uuid.clone()));
                }
            }
            seen.clear();
            for uuid in new_list {
                if !old_set.contains(uuid.as_str()) && seen.insert(uuid.as_str()) {
                    delta.added.push(NodeRef::new(entity_type, uuid.clone()));
                }
            }
        }

        delta
    }

    /// Parse a `parent_nodes` / `child_nodes` field value
    ///
    /// Accepts `null` (empty map) and objects whose values are arrays. Array
    /// entries may be plain UUID strings or already-expanded field maps that
    /// carry a `uuid` key, so partially-expanded documents read back the same
    /// references as raw ones.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDocument` for any other shape.
    pub fn from_value(value: &Value) -> Result<Self> {
        let object = match value {
            Value::Null => return Ok(Self::new()),
            Value::Object(object) => object,
            other => {
                return Err(NodeLinkError::invalid_document(format!(
                    "node map must be an object, got {}",
                    type_name(other)
                )))
            }
        };

        let mut map = BTreeMap::new();
        for (entity_type, entries) in object {
            let entries = match entries {
                Value::Null => Vec::new(),
                Value::Array(entries) => entries
                    .iter()
                    .map(|entry| entry_uuid(entity_type, entry))
                    .collect::<Result<Vec<_>>>()?,
                other => {
                    return Err(NodeLinkError::invalid_document(format!(
                        "node list for '{}' must be an array, got {}",
                        entity_type,
                        type_name(other)
                    )))
                }
            };
            map.insert(entity_type.clone(), entries);
        }
        Ok(Self(map))
    }

    pub fn to_value(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(k, v)| {
                    (
                        k.clone(),
                        Value::Array(v.iter().cloned().map(Value::String).collect()),
                    )
                })
                .collect(),
        )
    }
}

impl<K: Into<String>> FromIterator<(K, Vec<String>)> for NodeMap {
    fn from_iter<I: IntoIterator<Item = (K, Vec<String>)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

fn entry_uuid(entity_type: &str, entry: &Value) -> Result<String> {
    match entry {
        Value::String(uuid) => Ok(uuid.clone()),
        Value::Object(fields) => fields
            .get("uuid")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                NodeLinkError::invalid_document(format!(
                    "expanded entry under '{}' has no uuid",
                    entity_type
                ))
            }),
        other => Err(NodeLinkError::invalid_document(format!(
            "entry under '{}' must be a uuid string or object, got {}",
            entity_type,
            type_name(other)
        ))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
