//! Runtime configuration
//!
//! All settings have defaults, so an empty TOML file (or none at all) is a
//! valid configuration.
//!
//! ```toml
//! [sync]
//! failure_policy = "best_effort"
//! max_conflict_retries = 5
//!
//! [walker]
//! max_depth = 32
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{NodeLinkError, Result};

/// What the synchronizer does with a neighbor that cannot be resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Abort the call on the first `ResourceNotFound`
    #[default]
    Strict,
    /// Skip the neighbor and record it in the report
    BestEffort,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub failure_policy: FailurePolicy,
    /// Re-reads allowed per neighbor after a version conflict
    pub max_conflict_retries: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::Strict,
            max_conflict_retries: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkerConfig {
    /// Deepest level a recursive expansion or cascade delete may reach
    pub max_depth: usize,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self { max_depth: 64 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeLinkConfig {
    pub sync: SyncConfig,
    pub walker: WalkerConfig,
}

impl NodeLinkConfig {
    /// Parse a TOML document
    ///
    /// # Errors
    ///
    /// `Serialization` if the text is not valid TOML for this schema.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| NodeLinkError::Serialization {
            message: format!("invalid config: {}", e),
        })
    }

    /// Read and parse a TOML file
    ///
    /// # Errors
    ///
    /// `Internal` if the file cannot be read, `Serialization` if it does not parse.
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| NodeLinkError::Internal {
            message: format!("cannot read config {}: {}", path.display(), e),
        })?;
        Self::from_toml_str(&text)
    }
}
