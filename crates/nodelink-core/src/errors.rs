use nodelink_core_types::{RequestId, TraceId};
use thiserror::Error;

/// Result type alias using NodeLinkError
pub type Result<T> = std::result::Result<T, NodeLinkError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable code that callers (route handlers, the CLI)
/// can match on without depending on the shape of `NodeLinkError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Lookup
    NotFound,
    UnknownCollection,
    UnknownEntityClass,

    // Structural/Validation
    InvalidInput,
    ValidationFailure,
    CycleDetected,
    AlreadyExists,

    // Concurrency
    Concurrency,

    // Integration
    Serialization,
    Persistence,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::UnknownCollection => "ERR_UNKNOWN_COLLECTION",
            ExErrorKind::UnknownEntityClass => "ERR_UNKNOWN_ENTITY_CLASS",
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::ValidationFailure => "ERR_VALIDATION_FAILURE",
            ExErrorKind::CycleDetected => "ERR_CYCLE_DETECTED",
            ExErrorKind::AlreadyExists => "ERR_ALREADY_EXISTS",
            ExErrorKind::Concurrency => "ERR_CONCURRENCY",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Flattened view of a `NodeLinkError` with classification fields for
/// programmatic handling and correlation ids for log stitching.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    collection: Option<String>,
    uuid: Option<String>,
    request_id: Option<RequestId>,
    trace_id: Option<TraceId>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            collection: None,
            uuid: None,
            request_id: None,
            trace_id: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add collection (entity type) context
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    /// Add document UUID context
    pub fn with_uuid(mut self, uuid: impl Into<String>) -> Self {
        self.uuid = Some(uuid.into());
        self
    }

    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn collection(&self) -> Option<&str> {
        self.collection.as_deref()
    }

    pub fn uuid(&self) -> Option<&str> {
        self.uuid.as_deref()
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn trace_id(&self) -> Option<&TraceId> {
        self.trace_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(collection) = &self.collection {
            write!(f, " (collection: {})", collection)?;
        }
        if let Some(uuid) = &self.uuid {
            write!(f, " (uuid: {})", uuid)?;
        }
        if let Some(request_id) = &self.request_id {
            write!(f, " (request_id: {})", request_id)?;
        }
        if let Some(trace_id) = &self.trace_id {
            write!(f, " (trace_id: {})", trace_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Error taxonomy for NodeLink operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NodeLinkError {
    /// A referenced UUID does not resolve in its declared collection
    #[error("Resource not found: {collection}/{uuid}")]
    ResourceNotFound { collection: String, uuid: String },

    /// A structural precondition failed before a mutating operation
    #[error("Validation failed for {collection}/{uuid}: {reason}")]
    ValidationFailure {
        collection: String,
        uuid: String,
        reason: String,
    },

    /// No repository is registered under this collection name
    #[error("Unknown collection: {collection}")]
    UnknownCollection { collection: String },

    /// No collection is registered for this entity class
    #[error("Unknown entity class: {entity_class}")]
    UnknownEntityClass { entity_class: String },

    /// A document or patch does not have the expected shape
    #[error("Invalid document: {reason}")]
    InvalidDocument { reason: String },

    /// A node was reached twice on the same expansion path
    #[error("Cycle detected at {collection}/{uuid}")]
    CycleDetected { collection: String, uuid: String },

    /// A document with this UUID already exists in the collection
    #[error("Document already exists: {collection}/{uuid}")]
    AlreadyExists { collection: String, uuid: String },

    /// The stored version moved on between read and write
    #[error("Version conflict on {collection}/{uuid}: expected {expected}, found {found}")]
    VersionConflict {
        collection: String,
        uuid: String,
        expected: u64,
        found: u64,
    },

    /// Serialization error (JSON encoding/decoding)
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Backing store failure
    #[error("Persistence error: {message}")]
    Persistence { message: String },

    /// Generic internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl NodeLinkError {
    pub fn not_found(collection: impl Into<String>, uuid: impl Into<String>) -> Self {
        NodeLinkError::ResourceNotFound {
            collection: collection.into(),
            uuid: uuid.into(),
        }
    }

    pub fn invalid_document(reason: impl Into<String>) -> Self {
        NodeLinkError::InvalidDocument {
            reason: reason.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, NodeLinkError::ResourceNotFound { .. })
    }

    pub fn is_version_conflict(&self) -> bool {
        matches!(self, NodeLinkError::VersionConflict { .. })
    }
}

/// Conversion from NodeLinkError to ExError
impl From<NodeLinkError> for ExError {
    fn from(err: NodeLinkError) -> Self {
        let message = err.to_string();
        match err {
            NodeLinkError::ResourceNotFound { collection, uuid } => {
                ExError::new(ExErrorKind::NotFound)
                    .with_collection(collection)
                    .with_uuid(uuid)
                    .with_message("Resource not found")
            }

            NodeLinkError::ValidationFailure {
                collection,
                uuid,
                reason,
            } => ExError::new(ExErrorKind::ValidationFailure)
                .with_collection(collection)
                .with_uuid(uuid)
                .with_message(reason),

            NodeLinkError::UnknownCollection { collection } => {
                ExError::new(ExErrorKind::UnknownCollection)
                    .with_collection(collection)
                    .with_message("No repository registered")
            }

            NodeLinkError::UnknownEntityClass { entity_class } => {
                ExError::new(ExErrorKind::UnknownEntityClass)
                    .with_message(format!("No collection registered for {}", entity_class))
            }

            NodeLinkError::InvalidDocument { reason } => {
                ExError::new(ExErrorKind::InvalidInput).with_message(reason)
            }

            NodeLinkError::CycleDetected { collection, uuid } => {
                ExError::new(ExErrorKind::CycleDetected)
                    .with_collection(collection)
                    .with_uuid(uuid)
                    .with_message("Node revisited on its own expansion path")
            }

            NodeLinkError::AlreadyExists { collection, uuid } => {
                ExError::new(ExErrorKind::AlreadyExists)
                    .with_collection(collection)
                    .with_uuid(uuid)
                    .with_message("Document already exists")
            }

            NodeLinkError::VersionConflict {
                collection, uuid, ..
            } => ExError::new(ExErrorKind::Concurrency)
                .with_collection(collection)
                .with_uuid(uuid)
                .with_message(message),

            NodeLinkError::Serialization { message } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }

            NodeLinkError::Persistence { message } => {
                ExError::new(ExErrorKind::Persistence).with_message(message)
            }

            NodeLinkError::Internal { message } => {
                ExError::new(ExErrorKind::Internal).with_message(message)
            }
        }
    }
}

/// Conversion from serde_json::Error to NodeLinkError
impl From<serde_json::Error> for NodeLinkError {
    fn from(err: serde_json::Error) -> Self {
        NodeLinkError::Serialization {
            message: err.to_string(),
        }
    }
}
