//! Canonical schema constants for structured logging
//!
//! Every boundary log line emitted by the synchronizer, the tree walker and
//! the CLI uses these keys so that log pipelines can index them uniformly.

// Envelope
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";

// Document addressing
pub const FIELD_COLLECTION: &str = "collection";
pub const FIELD_UUID: &str = "uuid";
pub const FIELD_ENTITY_CLASS: &str = "entity_class";

// Error fields
pub const FIELD_ERR_KIND: &str = "err_kind";
pub const FIELD_ERR_CODE: &str = "err_code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
