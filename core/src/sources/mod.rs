//! Collection sources: one recurring location sampler and two one-shot log
//! harvesters.
//!
//! Each source is callback/pull-driven against a platform trait, consults the
//! capability checker before touching its source, and hands every record
//! straight to the delivery client. Failures are caught here and logged;
//! nothing propagates upward to the lifecycle controller.

pub mod calls;
pub mod location;
pub mod messages;

pub use calls::harvest_calls;
pub use location::{Fix, FixEvent, FixRequest, FixSource, LocationSampler, SubscribeError};
pub use messages::harvest_messages;

/// A harvester's one-shot query failed; the remaining rows of that harvester
/// are abandoned. Logged, never retried.
#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    #[error("log query failed: {0}")]
    Query(String),
}

/// Raw call-log row with the fixed projection (number, type, date, duration).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRow {
    pub number: Option<String>,
    pub type_code: i64,
    pub timestamp_ms: i64,
    pub duration_seconds: i64,
}

/// Raw message-log row with the fixed projection (address, body, date, type).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRow {
    pub address: Option<String>,
    pub body: Option<String>,
    pub type_code: i64,
    pub timestamp_ms: i64,
}

/// Queryable read-only call history. Rows are returned newest-first.
pub trait CallLogSource: Send + Sync {
    fn query_descending(&self) -> Result<Vec<CallRow>, HarvestError>;
}

/// Queryable read-only message log. Rows are returned newest-first.
pub trait MessageLogSource: Send + Sync {
    fn query_descending(&self) -> Result<Vec<MessageRow>, HarvestError>;
}
