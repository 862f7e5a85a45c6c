//! Typed records produced by the collection sources.
//!
//! Records are immutable once constructed. Every record carries the numeric
//! id of the resolved [`Identity`]; the pipeline never constructs a record
//! without one.

use serde::{Deserialize, Serialize};

/// Placeholder for a missing counterparty number/address in a source row.
pub const UNKNOWN_PARTY: &str = "Unknown";

/// Maximum number of message-body characters carried on the wire.
pub const MAX_BODY_CHARS: usize = 100;

/// Marker appended to a truncated message body.
pub const TRUNCATION_MARKER: &str = "...";

/// Device-owner identity captured by the settings form.
///
/// Read-only for the lifetime of a session. A submission is only attempted
/// when the identity is present and [`complete`](Identity::is_complete).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub email: String,
}

impl Identity {
    /// True when every descriptive field is non-empty.
    ///
    /// An incomplete identity is a terminal condition for a submission: the
    /// record is dropped and logged, never queued.
    pub fn is_complete(&self) -> bool {
        !self.name.is_empty() && !self.phone.is_empty() && !self.email.is_empty()
    }
}

/// One geographic fix, as sampled by the location source.
///
/// `fix_timestamp_ms` is the source clock of the fix; `capture_timestamp_ms`
/// is the local clock at the moment the callback delivered it. Both are
/// milliseconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    pub identity_id: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub fix_timestamp_ms: i64,
    pub capture_timestamp_ms: i64,
}

/// Direction/type of a call-log row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallDirection {
    Outgoing,
    Incoming,
    Missed,
    Voicemail,
    Rejected,
    Blocked,
    /// Unmapped platform code, carried verbatim.
    Unknown(i64),
}

impl CallDirection {
    /// Total mapping from the platform's call-type code.
    ///
    /// Codes follow the device call-log provider; anything unrecognized maps
    /// to [`CallDirection::Unknown`] rather than being dropped.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Incoming,
            2 => Self::Outgoing,
            3 => Self::Missed,
            4 => Self::Voicemail,
            5 => Self::Rejected,
            6 => Self::Blocked,
            other => Self::Unknown(other),
        }
    }

    /// Wire label for the `Details` field.
    pub fn label(&self) -> String {
        match self {
            Self::Outgoing => "OUTGOING".to_string(),
            Self::Incoming => "INCOMING".to_string(),
            Self::Missed => "MISSED".to_string(),
            Self::Voicemail => "VOICEMAIL".to_string(),
            Self::Rejected => "REJECTED".to_string(),
            Self::Blocked => "BLOCKED".to_string(),
            Self::Unknown(code) => format!("UNKNOWN_TYPE_{code}"),
        }
    }
}

/// Direction/type of a message-log row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageDirection {
    Inbox,
    Sent,
    Draft,
    Outbox,
    Failed,
    Queued,
    /// Unmapped platform code, carried verbatim.
    Unknown(i64),
}

impl MessageDirection {
    /// Total mapping from the platform's message-type code.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Inbox,
            2 => Self::Sent,
            3 => Self::Draft,
            4 => Self::Outbox,
            5 => Self::Failed,
            6 => Self::Queued,
            other => Self::Unknown(other),
        }
    }

    /// Wire label for the `Details` field.
    pub fn label(&self) -> String {
        match self {
            Self::Inbox => "INBOX".to_string(),
            Self::Sent => "SENT".to_string(),
            Self::Draft => "DRAFT".to_string(),
            Self::Outbox => "OUTBOX".to_string(),
            Self::Failed => "FAILED".to_string(),
            Self::Queued => "QUEUED".to_string(),
            Self::Unknown(code) => format!("UNKNOWN_TYPE_{code}"),
        }
    }
}

/// One call-history row, snapshot-read and normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallEvent {
    pub identity_id: i64,
    pub number: String,
    pub direction: CallDirection,
    pub duration_seconds: i64,
    pub event_timestamp_ms: i64,
}

impl CallEvent {
    /// Build an event from a raw row. Total: a missing number becomes
    /// [`UNKNOWN_PARTY`] and any type code maps to a direction.
    pub fn new(
        identity_id: i64,
        number: Option<String>,
        type_code: i64,
        duration_seconds: i64,
        event_timestamp_ms: i64,
    ) -> Self {
        Self {
            identity_id,
            number: number.unwrap_or_else(|| UNKNOWN_PARTY.to_string()),
            direction: CallDirection::from_code(type_code),
            duration_seconds,
            event_timestamp_ms,
        }
    }
}

/// One message-log row, snapshot-read and normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEvent {
    pub identity_id: i64,
    pub address: String,
    /// Body truncated to [`MAX_BODY_CHARS`] characters, with
    /// [`TRUNCATION_MARKER`] appended when anything was cut.
    pub body: String,
    pub direction: MessageDirection,
    pub event_timestamp_ms: i64,
}

impl MessageEvent {
    /// Build an event from a raw row, normalizing the address and truncating
    /// the body.
    pub fn new(
        identity_id: i64,
        address: Option<String>,
        body: Option<String>,
        type_code: i64,
        event_timestamp_ms: i64,
    ) -> Self {
        Self {
            identity_id,
            address: address.unwrap_or_else(|| UNKNOWN_PARTY.to_string()),
            body: truncate_body(&body.unwrap_or_default()),
            direction: MessageDirection::from_code(type_code),
            event_timestamp_ms,
        }
    }
}

/// First [`MAX_BODY_CHARS`] characters of `body`, marked when truncated.
fn truncate_body(body: &str) -> String {
    let mut truncated: String = body.chars().take(MAX_BODY_CHARS).collect();
    if body.chars().count() > MAX_BODY_CHARS {
        truncated.push_str(TRUNCATION_MARKER);
    }
    truncated
}
