//! Call/message log snapshots bridged from JSON-lines files.
//!
//! The host exports each on-device log as one JSON object per line; the
//! sources here read the whole snapshot, sort it newest-first, and hand the
//! rows to the harvesters. An unconfigured path is an empty log, not an
//! error; an unreadable file is a query failure. Individual malformed lines
//! are warned and skipped so one corrupt line does not abort a snapshot.

use std::path::PathBuf;

use guardiantrack_core::sources::{
    CallLogSource, CallRow, HarvestError, MessageLogSource, MessageRow,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;

#[derive(Debug, Deserialize)]
struct CallRecord {
    #[serde(default)]
    number: Option<String>,
    type_code: i64,
    timestamp_ms: i64,
    #[serde(default)]
    duration_seconds: i64,
}

#[derive(Debug, Deserialize)]
struct MessageRecord {
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    body: Option<String>,
    type_code: i64,
    timestamp_ms: i64,
}

/// Read a JSON-lines snapshot, newest row first.
fn read_snapshot<R: DeserializeOwned>(
    path: Option<&PathBuf>,
    kind: &str,
) -> Result<Vec<R>, HarvestError> {
    let Some(path) = path else {
        tracing::debug!(kind, "no snapshot path configured, treating log as empty");
        return Ok(Vec::new());
    };

    let raw = std::fs::read_to_string(path).map_err(|error| {
        HarvestError::Query(format!("cannot read {kind} snapshot {}: {error}", path.display()))
    })?;

    let mut records = Vec::new();
    for line in raw.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<R>(trimmed) {
            Ok(record) => records.push(record),
            Err(error) => tracing::warn!(kind, "skipping malformed snapshot line: {error}"),
        }
    }
    Ok(records)
}

/// Call history snapshot file.
#[derive(Debug, Clone, Default)]
pub struct JsonlCallLogSource {
    path: Option<PathBuf>,
}

impl JsonlCallLogSource {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

impl CallLogSource for JsonlCallLogSource {
    fn query_descending(&self) -> Result<Vec<CallRow>, HarvestError> {
        let mut records: Vec<CallRecord> = read_snapshot(self.path.as_ref(), "call-log")?;
        records.sort_by_key(|record| std::cmp::Reverse(record.timestamp_ms));
        Ok(records
            .into_iter()
            .map(|record| CallRow {
                number: record.number,
                type_code: record.type_code,
                timestamp_ms: record.timestamp_ms,
                duration_seconds: record.duration_seconds,
            })
            .collect())
    }
}

/// Message log snapshot file.
#[derive(Debug, Clone, Default)]
pub struct JsonlMessageLogSource {
    path: Option<PathBuf>,
}

impl JsonlMessageLogSource {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

impl MessageLogSource for JsonlMessageLogSource {
    fn query_descending(&self) -> Result<Vec<MessageRow>, HarvestError> {
        let mut records: Vec<MessageRecord> = read_snapshot(self.path.as_ref(), "message-log")?;
        records.sort_by_key(|record| std::cmp::Reverse(record.timestamp_ms));
        Ok(records
            .into_iter()
            .map(|record| MessageRow {
                address: record.address,
                body: record.body,
                type_code: record.type_code,
                timestamp_ms: record.timestamp_ms,
            })
            .collect())
    }
}
