//! One-shot call-history harvester.
//!
//! Snapshots the full call log newest-first at dispatch time and hands each
//! row to the delivery client immediately — no batching, no buffering. A
//! denied capability or absent identity exits with a single log entry and
//! zero source queries/submissions; a query failure aborts this harvester
//! only.

use guardiantrack_protocol::CallEvent;

use crate::capability::{Capability, CapabilityChecker};
use crate::delivery::DeliveryClient;
use crate::encode;
use crate::identity::IdentityProvider;
use crate::sources::{CallLogSource, CallRow};

/// Map one raw row to a typed event. Pure and total: every type code maps to
/// a direction and a missing number becomes the unknown placeholder.
fn event_from_row(identity_id: i64, row: CallRow) -> CallEvent {
    CallEvent::new(
        identity_id,
        row.number,
        row.type_code,
        row.duration_seconds,
        row.timestamp_ms,
    )
}

/// Harvest the call log once, submitting every row.
pub fn harvest_calls(
    source: &dyn CallLogSource,
    capabilities: &dyn CapabilityChecker,
    identity: &dyn IdentityProvider,
    delivery: &DeliveryClient,
) {
    if !capabilities.has_capability(Capability::ReadCallLog) {
        tracing::warn!("call-log capability not granted, skipping call harvest");
        return;
    }

    let Some(identity) = identity.identity() else {
        tracing::warn!("identity not configured, skipping call harvest");
        return;
    };

    let rows = match source.query_descending() {
        Ok(rows) => rows,
        Err(error) => {
            tracing::error!("call log query failed: {error}");
            return;
        }
    };
    tracing::debug!(rows = rows.len(), "harvesting call log");

    for row in rows {
        let event = event_from_row(identity.id, row);
        let _ = delivery.submit(encode::call_event(&event, encode::now_ms()));
    }
}
