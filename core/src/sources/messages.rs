//! One-shot message-log harvester.
//!
//! Mirrors the call harvester: capability gate, identity gate, one
//! newest-first snapshot query, pure row mapping, immediate submission.

use guardiantrack_protocol::MessageEvent;

use crate::capability::{Capability, CapabilityChecker};
use crate::delivery::DeliveryClient;
use crate::encode;
use crate::identity::IdentityProvider;
use crate::sources::{MessageLogSource, MessageRow};

/// Map one raw row to a typed event, normalizing the address and truncating
/// the body. Pure and total.
fn event_from_row(identity_id: i64, row: MessageRow) -> MessageEvent {
    MessageEvent::new(
        identity_id,
        row.address,
        row.body,
        row.type_code,
        row.timestamp_ms,
    )
}

/// Harvest the message log once, submitting every row.
pub fn harvest_messages(
    source: &dyn MessageLogSource,
    capabilities: &dyn CapabilityChecker,
    identity: &dyn IdentityProvider,
    delivery: &DeliveryClient,
) {
    if !capabilities.has_capability(Capability::ReadSms) {
        tracing::warn!("message-log capability not granted, skipping message harvest");
        return;
    }

    let Some(identity) = identity.identity() else {
        tracing::warn!("identity not configured, skipping message harvest");
        return;
    };

    let rows = match source.query_descending() {
        Ok(rows) => rows,
        Err(error) => {
            tracing::error!("message log query failed: {error}");
            return;
        }
    };
    tracing::debug!(rows = rows.len(), "harvesting message log");

    for row in rows {
        let event = event_from_row(identity.id, row);
        let _ = delivery.submit(encode::message_event(&event, encode::now_ms()));
    }
}
