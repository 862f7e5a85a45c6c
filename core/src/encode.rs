//! Record encoder: typed record in, wire envelope out.
//!
//! Pure and deterministic — no I/O, no failure path. Every envelope that
//! carries an event timestamp also carries `DeviceTimestamp`, the local clock
//! at encode time, so the sink can analyze clock skew downstream.

use guardiantrack_protocol::{CallEvent, Envelope, Identity, LocationSample, MessageEvent, RecordKind};

/// Local clock in milliseconds since the Unix epoch.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Envelope for one location sample.
pub fn location(sample: &LocationSample, submitted_at_ms: i64) -> Envelope {
    Envelope::new(
        RecordKind::Location,
        vec![
            ("UserId", sample.identity_id.to_string()),
            ("DataType", RecordKind::Location.as_str().to_string()),
            ("Latitude", sample.latitude.to_string()),
            ("Longitude", sample.longitude.to_string()),
            ("Timestamp", sample.fix_timestamp_ms.to_string()),
            ("DeviceTimestamp", submitted_at_ms.to_string()),
        ],
    )
}

/// Envelope for one call-history event.
pub fn call_event(event: &CallEvent, submitted_at_ms: i64) -> Envelope {
    let details = format!(
        "Number: {}, Type: {}, Duration: {} sec",
        event.number,
        event.direction.label(),
        event.duration_seconds
    );
    alert(
        RecordKind::CallLog,
        event.identity_id,
        details,
        event.event_timestamp_ms,
        submitted_at_ms,
    )
}

/// Envelope for one message-log event.
pub fn message_event(event: &MessageEvent, submitted_at_ms: i64) -> Envelope {
    let details = format!(
        "From/To: {}, Type: {}, Body: {}",
        event.address,
        event.direction.label(),
        event.body
    );
    alert(
        RecordKind::SmsLog,
        event.identity_id,
        details,
        event.event_timestamp_ms,
        submitted_at_ms,
    )
}

/// Envelope for the identity record submitted once per successful start.
pub fn identity(identity: &Identity) -> Envelope {
    Envelope::new(
        RecordKind::UserData,
        vec![
            ("UserId", identity.id.to_string()),
            ("UserName", identity.name.clone()),
            ("PhoneNumber", identity.phone.clone()),
            ("Email", identity.email.clone()),
            ("DataType", RecordKind::UserData.as_str().to_string()),
        ],
    )
}

/// Shared shape of the two "alert" kinds: a composed human-readable
/// `Details` string plus the event and device timestamps.
fn alert(
    kind: RecordKind,
    identity_id: i64,
    details: String,
    event_timestamp_ms: i64,
    submitted_at_ms: i64,
) -> Envelope {
    Envelope::new(
        kind,
        vec![
            ("UserId", identity_id.to_string()),
            ("DataType", kind.as_str().to_string()),
            ("Details", details),
            ("Timestamp", event_timestamp_ms.to_string()),
            ("DeviceTimestamp", submitted_at_ms.to_string()),
        ],
    )
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use guardiantrack_protocol::{CallDirection, MessageDirection};
    use pretty_assertions::assert_eq;

    use super::*;

    fn sample() -> LocationSample {
        LocationSample {
            identity_id: 7,
            latitude: 1.23456,
            longitude: -9.8765,
            fix_timestamp_ms: 1000,
            capture_timestamp_ms: 2000,
        }
    }

    #[test]
    fn location_envelope_carries_required_fields() {
        let envelope = location(&sample(), 5000);
        assert_eq!(envelope.kind(), RecordKind::Location);
        assert_eq!(envelope.field("UserId"), Some("7"));
        assert_eq!(envelope.field("DataType"), Some("Location"));
        assert_eq!(envelope.field("Latitude"), Some("1.23456"));
        assert_eq!(envelope.field("Longitude"), Some("-9.8765"));
        assert_eq!(envelope.field("Timestamp"), Some("1000"));
        assert_eq!(envelope.field("DeviceTimestamp"), Some("5000"));
    }

    #[test]
    fn location_envelope_round_trips_exactly() {
        let original = sample();
        let envelope = location(&original, 5000);

        let latitude: f64 = envelope.field("Latitude").unwrap().parse().unwrap();
        let longitude: f64 = envelope.field("Longitude").unwrap().parse().unwrap();
        let fix_ts: i64 = envelope.field("Timestamp").unwrap().parse().unwrap();

        assert_eq!(latitude, original.latitude);
        assert_eq!(longitude, original.longitude);
        assert_eq!(fix_ts, original.fix_timestamp_ms);
    }

    #[test]
    fn device_timestamp_is_distinct_from_event_timestamp() {
        let envelope = location(&sample(), 987654);
        assert_ne!(
            envelope.field("Timestamp"),
            envelope.field("DeviceTimestamp")
        );
    }

    #[test]
    fn call_envelope_composes_details() {
        let event = CallEvent {
            identity_id: 7,
            number: "555-0100".to_string(),
            direction: CallDirection::Missed,
            duration_seconds: 42,
            event_timestamp_ms: 1234,
        };
        let envelope = call_event(&event, 9999);
        assert_eq!(envelope.field("DataType"), Some("CallLog"));
        assert_eq!(
            envelope.field("Details"),
            Some("Number: 555-0100, Type: MISSED, Duration: 42 sec")
        );
        assert_eq!(envelope.field("Timestamp"), Some("1234"));
        assert_eq!(envelope.field("DeviceTimestamp"), Some("9999"));
    }

    #[test]
    fn message_envelope_composes_details() {
        let event = MessageEvent {
            identity_id: 7,
            address: "555-0101".to_string(),
            body: "hello".to_string(),
            direction: MessageDirection::Inbox,
            event_timestamp_ms: 4321,
        };
        let envelope = message_event(&event, 8888);
        assert_eq!(envelope.field("DataType"), Some("SMSLog"));
        assert_eq!(
            envelope.field("Details"),
            Some("From/To: 555-0101, Type: INBOX, Body: hello")
        );
    }

    #[test]
    fn identity_envelope_has_no_timestamps() {
        let envelope = identity(&Identity {
            id: 7,
            name: "A".to_string(),
            phone: "555".to_string(),
            email: "a@x".to_string(),
        });
        assert_eq!(envelope.kind(), RecordKind::UserData);
        assert_eq!(envelope.field("UserId"), Some("7"));
        assert_eq!(envelope.field("UserName"), Some("A"));
        assert_eq!(envelope.field("PhoneNumber"), Some("555"));
        assert_eq!(envelope.field("Email"), Some("a@x"));
        assert_eq!(envelope.field("Timestamp"), None);
    }

    #[test]
    fn encoding_is_deterministic() {
        let event = CallEvent::new(7, None, 99, 0, 50);
        assert_eq!(call_event(&event, 60), call_event(&event, 60));
        assert_eq!(
            call_event(&event, 60).field("Details"),
            Some("Number: Unknown, Type: UNKNOWN_TYPE_99, Duration: 0 sec")
        );
    }
}
