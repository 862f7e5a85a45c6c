//! `guardiantrack-protocol` — record and wire types for the tracking agent.
//!
//! Everything the collection pipeline produces or transmits is defined here:
//! the typed records read from the device (location samples, call and message
//! events), the direction enums with their total code mappings, and the
//! form-encoded [`Envelope`] handed to the delivery client. This crate does
//! no I/O.

pub mod envelope;
pub mod records;

pub use envelope::{Envelope, RecordKind};
pub use records::{
    CallDirection, CallEvent, Identity, LocationSample, MessageDirection, MessageEvent,
};
