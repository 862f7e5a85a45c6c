//! `guardiantrack-core` — collection-and-delivery pipeline for the
//! GuardianTrack agent.
//!
//! The pipeline has three producers (a recurring location sampler and two
//! one-shot log harvesters), one consumer (the fire-and-forget delivery
//! client), and a durable append-only sample log that backstops the location
//! stream when the network is unavailable. The [`controller`] module owns the
//! agent lifecycle and dispatches the producers on each start.
//!
//! Platform concerns — identity storage, permission checks, the location fix
//! feed, the call/message log providers, and foreground presence — are traits
//! at this crate's boundary; host bridges live in `guardiantrack-agentd`.

pub mod buffer;
pub mod capability;
pub mod config;
pub mod controller;
pub mod delivery;
pub mod encode;
pub mod identity;
pub mod sources;

pub use buffer::SampleLog;
pub use capability::{Capability, CapabilityChecker, CapabilitySet};
pub use controller::{
    AgentContext, AgentController, AgentState, Command, ForegroundGuard, ForegroundPresence,
    PresenceDenied,
};
pub use delivery::DeliveryClient;
pub use identity::{IdentityProvider, StaticIdentityProvider};
