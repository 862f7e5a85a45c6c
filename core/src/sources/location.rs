//! Recurring location sampler.
//!
//! Subscribes to the platform fix source at a 30 s target / 15 s fastest
//! interval with a high-accuracy preference, and consumes delivered fixes on
//! a spawned task. Each non-empty fix becomes exactly one sample, appended to
//! the durable log and submitted to the sink. Registration requires at least
//! one of the two location capabilities; a denial is logged once and the
//! sampler stays inert — no retry loop, no polling fallback.

use std::sync::Arc;

use guardiantrack_protocol::LocationSample;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::buffer::SampleLog;
use crate::capability::{Capability, CapabilityChecker};
use crate::delivery::DeliveryClient;
use crate::encode;
use crate::identity::IdentityProvider;

pub const DEFAULT_UPDATE_INTERVAL_MS: u64 = 30_000;
pub const DEFAULT_FASTEST_INTERVAL_MS: u64 = 15_000;

/// Parameters of a recurring fix subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixRequest {
    pub interval_ms: u64,
    pub fastest_interval_ms: u64,
    pub high_accuracy: bool,
}

impl FixRequest {
    pub fn new(interval_ms: u64, fastest_interval_ms: u64) -> Self {
        Self {
            interval_ms,
            fastest_interval_ms,
            high_accuracy: true,
        }
    }
}

impl Default for FixRequest {
    fn default() -> Self {
        Self::new(DEFAULT_UPDATE_INTERVAL_MS, DEFAULT_FASTEST_INTERVAL_MS)
    }
}

/// One reported geographic position.
#[derive(Debug, Clone, PartialEq)]
pub struct Fix {
    pub latitude: f64,
    pub longitude: f64,
    /// Source clock of the fix, milliseconds since epoch.
    pub timestamp_ms: i64,
}

/// Event delivered by the platform fix provider.
#[derive(Debug, Clone, PartialEq)]
pub enum FixEvent {
    /// A fix callback. The platform may deliver an empty result.
    Fix(Option<Fix>),
    /// Availability notice. Logged only, never acted upon.
    Availability(bool),
}

#[derive(Debug, thiserror::Error)]
pub enum SubscribeError {
    #[error("fix subscription failed: {0}")]
    Subscription(String),
}

/// Platform source of recurring location fixes.
///
/// Dropping the returned receiver ends the subscription.
pub trait FixSource: Send + Sync {
    fn subscribe(&self, request: FixRequest) -> Result<mpsc::Receiver<FixEvent>, SubscribeError>;
}

/// Handle to the running sampler registration.
///
/// `stop` tears the registration down exactly once; stopping an inert or
/// already-stopped sampler is a no-op.
#[derive(Debug, Default)]
pub struct LocationSampler {
    task: Option<JoinHandle<()>>,
}

impl LocationSampler {
    /// Register for recurring fixes and start consuming them.
    ///
    /// Returns an inert sampler (and logs why) when neither location
    /// capability is granted or the subscription itself fails.
    pub fn start(
        source: &dyn FixSource,
        capabilities: &dyn CapabilityChecker,
        identity: Arc<dyn IdentityProvider>,
        delivery: DeliveryClient,
        buffer: SampleLog,
        request: FixRequest,
    ) -> Self {
        if !capabilities.has_capability(Capability::FineLocation)
            && !capabilities.has_capability(Capability::CoarseLocation)
        {
            tracing::error!("location capability not granted, sampler not registered");
            return Self::default();
        }

        let mut events = match source.subscribe(request) {
            Ok(receiver) => receiver,
            Err(error) => {
                tracing::error!("cannot register for location updates: {error}");
                return Self::default();
            }
        };
        tracing::debug!(
            interval_ms = request.interval_ms,
            fastest_interval_ms = request.fastest_interval_ms,
            "registered for location updates"
        );

        let task = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    FixEvent::Availability(available) => {
                        tracing::debug!(available, "location availability changed");
                    }
                    FixEvent::Fix(None) => {
                        tracing::warn!("fix callback delivered no location");
                    }
                    FixEvent::Fix(Some(fix)) => {
                        handle_fix(identity.as_ref(), &delivery, &buffer, &fix);
                    }
                }
            }
            tracing::debug!("fix subscription ended");
        });

        Self { task: Some(task) }
    }

    /// Whether a registration is currently held.
    pub fn is_registered(&self) -> bool {
        self.task.is_some()
    }

    /// Unregister the fix subscription. Idempotent.
    pub fn stop(&mut self) {
        match self.task.take() {
            Some(task) => {
                task.abort();
                tracing::debug!("location updates removed");
            }
            None => tracing::debug!("location sampler already stopped"),
        }
    }
}

/// Turn one delivered fix into one buffered and one submitted sample.
///
/// Identity absence drops the fix with a single log entry: no buffer line,
/// no submission.
fn handle_fix(
    identity: &dyn IdentityProvider,
    delivery: &DeliveryClient,
    buffer: &SampleLog,
    fix: &Fix,
) {
    let Some(identity) = identity.identity() else {
        tracing::error!("identity not configured, dropping location sample");
        return;
    };

    let sample = LocationSample {
        identity_id: identity.id,
        latitude: fix.latitude,
        longitude: fix.longitude,
        fix_timestamp_ms: fix.timestamp_ms,
        capture_timestamp_ms: encode::now_ms(),
    };
    tracing::debug!(
        latitude = sample.latitude,
        longitude = sample.longitude,
        "location update"
    );

    if let Err(error) = buffer.append(&sample) {
        tracing::error!("failed to append sample to durable log: {error}");
    }
    let _ = delivery.submit(encode::location(&sample, encode::now_ms()));
}
