//! Agent lifecycle controller.
//!
//! Owns the `Stopped → Starting → Running → Stopping → Stopped` state
//! machine as a single value — no ambient globals. Each transition into
//! `Running` establishes foreground presence, submits the identity record,
//! registers the location sampler, and runs both harvesters exactly once.
//! Every source failure is caught and logged at its own boundary; only a
//! foreground-presence denial is fatal to a start attempt.

use std::sync::Arc;

use crate::buffer::SampleLog;
use crate::capability::CapabilityChecker;
use crate::delivery::DeliveryClient;
use crate::encode;
use crate::identity::IdentityProvider;
use crate::sources::location::{FixRequest, FixSource, LocationSampler};
use crate::sources::{CallLogSource, MessageLogSource, harvest_calls, harvest_messages};

/// Lifecycle state of the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

/// External command delivered to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    StartTracking,
    StopTracking,
}

impl Command {
    /// Map a host start signal to a command.
    ///
    /// An unrecognized or absent action is treated as a start, so a host
    /// process restart without an explicit action resumes collection.
    pub fn from_action(action: Option<&str>) -> Self {
        match action {
            Some(action) if action.eq_ignore_ascii_case("stop") => Self::StopTracking,
            _ => Self::StartTracking,
        }
    }
}

/// The platform denied foreground presence. Fatal to the current start
/// attempt; the controller logs it and returns to `Stopped` without retry.
#[derive(Debug, thiserror::Error)]
#[error("foreground presence denied: {reason}")]
pub struct PresenceDenied {
    pub reason: String,
}

/// Token for held foreground presence. Dropping it releases the presence.
pub trait ForegroundGuard: Send {}

/// The host subsystem that keeps a long-running worker visible (and
/// therefore alive). May deny at its own discretion.
pub trait ForegroundPresence: Send + Sync {
    fn establish(&self) -> Result<Box<dyn ForegroundGuard>, PresenceDenied>;
}

/// Everything the controller needs to run the pipeline. All members are
/// read-only, process-lifetime configuration or platform seams.
pub struct AgentContext {
    pub identity: Arc<dyn IdentityProvider>,
    pub capabilities: Arc<dyn CapabilityChecker>,
    pub fixes: Arc<dyn FixSource>,
    pub call_log: Arc<dyn CallLogSource>,
    pub message_log: Arc<dyn MessageLogSource>,
    pub presence: Arc<dyn ForegroundPresence>,
    pub delivery: DeliveryClient,
    pub buffer: SampleLog,
    pub fix_request: FixRequest,
}

/// Owner of the lifecycle state machine and the sampler registration.
pub struct AgentController {
    context: AgentContext,
    state: AgentState,
    guard: Option<Box<dyn ForegroundGuard>>,
    sampler: Option<LocationSampler>,
}

impl AgentController {
    pub fn new(context: AgentContext) -> Self {
        Self {
            context,
            state: AgentState::Stopped,
            guard: None,
            sampler: None,
        }
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    pub fn handle(&mut self, command: Command) {
        match command {
            Command::StartTracking => self.start(),
            Command::StopTracking => self.stop(),
        }
    }

    /// Start (or restart) collection.
    ///
    /// A presence denial aborts the attempt before any source is dispatched.
    /// Re-entry while running reuses the held presence guard — establishing a
    /// second one would conflict with our own — and releases the previous
    /// sampler registration before dispatching anew, so the transition stays
    /// idempotent.
    fn start(&mut self) {
        self.state = AgentState::Starting;
        tracing::info!("starting tracking");

        if self.guard.is_some() {
            tracing::debug!("foreground presence already held");
        } else {
            match self.context.presence.establish() {
                Ok(guard) => {
                    self.guard = Some(guard);
                }
                Err(denied) => {
                    tracing::error!("cannot establish foreground presence: {denied}");
                    self.release();
                    self.state = AgentState::Stopped;
                    return;
                }
            }
        }

        self.state = AgentState::Running;
        self.submit_identity();

        if let Some(sampler) = self.sampler.as_mut() {
            sampler.stop();
        }
        self.sampler = Some(LocationSampler::start(
            self.context.fixes.as_ref(),
            self.context.capabilities.as_ref(),
            Arc::clone(&self.context.identity),
            self.context.delivery.clone(),
            self.context.buffer.clone(),
            self.context.fix_request,
        ));

        harvest_calls(
            self.context.call_log.as_ref(),
            self.context.capabilities.as_ref(),
            self.context.identity.as_ref(),
            &self.context.delivery,
        );
        harvest_messages(
            self.context.message_log.as_ref(),
            self.context.capabilities.as_ref(),
            self.context.identity.as_ref(),
            &self.context.delivery,
        );
    }

    /// Stop collection and release every registration. In-flight deliveries
    /// are left to complete or fail on their own.
    fn stop(&mut self) {
        self.state = AgentState::Stopping;
        tracing::info!("stopping tracking");
        self.release();
        self.state = AgentState::Stopped;
    }

    fn release(&mut self) {
        if let Some(mut sampler) = self.sampler.take() {
            sampler.stop();
        }
        self.guard = None;
    }

    /// Submit the identity record once per successful start. Incomplete or
    /// absent identity drops the submission with one log entry.
    fn submit_identity(&self) {
        match self.context.identity.identity() {
            Some(identity) if identity.is_complete() => {
                let _ = self.context.delivery.submit(encode::identity(&identity));
            }
            Some(_) => {
                tracing::warn!("user profile incomplete, not submitting identity record");
            }
            None => {
                tracing::warn!("identity not configured, not submitting identity record");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use guardiantrack_protocol::Identity;
    use tempfile::TempDir;
    use tokio::sync::mpsc;

    use crate::capability::{Capability, CapabilitySet};
    use crate::identity::StaticIdentityProvider;
    use crate::sources::location::{FixEvent, SubscribeError};
    use crate::sources::{CallRow, HarvestError, MessageRow};

    use super::*;

    struct FakePresence {
        deny: bool,
        established: AtomicUsize,
        released: Arc<AtomicBool>,
    }

    struct FakeGuard {
        released: Arc<AtomicBool>,
    }

    impl ForegroundGuard for FakeGuard {}

    impl Drop for FakeGuard {
        fn drop(&mut self) {
            self.released.store(true, Ordering::SeqCst);
        }
    }

    impl ForegroundPresence for FakePresence {
        fn establish(&self) -> Result<Box<dyn ForegroundGuard>, PresenceDenied> {
            self.established.fetch_add(1, Ordering::SeqCst);
            if self.deny {
                return Err(PresenceDenied {
                    reason: "host denied ongoing status indicator".to_string(),
                });
            }
            Ok(Box::new(FakeGuard {
                released: Arc::clone(&self.released),
            }))
        }
    }

    struct FakeFixSource {
        subscriptions: AtomicUsize,
    }

    impl FixSource for FakeFixSource {
        fn subscribe(
            &self,
            _request: FixRequest,
        ) -> Result<mpsc::Receiver<FixEvent>, SubscribeError> {
            self.subscriptions.fetch_add(1, Ordering::SeqCst);
            let (_tx, rx) = mpsc::channel(1);
            Ok(rx)
        }
    }

    struct FakeCallLog {
        queries: AtomicUsize,
    }

    impl crate::sources::CallLogSource for FakeCallLog {
        fn query_descending(&self) -> Result<Vec<CallRow>, HarvestError> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    struct FakeMessageLog {
        queries: AtomicUsize,
    }

    impl crate::sources::MessageLogSource for FakeMessageLog {
        fn query_descending(&self) -> Result<Vec<MessageRow>, HarvestError> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    struct Fixture {
        controller: AgentController,
        presence: Arc<FakePresence>,
        fixes: Arc<FakeFixSource>,
        call_log: Arc<FakeCallLog>,
        message_log: Arc<FakeMessageLog>,
        released: Arc<AtomicBool>,
        _dir: TempDir,
    }

    fn fixture(deny_presence: bool) -> Fixture {
        let dir = TempDir::new().unwrap();
        let released = Arc::new(AtomicBool::new(false));
        let presence = Arc::new(FakePresence {
            deny: deny_presence,
            established: AtomicUsize::new(0),
            released: Arc::clone(&released),
        });
        let fixes = Arc::new(FakeFixSource {
            subscriptions: AtomicUsize::new(0),
        });
        let call_log = Arc::new(FakeCallLog {
            queries: AtomicUsize::new(0),
        });
        let message_log = Arc::new(FakeMessageLog {
            queries: AtomicUsize::new(0),
        });

        let context = AgentContext {
            identity: Arc::new(StaticIdentityProvider::new(Some(Identity {
                id: 7,
                name: "A".to_string(),
                phone: "555".to_string(),
                email: "a@x".to_string(),
            }))),
            capabilities: Arc::new(CapabilitySet::new([
                Capability::FineLocation,
                Capability::ReadCallLog,
                Capability::ReadSms,
            ])),
            fixes: Arc::clone(&fixes) as Arc<dyn FixSource>,
            call_log: Arc::clone(&call_log) as Arc<dyn CallLogSource>,
            message_log: Arc::clone(&message_log) as Arc<dyn MessageLogSource>,
            presence: Arc::clone(&presence) as Arc<dyn ForegroundPresence>,
            delivery: DeliveryClient::new("http://127.0.0.1:1/collect"),
            buffer: SampleLog::new(dir.path().join("log.csv")),
            fix_request: FixRequest::default(),
        };

        Fixture {
            controller: AgentController::new(context),
            presence,
            fixes,
            call_log,
            message_log,
            released,
            _dir: dir,
        }
    }

    #[tokio::test]
    async fn presence_denial_stops_without_dispatching_sources() {
        let mut fx = fixture(true);
        fx.controller.handle(Command::StartTracking);

        assert_eq!(fx.controller.state(), AgentState::Stopped);
        assert_eq!(fx.presence.established.load(Ordering::SeqCst), 1);
        assert_eq!(fx.fixes.subscriptions.load(Ordering::SeqCst), 0);
        assert_eq!(fx.call_log.queries.load(Ordering::SeqCst), 0);
        assert_eq!(fx.message_log.queries.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn start_dispatches_all_three_sources_once() {
        let mut fx = fixture(false);
        fx.controller.handle(Command::StartTracking);

        assert_eq!(fx.controller.state(), AgentState::Running);
        assert_eq!(fx.fixes.subscriptions.load(Ordering::SeqCst), 1);
        assert_eq!(fx.call_log.queries.load(Ordering::SeqCst), 1);
        assert_eq!(fx.message_log.queries.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stop_releases_registration_and_presence() {
        let mut fx = fixture(false);
        fx.controller.handle(Command::StartTracking);
        fx.controller.handle(Command::StopTracking);

        assert_eq!(fx.controller.state(), AgentState::Stopped);
        assert!(fx.released.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn restart_re_registers_the_sampler() {
        let mut fx = fixture(false);
        fx.controller.handle(Command::StartTracking);
        fx.controller.handle(Command::StartTracking);

        assert_eq!(fx.controller.state(), AgentState::Running);
        // The presence guard from the first start is still held and reused.
        assert_eq!(fx.presence.established.load(Ordering::SeqCst), 1);
        assert_eq!(fx.fixes.subscriptions.load(Ordering::SeqCst), 2);
        // Harvesters run once per transition into Running.
        assert_eq!(fx.call_log.queries.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn reentry_is_not_denied_by_the_agents_own_presence() {
        // A presence provider that, like an exclusive lock, refuses a second
        // establishment while the first guard is still held.
        struct ExclusivePresence {
            held: Arc<AtomicBool>,
        }

        struct ExclusiveGuard {
            held: Arc<AtomicBool>,
        }

        impl ForegroundGuard for ExclusiveGuard {}

        impl Drop for ExclusiveGuard {
            fn drop(&mut self) {
                self.held.store(false, Ordering::SeqCst);
            }
        }

        impl ForegroundPresence for ExclusivePresence {
            fn establish(&self) -> Result<Box<dyn ForegroundGuard>, PresenceDenied> {
                if self.held.swap(true, Ordering::SeqCst) {
                    return Err(PresenceDenied {
                        reason: "presence already held".to_string(),
                    });
                }
                Ok(Box::new(ExclusiveGuard {
                    held: Arc::clone(&self.held),
                }))
            }
        }

        let mut fx = fixture(false);
        fx.controller.context.presence = Arc::new(ExclusivePresence {
            held: Arc::new(AtomicBool::new(false)),
        });

        fx.controller.handle(Command::StartTracking);
        assert_eq!(fx.controller.state(), AgentState::Running);
        fx.controller.handle(Command::StartTracking);
        assert_eq!(fx.controller.state(), AgentState::Running);

        // Stop still releases the guard, so a fresh start re-establishes.
        fx.controller.handle(Command::StopTracking);
        fx.controller.handle(Command::StartTracking);
        assert_eq!(fx.controller.state(), AgentState::Running);
    }

    #[tokio::test]
    async fn stop_while_stopped_is_a_no_op() {
        let mut fx = fixture(false);
        fx.controller.handle(Command::StopTracking);
        fx.controller.handle(Command::StopTracking);
        assert_eq!(fx.controller.state(), AgentState::Stopped);
    }

    #[test]
    fn unknown_actions_map_to_start() {
        assert_eq!(Command::from_action(None), Command::StartTracking);
        assert_eq!(Command::from_action(Some("start")), Command::StartTracking);
        assert_eq!(
            Command::from_action(Some("restarted")),
            Command::StartTracking
        );
        assert_eq!(Command::from_action(Some("stop")), Command::StopTracking);
        assert_eq!(Command::from_action(Some("STOP")), Command::StopTracking);
    }
}
