//! Identity lookup for the device owner.
//!
//! The identity is captured by the settings form outside this crate and is
//! immutable once read for a session. Every source resolves it before
//! constructing a record; absence drops the submission, it is never queued.

use guardiantrack_protocol::Identity;

/// Read-only access to the locally configured identity.
pub trait IdentityProvider: Send + Sync {
    /// The configured identity, or `None` when the settings form has not
    /// been completed.
    fn identity(&self) -> Option<Identity>;
}

/// Process-lifetime identity resolved once from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityProvider {
    identity: Option<Identity>,
}

impl StaticIdentityProvider {
    pub fn new(identity: Option<Identity>) -> Self {
        Self { identity }
    }
}

impl IdentityProvider for StaticIdentityProvider {
    fn identity(&self) -> Option<Identity> {
        self.identity.clone()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn absent_identity_stays_absent() {
        assert!(StaticIdentityProvider::default().identity().is_none());
    }

    #[test]
    fn configured_identity_is_returned() {
        let provider = StaticIdentityProvider::new(Some(Identity {
            id: 7,
            name: "A".to_string(),
            phone: "555".to_string(),
            email: "a@x".to_string(),
        }));
        let identity = provider.identity().expect("identity configured");
        assert_eq!(identity.id, 7);
    }
}
