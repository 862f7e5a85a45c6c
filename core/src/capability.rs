//! Capability checks for the platform's permission system.
//!
//! Every collection source consults its capability before touching its
//! platform source. A denied capability skips that source entirely; there is
//! no retry loop or polling fallback.

use std::collections::HashSet;

/// Data-source capabilities the platform may grant or deny.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    FineLocation,
    CoarseLocation,
    ReadCallLog,
    ReadSms,
}

/// Read-only view of the platform's permission state.
pub trait CapabilityChecker: Send + Sync {
    fn has_capability(&self, capability: Capability) -> bool;
}

/// Fixed set of granted capabilities, typically read from configuration.
#[derive(Debug, Clone, Default)]
pub struct CapabilitySet {
    granted: HashSet<Capability>,
}

impl CapabilitySet {
    pub fn new(granted: impl IntoIterator<Item = Capability>) -> Self {
        Self {
            granted: granted.into_iter().collect(),
        }
    }
}

impl CapabilityChecker for CapabilitySet {
    fn has_capability(&self, capability: Capability) -> bool {
        self.granted.contains(&capability)
    }
}
