//! Metered-network policy applied once the check has finished.

use std::sync::{Arc, RwLock};

use tracing::{info, warn};

use super::traits::ConnectivityProbe;
use super::types::{Connectivity, PendingConsent};

/// Outcome of the network policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Start downloading right away.
    Proceed,
    /// Ask the user first; the pending value says what each answer does.
    RequireConsent(PendingConsent),
}

/// Decides whether downloading needs the user's approval.
#[derive(Clone)]
pub struct NetworkPolicyGate {
    probe: Arc<dyn ConnectivityProbe>,
    consent_on_metered: bool,
}

impl NetworkPolicyGate {
    pub fn new(probe: Arc<dyn ConnectivityProbe>, consent_on_metered: bool) -> Self {
        Self {
            probe,
            consent_on_metered,
        }
    }

    /// Query the probe and apply the policy.
    pub fn evaluate(&self) -> GateDecision {
        let connectivity = self.probe.connectivity();
        match connectivity {
            Connectivity::Metered if self.consent_on_metered => {
                info!("Metered connection detected, asking for download consent");
                GateDecision::RequireConsent(PendingConsent::default())
            }
            Connectivity::Metered => {
                info!("Metered connection detected, consent prompt disabled by configuration");
                GateDecision::Proceed
            }
            Connectivity::Unrestricted => GateDecision::Proceed,
            Connectivity::Offline => {
                warn!("Connectivity reported offline after check, leaving it to the transport");
                GateDecision::Proceed
            }
        }
    }
}

impl std::fmt::Debug for NetworkPolicyGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkPolicyGate")
            .field("consent_on_metered", &self.consent_on_metered)
            .finish_non_exhaustive()
    }
}

/// Connectivity value that can be switched at runtime.
#[derive(Debug)]
pub struct SharedConnectivity {
    current: RwLock<Connectivity>,
}

impl SharedConnectivity {
    pub fn new(initial: Connectivity) -> Self {
        Self {
            current: RwLock::new(initial),
        }
    }

    pub fn set(&self, connectivity: Connectivity) {
        match self.current.write() {
            Ok(mut current) => *current = connectivity,
            Err(poisoned) => *poisoned.into_inner() = connectivity,
        }
    }
}

impl Default for SharedConnectivity {
    fn default() -> Self {
        Self::new(Connectivity::Unrestricted)
    }
}

impl ConnectivityProbe for SharedConnectivity {
    fn connectivity(&self) -> Connectivity {
        match self.current.read() {
            Ok(current) => *current,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}
