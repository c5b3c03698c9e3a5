//! Readiness probe for remote services that sleep when idle.
//!
//! Two states: unreachable and ready. A failed first probe triggers one wake
//! request, then a fixed number of delayed re-probes.

use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use crate::constants::{WAKE_ATTEMPTS, WAKE_INTERVAL};

/// A remote endpoint that can be probed and nudged awake.
#[allow(async_fn_in_trait)]
pub trait RemoteService {
    /// Returns `true` when the service answers successfully.
    async fn probe(&self) -> bool;

    /// Fire-and-forget request that makes a dormant service start up.
    async fn wake(&self);
}

/// Observed state of the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Readiness {
    Unreachable,
    Ready,
}

/// Retry budget applied after the wake request.
#[derive(Debug, Clone, Copy)]
pub struct WakePolicy {
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for WakePolicy {
    fn default() -> Self {
        Self {
            attempts: WAKE_ATTEMPTS,
            interval: WAKE_INTERVAL,
        }
    }
}

impl WakePolicy {
    /// Total time spent waiting when every attempt fails.
    pub fn budget(&self) -> Duration {
        self.interval * self.attempts
    }
}

/// Result of a readiness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProbeOutcome {
    pub readiness: Readiness,
    /// Probes issued, including the initial one.
    pub probes: u32,
    /// Whether a wake request was sent.
    pub woke: bool,
}

impl ProbeOutcome {
    pub fn is_ready(&self) -> bool {
        self.readiness == Readiness::Ready
    }
}

/// Probe `service`, waking and polling it per `policy` if needed.
///
/// `on_wait` is called after every failed retry with the 1-based attempt number.
pub async fn wait_until_ready<S: RemoteService>(
    service: &S,
    policy: &WakePolicy,
    mut on_wait: impl FnMut(u32),
) -> ProbeOutcome {
    if service.probe().await {
        return ProbeOutcome {
            readiness: Readiness::Ready,
            probes: 1,
            woke: false,
        };
    }

    debug!("First probe failed, sending wake request");
    service.wake().await;

    let mut probes = 1;
    for attempt in 1..=policy.attempts {
        tokio::time::sleep(policy.interval).await;
        probes += 1;
        if service.probe().await {
            return ProbeOutcome {
                readiness: Readiness::Ready,
                probes,
                woke: true,
            };
        }
        on_wait(attempt);
    }

    ProbeOutcome {
        readiness: Readiness::Unreachable,
        probes,
        woke: true,
    }
}
