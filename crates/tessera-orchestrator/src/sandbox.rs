//! Sandbox strategy negotiation.
//!
//! Picks the isolation strategy for a configuration given what the host can
//! actually provide:
//!
//! - **Sandbox off**: no isolation
//! - **Proxy capable**: proxy sandbox, one isolated scope per instance
//! - **Otherwise**: snapshot sandbox, which can only isolate one app at a
//!   time, so `singular` is forced on
//!
//! The result is written back into the configuration before `start`
//! publishes it.

use tessera_config::{FrameworkConfiguration, IsolationStrategy};
use tracing::{debug, error, warn};

/// Reports whether the host supports per-instance proxy sandboxes.
pub trait CapabilityProbe: Send + Sync {
    /// `true` if a proxy sandbox can be created.
    fn supports_proxy_sandbox(&self) -> bool;
}

impl<F> CapabilityProbe for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn supports_proxy_sandbox(&self) -> bool {
        self()
    }
}

/// A probe with a fixed answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticProbe {
    proxy_sandbox: bool,
}

impl StaticProbe {
    /// A probe answering `proxy_sandbox`.
    #[must_use]
    pub const fn new(proxy_sandbox: bool) -> Self {
        Self { proxy_sandbox }
    }

    /// Proxy sandboxes are available.
    #[must_use]
    pub const fn supported() -> Self {
        Self::new(true)
    }

    /// Proxy sandboxes are not available.
    #[must_use]
    pub const fn unsupported() -> Self {
        Self::new(false)
    }
}

impl CapabilityProbe for StaticProbe {
    fn supports_proxy_sandbox(&self) -> bool {
        self.proxy_sandbox
    }
}

/// Outcome of [`negotiate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Negotiation {
    /// The strategy written into the configuration.
    pub strategy: IsolationStrategy,
    /// `singular` was `false` and had to be forced to `true`.
    pub forced_singular: bool,
}

/// Choose the isolation strategy and adjust `configuration` in place.
///
/// Falling back to the snapshot sandbox logs a warning. Forcing `singular`
/// on logs an error, since it overrides an explicit host choice.
pub fn negotiate(
    configuration: &mut FrameworkConfiguration,
    probe: &dyn CapabilityProbe,
) -> Negotiation {
    if !configuration.sandbox.is_enabled() {
        debug!("sandbox disabled; apps share the host scope");
        configuration.isolation = IsolationStrategy::None;
        return Negotiation {
            strategy: IsolationStrategy::None,
            forced_singular: false,
        };
    }

    if probe.supports_proxy_sandbox() {
        configuration.isolation = IsolationStrategy::Proxy;
        return Negotiation {
            strategy: IsolationStrategy::Proxy,
            forced_singular: false,
        };
    }

    warn!("proxy sandbox unavailable on this host; falling back to snapshot sandbox");
    configuration.isolation = IsolationStrategy::Snapshot;

    let forced_singular = !configuration.singular;
    if forced_singular {
        error!(
            "snapshot sandbox cannot isolate concurrent apps; forcing singular mode on \
             (singular = false was requested)"
        );
        configuration.singular = true;
    }

    Negotiation {
        strategy: IsolationStrategy::Snapshot,
        forced_singular,
    }
}
