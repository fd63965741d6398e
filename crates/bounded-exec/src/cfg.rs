//! Runner configuration.
//!
//! Policy
//! - The timeout is the only knob a harness normally touches. Escalation to
//!   SIGKILL is opt-in: a child that ignores SIGTERM is left alone unless
//!   `kill_after` is set.

use std::time::Duration;

/// Wall-clock budget used when the caller does not pick one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Runner configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunCfg {
    /// Budget before the child is sent SIGTERM. Zero means "terminate at once".
    pub timeout: Duration,
    /// Grace period after SIGTERM before escalating to SIGKILL. `None` disables escalation.
    pub kill_after: Option<Duration>,
}

impl Default for RunCfg {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            kill_after: None,
        }
    }
}

impl RunCfg {
    #[inline]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }
    #[inline]
    pub fn kill_after(mut self, grace: Duration) -> Self {
        self.kill_after = Some(grace);
        self
    }
}

/// Convert fractional seconds to a `Duration`.
///
/// Negative and NaN inputs clamp to zero (immediate timeout); values too large
/// for `Duration` saturate to `Duration::MAX`.
pub fn timeout_from_secs(secs: f64) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}
