//! Invocation result and harness verdict.
//!
//! - `Invocation`: what one bounded run produced; discarded after inspection.
//! - `TimedOut`: present exactly when the runner terminated the child.
//! - `Verdict`: interesting (timed out) vs uninteresting (finished in time).

use std::fmt;
use std::process::{ExitCode, ExitStatus};
use std::time::Duration;

use crate::signal::Signal;

/// Record of a run that overstayed its budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimedOut {
    /// The configured budget that elapsed.
    pub after: Duration,
    /// Last signal actually delivered to the child.
    pub signal: Signal,
    /// True if SIGTERM was not enough and SIGKILL followed.
    pub escalated: bool,
}

impl fmt::Display for TimedOut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Process timed out after {} seconds and was terminated.",
            self.after.as_secs_f64()
        )
    }
}

/// Result of one bounded run.
///
/// When `timed_out` is set, `stdout`/`stderr` are empty and `status` is `None`:
/// nothing is captured from a terminated child.
#[derive(Clone, Debug)]
pub struct Invocation {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub status: Option<ExitStatus>,
    pub timed_out: Option<TimedOut>,
    pub elapsed: Duration,
}

impl Invocation {
    pub(crate) fn completed(
        stdout: Vec<u8>,
        stderr: Vec<u8>,
        status: ExitStatus,
        elapsed: Duration,
    ) -> Self {
        Self {
            stdout,
            stderr,
            status: Some(status),
            timed_out: None,
            elapsed,
        }
    }

    pub(crate) fn timed_out(t: TimedOut, elapsed: Duration) -> Self {
        Self {
            stdout: Vec::new(),
            stderr: Vec::new(),
            status: None,
            timed_out: Some(t),
            elapsed,
        }
    }

    #[inline]
    pub fn is_timed_out(&self) -> bool {
        self.timed_out.is_some()
    }

    /// The timeout sentinel message, if the child was terminated.
    pub fn timeout_message(&self) -> Option<String> {
        self.timed_out.map(|t| t.to_string())
    }

    /// Exit code of a child that finished on its own (None if killed by a signal or timed out).
    pub fn exit_code(&self) -> Option<i32> {
        self.status.and_then(|s| s.code())
    }

    #[inline]
    pub fn verdict(&self) -> Verdict {
        if self.is_timed_out() {
            Verdict::Interesting
        } else {
            Verdict::Uninteresting
        }
    }
}

/// Harness verdict for a delta-debugging driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// The target hung; the failure reproduced.
    Interesting,
    /// The target finished within its budget.
    Uninteresting,
}

impl Verdict {
    #[inline]
    pub fn exit_code(self) -> u8 {
        match self {
            Verdict::Interesting => 0,
            Verdict::Uninteresting => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Interesting => "interesting",
            Verdict::Uninteresting => "uninteresting",
        }
    }
}

impl From<Verdict> for ExitCode {
    fn from(v: Verdict) -> Self {
        ExitCode::from(v.exit_code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_message_matches_budget() {
        let t = TimedOut {
            after: Duration::from_secs(1),
            signal: Signal::Term,
            escalated: false,
        };
        assert_eq!(
            t.to_string(),
            "Process timed out after 1 seconds and was terminated."
        );
        let half = TimedOut {
            after: Duration::from_millis(500),
            ..t
        };
        assert!(half.to_string().contains("after 0.5 seconds"));
    }

    #[test]
    fn timed_out_invocation_is_interesting_and_empty() {
        let inv = Invocation::timed_out(
            TimedOut {
                after: Duration::ZERO,
                signal: Signal::Term,
                escalated: false,
            },
            Duration::from_millis(3),
        );
        assert!(inv.is_timed_out());
        assert!(inv.stdout.is_empty() && inv.stderr.is_empty());
        assert_eq!(inv.exit_code(), None);
        assert_eq!(inv.verdict(), Verdict::Interesting);
        assert_eq!(inv.verdict().exit_code(), 0);
        assert!(inv.timeout_message().is_some());
    }

    #[test]
    fn verdict_codes() {
        assert_eq!(Verdict::Interesting.exit_code(), 0);
        assert_eq!(Verdict::Uninteresting.exit_code(), 1);
        assert_eq!(Verdict::Uninteresting.as_str(), "uninteresting");
    }
}
