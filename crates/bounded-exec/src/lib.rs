//! Bounded process runner for delta-debugging harnesses.
//!
//! A target command is spawned, given a fixed wall-clock budget, and sent
//! SIGTERM if it overstays. The caller gets back an [`Invocation`] and maps
//! it to a [`Verdict`]: a timeout is the "interesting" outcome (the hang
//! reproduced), anything that finishes in time is not.
//!
//! Layout
//! - `cfg`: `RunCfg` and timeout helpers.
//! - `invocation`: the transient result type and its verdict.
//! - `runner`: `run_bounded`, the spawn/wait/terminate loop.
//! - `signal`: signal delivery by pid.

pub mod cfg;
pub mod invocation;
pub mod runner;
pub mod signal;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use cfg::{timeout_from_secs, RunCfg, DEFAULT_TIMEOUT};
pub use invocation::{Invocation, TimedOut, Verdict};
pub use runner::run_bounded;
pub use signal::{terminate, Signal};

/// Common exports for callers that only run and judge a command.
pub mod prelude {
    pub use crate::cfg::RunCfg;
    pub use crate::invocation::{Invocation, Verdict};
    pub use crate::runner::run_bounded;
}
