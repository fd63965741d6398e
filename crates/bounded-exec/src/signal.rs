//! Signal delivery by pid.
//!
//! `Child::kill` only sends SIGKILL and needs the `Child` handle, which the
//! runner hands to its waiter thread. Delivery here goes through `libc::kill`
//! on the raw pid instead.

use anyhow::Result;

/// Signals the runner sends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Signal {
    /// SIGTERM.
    Term,
    /// SIGKILL.
    Kill,
}

impl Signal {
    pub fn name(self) -> &'static str {
        match self {
            Signal::Term => "SIGTERM",
            Signal::Kill => "SIGKILL",
        }
    }

    #[cfg(unix)]
    fn as_raw(self) -> libc::c_int {
        match self {
            Signal::Term => libc::SIGTERM,
            Signal::Kill => libc::SIGKILL,
        }
    }
}

/// Send `signal` to process `pid`.
///
/// Returns `Ok(false)` if no such process exists (it already exited and was
/// reaped), `Ok(true)` if the signal was delivered.
#[cfg(unix)]
pub fn terminate(pid: u32, signal: Signal) -> Result<bool> {
    use anyhow::Context;

    let raw_pid = libc::pid_t::try_from(pid).with_context(|| format!("pid {pid} out of range"))?;
    // SAFETY: kill(2) takes plain integers and has no memory-safety preconditions.
    let rc = unsafe { libc::kill(raw_pid, signal.as_raw()) };
    if rc == 0 {
        tracing::debug!(pid, signal = signal.name(), "signal delivered");
        return Ok(true);
    }
    let err = std::io::Error::last_os_error();
    if err.raw_os_error() == Some(libc::ESRCH) {
        tracing::debug!(pid, signal = signal.name(), "no such process");
        return Ok(false);
    }
    Err(err).with_context(|| format!("sending {} to pid {pid}", signal.name()))
}

#[cfg(not(unix))]
pub fn terminate(pid: u32, signal: Signal) -> Result<bool> {
    anyhow::bail!(
        "sending {} to pid {pid} is only supported on Unix",
        signal.name()
    )
}
