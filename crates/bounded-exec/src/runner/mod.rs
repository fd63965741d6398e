//! Spawn a command, wait for it with a deadline, terminate it on overrun.
//!
//! Model
//! - stdout and stderr are taken off the child and drained by one reader
//!   thread each, so a child that fills a pipe buffer cannot stall the run.
//! - A waiter thread calls `Child::wait` and sends the exit status over a
//!   channel the moment the child exits. The caller blocks in
//!   `recv_timeout`; there is no polling loop.
//! - Completion is decided by the exit status, not by pipe EOF: a child
//!   that exits in time while a background grandchild still holds its pipes
//!   counts as completed. Its output is then collected by joining the
//!   readers, which returns once every holder has closed the pipes.
//! - On overrun the child gets SIGTERM by pid. With `RunCfg::kill_after`
//!   set, SIGKILL follows if it is still alive after the grace period.
//! - Output of a terminated child is discarded.
//!
//! Boundary race
//! - A child that exits right at the deadline may be reported either way.
//!   If its status is already in the channel, or it has been reaped by the
//!   waiter before SIGTERM is sent (ESRCH), the run counts as completed.

use std::ffi::OsStr;
use std::io::{self, Read};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context, Result};

use crate::cfg::RunCfg;
use crate::invocation::{Invocation, TimedOut};
use crate::signal::{terminate, Signal};

type WaitResult = io::Result<ExitStatus>;
type Reader = JoinHandle<io::Result<Vec<u8>>>;

/// Run `command` (program followed by its arguments) under `cfg`.
///
/// Pre: `command` is non-empty.
/// Post: `Ok(inv)` with `inv.timed_out.is_some()` iff the child was still
/// running after `cfg.timeout` and was sent SIGTERM.
///
/// Spawn and signal failures are returned as errors, never as timeouts.
pub fn run_bounded<I, S>(command: I, cfg: &RunCfg) -> Result<Invocation>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut parts = command.into_iter();
    let Some(program) = parts.next() else {
        bail!("empty command: expected a program to run");
    };
    let program = program.as_ref().to_os_string();
    let prog = program.to_string_lossy().into_owned();

    let mut child = Command::new(&program)
        .args(parts)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("spawning {prog}"))?;
    let start = Instant::now();
    let pid = child.id();
    tracing::debug!(pid, program = %prog, timeout_secs = cfg.timeout.as_secs_f64(), "spawned");

    let stdout = child.stdout.take().context("child stdout was not piped")?;
    let stderr = child.stderr.take().context("child stderr was not piped")?;
    let readers = (drain(stdout, "stdout", pid)?, drain(stderr, "stderr", pid)?);

    let (tx, rx) = mpsc::channel::<WaitResult>();
    thread::Builder::new()
        .name(format!("bounded-exec-wait-{pid}"))
        .spawn(move || {
            // receiver is gone once the run has been judged; nothing to report then
            let _ = tx.send(child.wait());
        })
        .context("spawning waiter thread")?;

    match rx.recv_timeout(cfg.timeout) {
        Ok(res) => completed(pid, res, readers, start),
        Err(RecvTimeoutError::Disconnected) => {
            bail!("waiter for pid {pid} exited without a result")
        }
        Err(RecvTimeoutError::Timeout) => overrun(pid, &rx, readers, cfg, start),
    }
}

fn drain<R>(mut pipe: R, stream: &str, pid: u32) -> Result<Reader>
where
    R: Read + Send + 'static,
{
    thread::Builder::new()
        .name(format!("bounded-exec-{stream}-{pid}"))
        .spawn(move || {
            let mut buf = Vec::new();
            pipe.read_to_end(&mut buf)?;
            Ok(buf)
        })
        .with_context(|| format!("spawning {stream} reader"))
}

fn collect(reader: Reader, stream: &str, pid: u32) -> Result<Vec<u8>> {
    reader
        .join()
        .map_err(|_| anyhow!("{stream} reader for pid {pid} panicked"))?
        .with_context(|| format!("reading {stream} of pid {pid}"))
}

fn completed(
    pid: u32,
    res: WaitResult,
    (stdout, stderr): (Reader, Reader),
    start: Instant,
) -> Result<Invocation> {
    let status = res.with_context(|| format!("waiting for pid {pid}"))?;
    let elapsed = start.elapsed();
    let stdout = collect(stdout, "stdout", pid)?;
    let stderr = collect(stderr, "stderr", pid)?;
    tracing::debug!(
        pid,
        code = ?status.code(),
        stdout_bytes = stdout.len(),
        stderr_bytes = stderr.len(),
        elapsed_ms = elapsed.as_millis() as u64,
        "completed"
    );
    Ok(Invocation::completed(stdout, stderr, status, elapsed))
}

fn overrun(
    pid: u32,
    rx: &Receiver<WaitResult>,
    readers: (Reader, Reader),
    cfg: &RunCfg,
    start: Instant,
) -> Result<Invocation> {
    if let Ok(res) = rx.try_recv() {
        return completed(pid, res, readers, start);
    }
    if !terminate(pid, Signal::Term)? {
        // reaped by the waiter between the deadline and the signal
        let res = rx
            .recv()
            .with_context(|| format!("waiter for pid {pid} exited without a result"))?;
        return completed(pid, res, readers, start);
    }
    tracing::info!(pid, timeout_secs = cfg.timeout.as_secs_f64(), "timed out; sent SIGTERM");

    let escalated = match cfg.kill_after {
        Some(grace) => escalate(pid, rx, grace)?,
        None => false,
    };
    Ok(Invocation::timed_out(
        TimedOut {
            after: cfg.timeout,
            signal: if escalated { Signal::Kill } else { Signal::Term },
            escalated,
        },
        start.elapsed(),
    ))
}

/// Wait up to `grace` for the terminated child; SIGKILL it if still there.
fn escalate(pid: u32, rx: &Receiver<WaitResult>, grace: Duration) -> Result<bool> {
    match rx.recv_timeout(grace) {
        Ok(_) | Err(RecvTimeoutError::Disconnected) => Ok(false),
        Err(RecvTimeoutError::Timeout) => {
            let delivered = terminate(pid, Signal::Kill)?;
            if delivered {
                tracing::warn!(pid, grace_ms = grace.as_millis() as u64, "ignored SIGTERM; sent SIGKILL");
            }
            Ok(delivered)
        }
    }
}
