use anyhow::Result;
use bounded_exec::{run_bounded, timeout_from_secs, RunCfg};
use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::fmt::SubscriberBuilder;

mod report;

#[derive(Parser)]
#[command(name = "dd-timeout")]
#[command(about = "Run a target with one input; exit 0 if it hangs past the timeout, 1 otherwise")]
struct Cmd {
    /// Timeout in seconds (fractional allowed; negative means zero)
    #[arg(short, long, default_value_t = 1.0, allow_negative_numbers = true)]
    timeout: f64,

    /// Send SIGKILL if the target is still alive this many seconds after SIGTERM
    #[arg(long)]
    kill_after: Option<f64>,

    /// Write a JSON report of the invocation to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Raise log verbosity (-v info, -vv debug); logs go to stderr
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Input forwarded as the last argument of the target
    input: OsString,

    /// Target program and its leading arguments
    #[arg(last = true, required = true)]
    command: Vec<OsString>,
}

fn main() -> Result<ExitCode> {
    let cmd = Cmd::parse();
    let level = match cmd.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    SubscriberBuilder::default()
        .with_target(false)
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let mut cfg = RunCfg::with_timeout(timeout_from_secs(cmd.timeout));
    if let Some(grace) = cmd.kill_after {
        cfg = cfg.kill_after(timeout_from_secs(grace));
    }

    let mut command = cmd.command;
    command.push(cmd.input);
    tracing::info!(
        timeout_secs = cfg.timeout.as_secs_f64(),
        command = ?command,
        "run"
    );

    let inv = run_bounded(&command, &cfg)?;
    let verdict = inv.verdict();
    match inv.timed_out {
        Some(t) => tracing::info!(escalated = t.escalated, "{t}"),
        None => tracing::info!(code = ?inv.exit_code(), elapsed_ms = inv.elapsed.as_millis() as u64, "completed in time"),
    }

    if let Some(path) = cmd.report {
        let params = report::Params {
            timeout_secs: cfg.timeout.as_secs_f64(),
            kill_after_secs: cfg.kill_after.map(|d| d.as_secs_f64()),
            command: command
                .iter()
                .map(|s| s.to_string_lossy().into_owned())
                .collect(),
        };
        report::write_report(&path, &params, &inv)?;
    }

    tracing::info!(verdict = verdict.as_str(), "done");
    Ok(verdict.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_input_and_trailing_command() {
        let cmd = Cmd::try_parse_from(["dd-timeout", "-t", "2.5", "case.txt", "--", "perl", "mysort.pl"])
            .unwrap();
        assert_eq!(cmd.timeout, 2.5);
        assert_eq!(cmd.input, OsString::from("case.txt"));
        assert_eq!(cmd.command, vec![OsString::from("perl"), OsString::from("mysort.pl")]);
        assert!(cmd.kill_after.is_none());
        assert_eq!(cmd.verbose, 0);
    }

    #[test]
    fn default_timeout_is_one_second() {
        let cmd = Cmd::try_parse_from(["dd-timeout", "x", "--", "true"]).unwrap();
        assert_eq!(cmd.timeout, 1.0);
    }

    #[test]
    fn negative_timeout_is_accepted() {
        let cmd = Cmd::try_parse_from(["dd-timeout", "--timeout", "-1", "x", "--", "true"]).unwrap();
        assert_eq!(timeout_from_secs(cmd.timeout), std::time::Duration::ZERO);
    }

    #[test]
    fn command_is_required() {
        assert!(Cmd::try_parse_from(["dd-timeout", "x"]).is_err());
        assert!(Cmd::try_parse_from(["dd-timeout", "x", "--"]).is_err());
    }
}
