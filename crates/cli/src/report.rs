use anyhow::{Context, Result};
use bounded_exec::Invocation;
use serde::Serialize;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;

/// Run parameters recorded alongside the outcome.
#[derive(Debug, Serialize)]
pub struct Params {
    pub timeout_secs: f64,
    pub kill_after_secs: Option<f64>,
    pub command: Vec<String>,
}

/// Build the report document for one invocation.
pub fn document(params: &Params, inv: &Invocation) -> Result<Value> {
    let escalated = inv.timed_out.map(|t| t.escalated);
    Ok(json!({
        "code_rev": current_git_rev(),
        "tool_version": bounded_exec::VERSION,
        "params": serde_json::to_value(params)?,
        "outcome": {
            "verdict": inv.verdict().as_str(),
            "exit_code": inv.verdict().exit_code(),
            "timed_out": inv.is_timed_out(),
            "timeout_message": inv.timeout_message(),
            "escalated": escalated,
            "target_exit_code": inv.exit_code(),
            "stdout_bytes": inv.stdout.len(),
            "stderr_bytes": inv.stderr.len(),
            "elapsed_ms": inv.elapsed.as_millis() as u64
        }
    }))
}

/// Write the JSON report for `inv` to `path`, creating parent directories.
pub fn write_report<P: AsRef<Path>>(path: P, params: &Params, inv: &Invocation) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating report dir {}", parent.display()))?;
        }
    }
    let doc = document(params, inv)?;
    fs::write(path, serde_json::to_vec_pretty(&doc)?)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Commit the binary was built from: `GIT_COMMIT` at build time, else at run time.
pub fn current_git_rev() -> String {
    option_env!("GIT_COMMIT")
        .map(str::to_owned)
        .or_else(|| std::env::var("GIT_COMMIT").ok())
        .filter(|rev| !rev.is_empty())
        .unwrap_or_else(|| "unknown".to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bounded_exec::{run_bounded, RunCfg};
    use std::time::Duration;
    use tempfile::tempdir;

    fn params(timeout_secs: f64) -> Params {
        Params {
            timeout_secs,
            kill_after_secs: None,
            command: vec!["sh".into(), "-c".into(), "printf hello".into()],
        }
    }

    #[test]
    fn completed_run_document() {
        let inv = run_bounded(["sh", "-c", "printf hello"], &RunCfg::default()).unwrap();
        let doc = document(&params(1.0), &inv).unwrap();
        assert_eq!(doc["outcome"]["verdict"], "uninteresting");
        assert_eq!(doc["outcome"]["exit_code"], 1);
        assert_eq!(doc["outcome"]["timed_out"], false);
        assert_eq!(doc["outcome"]["stdout_bytes"], 5);
        assert_eq!(doc["outcome"]["target_exit_code"], 0);
        assert!(doc["outcome"]["timeout_message"].is_null());
        assert_eq!(doc["params"]["command"][2], "printf hello");
    }

    #[test]
    fn code_rev_is_never_empty() {
        let rev = current_git_rev();
        assert!(!rev.is_empty());
        let inv = run_bounded(["true"], &RunCfg::default()).unwrap();
        let doc = document(&params(1.0), &inv).unwrap();
        assert_eq!(doc["code_rev"], rev.as_str());
    }

    #[test]
    fn write_report_creates_nested_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("runs").join("r1.json");
        let cfg = RunCfg::with_timeout(Duration::from_millis(100));
        let inv = run_bounded(["sleep", "10"], &cfg).unwrap();
        write_report(&path, &params(0.1), &inv).unwrap();
        let parsed: Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(parsed["outcome"]["verdict"], "interesting");
        assert_eq!(parsed["outcome"]["exit_code"], 0);
        assert_eq!(parsed["outcome"]["escalated"], false);
        assert_eq!(
            parsed["outcome"]["timeout_message"],
            "Process timed out after 0.1 seconds and was terminated."
        );
    }
}
