// src/analysis/script.rs

use anyhow::{anyhow, bail, Result};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{info, warn};

/// Runs the configured analysis command and returns its stdout.
/// Spawn failures, non-zero exits and timeouts all come back as `exec error: ...`.
pub async fn run_script(command: &[String], limit: Duration) -> Result<String> {
    let Some((program, args)) = command.split_first() else {
        bail!("exec error: no analysis command configured");
    };
    let cmdline = command.join(" ");
    info!(command = %cmdline, "Running analysis script");

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| anyhow!("exec error: failed to start `{}`: {}", cmdline, e))?;

    let output = match timeout(limit, child.wait_with_output()).await {
        Ok(output) => output.map_err(|e| anyhow!("exec error: `{}`: {}", cmdline, e))?,
        Err(_) => {
            warn!(command = %cmdline, "Analysis script timed out");
            bail!("exec error: `{}` timed out after {} seconds", cmdline, limit.as_secs());
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("exec error: Command failed: {} ({})\n{}", cmdline, output.status, stderr.trim());
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
