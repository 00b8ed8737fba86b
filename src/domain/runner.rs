//! External process execution with hard timeouts.
//!
//! Two entry points:
//! - [`CommandRunner::run`] for fully hardcoded shell pipelines
//! - [`CommandRunner::run_with_args`] for anything carrying configured data;
//!   arguments go straight to `execve`, no shell is involved
//!
//! Both return trimmed stdout on success and `None` on any failure
//! (spawn error, non-zero exit, timeout). A timed-out child is killed.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a trusted command line through `sh -c`.
    async fn run(&self, command_line: &str, timeout: Duration) -> Option<String>;

    /// Run `program` with `args` passed verbatim.
    async fn run_with_args(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> Option<String>;
}

/// Runner backed by real child processes.
#[derive(Debug, Default, Clone)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, command_line: &str, timeout: Duration) -> Option<String> {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command_line);
        execute(cmd, command_line, timeout).await
    }

    async fn run_with_args(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> Option<String> {
        let mut cmd = Command::new(program);
        cmd.args(args);
        execute(cmd, program, timeout).await
    }
}

async fn execute(mut cmd: Command, label: &str, timeout: Duration) -> Option<String> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true);

    let child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            debug!(command = %label, error = %e, "failed to spawn");
            return None;
        }
    };

    // Dropping the wait future on timeout drops the child, which kills it.
    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            debug!(command = %label, error = %e, "failed to collect output");
            return None;
        }
        Err(_) => {
            debug!(
                command = %label,
                timeout_ms = timeout.as_millis() as u64,
                "command timed out, killed"
            );
            return None;
        }
    };

    if !output.status.success() {
        debug!(command = %label, status = %output.status, "command exited non-zero");
        return None;
    }

    Some(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
}
