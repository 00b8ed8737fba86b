//! In-memory stand-ins for the process runner and gateway client.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::gateway::{CronEnvelope, GatewayApi, GatewayError, RawCronJob, RawSession, SessionEnvelope};
use super::runner::CommandRunner;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Via {
    Shell,
    Args,
}

/// Answers commands whose rendered line contains a registered pattern.
/// Shell responses only answer `run`, argv responses only `run_with_args`;
/// anything unmatched fails like a non-zero exit.
#[derive(Default)]
pub struct FakeRunner {
    responses: Mutex<Vec<(Via, String, String)>>,
    calls: Mutex<Vec<String>>,
}

impl FakeRunner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond_shell(self: Arc<Self>, pattern: &str, output: &str) -> Arc<Self> {
        self.respond(Via::Shell, pattern, output)
    }

    pub fn respond_args(self: Arc<Self>, pattern: &str, output: &str) -> Arc<Self> {
        self.respond(Via::Args, pattern, output)
    }

    fn respond(self: Arc<Self>, via: Via, pattern: &str, output: &str) -> Arc<Self> {
        self.responses
            .lock()
            .unwrap()
            .push((via, pattern.to_string(), output.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn answer(&self, via: Via, line: String) -> Option<String> {
        let out = self
            .responses
            .lock()
            .unwrap()
            .iter()
            .find(|(kind, pattern, _)| *kind == via && line.contains(pattern.as_str()))
            .map(|(_, _, out)| out.clone());
        self.calls.lock().unwrap().push(line);
        out
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, command_line: &str, _timeout: Duration) -> Option<String> {
        self.answer(Via::Shell, command_line.to_string())
    }

    async fn run_with_args(
        &self,
        program: &str,
        args: &[String],
        _timeout: Duration,
    ) -> Option<String> {
        self.answer(Via::Args, format!("{} {}", program, args.join(" ")))
    }
}

pub struct FakeGateway {
    sessions: Option<Value>,
    crons: Option<Value>,
    session_calls: AtomicUsize,
    cron_calls: AtomicUsize,
}

impl FakeGateway {
    fn build(sessions: Option<Value>, crons: Option<Value>) -> Arc<Self> {
        Arc::new(Self {
            sessions,
            crons,
            session_calls: AtomicUsize::new(0),
            cron_calls: AtomicUsize::new(0),
        })
    }

    pub fn empty() -> Arc<Self> {
        Self::build(Some(json!({ "sessions": [] })), Some(json!({ "jobs": [] })))
    }

    pub fn failing() -> Arc<Self> {
        Self::build(None, None)
    }

    pub fn with_sessions(sessions: Value) -> Arc<Self> {
        Self::build(Some(sessions), Some(json!({ "jobs": [] })))
    }

    pub fn with_crons(crons: Value) -> Arc<Self> {
        Self::build(Some(json!({ "sessions": [] })), Some(crons))
    }

    pub fn session_calls(&self) -> usize {
        self.session_calls.load(Ordering::SeqCst)
    }

    pub fn cron_calls(&self) -> usize {
        self.cron_calls.load(Ordering::SeqCst)
    }
}

fn unreachable_gateway() -> GatewayError {
    GatewayError::InvalidUrl("fake://unreachable".to_string())
}

#[async_trait]
impl GatewayApi for FakeGateway {
    async fn sessions(&self) -> Result<Vec<RawSession>, GatewayError> {
        self.session_calls.fetch_add(1, Ordering::SeqCst);
        let value = self.sessions.clone().ok_or_else(unreachable_gateway)?;
        let envelope: SessionEnvelope =
            serde_json::from_value(value).map_err(|_| unreachable_gateway())?;
        Ok(envelope.into_items())
    }

    async fn cron_jobs(&self) -> Result<Vec<RawCronJob>, GatewayError> {
        self.cron_calls.fetch_add(1, Ordering::SeqCst);
        let value = self.crons.clone().ok_or_else(unreachable_gateway)?;
        let envelope: CronEnvelope =
            serde_json::from_value(value).map_err(|_| unreachable_gateway())?;
        Ok(envelope.into_items())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn runner_responses_are_bound_to_their_entry_point() {
        let runner = FakeRunner::new()
            .respond_shell("uptime", "up 1 hour")
            .respond_args("ping", "1 received");
        let timeout = Duration::from_secs(1);

        assert_eq!(runner.run("uptime -p", timeout).await.as_deref(), Some("up 1 hour"));
        assert_eq!(runner.run_with_args("uptime", &[], timeout).await, None);

        let args = vec!["-c".to_string(), "1".to_string()];
        assert_eq!(
            runner.run_with_args("ping", &args, timeout).await.as_deref(),
            Some("1 received")
        );
        assert_eq!(runner.run("ping -c 1", timeout).await, None);
        assert_eq!(runner.calls().len(), 4);
    }
}
