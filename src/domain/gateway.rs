//! Typed client for the OpenClaw gateway REST API, plus the normalisation
//! of its loosely shaped session/cron records into dashboard rows.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use super::types::{CronJob, SessionInfo};
use super::validate::is_valid_url;

pub const SESSIONS_PATH: &str = "/api/sessions";
pub const CRON_JOBS_PATH: &str = "/api/cron/jobs";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway url is not a valid http(s) url: {0}")]
    InvalidUrl(String),

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("malformed response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("building HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

#[async_trait]
pub trait GatewayApi: Send + Sync {
    async fn sessions(&self) -> Result<Vec<RawSession>, GatewayError>;
    async fn cron_jobs(&self) -> Result<Vec<RawCronJob>, GatewayError>;
}

pub struct HttpGateway {
    base_url: String,
    token: Option<String>,
    http: Client,
}

impl HttpGateway {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, GatewayError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(GatewayError::Client)?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
            http,
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        let url = format!("{}{}", self.base_url, path);
        if !is_valid_url(&url) {
            return Err(GatewayError::InvalidUrl(url));
        }

        let mut req = self.http.get(&url);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await.map_err(|source| GatewayError::Transport {
            url: url.clone(),
            source,
        })?;

        if !resp.status().is_success() {
            return Err(GatewayError::Status {
                url,
                status: resp.status(),
            });
        }

        resp.json()
            .await
            .map_err(|source| GatewayError::Decode { url, source })
    }
}

#[async_trait]
impl GatewayApi for HttpGateway {
    async fn sessions(&self) -> Result<Vec<RawSession>, GatewayError> {
        let envelope: SessionEnvelope = self.get(SESSIONS_PATH).await?;
        Ok(envelope.into_items())
    }

    async fn cron_jobs(&self) -> Result<Vec<RawCronJob>, GatewayError> {
        let envelope: CronEnvelope = self.get(CRON_JOBS_PATH).await?;
        Ok(envelope.into_items())
    }
}

// ── Wire shapes ───────────────────────────────────────────
//
// Records are decoded one at a time and every field is lenient, so a
// mistyped value drops that field only and a malformed record becomes an
// empty one. The rest of the list is unaffected.

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SessionEnvelope {
    Bare(Vec<Value>),
    Wrapped {
        #[serde(default)]
        sessions: Vec<Value>,
    },
}

impl SessionEnvelope {
    pub fn into_items(self) -> Vec<RawSession> {
        match self {
            Self::Bare(items) | Self::Wrapped { sessions: items } => decode_each(items),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CronEnvelope {
    Bare(Vec<Value>),
    Wrapped {
        #[serde(default)]
        jobs: Vec<Value>,
    },
}

impl CronEnvelope {
    pub fn into_items(self) -> Vec<RawCronJob> {
        match self {
            Self::Bare(items) | Self::Wrapped { jobs: items } => decode_each(items),
        }
    }
}

fn decode_each<T: DeserializeOwned + Default>(items: Vec<Value>) -> Vec<T> {
    items
        .into_iter()
        .map(|item| serde_json::from_value(item).unwrap_or_default())
        .collect()
}

/// Strings pass through and numbers are rendered; anything else is absent.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Booleans, or numbers where zero is false.
fn lenient_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => Some(b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        _ => None,
    })
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(serde_json::from_value(Value::deserialize(deserializer)?).ok())
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawSession {
    #[serde(deserialize_with = "lenient_text")]
    pub key: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub label: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub display_name: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub channel: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub last_channel: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub origin: Option<RawOrigin>,
    pub total_tokens: Option<Value>,
    pub tokens: Option<Value>,
    #[serde(deserialize_with = "lenient")]
    pub usage: Option<RawUsage>,
    pub updated_at: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawOrigin {
    #[serde(deserialize_with = "lenient_text")]
    pub label: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub channel: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawUsage {
    pub total_tokens: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawCronJob {
    #[serde(deserialize_with = "lenient_text")]
    pub id: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub label: Option<String>,
    pub schedule: Option<Value>,
    #[serde(deserialize_with = "lenient_flag")]
    pub enabled: Option<bool>,
    #[serde(deserialize_with = "lenient")]
    pub state: Option<RawCronState>,
    pub last_run: Option<Value>,
    #[serde(deserialize_with = "lenient_text")]
    pub last_status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawCronState {
    pub last_run_at_ms: Option<Value>,
    #[serde(deserialize_with = "lenient_text")]
    pub last_status: Option<String>,
}

// ── Normalisation ─────────────────────────────────────────

pub fn normalize_session(raw: RawSession) -> SessionInfo {
    let origin = raw.origin.unwrap_or_default();
    let name = non_empty(raw.label)
        .or_else(|| non_empty(raw.display_name))
        .or_else(|| non_empty(origin.label))
        .or_else(|| non_empty(raw.key))
        .unwrap_or_else(|| "unknown".to_string());
    let channel = non_empty(raw.channel)
        .or_else(|| non_empty(raw.last_channel))
        .or_else(|| non_empty(origin.channel))
        .unwrap_or_else(|| "--".to_string());
    let tokens = raw
        .total_tokens
        .as_ref()
        .and_then(as_count)
        .or_else(|| raw.usage.and_then(|u| u.total_tokens).as_ref().and_then(as_count))
        .or_else(|| raw.tokens.as_ref().and_then(as_count))
        .unwrap_or(0);

    SessionInfo {
        name,
        channel,
        tokens,
        updated: raw.updated_at.as_ref().and_then(as_timestamp),
    }
}

pub fn normalize_cron_job(raw: RawCronJob) -> CronJob {
    let state = raw.state.unwrap_or_default();
    let name = non_empty(raw.name)
        .or_else(|| non_empty(raw.label))
        .or_else(|| non_empty(raw.id))
        .unwrap_or_else(|| "unnamed".to_string());

    CronJob {
        name,
        schedule: raw
            .schedule
            .as_ref()
            .and_then(describe_schedule)
            .unwrap_or_else(|| "--".to_string()),
        enabled: raw.enabled.unwrap_or(true),
        last_run: state
            .last_run_at_ms
            .as_ref()
            .and_then(as_timestamp)
            .or_else(|| raw.last_run.as_ref().and_then(as_timestamp)),
        last_status: non_empty(state.last_status).or_else(|| non_empty(raw.last_status)),
    }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.trim().is_empty())
}

/// Non-negative integer from a JSON number or numeric string.
fn as_count(v: &Value) -> Option<u64> {
    match v {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Epoch milliseconds become RFC 3339; strings pass through.
fn as_timestamp(v: &Value) -> Option<String> {
    match v {
        Value::Number(n) => n
            .as_i64()
            .and_then(chrono::DateTime::from_timestamp_millis)
            .map(|dt| dt.to_rfc3339()),
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn describe_schedule(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(obj) => {
            if let Some(expr) = obj.get("expr").and_then(Value::as_str) {
                return Some(expr.to_string());
            }
            obj.get("everyMs")
                .and_then(Value::as_u64)
                .map(|ms| format!("every {}s", ms / 1000))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn session(v: Value) -> SessionInfo {
        normalize_session(serde_json::from_value(v).unwrap())
    }

    fn cron(v: Value) -> CronJob {
        normalize_cron_job(serde_json::from_value(v).unwrap())
    }

    #[test]
    fn session_fallback_chain() {
        let s = session(json!({
            "key": "agent:main:telegram:123",
            "origin": { "channel": "telegram" },
            "usage": { "totalTokens": 1520 },
            "updatedAt": 0
        }));
        assert_eq!(s.name, "agent:main:telegram:123");
        assert_eq!(s.channel, "telegram");
        assert_eq!(s.tokens, 1520);
        assert_eq!(s.updated.as_deref(), Some("1970-01-01T00:00:00+00:00"));

        let s = session(json!({
            "key": "k",
            "label": "Main",
            "displayName": "ignored",
            "channel": "discord",
            "totalTokens": 10,
            "tokens": 99
        }));
        assert_eq!(s.name, "Main");
        assert_eq!(s.channel, "discord");
        assert_eq!(s.tokens, 10);
        assert_eq!(s.updated, None);
    }

    #[test]
    fn empty_session_gets_defaults() {
        let s = session(json!({}));
        assert_eq!(
            s,
            SessionInfo {
                name: "unknown".into(),
                channel: "--".into(),
                tokens: 0,
                updated: None,
            }
        );
    }

    #[test]
    fn blank_strings_fall_through() {
        let s = session(json!({ "label": " ", "displayName": "Ops", "tokens": "42" }));
        assert_eq!(s.name, "Ops");
        assert_eq!(s.tokens, 42);
    }

    #[test]
    fn cron_schedule_shapes() {
        assert_eq!(cron(json!({ "schedule": "0 * * * *" })).schedule, "0 * * * *");
        assert_eq!(
            cron(json!({ "schedule": { "kind": "cron", "expr": "*/5 * * * *" } })).schedule,
            "*/5 * * * *"
        );
        assert_eq!(
            cron(json!({ "schedule": { "kind": "every", "everyMs": 90000 } })).schedule,
            "every 90s"
        );
        assert_eq!(cron(json!({})).schedule, "--");
    }

    #[test]
    fn cron_state_and_defaults() {
        let job = cron(json!({
            "id": "job-1",
            "enabled": false,
            "state": { "lastRunAtMs": 1000, "lastStatus": "ok" }
        }));
        assert_eq!(job.name, "job-1");
        assert!(!job.enabled);
        assert_eq!(job.last_run.as_deref(), Some("1970-01-01T00:00:01+00:00"));
        assert_eq!(job.last_status.as_deref(), Some("ok"));

        let job = cron(json!({ "label": "Backup", "lastRun": "yesterday", "lastStatus": "error" }));
        assert_eq!(job.name, "Backup");
        assert!(job.enabled);
        assert_eq!(job.last_run.as_deref(), Some("yesterday"));
        assert_eq!(job.last_status.as_deref(), Some("error"));

        assert_eq!(cron(json!({})).name, "unnamed");
    }

    #[test]
    fn envelopes_accept_wrapped_and_bare() {
        let wrapped: SessionEnvelope =
            serde_json::from_value(json!({ "sessions": [{ "key": "a" }], "count": 1 })).unwrap();
        assert_eq!(wrapped.into_items().len(), 1);

        let bare: CronEnvelope = serde_json::from_value(json!([{ "id": "x" }, {}])).unwrap();
        assert_eq!(bare.into_items().len(), 2);

        let missing: CronEnvelope = serde_json::from_value(json!({ "ok": true })).unwrap();
        assert!(missing.into_items().is_empty());
    }

    #[test]
    fn mistyped_record_does_not_sink_the_list() {
        let sessions: SessionEnvelope = serde_json::from_value(json!({
            "sessions": [
                { "key": "good", "totalTokens": 5 },
                { "key": 123, "origin": "cli", "usage": [1, 2] },
                "not a record"
            ]
        }))
        .unwrap();
        let rows: Vec<SessionInfo> =
            sessions.into_items().into_iter().map(normalize_session).collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].name, "good");
        assert_eq!(rows[0].tokens, 5);
        assert_eq!(rows[1].name, "123");
        assert_eq!(rows[1].channel, "--");
        assert_eq!(rows[2].name, "unknown");

        let jobs: CronEnvelope = serde_json::from_value(json!([
            { "name": "Backup", "schedule": "0 3 * * *", "enabled": false },
            { "id": 7, "enabled": 1, "state": { "lastStatus": false } }
        ]))
        .unwrap();
        let rows: Vec<CronJob> = jobs.into_items().into_iter().map(normalize_cron_job).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "Backup");
        assert!(!rows[0].enabled);
        assert_eq!(rows[1].name, "7");
        assert!(rows[1].enabled);
        assert_eq!(rows[1].last_status, None);
    }

    #[tokio::test]
    async fn invalid_base_url_is_rejected_before_any_request() {
        let gw = HttpGateway::new("javascript:alert(1)", None).unwrap();
        assert!(matches!(
            gw.sessions().await,
            Err(GatewayError::InvalidUrl(_))
        ));
    }
}
