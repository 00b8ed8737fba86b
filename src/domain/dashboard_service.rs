use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::{Config, HostTarget, ServiceTarget};

use super::cache::TtlCache;
use super::gateway::{normalize_cron_job, normalize_session, GatewayApi};
use super::runner::CommandRunner;
use super::types::*;
use super::validate::{is_valid_hostname, is_valid_url};

const SYSTEM_KEY: &str = "system";
const SESSIONS_KEY: &str = "sessions";
const SERVICES_KEY: &str = "services";
const NETWORK_KEY: &str = "network";
const CRONS_KEY: &str = "crons";

const SYSTEM_PROBE_TIMEOUT: Duration = Duration::from_millis(5000);
const SERVICE_PROBE_TIMEOUT: Duration = Duration::from_millis(5000);
const HOST_PROBE_TIMEOUT: Duration = Duration::from_millis(3000);

const CPU_CMD: &str = r#"top -bn1 | awk -F',' '/Cpu\(s\)/ { for (i = 1; i <= NF; i++) if ($i ~ /id/) { gsub(/[^0-9.]/, "", $i); printf "%.1f", 100 - $i } }'"#;
const MEMORY_CMD: &str = r#"free -b | awk '/^Mem:/ { printf "%.1fG|%.1fG|%.0f", $3 / 1073741824, $2 / 1073741824, $3 * 100 / $2 }'"#;
const DISK_CMD: &str = r#"df -h / | awk 'NR == 2 { sub(/%/, "", $5); print $3 "|" $2 "|" $5 }'"#;
const UPTIME_CMD: &str = "uptime -p | sed 's/^up //'";

const GATEWAY_SERVICE_NAME: &str = "OpenClaw Gateway";
const DEFAULT_GATEWAY_PORT: u16 = 18789;
const PLACEHOLDER: &str = "--";

pub struct DashboardService {
    runner: Arc<dyn CommandRunner>,
    gateway: Arc<dyn GatewayApi>,
    cache: TtlCache,
    gateway_url: String,
    services: Vec<ServiceTarget>,
    hosts: Vec<HostTarget>,
    settings: DashboardSettings,
}

impl DashboardService {
    pub fn new(
        config: &Config,
        runner: Arc<dyn CommandRunner>,
        gateway: Arc<dyn GatewayApi>,
    ) -> Arc<Self> {
        Arc::new(Self {
            runner,
            gateway,
            cache: TtlCache::new(Duration::from_millis(config.cache_ttl_ms)),
            gateway_url: config.openclaw.gateway_url.clone(),
            services: config.services.clone(),
            hosts: config.hosts.clone(),
            settings: DashboardSettings {
                refresh_interval: config.refresh_interval,
                dashboard_title: config.dashboard_title.clone(),
                quick_links: config.quick_links.clone(),
            },
        })
    }

    /// CPU, memory, disk and uptime from four concurrent shell probes.
    /// A failed probe degrades its own fields to placeholders.
    pub async fn system(&self) -> SystemStats {
        if let Some(hit) = self.cached(SYSTEM_KEY).await {
            return hit;
        }

        let (cpu, memory, disk, uptime) = tokio::join!(
            self.runner.run(CPU_CMD, SYSTEM_PROBE_TIMEOUT),
            self.runner.run(MEMORY_CMD, SYSTEM_PROBE_TIMEOUT),
            self.runner.run(DISK_CMD, SYSTEM_PROBE_TIMEOUT),
            self.runner.run(UPTIME_CMD, SYSTEM_PROBE_TIMEOUT),
        );
        let any_succeeded = cpu.is_some() || memory.is_some() || disk.is_some() || uptime.is_some();

        let (memory_used, memory_total, memory_pct) = parse_usage(memory.as_deref());
        let (disk_used, disk_total, disk_pct) = parse_usage(disk.as_deref());

        let stats = SystemStats {
            cpu: cpu.as_deref().and_then(parse_number).unwrap_or(0.0),
            memory_used,
            memory_total,
            memory_pct,
            disk_used,
            disk_total,
            disk_pct,
            uptime: uptime
                .filter(|u| !u.is_empty())
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
        };

        if any_succeeded {
            self.store(SYSTEM_KEY, &stats).await;
        }
        stats
    }

    pub async fn sessions(&self) -> SessionList {
        if let Some(hit) = self.cached(SESSIONS_KEY).await {
            return hit;
        }

        match self.gateway.sessions().await {
            Ok(raw) => {
                let list = SessionList {
                    sessions: raw.into_iter().map(normalize_session).collect(),
                };
                self.store(SESSIONS_KEY, &list).await;
                list
            }
            Err(e) => {
                warn!(error = %e, "failed to fetch sessions from gateway");
                SessionList::default()
            }
        }
    }

    pub async fn crons(&self) -> CronList {
        if let Some(hit) = self.cached(CRONS_KEY).await {
            return hit;
        }

        match self.gateway.cron_jobs().await {
            Ok(raw) => {
                let list = CronList {
                    jobs: raw.into_iter().map(normalize_cron_job).collect(),
                };
                self.store(CRONS_KEY, &list).await;
                list
            }
            Err(e) => {
                warn!(error = %e, "failed to fetch cron jobs from gateway");
                CronList::default()
            }
        }
    }

    /// Gateway health plus every configured service, probed concurrently.
    pub async fn services(&self) -> ServiceList {
        if let Some(hit) = self.cached(SERVICES_KEY).await {
            return hit;
        }

        let targets = self.service_targets();
        let services = join_all(targets.iter().map(|t| self.probe_service(t))).await;
        let list = ServiceList { services };

        self.store(SERVICES_KEY, &list).await;
        list
    }

    pub async fn network(&self) -> HostList {
        if let Some(hit) = self.cached(NETWORK_KEY).await {
            return hit;
        }

        let hosts = join_all(self.hosts.iter().map(|h| self.probe_host(h))).await;
        let list = HostList { hosts };

        self.store(NETWORK_KEY, &list).await;
        list
    }

    pub fn settings(&self) -> DashboardSettings {
        self.settings.clone()
    }

    /// Probe targets: the gateway's own `/health` first, then configured services.
    pub fn service_targets(&self) -> Vec<ServiceTarget> {
        let mut targets = Vec::with_capacity(self.services.len() + 1);
        targets.push(gateway_target(&self.gateway_url));
        targets.extend(self.services.iter().cloned());
        targets
    }

    async fn probe_service(&self, target: &ServiceTarget) -> ServiceHealth {
        let down = ServiceHealth {
            name: target.name.clone(),
            port: target.port,
            status: ServiceStatus::Down,
        };

        let Some(url) = service_url(target) else {
            warn!(service = %target.name, "invalid service target, skipping probe");
            return down;
        };

        let args: Vec<String> = [
            "-s",
            "-o",
            "/dev/null",
            "-w",
            "%{http_code}",
            "--max-time",
            "3",
            url.as_str(),
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let code = self
            .runner
            .run_with_args("curl", &args, SERVICE_PROBE_TIMEOUT)
            .await;
        debug!(service = %target.name, url = %url, code = ?code, "service probe finished");

        match code.as_deref() {
            // 404 means something answered, which is alive enough.
            Some("200") | Some("404") => ServiceHealth {
                status: ServiceStatus::Up,
                ..down
            },
            _ => down,
        }
    }

    async fn probe_host(&self, target: &HostTarget) -> HostHealth {
        let mut health = HostHealth {
            name: target.name.clone(),
            ip: target.ip.clone(),
            status: HostStatus::Offline,
        };

        if !is_valid_hostname(&target.ip) {
            warn!(host = %target.name, ip = %target.ip, "invalid host address, skipping probe");
            return health;
        }

        let args = vec![
            "-c".to_string(),
            "1".to_string(),
            "-W".to_string(),
            "2".to_string(),
            target.ip.clone(),
        ];
        if self
            .runner
            .run_with_args("ping", &args, HOST_PROBE_TIMEOUT)
            .await
            .is_some()
        {
            health.status = HostStatus::Online;
        }
        health
    }

    async fn cached<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.cache.get(key).await?;
        serde_json::from_value(value).ok()
    }

    async fn store<T: Serialize>(&self, key: &str, value: &T) {
        match serde_json::to_value(value) {
            Ok(v) => self.cache.set(key, v).await,
            Err(e) => warn!(key, error = %e, "failed to cache collector result"),
        }
    }
}

/// Synthetic target for the gateway's own health endpoint. An unparsable
/// gateway URL yields a target that fails validation and reports down.
fn gateway_target(gateway_url: &str) -> ServiceTarget {
    let parsed = Url::parse(gateway_url)
        .ok()
        .filter(|_| is_valid_url(gateway_url));
    let (host, port) = match &parsed {
        Some(url) => (
            url.host_str().unwrap_or_default().to_string(),
            url.port_or_known_default().unwrap_or(DEFAULT_GATEWAY_PORT),
        ),
        None => {
            warn!(gateway_url, "invalid gateway url, gateway health will report down");
            (String::new(), DEFAULT_GATEWAY_PORT)
        }
    };

    ServiceTarget {
        name: GATEWAY_SERVICE_NAME.to_string(),
        port,
        host: Some(host),
        health_path: Some("/health".to_string()),
    }
}

fn service_url(target: &ServiceTarget) -> Option<String> {
    let host = target.host.as_deref().unwrap_or("127.0.0.1");
    if !is_valid_hostname(host) {
        return None;
    }
    let path = target.health_path.as_deref().unwrap_or("/");
    let url = if path.starts_with('/') {
        format!("http://{}:{}{}", host, target.port, path)
    } else {
        format!("http://{}:{}/{}", host, target.port, path)
    };
    is_valid_url(&url).then_some(url)
}

fn parse_number(s: &str) -> Option<f64> {
    s.trim().trim_end_matches('%').parse().ok()
}

/// `used|total|pct` probe output; missing fields become placeholders.
fn parse_usage(out: Option<&str>) -> (String, String, f64) {
    let mut fields = out.unwrap_or_default().split('|').map(str::trim);
    let mut text = || {
        fields
            .next()
            .filter(|f| !f.is_empty())
            .map(str::to_string)
    };
    let used = text().unwrap_or_else(|| PLACEHOLDER.to_string());
    let total = text().unwrap_or_else(|| PLACEHOLDER.to_string());
    let pct = text().as_deref().and_then(parse_number).unwrap_or(0.0);
    (used, total, pct)
}
