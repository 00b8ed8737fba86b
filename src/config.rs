//! Dashboard configuration: built-in defaults, then the config file, then
//! `PORT`/`HOST` from the environment. CLI flags are applied by the caller.

use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Json, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_PATH: &str = "config.json";
pub const DEFAULT_GATEWAY_URL: &str = "http://127.0.0.1:18789";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub port: u16,
    pub host: String,
    /// Front-end refresh period in milliseconds.
    pub refresh_interval: u64,
    pub dashboard_title: String,
    pub log_level: String,
    pub auth: AuthConfig,
    pub cors: CorsConfig,
    pub openclaw: OpenClawConfig,
    pub services: Vec<ServiceTarget>,
    pub hosts: Vec<HostTarget>,
    pub quick_links: Vec<QuickLink>,
    pub static_dir: PathBuf,
    pub rate_limit: RateLimitConfig,
    pub cache_ttl_ms: u64,
    pub shutdown_grace_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "0.0.0.0".to_string(),
            refresh_interval: 30_000,
            dashboard_title: "OpenClaw Dashboard".to_string(),
            log_level: "info".to_string(),
            auth: AuthConfig::default(),
            cors: CorsConfig::default(),
            openclaw: OpenClawConfig::default(),
            services: Vec::new(),
            hosts: Vec::new(),
            quick_links: Vec::new(),
            static_dir: PathBuf::from("public"),
            rate_limit: RateLimitConfig::default(),
            cache_ttl_ms: 5000,
            shutdown_grace_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OpenClawConfig {
    pub gateway_url: String,
    pub gateway_token: Option<String>,
}

impl Default for OpenClawConfig {
    fn default() -> Self {
        Self {
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            gateway_token: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceTarget {
    pub name: String,
    pub port: u16,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub health_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostTarget {
    pub name: String,
    pub ip: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickLink {
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RateLimitConfig {
    pub max_requests: u64,
    pub window_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 60,
            window_secs: 60,
            sweep_interval_secs: 300,
        }
    }
}

impl Config {
    /// Strict load: any unparsable source is an error.
    pub fn load(path: &Path) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if path.exists() {
            figment = match path.extension().and_then(|e| e.to_str()) {
                Some("yaml") | Some("yml") => figment.merge(Yaml::file(path)),
                _ => figment.merge(Json::file(path)),
            };
        }
        figment.merge(env_overrides()).extract()
    }

    /// Lenient load used by the server: a broken file falls back to defaults
    /// (still honouring the environment) and hands back the error for logging.
    pub fn load_or_default(path: &Path) -> (Self, Option<figment::Error>) {
        match Self::load(path) {
            Ok(config) => (config, None),
            Err(e) => {
                let config = Figment::from(Serialized::defaults(Config::default()))
                    .merge(env_overrides())
                    .extract()
                    .unwrap_or_default();
                (config, Some(e))
            }
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_overrides() -> Env {
    Env::raw().only(&["PORT", "HOST"])
}
