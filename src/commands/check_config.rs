use std::path::PathBuf;

use colored::Colorize;

use crate::config::{Config, DEFAULT_CONFIG_PATH};
use crate::domain::auth::AuthGate;
use crate::domain::validate::{is_valid_hostname, is_valid_url};

pub fn run(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    println!("{}", "openclaw-dashboard check-config".bold());
    println!("  file:     {}", path.display());

    let config = match Config::load(&path) {
        Ok(config) => config,
        Err(e) => {
            println!("  parse:    {}", "failed".red());
            println!("  error:    {}", e);
            std::process::exit(1);
        }
    };

    if path.exists() {
        println!("  parse:    {}", "ok".green());
    } else {
        println!("  parse:    {}", "not found, using defaults".yellow());
    }
    println!("  listen:   {}", config.bind_addr());
    println!(
        "  auth:     {}",
        if AuthGate::new(config.auth.token.clone()).is_enabled() {
            "bearer token"
        } else {
            "disabled"
        }
    );

    let mut failures = 0usize;

    println!("{}", "gateway".bold());
    failures += report(&config.openclaw.gateway_url, is_valid_url(&config.openclaw.gateway_url));

    println!("{}", "services".bold());
    for service in &config.services {
        let host = service.host.as_deref().unwrap_or("127.0.0.1");
        let label = format!("{} ({}:{})", service.name, host, service.port);
        failures += report(&label, is_valid_hostname(host));
    }

    println!("{}", "hosts".bold());
    for host in &config.hosts {
        let label = format!("{} ({})", host.name, host.ip);
        failures += report(&label, is_valid_hostname(&host.ip));
    }

    println!("{}", "quick links".bold());
    for link in &config.quick_links {
        let label = format!("{} ({})", link.name, link.url);
        failures += report(&label, is_valid_url(&link.url));
    }

    if failures > 0 {
        println!("  {} {} invalid entries", "fail".red().bold(), failures);
        std::process::exit(1);
    }
    println!("  {} configuration is valid", "ok".green().bold());
    Ok(())
}

fn report(label: &str, valid: bool) -> usize {
    if valid {
        println!("  {} {}", "ok  ".green(), label);
        0
    } else {
        println!("  {} {}", "bad ".red(), label);
        1
    }
}
