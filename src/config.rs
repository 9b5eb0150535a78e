//! Runtime configuration from the environment (and an optional `.env`).

use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::monitor::MonitorSettings;

pub const HOSTS_VAR: &str = "PINGBOARD_HOSTS";
pub const INTERVAL_VAR: &str = "PINGBOARD_INTERVAL_SECS";
pub const PORT_VAR: &str = "PINGBOARD_PORT";
pub const BIND_VAR: &str = "PINGBOARD_BIND";
pub const VERBOSE_VAR: &str = "PINGBOARD_VERBOSE";
pub const PING_COUNT_VAR: &str = "PINGBOARD_PING_COUNT";
pub const PING_TIMEOUT_VAR: &str = "PINGBOARD_PING_TIMEOUT_MS";

const DEFAULT_INTERVAL_SECS: u64 = 5;
const DEFAULT_PORT: u16 = 8081;
const DEFAULT_PING_COUNT: u32 = 3;
const DEFAULT_PING_TIMEOUT_MS: u64 = 1000;

#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    pub hosts: Vec<String>,
    pub interval: Duration,
    pub bind: IpAddr,
    pub port: u16,
    pub verbose: bool,
    pub ping_count: u32,
    pub ping_timeout: Duration,
}

impl MonitorConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!(error = %e, "Ignoring unreadable .env file");
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let hosts = parse_hosts(&lookup(HOSTS_VAR).unwrap_or_default());
        if hosts.is_empty() {
            return Err(ConfigError::NoHosts);
        }

        let interval_secs: u64 = parse_or(&lookup, INTERVAL_VAR, DEFAULT_INTERVAL_SECS)?;
        if interval_secs == 0 {
            return Err(ConfigError::Zero { key: INTERVAL_VAR });
        }
        let ping_count: u32 = parse_or(&lookup, PING_COUNT_VAR, DEFAULT_PING_COUNT)?;
        if ping_count == 0 {
            return Err(ConfigError::Zero {
                key: PING_COUNT_VAR,
            });
        }
        let ping_timeout_ms: u64 = parse_or(&lookup, PING_TIMEOUT_VAR, DEFAULT_PING_TIMEOUT_MS)?;
        if ping_timeout_ms == 0 {
            return Err(ConfigError::Zero {
                key: PING_TIMEOUT_VAR,
            });
        }

        Ok(Self {
            hosts,
            interval: Duration::from_secs(interval_secs),
            bind: parse_or(&lookup, BIND_VAR, IpAddr::from([0, 0, 0, 0]))?,
            port: parse_or(&lookup, PORT_VAR, DEFAULT_PORT)?,
            verbose: lookup(VERBOSE_VAR)
                .map(|v| parse_flag(&v))
                .transpose()?
                .unwrap_or(false),
            ping_count,
            ping_timeout: Duration::from_millis(ping_timeout_ms),
        })
    }

    pub fn monitor_settings(&self) -> MonitorSettings {
        MonitorSettings {
            interval: self.interval,
            verbose: self.verbose,
        }
    }
}

/// Split a comma-separated host list, dropping blanks and repeats.
fn parse_hosts(raw: &str) -> Vec<String> {
    let mut hosts: Vec<String> = Vec::new();
    for host in raw.split(',').map(str::trim).filter(|h| !h.is_empty()) {
        if !hosts.iter().any(|h| h == host) {
            hosts.push(host.to_string());
        }
    }
    hosts
}

fn parse_or<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
    }
}

fn parse_flag(raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: VERBOSE_VAR,
            value: raw.to_string(),
        }),
    }
}
