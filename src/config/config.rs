// SPDX-License-Identifier: GPL-3.0-only
use anyhow::Context;
use ipnet::IpNet;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::fetcher::client::DEFAULT_USER_AGENT;
use crate::fetcher::{FetchPolicy, OversizePolicy, MAX_REDIRECT_CAP};
use crate::guard::url_validator::MAX_URL_LENGTH;
use crate::guard::GuardPolicy;
use crate::orchestrator::FetchSettings;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP API bind address (e.g., "127.0.0.1:8080")
    pub listen_addr: SocketAddr,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Emit logs as JSON lines
    pub log_json: bool,

    pub user_agent: String,

    pub max_url_length: usize,

    pub dns_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub overall_timeout_secs: u64,

    /// Redirects followed per fetch (at most 3)
    pub max_redirects: u8,

    pub max_body_bytes: usize,

    /// "truncate" or "reject"
    pub oversize_policy: OversizePolicy,

    /// Fail fetches whose final status is not 2xx
    pub reject_non_success: bool,

    /// CIDR ranges allowed despite the blocklist
    pub exempt_cidrs: Vec<String>,
}

impl Config {
    /// Load configuration from TOML file with environment variable overrides
    pub fn load() -> anyhow::Result<Self> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::load`], reading variables through `lookup`
    pub fn load_with<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config_path = lookup("FETCHGUARD_CONFIG").unwrap_or_else(|| "fetchguard.toml".to_string());

        let mut config: Config = if std::path::Path::new(&config_path).exists() {
            let contents = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config file {}", config_path))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", config_path))?
        } else {
            Config::default()
        };

        config.apply_overrides(&lookup)?;
        config.validate()?;

        Ok(config)
    }

    fn apply_overrides<F>(&mut self, lookup: &F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("FETCHGUARD_LISTEN_ADDR") {
            self.listen_addr = parse_var("FETCHGUARD_LISTEN_ADDR", &val)?;
        }
        if let Some(val) = lookup("FETCHGUARD_LOG_LEVEL") {
            self.log_level = val;
        }
        if let Some(val) = lookup("FETCHGUARD_LOG_JSON") {
            self.log_json = parse_var("FETCHGUARD_LOG_JSON", &val)?;
        }
        if let Some(val) = lookup("FETCHGUARD_USER_AGENT") {
            self.user_agent = val;
        }
        if let Some(val) = lookup("FETCHGUARD_MAX_URL_LENGTH") {
            self.max_url_length = parse_var("FETCHGUARD_MAX_URL_LENGTH", &val)?;
        }
        if let Some(val) = lookup("FETCHGUARD_DNS_TIMEOUT_SECS") {
            self.dns_timeout_secs = parse_var("FETCHGUARD_DNS_TIMEOUT_SECS", &val)?;
        }
        if let Some(val) = lookup("FETCHGUARD_CONNECT_TIMEOUT_SECS") {
            self.connect_timeout_secs = parse_var("FETCHGUARD_CONNECT_TIMEOUT_SECS", &val)?;
        }
        if let Some(val) = lookup("FETCHGUARD_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = parse_var("FETCHGUARD_REQUEST_TIMEOUT_SECS", &val)?;
        }
        if let Some(val) = lookup("FETCHGUARD_OVERALL_TIMEOUT_SECS") {
            self.overall_timeout_secs = parse_var("FETCHGUARD_OVERALL_TIMEOUT_SECS", &val)?;
        }
        if let Some(val) = lookup("FETCHGUARD_MAX_REDIRECTS") {
            self.max_redirects = parse_var("FETCHGUARD_MAX_REDIRECTS", &val)?;
        }
        if let Some(val) = lookup("FETCHGUARD_MAX_BODY_BYTES") {
            self.max_body_bytes = parse_var("FETCHGUARD_MAX_BODY_BYTES", &val)?;
        }
        if let Some(val) = lookup("FETCHGUARD_OVERSIZE_POLICY") {
            self.oversize_policy = val.parse().map_err(anyhow::Error::msg)?;
        }
        if let Some(val) = lookup("FETCHGUARD_REJECT_NON_SUCCESS") {
            self.reject_non_success = parse_var("FETCHGUARD_REJECT_NON_SUCCESS", &val)?;
        }
        if let Some(val) = lookup("FETCHGUARD_EXEMPT_CIDRS") {
            self.exempt_cidrs = val
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }

        Ok(())
    }

    /// Reject values that would disable a bound
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_url_length == 0 {
            anyhow::bail!("max_url_length must be greater than zero");
        }
        if self.max_body_bytes == 0 {
            anyhow::bail!("max_body_bytes must be greater than zero");
        }
        for (name, value) in [
            ("dns_timeout_secs", self.dns_timeout_secs),
            ("connect_timeout_secs", self.connect_timeout_secs),
            ("request_timeout_secs", self.request_timeout_secs),
            ("overall_timeout_secs", self.overall_timeout_secs),
        ] {
            if value == 0 {
                anyhow::bail!("{} must be greater than zero", name);
            }
        }
        if self.max_redirects > MAX_REDIRECT_CAP {
            anyhow::bail!("max_redirects must be at most {}", MAX_REDIRECT_CAP);
        }
        self.exempt_ranges()?;
        Ok(())
    }

    pub fn exempt_ranges(&self) -> anyhow::Result<Vec<IpNet>> {
        self.exempt_cidrs
            .iter()
            .map(|cidr| {
                IpNet::from_str(cidr).with_context(|| format!("Invalid exempt CIDR '{}'", cidr))
            })
            .collect()
    }

    pub fn dns_timeout(&self) -> Duration {
        Duration::from_secs(self.dns_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn overall_timeout(&self) -> Duration {
        Duration::from_secs(self.overall_timeout_secs)
    }

    pub fn guard_policy(&self) -> anyhow::Result<GuardPolicy> {
        Ok(GuardPolicy {
            max_url_length: self.max_url_length,
            exempt_ranges: self.exempt_ranges()?,
        })
    }

    pub fn fetch_policy(&self) -> FetchPolicy {
        FetchPolicy {
            max_redirects: self.max_redirects.min(MAX_REDIRECT_CAP),
            max_body_bytes: self.max_body_bytes,
            oversize: self.oversize_policy,
            reject_non_success: self.reject_non_success,
        }
    }

    pub fn fetch_settings(&self) -> anyhow::Result<FetchSettings> {
        Ok(FetchSettings {
            guard: self.guard_policy()?,
            fetch: self.fetch_policy(),
            overall_timeout: self.overall_timeout(),
        })
    }
}

fn parse_var<T>(name: &str, value: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .with_context(|| format!("Invalid value for {}: '{}'", name, value))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            log_level: String::from("info"),
            log_json: false,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_url_length: MAX_URL_LENGTH,
            dns_timeout_secs: 3,
            connect_timeout_secs: 5,
            request_timeout_secs: 10,
            overall_timeout_secs: 20,
            max_redirects: MAX_REDIRECT_CAP,
            max_body_bytes: 2 * 1024 * 1024, // 2 MiB
            oversize_policy: OversizePolicy::Truncate,
            reject_non_success: false,
            exempt_cidrs: Vec::new(),
        }
    }
}
