use anyhow::{Context, Result};
use clap::ArgMatches;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::metrics::{EventProcessorScraper, MetricScraper, StatusClient};
use crate::poller::PollSettings;
use crate::wait::DEFAULT_EVENT_SETTLE;

const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub impalad_url: String,
    pub catalog_url: String,
    pub metrics_path: String,
    pub poll_interval_ms: u64,
    pub wait_timeout_secs: u64,
    pub event_processing_timeout_secs: u64,
    pub event_settle_ms: u64,
    pub request_timeout_secs: u64,
    pub log_level: Option<String>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            impalad_url: "http://localhost:25000".to_string(),
            catalog_url: "http://localhost:25020".to_string(),
            metrics_path: crate::DEFAULT_METRICS_PATH.to_string(),
            poll_interval_ms: 100,
            wait_timeout_secs: 20,
            event_processing_timeout_secs: 10,
            event_settle_ms: DEFAULT_EVENT_SETTLE.as_millis() as u64,
            request_timeout_secs: 15,
            log_level: Some(DEFAULT_LOG_LEVEL.to_string()),
        }
    }
}

impl ProbeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.impalad_url.trim().is_empty() {
            return Err(anyhow::anyhow!("impalad_url must not be empty"));
        }

        if self.catalog_url.trim().is_empty() {
            return Err(anyhow::anyhow!("catalog_url must not be empty"));
        }

        if !self.metrics_path.starts_with('/') {
            return Err(anyhow::anyhow!(
                "metrics_path must start with '/': {}",
                self.metrics_path
            ));
        }

        if self.poll_interval_ms == 0 {
            return Err(anyhow::anyhow!("poll_interval_ms must be greater than 0"));
        }

        if self.wait_timeout_secs == 0 {
            return Err(anyhow::anyhow!("wait_timeout_secs must be greater than 0"));
        }

        if self.event_processing_timeout_secs == 0 {
            return Err(anyhow::anyhow!(
                "event_processing_timeout_secs must be greater than 0"
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(anyhow::anyhow!(
                "request_timeout_secs must be greater than 0"
            ));
        }

        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    pub fn event_settle(&self) -> Duration {
        Duration::from_millis(self.event_settle_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn poll_settings(&self) -> Result<PollSettings> {
        Ok(PollSettings::new(self.wait_timeout(), self.poll_interval())?)
    }

    pub fn event_poll_settings(&self) -> Result<PollSettings> {
        Ok(PollSettings::new(
            Duration::from_secs(self.event_processing_timeout_secs),
            self.poll_interval(),
        )?)
    }

    pub fn metric_scraper(&self) -> Result<MetricScraper> {
        let status = StatusClient::new(&self.impalad_url, self.request_timeout())?;
        Ok(MetricScraper::new(status, &self.metrics_path))
    }

    pub fn event_scraper(&self) -> Result<EventProcessorScraper> {
        let status = StatusClient::new(&self.catalog_url, self.request_timeout())?;
        Ok(EventProcessorScraper::new(status))
    }

    pub fn apply_cli_overrides(&mut self, matches: &ArgMatches) {
        if let Some(url) = matches.get_one::<String>("impalad") {
            self.impalad_url = url.clone();
        }

        if let Some(url) = matches.get_one::<String>("catalog") {
            self.catalog_url = url.clone();
        }

        if let Some(interval) = matches.get_one::<u64>("interval-ms") {
            self.poll_interval_ms = *interval;
        }

        if let Some(timeout) = matches.get_one::<u64>("timeout-secs") {
            self.wait_timeout_secs = *timeout;
            self.event_processing_timeout_secs = *timeout;
        }

        if let Some(log_level) = matches.get_one::<String>("log-level") {
            self.log_level = Some(log_level.clone());
        }
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("CLUSTER_PROBE_IMPALAD_URL") {
            self.impalad_url = url;
        }

        if let Ok(url) = std::env::var("CLUSTER_PROBE_CATALOG_URL") {
            self.catalog_url = url;
        }

        if let Ok(path) = std::env::var("CLUSTER_PROBE_METRICS_PATH") {
            self.metrics_path = path;
        }

        if let Some(interval) = env_u64("CLUSTER_PROBE_POLL_INTERVAL_MS") {
            self.poll_interval_ms = interval;
        }

        if let Some(timeout) = env_u64("CLUSTER_PROBE_WAIT_TIMEOUT") {
            self.wait_timeout_secs = timeout;
        }

        if let Some(timeout) = env_u64("CLUSTER_PROBE_EVENT_TIMEOUT") {
            self.event_processing_timeout_secs = timeout;
        }

        if let Some(settle) = env_u64("CLUSTER_PROBE_EVENT_SETTLE_MS") {
            self.event_settle_ms = settle;
        }

        if let Some(timeout) = env_u64("CLUSTER_PROBE_REQUEST_TIMEOUT") {
            self.request_timeout_secs = timeout;
        }

        if let Ok(log_level) = std::env::var("CLUSTER_PROBE_LOG_LEVEL") {
            self.log_level = Some(log_level);
        }
    }
}

fn env_u64(key: &str) -> Option<u64> {
    let raw = std::env::var(key).ok()?;
    match raw.parse::<u64>() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Ignoring {key}={raw:?}: not a non-negative integer");
            None
        }
    }
}

/// Log filter to start with, before the config file is read: CLI > env > default.
pub fn startup_log_level(matches: &ArgMatches) -> String {
    matches
        .get_one::<String>("log-level")
        .cloned()
        .or_else(|| std::env::var("CLUSTER_PROBE_LOG_LEVEL").ok())
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
}

/// Load configuration: CLI args > env vars > config file > defaults
pub fn load_config(config_path: Option<&str>, matches: &ArgMatches) -> Result<ProbeConfig> {
    let mut config = match config_path {
        Some(path) => load_config_file(path)?,
        None => ProbeConfig::default(),
    };

    config.apply_env_overrides();
    config.apply_cli_overrides(matches);

    config
        .validate()
        .with_context(|| "Configuration validation failed")?;

    log::debug!("Final config: {config:?}");

    Ok(config)
}

fn load_config_file(path: &str) -> Result<ProbeConfig> {
    if !Path::new(path).exists() {
        log::warn!("Config file not found: {path}, using defaults");
        return Ok(ProbeConfig::default());
    }

    let file_content =
        fs::read_to_string(path).with_context(|| format!("Failed to read config file: {path}"))?;
    let config = toml::from_str(&file_content)
        .with_context(|| format!("Failed to parse config file: {path}"))?;

    log::info!("Loaded configuration from file: {path}");
    Ok(config)
}

/// Create a sample configuration file
pub fn create_sample_config(path: &str) -> Result<()> {
    let config = ProbeConfig::default();
    let toml_content =
        toml::to_string_pretty(&config).context("Failed to serialize default config")?;

    fs::write(path, toml_content)
        .with_context(|| format!("Failed to write sample config to: {path}"))?;

    Ok(())
}
