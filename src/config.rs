//! Settings loaded from `config/settings.yaml`.
//!
//! Every section and field has a default so a partial file works. Lookup
//! order when no path is given: `./config/settings.yaml`, then
//! `~/.leadsync/settings.yaml`, then built-in defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::sheet::dispatch::{DispatchPolicy, DEFAULT_BATCH_SIZE, DEFAULT_RETRIES};
use crate::sheet::normalize::DEFAULT_SOURCE;

pub const DEFAULT_CONFIG_PATH: &str = "config/settings.yaml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Shared Apps Script URL used for both GET and POST when
    /// `google_sheets` does not name its own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    #[serde(default)]
    pub google_sheets: SheetsConfig,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
    #[serde(default)]
    pub monthly_run: RunConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    /// Overrides the webhook for reading existing rows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get_url: Option<String>,
    /// Overrides the webhook for pushing batches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_url: Option<String>,
    #[serde(default = "default_enriched_csv")]
    pub input_csv: PathBuf,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_post_timeout_secs")]
    pub post_timeout_secs: u64,
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
    #[serde(default = "default_source")]
    pub default_source: String,
    /// Wall-clock budget for a whole sync run, counted from when the sync is
    /// built, so CSV loading and the sheet read spend it too. Unbounded when
    /// absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_deadline_secs: Option<u64>,
}

fn default_enriched_csv() -> PathBuf {
    PathBuf::from("data/enriched_with_emails.csv")
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_post_timeout_secs() -> u64 {
    20
}

fn default_retries() -> u32 {
    DEFAULT_RETRIES
}

fn default_retry_delay_secs() -> u64 {
    2
}

fn default_source() -> String {
    DEFAULT_SOURCE.to_string()
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            get_url: None,
            post_url: None,
            input_csv: default_enriched_csv(),
            batch_size: default_batch_size(),
            post_timeout_secs: default_post_timeout_secs(),
            retries: default_retries(),
            retry_delay_secs: default_retry_delay_secs(),
            default_source: default_source(),
            run_deadline_secs: None,
        }
    }
}

impl SheetsConfig {
    pub fn post_timeout(&self) -> Duration {
        Duration::from_secs(self.post_timeout_secs)
    }

    /// Batching and retry policy. The deadline, if any, starts now and is
    /// only checked between batches and during retry waits.
    pub fn dispatch_policy(&self) -> DispatchPolicy {
        DispatchPolicy {
            batch_size: self.batch_size,
            retries: self.retries,
            retry_delay: Duration::from_secs(self.retry_delay_secs),
            deadline: self
                .run_deadline_secs
                .map(|secs| tokio::time::Instant::now() + Duration::from_secs(secs)),
        }
    }
}

/// One finder API key with its last known remaining credits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeyConfig {
    pub key: String,
    #[serde(default)]
    pub credits: i64,
    #[serde(default = "default_key_status")]
    pub status: String,
}

fn default_key_status() -> String {
    "active".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    #[serde(default)]
    pub api_keys: Vec<ApiKeyConfig>,
    #[serde(default = "default_hunter_base_url")]
    pub base_url: String,
    #[serde(default = "default_confidence_threshold")]
    pub email_confidence_threshold: u32,
    #[serde(default)]
    pub blacklist_domains: Vec<String>,
    /// Seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
    #[serde(default = "default_monthly_email_cap")]
    pub monthly_email_cap: usize,
    #[serde(default = "default_scraped_csv")]
    pub input_csv: PathBuf,
    #[serde(default = "default_enriched_csv")]
    pub output_csv: PathBuf,
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
    #[serde(default = "default_rate_limit_wait_secs")]
    pub rate_limit_wait_secs: u64,
    #[serde(default = "default_max_rate_limit_retries")]
    pub max_rate_limit_retries: u32,
}

fn default_hunter_base_url() -> String {
    "https://api.hunter.io/v2".to_string()
}

fn default_confidence_threshold() -> u32 {
    50
}

fn default_request_timeout() -> u64 {
    30
}

fn default_monthly_email_cap() -> usize {
    200
}

fn default_scraped_csv() -> PathBuf {
    PathBuf::from("data/scraper_output.csv")
}

fn default_request_delay_ms() -> u64 {
    500
}

fn default_rate_limit_wait_secs() -> u64 {
    60
}

fn default_max_rate_limit_retries() -> u32 {
    3
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            api_keys: Vec::new(),
            base_url: default_hunter_base_url(),
            email_confidence_threshold: default_confidence_threshold(),
            blacklist_domains: Vec::new(),
            request_timeout: default_request_timeout(),
            monthly_email_cap: default_monthly_email_cap(),
            input_csv: default_scraped_csv(),
            output_csv: default_enriched_csv(),
            request_delay_ms: default_request_delay_ms(),
            rate_limit_wait_secs: default_rate_limit_wait_secs(),
            max_rate_limit_retries: default_max_rate_limit_retries(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "INFO".to_string()
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Config {
    pub fn from_yaml(content: &str) -> Result<Self, PipelineError> {
        // An empty file parses as null; treat it as all defaults.
        if content.trim().is_empty() {
            return Ok(Config::default());
        }
        serde_yaml::from_str(content)
            .map_err(|e| PipelineError::ConfigurationError(format!("Failed to parse config: {}", e)))
    }

    /// Endpoint for reading existing rows.
    pub fn get_endpoint(&self) -> Option<&str> {
        self.google_sheets
            .get_url
            .as_deref()
            .or_else(|| self.shared_webhook())
    }

    /// Endpoint for pushing batches.
    pub fn post_endpoint(&self) -> Option<&str> {
        self.google_sheets
            .post_url
            .as_deref()
            .or_else(|| self.shared_webhook())
    }

    fn shared_webhook(&self) -> Option<&str> {
        self.google_sheets
            .webhook_url
            .as_deref()
            .or(self.webhook_url.as_deref())
            .filter(|u| !u.trim().is_empty())
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        let sheets = &self.google_sheets;
        if sheets.batch_size == 0 {
            return Err(PipelineError::ConfigurationError(
                "google_sheets.batch_size must be at least 1".into(),
            ));
        }
        if sheets.retries == 0 {
            return Err(PipelineError::ConfigurationError(
                "google_sheets.retries must be at least 1".into(),
            ));
        }
        for (name, value) in [
            ("webhook_url", self.webhook_url.as_deref()),
            ("google_sheets.webhook_url", sheets.webhook_url.as_deref()),
            ("google_sheets.get_url", sheets.get_url.as_deref()),
            ("google_sheets.post_url", sheets.post_url.as_deref()),
            ("enrichment.base_url", Some(self.enrichment.base_url.as_str())),
        ] {
            if let Some(raw) = value.filter(|v| !v.trim().is_empty()) {
                url::Url::parse(raw).map_err(|e| {
                    PipelineError::ConfigurationError(format!("{} is not a valid URL: {}", name, e))
                })?;
            }
        }
        Ok(())
    }
}

/// Load and validate settings.
///
/// An explicit `path` must exist. Without one, the first file found in the
/// default locations is used, falling back to defaults with a warning.
pub fn load_config(path: Option<&Path>) -> Result<Config, PipelineError> {
    let path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(PipelineError::ConfigurationError(format!(
                    "Config file not found at {}",
                    p.display()
                )));
            }
            p.to_path_buf()
        }
        None => match default_config_paths().into_iter().find(|p| p.exists()) {
            Some(p) => p,
            None => {
                log::warn!("Config: no settings.yaml found, using defaults");
                return Ok(Config::default());
            }
        },
    };

    let content = fs::read_to_string(&path).map_err(|e| {
        PipelineError::ConfigurationError(format!("Failed to read {}: {}", path.display(), e))
    })?;
    let config = Config::from_yaml(&content)?;
    config.validate()?;
    log::debug!("Config: loaded {}", path.display());
    Ok(config)
}

fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(DEFAULT_CONFIG_PATH)];
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".leadsync").join("settings.yaml"));
    }
    paths
}
