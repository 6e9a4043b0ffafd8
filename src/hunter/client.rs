//! REST client for the Hunter.io email finder.
//!
//! Uses reqwest with the API key passed as a query parameter. All lookups
//! target `{base_url}/email-finder`.

use std::time::Duration;

use serde::Deserialize;

use super::keys::KeyPool;
use super::validate::{is_blacklisted, is_valid_domain, is_valid_last_name};
use crate::config::EnrichmentConfig;

/// Errors from email finder requests.
#[derive(Debug, thiserror::Error)]
pub enum HunterError {
    #[error("No active API keys configured")]
    NoActiveKeys,
    #[error("Request failed: {0}")]
    RequestFailed(String),
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("API error {status}: {body}")]
    ApiError { status: u16, body: String },
    #[error("Still rate limited after {0} retries")]
    RateLimited(u32),
    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Why a lookup was not attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingDomain,
    InvalidDomain,
    InvalidLastName,
    Blacklisted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailLookup {
    Found { email: String, confidence: u32 },
    /// The finder returned an address but scored it under the threshold.
    BelowThreshold { email: String, confidence: u32 },
    NotFound,
    Skipped(SkipReason),
}

#[derive(Debug, Deserialize)]
struct FinderResponse {
    #[serde(default)]
    data: Option<FinderData>,
}

#[derive(Debug, Deserialize)]
struct FinderData {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    score: Option<u32>,
    #[serde(default)]
    emails_remaining: Option<i64>,
}

pub struct HunterClient {
    client: reqwest::Client,
    base_url: String,
    keys: KeyPool,
    confidence_threshold: u32,
    blacklist: Vec<String>,
    timeout: Duration,
    rate_limit_wait: Duration,
    max_rate_limit_retries: u32,
}

impl HunterClient {
    pub fn from_config(config: &EnrichmentConfig) -> Result<Self, HunterError> {
        let timeout = Duration::from_secs(config.request_timeout);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HunterError::RequestFailed(e.to_string()))?;
        let keys = KeyPool::from_config(&config.api_keys);

        log::info!(
            "Hunter: initialized with {} keys ({} active), confidence threshold {}%",
            keys.len(),
            keys.active_count(),
            config.email_confidence_threshold
        );

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            keys,
            confidence_threshold: config.email_confidence_threshold,
            blacklist: config.blacklist_domains.clone(),
            timeout,
            rate_limit_wait: Duration::from_secs(config.rate_limit_wait_secs),
            max_rate_limit_retries: config.max_rate_limit_retries,
        })
    }

    pub fn keys(&self) -> &KeyPool {
        &self.keys
    }

    pub fn confidence_threshold(&self) -> u32 {
        self.confidence_threshold
    }

    /// Local checks only; `None` means the lookup may go ahead.
    pub fn precheck(&self, last_name: &str, domain: &str) -> Option<SkipReason> {
        if domain.trim().is_empty() {
            return Some(SkipReason::MissingDomain);
        }
        if !is_valid_domain(domain) {
            log::debug!("Hunter: invalid domain format: {}", domain);
            return Some(SkipReason::InvalidDomain);
        }
        if !is_valid_last_name(last_name) {
            log::debug!("Hunter: invalid last name: '{}'", last_name);
            return Some(SkipReason::InvalidLastName);
        }
        if is_blacklisted(domain, &self.blacklist) {
            log::debug!("Hunter: skipping blacklisted domain: {}", domain);
            return Some(SkipReason::Blacklisted);
        }
        None
    }

    /// Look up the work email for `first_name last_name` at `domain`.
    pub async fn find_email(
        &mut self,
        first_name: &str,
        last_name: &str,
        domain: &str,
    ) -> Result<EmailLookup, HunterError> {
        if let Some(reason) = self.precheck(last_name, domain) {
            return Ok(EmailLookup::Skipped(reason));
        }

        let key_idx = self.keys.select().ok_or(HunterError::NoActiveKeys)?;
        let api_key = self
            .keys
            .key(key_idx)
            .map(|k| k.key.clone())
            .ok_or(HunterError::NoActiveKeys)?;
        log::debug!("Hunter: using key {}", key_idx + 1);
        log::info!("Hunter: searching {} {} @ {}", first_name, last_name, domain);

        let url = format!("{}/email-finder", self.base_url);
        let mut rate_limited = 0;
        let resp = loop {
            let resp = self
                .client
                .get(&url)
                .query(&[
                    ("api_key", api_key.as_str()),
                    ("domain", domain),
                    ("first_name", first_name),
                    ("last_name", last_name),
                ])
                .send()
                .await
                .map_err(|e| self.map_err(e))?;

            if resp.status().as_u16() != 429 {
                break resp;
            }
            if rate_limited >= self.max_rate_limit_retries {
                return Err(HunterError::RateLimited(rate_limited));
            }
            rate_limited += 1;
            log::warn!(
                "Hunter: rate limited, waiting {}s (retry {}/{})",
                self.rate_limit_wait.as_secs(),
                rate_limited,
                self.max_rate_limit_retries
            );
            tokio::time::sleep(self.rate_limit_wait).await;
        };

        let status = resp.status().as_u16();
        if status == 400 {
            let text = resp.text().await.unwrap_or_default();
            log::error!("Hunter: 400 Bad Request for {}: {}", domain, truncate(&text, 300));
            return Err(HunterError::BadRequest(truncate(&text, 300)));
        }
        if status != 200 && status != 201 {
            let text = resp.text().await.unwrap_or_default();
            log::warn!("Hunter: API error {}: {}", status, truncate(&text, 200));
            return Err(HunterError::ApiError {
                status,
                body: truncate(&text, 200),
            });
        }

        let body: FinderResponse = resp
            .json()
            .await
            .map_err(|e| HunterError::ParseError(e.to_string()))?;

        let Some(data) = body.data else {
            log::debug!("Hunter: no email found");
            return Ok(EmailLookup::NotFound);
        };
        let Some(email) = data.email.filter(|e| !e.trim().is_empty()) else {
            log::debug!("Hunter: no email in response data");
            return Ok(EmailLookup::NotFound);
        };
        let confidence = data.score.unwrap_or(0);

        if confidence < self.confidence_threshold {
            log::debug!(
                "Hunter: {} below threshold ({}% < {}%)",
                email,
                confidence,
                self.confidence_threshold
            );
            return Ok(EmailLookup::BelowThreshold { email, confidence });
        }

        log::info!("Hunter: found {} ({}%)", email, confidence);
        if let Some(remaining) = data.emails_remaining {
            self.keys.update_credits(key_idx, remaining);
            log::debug!("Hunter: key {} remaining: {}", key_idx + 1, remaining);
        }

        Ok(EmailLookup::Found { email, confidence })
    }

    fn map_err(&self, err: reqwest::Error) -> HunterError {
        if err.is_timeout() {
            log::warn!("Hunter: request timeout");
            HunterError::Timeout(self.timeout.as_secs())
        } else {
            log::warn!("Hunter: request failed: {}", err);
            HunterError::RequestFailed(err.to_string())
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
