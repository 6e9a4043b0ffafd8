//! One sheet sync run: load CSV → normalize → fetch sheet → plan → push.

use std::path::Path;

use serde::Serialize;

use super::dispatch::{dispatch, DispatchPolicy};
use super::fetch::fetch_remote_rows;
use super::normalize::{Clock, RowNormalizer, SystemClock};
use super::reconcile::reconcile;
use super::transport::{HttpTransport, SheetTransport};
use crate::config::Config;
use crate::error::PipelineError;
use crate::table::CsvTable;

/// Counts reported at the end of a sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub local_rows: usize,
    pub remote_rows: usize,
    pub inserts: usize,
    pub updates: usize,
    /// Rows the webhook accepted. This is the "rows synced" figure.
    pub delivered: usize,
    pub batches_dropped: usize,
    pub batches_skipped: usize,
}

pub struct SheetSync<T: SheetTransport, C: Clock = SystemClock> {
    transport: T,
    get_url: Option<String>,
    post_url: Option<String>,
    normalizer: RowNormalizer<C>,
    policy: DispatchPolicy,
}

impl SheetSync<HttpTransport, SystemClock> {
    /// Build a sync over HTTP from settings.
    pub fn from_config(config: &Config) -> Result<Self, PipelineError> {
        let transport = HttpTransport::new(config.google_sheets.post_timeout())?;
        log::info!("Sheet sync: initialized (GET and POST via webhook)");
        Ok(SheetSync::new(
            transport,
            config.get_endpoint().map(str::to_string),
            config.post_endpoint().map(str::to_string),
            RowNormalizer::new(&config.google_sheets.default_source),
            config.google_sheets.dispatch_policy(),
        ))
    }
}

impl<T: SheetTransport, C: Clock> SheetSync<T, C> {
    pub fn new(
        transport: T,
        get_url: Option<String>,
        post_url: Option<String>,
        normalizer: RowNormalizer<C>,
        policy: DispatchPolicy,
    ) -> Self {
        Self {
            transport,
            get_url,
            post_url,
            normalizer,
            policy,
        }
    }

    /// Sync the enriched CSV at `csv_path` into the sheet.
    ///
    /// A missing or empty CSV yields an all-zero report without touching the
    /// sheet. A CSV that exists but cannot be parsed is returned as an error.
    pub async fn sync(&self, csv_path: &Path) -> Result<SyncReport, PipelineError> {
        log::info!("Sheet sync: starting");

        let table = match CsvTable::read(csv_path) {
            Ok(t) => t,
            Err(PipelineError::InputNotFound(p)) => {
                log::error!("Sheet sync: {} not found", p.display());
                return Ok(SyncReport::default());
            }
            Err(e) => return Err(e),
        };
        log::info!("Sheet sync: loaded {} rows from {}", table.len(), csv_path.display());
        if table.is_empty() {
            log::warn!("Sheet sync: no local rows to sync");
            return Ok(SyncReport::default());
        }

        let local = self.normalizer.normalize_all(&table.records());
        log::info!("Sheet sync: normalized {} rows to sheet schema", local.len());

        let remote = fetch_remote_rows(&self.transport, self.get_url.as_deref()).await;
        let mut report = SyncReport {
            local_rows: local.len(),
            remote_rows: remote.len(),
            ..Default::default()
        };

        let changes = reconcile(local, &remote);
        report.inserts = changes.inserts();
        report.updates = changes.updates();
        if changes.is_empty() {
            log::info!("Sheet sync: nothing to push");
            return Ok(report);
        }

        let Some(post_url) = self.post_url.as_deref().filter(|u| !u.trim().is_empty()) else {
            log::warn!(
                "Sheet sync: no POST endpoint configured, {} planned rows not sent",
                changes.len()
            );
            return Ok(report);
        };

        let outcome = dispatch(&self.transport, post_url, &changes, &self.policy).await;
        report.delivered = outcome.delivered;
        report.batches_dropped = outcome.batches_dropped;
        report.batches_skipped = outcome.batches_skipped;

        log::info!("Sheet sync: complete, total rows sent: {}", report.delivered);
        Ok(report)
    }
}
