//! Monthly run: enrichment, then sheet sync.

use serde::Serialize;

use crate::config::Config;
use crate::enrich::{run_enrichment, EnrichmentReport};
use crate::error::PipelineError;
use crate::sheet::{SheetSync, SyncReport};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineReport {
    pub enrichment: EnrichmentReport,
    pub sync: SyncReport,
}

/// Run both stages. Sync reads whatever enrichment wrote to
/// `enrichment.output_csv`.
pub async fn run_pipeline(config: &Config) -> Result<PipelineReport, PipelineError> {
    let enrichment = run_enrichment(&config.enrichment).await?;

    let sync = SheetSync::from_config(config)?;
    let sync = sync.sync(&config.enrichment.output_csv).await?;

    log::info!(
        "Pipeline: complete ({} emails exported, {} rows synced, {} inserts, {} updates)",
        enrichment.exported,
        sync.delivered,
        sync.inserts,
        sync.updates
    );
    if sync.delivered == 0 {
        log::warn!("Pipeline: no rows were synced to the sheet");
    }

    Ok(PipelineReport { enrichment, sync })
}
