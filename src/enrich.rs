//! Enrichment stage: scraper CSV in, rows with work emails out.
//!
//! Rows are processed in file order. Rows that already carry an email count
//! toward the monthly cap and are never looked up again, so re-running the
//! stage on its own output spends no credits.

use std::path::Path;
use std::time::Duration;

use serde::Serialize;

use crate::config::EnrichmentConfig;
use crate::error::PipelineError;
use crate::hunter::{EmailLookup, HunterClient, SkipReason};
use crate::profile::{extract_domain_from_company, extract_name_from_title};
use crate::table::CsvTable;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentReport {
    pub input_rows: usize,
    /// Rows holding an email after the run, including ones that already had one.
    pub enriched: usize,
    pub found: usize,
    /// Missing fields, blacklisted domains, misses and failed lookups.
    pub skipped: usize,
    pub invalid_domains: usize,
    pub invalid_names: usize,
    pub cap_reached: bool,
    /// Rows written to the output CSV.
    pub exported: usize,
}

/// Run enrichment with settings from `config`.
pub async fn run_enrichment(config: &EnrichmentConfig) -> Result<EnrichmentReport, PipelineError> {
    log::info!("Enrichment: starting");
    if config.api_keys.is_empty() {
        log::error!("Enrichment: no finder API keys configured under enrichment.api_keys");
        return Ok(EnrichmentReport::default());
    }

    let mut client = HunterClient::from_config(config)
        .map_err(|e| PipelineError::ConfigurationError(e.to_string()))?;
    for (i, masked) in client.keys().masked().iter().enumerate() {
        if let Some(key) = client.keys().key(i) {
            log::info!(
                "Enrichment: key {}: {} ({} credits) {}",
                i + 1,
                if key.active { "active" } else { "inactive" },
                key.credits,
                masked
            );
        }
    }

    enrich_csv(
        &mut client,
        &config.input_csv,
        &config.output_csv,
        config.monthly_email_cap,
        Duration::from_millis(config.request_delay_ms),
    )
    .await
}

/// Enrich `input` and write rows with an email to `output`.
///
/// A missing or empty input yields an empty report and writes nothing.
pub async fn enrich_csv(
    client: &mut HunterClient,
    input: &Path,
    output: &Path,
    email_cap: usize,
    request_delay: Duration,
) -> Result<EnrichmentReport, PipelineError> {
    let mut table = match CsvTable::read(input) {
        Ok(t) => t,
        Err(PipelineError::InputNotFound(p)) => {
            log::error!("Enrichment: {} not found", p.display());
            return Ok(EnrichmentReport::default());
        }
        Err(e) => return Err(e),
    };
    if table.is_empty() {
        log::warn!("Enrichment: {} has no rows", input.display());
        return Ok(EnrichmentReport::default());
    }

    log::info!(
        "Enrichment: {} rows, cap {}, confidence threshold {}%",
        table.len(),
        email_cap,
        client.confidence_threshold()
    );
    table.ensure_column("email");
    table.ensure_column("confidence");

    let mut report = EnrichmentReport {
        input_rows: table.len(),
        ..Default::default()
    };
    let mut looked_up = false;

    for idx in 0..table.len() {
        if !table.get(idx, "email").trim().is_empty() {
            log::debug!("Enrichment: [{}] already has email", idx + 1);
            report.enriched += 1;
            continue;
        }
        if report.enriched >= email_cap {
            log::info!("Enrichment: reached email cap ({}), stopping", email_cap);
            report.cap_reached = true;
            break;
        }

        fill_missing_fields(&mut table, idx);
        let first_name = table.get(idx, "first_name").trim().to_string();
        let last_name = table.get(idx, "last_name").trim().to_string();
        let domain = table.get(idx, "domain").trim().to_string();

        if first_name.is_empty() || last_name.is_empty() {
            log::debug!("Enrichment: [{}] skipping, missing name", idx + 1);
            report.skipped += 1;
            continue;
        }

        if looked_up && !request_delay.is_zero() {
            tokio::time::sleep(request_delay).await;
        }

        let lookup = match client.find_email(&first_name, &last_name, &domain).await {
            Ok(lookup) => lookup,
            Err(e) => {
                log::warn!("Enrichment: [{}] lookup failed: {}", idx + 1, e);
                looked_up = true;
                report.skipped += 1;
                continue;
            }
        };

        match lookup {
            EmailLookup::Found { email, confidence } => {
                log::info!(
                    "Enrichment: [{}] {} {} -> {} ({}%)",
                    idx + 1,
                    first_name,
                    last_name,
                    email,
                    confidence
                );
                table.set(idx, "email", email);
                table.set(idx, "confidence", confidence.to_string());
                report.found += 1;
                report.enriched += 1;
                looked_up = true;
            }
            EmailLookup::BelowThreshold { .. } | EmailLookup::NotFound => {
                log::debug!(
                    "Enrichment: [{}] {} {} @ {}: no email found",
                    idx + 1,
                    first_name,
                    last_name,
                    domain
                );
                report.skipped += 1;
                looked_up = true;
            }
            EmailLookup::Skipped(SkipReason::InvalidDomain) => report.invalid_domains += 1,
            EmailLookup::Skipped(SkipReason::InvalidLastName) => report.invalid_names += 1,
            EmailLookup::Skipped(SkipReason::MissingDomain | SkipReason::Blacklisted) => {
                report.skipped += 1
            }
        }
    }

    log::info!(
        "Enrichment: {} emails found, {} skipped, {} invalid domains, {} invalid names",
        report.enriched,
        report.skipped,
        report.invalid_domains,
        report.invalid_names
    );

    table.retain_rows(|t, i| !t.get(i, "email").trim().is_empty());
    table.write(output)?;
    report.exported = table.len();
    log::info!("Enrichment: exported {} rows to {}", report.exported, output.display());
    if report.exported == 0 {
        log::warn!("Enrichment: no emails found, sheet sync will have nothing to push");
    }

    Ok(report)
}

/// Derive first/last name from `name` and domain from `company` when the
/// scraper left them blank.
fn fill_missing_fields(table: &mut CsvTable, idx: usize) {
    let first_blank = table.get(idx, "first_name").trim().is_empty();
    let last_blank = table.get(idx, "last_name").trim().is_empty();
    if first_blank || last_blank {
        let (first, last) = extract_name_from_title(table.get(idx, "name"));
        if let (true, Some(first)) = (first_blank, first) {
            table.set(idx, "first_name", first);
        }
        if let (true, Some(last)) = (last_blank, last) {
            table.set(idx, "last_name", last);
        }
    }

    if table.get(idx, "domain").trim().is_empty() {
        if let Some(domain) = extract_domain_from_company(table.get(idx, "company")) {
            log::debug!("Enrichment: [{}] derived domain {}", idx + 1, domain);
            table.set(idx, "domain", domain);
        }
    }
}
