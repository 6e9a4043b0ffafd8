//! Command-line interface for the `leadsync` binary.
//!
//! ## Commands
//!
//! - `leadsync sync` - Upsert the enriched CSV into the outreach sheet
//! - `leadsync enrich` - Find work emails for scraped profiles
//! - `leadsync run` - Enrichment followed by sync
//! - `leadsync profiles` - Turn saved search results into the scraper CSV

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

use crate::config::{load_config, Config};
use crate::enrich::run_enrichment;
use crate::error::PipelineError;
use crate::pipeline::run_pipeline;
use crate::profile::{dedup_against_sheet, profiles_from_search_json, profiles_to_table};
use crate::sheet::fetch::fetch_remote_rows;
use crate::sheet::transport::HttpTransport;
use crate::sheet::{CanonicalRow, SheetSync};

/// Lead pipeline: enrich scraped profiles and sync them to the outreach sheet.
#[derive(Debug, Parser)]
#[command(name = "leadsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Settings file. Defaults to config/settings.yaml, then ~/.leadsync/settings.yaml.
    #[arg(long, global = true, env = "LEADSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Upsert the enriched CSV into the outreach sheet.
    Sync(SyncArgs),
    /// Find work emails for scraped profiles.
    Enrich,
    /// Enrichment followed by sync.
    Run,
    /// Convert saved search results to the scraper CSV.
    Profiles(ProfilesArgs),
}

#[derive(Debug, Args)]
pub struct SyncArgs {
    /// CSV to sync instead of google_sheets.input_csv.
    #[arg(long)]
    pub csv: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ProfilesArgs {
    /// JSON file with one results page or an array of pages.
    #[arg(long)]
    pub results: PathBuf,

    /// Output CSV. Defaults to enrichment.input_csv.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

impl Cli {
    pub fn load_config(&self) -> Result<Config, PipelineError> {
        load_config(self.config.as_deref())
    }
}

/// Run one command to completion.
pub async fn execute(command: Commands, config: &Config) -> Result<(), PipelineError> {
    match command {
        Commands::Sync(args) => {
            let csv = args.csv.unwrap_or_else(|| config.google_sheets.input_csv.clone());
            let report = SheetSync::from_config(config)?.sync(&csv).await?;
            log::info!(
                "Sheet sync: complete ({} rows synced, {} inserts, {} updates)",
                report.delivered,
                report.inserts,
                report.updates
            );
        }
        Commands::Enrich => {
            run_enrichment(&config.enrichment).await?;
        }
        Commands::Run => {
            run_pipeline(config).await?;
        }
        Commands::Profiles(args) => {
            let out = args.out.unwrap_or_else(|| config.enrichment.input_csv.clone());
            let sheet_rows = match config.get_endpoint() {
                Some(url) => {
                    let transport = HttpTransport::new(config.google_sheets.post_timeout())?;
                    fetch_remote_rows(&transport, Some(url)).await
                }
                None => {
                    log::info!("Profiles: no sheet endpoint configured, skipping sheet dedup");
                    Vec::new()
                }
            };
            write_profiles(&args.results, &out, &sheet_rows)?;
        }
    }
    Ok(())
}

/// Write the scraper CSV for `results`, leaving out leads already in the sheet.
fn write_profiles(
    results: &Path,
    out: &Path,
    sheet_rows: &[CanonicalRow],
) -> Result<usize, PipelineError> {
    if !results.exists() {
        return Err(PipelineError::InputNotFound(results.to_path_buf()));
    }
    let json = std::fs::read_to_string(results)?;
    let profiles = profiles_from_search_json(&json)
        .map_err(|e| PipelineError::MalformedResponse(format!("search results: {}", e)))?;
    let mut table = profiles_to_table(&profiles);
    dedup_against_sheet(&mut table, sheet_rows);
    table.write(out)?;
    log::info!("Profiles: wrote {} profiles to {}", table.len(), out.display());
    Ok(table.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::CsvTable;

    #[test]
    fn test_parse_sync_with_csv() {
        let cli = Cli::parse_from(["leadsync", "--config", "s.yaml", "sync", "--csv", "x.csv"]);
        assert_eq!(cli.config, Some(PathBuf::from("s.yaml")));
        match cli.command {
            Commands::Sync(args) => assert_eq!(args.csv, Some(PathBuf::from("x.csv"))),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_config_flag_after_subcommand() {
        let cli = Cli::parse_from(["leadsync", "run", "--config", "s.yaml"]);
        assert!(matches!(cli.command, Commands::Run));
        assert_eq!(cli.config, Some(PathBuf::from("s.yaml")));
    }

    #[test]
    fn test_profiles_requires_results() {
        assert!(Cli::try_parse_from(["leadsync", "profiles"]).is_err());
    }

    #[test]
    fn test_write_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let results = dir.path().join("results.json");
        let out = dir.path().join("data").join("scraper_output.csv");
        std::fs::write(
            &results,
            r#"{"organic_results": [{"title": "Sam Lee | LinkedIn", "snippet": "PM at Figma", "link": "https://linkedin.com/in/sl"}]}"#,
        )
        .unwrap();

        assert_eq!(write_profiles(&results, &out, &[]).unwrap(), 1);
        let table = CsvTable::read(&out).unwrap();
        assert_eq!(table.get(0, "domain"), "figma.com");
    }

    #[test]
    fn test_write_profiles_skips_leads_in_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let results = dir.path().join("results.json");
        let out = dir.path().join("scraper_output.csv");
        std::fs::write(
            &results,
            r#"{"organic_results": [
                {"title": "Sam Lee | LinkedIn", "snippet": "PM at Figma", "link": "https://linkedin.com/in/sl"},
                {"title": "Jane Doe", "snippet": "CTO at Stripe", "link": "https://linkedin.com/in/jd"}
            ]}"#,
        )
        .unwrap();
        let sheet = [CanonicalRow {
            name: "sam lee".into(),
            email: "sam@figma.com".into(),
            ..Default::default()
        }];

        assert_eq!(write_profiles(&results, &out, &sheet).unwrap(), 1);
        let table = CsvTable::read(&out).unwrap();
        assert_eq!(table.get(0, "first_name"), "Jane");
    }

    #[test]
    fn test_write_profiles_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let results = dir.path().join("results.json");
        std::fs::write(&results, "not json").unwrap();
        let err = write_profiles(&results, &dir.path().join("out.csv"), &[]).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedResponse(_)));
    }
}
