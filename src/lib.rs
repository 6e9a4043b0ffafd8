//! leadsync: scraped profiles in, enriched leads upserted into an outreach sheet.
//!
//! Stages run in order and hand off through CSV files:
//! - [`profile`]: search results to the scraper CSV
//! - [`enrich`]: work emails via the [`hunter`] finder
//! - [`sheet`]: reconcile against the sheet and push batches

pub mod cli;
pub mod config;
pub mod enrich;
pub mod error;
pub mod hunter;
pub mod pipeline;
pub mod profile;
pub mod sheet;
pub mod table;

pub use error::PipelineError;
