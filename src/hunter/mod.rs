//! Hunter.io email finder integration.
//!
//! Finds a work address from first name, last name and company domain.
//! Lookups are validated locally first so credits are not spent on
//! malformed domains, initials-only surnames or free-mail providers.

pub mod client;
pub mod keys;
pub mod validate;

pub use client::{EmailLookup, HunterClient, HunterError, SkipReason};
pub use keys::{ApiKey, KeyPool};
