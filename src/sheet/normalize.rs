//! Map enriched CSV records onto the sheet schema.

use chrono::{DateTime, Utc};

use super::row::{CanonicalRow, DEFAULT_STATUS};
use crate::table::RawRecord;

/// Source label used when a record does not say where it came from.
pub const DEFAULT_SOURCE: &str = "Hunter.io";

/// Columns that may carry the profile URL written to NOTES, first match wins.
const PROFILE_URL_KEYS: &[&str] = &["linkedin_url", "profile_url"];

/// Time source for the DATE column.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always reports the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub struct RowNormalizer<C: Clock = SystemClock> {
    default_source: String,
    clock: C,
}

impl RowNormalizer<SystemClock> {
    pub fn new(default_source: &str) -> Self {
        Self::with_clock(default_source, SystemClock)
    }
}

impl<C: Clock> RowNormalizer<C> {
    pub fn with_clock(default_source: &str, clock: C) -> Self {
        Self {
            default_source: default_source.to_string(),
            clock,
        }
    }

    pub fn normalize(&self, record: &RawRecord) -> CanonicalRow {
        let source = match field(record, "source") {
            "" => self.default_source.clone(),
            s => s.to_string(),
        };
        let date = match field(record, "date") {
            "" => self.clock.now().to_rfc3339(),
            d => d.to_string(),
        };
        let notes = PROFILE_URL_KEYS
            .iter()
            .map(|key| field(record, key))
            .find(|v| !v.is_empty())
            .unwrap_or("");

        CanonicalRow {
            name: build_name(record),
            email: field(record, "email").to_string(),
            role: field(record, "job_title").to_string(),
            company: field(record, "company").to_string(),
            source,
            date,
            status: DEFAULT_STATUS.to_string(),
            template_used: String::new(),
            notes: notes.to_string(),
        }
    }

    pub fn normalize_all(&self, records: &[RawRecord]) -> Vec<CanonicalRow> {
        records.iter().map(|r| self.normalize(r)).collect()
    }
}

fn field<'a>(record: &'a RawRecord, key: &str) -> &'a str {
    record.get(key).map(|v| v.trim()).unwrap_or("")
}

fn build_name(record: &RawRecord) -> String {
    let first = field(record, "first_name");
    let last = field(record, "last_name");
    if !first.is_empty() || !last.is_empty() {
        return format!("{} {}", first, last).trim().to_string();
    }
    field(record, "name").to_string()
}
