//! Lead extraction from search-result listings.
//!
//! Search results for public profiles carry the person in the title
//! ("Jane Doe - Acme | LinkedIn") and the role in the snippet
//! ("Head of Data at Acme - ..."). These helpers turn that into the
//! scraper CSV consumed by enrichment, minus leads the sheet already has.
//! Fetching the results is not done here.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::sheet::CanonicalRow;
use crate::table::CsvTable;

/// Company name fragment → mail domain, checked in order.
const KNOWN_DOMAINS: &[(&str, &str)] = &[
    ("google", "google.com"),
    ("apple", "apple.com"),
    ("microsoft", "microsoft.com"),
    ("amazon", "amazon.com"),
    ("meta", "meta.com"),
    ("facebook", "facebook.com"),
    ("tesla", "tesla.com"),
    ("netflix", "netflix.com"),
    ("uber", "uber.com"),
    ("airbnb", "airbnb.com"),
    ("spotify", "spotify.com"),
    ("nvidia", "nvidia.com"),
    ("openai", "openai.com"),
    ("anthropic", "anthropic.com"),
    ("stripe", "stripe.com"),
    ("databricks", "databricks.com"),
    ("huggingface", "huggingface.co"),
    ("palantir", "palantir.com"),
    ("figma", "figma.com"),
    ("notion", "notion.com"),
    ("slack", "slack.com"),
    ("discord", "discord.com"),
    ("twilio", "twilio.com"),
    ("canva", "canva.com"),
    ("superhuman", "superhuman.com"),
    ("perplexity", "perplexity.ai"),
    ("together", "together.ai"),
    ("uoft", "uoft.ca"),
    ("columbia", "columbia.edu"),
    ("stanford", "stanford.edu"),
    ("berkeley", "berkeley.edu"),
    ("scale", "scale.com"),
];

pub const PROFILE_URL_MARKER: &str = "linkedin.com/in/";

pub const SCRAPER_COLUMNS: [&str; 6] = [
    "first_name",
    "last_name",
    "job_title",
    "company",
    "domain",
    "linkedin_url",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedProfile {
    pub first_name: String,
    pub last_name: String,
    pub job_title: String,
    pub company: String,
    pub domain: String,
    pub linkedin_url: String,
}

/// One organic search hit.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub link: String,
}

#[derive(Debug, Default, Deserialize)]
struct SearchPage {
    #[serde(default)]
    organic_results: Vec<SearchResult>,
}

fn corporate_suffix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\b(inc|ltd|llc|corp|co|labs|systems|tech|ai|io|dev|app|cloud|data|research)\b.*$",
        )
        .expect("static regex")
    })
}

fn non_alphanumeric() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-z0-9]").expect("static regex"))
}

/// First and last name from a result title.
///
/// The title is cut at the first `|` and then at the first ` - `; the first
/// two words are the name.
pub fn extract_name_from_title(title: &str) -> (Option<String>, Option<String>) {
    let before_pipe = title.split('|').next().unwrap_or("");
    let cleaned = before_pipe.split(" - ").next().unwrap_or("").trim();
    let mut parts = cleaned.split_whitespace();
    let first = parts.next().map(str::to_string);
    let last = parts.next().map(str::to_string);
    (first, last)
}

/// Best-guess mail domain for a company name.
pub fn extract_domain_from_company(company: &str) -> Option<String> {
    if company.chars().count() < 2 {
        return None;
    }
    let lowered = company.to_lowercase().replace([',', '.'], "");
    let lowered = lowered.trim();

    if let Some((_, domain)) = KNOWN_DOMAINS.iter().find(|(key, _)| lowered.contains(key)) {
        return Some(domain.to_string());
    }

    let first_word = lowered.split_whitespace().next()?;
    let stripped = corporate_suffix().replace(first_word, "");
    let cleaned = non_alphanumeric().replace_all(stripped.trim(), "");
    if cleaned.chars().count() > 2 {
        Some(format!("{}.com", cleaned))
    } else {
        None
    }
}

/// Split "Role at Company - extra | extra" into (role, company).
pub fn split_role_company(snippet: &str) -> (String, String) {
    let mut parts = snippet.split(" at ");
    let (Some(role), Some(rest)) = (parts.next(), parts.next()) else {
        return (String::new(), String::new());
    };
    let company = rest
        .split(" - ")
        .next()
        .unwrap_or("")
        .split(" | ")
        .next()
        .unwrap_or("")
        .trim();
    (role.trim().to_string(), company.to_string())
}

/// A lead from one search hit, or `None` if it lacks a profile link, a full
/// name, or a derivable domain.
pub fn parse_search_result(result: &SearchResult) -> Option<ScrapedProfile> {
    if !result.link.contains(PROFILE_URL_MARKER) {
        return None;
    }
    let (first, last) = extract_name_from_title(&result.title);
    let (first_name, last_name) = (first?, last?);
    let (job_title, company) = split_role_company(&result.snippet);
    let domain = extract_domain_from_company(&company)?;

    Some(ScrapedProfile {
        first_name,
        last_name,
        job_title,
        company,
        domain,
        linkedin_url: result.link.clone(),
    })
}

/// Parse search result pages (one page object, or an array of them) into
/// leads, keeping the first hit per profile URL.
pub fn profiles_from_search_json(json: &str) -> Result<Vec<ScrapedProfile>, serde_json::Error> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let pages: Vec<SearchPage> = match value {
        serde_json::Value::Array(_) => serde_json::from_value(value)?,
        other => vec![serde_json::from_value(other)?],
    };

    let mut seen = HashSet::new();
    let profiles = pages
        .iter()
        .flat_map(|p| p.organic_results.iter())
        .filter_map(parse_search_result)
        .filter(|p| seen.insert(p.linkedin_url.clone()))
        .collect();
    Ok(profiles)
}

/// Scraper CSV layout expected by the enrichment stage.
pub fn profiles_to_table(profiles: &[ScrapedProfile]) -> CsvTable {
    let mut table = CsvTable::new(SCRAPER_COLUMNS.iter().map(|c| c.to_string()).collect());
    for p in profiles {
        table.rows.push(vec![
            p.first_name.clone(),
            p.last_name.clone(),
            p.job_title.clone(),
            p.company.clone(),
            p.domain.clone(),
            p.linkedin_url.clone(),
        ]);
    }
    table
}

/// Drop rows already present in the sheet, matched by email or by
/// lowercased "first last" against the sheet's EMAIL and NAME columns.
/// Returns how many rows were removed.
pub fn dedup_against_sheet(table: &mut CsvTable, sheet: &[CanonicalRow]) -> usize {
    if sheet.is_empty() {
        log::info!("Profiles: no sheet rows to compare, skipping sheet dedup");
        return 0;
    }

    let sheet_emails: HashSet<String> = sheet
        .iter()
        .map(CanonicalRow::natural_key)
        .filter(|k| !k.is_empty())
        .collect();
    let sheet_names: HashSet<String> = sheet
        .iter()
        .map(|r| r.name.trim().to_lowercase())
        .filter(|n| !n.is_empty())
        .collect();

    let before = table.len();
    table.retain_rows(|t, i| {
        let email = t.get(i, "email").trim().to_lowercase();
        if !email.is_empty() && sheet_emails.contains(&email) {
            return false;
        }
        let full_name = format!("{} {}", t.get(i, "first_name").trim(), t.get(i, "last_name").trim())
            .trim()
            .to_lowercase();
        full_name.is_empty() || !sheet_names.contains(&full_name)
    });

    let removed = before - table.len();
    log::info!(
        "Profiles: sheet dedup {} -> {} (removed {})",
        before,
        table.len(),
        removed
    );
    removed
}
