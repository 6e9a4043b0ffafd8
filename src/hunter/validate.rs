//! Pre-flight checks that avoid spending finder credits on hopeless lookups.

/// Throwaway mailbox providers; always skipped.
pub const DISPOSABLE_DOMAINS: &[&str] = &[
    "wizard.com",
    "tempmail.com",
    "guerrillamail.com",
    "mailinator.com",
    "10minutemail.com",
    "throwaway.email",
    "fakeinbox.com",
    "temp-mail.org",
    "yopmail.com",
    "maildrop.cc",
    "trashmail.com",
    "sharklasers.com",
];

/// Needs a non-empty first label and an alphabetic TLD of two or more
/// characters, e.g. `stripe.io`.
pub fn is_valid_domain(domain: &str) -> bool {
    let domain = domain.trim().to_lowercase();
    if domain.is_empty() || !domain.contains('.') {
        return false;
    }
    let parts: Vec<&str> = domain.split('.').collect();
    let Some(tld) = parts.last() else {
        return false;
    };
    if tld.len() < 2 || !tld.chars().all(|c| c.is_alphabetic()) {
        return false;
    }
    !parts[0].is_empty()
}

/// Initials such as "W." are rejected by the finder.
pub fn is_valid_last_name(last_name: &str) -> bool {
    last_name.replace('.', "").trim().chars().count() >= 2
}

/// Suffix match against the configured blacklist plus disposable providers.
pub fn is_blacklisted(domain: &str, blacklist: &[String]) -> bool {
    let domain = domain.trim().to_lowercase();
    blacklist
        .iter()
        .map(|d| d.trim().to_lowercase())
        .filter(|d| !d.is_empty())
        .any(|d| domain.ends_with(&d))
        || DISPOSABLE_DOMAINS.iter().any(|d| domain.ends_with(d))
}
