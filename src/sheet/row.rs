//! Canonical sheet row and column ownership.
//!
//! Every column belongs to exactly one owner. Backend-owned columns are
//! rewritten on each sync; workflow-owned columns are written only when a row
//! is first created and are copied back from the sheet on every later sync.

use serde::{Deserialize, Deserializer, Serialize};

/// Default STATUS for a newly created row.
pub const DEFAULT_STATUS: &str = "Pending";

/// Who is authoritative for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// Written by this pipeline on every sync.
    Backend,
    /// Written by the outreach workflow; preserved once the row exists.
    Workflow,
}

/// A sheet column, in sheet order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Email,
    Role,
    Company,
    Source,
    Date,
    Status,
    TemplateUsed,
    Notes,
}

impl Field {
    pub const ALL: [Field; 9] = [
        Field::Name,
        Field::Email,
        Field::Role,
        Field::Company,
        Field::Source,
        Field::Date,
        Field::Status,
        Field::TemplateUsed,
        Field::Notes,
    ];

    /// Column header exactly as it appears in the sheet.
    pub fn header(self) -> &'static str {
        match self {
            Field::Name => "NAME",
            Field::Email => "EMAIL",
            Field::Role => "ROLE",
            Field::Company => "COMPANY",
            Field::Source => "SOURCE",
            Field::Date => "DATE",
            Field::Status => "STATUS",
            Field::TemplateUsed => "TEMPLATE USED",
            Field::Notes => "NOTES",
        }
    }

    pub fn ownership(self) -> Ownership {
        match self {
            Field::Name
            | Field::Email
            | Field::Role
            | Field::Company
            | Field::Source
            | Field::Date
            | Field::Notes => Ownership::Backend,
            Field::Status | Field::TemplateUsed => Ownership::Workflow,
        }
    }
}

/// One row of the outreach sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRow {
    #[serde(rename = "NAME", default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(rename = "EMAIL", default, deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(rename = "ROLE", default, deserialize_with = "lenient_string")]
    pub role: String,
    #[serde(rename = "COMPANY", default, deserialize_with = "lenient_string")]
    pub company: String,
    #[serde(rename = "SOURCE", default, deserialize_with = "lenient_string")]
    pub source: String,
    #[serde(rename = "DATE", default, deserialize_with = "lenient_string")]
    pub date: String,
    #[serde(rename = "STATUS", default, deserialize_with = "lenient_string")]
    pub status: String,
    #[serde(rename = "TEMPLATE USED", default, deserialize_with = "lenient_string")]
    pub template_used: String,
    #[serde(rename = "NOTES", default, deserialize_with = "lenient_string")]
    pub notes: String,
}

impl CanonicalRow {
    /// Build a row by asking `value` for every column.
    pub fn from_fn(mut value: impl FnMut(Field) -> String) -> Self {
        Self {
            name: value(Field::Name),
            email: value(Field::Email),
            role: value(Field::Role),
            company: value(Field::Company),
            source: value(Field::Source),
            date: value(Field::Date),
            status: value(Field::Status),
            template_used: value(Field::TemplateUsed),
            notes: value(Field::Notes),
        }
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Email => &self.email,
            Field::Role => &self.role,
            Field::Company => &self.company,
            Field::Source => &self.source,
            Field::Date => &self.date,
            Field::Status => &self.status,
            Field::TemplateUsed => &self.template_used,
            Field::Notes => &self.notes,
        }
    }

    /// Dedup key: trimmed, lowercased email. Empty when the row has no email.
    pub fn natural_key(&self) -> String {
        self.email.trim().to_lowercase()
    }

    /// New row taking backend-owned columns from `self` and workflow-owned
    /// columns from the existing sheet row.
    pub fn merge_onto(&self, existing: &CanonicalRow) -> CanonicalRow {
        CanonicalRow::from_fn(|field| match field.ownership() {
            Ownership::Backend => self.get(field).to_owned(),
            Ownership::Workflow => existing.get(field).to_owned(),
        })
    }
}

/// Sheet cells come back as strings, numbers, booleans or null depending on
/// how the column was formatted. Everything is kept as text.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s,
        Some(other) => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(email: &str, name: &str, status: &str) -> CanonicalRow {
        CanonicalRow {
            email: email.to_string(),
            name: name.to_string(),
            status: status.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_every_field_has_one_owner() {
        let workflow: Vec<Field> = Field::ALL
            .iter()
            .copied()
            .filter(|f| f.ownership() == Ownership::Workflow)
            .collect();
        assert_eq!(workflow, vec![Field::Status, Field::TemplateUsed]);
        assert_eq!(
            Field::ALL
                .iter()
                .filter(|f| f.ownership() == Ownership::Backend)
                .count(),
            7
        );
    }

    #[test]
    fn test_headers_in_sheet_order() {
        let headers: Vec<&str> = Field::ALL.iter().map(|f| f.header()).collect();
        assert_eq!(
            headers,
            vec![
                "NAME",
                "EMAIL",
                "ROLE",
                "COMPANY",
                "SOURCE",
                "DATE",
                "STATUS",
                "TEMPLATE USED",
                "NOTES"
            ]
        );
    }

    #[test]
    fn test_natural_key_trims_and_lowercases() {
        assert_eq!(row("  Ada@X.com ", "", "").natural_key(), "ada@x.com");
        assert_eq!(row("   ", "", "").natural_key(), "");
    }

    #[test]
    fn test_merge_onto_takes_workflow_fields_from_existing() {
        let mut local = row("a@x.com", "New Name", "Pending");
        local.template_used = "".to_string();
        local.notes = "https://linkedin.com/in/new".to_string();
        let mut existing = row("A@X.com", "Old Name", "Replied");
        existing.template_used = "intro-v2".to_string();
        existing.notes = "old".to_string();

        let merged = local.merge_onto(&existing);
        assert_eq!(merged.name, "New Name");
        assert_eq!(merged.email, "a@x.com");
        assert_eq!(merged.notes, "https://linkedin.com/in/new");
        assert_eq!(merged.status, "Replied");
        assert_eq!(merged.template_used, "intro-v2");
        // inputs untouched
        assert_eq!(local.status, "Pending");
        assert_eq!(existing.name, "Old Name");
    }

    #[test]
    fn test_serializes_with_sheet_headers() {
        let value = serde_json::to_value(row("a@x.com", "A", "Pending")).unwrap();
        assert_eq!(value["EMAIL"], "a@x.com");
        assert_eq!(value["TEMPLATE USED"], "");
        assert_eq!(value.as_object().unwrap().len(), 9);
    }

    #[test]
    fn test_deserialize_is_lenient() {
        let json = r#"{"NAME": "A", "EMAIL": null, "DATE": 45123, "STATUS": true, "EXTRA": "x"}"#;
        let parsed: CanonicalRow = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.name, "A");
        assert_eq!(parsed.email, "");
        assert_eq!(parsed.date, "45123");
        assert_eq!(parsed.status, "true");
        assert_eq!(parsed.template_used, "");
    }
}
