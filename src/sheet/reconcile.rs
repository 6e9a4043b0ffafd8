//! Upsert planning: match local rows against the sheet by email.
//!
//! Local rows with no sheet match (or no email at all) become inserts and are
//! sent as-is. Matched rows become updates carrying the local backend-owned
//! columns and the sheet's workflow-owned columns. Output order always equals
//! local order.

use std::collections::HashMap;

use super::row::CanonicalRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Update,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub kind: ChangeKind,
    pub row: CanonicalRow,
}

/// Ordered rows to push in one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub changes: Vec<Change>,
}

impl ChangeSet {
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn inserts(&self) -> usize {
        self.count(ChangeKind::Insert)
    }

    pub fn updates(&self) -> usize {
        self.count(ChangeKind::Update)
    }

    pub fn rows(&self) -> impl Iterator<Item = &CanonicalRow> {
        self.changes.iter().map(|c| &c.row)
    }

    fn count(&self, kind: ChangeKind) -> usize {
        self.changes.iter().filter(|c| c.kind == kind).count()
    }
}

/// Plan the upsert of `local` against the current sheet contents.
pub fn reconcile(local: Vec<CanonicalRow>, remote: &[CanonicalRow]) -> ChangeSet {
    if remote.is_empty() {
        log::info!("Sheet sync: sheet empty, all {} rows are new inserts", local.len());
        return ChangeSet {
            changes: local
                .into_iter()
                .map(|row| Change {
                    kind: ChangeKind::Insert,
                    row,
                })
                .collect(),
        };
    }

    // Later sheet rows overwrite earlier ones with the same key.
    let mut existing_by_email: HashMap<String, &CanonicalRow> = HashMap::new();
    for row in remote {
        let key = row.natural_key();
        if !key.is_empty() {
            existing_by_email.insert(key, row);
        }
    }

    let changes: Vec<Change> = local
        .into_iter()
        .map(|row| {
            let key = row.natural_key();
            match existing_by_email.get(key.as_str()) {
                Some(existing) if !key.is_empty() => Change {
                    kind: ChangeKind::Update,
                    row: row.merge_onto(existing),
                },
                _ => Change {
                    kind: ChangeKind::Insert,
                    row,
                },
            }
        })
        .collect();

    let plan = ChangeSet { changes };
    log::info!(
        "Sheet sync: upsert plan {} inserts, {} updates (by EMAIL)",
        plan.inserts(),
        plan.updates()
    );
    plan
}
