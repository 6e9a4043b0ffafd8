//! Outreach sheet sync over an Apps Script webhook.
//!
//! Loads the enriched lead CSV, maps it to the sheet columns, reads what the
//! sheet already holds, and upserts by email. STATUS and TEMPLATE USED belong
//! to the outreach workflow and are only written for brand-new rows.

pub mod dispatch;
pub mod fetch;
pub mod normalize;
pub mod reconcile;
pub mod row;
pub mod sync;
pub mod transport;

pub use reconcile::{reconcile, ChangeKind, ChangeSet};
pub use row::{CanonicalRow, Field, Ownership};
pub use sync::{SheetSync, SyncReport};
