//! All data types for the discovery index.

pub mod config;
pub mod content;
pub mod error;
pub mod operation;
pub mod tag;

pub use config::{IndexConfig, ScoreParams};
pub use content::{Content, ContentBuilder};
pub use error::{IndexError, IndexResult};
pub use operation::Operation;
pub use tag::{AuthorTagStats, EntryId, LanguageEntry, Score, TagEntry, TagStats, TagType};

/// Ledger-assigned content identifier.
pub type ContentId = u64;

/// Account name of an author or voter.
pub type AccountName = String;

/// Monetary amount in the smallest asset unit.
pub type Amount = u64;

/// Maximum number of results a single discovery query may request.
pub const MAX_QUERY_LIMIT: u32 = 100;

/// Returns the current time truncated to whole seconds.
pub fn now_secs() -> chrono::DateTime<chrono::Utc> {
    let now = chrono::Utc::now();
    chrono::DateTime::from_timestamp(now.timestamp(), 0).unwrap_or(now)
}
