//! Discovery index: a derived tag, language and ranking index for ledger content.
//!
//! As committed operations replay (post creation, votes, reward payouts,
//! deletion), the index keeps one tag entry per classification of every
//! content item still inside its payout window, rolls those entries up into
//! per-tag and per-author totals, and scores them for hot and trending
//! listings. Discovery queries filter content by the same tag metadata.

pub mod cli;
pub mod engine;
pub mod index;
pub mod store;
pub mod types;

// Re-export commonly used types at the crate root
pub use engine::{
    extract_metadata, ContentMetadata, DiscoveryQuery, DiscoverySort, IndexContext,
    IndexMaintainer, MaintenanceReport, OperationDispatcher, QueryEngine, SharedIndex,
};
pub use index::{ConsistencyReport, DiscoveryIndex, Drift, IndexSnapshot, StatsIndex, TagIndex};
pub use store::{ContentStore, MemoryContentStore};
pub use types::{
    now_secs, AuthorTagStats, Content, ContentBuilder, ContentId, EntryId, IndexConfig,
    IndexError, IndexResult, LanguageEntry, Operation, ScoreParams, TagEntry, TagStats, TagType,
    MAX_QUERY_LIMIT,
};
