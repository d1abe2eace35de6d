//! Error types for the discovery index.

use thiserror::Error;

use super::tag::TagType;
use super::ContentId;

/// All errors that can occur while maintaining or querying the discovery index.
#[derive(Error, Debug)]
pub enum IndexError {
    /// Query asks for more rows than a single request may return.
    #[error("Query limit {limit} exceeds maximum {max}")]
    QueryLimitExceeded { limit: u32, max: u32 },

    /// A name is both selected and filtered in the same dimension.
    #[error("'{name}' is both selected and filtered in {dimension}")]
    SelectFilterOverlap {
        dimension: &'static str,
        name: String,
    },

    /// Content looked up by author/permlink does not exist.
    #[error("Content {author}/{permlink} not found")]
    ContentNotFound { author: String, permlink: String },

    /// Content looked up by id does not exist.
    #[error("Content ID {0} not found")]
    ContentIdNotFound(ContentId),

    /// Tags may only be created while the content accrues rewards.
    #[error("Content {author}/{permlink} is outside its payout window")]
    OutsidePayoutWindow { author: String, permlink: String },

    /// An entry references a tag stats row that does not exist.
    #[error("Tag stats row missing for {tag_type} '{name}'")]
    StatsMissing { tag_type: TagType, name: String },

    /// An entry references an author stats row that does not exist.
    #[error("Author stats row missing for {author} {tag_type} '{name}'")]
    AuthorStatsMissing {
        author: String,
        tag_type: TagType,
        name: String,
    },

    /// A counter would drop below zero.
    #[error("Counter {counter} would go negative for {tag_type} '{name}'")]
    NegativeCounter {
        counter: &'static str,
        tag_type: TagType,
        name: String,
    },

    /// Entry ID is not present in the tag index.
    #[error("Tag entry {0} not found")]
    EntryMissing(u64),

    /// An entry with the same (type, name, content) key already exists.
    #[error("Duplicate tag entry {tag_type} '{name}' for content {content}")]
    DuplicateEntry {
        tag_type: TagType,
        name: String,
        content: ContentId,
    },

    /// Parent chain is deeper than the configured reply depth.
    #[error("Reply chain exceeds maximum depth {max}")]
    DepthExceeded { max: usize },

    /// Shared index lock was poisoned by a panicking writer.
    #[error("Index lock poisoned")]
    LockPoisoned,

    /// Configuration could not be loaded or is out of range.
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON input or output error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IndexError {
    /// Whether this error signals index inconsistency rather than a bad request.
    ///
    /// Invariant faults abort the enclosing ledger operation; the caller's undo
    /// boundary is responsible for rolling back partial effects.
    pub fn is_invariant(&self) -> bool {
        matches!(
            self,
            Self::ContentNotFound { .. }
                | Self::ContentIdNotFound(_)
                | Self::OutsidePayoutWindow { .. }
                | Self::StatsMissing { .. }
                | Self::AuthorStatsMissing { .. }
                | Self::NegativeCounter { .. }
                | Self::EntryMissing(_)
                | Self::DuplicateEntry { .. }
                | Self::DepthExceeded { .. }
        )
    }

    /// Whether this error is a rejected discovery query.
    pub fn is_request(&self) -> bool {
        matches!(
            self,
            Self::QueryLimitExceeded { .. } | Self::SelectFilterOverlap { .. }
        )
    }

    /// Process exit code reported by the `dindex` binary.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io(_) => 1,
            Self::Json(_) | Self::Config(_) => 2,
            e if e.is_request() => 3,
            _ => 4,
        }
    }
}

/// Convenience result type for discovery index operations.
pub type IndexResult<T> = Result<T, IndexError>;
