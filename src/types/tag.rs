//! Index rows: tag entries and their aggregates.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AccountName, Amount, ContentId};

/// Identifier of a tag entry inside the tag index.
pub type EntryId = u64;

/// Classification dimension of a tag entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum TagType {
    /// A free-form topic tag from metadata (or the `""` sentinel).
    Tag = 0,
    /// The content's language code.
    Language = 1,
}

impl TagType {
    /// Return a human-readable name for this tag type.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tag => "tag",
            Self::Language => "language",
        }
    }

    /// Parse a tag type from a string name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "tag" => Some(Self::Tag),
            "language" | "lang" => Some(Self::Language),
            _ => None,
        }
    }
}

impl std::fmt::Display for TagType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Ranking score with a total order, so it can key sorted indexes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Score(pub f64);

impl Eq for Score {}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// One classification record linking an active content item to a tag or language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagEntry {
    /// Assigned by the tag index on insertion.
    pub id: EntryId,
    /// Whether `name` is a topic tag or a language.
    pub tag_type: TagType,
    /// Normalized tag or language name. May be the empty sentinel.
    pub name: String,
    /// The classified content item.
    pub content: ContentId,
    /// `None` for root-level posts.
    pub parent: Option<ContentId>,
    /// Author of the content item.
    pub author: AccountName,
    /// Content creation time.
    pub created: DateTime<Utc>,
    /// Time of the last edit.
    pub updated: DateTime<Utc>,
    /// Time of the last activity in the thread.
    pub active: DateTime<Utc>,
    /// End of the payout window, copied from the content.
    pub cashout: Option<DateTime<Utc>>,
    /// Net vote count.
    pub net_votes: i32,
    /// Direct replies.
    pub children: u32,
    /// Net voting weight.
    pub net_rshares: i64,
    /// Squared-weight total over the reply subtree.
    pub children_rshares2: u128,
    /// Hot score, recomputed on every refresh.
    pub hot: f64,
    /// Trending score, recomputed on every refresh.
    pub trending: f64,
}

impl TagEntry {
    /// Whether the entry belongs to a top-level post.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Aggregate totals for one `(type, name)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagStats {
    /// Dimension of `name`.
    pub tag_type: TagType,
    /// Normalized tag or language name.
    pub name: String,
    /// Active root-level entries.
    pub top_posts: u32,
    /// Active reply entries.
    pub comments: u32,
    /// Summed net votes of all active entries.
    pub net_votes: i64,
    /// Summed over root-level entries only.
    pub total_children_rshares2: u128,
    /// Cumulative reward payouts; only ever increases.
    pub total_payout: Amount,
}

impl TagStats {
    /// Create a zeroed stats row.
    pub fn new(tag_type: TagType, name: impl Into<String>) -> Self {
        Self {
            tag_type,
            name: name.into(),
            top_posts: 0,
            comments: 0,
            net_votes: 0,
            total_children_rshares2: 0,
            total_payout: 0,
        }
    }

    /// Whether no active entry contributes to this row anymore.
    pub fn is_vacant(&self) -> bool {
        self.top_posts == 0 && self.comments == 0
    }
}

/// Aggregate totals for one `(author, type, name)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorTagStats {
    /// Account the row belongs to.
    pub author: AccountName,
    /// Dimension of `name`.
    pub tag_type: TagType,
    /// Normalized tag or language name.
    pub name: String,
    /// Active entries of this author under `name`.
    pub total_posts: u32,
    /// Cumulative reward payouts; only ever increases.
    pub total_rewards: Amount,
}

/// A language with at least one active entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LanguageEntry {
    /// Normalized language code.
    pub name: String,
}
