//! Content records as supplied by the ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AccountName, ContentId};

/// A post or reply as stored by the ledger.
///
/// The index only reads these records. `parent_author` is empty for
/// root-level posts, in which case `parent_permlink` names the category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    /// Assigned by the content store; zero before insertion.
    #[serde(default)]
    pub id: ContentId,
    pub author: AccountName,
    pub permlink: String,
    #[serde(default)]
    pub parent_author: AccountName,
    #[serde(default)]
    pub parent_permlink: String,
    pub created: DateTime<Utc>,
    #[serde(default = "epoch")]
    pub last_update: DateTime<Utc>,
    #[serde(default = "epoch")]
    pub active: DateTime<Utc>,
    /// `None` once the payout window has closed.
    #[serde(default)]
    pub cashout_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub net_votes: i32,
    /// Direct replies. Maintained by the store.
    #[serde(default)]
    pub children: u32,
    #[serde(default)]
    pub net_rshares: i64,
    #[serde(default)]
    pub children_rshares2: u128,
    /// Reply nesting depth, 0 for root posts. Maintained by the store and
    /// checked against the cascade ceiling before any ancestor is refreshed.
    #[serde(default)]
    pub depth: u16,
    /// Raw JSON metadata as written by the author.
    #[serde(default)]
    pub json_metadata: String,
}

fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::default()
}

impl Content {
    /// Whether this is a top-level post.
    pub fn is_root(&self) -> bool {
        self.parent_author.is_empty()
    }

    /// `(author, permlink)` of the parent, if any.
    pub fn parent_key(&self) -> Option<(&str, &str)> {
        if self.is_root() {
            None
        } else {
            Some((&self.parent_author, &self.parent_permlink))
        }
    }
}

/// Builder for constructing Content records ergonomically.
pub struct ContentBuilder {
    content: Content,
}

impl ContentBuilder {
    /// Start a root post with the given author and permlink, active and unvoted.
    pub fn new(author: impl Into<String>, permlink: impl Into<String>) -> Self {
        let now = super::now_secs();
        Self {
            content: Content {
                id: 0,
                author: author.into(),
                permlink: permlink.into(),
                parent_author: String::new(),
                parent_permlink: String::new(),
                created: now,
                last_update: now,
                active: now,
                cashout_time: Some(now + chrono::Duration::days(7)),
                net_votes: 0,
                children: 0,
                net_rshares: 0,
                children_rshares2: 0,
                depth: 0,
                json_metadata: String::new(),
            },
        }
    }

    /// Set the category of a root post.
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.content.parent_author.clear();
        self.content.parent_permlink = category.into();
        self
    }

    /// Make this content a reply to `author/permlink`.
    pub fn reply_to(mut self, author: impl Into<String>, permlink: impl Into<String>) -> Self {
        self.content.parent_author = author.into();
        self.content.parent_permlink = permlink.into();
        self
    }

    /// Set the raw JSON metadata.
    pub fn json_metadata(mut self, json: impl Into<String>) -> Self {
        self.content.json_metadata = json.into();
        self
    }

    /// Set the creation time (also used for last update and activity).
    pub fn created(mut self, ts: DateTime<Utc>) -> Self {
        self.content.created = ts;
        self.content.last_update = ts;
        self.content.active = ts;
        self
    }

    /// Set the cashout time; `None` marks the payout window as closed.
    pub fn cashout_time(mut self, ts: Option<DateTime<Utc>>) -> Self {
        self.content.cashout_time = ts;
        self
    }

    /// Set the accumulated vote weight.
    pub fn net_rshares(mut self, rshares: i64) -> Self {
        self.content.net_rshares = rshares;
        self
    }

    /// Set the net vote count.
    pub fn net_votes(mut self, votes: i32) -> Self {
        self.content.net_votes = votes;
        self
    }

    /// Set the nesting depth (0 for root posts).
    pub fn depth(mut self, depth: u16) -> Self {
        self.content.depth = depth;
        self
    }

    /// Build the Content. The id will be 0 (assigned by the store on insertion).
    pub fn build(self) -> Content {
        self.content
    }
}
