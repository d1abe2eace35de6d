//! In-memory content store keyed by id with an author/permlink lookup.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};

use super::ContentStore;
use crate::types::{Content, ContentId, IndexError, IndexResult};

/// Holds content records the way the ledger would, for tests and replay.
#[derive(Debug)]
pub struct MemoryContentStore {
    /// All records, indexed by ID.
    contents: BTreeMap<ContentId, Content>,
    /// (author, permlink) -> ID.
    by_permlink: HashMap<(String, String), ContentId>,
    /// Next available content ID. Starts at 1.
    next_id: ContentId,
}

impl MemoryContentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            contents: BTreeMap::new(),
            by_permlink: HashMap::new(),
            next_id: 1,
        }
    }

    /// Insert or replace a record, returning its id.
    ///
    /// An existing `(author, permlink)` keeps its id, reply count and depth.
    /// A new one is assigned the next id and bumps its parent's `children`.
    pub fn upsert(&mut self, mut content: Content) -> IndexResult<ContentId> {
        let key = (content.author.clone(), content.permlink.clone());
        if let Some(&id) = self.by_permlink.get(&key) {
            if let Some(stored) = self.contents.get(&id) {
                content.children = stored.children;
                content.depth = stored.depth;
            }
            content.id = id;
            self.contents.insert(id, content);
            return Ok(id);
        }

        let parent_id = match content.parent_key() {
            Some((author, permlink)) => Some(self.id_of(author, permlink)?),
            None => None,
        };
        content.children = 0;
        content.depth = 0;
        if let Some(parent_id) = parent_id {
            if let Some(parent) = self.contents.get_mut(&parent_id) {
                parent.children += 1;
                content.depth = parent.depth + 1;
            }
        }

        let id = self.next_id;
        self.next_id += 1;
        content.id = id;
        self.by_permlink.insert(key, id);
        self.contents.insert(id, content);
        Ok(id)
    }

    /// Delete a record out of band, leaving any index entries orphaned.
    pub fn remove(&mut self, author: &str, permlink: &str) -> IndexResult<Content> {
        let id = self.id_of(author, permlink)?;
        self.by_permlink
            .remove(&(author.to_string(), permlink.to_string()));
        let removed = self
            .contents
            .remove(&id)
            .ok_or(IndexError::ContentIdNotFound(id))?;
        if let Some((parent_author, parent_permlink)) = removed.parent_key() {
            if let Some(parent) = self
                .by_permlink
                .get(&(parent_author.to_string(), parent_permlink.to_string()))
                .and_then(|pid| self.contents.get_mut(pid))
            {
                parent.children = parent.children.saturating_sub(1);
            }
        }
        Ok(removed)
    }

    /// Mutable access to a record, as the ledger would modify it.
    pub fn get_mut(&mut self, author: &str, permlink: &str) -> IndexResult<&mut Content> {
        let id = self.id_of(author, permlink)?;
        self.contents
            .get_mut(&id)
            .ok_or(IndexError::ContentIdNotFound(id))
    }

    /// Apply a vote's effect: weight and vote count change on the content.
    pub fn apply_vote(
        &mut self,
        author: &str,
        permlink: &str,
        rshares: i64,
        votes: i32,
    ) -> IndexResult<()> {
        let content = self.get_mut(author, permlink)?;
        content.net_rshares += rshares;
        content.net_votes += votes;
        Ok(())
    }

    /// Move the cashout time; `None` closes the payout window.
    pub fn set_cashout(
        &mut self,
        author: &str,
        permlink: &str,
        cashout: Option<DateTime<Utc>>,
    ) -> IndexResult<()> {
        self.get_mut(author, permlink)?.cashout_time = cashout;
        Ok(())
    }

    /// Close the payout window (final payout reached).
    pub fn close_payout(&mut self, author: &str, permlink: &str) -> IndexResult<()> {
        self.set_cashout(author, permlink, None)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.contents.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    /// All records, ordered by id.
    pub fn iter(&self) -> impl Iterator<Item = &Content> {
        self.contents.values()
    }

    fn id_of(&self, author: &str, permlink: &str) -> IndexResult<ContentId> {
        self.by_permlink
            .get(&(author.to_string(), permlink.to_string()))
            .copied()
            .ok_or_else(|| IndexError::ContentNotFound {
                author: author.to_string(),
                permlink: permlink.to_string(),
            })
    }
}

impl Default for MemoryContentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentStore for MemoryContentStore {
    fn get_content(&self, author: &str, permlink: &str) -> Option<&Content> {
        self.by_permlink
            .get(&(author.to_string(), permlink.to_string()))
            .and_then(|id| self.contents.get(id))
    }

    fn find_by_id(&self, id: ContentId) -> Option<&Content> {
        self.contents.get(&id)
    }
}
