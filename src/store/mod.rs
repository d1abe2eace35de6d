//! Read access to ledger content, and an in-memory store for tests and replay.

pub mod memory_store;

pub use memory_store::MemoryContentStore;

use crate::engine::{metadata_for, ContentMetadata};
use crate::types::{Content, ContentId, IndexConfig, IndexError, IndexResult};

/// Read-only view of the ledger's content records.
///
/// The index never writes through this trait; the ledger owns the records.
pub trait ContentStore {
    /// Look up content by author and permlink.
    fn get_content(&self, author: &str, permlink: &str) -> Option<&Content>;

    /// Look up content by id.
    fn find_by_id(&self, id: ContentId) -> Option<&Content>;

    /// Tags and language of a content item, category included.
    fn metadata(&self, content: &Content, config: &IndexConfig) -> ContentMetadata
    where
        Self: Sized,
    {
        metadata_for(self, content, config)
    }

    /// Whether the content is still accruing rewards.
    fn is_within_payout_window(&self, content: &Content) -> bool {
        content.cashout_time.is_some()
    }

    /// The parent of a reply, `None` for root posts or a missing parent.
    fn parent_of(&self, content: &Content) -> Option<&Content> {
        let (author, permlink) = content.parent_key()?;
        self.get_content(author, permlink)
    }

    /// Like [`ContentStore::get_content`], failing with `ContentNotFound`.
    fn require(&self, author: &str, permlink: &str) -> IndexResult<&Content> {
        self.get_content(author, permlink)
            .ok_or_else(|| IndexError::ContentNotFound {
                author: author.to_string(),
                permlink: permlink.to_string(),
            })
    }

    /// Category of the discussion a content item belongs to.
    ///
    /// Root posts carry it in `parent_permlink`; replies inherit their root's.
    /// Returns an empty string if the chain is broken or deeper than `max_depth`.
    fn category_of(&self, content: &Content, max_depth: usize) -> String {
        let mut current = content;
        for _ in 0..=max_depth {
            if current.is_root() {
                return current.parent_permlink.clone();
            }
            match self.parent_of(current) {
                Some(parent) => current = parent,
                None => break,
            }
        }
        String::new()
    }
}
