//! Aggregate rows per tag, per author and tag, and the language registry.
//!
//! Every mutation here is a delta against an existing total; nothing is ever
//! recomputed by summation. Callers must hold the index exclusively for the
//! whole subtract/add pair, which `&mut self` enforces.

use std::collections::{BTreeMap, BTreeSet};

use crate::types::{
    AccountName, Amount, AuthorTagStats, IndexError, IndexResult, LanguageEntry, TagEntry,
    TagStats, TagType,
};

/// Owns `TagStats`, `AuthorTagStats` and the language registry.
#[derive(Debug)]
pub struct StatsIndex {
    tags: BTreeMap<(TagType, String), TagStats>,
    authors: BTreeMap<(AccountName, TagType, String), AuthorTagStats>,
    languages: BTreeSet<String>,
}

impl StatsIndex {
    /// Create a new, empty stats index.
    pub fn new() -> Self {
        Self {
            tags: BTreeMap::new(),
            authors: BTreeMap::new(),
            languages: BTreeSet::new(),
        }
    }

    /// Get the stats row for `(type, name)`, creating a zeroed one on miss.
    pub fn get_or_create(&mut self, tag_type: TagType, name: &str) -> &mut TagStats {
        self.tags
            .entry((tag_type, name.to_string()))
            .or_insert_with(|| TagStats::new(tag_type, name))
    }

    /// Add an entry's contribution to its tag row.
    pub fn add_contribution(&mut self, entry: &TagEntry) {
        let stats = self.get_or_create(entry.tag_type, &entry.name);
        if entry.is_root() {
            stats.total_children_rshares2 += entry.children_rshares2;
            stats.top_posts += 1;
        } else {
            stats.comments += 1;
        }
        stats.net_votes += i64::from(entry.net_votes);
    }

    /// Remove an entry's contribution from its tag row.
    ///
    /// Deletes the row once no entry contributes to it, along with the
    /// registry entry for a language. Returns whether the row was deleted.
    pub fn remove_contribution(&mut self, entry: &TagEntry) -> IndexResult<bool> {
        let key = (entry.tag_type, entry.name.clone());
        let stats = self.tags.get_mut(&key).ok_or_else(|| IndexError::StatsMissing {
            tag_type: entry.tag_type,
            name: entry.name.clone(),
        })?;
        subtract(stats, entry)?;

        if !stats.is_vacant() {
            return Ok(false);
        }
        self.tags.remove(&key);
        if entry.tag_type == TagType::Language {
            self.languages.remove(&entry.name);
        }
        log::debug!("dropped {} stats '{}'", entry.tag_type, entry.name);
        Ok(true)
    }

    /// Swap an entry's old contribution for its refreshed one.
    ///
    /// The row is never deleted in between, so additive totals survive a
    /// refresh of the only entry of a tag.
    pub fn replace_contribution(&mut self, old: &TagEntry, new: &TagEntry) -> IndexResult<()> {
        let stats = self
            .tags
            .get_mut(&(old.tag_type, old.name.clone()))
            .ok_or_else(|| IndexError::StatsMissing {
                tag_type: old.tag_type,
                name: old.name.clone(),
            })?;
        subtract(stats, old)?;
        self.add_contribution(new);
        Ok(())
    }

    /// Count one more post by `author` under `(type, name)`.
    pub fn add_author_post(&mut self, author: &str, tag_type: TagType, name: &str) {
        self.authors
            .entry((author.to_string(), tag_type, name.to_string()))
            .and_modify(|s| s.total_posts += 1)
            .or_insert_with(|| AuthorTagStats {
                author: author.to_string(),
                tag_type,
                name: name.to_string(),
                total_posts: 1,
                total_rewards: 0,
            });
    }

    /// Count one post fewer, deleting the row when none remain.
    pub fn remove_author_post(
        &mut self,
        author: &str,
        tag_type: TagType,
        name: &str,
    ) -> IndexResult<()> {
        let key = (author.to_string(), tag_type, name.to_string());
        let stats = self
            .authors
            .get_mut(&key)
            .ok_or_else(|| IndexError::AuthorStatsMissing {
                author: author.to_string(),
                tag_type,
                name: name.to_string(),
            })?;
        if stats.total_posts <= 1 {
            self.authors.remove(&key);
        } else {
            stats.total_posts -= 1;
        }
        Ok(())
    }

    /// Credit a reward payout to a tag row. Returns false if no row exists.
    pub fn add_payout(&mut self, tag_type: TagType, name: &str, amount: Amount) -> bool {
        match self.tags.get_mut(&(tag_type, name.to_string())) {
            Some(stats) => {
                stats.total_payout += amount;
                true
            }
            None => false,
        }
    }

    /// Credit a reward payout to an author row. Returns false if no row exists.
    pub fn add_author_rewards(
        &mut self,
        author: &str,
        tag_type: TagType,
        name: &str,
        amount: Amount,
    ) -> bool {
        match self
            .authors
            .get_mut(&(author.to_string(), tag_type, name.to_string()))
        {
            Some(stats) => {
                stats.total_rewards += amount;
                true
            }
            None => false,
        }
    }

    /// Register a language as having active content.
    pub fn register_language(&mut self, name: &str) {
        if !self.languages.contains(name) {
            self.languages.insert(name.to_string());
        }
    }

    /// Look up the stats row for `(type, name)`.
    pub fn tag_stats(&self, tag_type: TagType, name: &str) -> Option<&TagStats> {
        self.tags.get(&(tag_type, name.to_string()))
    }

    /// Look up the stats row for `(author, type, name)`.
    pub fn author_stats(
        &self,
        author: &str,
        tag_type: TagType,
        name: &str,
    ) -> Option<&AuthorTagStats> {
        self.authors
            .get(&(author.to_string(), tag_type, name.to_string()))
    }

    /// All rows of one author, ordered by type then name.
    pub fn author_tags(&self, author: &str) -> Vec<&AuthorTagStats> {
        self.authors
            .range((author.to_string(), TagType::Tag, String::new())..)
            .take_while(|((a, _, _), _)| a == author)
            .map(|(_, stats)| stats)
            .collect()
    }

    /// Tag rows with the most top-level posts first.
    pub fn top_tags_by_posts(&self, limit: usize) -> Vec<&TagStats> {
        let mut rows: Vec<&TagStats> = self
            .tags
            .values()
            .filter(|s| s.tag_type == TagType::Tag)
            .collect();
        rows.sort_by(|a, b| {
            b.top_posts
                .cmp(&a.top_posts)
                .then(b.comments.cmp(&a.comments))
                .then(a.name.cmp(&b.name))
        });
        rows.truncate(limit);
        rows
    }

    /// All tag rows, ordered by type then name.
    pub fn tag_rows(&self) -> impl Iterator<Item = &TagStats> {
        self.tags.values()
    }

    /// All author rows, ordered by author, type, then name.
    pub fn author_rows(&self) -> impl Iterator<Item = &AuthorTagStats> {
        self.authors.values()
    }

    /// Languages with active content, sorted.
    pub fn languages(&self) -> Vec<LanguageEntry> {
        self.languages
            .iter()
            .map(|name| LanguageEntry { name: name.clone() })
            .collect()
    }

    /// Whether a language is registered.
    pub fn has_language(&self, name: &str) -> bool {
        self.languages.contains(name)
    }
}

impl Default for StatsIndex {
    fn default() -> Self {
        Self::new()
    }
}

fn subtract(stats: &mut TagStats, entry: &TagEntry) -> IndexResult<()> {
    let negative = |counter| IndexError::NegativeCounter {
        counter,
        tag_type: entry.tag_type,
        name: entry.name.clone(),
    };
    // Check every counter before touching any of them.
    let (top_posts, comments, rshares2) = if entry.is_root() {
        (
            stats.top_posts.checked_sub(1).ok_or_else(|| negative("top_posts"))?,
            stats.comments,
            stats
                .total_children_rshares2
                .checked_sub(entry.children_rshares2)
                .ok_or_else(|| negative("total_children_rshares2"))?,
        )
    } else {
        (
            stats.top_posts,
            stats.comments.checked_sub(1).ok_or_else(|| negative("comments"))?,
            stats.total_children_rshares2,
        )
    };
    stats.top_posts = top_posts;
    stats.comments = comments;
    stats.total_children_rshares2 = rshares2;
    stats.net_votes -= i64::from(entry.net_votes);
    Ok(())
}
