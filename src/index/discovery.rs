//! The complete discovery index: tag entries plus their aggregates.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::{StatsIndex, TagIndex};
use crate::types::{AccountName, AuthorTagStats, ContentId, LanguageEntry, TagEntry, TagStats, TagType};

/// Owns all derived index state. Mutated only by the maintainer.
#[derive(Debug)]
pub struct DiscoveryIndex {
    pub(crate) tags: TagIndex,
    pub(crate) stats: StatsIndex,
}

/// Drift found by [`DiscoveryIndex::verify`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Drift {
    /// A tag row's counters disagree with its entries.
    TagStats {
        tag_type: TagType,
        name: String,
        expected_top_posts: u32,
        actual_top_posts: u32,
        expected_comments: u32,
        actual_comments: u32,
    },
    /// Entries exist for a `(type, name)` with no stats row.
    MissingTagStats { tag_type: TagType, name: String },
    /// A stats row outlived its last entry.
    OrphanTagStats { tag_type: TagType, name: String },
    /// An author row's post count disagrees with its entries.
    AuthorStats {
        author: AccountName,
        tag_type: TagType,
        name: String,
        expected: u32,
        actual: u32,
    },
    /// A language is registered without a matching stats row, or vice versa.
    Language { name: String, registered: bool },
}

/// Result of auditing incremental aggregates against the entries.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConsistencyReport {
    /// Entries audited.
    pub entries: usize,
    /// Every disagreement found.
    pub drift: Vec<Drift>,
}

impl ConsistencyReport {
    /// Whether the aggregates match the entries exactly.
    pub fn is_consistent(&self) -> bool {
        self.drift.is_empty()
    }
}

/// Serializable copy of the whole index.
#[derive(Debug, Clone, Serialize)]
pub struct IndexSnapshot {
    /// Active entries, ordered by id.
    pub entries: Vec<TagEntry>,
    /// Tag rows, ordered by type then name.
    pub tag_stats: Vec<TagStats>,
    /// Author rows, ordered by author, type, then name.
    pub author_stats: Vec<AuthorTagStats>,
    /// Registered languages.
    pub languages: Vec<LanguageEntry>,
}

impl DiscoveryIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self {
            tags: TagIndex::new(),
            stats: StatsIndex::new(),
        }
    }

    /// The tag entry storage.
    pub fn tags(&self) -> &TagIndex {
        &self.tags
    }

    /// The aggregate storage.
    pub fn stats(&self) -> &StatsIndex {
        &self.stats
    }

    /// Number of active tag entries.
    pub fn entry_count(&self) -> usize {
        self.tags.len()
    }

    /// All entries of one content item.
    pub fn entries_for_content(&self, content: ContentId) -> Vec<&TagEntry> {
        self.tags
            .for_content(content)
            .into_iter()
            .filter_map(|id| self.tags.get(id))
            .collect()
    }

    /// All entries of one author, grouped by content.
    pub fn entries_for_author(&self, author: &str) -> Vec<&TagEntry> {
        self.tags
            .for_author(author)
            .into_iter()
            .filter_map(|(_, id)| self.tags.get(id))
            .collect()
    }

    /// Active names of one content item, as `(type, name)` pairs.
    pub fn names_for_content(&self, content: ContentId) -> BTreeSet<(TagType, String)> {
        self.entries_for_content(content)
            .into_iter()
            .map(|e| (e.tag_type, e.name.clone()))
            .collect()
    }

    /// Top `limit` entries of `(type, name)` by hot score.
    pub fn by_hot(&self, tag_type: TagType, name: &str, limit: usize) -> Vec<&TagEntry> {
        self.tags.by_hot(tag_type, name).take(limit).collect()
    }

    /// Top `limit` entries of `(type, name)` by trending score.
    pub fn by_trending(&self, tag_type: TagType, name: &str, limit: usize) -> Vec<&TagEntry> {
        self.tags.by_trending(tag_type, name).take(limit).collect()
    }

    /// Newest `limit` entries of `(type, name)`.
    pub fn by_created(&self, tag_type: TagType, name: &str, limit: usize) -> Vec<&TagEntry> {
        self.tags.by_created(tag_type, name).take(limit).collect()
    }

    /// Stats row for `(type, name)`.
    pub fn tag_stats(&self, tag_type: TagType, name: &str) -> Option<&TagStats> {
        self.stats.tag_stats(tag_type, name)
    }

    /// Stats row for `(author, type, name)`.
    pub fn author_tag_stats(
        &self,
        author: &str,
        tag_type: TagType,
        name: &str,
    ) -> Option<&AuthorTagStats> {
        self.stats.author_stats(author, tag_type, name)
    }

    /// All rows of one author.
    pub fn author_tags(&self, author: &str) -> Vec<&AuthorTagStats> {
        self.stats.author_tags(author)
    }

    /// Tag rows with the most top-level posts first.
    pub fn top_tags_by_posts(&self, limit: usize) -> Vec<&TagStats> {
        self.stats.top_tags_by_posts(limit)
    }

    /// Languages with active content.
    pub fn languages(&self) -> Vec<LanguageEntry> {
        self.stats.languages()
    }

    /// Recount every aggregate from the entries and report disagreements.
    ///
    /// Payout totals are additive-only history and are not audited.
    pub fn verify(&self) -> ConsistencyReport {
        let mut report = ConsistencyReport {
            entries: self.tags.len(),
            drift: Vec::new(),
        };

        let mut tag_counts: BTreeMap<(TagType, String), (u32, u32)> = BTreeMap::new();
        let mut author_counts: BTreeMap<(AccountName, TagType, String), u32> = BTreeMap::new();
        for entry in self.tags.iter() {
            let counts = tag_counts
                .entry((entry.tag_type, entry.name.clone()))
                .or_default();
            if entry.is_root() {
                counts.0 += 1;
            } else {
                counts.1 += 1;
            }
            *author_counts
                .entry((entry.author.clone(), entry.tag_type, entry.name.clone()))
                .or_default() += 1;
        }

        for ((tag_type, name), (top_posts, comments)) in &tag_counts {
            match self.stats.tag_stats(*tag_type, name) {
                None => report.drift.push(Drift::MissingTagStats {
                    tag_type: *tag_type,
                    name: name.clone(),
                }),
                Some(s) if s.top_posts != *top_posts || s.comments != *comments => {
                    report.drift.push(Drift::TagStats {
                        tag_type: *tag_type,
                        name: name.clone(),
                        expected_top_posts: *top_posts,
                        actual_top_posts: s.top_posts,
                        expected_comments: *comments,
                        actual_comments: s.comments,
                    })
                }
                Some(_) => {}
            }
        }
        for row in self.stats.tag_rows() {
            if !tag_counts.contains_key(&(row.tag_type, row.name.clone())) {
                report.drift.push(Drift::OrphanTagStats {
                    tag_type: row.tag_type,
                    name: row.name.clone(),
                });
            }
        }

        for row in self.stats.author_rows() {
            let key = (row.author.clone(), row.tag_type, row.name.clone());
            let expected = author_counts.remove(&key).unwrap_or(0);
            if expected != row.total_posts {
                report.drift.push(Drift::AuthorStats {
                    author: row.author.clone(),
                    tag_type: row.tag_type,
                    name: row.name.clone(),
                    expected,
                    actual: row.total_posts,
                });
            }
        }
        for ((author, tag_type, name), expected) in author_counts {
            report.drift.push(Drift::AuthorStats {
                author,
                tag_type,
                name,
                expected,
                actual: 0,
            });
        }

        for language in self.stats.languages() {
            if self.stats.tag_stats(TagType::Language, &language.name).is_none() {
                report.drift.push(Drift::Language {
                    name: language.name,
                    registered: true,
                });
            }
        }
        for row in self.stats.tag_rows() {
            if row.tag_type == TagType::Language && !self.stats.has_language(&row.name) {
                report.drift.push(Drift::Language {
                    name: row.name.clone(),
                    registered: false,
                });
            }
        }

        report
    }

    /// Copy the whole index into a serializable snapshot.
    pub fn snapshot(&self) -> IndexSnapshot {
        let mut entries: Vec<TagEntry> = self.tags.iter().cloned().collect();
        entries.sort_by_key(|e| e.id);
        IndexSnapshot {
            entries,
            tag_stats: self.stats.tag_rows().cloned().collect(),
            author_stats: self.stats.author_rows().cloned().collect(),
            languages: self.stats.languages(),
        }
    }
}

impl Default for DiscoveryIndex {
    fn default() -> Self {
        Self::new()
    }
}
