//! Discovery queries and their match predicate.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::index::DiscoveryIndex;
use crate::store::ContentStore;
use crate::types::{ContentId, IndexConfig, IndexError, IndexResult, TagEntry, TagType, MAX_QUERY_LIMIT};

use super::metadata::{metadata_for, normalize_name, ContentMetadata};

/// A client request to list content by tag and language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryQuery {
    /// Content must carry at least one of these tags.
    #[serde(default)]
    pub select_tags: BTreeSet<String>,
    /// Content carrying any of these tags is rejected.
    #[serde(default)]
    pub filter_tags: BTreeSet<String>,
    /// Content language must be one of these.
    #[serde(default)]
    pub select_languages: BTreeSet<String>,
    /// Content in any of these languages is rejected.
    #[serde(default)]
    pub filter_languages: BTreeSet<String>,
    /// Maximum results, at most [`MAX_QUERY_LIMIT`].
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    20
}

impl Default for DiscoveryQuery {
    fn default() -> Self {
        Self::new(default_limit())
    }
}

impl DiscoveryQuery {
    /// An unrestricted query returning up to `limit` items.
    pub fn new(limit: u32) -> Self {
        Self {
            select_tags: BTreeSet::new(),
            filter_tags: BTreeSet::new(),
            select_languages: BTreeSet::new(),
            filter_languages: BTreeSet::new(),
            limit,
        }
    }

    /// Require a tag.
    pub fn select_tag(mut self, name: impl Into<String>) -> Self {
        self.select_tags.insert(name.into());
        self
    }

    /// Forbid a tag.
    pub fn filter_tag(mut self, name: impl Into<String>) -> Self {
        self.filter_tags.insert(name.into());
        self
    }

    /// Require a language.
    pub fn select_language(mut self, name: impl Into<String>) -> Self {
        self.select_languages.insert(name.into());
        self
    }

    /// Forbid a language.
    pub fn filter_language(mut self, name: impl Into<String>) -> Self {
        self.filter_languages.insert(name.into());
        self
    }

    /// Trim and lower-case every name, dropping empties.
    pub fn prepare(&mut self) {
        normalize_set(&mut self.select_tags);
        normalize_set(&mut self.filter_tags);
        normalize_set(&mut self.select_languages);
        normalize_set(&mut self.filter_languages);
    }

    /// Reject oversized queries and names both selected and filtered.
    pub fn validate(&self) -> IndexResult<()> {
        if self.limit > MAX_QUERY_LIMIT {
            return Err(IndexError::QueryLimitExceeded {
                limit: self.limit,
                max: MAX_QUERY_LIMIT,
            });
        }
        if let Some(name) = self.filter_tags.intersection(&self.select_tags).next() {
            return Err(IndexError::SelectFilterOverlap {
                dimension: "tags",
                name: name.clone(),
            });
        }
        if let Some(name) = self
            .filter_languages
            .intersection(&self.select_languages)
            .next()
        {
            return Err(IndexError::SelectFilterOverlap {
                dimension: "languages",
                name: name.clone(),
            });
        }
        Ok(())
    }

    /// Whether any tag is selected.
    pub fn has_tags_selector(&self) -> bool {
        !self.select_tags.is_empty()
    }

    /// Whether any tag is filtered out.
    pub fn has_tags_filter(&self) -> bool {
        !self.filter_tags.is_empty()
    }

    /// Whether any language is selected.
    pub fn has_language_selector(&self) -> bool {
        !self.select_languages.is_empty()
    }

    /// Whether any language is filtered out.
    pub fn has_language_filter(&self) -> bool {
        !self.filter_languages.is_empty()
    }

    /// Whether content with this metadata satisfies the query.
    ///
    /// A tag filter hit rejects even when a selected tag also matched.
    pub fn matches(&self, meta: &ContentMetadata) -> bool {
        if !self.has_tags_selector()
            && !self.has_tags_filter()
            && !self.has_language_selector()
            && !self.has_language_filter()
        {
            return true;
        }

        if (self.has_language_selector() && !self.select_languages.contains(&meta.language))
            || (self.has_language_filter() && self.filter_languages.contains(&meta.language))
        {
            return false;
        }

        let mut result = !self.has_tags_selector();
        for name in &meta.tags {
            if self.has_tags_filter() && self.filter_tags.contains(name) {
                return false;
            } else if !result && self.select_tags.contains(name) {
                result = true;
            }
        }
        result
    }
}

fn normalize_set(set: &mut BTreeSet<String>) {
    let src = std::mem::take(set);
    set.extend(src.iter().filter_map(|name| normalize_name(name)));
}

/// Order in which discovery walks the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoverySort {
    /// Highest hot score first.
    Hot,
    /// Highest trending score first.
    Trending,
    /// Newest first.
    Created,
}

impl DiscoverySort {
    /// Parse a sort order from a string name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "hot" => Some(Self::Hot),
            "trending" => Some(Self::Trending),
            "created" | "new" => Some(Self::Created),
            _ => None,
        }
    }

    fn key(&self, entry: &TagEntry) -> f64 {
        match self {
            Self::Hot => entry.hot,
            Self::Trending => entry.trending,
            Self::Created => entry.created.timestamp() as f64,
        }
    }
}

/// Runs discovery queries over a read-only index.
pub struct QueryEngine {
    config: IndexConfig,
}

impl QueryEngine {
    /// Create a query engine that extracts metadata with `config`.
    pub fn new(config: IndexConfig) -> Self {
        Self { config }
    }

    /// Normalize, validate and evaluate a query, returning matching content ids.
    ///
    /// Candidates come from the first non-empty selector dimension, or from
    /// every tag when nothing is selected. Pagination is left to the caller.
    pub fn discover(
        &self,
        index: &DiscoveryIndex,
        store: &dyn ContentStore,
        mut query: DiscoveryQuery,
        sort: DiscoverySort,
    ) -> IndexResult<Vec<ContentId>> {
        query.prepare();
        query.validate()?;

        let (tag_type, names): (TagType, Vec<String>) = if query.has_tags_selector() {
            (TagType::Tag, query.select_tags.iter().cloned().collect())
        } else if query.has_language_selector() {
            (
                TagType::Language,
                query.select_languages.iter().cloned().collect(),
            )
        } else {
            (
                TagType::Tag,
                index
                    .stats()
                    .tag_rows()
                    .filter(|s| s.tag_type == TagType::Tag)
                    .map(|s| s.name.clone())
                    .collect(),
            )
        };

        let mut candidates: Vec<&TagEntry> = names
            .iter()
            .flat_map(|name| index.tags().by_hot(tag_type, name))
            .collect();
        candidates.sort_by(|a, b| {
            sort.key(b)
                .total_cmp(&sort.key(a))
                .then(a.content.cmp(&b.content))
        });

        let limit = query.limit as usize;
        let mut seen = HashSet::new();
        let mut results = Vec::with_capacity(limit);
        for entry in candidates {
            if results.len() >= limit {
                break;
            }
            if !seen.insert(entry.content) {
                continue;
            }
            let Some(content) = store.find_by_id(entry.content) else {
                continue;
            };
            if query.matches(&metadata_for(store, content, &self.config)) {
                results.push(entry.content);
            }
        }
        Ok(results)
    }
}
