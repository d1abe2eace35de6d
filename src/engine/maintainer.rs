//! Tag entry lifecycle: the index maintainer.

use std::collections::HashMap;

use crate::index::DiscoveryIndex;
use crate::store::ContentStore;
use crate::types::{
    Amount, Content, ContentId, EntryId, IndexConfig, IndexError, IndexResult, TagEntry, TagType,
};

use super::metadata::metadata_for;
use super::score::{calculate_hot, calculate_trending};

/// What one maintenance call changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaintenanceReport {
    /// Entries created.
    pub created: usize,
    /// Entries refreshed in place.
    pub refreshed: usize,
    /// Entries removed.
    pub removed: usize,
    /// Content whose entries were refreshed, child before parent.
    pub visited: Vec<ContentId>,
}

impl MaintenanceReport {
    /// Fold another report into this one.
    pub fn merge(&mut self, other: MaintenanceReport) {
        self.created += other.created;
        self.refreshed += other.refreshed;
        self.removed += other.removed;
        self.visited.extend(other.visited);
    }

    /// Whether nothing was touched.
    pub fn is_noop(&self) -> bool {
        self.created == 0 && self.refreshed == 0 && self.removed == 0 && self.visited.is_empty()
    }
}

/// Ranking inputs copied from content onto each of its entries.
#[derive(Clone, Copy)]
struct Scores {
    hot: f64,
    trending: f64,
}

/// Keeps tag entries and aggregates in step with ledger content.
pub struct IndexMaintainer {
    config: IndexConfig,
}

impl IndexMaintainer {
    /// Create a maintainer with the given tunables.
    pub fn new(config: IndexConfig) -> Self {
        Self { config }
    }

    /// The configuration in use.
    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Bring a content item's entries in line with its current metadata.
    ///
    /// Existing entries whose name survives are refreshed, new names get new
    /// entries, and entries whose name disappeared are removed last.
    pub fn create_update_tags(
        &self,
        index: &mut DiscoveryIndex,
        store: &dyn ContentStore,
        author: &str,
        permlink: &str,
    ) -> IndexResult<MaintenanceReport> {
        let content = store.require(author, permlink)?;
        if !store.is_within_payout_window(content) {
            return Err(IndexError::OutsidePayoutWindow {
                author: author.to_string(),
                permlink: permlink.to_string(),
            });
        }

        let meta = metadata_for(store, content, &self.config);
        let scores = self.scores(content);
        let parent = resolve_parent(store, content)?;

        let mut existing_tags: HashMap<String, EntryId> = HashMap::new();
        let mut existing_language: Option<EntryId> = None;
        let mut remove_queue: Vec<EntryId> = Vec::new();
        for id in index.tags.for_content(content.id) {
            let entry = index.tags.get(id).ok_or(IndexError::EntryMissing(id))?;
            match entry.tag_type {
                TagType::Tag => {
                    if meta.tags.contains(&entry.name) {
                        existing_tags.insert(entry.name.clone(), id);
                    } else {
                        remove_queue.push(id);
                    }
                }
                TagType::Language => {
                    if entry.name == meta.language {
                        existing_language = Some(id);
                    } else {
                        remove_queue.push(id);
                    }
                }
            }
        }

        let mut report = MaintenanceReport::default();
        for name in &meta.tags {
            match existing_tags.get(name) {
                Some(&id) => {
                    self.update_tag(index, id, content, scores)?;
                    report.refreshed += 1;
                }
                None => {
                    self.create_tag(index, name, TagType::Tag, content, parent, scores)?;
                    report.created += 1;
                }
            }
        }

        if !meta.language.is_empty() {
            match existing_language {
                Some(id) => {
                    self.update_tag(index, id, content, scores)?;
                    report.refreshed += 1;
                }
                None => {
                    self.create_tag(
                        index,
                        &meta.language,
                        TagType::Language,
                        content,
                        parent,
                        scores,
                    )?;
                    report.created += 1;
                }
            }
        }

        for id in remove_queue {
            self.remove_tag(index, id)?;
            report.removed += 1;
        }

        report.visited.push(content.id);
        log::debug!(
            "tags for {}/{}: +{} ~{} -{}",
            author,
            permlink,
            report.created,
            report.refreshed,
            report.removed
        );
        Ok(report)
    }

    /// Refresh existing entries of a content item and of every ancestor.
    ///
    /// Never creates or deletes entries.
    pub fn update_tags(
        &self,
        index: &mut DiscoveryIndex,
        store: &dyn ContentStore,
        author: &str,
        permlink: &str,
    ) -> IndexResult<MaintenanceReport> {
        let content = store.require(author, permlink)?;
        let mut report = MaintenanceReport::default();
        self.cascade(index, store, content, &mut report)?;
        Ok(report)
    }

    /// Remove every entry of a content item, then refresh its ancestors.
    pub fn remove_tags(
        &self,
        index: &mut DiscoveryIndex,
        store: &dyn ContentStore,
        author: &str,
        permlink: &str,
    ) -> IndexResult<MaintenanceReport> {
        let content = store.require(author, permlink)?;
        let mut report = MaintenanceReport::default();
        for id in index.tags.for_content(content.id) {
            self.remove_tag(index, id)?;
            report.removed += 1;
        }

        if let Some(parent) = self.parent_of(store, content)? {
            self.cascade(index, store, parent, &mut report)?;
        }
        Ok(report)
    }

    /// Remove one entry along with its share of every aggregate.
    pub fn remove_tag(&self, index: &mut DiscoveryIndex, id: EntryId) -> IndexResult<()> {
        let entry = index.tags.get(id).ok_or(IndexError::EntryMissing(id))?;
        if index
            .stats
            .author_stats(&entry.author, entry.tag_type, &entry.name)
            .is_none()
        {
            return Err(IndexError::AuthorStatsMissing {
                author: entry.author.clone(),
                tag_type: entry.tag_type,
                name: entry.name.clone(),
            });
        }

        // Validates every tag row counter before writing, so a fault here
        // leaves both rows untouched.
        index.stats.remove_contribution(entry)?;
        index
            .stats
            .remove_author_post(&entry.author, entry.tag_type, &entry.name)?;
        let removed = index.tags.remove(id)?;
        log::debug!(
            "removed {} '{}' from content {}",
            removed.tag_type,
            removed.name,
            removed.content
        );
        Ok(())
    }

    /// Remove an author's entries whose content no longer exists.
    pub fn sweep_orphans(
        &self,
        index: &mut DiscoveryIndex,
        store: &dyn ContentStore,
        author: &str,
    ) -> IndexResult<MaintenanceReport> {
        let mut report = MaintenanceReport::default();
        for (content, id) in index.tags.for_author(author) {
            if store.find_by_id(content).is_none() {
                self.remove_tag(index, id)?;
                report.removed += 1;
            }
        }
        if report.removed > 0 {
            log::debug!("swept {} orphan entries of {}", report.removed, author);
        }
        Ok(report)
    }

    /// Refresh a rewarded item, then credit the payout to each of its names.
    pub fn apply_reward(
        &self,
        index: &mut DiscoveryIndex,
        store: &dyn ContentStore,
        author: &str,
        permlink: &str,
        payout: Amount,
    ) -> IndexResult<MaintenanceReport> {
        let report = self.update_tags(index, store, author, permlink)?;
        let content = store.require(author, permlink)?;

        for id in index.tags.for_content(content.id) {
            let entry = index.tags.get(id).ok_or(IndexError::EntryMissing(id))?;
            if !index.stats.add_payout(entry.tag_type, &entry.name, payout) {
                log::debug!("no stats row to credit for {} '{}'", entry.tag_type, entry.name);
            }
            if !index
                .stats
                .add_author_rewards(&entry.author, entry.tag_type, &entry.name, payout)
            {
                log::debug!(
                    "no author row to credit for {} {} '{}'",
                    entry.author,
                    entry.tag_type,
                    entry.name
                );
            }
        }
        Ok(report)
    }

    /// Walk from `start` up to the root, refreshing each item's entries.
    fn cascade<'s>(
        &self,
        index: &mut DiscoveryIndex,
        store: &'s dyn ContentStore,
        start: &'s Content,
        report: &mut MaintenanceReport,
    ) -> IndexResult<()> {
        if usize::from(start.depth) > self.config.max_reply_depth {
            return Err(IndexError::DepthExceeded {
                max: self.config.max_reply_depth,
            });
        }

        let mut current = start;
        let mut depth = 0usize;
        loop {
            let scores = self.scores(current);
            for id in index.tags.for_content(current.id) {
                self.update_tag(index, id, current, scores)?;
                report.refreshed += 1;
            }
            report.visited.push(current.id);

            match self.parent_of(store, current)? {
                Some(parent) => {
                    depth += 1;
                    if depth > self.config.max_reply_depth {
                        return Err(IndexError::DepthExceeded {
                            max: self.config.max_reply_depth,
                        });
                    }
                    log::trace!("cascade {} -> {}", current.id, parent.id);
                    current = parent;
                }
                None => return Ok(()),
            }
        }
    }

    fn parent_of<'s>(
        &self,
        store: &'s dyn ContentStore,
        content: &Content,
    ) -> IndexResult<Option<&'s Content>> {
        match content.parent_key() {
            Some((author, permlink)) => store.require(author, permlink).map(Some),
            None => Ok(None),
        }
    }

    fn scores(&self, content: &Content) -> Scores {
        Scores {
            hot: calculate_hot(content.net_rshares, content.created, &self.config),
            trending: calculate_trending(content.net_rshares, content.created, &self.config),
        }
    }

    fn create_tag(
        &self,
        index: &mut DiscoveryIndex,
        name: &str,
        tag_type: TagType,
        content: &Content,
        parent: Option<ContentId>,
        scores: Scores,
    ) -> IndexResult<EntryId> {
        let id = index.tags.insert(TagEntry {
            id: 0,
            tag_type,
            name: name.to_string(),
            content: content.id,
            parent,
            author: content.author.clone(),
            created: content.created,
            updated: content.last_update,
            active: content.active,
            cashout: content.cashout_time,
            net_votes: content.net_votes,
            children: content.children,
            net_rshares: content.net_rshares,
            children_rshares2: content.children_rshares2,
            hot: scores.hot,
            trending: scores.trending,
        })?;

        let entry = index.tags.get(id).ok_or(IndexError::EntryMissing(id))?;
        index.stats.add_contribution(entry);
        index.stats.add_author_post(&content.author, tag_type, name);
        if tag_type == TagType::Language {
            index.stats.register_language(name);
        }
        log::debug!("created {} '{}' for content {}", tag_type, name, content.id);
        Ok(id)
    }

    fn update_tag(
        &self,
        index: &mut DiscoveryIndex,
        id: EntryId,
        content: &Content,
        scores: Scores,
    ) -> IndexResult<()> {
        let old = index
            .tags
            .get(id)
            .cloned()
            .ok_or(IndexError::EntryMissing(id))?;
        let updated = TagEntry {
            updated: content.last_update,
            active: content.active,
            cashout: content.cashout_time,
            net_votes: content.net_votes,
            children: content.children,
            net_rshares: content.net_rshares,
            children_rshares2: content.children_rshares2,
            hot: scores.hot,
            trending: scores.trending,
            ..old.clone()
        };
        index.stats.replace_contribution(&old, &updated)?;
        index.tags.replace(updated)
    }
}

fn resolve_parent(store: &dyn ContentStore, content: &Content) -> IndexResult<Option<ContentId>> {
    match content.parent_key() {
        Some((author, permlink)) => Ok(Some(store.require(author, permlink)?.id)),
        None => Ok(None),
    }
}
