//! Tag entry storage by id with secondary orderings.

use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};

use crate::types::{
    AccountName, ContentId, EntryId, IndexError, IndexResult, Score, TagEntry, TagType,
};

type NameKey = (TagType, String);

/// Stores every active tag entry and keeps its lookup orders in step.
///
/// Unique on `(type, name, content)`. Secondary orders: by content, by
/// author then content, and per `(type, name)` by hot, trending and
/// creation time (each descending).
#[derive(Debug)]
pub struct TagIndex {
    entries: HashMap<EntryId, TagEntry>,
    by_key: HashMap<(TagType, String, ContentId), EntryId>,
    by_content: BTreeSet<(ContentId, EntryId)>,
    by_author: BTreeSet<(AccountName, ContentId, EntryId)>,
    by_hot: BTreeSet<(NameKey, Reverse<Score>, EntryId)>,
    by_trending: BTreeSet<(NameKey, Reverse<Score>, EntryId)>,
    by_created: BTreeSet<(NameKey, Reverse<DateTime<Utc>>, EntryId)>,
    next_id: EntryId,
}

impl TagIndex {
    /// Create a new, empty tag index.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            by_key: HashMap::new(),
            by_content: BTreeSet::new(),
            by_author: BTreeSet::new(),
            by_hot: BTreeSet::new(),
            by_trending: BTreeSet::new(),
            by_created: BTreeSet::new(),
            next_id: 0,
        }
    }

    /// Insert a new entry, assigning its id.
    pub fn insert(&mut self, mut entry: TagEntry) -> IndexResult<EntryId> {
        let key = (entry.tag_type, entry.name.clone(), entry.content);
        if self.by_key.contains_key(&key) {
            return Err(IndexError::DuplicateEntry {
                tag_type: entry.tag_type,
                name: entry.name,
                content: entry.content,
            });
        }

        let id = self.next_id;
        self.next_id += 1;
        entry.id = id;

        self.by_key.insert(key, id);
        self.link(&entry);
        self.entries.insert(id, entry);
        Ok(id)
    }

    /// Replace an entry's contents in place, keeping its id and identity.
    ///
    /// Identity fields (type, name, content, author) must not change.
    pub fn replace(&mut self, mut entry: TagEntry) -> IndexResult<()> {
        let id = entry.id;
        let old = self.entries.get(&id).ok_or(IndexError::EntryMissing(id))?;
        if old.tag_type != entry.tag_type
            || old.name != entry.name
            || old.content != entry.content
            || old.author != entry.author
        {
            return Err(IndexError::DuplicateEntry {
                tag_type: entry.tag_type,
                name: entry.name,
                content: entry.content,
            });
        }
        let old = old.clone();
        self.unlink(&old);
        entry.id = id;
        self.link(&entry);
        self.entries.insert(id, entry);
        Ok(())
    }

    /// Remove an entry, returning it.
    pub fn remove(&mut self, id: EntryId) -> IndexResult<TagEntry> {
        let entry = self.entries.remove(&id).ok_or(IndexError::EntryMissing(id))?;
        self.by_key
            .remove(&(entry.tag_type, entry.name.clone(), entry.content));
        self.unlink(&entry);
        Ok(entry)
    }

    /// Get an entry by id.
    pub fn get(&self, id: EntryId) -> Option<&TagEntry> {
        self.entries.get(&id)
    }

    /// Find the entry for `(type, name, content)`.
    pub fn find(&self, tag_type: TagType, name: &str, content: ContentId) -> Option<&TagEntry> {
        self.by_key
            .get(&(tag_type, name.to_string(), content))
            .and_then(|id| self.entries.get(id))
    }

    /// Ids of all entries of one content item, in insertion order.
    pub fn for_content(&self, content: ContentId) -> Vec<EntryId> {
        self.by_content
            .range((content, EntryId::MIN)..=(content, EntryId::MAX))
            .map(|&(_, id)| id)
            .collect()
    }

    /// `(content, entry)` pairs of one author, ordered by content.
    pub fn for_author(&self, author: &str) -> Vec<(ContentId, EntryId)> {
        self.by_author
            .range((author.to_string(), ContentId::MIN, EntryId::MIN)..)
            .take_while(|(a, _, _)| a == author)
            .map(|&(_, content, id)| (content, id))
            .collect()
    }

    /// Entries of `(type, name)` by hot score, highest first.
    pub fn by_hot<'a>(
        &'a self,
        tag_type: TagType,
        name: &str,
    ) -> impl Iterator<Item = &'a TagEntry> + 'a {
        Self::scan(&self.by_hot, tag_type, name, Reverse(Score(f64::INFINITY)))
            .filter_map(move |id| self.entries.get(&id))
    }

    /// Entries of `(type, name)` by trending score, highest first.
    pub fn by_trending<'a>(
        &'a self,
        tag_type: TagType,
        name: &str,
    ) -> impl Iterator<Item = &'a TagEntry> + 'a {
        Self::scan(
            &self.by_trending,
            tag_type,
            name,
            Reverse(Score(f64::INFINITY)),
        )
        .filter_map(move |id| self.entries.get(&id))
    }

    /// Entries of `(type, name)` by creation time, newest first.
    pub fn by_created<'a>(
        &'a self,
        tag_type: TagType,
        name: &str,
    ) -> impl Iterator<Item = &'a TagEntry> + 'a {
        Self::scan(
            &self.by_created,
            tag_type,
            name,
            Reverse(DateTime::<Utc>::MAX_UTC),
        )
        .filter_map(move |id| self.entries.get(&id))
    }

    fn scan<'a, K: Ord + Copy + 'a>(
        set: &'a BTreeSet<(NameKey, K, EntryId)>,
        tag_type: TagType,
        name: &str,
        floor: K,
    ) -> impl Iterator<Item = EntryId> + 'a {
        let name = name.to_string();
        set.range(((tag_type, name.clone()), floor, EntryId::MIN)..)
            .take_while(move |((t, n), _, _)| *t == tag_type && *n == name)
            .map(|&(_, _, id)| id)
    }

    /// All entries, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &TagEntry> {
        self.entries.values()
    }

    /// Number of active entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn link(&mut self, entry: &TagEntry) {
        let id = entry.id;
        let name_key = (entry.tag_type, entry.name.clone());
        self.by_content.insert((entry.content, id));
        self.by_author
            .insert((entry.author.clone(), entry.content, id));
        self.by_hot
            .insert((name_key.clone(), Reverse(Score(entry.hot)), id));
        self.by_trending
            .insert((name_key.clone(), Reverse(Score(entry.trending)), id));
        self.by_created
            .insert((name_key, Reverse(entry.created), id));
    }

    fn unlink(&mut self, entry: &TagEntry) {
        let id = entry.id;
        let name_key = (entry.tag_type, entry.name.clone());
        self.by_content.remove(&(entry.content, id));
        self.by_author
            .remove(&(entry.author.clone(), entry.content, id));
        self.by_hot
            .remove(&(name_key.clone(), Reverse(Score(entry.hot)), id));
        self.by_trending
            .remove(&(name_key.clone(), Reverse(Score(entry.trending)), id));
        self.by_created
            .remove(&(name_key, Reverse(entry.created), id));
    }
}

impl Default for TagIndex {
    fn default() -> Self {
        Self::new()
    }
}
