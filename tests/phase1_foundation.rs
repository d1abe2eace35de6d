//! Phase 1 tests: data model, index storage, content store, configuration.

use chrono::{DateTime, Utc};

use discovery_index::index::{StatsIndex, TagIndex};
use discovery_index::store::{ContentStore, MemoryContentStore};
use discovery_index::types::{
    ContentBuilder, IndexConfig, IndexError, Operation, ScoreParams, TagEntry, TagType,
};

// ==================== Helpers ====================

fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap()
}

/// Build an entry with the given identity and ranking fields.
fn entry(tag_type: TagType, name: &str, content: u64, parent: Option<u64>, hot: f64) -> TagEntry {
    TagEntry {
        id: 0,
        tag_type,
        name: name.to_string(),
        content,
        parent,
        author: "alice".to_string(),
        created: at(1_600_000_000 + content as i64),
        updated: at(1_600_000_000),
        active: at(1_600_000_000),
        cashout: Some(at(1_600_604_800)),
        net_votes: 2,
        children: 0,
        net_rshares: 0,
        children_rshares2: 10,
        hot,
        trending: hot / 2.0,
    }
}

// ==================== Tag Index Tests ====================

#[test]
fn test_tag_index_insert_and_find() {
    let mut index = TagIndex::new();
    let a = index.insert(entry(TagType::Tag, "rust", 1, None, 1.0)).unwrap();
    let b = index.insert(entry(TagType::Tag, "go", 1, None, 1.0)).unwrap();

    assert_ne!(a, b);
    assert_eq!(index.len(), 2);
    assert_eq!(index.find(TagType::Tag, "rust", 1).unwrap().id, a);
    assert!(index.find(TagType::Language, "rust", 1).is_none());
    assert_eq!(index.for_content(1), vec![a, b]);
    assert!(index.for_content(2).is_empty());
}

#[test]
fn test_tag_index_rejects_duplicate_key() {
    let mut index = TagIndex::new();
    index.insert(entry(TagType::Tag, "rust", 1, None, 1.0)).unwrap();
    let err = index
        .insert(entry(TagType::Tag, "rust", 1, None, 5.0))
        .unwrap_err();
    assert!(matches!(err, IndexError::DuplicateEntry { content: 1, .. }));
    assert!(err.is_invariant());

    // Same name on another content item, or another type, is fine
    index.insert(entry(TagType::Tag, "rust", 2, None, 1.0)).unwrap();
    index.insert(entry(TagType::Language, "rust", 1, None, 1.0)).unwrap();
    assert_eq!(index.len(), 3);
}

#[test]
fn test_tag_index_score_orders() {
    let mut index = TagIndex::new();
    index.insert(entry(TagType::Tag, "rust", 1, None, 3.0)).unwrap();
    index.insert(entry(TagType::Tag, "rust", 2, None, 9.0)).unwrap();
    index.insert(entry(TagType::Tag, "rust", 3, None, -1.0)).unwrap();
    index.insert(entry(TagType::Tag, "go", 4, None, 100.0)).unwrap();
    index.insert(entry(TagType::Tag, "rustacean", 5, None, 50.0)).unwrap();

    let hot: Vec<u64> = index.by_hot(TagType::Tag, "rust").map(|e| e.content).collect();
    assert_eq!(hot, vec![2, 1, 3]);

    let trending: Vec<u64> = index
        .by_trending(TagType::Tag, "rust")
        .map(|e| e.content)
        .collect();
    assert_eq!(trending, vec![2, 1, 3]);

    // Newest first; created grows with content id in the helper
    let created: Vec<u64> = index
        .by_created(TagType::Tag, "rust")
        .map(|e| e.content)
        .collect();
    assert_eq!(created, vec![3, 2, 1]);

    assert_eq!(index.by_hot(TagType::Language, "rust").count(), 0);
}

#[test]
fn test_tag_index_replace_reorders() {
    let mut index = TagIndex::new();
    let a = index.insert(entry(TagType::Tag, "rust", 1, None, 1.0)).unwrap();
    index.insert(entry(TagType::Tag, "rust", 2, None, 2.0)).unwrap();

    let mut updated = index.get(a).unwrap().clone();
    updated.hot = 10.0;
    index.replace(updated).unwrap();

    let hot: Vec<u64> = index.by_hot(TagType::Tag, "rust").map(|e| e.content).collect();
    assert_eq!(hot, vec![1, 2]);
    assert_eq!(index.len(), 2);
}

#[test]
fn test_tag_index_replace_keeps_identity() {
    let mut index = TagIndex::new();
    let a = index.insert(entry(TagType::Tag, "rust", 1, None, 1.0)).unwrap();
    let mut renamed = index.get(a).unwrap().clone();
    renamed.name = "go".to_string();
    assert!(index.replace(renamed).is_err());
    assert_eq!(index.get(a).unwrap().name, "rust");

    let mut missing = index.get(a).unwrap().clone();
    missing.id = 999;
    assert!(matches!(
        index.replace(missing),
        Err(IndexError::EntryMissing(999))
    ));
}

#[test]
fn test_tag_index_remove_unlinks_everything() {
    let mut index = TagIndex::new();
    let a = index.insert(entry(TagType::Tag, "rust", 1, None, 1.0)).unwrap();
    let removed = index.remove(a).unwrap();
    assert_eq!(removed.name, "rust");
    assert!(index.is_empty());
    assert!(index.for_content(1).is_empty());
    assert!(index.for_author("alice").is_empty());
    assert_eq!(index.by_hot(TagType::Tag, "rust").count(), 0);
    assert!(matches!(index.remove(a), Err(IndexError::EntryMissing(_))));

    // The key is free again
    index.insert(entry(TagType::Tag, "rust", 1, None, 1.0)).unwrap();
}

#[test]
fn test_tag_index_for_author_stops_at_author() {
    let mut index = TagIndex::new();
    let mut bob = entry(TagType::Tag, "rust", 7, None, 1.0);
    bob.author = "bob".to_string();
    let mut alicia = entry(TagType::Tag, "rust", 8, None, 1.0);
    alicia.author = "alicia".to_string();

    index.insert(entry(TagType::Tag, "rust", 3, None, 1.0)).unwrap();
    index.insert(bob).unwrap();
    index.insert(alicia).unwrap();
    index.insert(entry(TagType::Tag, "go", 1, None, 1.0)).unwrap();

    let contents: Vec<u64> = index.for_author("alice").iter().map(|(c, _)| *c).collect();
    assert_eq!(contents, vec![1, 3]);
    assert_eq!(index.for_author("bob").len(), 1);
    assert!(index.for_author("carol").is_empty());
}

// ==================== Stats Index Tests ====================

#[test]
fn test_stats_add_and_remove_contribution() {
    let mut stats = StatsIndex::new();
    let root = entry(TagType::Tag, "rust", 1, None, 0.0);
    let reply = entry(TagType::Tag, "rust", 2, Some(1), 0.0);

    stats.add_contribution(&root);
    stats.add_contribution(&reply);
    let row = stats.tag_stats(TagType::Tag, "rust").unwrap();
    assert_eq!(row.top_posts, 1);
    assert_eq!(row.comments, 1);
    assert_eq!(row.net_votes, 4);
    // Only root entries feed children_rshares2
    assert_eq!(row.total_children_rshares2, 10);

    assert!(!stats.remove_contribution(&reply).unwrap());
    assert!(stats.remove_contribution(&root).unwrap());
    assert!(stats.tag_stats(TagType::Tag, "rust").is_none());
}

#[test]
fn test_stats_missing_row_is_fault() {
    let mut stats = StatsIndex::new();
    let root = entry(TagType::Tag, "rust", 1, None, 0.0);
    let err = stats.remove_contribution(&root).unwrap_err();
    assert!(matches!(err, IndexError::StatsMissing { .. }));
    assert!(err.is_invariant());
}

#[test]
fn test_stats_negative_counter_is_fault() {
    let mut stats = StatsIndex::new();
    stats.add_contribution(&entry(TagType::Tag, "rust", 2, Some(1), 0.0));
    // A root entry was never added, so top_posts would go negative
    let err = stats
        .remove_contribution(&entry(TagType::Tag, "rust", 1, None, 0.0))
        .unwrap_err();
    assert!(matches!(
        err,
        IndexError::NegativeCounter {
            counter: "top_posts",
            ..
        }
    ));
    // Nothing was partially applied
    let row = stats.tag_stats(TagType::Tag, "rust").unwrap();
    assert_eq!(row.comments, 1);
    assert_eq!(row.net_votes, 2);
}

#[test]
fn test_stats_replace_keeps_payout() {
    let mut stats = StatsIndex::new();
    let old = entry(TagType::Tag, "rust", 1, None, 0.0);
    stats.add_contribution(&old);
    assert!(stats.add_payout(TagType::Tag, "rust", 500));

    let mut new = old.clone();
    new.net_votes = 7;
    new.children_rshares2 = 40;
    stats.replace_contribution(&old, &new).unwrap();

    let row = stats.tag_stats(TagType::Tag, "rust").unwrap();
    assert_eq!(row.top_posts, 1);
    assert_eq!(row.net_votes, 7);
    assert_eq!(row.total_children_rshares2, 40);
    assert_eq!(row.total_payout, 500);
}

#[test]
fn test_language_registry_follows_stats() {
    let mut stats = StatsIndex::new();
    let lang = entry(TagType::Language, "en", 1, None, 0.0);
    stats.add_contribution(&lang);
    stats.register_language("en");
    stats.register_language("en");
    assert_eq!(stats.languages().len(), 1);

    stats.remove_contribution(&lang).unwrap();
    assert!(stats.languages().is_empty());
    assert!(!stats.has_language("en"));
}

#[test]
fn test_author_stats_counting() {
    let mut stats = StatsIndex::new();
    stats.add_author_post("alice", TagType::Tag, "rust");
    stats.add_author_post("alice", TagType::Tag, "rust");
    stats.add_author_post("alice", TagType::Language, "en");
    assert_eq!(
        stats
            .author_stats("alice", TagType::Tag, "rust")
            .unwrap()
            .total_posts,
        2
    );
    assert_eq!(stats.author_tags("alice").len(), 2);
    assert!(stats.author_tags("bob").is_empty());

    assert!(stats.add_author_rewards("alice", TagType::Tag, "rust", 30));
    assert!(!stats.add_author_rewards("bob", TagType::Tag, "rust", 30));

    stats.remove_author_post("alice", TagType::Tag, "rust").unwrap();
    stats.remove_author_post("alice", TagType::Tag, "rust").unwrap();
    assert!(stats.author_stats("alice", TagType::Tag, "rust").is_none());
    assert!(matches!(
        stats.remove_author_post("alice", TagType::Tag, "rust"),
        Err(IndexError::AuthorStatsMissing { .. })
    ));
}

#[test]
fn test_top_tags_by_posts() {
    let mut stats = StatsIndex::new();
    for content in 0..3 {
        stats.add_contribution(&entry(TagType::Tag, "busy", content, None, 0.0));
    }
    stats.add_contribution(&entry(TagType::Tag, "quiet", 9, None, 0.0));
    stats.add_contribution(&entry(TagType::Language, "en", 9, None, 0.0));

    let top = stats.top_tags_by_posts(10);
    let names: Vec<&str> = top.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["busy", "quiet"]);
    assert_eq!(stats.top_tags_by_posts(1).len(), 1);
}

// ==================== Content Store Tests ====================

#[test]
fn test_store_assigns_ids_and_children() {
    let mut store = MemoryContentStore::new();
    let root = store
        .upsert(ContentBuilder::new("alice", "post").category("news").build())
        .unwrap();
    let reply = store
        .upsert(ContentBuilder::new("bob", "re").reply_to("alice", "post").build())
        .unwrap();

    assert_ne!(root, reply);
    assert_eq!(store.len(), 2);
    assert_eq!(store.find_by_id(root).unwrap().children, 1);
    assert_eq!(store.find_by_id(reply).unwrap().depth, 1);

    // Upsert of an existing permlink keeps its id
    let again = store
        .upsert(
            ContentBuilder::new("alice", "post")
                .category("news")
                .json_metadata("{}")
                .build(),
        )
        .unwrap();
    assert_eq!(again, root);
    assert_eq!(store.len(), 2);

    // An edit keeps the reply count and depth the store maintains
    assert_eq!(store.find_by_id(root).unwrap().children, 1);
    store
        .upsert(
            ContentBuilder::new("bob", "re")
                .reply_to("alice", "post")
                .json_metadata("{}")
                .build(),
        )
        .unwrap();
    assert_eq!(store.find_by_id(reply).unwrap().depth, 1);
    assert_eq!(store.find_by_id(root).unwrap().children, 1);
}

#[test]
fn test_store_reply_to_missing_parent_fails() {
    let mut store = MemoryContentStore::new();
    let err = store
        .upsert(ContentBuilder::new("bob", "re").reply_to("ghost", "nothing").build())
        .unwrap_err();
    assert!(matches!(err, IndexError::ContentNotFound { .. }));
    assert!(store.is_empty());
}

#[test]
fn test_store_category_and_parent() {
    let mut store = MemoryContentStore::new();
    store
        .upsert(ContentBuilder::new("alice", "post").category("news").build())
        .unwrap();
    store
        .upsert(ContentBuilder::new("bob", "r1").reply_to("alice", "post").build())
        .unwrap();
    store
        .upsert(ContentBuilder::new("carol", "r2").reply_to("bob", "r1").build())
        .unwrap();

    let deep = store.get_content("carol", "r2").unwrap();
    assert_eq!(store.category_of(deep, 255), "news");
    assert_eq!(store.category_of(deep, 1), "");
    assert_eq!(store.parent_of(deep).unwrap().permlink, "r1");
    assert!(store
        .parent_of(store.get_content("alice", "post").unwrap())
        .is_none());
}

#[test]
fn test_store_vote_close_remove() {
    let mut store = MemoryContentStore::new();
    store
        .upsert(ContentBuilder::new("alice", "post").build())
        .unwrap();
    store
        .upsert(ContentBuilder::new("bob", "re").reply_to("alice", "post").build())
        .unwrap();

    store.apply_vote("alice", "post", 1_000, 1).unwrap();
    let post = store.get_content("alice", "post").unwrap();
    assert_eq!(post.net_rshares, 1_000);
    assert_eq!(post.net_votes, 1);
    assert!(store.is_within_payout_window(post));

    store.close_payout("alice", "post").unwrap();
    assert!(!store.is_within_payout_window(store.get_content("alice", "post").unwrap()));

    store.remove("bob", "re").unwrap();
    assert!(store.get_content("bob", "re").is_none());
    assert_eq!(store.get_content("alice", "post").unwrap().children, 0);
    assert!(store.remove("bob", "re").is_err());
}

// ==================== Config & Operation Tests ====================

#[test]
fn test_config_defaults() {
    let config = IndexConfig::default();
    assert_eq!(config.max_tags, 5);
    assert_eq!(config.max_reply_depth, 255);
    assert_eq!(config.hot, ScoreParams::HOT);
    assert_eq!(config.trending.decay_seconds, 480_000);
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_toml_roundtrip() {
    let tmp = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    let config = IndexConfig {
        max_tags: 8,
        include_category: false,
        ..IndexConfig::default()
    };
    config.save(tmp.path()).unwrap();
    let loaded = IndexConfig::load(tmp.path()).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_config_partial_toml_uses_defaults() {
    let tmp = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    std::fs::write(tmp.path(), "max_tags = 3\n").unwrap();
    let loaded = IndexConfig::load(tmp.path()).unwrap();
    assert_eq!(loaded.max_tags, 3);
    assert_eq!(loaded.trending, ScoreParams::TRENDING);
    assert!(loaded.include_category);
}

#[test]
fn test_config_rejects_bad_tunables() {
    let tmp = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    std::fs::write(
        tmp.path(),
        "[hot]\nrshares_scale = 10000000\ndecay_seconds = 0\n",
    )
    .unwrap();
    assert!(matches!(
        IndexConfig::load(tmp.path()),
        Err(IndexError::Config(_))
    ));

    std::fs::write(tmp.path(), "max_tags = \"many\"\n").unwrap();
    assert!(matches!(
        IndexConfig::load(tmp.path()),
        Err(IndexError::Config(_))
    ));
}

#[test]
fn test_config_error_exit_codes() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml");
    match IndexConfig::resolve(Some(missing.as_path())) {
        Err(e) => {
            assert!(matches!(e, IndexError::Io(_)));
            assert_eq!(e.exit_code(), 1);
        }
        Ok(_) => panic!("missing config file should fail"),
    }

    let bad = dir.path().join("bad.toml");
    std::fs::write(&bad, "max_reply_depth = 0\n").unwrap();
    match IndexConfig::resolve(Some(bad.as_path())) {
        Err(e) => assert_eq!(e.exit_code(), 2),
        Ok(_) => panic!("zero depth should be rejected"),
    }

    assert_eq!(IndexError::EntryMissing(7).exit_code(), 4);
    assert_eq!(
        IndexError::QueryLimitExceeded { limit: 2, max: 1 }.exit_code(),
        3
    );
}

#[test]
fn test_operation_json() {
    let op: Operation = serde_json::from_str(
        r#"{"type": "comment_reward", "author": "alice", "permlink": "p", "payout": 42}"#,
    )
    .unwrap();
    assert_eq!(
        op,
        Operation::CommentReward {
            author: "alice".into(),
            permlink: "p".into(),
            payout: 42
        }
    );
    assert_eq!(op.kind(), "comment_reward");

    let other: Operation =
        serde_json::from_str(r#"{"type": "witness_update", "owner": "w", "fee": 1}"#).unwrap();
    assert_eq!(other, Operation::Other);
}
