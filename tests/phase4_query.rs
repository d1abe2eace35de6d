//! Phase 4 tests: discovery queries and event file replay.

use std::io::Write;

use chrono::{DateTime, Utc};

use discovery_index::cli::commands::{cmd_replay, replay_file};
use discovery_index::engine::{
    extract_metadata, DiscoveryQuery, DiscoverySort, IndexMaintainer, QueryEngine,
};
use discovery_index::index::DiscoveryIndex;
use discovery_index::store::MemoryContentStore;
use discovery_index::types::{
    ContentBuilder, ContentId, IndexConfig, IndexError, TagType, MAX_QUERY_LIMIT,
};

// ==================== Helpers ====================

const T0: i64 = 1_600_000_000;

fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap()
}

/// Four indexed posts:
///
/// | post | tags | language | rshares | created |
/// |---|---|---|---|---|
/// | a | crypto, golos | en | 1e9 | T0 |
/// | b | crypto | ru | 1e8 | T0+10 |
/// | c | life | en | 0 | T0+20 |
/// | d | crypto, nsfw | en | 5e9 | T0+30 |
struct Corpus {
    store: MemoryContentStore,
    index: DiscoveryIndex,
    a: ContentId,
    b: ContentId,
    c: ContentId,
    d: ContentId,
}

fn corpus() -> Corpus {
    let config = IndexConfig::default();
    let maintainer = IndexMaintainer::new(config);
    let mut store = MemoryContentStore::new();
    let mut index = DiscoveryIndex::new();

    let mut add = |permlink: &str, tags: &[&str], language: &str, rshares: i64, offset: i64| {
        let json = serde_json::json!({ "tags": tags, "language": language }).to_string();
        let id = store
            .upsert(
                ContentBuilder::new("author", permlink)
                    .json_metadata(json)
                    .net_rshares(rshares)
                    .created(at(T0 + offset))
                    .build(),
            )
            .unwrap();
        maintainer
            .create_update_tags(&mut index, &store, "author", permlink)
            .unwrap();
        id
    };

    let a = add("a", &["crypto", "golos"], "en", 1_000_000_000, 0);
    let b = add("b", &["crypto"], "ru", 100_000_000, 10);
    let c = add("c", &["life"], "en", 0, 20);
    let d = add("d", &["crypto", "nsfw"], "en", 5_000_000_000, 30);

    Corpus {
        store,
        index,
        a,
        b,
        c,
        d,
    }
}

fn discover(corpus: &Corpus, query: DiscoveryQuery, sort: DiscoverySort) -> Vec<ContentId> {
    QueryEngine::new(IndexConfig::default())
        .discover(&corpus.index, &corpus.store, query, sort)
        .unwrap()
}

// ==================== Match Predicate Tests ====================

#[test]
fn test_matches_against_extracted_metadata() {
    let content = ContentBuilder::new("alice", "p")
        .json_metadata(r#"{"tags": ["golos", "crypto"], "language": "en"}"#)
        .build();
    let meta = extract_metadata(&content, "", &IndexConfig::default());

    assert!(DiscoveryQuery::new(10).select_tag("golos").matches(&meta));
    assert!(!DiscoveryQuery::new(10)
        .select_tag("golos")
        .filter_tag("crypto")
        .matches(&meta));
    assert!(!DiscoveryQuery::new(10).filter_language("en").matches(&meta));
    assert!(!DiscoveryQuery::new(10).select_tag("life").matches(&meta));
    assert!(DiscoveryQuery::new(10)
        .select_tag("life")
        .select_tag("crypto")
        .select_language("en")
        .matches(&meta));
}

// ==================== Discover Tests ====================

#[test]
fn test_discover_by_tag_hot() {
    let corpus = corpus();
    let ids = discover(
        &corpus,
        DiscoveryQuery::new(10).select_tag("crypto"),
        DiscoverySort::Hot,
    );
    assert_eq!(ids, vec![corpus.d, corpus.a, corpus.b]);
}

#[test]
fn test_discover_by_tag_created() {
    let corpus = corpus();
    let ids = discover(
        &corpus,
        DiscoveryQuery::new(10).select_tag("crypto"),
        DiscoverySort::Created,
    );
    assert_eq!(ids, vec![corpus.d, corpus.b, corpus.a]);
}

#[test]
fn test_discover_filter_wins_over_selector() {
    let corpus = corpus();
    let ids = discover(
        &corpus,
        DiscoveryQuery::new(10).select_tag("crypto").filter_tag("nsfw"),
        DiscoverySort::Trending,
    );
    assert_eq!(ids, vec![corpus.a, corpus.b]);
}

#[test]
fn test_discover_by_language() {
    let corpus = corpus();
    let ru = discover(
        &corpus,
        DiscoveryQuery::new(10).select_language("RU"),
        DiscoverySort::Hot,
    );
    assert_eq!(ru, vec![corpus.b]);

    let en_crypto = discover(
        &corpus,
        DiscoveryQuery::new(10).select_tag("crypto").select_language("en"),
        DiscoverySort::Hot,
    );
    assert_eq!(en_crypto, vec![corpus.d, corpus.a]);
}

#[test]
fn test_discover_unrestricted_respects_limit() {
    let corpus = corpus();
    let all = discover(&corpus, DiscoveryQuery::new(10), DiscoverySort::Hot);
    assert_eq!(all, vec![corpus.d, corpus.a, corpus.b, corpus.c]);

    let top = discover(&corpus, DiscoveryQuery::new(2), DiscoverySort::Hot);
    assert_eq!(top, vec![corpus.d, corpus.a]);
}

#[test]
fn test_index_orderings_by_tag() {
    let corpus = corpus();
    // Results borrow the index only, not the name used to look them up
    let (hot, created) = {
        let name = String::from("crypto");
        (
            corpus.index.by_hot(TagType::Tag, &name, 2),
            corpus.index.by_created(TagType::Tag, &name, 10),
        )
    };
    let hot: Vec<ContentId> = hot.iter().map(|e| e.content).collect();
    assert_eq!(hot, vec![corpus.d, corpus.a]);
    let created: Vec<ContentId> = created.iter().map(|e| e.content).collect();
    assert_eq!(created, vec![corpus.d, corpus.b, corpus.a]);

    let trending = corpus.index.by_trending(TagType::Language, "ru", 10);
    assert_eq!(trending.len(), 1);
    assert_eq!(trending[0].content, corpus.b);
}

#[test]
fn test_discover_rejects_bad_queries() {
    let corpus = corpus();
    let engine = QueryEngine::new(IndexConfig::default());

    let err = engine
        .discover(
            &corpus.index,
            &corpus.store,
            DiscoveryQuery::new(MAX_QUERY_LIMIT + 1),
            DiscoverySort::Hot,
        )
        .unwrap_err();
    assert!(matches!(err, IndexError::QueryLimitExceeded { .. }));

    let err = engine
        .discover(
            &corpus.index,
            &corpus.store,
            DiscoveryQuery::new(10).select_tag("Crypto").filter_tag("crypto "),
            DiscoverySort::Hot,
        )
        .unwrap_err();
    assert!(matches!(err, IndexError::SelectFilterOverlap { .. }));
    assert!(err.is_request());
}

#[test]
fn test_query_json_defaults() {
    let query: DiscoveryQuery = serde_json::from_str(r#"{"select_tags": ["rust"]}"#).unwrap();
    assert_eq!(query.limit, 20);
    assert!(query.has_tags_selector());
    assert!(!query.has_language_filter());
    assert_eq!(DiscoverySort::from_name("NEW"), Some(DiscoverySort::Created));
    assert_eq!(DiscoverySort::from_name("best"), None);
}

// ==================== Replay Tests ====================

const EVENTS: &str = r#"# two posts, a reward, then the reply is deleted
{"upsert": {"author": "alice", "permlink": "p1", "created": "2024-01-01T00:00:00Z", "cashout_time": "2024-01-08T00:00:00Z", "json_metadata": "{\"tags\": [\"rust\"], \"language\": \"en\"}"}}
{"op": {"type": "comment", "author": "alice", "permlink": "p1"}}
{"upsert": {"author": "bob", "permlink": "r1", "parent_author": "alice", "parent_permlink": "p1", "created": "2024-01-01T01:00:00Z", "cashout_time": "2024-01-08T01:00:00Z"}}
{"op": {"type": "comment", "author": "bob", "permlink": "r1"}}
{"op": {"type": "comment_reward", "author": "alice", "permlink": "p1", "payout": 40}}
{"op": {"type": "transfer", "from": "alice", "to": "bob", "amount": 1}}

{"remove": {"author": "bob", "permlink": "r1"}}
{"op": {"type": "delete_comment", "author": "bob", "permlink": "r1"}}
"#;

fn event_file(body: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(body.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_replay_file_builds_index() {
    let file = event_file(EVENTS);
    let replay = replay_file(file.path(), &IndexConfig::default()).unwrap();

    assert_eq!(replay.events, 8);
    assert_eq!(replay.operations, 5);
    assert_eq!(replay.store.len(), 1);
    assert_eq!(replay.index.entry_count(), 2);
    assert_eq!(replay.report.created, 3);
    assert_eq!(replay.report.removed, 1);

    let rust = replay.index.tag_stats(TagType::Tag, "rust").unwrap();
    assert_eq!(rust.top_posts, 1);
    assert_eq!(rust.total_payout, 40);
    assert!(replay.index.tag_stats(TagType::Tag, "").is_none());
    assert_eq!(replay.index.top_tags_by_posts(5).len(), 1);
    assert_eq!(replay.index.author_tags("alice").len(), 2);
    assert!(replay.index.author_tags("bob").is_empty());
    assert!(replay.index.verify().is_consistent());
}

#[test]
fn test_replay_rejects_malformed_line() {
    let file = event_file("{\"op\": {\"type\": \"comment\", \"author\": \"alice\"\n");
    let err = replay_file(file.path(), &IndexConfig::default()).unwrap_err();
    assert!(matches!(err, IndexError::Json(_)));
}

#[test]
fn test_replay_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = replay_file(&dir.path().join("absent.jsonl"), &IndexConfig::default()).unwrap_err();
    assert!(matches!(err, IndexError::Io(_)));
}

#[test]
fn test_replay_writes_snapshot() {
    let file = event_file(EVENTS);
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("snapshot.json");

    cmd_replay(file.path(), &IndexConfig::default(), Some(out.as_path()), true).unwrap();

    let snapshot: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(snapshot["entries"].as_array().unwrap().len(), 2);
    assert_eq!(snapshot["languages"][0]["name"], "en");
}
