//! CLI command implementations.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::{
    DiscoveryQuery, DiscoverySort, IndexContext, MaintenanceReport, OperationDispatcher,
    QueryEngine,
};
use crate::index::DiscoveryIndex;
use crate::store::{ContentStore, MemoryContentStore};
use crate::types::{Content, IndexConfig, IndexResult, Operation, TagStats, TagType};

/// One line of a replay file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayEvent {
    /// The ledger wrote a content record.
    Upsert(Content),
    /// The ledger deleted a content record.
    Remove { author: String, permlink: String },
    /// A committed operation for the index.
    Op(Operation),
}

/// Store and index state after replaying a file.
#[derive(Debug)]
pub struct Replay {
    pub store: MemoryContentStore,
    pub index: DiscoveryIndex,
    /// Events read.
    pub events: usize,
    /// Operations dispatched.
    pub operations: usize,
    /// Combined maintenance effect of all operations.
    pub report: MaintenanceReport,
}

/// Replay a JSON-lines event file into a fresh store and index.
///
/// Blank lines and lines starting with `#` are skipped.
pub fn replay_file(path: &Path, config: &IndexConfig) -> IndexResult<Replay> {
    let reader = BufReader::new(File::open(path)?);
    let dispatcher = OperationDispatcher::new(config.clone());
    let mut replay = Replay {
        store: MemoryContentStore::new(),
        index: DiscoveryIndex::new(),
        events: 0,
        operations: 0,
        report: MaintenanceReport::default(),
    };

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let event: ReplayEvent = serde_json::from_str(trimmed).inspect_err(|e| {
            log::warn!("{}:{}: {}", path.display(), line_no + 1, e);
        })?;
        replay.events += 1;

        match event {
            ReplayEvent::Upsert(content) => {
                replay.store.upsert(content)?;
            }
            ReplayEvent::Remove { author, permlink } => {
                replay.store.remove(&author, &permlink)?;
            }
            ReplayEvent::Op(op) => {
                let mut ctx = IndexContext::new(&mut replay.index, &replay.store);
                let report = dispatcher.apply(&mut ctx, &op)?;
                replay.report.merge(report);
                replay.operations += 1;
            }
        }
    }

    log::info!(
        "replayed {} events ({} operations) from {}",
        replay.events,
        replay.operations,
        path.display()
    );
    Ok(replay)
}

/// Replay a file and print a summary, optionally writing a JSON snapshot.
pub fn cmd_replay(
    path: &Path,
    config: &IndexConfig,
    snapshot: Option<&Path>,
    json: bool,
) -> IndexResult<()> {
    let replay = replay_file(path, config)?;
    let index = &replay.index;

    if let Some(out) = snapshot {
        let file = File::create(out)?;
        serde_json::to_writer_pretty(file, &index.snapshot())?;
    }

    let tag_rows = index.stats().tag_rows().count();
    let author_rows = index.stats().author_rows().count();
    if json {
        let info = serde_json::json!({
            "file": path.display().to_string(),
            "events": replay.events,
            "operations": replay.operations,
            "contents": replay.store.len(),
            "entries": index.entry_count(),
            "tag_stats": tag_rows,
            "author_stats": author_rows,
            "languages": index.languages().iter().map(|l| l.name.clone()).collect::<Vec<_>>(),
            "created": replay.report.created,
            "refreshed": replay.report.refreshed,
            "removed": replay.report.removed,
        });
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        println!("File: {}", path.display());
        println!("Events: {}", replay.events);
        println!("Operations: {}", replay.operations);
        println!("Contents: {}", replay.store.len());
        println!("Tag entries: {}", index.entry_count());
        println!("Tag stats rows: {}", tag_rows);
        println!("Author stats rows: {}", author_rows);
        let languages: Vec<String> = index.languages().into_iter().map(|l| l.name).collect();
        println!("Languages: {}", languages.join(", "));
        println!(
            "Entries created/refreshed/removed: {}/{}/{}",
            replay.report.created, replay.report.refreshed, replay.report.removed
        );
    }
    if let Some(out) = snapshot {
        log::info!("snapshot written to {}", out.display());
    }
    Ok(())
}

/// Print one tag's stats row, or the top tags by post count.
pub fn cmd_stats(
    path: &Path,
    config: &IndexConfig,
    tag: Option<&str>,
    limit: usize,
    json: bool,
) -> IndexResult<()> {
    let replay = replay_file(path, config)?;
    let stats = replay.index.stats();
    let rows: Vec<&TagStats> = match tag {
        Some(name) => stats
            .tag_stats(TagType::Tag, name)
            .into_iter()
            .chain(stats.tag_stats(TagType::Language, name))
            .collect(),
        None => stats.top_tags_by_posts(limit),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        println!(
            "{:<10} {:<24} {:>9} {:>9} {:>10} {:>14}",
            "TYPE", "NAME", "POSTS", "COMMENTS", "VOTES", "PAYOUT"
        );
        for row in rows {
            let name = if row.name.is_empty() { "(none)" } else { row.name.as_str() };
            println!(
                "{:<10} {:<24} {:>9} {:>9} {:>10} {:>14}",
                row.tag_type.name(), name, row.top_posts, row.comments, row.net_votes, row.total_payout
            );
        }
    }
    Ok(())
}

/// Run a discovery query against a replayed index.
pub fn cmd_query(
    path: &Path,
    config: &IndexConfig,
    query: DiscoveryQuery,
    sort: DiscoverySort,
    json: bool,
) -> IndexResult<()> {
    let replay = replay_file(path, config)?;
    let engine = QueryEngine::new(config.clone());
    let ids = engine.discover(&replay.index, &replay.store, query, sort)?;
    let contents: Vec<&Content> = ids
        .iter()
        .filter_map(|&id| replay.store.find_by_id(id))
        .collect();

    if json {
        let rows: Vec<serde_json::Value> = contents
            .iter()
            .map(|c| {
                serde_json::json!({
                    "id": c.id,
                    "author": c.author,
                    "permlink": c.permlink,
                    "net_rshares": c.net_rshares,
                    "created": c.created.to_rfc3339(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        for c in contents {
            println!(
                "{:>6}  {}/{}  rshares={}  created={}",
                c.id,
                c.author,
                c.permlink,
                c.net_rshares,
                c.created.to_rfc3339()
            );
        }
    }
    Ok(())
}

/// Audit aggregates against entries. Returns whether the index is consistent.
pub fn cmd_verify(path: &Path, config: &IndexConfig, json: bool) -> IndexResult<bool> {
    let replay = replay_file(path, config)?;
    let report = replay.index.verify();
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Entries audited: {}", report.entries);
        if report.is_consistent() {
            println!("Consistent");
        } else {
            for drift in &report.drift {
                println!("DRIFT {:?}", drift);
            }
        }
    }
    Ok(report.is_consistent())
}
