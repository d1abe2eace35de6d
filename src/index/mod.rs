//! Index storage: tag entries, aggregates, and the composite discovery index.

pub mod discovery;
pub mod stats_index;
pub mod tag_index;

pub use discovery::{ConsistencyReport, DiscoveryIndex, Drift, IndexSnapshot};
pub use stats_index::StatsIndex;
pub use tag_index::TagIndex;
