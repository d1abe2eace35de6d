//! High-level operations over the discovery index.

pub mod dispatch;
pub mod maintainer;
pub mod metadata;
pub mod query;
pub mod score;
pub mod shared;

pub use dispatch::{IndexContext, OperationDispatcher};
pub use maintainer::{IndexMaintainer, MaintenanceReport};
pub use metadata::{extract_metadata, metadata_for, normalize_name, ContentMetadata};
pub use query::{DiscoveryQuery, DiscoverySort, QueryEngine};
pub use score::{calculate_hot, calculate_score, calculate_trending};
pub use shared::SharedIndex;
