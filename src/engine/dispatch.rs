//! Maps committed ledger operations onto index maintenance.

use crate::index::DiscoveryIndex;
use crate::store::ContentStore;
use crate::types::{IndexConfig, IndexResult, Operation};

use super::maintainer::{IndexMaintainer, MaintenanceReport};

/// Everything one dispatch needs: the index to write and the content to read.
pub struct IndexContext<'a> {
    pub index: &'a mut DiscoveryIndex,
    pub store: &'a dyn ContentStore,
}

impl<'a> IndexContext<'a> {
    /// Bundle an index and a content store for dispatch.
    pub fn new(index: &'a mut DiscoveryIndex, store: &'a dyn ContentStore) -> Self {
        Self { index, store }
    }
}

/// Applies each operation kind to the index.
///
/// | operation | effect |
/// |---|---|
/// | comment | create/update tags while in the payout window |
/// | vote | refresh existing entries up the reply chain |
/// | comment_reward | refresh, then credit payout per name |
/// | comment_payout_update | refresh, or remove once the window closed |
/// | delete_comment | sweep the author's orphan entries |
/// | anything else | nothing |
pub struct OperationDispatcher {
    maintainer: IndexMaintainer,
}

impl OperationDispatcher {
    /// Create a dispatcher with the given tunables.
    pub fn new(config: IndexConfig) -> Self {
        Self {
            maintainer: IndexMaintainer::new(config),
        }
    }

    /// The underlying maintainer.
    pub fn maintainer(&self) -> &IndexMaintainer {
        &self.maintainer
    }

    /// Apply one operation. Invariant faults are logged and propagated.
    pub fn apply(
        &self,
        ctx: &mut IndexContext<'_>,
        op: &Operation,
    ) -> IndexResult<MaintenanceReport> {
        let result = self.dispatch(ctx, op);
        if let Err(e) = &result {
            if e.is_invariant() {
                log::error!("{} aborted by index fault: {}", op.kind(), e);
            }
        }
        result
    }

    /// Apply operations in order, stopping at the first failure.
    pub fn apply_all<'o>(
        &self,
        ctx: &mut IndexContext<'_>,
        ops: impl IntoIterator<Item = &'o Operation>,
    ) -> IndexResult<MaintenanceReport> {
        let mut report = MaintenanceReport::default();
        for op in ops {
            report.merge(self.apply(ctx, op)?);
        }
        Ok(report)
    }

    fn dispatch(
        &self,
        ctx: &mut IndexContext<'_>,
        op: &Operation,
    ) -> IndexResult<MaintenanceReport> {
        let index = &mut *ctx.index;
        let store = ctx.store;
        let m = &self.maintainer;

        match op {
            Operation::Comment {
                author, permlink, ..
            } => {
                let content = store.require(author, permlink)?;
                if store.is_within_payout_window(content) {
                    m.create_update_tags(index, store, author, permlink)
                } else {
                    Ok(MaintenanceReport::default())
                }
            }
            Operation::Vote {
                author, permlink, ..
            } => m.update_tags(index, store, author, permlink),
            Operation::CommentReward {
                author,
                permlink,
                payout,
            } => m.apply_reward(index, store, author, permlink, *payout),
            Operation::CommentPayoutUpdate { author, permlink } => {
                let content = store.require(author, permlink)?;
                if store.is_within_payout_window(content) {
                    m.update_tags(index, store, author, permlink)
                } else {
                    m.remove_tags(index, store, author, permlink)
                }
            }
            Operation::DeleteComment { author, .. } => m.sweep_orphans(index, store, author),
            Operation::Transfer { .. } | Operation::Other => Ok(MaintenanceReport::default()),
        }
    }
}
