//! Committed ledger operations consumed by the dispatcher.

use serde::{Deserialize, Serialize};

use super::{AccountName, Amount};

/// A committed ledger operation, tagged by its variant kind.
///
/// Only the variants the index reacts to carry payloads; anything else
/// deserializes to [`Operation::Other`] and is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    /// Content was created or edited.
    Comment {
        author: AccountName,
        permlink: String,
        #[serde(default)]
        parent_author: AccountName,
        #[serde(default)]
        parent_permlink: String,
    },
    /// A vote was cast or changed on content.
    Vote {
        voter: AccountName,
        author: AccountName,
        permlink: String,
        #[serde(default)]
        weight: i16,
    },
    /// Rewards were paid out for one content item.
    CommentReward {
        author: AccountName,
        permlink: String,
        payout: Amount,
    },
    /// The payout window of a content item moved or closed.
    CommentPayoutUpdate {
        author: AccountName,
        permlink: String,
    },
    /// Content was deleted from the ledger.
    DeleteComment {
        author: AccountName,
        permlink: String,
    },
    /// A balance transfer; never touches the index.
    Transfer {
        from: AccountName,
        to: AccountName,
        amount: Amount,
        #[serde(default)]
        memo: String,
    },
    /// Any other operation kind.
    #[serde(other)]
    Other,
}

impl Operation {
    /// Short name of the operation kind, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Comment { .. } => "comment",
            Self::Vote { .. } => "vote",
            Self::CommentReward { .. } => "comment_reward",
            Self::CommentPayoutUpdate { .. } => "comment_payout_update",
            Self::DeleteComment { .. } => "delete_comment",
            Self::Transfer { .. } => "transfer",
            Self::Other => "other",
        }
    }
}
