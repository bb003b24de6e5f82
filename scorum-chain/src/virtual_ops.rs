//! Audit trail of state changes that no transaction spelled out.

use crate::asset::Asset;
use crate::schema::{BudgetKind, ProposalAction};
use crate::types::{AccountName, Hardfork};
use serde_derive::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use thiserror::Error;

/// Holder of scorumpower taking part in a withdrawal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VestingParty {
    Account(AccountName),
    DevPool,
}

impl fmt::Display for VestingParty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VestingParty::Account(name) => name.fmt(f),
            VestingParty::DevPool => f.write_str("dev pool"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VirtualOperation {
    AuthorReward {
        author: AccountName,
        permlink: String,
        reward: Asset,
    },
    CurationReward {
        curator: AccountName,
        reward: Asset,
        comment_author: AccountName,
        comment_permlink: String,
    },
    CommentReward {
        author: AccountName,
        permlink: String,
        fund_reward: Asset,
        total_payout: Asset,
        author_payout: Asset,
        curators_payout: Asset,
        from_children_payout: Asset,
        to_parent_payout: Asset,
        beneficiaries_payout: Asset,
    },
    CommentBenefactorReward {
        benefactor: AccountName,
        author: AccountName,
        permlink: String,
        reward: Asset,
    },
    CommentPayoutUpdate {
        author: AccountName,
        permlink: String,
    },
    ProducerReward {
        producer: AccountName,
        reward: Asset,
    },
    ActiveSpHoldersReward {
        sp_holder: AccountName,
        reward: Asset,
    },
    /// Immediate payment of every active holder at once, as done before
    /// hardfork 0.2.
    ActiveSpHoldersRewardLegacy {
        rewarded: BTreeMap<AccountName, Asset>,
    },
    FillVestingWithdraw {
        from: VestingParty,
        to: VestingParty,
        withdrawn: Asset,
        deposited: Asset,
    },
    FinishedVestingWithdraw {
        from: VestingParty,
    },
    AllocateCashFromBudget {
        kind: BudgetKind,
        owner: Option<AccountName>,
        budget_id: u64,
        cash: Asset,
    },
    CashBackFromBudgetToOwner {
        kind: BudgetKind,
        owner: AccountName,
        budget_id: u64,
        cash: Asset,
    },
    ProposalVirtual {
        action: ProposalAction,
    },
    Hardfork {
        hardfork: Hardfork,
    },
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("cannot write virtual operation")]
    Io(#[from] std::io::Error),
    #[error("cannot encode virtual operation")]
    Encode(#[from] serde_json::Error),
    #[error("{0}")]
    Rejected(String),
}

/// Consumer of the virtual operations of applied blocks.
///
/// Sinks sit outside of consensus: a failing sink is logged and the chain
/// carries on.
pub trait VirtualOperationSink {
    fn accept(&mut self, block_num: u32, op: &VirtualOperation) -> Result<(), SinkError>;
}

/// Keeps every operation in memory.
#[derive(Debug, Default)]
pub struct VecSink {
    pub operations: Vec<(u32, VirtualOperation)>,
}

impl VirtualOperationSink for VecSink {
    fn accept(&mut self, block_num: u32, op: &VirtualOperation) -> Result<(), SinkError> {
        self.operations.push((block_num, op.clone()));
        Ok(())
    }
}

#[derive(Serialize)]
struct JsonLine<'a> {
    block: u32,
    #[serde(flatten)]
    op: &'a VirtualOperation,
}

/// Writes one JSON object per line.
pub struct JsonLinesSink<W> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        JsonLinesSink { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> VirtualOperationSink for JsonLinesSink<W> {
    fn accept(&mut self, block_num: u32, op: &VirtualOperation) -> Result<(), SinkError> {
        serde_json::to_writer(&mut self.writer, &JsonLine { block: block_num, op })?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_lines_are_tagged() {
        let mut sink = JsonLinesSink::new(Vec::new());
        let op = VirtualOperation::ProducerReward {
            producer: "alice".parse().unwrap(),
            reward: Asset::sp(1_500),
        };
        sink.accept(7, &op).unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();
        let value: serde_json::Value = serde_json::from_str(text.trim_end()).unwrap();
        assert_eq!(value["block"], 7);
        assert_eq!(value["type"], "producer_reward");
        assert_eq!(value["producer"], "alice");
        assert_eq!(value["reward"]["symbol"], "SP");
    }

    #[test]
    fn encodes_to_json_and_binary() {
        let op = VirtualOperation::CommentPayoutUpdate {
            author: "bob".parse().unwrap(),
            permlink: "post".to_owned(),
        };
        let back: VirtualOperation =
            serde_json::from_slice(&serde_json::to_vec(&op).unwrap()).unwrap();
        assert_eq!(back, op);

        let bytes = bincode::serialize(&op).unwrap();
        assert_eq!(bytes, bincode::serialize(&op.clone()).unwrap());
        assert!(!bytes.is_empty());
    }
}
