//! Blocks as they are fed to the chain.

use crate::block_tasks::BlockInfo;
use crate::operations::Operation;
use crate::time::TimePointSec;
use crate::types::AccountName;
use serde_derive::{Deserialize, Serialize};
use thiserror::Error;

/// Operations applied atomically.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Transaction {
    pub operations: Vec<Operation>,
}

impl Transaction {
    pub fn new(operations: Vec<Operation>) -> Self {
        Transaction { operations }
    }
}

impl From<Operation> for Transaction {
    fn from(operation: Operation) -> Self {
        Transaction {
            operations: vec![operation],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Block {
    pub block_num: u32,
    pub timestamp: TimePointSec,
    /// Producer, credited with the witness reward.
    pub witness: AccountName,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn info(&self) -> BlockInfo {
        BlockInfo {
            block_num: self.block_num,
            timestamp: self.timestamp,
            witness: self.witness.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockError {
    #[error("block {found} does not follow the head, {expected} expected")]
    UnexpectedBlockNumber { expected: u32, found: u32 },
    #[error("block time {found} is not after the head time {head}")]
    TimestampNotIncreasing {
        head: TimePointSec,
        found: TimePointSec,
    },
    #[error("no reversible block to pop")]
    NoReversibleBlock,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::Asset;
    use crate::operations::Transfer;

    #[test]
    fn blocks_read_from_yaml() {
        let text = r#"
block_num: 2
timestamp: 1500000006
witness: alice
transactions:
  - operations:
      - type: transfer
        from: alice
        to: bob
        amount:
          amount: 1000
          symbol: SCR
        memo: ""
"#;
        let block: Block = serde_yaml::from_str(text).unwrap();
        assert_eq!(block.info().block_num, 2);
        assert_eq!(block.info().timestamp, TimePointSec(1_500_000_006));
        assert_eq!(
            block.transactions,
            vec![Transaction::from(Operation::Transfer(Transfer {
                from: "alice".parse().unwrap(),
                to: "bob".parse().unwrap(),
                amount: Asset::scr(1_000),
                memo: String::new(),
            }))]
        );

        let empty: Block =
            serde_yaml::from_str("block_num: 3\ntimestamp: 1500000009\nwitness: bob\n").unwrap();
        assert!(empty.transactions.is_empty());
    }
}
