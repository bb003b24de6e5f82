//! Scorum state transition.
//!
//! The [`Database`] holds every record of the chain in
//! [`chainbase`] indices. Services (traits implemented by the database)
//! are the only way records change; evaluators apply transaction operations
//! through them and block tasks distribute rewards once per block.
//! [`ChainState`] ties everything together: it applies blocks inside undo
//! sessions so that any block can be reverted until it is irreversible.
#[cfg(test)]
extern crate quickcheck;

#[macro_use]
mod macros;
#[cfg(any(test, feature = "testing"))]
#[macro_use]
pub mod testing;

pub mod asset;
pub mod block;
pub mod block_tasks;
pub mod chain_state;
pub mod config;
pub mod database;
pub mod error;
pub mod evaluators;
pub mod genesis;
pub mod operations;
pub mod schema;
pub mod services;
pub mod snapshot;
pub mod time;
pub mod types;
pub mod virtual_ops;

pub use crate::chain_state::{ChainState, SharedChainState};
pub use crate::database::Database;
pub use crate::error::{Error, Result};
pub use rewards_math::{CurveId, Percent, PERCENT_1, PERCENT_100};
