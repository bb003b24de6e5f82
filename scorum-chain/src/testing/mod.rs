//! Fixtures shared by unit and integration tests.

#[macro_use]
mod macros;
mod builders;

pub use self::builders::{ChainStateBuilder, ConfigBuilder};

use crate::block::{Block, Transaction};
use crate::chain_state::apply_transaction;
use crate::error::Result;
use crate::operations::Operation;
use crate::services::DynamicGlobalPropertyService;
use crate::virtual_ops::VirtualOperation;
use crate::ChainState;

/// Apply a transaction made of `operation` alone, straight onto the head
/// state, the way genesis records are written.
pub fn apply_operation(
    state: &mut ChainState,
    operation: Operation,
) -> Result<Vec<VirtualOperation>> {
    let mut virtual_operations = Vec::new();
    apply_transaction(
        state.database_mut(),
        &Transaction::from(operation),
        &mut virtual_operations,
    )?;
    Ok(virtual_operations)
}

/// Move the head block time forward without producing a block.
pub fn advance_time(state: &mut ChainState, seconds: u32) {
    state
        .database_mut()
        .update_dynamic_global_properties(|p| p.time = p.time.add_seconds(seconds))
        .expect("global properties are created at genesis");
}

/// Block following the head, one block interval later.
pub fn next_block(state: &ChainState, witness: &str, transactions: Vec<Transaction>) -> Block {
    let props = state
        .database()
        .dynamic_global_properties()
        .expect("global properties are created at genesis");
    Block {
        block_num: props.head_block_number + 1,
        timestamp: props.time.add_seconds(state.config().block_interval),
        witness: witness.parse().expect("valid witness name"),
        transactions,
    }
}

pub fn produce_block(
    state: &mut ChainState,
    witness: &str,
    transactions: Vec<Transaction>,
) -> Result<Vec<VirtualOperation>> {
    let block = next_block(state, witness, transactions);
    state.apply_block(&block)
}
