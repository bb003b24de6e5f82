//! Work done once per block after its transactions, in a fixed order.
//!
//! Funds are distributed before comments are cashed out so that the
//! content reward funds already hold this block's share.

mod active_sp_holders;
mod comments_cashout;
mod funds;
mod hardforks;
mod registration_bonus;
mod vesting_withdrawals;

pub use self::active_sp_holders::process_active_sp_holders_cashout;
pub use self::comments_cashout::process_comments_cashout;
pub use self::funds::process_funds;
pub use self::hardforks::process_hardforks;
pub use self::registration_bonus::process_account_registration_bonus_expiration;
pub use self::vesting_withdrawals::process_vesting_withdrawals;

use crate::database::Database;
use crate::error::Result;
use crate::services::{DynamicGlobalPropertyService, ProposalService};
use crate::time::TimePointSec;
use crate::types::AccountName;
use crate::virtual_ops::VirtualOperation;

/// Block the tasks run for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockInfo {
    pub block_num: u32,
    pub timestamp: TimePointSec,
    pub witness: AccountName,
}

/// What every block task works with: the database, the block and the
/// virtual operations emitted so far.
pub struct BlockTaskContext<'a> {
    pub(crate) db: &'a mut Database,
    block: &'a BlockInfo,
    virtual_operations: &'a mut Vec<VirtualOperation>,
}

impl<'a> BlockTaskContext<'a> {
    pub fn new(
        db: &'a mut Database,
        block: &'a BlockInfo,
        virtual_operations: &'a mut Vec<VirtualOperation>,
    ) -> Self {
        BlockTaskContext {
            db,
            block,
            virtual_operations,
        }
    }

    pub fn block(&self) -> &BlockInfo {
        self.block
    }

    pub fn database(&self) -> &Database {
        self.db
    }

    pub fn push_virtual_operation(&mut self, op: VirtualOperation) {
        self.virtual_operations.push(op);
    }
}

/// Run every block task in order.
pub fn apply_block_tasks(ctx: &mut BlockTaskContext<'_>) -> Result<()> {
    let block_num = ctx.block().block_num;
    let _span = tracing::debug_span!("block_tasks", block_num).entered();

    process_funds(ctx)?;
    process_comments_cashout(ctx)?;
    process_vesting_withdrawals(ctx)?;
    process_active_sp_holders_cashout(ctx)?;
    process_account_registration_bonus_expiration(ctx)?;

    let now = ctx.db.head_block_time()?;
    let expired = ctx.db.clear_expired_proposals(now)?;
    if expired > 0 {
        tracing::debug!(expired, "expired proposals cleared");
    }

    process_hardforks(ctx)
}
