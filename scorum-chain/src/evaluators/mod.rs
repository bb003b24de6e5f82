//! One evaluator per operation.
//!
//! An evaluator reads what it needs through the services, fails on the
//! first unmet precondition and only then changes state. Failures are never
//! caught here: the transaction session around the evaluation undoes any
//! partial work.

mod account;
mod budget;
mod comment;
mod proposal;
mod transfer;
mod vesting;
mod vote;
mod witness;

pub use self::vote::net_votes_delta;

use crate::database::Database;
use crate::error::Result;
use crate::operations::Operation;
use crate::virtual_ops::VirtualOperation;

/// Where an operation is evaluated: the database and the virtual operations
/// of the block being applied.
pub struct EvaluationContext<'a> {
    pub(crate) db: &'a mut Database,
    virtual_operations: &'a mut Vec<VirtualOperation>,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(db: &'a mut Database, virtual_operations: &'a mut Vec<VirtualOperation>) -> Self {
        EvaluationContext {
            db,
            virtual_operations,
        }
    }

    pub fn push_virtual_operation(&mut self, op: VirtualOperation) {
        self.virtual_operations.push(op);
    }
}

/// Validate then evaluate `operation`.
pub fn apply_operation(ctx: &mut EvaluationContext<'_>, operation: &Operation) -> Result<()> {
    operation.validate()?;
    match operation {
        Operation::AccountCreate(op) => account::account_create(ctx, op),
        Operation::AccountCreateByCommittee(op) => account::account_create_by_committee(ctx, op),
        Operation::Transfer(op) => transfer::transfer(ctx, op),
        Operation::TransferToScorumpower(op) => transfer::transfer_to_scorumpower(ctx, op),
        Operation::WithdrawScorumpower(op) => vesting::withdraw_scorumpower(ctx, op),
        Operation::SetWithdrawScorumpowerRouteToAccount(op) => {
            vesting::set_withdraw_route_to_account(ctx, op)
        }
        Operation::SetWithdrawScorumpowerRouteToDevPool(op) => {
            vesting::set_withdraw_route_to_dev_pool(ctx, op)
        }
        Operation::Comment(op) => comment::comment(ctx, op),
        Operation::CommentOptions(op) => comment::comment_options(ctx, op),
        Operation::Vote(op) => vote::vote(ctx, op),
        Operation::AccountWitnessVote(op) => witness::account_witness_vote(ctx, op),
        Operation::AccountWitnessProxy(op) => witness::account_witness_proxy(ctx, op),
        Operation::WitnessUpdate(op) => witness::witness_update(ctx, op),
        Operation::CreateBudget(op) => budget::create_budget(ctx, op),
        Operation::CloseBudget(op) => budget::close_budget(ctx, op),
        Operation::ProposalCreate(op) => proposal::proposal_create(ctx, op),
        Operation::ProposalVote(op) => proposal::proposal_vote(ctx, op),
    }
}
