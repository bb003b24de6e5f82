use super::EvaluationContext;
use crate::error::Result;
use crate::operations::{ProposalCreate, ProposalVote};
use crate::services::{AccountService, ProposalService};
use crate::virtual_ops::VirtualOperation;
use chainbase::ObjectId;

pub(super) fn proposal_create(ctx: &mut EvaluationContext<'_>, op: &ProposalCreate) -> Result<()> {
    ctx.db
        .create_proposal(&op.creator, op.action.clone(), op.lifetime_sec)?;
    Ok(())
}

pub(super) fn proposal_vote(ctx: &mut EvaluationContext<'_>, op: &ProposalVote) -> Result<()> {
    ctx.db.check_account_existence(&op.voting_account)?;
    let executed = ctx
        .db
        .vote_for_proposal(ObjectId::new(op.proposal_id), &op.voting_account)?;
    for action in executed {
        ctx.push_virtual_operation(VirtualOperation::ProposalVirtual { action });
    }
    Ok(())
}
