use super::EvaluationContext;
use crate::error::{EvaluateError, Result};
use crate::operations::{
    SetWithdrawScorumpowerRouteToAccount, SetWithdrawScorumpowerRouteToDevPool,
    WithdrawScorumpower,
};
use crate::services::{AccountService, WithdrawVestingRouteService, WithdrawVestingService};
use crate::types::Withdrawable;

pub(super) fn withdraw_scorumpower(
    ctx: &mut EvaluationContext<'_>,
    op: &WithdrawScorumpower,
) -> Result<()> {
    let account = Withdrawable::Account(ctx.db.get_account(&op.account)?.id);
    if op.scorumpower.is_zero() {
        return ctx.db.stop_withdraw_vesting(account);
    }
    let available = ctx.db.available_scorumpower(account)?;
    ensure!(
        op.scorumpower.amount <= available.amount,
        EvaluateError::InsufficientFunds {
            account: op.account.to_string(),
            required: op.scorumpower,
            available,
        }
    )?;
    ctx.db.start_withdraw_vesting(account, op.scorumpower)
}

pub(super) fn set_withdraw_route_to_account(
    ctx: &mut EvaluationContext<'_>,
    op: &SetWithdrawScorumpowerRouteToAccount,
) -> Result<()> {
    let from = ctx.db.get_account(&op.from_account)?.id;
    let to = ctx.db.get_account(&op.to_account)?.id;
    ctx.db.set_withdraw_route(
        Withdrawable::Account(from),
        Withdrawable::Account(to),
        op.percent,
        op.auto_vest,
    )
}

pub(super) fn set_withdraw_route_to_dev_pool(
    ctx: &mut EvaluationContext<'_>,
    op: &SetWithdrawScorumpowerRouteToDevPool,
) -> Result<()> {
    let from = ctx.db.get_account(&op.from_account)?.id;
    ctx.db.set_withdraw_route(
        Withdrawable::Account(from),
        Withdrawable::DevPool,
        op.percent,
        op.auto_vest,
    )
}
