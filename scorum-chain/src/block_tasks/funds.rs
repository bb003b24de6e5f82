use super::BlockTaskContext;
use crate::asset::{Asset, Symbol};
use crate::config::CrutchTarget;
use crate::error::Result;
use crate::schema::{AccountObject, BudgetKind, BudgetObject};
use crate::services::{
    AccountService, BudgetService, DevPoolService, DynamicGlobalPropertyService,
    RewardBalancerService, RewardFundService,
};
use crate::types::Hardfork;
use crate::virtual_ops::VirtualOperation;
use chainbase::ObjectId;
use std::collections::BTreeMap;

/// Collect this block's budget allocations and split them between the
/// development pool, the block producer, active stake holders and the
/// content reward funds.
///
/// Advertising income goes half to the development pool; the rest, with
/// the liquid part of the fund budget, is smoothed by the reward balancer.
/// The staked part of the fund budget is distributed as is.
pub fn process_funds(ctx: &mut BlockTaskContext<'_>) -> Result<()> {
    apply_schedule_crutches(ctx)?;

    let mut advertising = Asset::scr(0);
    for kind in [BudgetKind::Post, BudgetKind::Banner].iter() {
        for id in ctx.db.budgets_of_kind(*kind) {
            advertising = (advertising + allocate(ctx, id)?)?;
        }
    }

    let mut fund_scr = Asset::scr(0);
    let mut fund_sp = Asset::sp(0);
    for id in ctx.db.budgets_of_kind(BudgetKind::Fund) {
        let cash = allocate(ctx, id)?;
        match cash.symbol {
            Symbol::Scr => fund_scr = (fund_scr + cash)?,
            Symbol::Sp => fund_sp = (fund_sp + cash)?,
        }
    }

    let dev_team_reward = advertising.percent(ctx.db.config.dev_team_reward_percent);
    if dev_team_reward.is_positive() {
        ctx.db.increase_dev_pool(dev_team_reward)?;
    }

    let balanced = ((advertising - dev_team_reward)? + fund_scr)?;
    ctx.db.increase_reward_balancer(balanced)?;
    let scr_users_reward = ctx.db.take_block_reward()?;

    tracing::trace!(
        advertising = %advertising,
        dev = %dev_team_reward,
        scr = %scr_users_reward,
        sp = %fund_sp,
        "users reward"
    );

    distribute_users_reward(ctx, scr_users_reward)?;
    if fund_sp.is_positive() {
        distribute_users_reward(ctx, fund_sp)?;
    }
    Ok(())
}

fn allocate(
    ctx: &mut BlockTaskContext<'_>,
    id: ObjectId<BudgetObject>,
) -> Result<Asset> {
    let budget = ctx.db.get_budget(id)?;
    let (kind, owner) = (budget.kind, budget.owner.clone());
    let allocation = ctx.db.allocate_cash(id)?;

    if allocation.cash.is_positive() {
        ctx.push_virtual_operation(VirtualOperation::AllocateCashFromBudget {
            kind,
            owner: owner.clone(),
            budget_id: id.value(),
            cash: allocation.cash,
        });
    }
    if let (Some(refund), Some(owner)) = (allocation.refund, owner) {
        if refund.is_positive() {
            ctx.push_virtual_operation(VirtualOperation::CashBackFromBudgetToOwner {
                kind,
                owner,
                budget_id: id.value(),
                cash: refund,
            });
        }
    }
    Ok(allocation.cash)
}

fn apply_schedule_crutches(ctx: &mut BlockTaskContext<'_>) -> Result<()> {
    let block_num = ctx.block().block_num;
    let crutches: Vec<_> = ctx.db.config.crutches_at(block_num).cloned().collect();
    for crutch in crutches {
        tracing::info!(block_num, target = ?crutch.target, per_block = crutch.per_block, "schedule patched");
        match crutch.target {
            CrutchTarget::FundBudget => {
                for id in ctx.db.budgets_of_kind(BudgetKind::Fund) {
                    let symbol = ctx.db.get_budget(id)?.balance.symbol;
                    ctx.db
                        .set_budget_per_block(id, Asset::new(crutch.per_block, symbol))?;
                }
            }
            CrutchTarget::RewardBalancer => {
                ctx.db
                    .set_current_per_block_reward(Asset::scr(crutch.per_block))?;
            }
        }
    }
    Ok(())
}

fn distribute_users_reward(ctx: &mut BlockTaskContext<'_>, reward: Asset) -> Result<()> {
    let config = &ctx.db.config;
    let witness_reward = reward.percent(config.witness_reward_percent);
    let active_sp_holders_reward = reward.percent(config.active_sp_holders_reward_percent);

    pay_witness(ctx, witness_reward)?;
    let undistributed = distribute_active_sp_holders_reward(ctx, active_sp_holders_reward)?;

    let content_reward = ((reward - witness_reward)? - active_sp_holders_reward)?;
    let content_reward = (content_reward + undistributed)?;
    if content_reward.is_positive() {
        ctx.db.increase_reward_fund(content_reward)?;
    }
    Ok(())
}

/// The producer is reported every block, a zero reward included.
fn pay_witness(ctx: &mut BlockTaskContext<'_>, reward: Asset) -> Result<()> {
    let producer = ctx.block().witness.clone();
    let reward = if reward.is_positive() {
        let id = ctx.db.get_account(&producer)?.id;
        ctx.db.create_scorumpower(id, reward)?
    } else {
        Asset::sp(0)
    };
    ctx.push_virtual_operation(VirtualOperation::ProducerReward { producer, reward });
    Ok(())
}

/// Accounts that voted within the reward period, weighted by the
/// scorumpower they voted with.
fn active_sp_holders(ctx: &BlockTaskContext<'_>) -> Result<Vec<(ObjectId<AccountObject>, i64)>> {
    let now = ctx.db.head_block_time()?;
    let period = ctx.db.config.active_sp_holders_reward_period_seconds;
    Ok(ctx
        .db
        .accounts
        .iter()
        .filter(|a| a.vote_reward_competitive_sp.is_positive())
        .filter(|a| a.last_vote_time.add_seconds(period) > now)
        .map(|a| (a.id, a.vote_reward_competitive_sp.amount))
        .collect())
}

/// Share `reward` among active stake holders. Returns the part nobody
/// received.
fn distribute_active_sp_holders_reward(
    ctx: &mut BlockTaskContext<'_>,
    reward: Asset,
) -> Result<Asset> {
    if !reward.is_positive() {
        return Ok(reward);
    }
    let holders = active_sp_holders(ctx)?;
    let total: u128 = holders.iter().map(|(_, sp)| *sp as u128).sum();
    if total == 0 {
        return Ok(reward);
    }

    let pending = ctx.db.has_hardfork(Hardfork::HARDFORK_0_2)?;
    let mut distributed = Asset::zero(reward.symbol);
    let mut rewarded = BTreeMap::new();
    for (id, sp) in holders {
        let share = reward.fraction(sp as u128, total);
        if share.is_zero() {
            continue;
        }
        match (pending, share.symbol) {
            (true, Symbol::Scr) => ctx.db.increase_pending_balance(id, share)?,
            (true, Symbol::Sp) => ctx.db.increase_pending_scorumpower(id, share)?,
            (false, Symbol::Scr) => ctx.db.increase_balance(id, share)?,
            (false, Symbol::Sp) => ctx.db.increase_scorumpower(id, share)?,
        }
        if pending {
            ctx.db.update_active_sp_holders_cashout_time(id)?;
        } else {
            rewarded.insert(ctx.db.get_account_by_id(id)?.name.clone(), share);
        }
        distributed = (distributed + share)?;
    }

    if !rewarded.is_empty() {
        ctx.push_virtual_operation(VirtualOperation::ActiveSpHoldersRewardLegacy { rewarded });
    }
    Ok((reward - distributed)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block_tasks::BlockInfo;
    use crate::testing::{ChainStateBuilder, ConfigBuilder};

    fn next_block(state: &mut crate::ChainState) -> BlockInfo {
        let db = state.database_mut();
        let interval = db.config().block_interval;
        db.update_dynamic_global_properties(|p| {
            p.head_block_number += 1;
            p.time = p.time.add_seconds(interval);
        })
        .unwrap();
        BlockInfo {
            block_num: db.head_block_num().unwrap(),
            timestamp: db.head_block_time().unwrap(),
            witness: "alice".parse().unwrap(),
        }
    }

    #[test]
    fn advertising_is_split_with_the_dev_pool() {
        let mut state = ChainStateBuilder::new()
            .with_account("alice", Asset::scr(10_000), Asset::sp(0))
            .build()
            .unwrap();
        let db = state.database_mut();
        let owner = db.get_account(&"alice".parse().unwrap()).unwrap().id;
        let deadline = db.head_block_time().unwrap().add_seconds(3_000);
        // 10 per block
        db.create_budget(owner, BudgetKind::Post, Asset::scr(10_000), deadline, "ad")
            .unwrap();
        let fund_before = db.get_reward_fund(Symbol::Scr).unwrap().activity_reward_balance;

        let info = next_block(&mut state);
        let db = state.database_mut();
        let mut vops = Vec::new();
        process_funds(&mut BlockTaskContext::new(db, &info, &mut vops)).unwrap();

        assert_eq!(db.get_dev_pool().unwrap().scr_balance, Asset::scr(5));
        // the balancer pays its minimum rate, too little for a witness share
        assert_eq!(db.get_reward_balancer().unwrap().balance, Asset::scr(4));
        assert_eq!(
            db.get_reward_fund(Symbol::Scr).unwrap().activity_reward_balance,
            (fund_before + Asset::scr(1)).unwrap()
        );
        assert_eq!(
            vops,
            vec![
                VirtualOperation::AllocateCashFromBudget {
                    kind: BudgetKind::Post,
                    owner: Some("alice".parse().unwrap()),
                    budget_id: 0,
                    cash: Asset::scr(10),
                },
                VirtualOperation::ProducerReward {
                    producer: "alice".parse().unwrap(),
                    reward: Asset::sp(0),
                },
            ]
        );
    }

    #[test]
    fn active_sp_holders_share_before_and_after_hardfork() {
        let mut state = ChainStateBuilder::new()
            .with_account("alice", Asset::scr(0), Asset::sp(0))
            .with_account("bob", Asset::scr(0), Asset::sp(300))
            .with_account("carol", Asset::scr(0), Asset::sp(100))
            .build()
            .unwrap();
        let db = state.database_mut();
        for name in ["bob", "carol"].iter() {
            let id = db.get_account(&name.parse().unwrap()).unwrap().id;
            db.update_voting_power(id, 9_000).unwrap();
        }

        let info = next_block(&mut state);
        let db = state.database_mut();
        let mut vops = Vec::new();
        let mut ctx = BlockTaskContext::new(db, &info, &mut vops);
        let left = distribute_active_sp_holders_reward(&mut ctx, Asset::scr(100)).unwrap();
        assert_eq!(left, Asset::scr(0));
        let bob = db.get_account(&"bob".parse().unwrap()).unwrap();
        assert_eq!(bob.balance, Asset::scr(75));
        assert!(matches!(
            vops.as_slice(),
            [VirtualOperation::ActiveSpHoldersRewardLegacy { rewarded }] if rewarded.len() == 2
        ));

        db.update_dynamic_global_properties(|p| p.hardfork = Hardfork::HARDFORK_0_2)
            .unwrap();
        let mut vops = Vec::new();
        let mut ctx = BlockTaskContext::new(db, &info, &mut vops);
        let left = distribute_active_sp_holders_reward(&mut ctx, Asset::scr(10)).unwrap();
        // 7.5 and 2.5 round down
        assert_eq!(left, Asset::scr(1));
        assert!(vops.is_empty());
        let carol = db.get_account(&"carol".parse().unwrap()).unwrap();
        assert_eq!(carol.active_sp_holders_pending_scr_reward, Asset::scr(2));
        assert_eq!(carol.balance, Asset::scr(25));
        assert!(!carol.active_sp_holders_cashout_time.is_maximum());
    }

    #[test]
    fn schedule_crutches_patch_their_block_only() {
        let config = ConfigBuilder::new()
            .with_schedule_crutch(2, CrutchTarget::FundBudget, 7)
            .with_schedule_crutch(2, CrutchTarget::RewardBalancer, 3)
            .build();
        let mut state = ChainStateBuilder::new()
            .with_config(config)
            .with_account("alice", Asset::scr(0), Asset::sp(0))
            .with_fund_budget(Asset::sp(1_000_000), 1_000)
            .build()
            .unwrap();
        let fund = state.database().budgets_of_kind(BudgetKind::Fund)[0];
        let rates = |state: &crate::ChainState| {
            let db = state.database();
            (
                db.get_budget(fund).unwrap().per_block,
                db.get_reward_balancer().unwrap().current_per_block_reward,
            )
        };
        let initial = rates(&state);
        assert_ne!(initial.0, Asset::sp(7));
        assert_ne!(initial.1, Asset::scr(3));

        let info = next_block(&mut state);
        let mut vops = Vec::new();
        apply_schedule_crutches(&mut BlockTaskContext::new(
            state.database_mut(),
            &info,
            &mut vops,
        ))
        .unwrap();
        assert_eq!(rates(&state), initial);

        let info = next_block(&mut state);
        apply_schedule_crutches(&mut BlockTaskContext::new(
            state.database_mut(),
            &info,
            &mut vops,
        ))
        .unwrap();
        assert_eq!(info.block_num, 2);
        assert_eq!(rates(&state), (Asset::sp(7), Asset::scr(3)));
        assert!(vops.is_empty());
    }
}
