use super::BlockTaskContext;
use crate::error::Result;
use crate::services::{AccountService, DynamicGlobalPropertyService};
use crate::time::TimePointSec;
use crate::virtual_ops::VirtualOperation;

/// Pay out the rewards active stake holders accumulated over their period.
///
/// An account that kept voting starts a new period, otherwise it waits for
/// its next vote.
pub fn process_active_sp_holders_cashout(ctx: &mut BlockTaskContext<'_>) -> Result<()> {
    let now = ctx.db.head_block_time()?;
    let period = ctx.db.config.active_sp_holders_reward_period_seconds;

    for id in ctx.db.active_sp_holders_due(now) {
        let account = ctx.db.get_account_by_id(id)?.clone();
        let scr = account.active_sp_holders_pending_scr_reward;
        let sp = account.active_sp_holders_pending_sp_reward;

        if scr.is_positive() {
            ctx.db.increase_pending_balance(id, -scr)?;
            ctx.db.increase_balance(id, scr)?;
            ctx.push_virtual_operation(VirtualOperation::ActiveSpHoldersReward {
                sp_holder: account.name.clone(),
                reward: scr,
            });
        }
        if sp.is_positive() {
            ctx.db.increase_pending_scorumpower(id, -sp)?;
            ctx.db.increase_scorumpower(id, sp)?;
            ctx.push_virtual_operation(VirtualOperation::ActiveSpHoldersReward {
                sp_holder: account.name.clone(),
                reward: sp,
            });
        }

        let active = account.last_vote_time.add_seconds(period) > now;
        let next = if active {
            now.add_seconds(period)
        } else {
            TimePointSec::MAXIMUM
        };
        ctx.db
            .update_account(id, |a| a.active_sp_holders_cashout_time = next)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::Asset;
    use crate::block_tasks::BlockInfo;
    use crate::testing::ChainStateBuilder;
    use crate::types::AccountName;

    fn name(s: &str) -> AccountName {
        s.parse().unwrap()
    }

    fn cashout_after(state: &mut crate::ChainState, seconds: u32) -> Vec<VirtualOperation> {
        let db = state.database_mut();
        db.update_dynamic_global_properties(|p| p.time = p.time.add_seconds(seconds))
            .unwrap();
        let block = BlockInfo {
            block_num: db.head_block_num().unwrap(),
            timestamp: db.head_block_time().unwrap(),
            witness: name("alice"),
        };
        let mut vops = Vec::new();
        process_active_sp_holders_cashout(&mut BlockTaskContext::new(db, &block, &mut vops))
            .unwrap();
        vops
    }

    #[test]
    fn pending_rewards_are_paid_once_per_period() {
        let mut state = ChainStateBuilder::new()
            .with_account("alice", Asset::scr(0), Asset::sp(100))
            .build()
            .unwrap();
        let db = state.database_mut();
        let alice = db.get_account(&name("alice")).unwrap().id;
        let period = db.config().active_sp_holders_reward_period_seconds;
        db.update_voting_power(alice, 9_000).unwrap();
        db.increase_pending_balance(alice, Asset::scr(7)).unwrap();
        db.increase_pending_scorumpower(alice, Asset::sp(3)).unwrap();

        assert!(cashout_after(&mut state, period - 1).is_empty());

        let vops = cashout_after(&mut state, 1);
        assert_eq!(
            vops,
            vec![
                VirtualOperation::ActiveSpHoldersReward {
                    sp_holder: name("alice"),
                    reward: Asset::scr(7),
                },
                VirtualOperation::ActiveSpHoldersReward {
                    sp_holder: name("alice"),
                    reward: Asset::sp(3),
                },
            ]
        );
        let db = state.database();
        let account = db.get_account_by_id(alice).unwrap();
        assert_eq!(account.balance, Asset::scr(7));
        assert_eq!(account.scorumpower, Asset::sp(103));
        assert!(account.active_sp_holders_pending_scr_reward.is_zero());
        assert!(db.dynamic_global_properties().unwrap().total_pending_sp.is_zero());
        // no vote during the period
        assert!(account.active_sp_holders_cashout_time.is_maximum());
    }
}
