use super::BlockTaskContext;
use crate::asset::{Asset, Symbol};
use crate::error::Result;
use crate::schema::WithdrawVestingObject;
use crate::services::{
    DynamicGlobalPropertyService, WithdrawVestingRouteService, WithdrawVestingService,
};
use crate::virtual_ops::VirtualOperation;
use chainbase::ObjectId;

/// Pay the due installment of every running scorumpower withdrawal.
pub fn process_vesting_withdrawals(ctx: &mut BlockTaskContext<'_>) -> Result<()> {
    let now = ctx.db.head_block_time()?;
    for id in ctx.db.withdraw_vesting_due(now) {
        withdraw(ctx, id)?;
    }
    Ok(())
}

fn withdraw(ctx: &mut BlockTaskContext<'_>, id: ObjectId<WithdrawVestingObject>) -> Result<()> {
    let schedule = ctx.db.get_withdraw_vesting(id)?.clone();
    let from = schedule.from;
    let remaining = (schedule.to_withdraw - schedule.withdrawn)?;
    let installment = schedule.vesting_withdraw_rate.min(remaining);
    let available = ctx.db.available_scorumpower(from)?;
    let to_withdraw = installment.min(available);

    let mut routed = Asset::sp(0);
    if to_withdraw.is_positive() {
        let routes: Vec<_> = ctx
            .db
            .routes_from(from)
            .into_iter()
            .map(|r| (r.to, r.percent, r.auto_vest))
            .collect();
        for (to, percent, auto_vest) in routes {
            let amount = to_withdraw.percent(percent);
            if !amount.is_positive() {
                continue;
            }
            routed = (routed + amount)?;
            ctx.db.take_scorumpower(from, amount)?;
            ctx.db.deposit_withdrawn(to, amount, auto_vest)?;
            let op = VirtualOperation::FillVestingWithdraw {
                from: ctx.db.vesting_party(from)?,
                to: ctx.db.vesting_party(to)?,
                withdrawn: amount,
                deposited: if auto_vest {
                    amount
                } else {
                    amount.convert(Symbol::Scr)
                },
            };
            ctx.push_virtual_operation(op);
        }

        let converted = (to_withdraw - routed)?;
        if converted.is_positive() {
            ctx.db.take_scorumpower(from, converted)?;
            ctx.db.deposit_withdrawn(from, converted, false)?;
            let party = ctx.db.vesting_party(from)?;
            ctx.push_virtual_operation(VirtualOperation::FillVestingWithdraw {
                from: party.clone(),
                to: party,
                withdrawn: converted,
                deposited: converted.convert(Symbol::Scr),
            });
        }
    }

    let withdrawn = (schedule.withdrawn + to_withdraw)?;
    let exhausted = !(available - to_withdraw)?.is_positive();
    let finished = withdrawn.amount >= schedule.to_withdraw.amount || exhausted;
    if finished {
        ctx.db.remove_withdraw_vesting(id)?;
        let from = ctx.db.vesting_party(from)?;
        tracing::debug!(%from, withdrawn = %withdrawn, "withdrawal finished");
        ctx.push_virtual_operation(VirtualOperation::FinishedVestingWithdraw { from });
    } else {
        let interval = ctx.db.config.vesting_withdraw_interval_seconds;
        ctx.db.update_withdraw_vesting(id, |w| {
            w.withdrawn = withdrawn;
            w.next_vesting_withdrawal = w.next_vesting_withdrawal.add_seconds(interval);
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block_tasks::BlockInfo;
    use crate::services::{AccountService, DevPoolService};
    use crate::testing::ChainStateBuilder;
    use crate::types::{AccountName, Withdrawable};
    use crate::virtual_ops::VestingParty;
    use crate::PERCENT_1;

    fn name(s: &str) -> AccountName {
        s.parse().unwrap()
    }

    fn run_at_next_withdrawal(state: &mut crate::ChainState, from: Withdrawable) -> Vec<VirtualOperation> {
        let db = state.database_mut();
        let next = db.find_withdraw_vesting(from).unwrap().next_vesting_withdrawal;
        db.update_dynamic_global_properties(|p| p.time = next).unwrap();
        let block = BlockInfo {
            block_num: db.head_block_num().unwrap(),
            timestamp: next,
            witness: name("alice"),
        };
        let mut vops = Vec::new();
        process_vesting_withdrawals(&mut BlockTaskContext::new(db, &block, &mut vops)).unwrap();
        vops
    }

    #[test]
    fn installment_is_split_along_routes() {
        let mut state = ChainStateBuilder::new()
            .with_account("alice", Asset::scr(0), Asset::sp(1_040))
            .with_account("bob", Asset::scr(0), Asset::sp(0))
            .build()
            .unwrap();
        let db = state.database_mut();
        let alice_id = db.get_account(&name("alice")).unwrap().id;
        let bob_id = db.get_account(&name("bob")).unwrap().id;
        let alice = Withdrawable::Account(alice_id);
        let bob = Withdrawable::Account(bob_id);
        db.set_withdraw_route(alice, bob, 25 * PERCENT_1, true).unwrap();
        // 52 installments of 20
        db.start_withdraw_vesting(alice, Asset::sp(1_040)).unwrap();

        let vops = run_at_next_withdrawal(&mut state, alice);
        let db = state.database();
        let alice_account = db.get_account_by_id(alice_id).unwrap();
        assert_eq!(alice_account.scorumpower, Asset::sp(1_020));
        assert_eq!(alice_account.balance, Asset::scr(15));
        assert_eq!(db.get_account_by_id(bob_id).unwrap().scorumpower, Asset::sp(5));
        assert_eq!(
            vops,
            vec![
                VirtualOperation::FillVestingWithdraw {
                    from: VestingParty::Account(name("alice")),
                    to: VestingParty::Account(name("bob")),
                    withdrawn: Asset::sp(5),
                    deposited: Asset::sp(5),
                },
                VirtualOperation::FillVestingWithdraw {
                    from: VestingParty::Account(name("alice")),
                    to: VestingParty::Account(name("alice")),
                    withdrawn: Asset::sp(15),
                    deposited: Asset::scr(15),
                },
            ]
        );
        assert_eq!(
            db.find_withdraw_vesting(alice).unwrap().withdrawn,
            Asset::sp(20)
        );
    }

    #[test]
    fn withdrawal_ends_when_stake_runs_out() {
        let mut state = ChainStateBuilder::new()
            .with_account("alice", Asset::scr(0), Asset::sp(1_040))
            .build()
            .unwrap();
        let db = state.database_mut();
        let alice_id = db.get_account(&name("alice")).unwrap().id;
        let alice = Withdrawable::Account(alice_id);
        db.start_withdraw_vesting(alice, Asset::sp(1_040)).unwrap();
        // stake shrinks below the installment
        db.decrease_scorumpower(alice_id, Asset::sp(1_030)).unwrap();

        let vops = run_at_next_withdrawal(&mut state, alice);
        let db = state.database();
        assert!(db.get_account_by_id(alice_id).unwrap().scorumpower.is_zero());
        assert_eq!(db.get_account_by_id(alice_id).unwrap().balance, Asset::scr(10));
        assert!(db.find_withdraw_vesting(alice).is_none());
        assert_eq!(
            vops.last(),
            Some(&VirtualOperation::FinishedVestingWithdraw {
                from: VestingParty::Account(name("alice"))
            })
        );
    }

    #[test]
    fn dev_pool_converts_its_own_stake() {
        let mut state = ChainStateBuilder::new().build().unwrap();
        let db = state.database_mut();
        db.increase_dev_pool(Asset::sp(520)).unwrap();
        db.start_withdraw_vesting(Withdrawable::DevPool, Asset::sp(520))
            .unwrap();

        run_at_next_withdrawal(&mut state, Withdrawable::DevPool);
        let pool = state.database().get_dev_pool().unwrap();
        assert_eq!(pool.sp_balance, Asset::sp(510));
        assert_eq!(pool.scr_balance, Asset::scr(10));
    }
}
