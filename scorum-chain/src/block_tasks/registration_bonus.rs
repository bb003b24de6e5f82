use super::BlockTaskContext;
use crate::asset::{Asset, Symbol};
use crate::error::Result;
use crate::services::{
    AccountRegistrationBonusService, AccountService, DynamicGlobalPropertyService,
    RegistrationPoolService,
};

/// Take expired registration bonuses back into the registration pool.
///
/// Only the stake the account still controls is taken: what it delegated
/// away in the meantime is lost to the pool.
pub fn process_account_registration_bonus_expiration(ctx: &mut BlockTaskContext<'_>) -> Result<()> {
    let now = ctx.db.head_block_time()?;
    for id in ctx.db.expired_registration_bonuses(now) {
        let bonus = ctx.db.remove_registration_bonus(id)?;
        let account = match ctx.db.find_account(&bonus.account) {
            Some(account) => account,
            None => continue,
        };
        let owned = account.scorumpower.amount - account.delegated_scorumpower.amount;
        let returned = bonus.bonus.amount.min(owned).max(0);
        if returned < bonus.bonus.amount {
            tracing::warn!(
                account = %bonus.account,
                bonus = %bonus.bonus,
                returned,
                "registration bonus partially returned"
            );
        }
        if returned == 0 {
            continue;
        }
        let account = account.id;
        ctx.db.decrease_scorumpower(account, Asset::new(returned, Symbol::Sp))?;
        ctx.db
            .increase_registration_pool(Asset::new(returned, Symbol::Scr))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block_tasks::BlockInfo;
    use crate::testing::ChainStateBuilder;
    use crate::types::AccountName;

    fn name(s: &str) -> AccountName {
        s.parse().unwrap()
    }

    fn expire(state: &mut crate::ChainState) {
        let db = state.database_mut();
        let expiration = db.config().registration_bonus_expiration_seconds;
        db.update_dynamic_global_properties(|p| p.time = p.time.add_seconds(expiration))
            .unwrap();
        let block = BlockInfo {
            block_num: db.head_block_num().unwrap(),
            timestamp: db.head_block_time().unwrap(),
            witness: name("alice"),
        };
        let mut vops = Vec::new();
        process_account_registration_bonus_expiration(&mut BlockTaskContext::new(
            db, &block, &mut vops,
        ))
        .unwrap();
        assert!(vops.is_empty());
    }

    #[test]
    fn bonus_goes_back_to_the_pool() {
        let mut state = ChainStateBuilder::new()
            .with_account("alice", Asset::scr(0), Asset::sp(0))
            .build()
            .unwrap();
        let db = state.database_mut();
        let pool_before = db.get_registration_pool().unwrap().balance;
        let bob = db
            .create_account_with_bonus(&name("bob"), &name("alice"), "", Asset::scr(100))
            .unwrap();
        db.create_registration_bonus(&name("bob"), Asset::sp(100)).unwrap();
        db.increase_scorumpower(bob, Asset::sp(5)).unwrap();

        expire(&mut state);
        let db = state.database();
        assert_eq!(db.get_account(&name("bob")).unwrap().scorumpower, Asset::sp(5));
        assert_eq!(
            db.get_registration_pool().unwrap().balance,
            (pool_before + Asset::scr(100)).unwrap()
        );
        assert!(db.find_registration_bonus(&name("bob")).is_none());
    }

    #[test]
    fn delegated_stake_is_not_taken() {
        let mut state = ChainStateBuilder::new()
            .with_account("alice", Asset::scr(0), Asset::sp(0))
            .build()
            .unwrap();
        let db = state.database_mut();
        let pool_before = db.get_registration_pool().unwrap().balance;
        let bob = db
            .create_account_with_bonus(&name("bob"), &name("alice"), "", Asset::scr(100))
            .unwrap();
        db.create_registration_bonus(&name("bob"), Asset::sp(100)).unwrap();
        db.update_account(bob, |a| a.delegated_scorumpower = Asset::sp(60))
            .unwrap();

        expire(&mut state);
        let db = state.database();
        assert_eq!(db.get_account(&name("bob")).unwrap().scorumpower, Asset::sp(60));
        assert_eq!(
            db.get_registration_pool().unwrap().balance,
            (pool_before + Asset::scr(40)).unwrap()
        );
    }
}
