use super::EvaluationContext;
use crate::asset::Symbol;
use crate::error::Result;
use crate::operations::{AccountCreate, AccountCreateByCommittee};
use crate::services::{
    AccountRegistrationBonusService, AccountService, CommitteeService, RegistrationPoolService,
};
use crate::types::CommitteeKind;

pub(super) fn account_create(ctx: &mut EvaluationContext<'_>, op: &AccountCreate) -> Result<()> {
    let creator = ctx.db.get_account(&op.creator)?.id;
    if op.fee.is_positive() {
        ctx.db.decrease_balance(creator, op.fee)?;
    }
    ctx.db.create_account(
        &op.new_account_name,
        Some(&op.creator),
        &op.json_metadata,
        op.fee,
    )?;
    Ok(())
}

pub(super) fn account_create_by_committee(
    ctx: &mut EvaluationContext<'_>,
    op: &AccountCreateByCommittee,
) -> Result<()> {
    ctx.db.check_account_existence(&op.creator)?;
    ctx.db.get_member(CommitteeKind::Registration, &op.creator)?;

    let bonus = ctx.db.allocate_registration_bonus()?;
    ctx.db.use_registration_bandwidth(&op.creator, bonus)?;
    ctx.db.create_account_with_bonus(
        &op.new_account_name,
        &op.creator,
        &op.json_metadata,
        bonus,
    )?;
    ctx.db
        .create_registration_bonus(&op.new_account_name, bonus.convert(Symbol::Sp))?;
    tracing::debug!(
        account = %op.new_account_name,
        creator = %op.creator,
        bonus = %bonus,
        "account registered by committee"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::asset::Asset;
    use crate::error::{Error, EvaluateError};
    use crate::operations::{AccountCreate, AccountCreateByCommittee, Operation};
    use crate::services::{AccountRegistrationBonusService, AccountService, RegistrationPoolService};
    use crate::testing::{apply_operation, ChainStateBuilder};
    use crate::types::{AccountName, CommitteeKind};

    fn name(s: &str) -> AccountName {
        s.parse().unwrap()
    }

    fn register(creator: &str, new: &str) -> Operation {
        Operation::AccountCreateByCommittee(AccountCreateByCommittee {
            creator: name(creator),
            new_account_name: name(new),
            json_metadata: String::new(),
        })
    }

    #[test]
    fn fee_is_staked_for_the_new_account() {
        let mut state = ChainStateBuilder::new()
            .with_account("alice", Asset::scr(100), Asset::sp(0))
            .build()
            .unwrap();
        let op = Operation::AccountCreate(AccountCreate {
            fee: Asset::scr(30),
            creator: name("alice"),
            new_account_name: name("bob"),
            json_metadata: "{}".to_owned(),
        });
        apply_operation(&mut state, op.clone()).unwrap();

        let db = state.database();
        assert_eq!(db.get_account(&name("alice")).unwrap().balance, Asset::scr(70));
        let bob = db.get_account(&name("bob")).unwrap();
        assert_eq!(bob.scorumpower, Asset::sp(30));
        assert_eq!(bob.creator, Some(name("alice")));

        assert_err_match!(
            Error::Evaluate(EvaluateError::AccountAlreadyExists(_)),
            apply_operation(&mut state, op)
        );
    }

    #[test]
    fn committee_member_hands_out_the_pool_bonus() {
        let mut state = ChainStateBuilder::new()
            .with_account("alice", Asset::scr(0), Asset::sp(0))
            .with_account("carol", Asset::scr(0), Asset::sp(0))
            .with_committee_member(CommitteeKind::Registration, "alice")
            .build()
            .unwrap();
        let pool_before = state.database().get_registration_pool().unwrap().balance;

        apply_operation(&mut state, register("alice", "bob")).unwrap();
        let db = state.database();
        let bob = db.get_account(&name("bob")).unwrap();
        let pool = db.get_registration_pool().unwrap();
        let bonus = (pool_before - pool.balance).unwrap();
        assert!(bonus.is_positive());
        assert_eq!(bob.scorumpower, bonus.convert(crate::asset::Symbol::Sp));
        assert_eq!(pool.already_allocated_count, 1);
        assert_eq!(
            db.find_registration_bonus(&name("bob")).unwrap().bonus.amount,
            bonus.amount
        );

        assert_err_match!(
            Error::Evaluate(EvaluateError::NotCommitteeMember { .. }),
            apply_operation(&mut state, register("carol", "dave"))
        );
    }
}
