use super::EvaluationContext;
use crate::error::Result;
use crate::operations::{Transfer, TransferToScorumpower};
use crate::services::AccountService;

pub(super) fn transfer(ctx: &mut EvaluationContext<'_>, op: &Transfer) -> Result<()> {
    let from = ctx.db.get_account(&op.from)?.id;
    let to = ctx.db.get_account(&op.to)?.id;
    ctx.db.decrease_balance(from, op.amount)?;
    ctx.db.increase_balance(to, op.amount)
}

pub(super) fn transfer_to_scorumpower(
    ctx: &mut EvaluationContext<'_>,
    op: &TransferToScorumpower,
) -> Result<()> {
    let from = ctx.db.get_account(&op.from)?.id;
    let to = match &op.to {
        Some(to) => ctx.db.get_account(to)?.id,
        None => from,
    };
    ctx.db.decrease_balance(from, op.amount)?;
    ctx.db.create_scorumpower(to, op.amount)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::asset::Asset;
    use crate::error::{Error, EvaluateError};
    use crate::operations::{Operation, Transfer, TransferToScorumpower};
    use crate::services::{AccountService, DynamicGlobalPropertyService};
    use crate::testing::{apply_operation, ChainStateBuilder};
    use crate::types::AccountName;

    fn name(s: &str) -> AccountName {
        s.parse().unwrap()
    }

    #[test]
    fn failed_transfer_leaves_no_trace() {
        let mut state = ChainStateBuilder::new()
            .with_account("alice", Asset::scr(10), Asset::sp(0))
            .with_account("bob", Asset::scr(0), Asset::sp(0))
            .build()
            .unwrap();
        let transfer = |amount| {
            Operation::Transfer(Transfer {
                from: name("alice"),
                to: name("bob"),
                amount: Asset::scr(amount),
                memo: String::new(),
            })
        };
        apply_operation(&mut state, transfer(4)).unwrap();
        assert_err_match!(
            Error::Evaluate(EvaluateError::InsufficientFunds { .. }),
            apply_operation(&mut state, transfer(7))
        );
        let db = state.database();
        assert_eq!(db.get_account(&name("alice")).unwrap().balance, Asset::scr(6));
        assert_eq!(db.get_account(&name("bob")).unwrap().balance, Asset::scr(4));
    }

    #[test]
    fn staking_keeps_circulating_capital() {
        let mut state = ChainStateBuilder::new()
            .with_account("alice", Asset::scr(10), Asset::sp(0))
            .with_account("bob", Asset::scr(0), Asset::sp(0))
            .build()
            .unwrap();
        let capital = state
            .database()
            .dynamic_global_properties()
            .unwrap()
            .circulating_capital;
        let op = Operation::TransferToScorumpower(TransferToScorumpower {
            from: name("alice"),
            to: Some(name("bob")),
            amount: Asset::scr(10),
        });
        apply_operation(&mut state, op).unwrap();

        let db = state.database();
        assert!(db.get_account(&name("alice")).unwrap().balance.is_zero());
        assert_eq!(db.get_account(&name("bob")).unwrap().scorumpower, Asset::sp(10));
        let props = db.dynamic_global_properties().unwrap();
        assert_eq!(props.circulating_capital, capital);
    }
}
