use super::EvaluationContext;
use crate::error::{EvaluateError, Result};
use crate::operations::{CloseBudget, CreateBudget};
use crate::services::{AccountService, BudgetService};
use crate::virtual_ops::VirtualOperation;
use chainbase::ObjectId;

pub(super) fn create_budget(ctx: &mut EvaluationContext<'_>, op: &CreateBudget) -> Result<()> {
    let owner = ctx.db.get_account(&op.owner)?.id;
    ctx.db
        .create_budget(owner, op.kind, op.balance, op.deadline, &op.content_permlink)?;
    Ok(())
}

pub(super) fn close_budget(ctx: &mut EvaluationContext<'_>, op: &CloseBudget) -> Result<()> {
    let id = ObjectId::new(op.budget_id);
    let budget = ctx.db.get_budget(id)?;
    ensure!(
        budget.owner.as_ref() == Some(&op.owner),
        EvaluateError::NotBudgetOwner(op.budget_id, op.owner.clone())
    )?;
    let kind = budget.kind;
    let cash = ctx.db.close_budget(id)?;
    ctx.push_virtual_operation(VirtualOperation::CashBackFromBudgetToOwner {
        kind,
        owner: op.owner.clone(),
        budget_id: op.budget_id,
        cash,
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::asset::Asset;
    use crate::error::{Error, EvaluateError, ValidationError};
    use crate::operations::{CloseBudget, CreateBudget, Operation};
    use crate::schema::BudgetKind;
    use crate::services::{AccountService, BudgetService, DynamicGlobalPropertyService};
    use crate::testing::{apply_operation, ChainStateBuilder};
    use crate::types::AccountName;
    use crate::virtual_ops::VirtualOperation;

    fn name(s: &str) -> AccountName {
        s.parse().unwrap()
    }

    #[test]
    fn owner_closes_and_gets_the_balance_back() {
        let mut state = ChainStateBuilder::new()
            .with_account("alice", Asset::scr(1_000), Asset::sp(0))
            .with_account("bob", Asset::scr(0), Asset::sp(0))
            .build()
            .unwrap();
        let deadline = state
            .database()
            .head_block_time()
            .unwrap()
            .add_seconds(3_600);
        let create = |kind| {
            Operation::CreateBudget(CreateBudget {
                owner: name("alice"),
                kind,
                content_permlink: "ad".to_owned(),
                balance: Asset::scr(600),
                deadline,
            })
        };
        assert_err_match!(
            Error::Validation(ValidationError::WrongBudgetKind),
            apply_operation(&mut state, create(BudgetKind::Fund))
        );
        apply_operation(&mut state, create(BudgetKind::Banner)).unwrap();
        assert_eq!(
            state.database().get_account(&name("alice")).unwrap().balance,
            Asset::scr(400)
        );
        assert_err_match!(
            Error::Evaluate(EvaluateError::InsufficientFunds { .. }),
            apply_operation(&mut state, create(BudgetKind::Post))
        );

        let budget_id = state
            .database()
            .budgets_of_kind(BudgetKind::Banner)
            .first()
            .unwrap()
            .value();
        let close = |owner: &str| {
            Operation::CloseBudget(CloseBudget {
                owner: name(owner),
                budget_id,
            })
        };
        assert_err_match!(
            Error::Evaluate(EvaluateError::NotBudgetOwner(..)),
            apply_operation(&mut state, close("bob"))
        );
        let vops = apply_operation(&mut state, close("alice")).unwrap();
        assert_eq!(
            vops,
            vec![VirtualOperation::CashBackFromBudgetToOwner {
                kind: BudgetKind::Banner,
                owner: name("alice"),
                budget_id,
                cash: Asset::scr(600),
            }]
        );
        assert_eq!(
            state.database().get_account(&name("alice")).unwrap().balance,
            Asset::scr(1_000)
        );
    }
}
