use super::{AccountService, DynamicGlobalPropertyService};
use crate::asset::{Asset, Symbol};
use crate::database::Database;
use crate::error::{EvaluateError, Result, ValidationError};
use crate::schema::{AccountObject, BudgetKind, BudgetObject};
use crate::time::TimePointSec;
use chainbase::{key, ObjectId};

/// Cash handed out by a budget in one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    pub cash: Asset,
    /// Unspent balance returned to the owner when the budget closed.
    pub refund: Option<Asset>,
    pub closed: bool,
}

/// `balance * block_interval / (deadline - start)`, at least one unit.
pub fn calculate_per_block(
    start: TimePointSec,
    deadline: TimePointSec,
    balance: Asset,
    block_interval: u32,
) -> Result<Asset> {
    ensure!(start < deadline, ValidationError::InvalidPeriod)?;
    let period = deadline.since(start) as u128;
    let per_block = balance.fraction(block_interval as u128, period);
    Ok(Asset::new(per_block.amount.max(1), balance.symbol))
}

pub trait BudgetService {
    fn get_budget(&self, id: ObjectId<BudgetObject>) -> Result<&BudgetObject>;

    fn budgets_of_kind(&self, kind: BudgetKind) -> Vec<ObjectId<BudgetObject>>;

    fn budgets_of_owner(&self, owner: &AccountObject) -> Vec<&BudgetObject>;

    /// System budget feeding the reward pipeline, starting now.
    fn create_fund_budget(
        &mut self,
        balance: Asset,
        deadline: TimePointSec,
    ) -> Result<ObjectId<BudgetObject>>;

    /// Budget paid out of the owner's liquid balance.
    fn create_budget(
        &mut self,
        owner: ObjectId<AccountObject>,
        kind: BudgetKind,
        balance: Asset,
        deadline: TimePointSec,
        content_permlink: &str,
    ) -> Result<ObjectId<BudgetObject>>;

    /// Take this block's share of the budget, closing it once exhausted or
    /// past its deadline. Does nothing twice in the same block.
    fn allocate_cash(&mut self, id: ObjectId<BudgetObject>) -> Result<Allocation>;

    /// Remove an owned budget, refunding its balance. Returns the refund.
    fn close_budget(&mut self, id: ObjectId<BudgetObject>) -> Result<Asset>;

    fn set_budget_per_block(&mut self, id: ObjectId<BudgetObject>, per_block: Asset)
        -> Result<()>;
}

impl Database {
    fn insert_budget(
        &mut self,
        kind: BudgetKind,
        owner: Option<&AccountObject>,
        balance: Asset,
        deadline: TimePointSec,
        content_permlink: &str,
    ) -> Result<ObjectId<BudgetObject>> {
        let props = self.dynamic_global_properties()?;
        let start = props.time;
        let head_block_num = props.head_block_number;
        let per_block = calculate_per_block(start, deadline, balance, self.config.block_interval)?;
        let owner = owner.map(|o| o.name.clone());
        let budget = self.budgets.create(|id| BudgetObject {
            id,
            kind,
            owner,
            content_permlink: content_permlink.to_owned(),
            created: start,
            deadline,
            balance,
            per_block,
            // first allocation in the next block
            last_cashout_block: head_block_num,
        })?;
        tracing::debug!(
            budget = budget.id.value(),
            balance = %balance,
            per_block = %per_block,
            "budget created"
        );
        Ok(budget.id)
    }

    fn take_from_budget(&mut self, id: ObjectId<BudgetObject>, amount: Asset) -> Result<Asset> {
        let budget = self.get_budget(id)?;
        let taken = budget.balance.min(amount);
        let balance = (budget.balance - taken)?;
        self.budgets.modify(id, |b| b.balance = balance)?;
        Ok(taken)
    }
}

impl BudgetService for Database {
    fn get_budget(&self, id: ObjectId<BudgetObject>) -> Result<&BudgetObject> {
        Ok(self.budgets.get(id)?)
    }

    fn budgets_of_kind(&self, kind: BudgetKind) -> Vec<ObjectId<BudgetObject>> {
        self.budgets
            .prefix_by(BudgetObject::BY_KIND, &key![kind])
            .map(|b| b.id)
            .collect()
    }

    fn budgets_of_owner(&self, owner: &AccountObject) -> Vec<&BudgetObject> {
        self.budgets
            .prefix_by(BudgetObject::BY_OWNER, &key![&owner.name])
            .collect()
    }

    fn create_fund_budget(
        &mut self,
        balance: Asset,
        deadline: TimePointSec,
    ) -> Result<ObjectId<BudgetObject>> {
        ensure!(
            balance.is_positive(),
            ValidationError::NonPositiveAmount { field: "balance" }
        )?;
        self.insert_budget(BudgetKind::Fund, None, balance, deadline, "")
    }

    fn create_budget(
        &mut self,
        owner: ObjectId<AccountObject>,
        kind: BudgetKind,
        balance: Asset,
        deadline: TimePointSec,
        content_permlink: &str,
    ) -> Result<ObjectId<BudgetObject>> {
        ensure!(
            balance.symbol == Symbol::Scr,
            ValidationError::WrongSymbol {
                field: "balance",
                expected: Symbol::Scr,
            }
        )?;
        ensure!(
            balance.is_positive(),
            ValidationError::NonPositiveAmount { field: "balance" }
        )?;
        ensure!(
            deadline > self.head_block_time()?,
            EvaluateError::BudgetDeadlinePassed
        )?;
        let account = self.get_account_by_id(owner)?.clone();
        ensure!(
            self.budgets_of_owner(&account).len() < self.config.budgets_limit_per_owner,
            EvaluateError::TooManyBudgets(account.name.clone())
        )?;

        self.decrease_balance(owner, balance)?;
        self.insert_budget(kind, Some(&account), balance, deadline, content_permlink)
    }

    fn allocate_cash(&mut self, id: ObjectId<BudgetObject>) -> Result<Allocation> {
        let props = self.dynamic_global_properties()?;
        let (now, head_block_num) = (props.time, props.head_block_number);
        let budget = self.get_budget(id)?;
        if budget.last_cashout_block >= head_block_num {
            return Ok(Allocation {
                cash: Asset::zero(budget.balance.symbol),
                refund: None,
                closed: false,
            });
        }
        let per_block = budget.per_block;
        let cash = self.take_from_budget(id, per_block)?;

        let budget = self.get_budget(id)?;
        // fund budgets keep paying after missed blocks until drained
        let keep_open = budget.balance.is_positive()
            && (now < budget.deadline || budget.kind == BudgetKind::Fund);
        if keep_open {
            self.budgets
                .modify(id, |b| b.last_cashout_block = head_block_num)?;
            return Ok(Allocation {
                cash,
                refund: None,
                closed: false,
            });
        }

        let refund = if budget.kind == BudgetKind::Fund {
            self.budgets.remove(id)?;
            None
        } else {
            Some(self.close_budget(id)?)
        };
        Ok(Allocation {
            cash,
            refund,
            closed: true,
        })
    }

    fn close_budget(&mut self, id: ObjectId<BudgetObject>) -> Result<Asset> {
        let budget = self.get_budget(id)?.clone();
        let owner = match (&budget.owner, budget.kind) {
            (Some(owner), BudgetKind::Post) | (Some(owner), BudgetKind::Banner) => owner.clone(),
            _ => return Err(EvaluateError::FundBudgetNotClosable.into()),
        };
        let owner = self.get_account(&owner)?.id;
        let refund = self.take_from_budget(id, budget.balance)?;
        if refund.is_positive() {
            self.increase_balance(owner, refund)?;
        }
        self.budgets.remove(id)?;
        tracing::debug!(budget = id.value(), refund = %refund, "budget closed");
        Ok(refund)
    }

    fn set_budget_per_block(
        &mut self,
        id: ObjectId<BudgetObject>,
        per_block: Asset,
    ) -> Result<()> {
        self.budgets.modify(id, |b| b.per_block = per_block)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ChainStateBuilder;
    use quickcheck_macros::quickcheck;

    #[quickcheck]
    fn per_block_is_never_zero(balance: u32, start: u32, length: u16) -> bool {
        let balance = Asset::scr(balance as i64 + 1);
        let start = TimePointSec(start / 2);
        let deadline = start.add_seconds(length as u32 + 1);
        calculate_per_block(start, deadline, balance, 3)
            .map(|per_block| per_block.amount >= 1)
            .unwrap_or(false)
    }

    #[test]
    fn empty_period_is_rejected() {
        assert_err_match!(
            crate::error::Error::Validation(ValidationError::InvalidPeriod),
            calculate_per_block(TimePointSec(10), TimePointSec(10), Asset::scr(1), 3)
        );
    }

    #[test]
    fn fund_budget_pays_out_and_disappears() {
        let mut state = ChainStateBuilder::new().build().unwrap();
        let db = state.database_mut();
        let interval = db.config().block_interval;
        let start = db.head_block_time().unwrap();
        let budget = db
            .create_fund_budget(Asset::scr(1_000), start.add_seconds(10 * interval))
            .unwrap();
        assert_eq!(db.get_budget(budget).unwrap().per_block, Asset::scr(100));

        // nothing in the block the budget was created in
        assert!(db.allocate_cash(budget).unwrap().cash.is_zero());

        let mut total = Asset::scr(0);
        for block in 1..=10u32 {
            db.update_dynamic_global_properties(|p| {
                p.head_block_number += 1;
                p.time = p.time.add_seconds(interval);
            })
            .unwrap();
            let allocation = db.allocate_cash(budget).unwrap();
            total = (total + allocation.cash).unwrap();
            assert_eq!(allocation.closed, block == 10);
        }
        assert_eq!(total, Asset::scr(1_000));
        assert!(db.budgets().find(budget).is_none());
    }

    #[test]
    fn owned_budget_refunds_the_owner() {
        let mut state = ChainStateBuilder::new()
            .with_account("alice", Asset::scr(1_000), Asset::sp(0))
            .build()
            .unwrap();
        let db = state.database_mut();
        let alice = db.get_account(&"alice".parse().unwrap()).unwrap().id;
        let deadline = db.head_block_time().unwrap().add_seconds(3_000);
        let budget = db
            .create_budget(alice, BudgetKind::Post, Asset::scr(400), deadline, "post")
            .unwrap();
        assert_eq!(
            db.get_account_by_id(alice).unwrap().balance,
            Asset::scr(600)
        );

        let refund = db.close_budget(budget).unwrap();
        assert_eq!(refund, Asset::scr(400));
        assert_eq!(
            db.get_account_by_id(alice).unwrap().balance,
            Asset::scr(1_000)
        );
    }
}
