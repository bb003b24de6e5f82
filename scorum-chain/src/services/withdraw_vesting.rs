use super::{AccountService, DevPoolService, DynamicGlobalPropertyService};
use crate::asset::{Asset, Symbol};
use crate::database::Database;
use crate::error::{EvaluateError, Result};
use crate::schema::{WithdrawVestingObject, WithdrawVestingRouteObject};
use crate::time::TimePointSec;
use crate::types::Withdrawable;
use crate::virtual_ops::VestingParty;
use crate::{Percent, PERCENT_100};
use chainbase::{key, ObjectId};

pub trait WithdrawVestingService {
    fn find_withdraw_vesting(&self, from: Withdrawable) -> Option<&WithdrawVestingObject>;

    fn get_withdraw_vesting(
        &self,
        id: ObjectId<WithdrawVestingObject>,
    ) -> Result<&WithdrawVestingObject>;

    /// Schedule the withdrawal of `amount` in equal installments, replacing
    /// any running schedule of `from`.
    fn start_withdraw_vesting(&mut self, from: Withdrawable, amount: Asset) -> Result<()>;

    fn stop_withdraw_vesting(&mut self, from: Withdrawable) -> Result<()>;

    fn update_withdraw_vesting<F>(&mut self, id: ObjectId<WithdrawVestingObject>, f: F) -> Result<()>
    where
        F: FnOnce(&mut WithdrawVestingObject);

    fn remove_withdraw_vesting(&mut self, id: ObjectId<WithdrawVestingObject>) -> Result<()>;

    /// Schedules with an installment due at `until` or earlier.
    fn withdraw_vesting_due(&self, until: TimePointSec) -> Vec<ObjectId<WithdrawVestingObject>>;

    /// Scorumpower `from` may still withdraw.
    fn available_scorumpower(&self, from: Withdrawable) -> Result<Asset>;

    /// Take `amount` of scorumpower away from `from`.
    fn take_scorumpower(&mut self, from: Withdrawable, amount: Asset) -> Result<()>;

    /// Hand withdrawn scorumpower to `to`, staked again when `auto_vest`
    /// otherwise as the liquid currency.
    fn deposit_withdrawn(&mut self, to: Withdrawable, amount: Asset, auto_vest: bool)
        -> Result<()>;

    fn vesting_party(&self, who: Withdrawable) -> Result<VestingParty>;
}

pub trait WithdrawVestingRouteService {
    fn routes_from(&self, from: Withdrawable) -> Vec<&WithdrawVestingRouteObject>;

    fn total_route_percent(&self, from: Withdrawable) -> u32 {
        self.routes_from(from)
            .iter()
            .map(|r| r.percent as u32)
            .sum()
    }

    /// Create, update or, with a zero percent, remove the route.
    fn set_withdraw_route(
        &mut self,
        from: Withdrawable,
        to: Withdrawable,
        percent: Percent,
        auto_vest: bool,
    ) -> Result<()>;
}

impl WithdrawVestingService for Database {
    fn find_withdraw_vesting(&self, from: Withdrawable) -> Option<&WithdrawVestingObject> {
        self.withdraw_vestings
            .find_by(WithdrawVestingObject::BY_FROM, &key![from])
    }

    fn get_withdraw_vesting(
        &self,
        id: ObjectId<WithdrawVestingObject>,
    ) -> Result<&WithdrawVestingObject> {
        Ok(self.withdraw_vestings.get(id)?)
    }

    fn start_withdraw_vesting(&mut self, from: Withdrawable, amount: Asset) -> Result<()> {
        let intervals = self.config.vesting_withdraw_intervals as i64;
        let rate = Asset::sp((amount.amount / intervals).max(1));
        let next = self
            .head_block_time()?
            .add_seconds(self.config.vesting_withdraw_interval_seconds);
        let schedule = |w: &mut WithdrawVestingObject| {
            w.vesting_withdraw_rate = rate;
            w.next_vesting_withdrawal = next;
            w.withdrawn = Asset::sp(0);
            w.to_withdraw = amount;
        };

        match self.find_withdraw_vesting(from).map(|w| w.id) {
            Some(id) => {
                self.withdraw_vestings.modify(id, schedule)?;
            }
            None => {
                self.withdraw_vestings.create(|id| WithdrawVestingObject {
                    id,
                    from,
                    vesting_withdraw_rate: rate,
                    next_vesting_withdrawal: next,
                    withdrawn: Asset::sp(0),
                    to_withdraw: amount,
                })?;
            }
        }
        tracing::debug!(?from, amount = %amount, rate = %rate, "withdrawal scheduled");
        Ok(())
    }

    fn stop_withdraw_vesting(&mut self, from: Withdrawable) -> Result<()> {
        let id = self
            .find_withdraw_vesting(from)
            .ok_or(EvaluateError::NothingToWithdraw)?
            .id;
        self.remove_withdraw_vesting(id)
    }

    fn update_withdraw_vesting<F>(&mut self, id: ObjectId<WithdrawVestingObject>, f: F) -> Result<()>
    where
        F: FnOnce(&mut WithdrawVestingObject),
    {
        self.withdraw_vestings.modify(id, f)?;
        Ok(())
    }

    fn remove_withdraw_vesting(&mut self, id: ObjectId<WithdrawVestingObject>) -> Result<()> {
        self.withdraw_vestings.remove(id)?;
        Ok(())
    }

    fn withdraw_vesting_due(&self, until: TimePointSec) -> Vec<ObjectId<WithdrawVestingObject>> {
        self.withdraw_vestings
            .iter_by(WithdrawVestingObject::BY_NEXT_WITHDRAWAL)
            .take_while(|w| w.next_vesting_withdrawal <= until)
            .map(|w| w.id)
            .collect()
    }

    fn available_scorumpower(&self, from: Withdrawable) -> Result<Asset> {
        match from {
            Withdrawable::Account(id) => {
                let account = self.get_account_by_id(id)?;
                Ok(Asset::sp(
                    (account.scorumpower.amount - account.delegated_scorumpower.amount).max(0),
                ))
            }
            Withdrawable::DevPool => Ok(self.get_dev_pool()?.sp_balance),
        }
    }

    fn take_scorumpower(&mut self, from: Withdrawable, amount: Asset) -> Result<()> {
        match from {
            Withdrawable::Account(id) => self.decrease_scorumpower(id, amount),
            Withdrawable::DevPool => self.decrease_dev_pool(amount),
        }
    }

    fn deposit_withdrawn(
        &mut self,
        to: Withdrawable,
        amount: Asset,
        auto_vest: bool,
    ) -> Result<()> {
        let amount = if auto_vest {
            amount.convert(Symbol::Sp)
        } else {
            amount.convert(Symbol::Scr)
        };
        match to {
            Withdrawable::Account(id) if auto_vest => self.increase_scorumpower(id, amount),
            Withdrawable::Account(id) => self.increase_balance(id, amount),
            Withdrawable::DevPool => self.increase_dev_pool(amount),
        }
    }

    fn vesting_party(&self, who: Withdrawable) -> Result<VestingParty> {
        Ok(match who {
            Withdrawable::Account(id) => VestingParty::Account(self.get_account_by_id(id)?.name.clone()),
            Withdrawable::DevPool => VestingParty::DevPool,
        })
    }
}

impl WithdrawVestingRouteService for Database {
    fn routes_from(&self, from: Withdrawable) -> Vec<&WithdrawVestingRouteObject> {
        self.withdraw_vesting_routes
            .prefix_by(WithdrawVestingRouteObject::BY_ROUTE, &key![from])
            .collect()
    }

    fn set_withdraw_route(
        &mut self,
        from: Withdrawable,
        to: Withdrawable,
        percent: Percent,
        auto_vest: bool,
    ) -> Result<()> {
        let existing = self
            .withdraw_vesting_routes
            .find_by(WithdrawVestingRouteObject::BY_ROUTE, &key![from, to])
            .map(|r| (r.id, r.percent));

        let others = self.total_route_percent(from) - existing.map_or(0, |(_, p)| p as u32);
        ensure!(
            others + percent as u32 <= PERCENT_100 as u32,
            EvaluateError::RoutePercentOverflow
        )?;

        match existing {
            None if percent == 0 => Err(EvaluateError::RouteNotFound.into()),
            None => {
                ensure!(
                    self.routes_from(from).len() < self.config.max_withdraw_routes,
                    EvaluateError::TooManyRoutes
                )?;
                self.withdraw_vesting_routes
                    .create(|id| WithdrawVestingRouteObject {
                        id,
                        from,
                        to,
                        percent,
                        auto_vest,
                    })?;
                Ok(())
            }
            Some((id, _)) if percent == 0 => {
                self.withdraw_vesting_routes.remove(id)?;
                Ok(())
            }
            Some((id, _)) => {
                self.withdraw_vesting_routes.modify(id, |r| {
                    r.percent = percent;
                    r.auto_vest = auto_vest;
                })?;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::AccountService;
    use crate::testing::ChainStateBuilder;
    use crate::PERCENT_1;

    #[test]
    fn rate_never_drops_to_zero() {
        let mut state = ChainStateBuilder::new()
            .with_account("alice", Asset::scr(0), Asset::sp(10))
            .build()
            .unwrap();
        let db = state.database_mut();
        let alice = Withdrawable::Account(db.get_account(&"alice".parse().unwrap()).unwrap().id);

        db.start_withdraw_vesting(alice, Asset::sp(10)).unwrap();
        let schedule = db.find_withdraw_vesting(alice).unwrap();
        assert_eq!(schedule.vesting_withdraw_rate, Asset::sp(1));
        assert_eq!(schedule.to_withdraw, Asset::sp(10));

        db.stop_withdraw_vesting(alice).unwrap();
        assert!(db.find_withdraw_vesting(alice).is_none());
        assert_err_match!(
            crate::error::Error::Evaluate(EvaluateError::NothingToWithdraw),
            db.stop_withdraw_vesting(alice)
        );
    }

    #[test]
    fn routes_cannot_exceed_one_hundred_percent() {
        let mut state = ChainStateBuilder::new()
            .with_account("alice", Asset::scr(0), Asset::sp(0))
            .with_account("bob", Asset::scr(0), Asset::sp(0))
            .build()
            .unwrap();
        let db = state.database_mut();
        let alice = Withdrawable::Account(db.get_account(&"alice".parse().unwrap()).unwrap().id);
        let bob = Withdrawable::Account(db.get_account(&"bob".parse().unwrap()).unwrap().id);

        db.set_withdraw_route(alice, bob, 60 * PERCENT_1, false).unwrap();
        db.set_withdraw_route(alice, Withdrawable::DevPool, 40 * PERCENT_1, true)
            .unwrap();
        assert_eq!(db.total_route_percent(alice), PERCENT_100 as u32);
        assert_err_match!(
            crate::error::Error::Evaluate(EvaluateError::RoutePercentOverflow),
            db.set_withdraw_route(alice, bob, 61 * PERCENT_1, false)
        );

        db.set_withdraw_route(alice, bob, 0, false).unwrap();
        assert_eq!(db.routes_from(alice).len(), 1);
        assert_err_match!(
            crate::error::Error::Evaluate(EvaluateError::RouteNotFound),
            db.set_withdraw_route(alice, bob, 0, false)
        );
    }
}
