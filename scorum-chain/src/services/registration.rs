use super::DynamicGlobalPropertyService;
use crate::asset::Asset;
use crate::database::Database;
use crate::error::{EvaluateError, Result};
use crate::schema::{AccountRegistrationBonusObject, RegistrationPoolObject};
use crate::time::TimePointSec;
use crate::types::AccountName;
use chainbase::{key, ObjectId};

const REGISTRATION_POOL_ID: ObjectId<RegistrationPoolObject> = ObjectId::new(0);

/// Bonus of the schedule stage `already_allocated` registrations fall into.
/// Past the last stage the last one applies.
pub fn calculate_per_reg(pool: &RegistrationPoolObject) -> Result<Asset> {
    let mut rest = pool.already_allocated_count;
    let mut stage = None;
    for item in pool.schedule_items.iter() {
        stage = Some(item);
        if rest < item.users {
            break;
        }
        rest -= item.users;
    }
    let item = stage.ok_or(EvaluateError::InvalidRegistrationSchedule)?;
    let bonus = pool.maximum_bonus.fraction(item.bonus_percent as u128, 100);
    ensure!(
        bonus.is_positive(),
        EvaluateError::InvalidRegistrationSchedule
    )?;
    Ok(bonus)
}

pub trait RegistrationPoolService {
    fn get_registration_pool(&self) -> Result<&RegistrationPoolObject>;

    /// Take the bonus of the next registration out of the pool, at most
    /// what is left in it.
    fn allocate_registration_bonus(&mut self) -> Result<Asset>;

    fn increase_registration_pool(&mut self, amount: Asset) -> Result<()>;
}

impl RegistrationPoolService for Database {
    fn get_registration_pool(&self) -> Result<&RegistrationPoolObject> {
        Ok(self.registration_pools.get(REGISTRATION_POOL_ID)?)
    }

    fn allocate_registration_bonus(&mut self) -> Result<Asset> {
        let pool = self.get_registration_pool()?;
        ensure!(
            pool.balance.is_positive(),
            EvaluateError::RegistrationPoolExhausted
        )?;
        let bonus = calculate_per_reg(pool)?.min(pool.balance);
        let balance = (pool.balance - bonus)?;
        self.registration_pools.modify(REGISTRATION_POOL_ID, |p| {
            p.balance = balance;
            p.already_allocated_count += 1;
        })?;
        if balance.is_zero() {
            tracing::info!("registration pool is exhausted");
        }
        Ok(bonus)
    }

    fn increase_registration_pool(&mut self, amount: Asset) -> Result<()> {
        let balance = self.get_registration_pool()?.balance.checked_adjust(amount)?;
        self.registration_pools
            .modify(REGISTRATION_POOL_ID, |p| p.balance = balance)?;
        Ok(())
    }
}

/// Registration bonuses that expire and are taken back.
pub trait AccountRegistrationBonusService {
    fn create_registration_bonus(&mut self, account: &AccountName, bonus: Asset) -> Result<()>;

    fn find_registration_bonus(&self, account: &AccountName)
        -> Option<&AccountRegistrationBonusObject>;

    fn expired_registration_bonuses(
        &self,
        until: TimePointSec,
    ) -> Vec<ObjectId<AccountRegistrationBonusObject>>;

    fn remove_registration_bonus(
        &mut self,
        id: ObjectId<AccountRegistrationBonusObject>,
    ) -> Result<AccountRegistrationBonusObject>;
}

impl AccountRegistrationBonusService for Database {
    fn create_registration_bonus(&mut self, account: &AccountName, bonus: Asset) -> Result<()> {
        let expires = self
            .head_block_time()?
            .add_seconds(self.config.registration_bonus_expiration_seconds);
        self.registration_bonuses
            .create(|id| AccountRegistrationBonusObject {
                id,
                account: account.clone(),
                bonus,
                expires,
            })?;
        Ok(())
    }

    fn find_registration_bonus(
        &self,
        account: &AccountName,
    ) -> Option<&AccountRegistrationBonusObject> {
        self.registration_bonuses
            .find_by(AccountRegistrationBonusObject::BY_ACCOUNT, &key![account])
    }

    fn expired_registration_bonuses(
        &self,
        until: TimePointSec,
    ) -> Vec<ObjectId<AccountRegistrationBonusObject>> {
        self.registration_bonuses
            .iter_by(AccountRegistrationBonusObject::BY_EXPIRATION)
            .take_while(|b| b.expires <= until)
            .map(|b| b.id)
            .collect()
    }

    fn remove_registration_bonus(
        &mut self,
        id: ObjectId<AccountRegistrationBonusObject>,
    ) -> Result<AccountRegistrationBonusObject> {
        Ok(self.registration_bonuses.remove(id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ScheduleItem;

    fn pool(allocated: u64) -> RegistrationPoolObject {
        RegistrationPoolObject {
            id: ObjectId::new(0),
            balance: Asset::scr(1_000_000),
            maximum_bonus: Asset::scr(1_000),
            schedule_items: vec![
                ScheduleItem {
                    users: 2,
                    bonus_percent: 100,
                },
                ScheduleItem {
                    users: 3,
                    bonus_percent: 50,
                },
                ScheduleItem {
                    users: 1,
                    bonus_percent: 25,
                },
            ],
            already_allocated_count: allocated,
        }
    }

    #[test]
    fn schedule_walk() {
        let bonuses: Vec<_> = (0..8)
            .map(|n| calculate_per_reg(&pool(n)).unwrap().amount)
            .collect();
        assert_eq!(bonuses, vec![1_000, 1_000, 500, 500, 500, 250, 250, 250]);
    }

    #[test]
    fn zero_bonus_stage_is_rejected() {
        let mut pool = pool(0);
        pool.schedule_items[0].bonus_percent = 0;
        assert_err_match!(
            crate::error::Error::Evaluate(EvaluateError::InvalidRegistrationSchedule),
            calculate_per_reg(&pool)
        );
        pool.schedule_items.clear();
        assert_err_match!(
            crate::error::Error::Evaluate(EvaluateError::InvalidRegistrationSchedule),
            calculate_per_reg(&pool)
        );
    }
}
