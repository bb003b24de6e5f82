use crate::asset::{Asset, Symbol};
use crate::database::Database;
use crate::error::{EvaluateError, Result};
use crate::schema::DevPoolObject;
use chainbase::ObjectId;

const DEV_POOL_ID: ObjectId<DevPoolObject> = ObjectId::new(0);

/// Development pool, managed by the development committee.
pub trait DevPoolService {
    fn get_dev_pool(&self) -> Result<&DevPoolObject>;

    fn update_dev_pool<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&mut DevPoolObject);

    /// Credit the liquid or staked balance depending on the currency.
    fn increase_dev_pool(&mut self, amount: Asset) -> Result<()>;

    fn decrease_dev_pool(&mut self, amount: Asset) -> Result<()>;
}

impl DevPoolService for Database {
    fn get_dev_pool(&self) -> Result<&DevPoolObject> {
        Ok(self.dev_pools.get(DEV_POOL_ID)?)
    }

    fn update_dev_pool<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&mut DevPoolObject),
    {
        self.dev_pools.modify(DEV_POOL_ID, f)?;
        Ok(())
    }

    fn increase_dev_pool(&mut self, amount: Asset) -> Result<()> {
        let pool = self.get_dev_pool()?;
        let current = match amount.symbol {
            Symbol::Scr => pool.scr_balance,
            Symbol::Sp => pool.sp_balance,
        };
        let updated = current.checked_adjust(amount).map_err(|_| {
            EvaluateError::InsufficientFunds {
                account: "dev pool".to_owned(),
                required: -amount,
                available: current,
            }
        })?;
        self.update_dev_pool(|p| match amount.symbol {
            Symbol::Scr => p.scr_balance = updated,
            Symbol::Sp => p.sp_balance = updated,
        })
    }

    fn decrease_dev_pool(&mut self, amount: Asset) -> Result<()> {
        self.increase_dev_pool(-amount)
    }
}
