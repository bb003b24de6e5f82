use crate::asset::{Asset, Symbol};
use crate::database::Database;
use crate::error::Result;
use crate::schema::RewardFundObject;
use chainbase::{key, Object};

/// Content reward funds, one per currency.
pub trait RewardFundService {
    fn get_reward_fund(&self, symbol: Symbol) -> Result<&RewardFundObject>;

    fn update_reward_fund<F>(&mut self, symbol: Symbol, f: F) -> Result<()>
    where
        F: FnOnce(&mut RewardFundObject);

    /// Credit the fund matching the currency of `amount`.
    fn increase_reward_fund(&mut self, amount: Asset) -> Result<()> {
        let balance = self
            .get_reward_fund(amount.symbol)?
            .activity_reward_balance
            .checked_adjust(amount)?;
        self.update_reward_fund(amount.symbol, |f| f.activity_reward_balance = balance)
    }

    fn decrease_reward_fund(&mut self, amount: Asset) -> Result<()> {
        self.increase_reward_fund(-amount)
    }
}

impl RewardFundService for Database {
    fn get_reward_fund(&self, symbol: Symbol) -> Result<&RewardFundObject> {
        self.reward_funds
            .find_by(RewardFundObject::BY_SYMBOL, &key![symbol == Symbol::Sp])
            .ok_or_else(|| {
                chainbase::Error::ObjectNotFound {
                    type_name: RewardFundObject::TYPE_NAME,
                    id: (symbol == Symbol::Sp) as u64,
                }
                .into()
            })
    }

    fn update_reward_fund<F>(&mut self, symbol: Symbol, f: F) -> Result<()>
    where
        F: FnOnce(&mut RewardFundObject),
    {
        let id = self.get_reward_fund(symbol)?.id;
        self.reward_funds.modify(id, f)?;
        Ok(())
    }
}
