use crate::asset::{Asset, Symbol};
use crate::database::Database;
use crate::error::Result;
use crate::schema::RewardBalancerObject;
use chainbase::ObjectId;

const BALANCER_ID: ObjectId<RewardBalancerObject> = ObjectId::new(0);

/// Smooths the liquid users reward: advertising income is stored here and
/// paid out at an adaptive per block rate.
pub trait RewardBalancerService {
    fn get_reward_balancer(&self) -> Result<&RewardBalancerObject>;

    fn increase_reward_balancer(&mut self, amount: Asset) -> Result<()>;

    fn set_current_per_block_reward(&mut self, reward: Asset) -> Result<()>;

    /// Adjust the per block rate to the stored balance and take this block's
    /// reward out of it.
    fn take_block_reward(&mut self) -> Result<Asset>;
}

impl RewardBalancerService for Database {
    fn get_reward_balancer(&self) -> Result<&RewardBalancerObject> {
        Ok(self.reward_balancers.get(BALANCER_ID)?)
    }

    fn increase_reward_balancer(&mut self, amount: Asset) -> Result<()> {
        let balance = self.get_reward_balancer()?.balance.checked_adjust(amount)?;
        self.reward_balancers
            .modify(BALANCER_ID, |b| b.balance = balance)?;
        Ok(())
    }

    fn set_current_per_block_reward(&mut self, reward: Asset) -> Result<()> {
        self.reward_balancers
            .modify(BALANCER_ID, |b| b.current_per_block_reward = reward)?;
        Ok(())
    }

    fn take_block_reward(&mut self) -> Result<Asset> {
        let settings = &self.config.reward_balancer;
        let blocks_per_day = self.config.blocks_per_day() as i64;
        let min_reward = Asset::new(settings.min_per_block_reward, Symbol::Scr);
        let balancer = self.get_reward_balancer()?;

        let mut current = balancer.current_per_block_reward;
        let delta = Asset::new(
            current.percent(settings.adjust_percent).amount.max(min_reward.amount),
            Symbol::Scr,
        );
        let per_day = current.amount.saturating_mul(blocks_per_day);
        if balancer.balance.amount > per_day.saturating_mul(settings.increase_threshold_days as i64) {
            current = (current + delta)?;
        } else if balancer.balance.amount
            < per_day.saturating_mul(settings.guaranteed_supply_days as i64)
        {
            current = Asset::new(
                (current.amount - delta.amount).max(min_reward.amount),
                Symbol::Scr,
            );
        }

        let reward = balancer.balance.min(current);
        let balance = (balancer.balance - reward)?;
        self.reward_balancers.modify(BALANCER_ID, |b| {
            b.current_per_block_reward = current;
            b.balance = balance;
        })?;
        Ok(reward)
    }
}
