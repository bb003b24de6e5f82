use crate::asset::Asset;
use crate::config::{
    ChainConfig, CrutchTarget, HardforkActivation, RewardBalancerConfig, ScheduleCrutch,
};
use crate::error::Result;
use crate::genesis::{Genesis, GenesisAccount, GenesisFundBudget, GenesisWitness};
use crate::schema::ScheduleItem;
use crate::services::DynamicGlobalPropertyService;
use crate::time::TimePointSec;
use crate::types::{AccountName, CommitteeKind, Hardfork};
use crate::{ChainState, Percent};
use std::sync::Arc;

pub const GENESIS_TIME: TimePointSec = TimePointSec(1_500_000_000);

fn name(name: &str) -> AccountName {
    name.parse().expect("valid account name")
}

#[derive(Clone)]
pub struct ConfigBuilder {
    config: ChainConfig,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        ConfigBuilder {
            config: ChainConfig::default(),
        }
    }

    pub fn with_reward_balancer(
        mut self,
        adjust_percent: Percent,
        guaranteed_supply_days: u32,
        increase_threshold_days: u32,
        min_per_block_reward: i64,
    ) -> Self {
        self.config.reward_balancer = RewardBalancerConfig {
            adjust_percent,
            guaranteed_supply_days,
            increase_threshold_days,
            min_per_block_reward,
        };
        self
    }

    pub fn with_hardfork_at(mut self, hardfork: Hardfork, block_num: u32) -> Self {
        self.config
            .hardforks
            .push(HardforkActivation { hardfork, block_num });
        self
    }

    pub fn with_schedule_crutch(
        mut self,
        block_num: u32,
        target: CrutchTarget,
        per_block: i64,
    ) -> Self {
        self.config.schedule_crutches.push(ScheduleCrutch {
            block_num,
            target,
            per_block,
        });
        self
    }

    pub fn with_irreversible_distance(mut self, distance: u32) -> Self {
        self.config.irreversible_distance = distance;
        self
    }

    pub fn build(self) -> ChainConfig {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Chain state right after genesis, with a funded registration pool and
/// everything else empty unless asked for.
pub struct ChainStateBuilder {
    config: ChainConfig,
    genesis: Genesis,
    fund_budget_blocks: Option<(Asset, u32)>,
    hardfork: Option<Hardfork>,
}

impl ChainStateBuilder {
    pub fn new() -> Self {
        let mut genesis = Genesis::new(GENESIS_TIME);
        genesis.registration.balance = 1_000_000_000;
        genesis.registration.maximum_bonus = 100_000;
        genesis.registration.schedule = vec![
            ScheduleItem {
                users: 10,
                bonus_percent: 100,
            },
            ScheduleItem {
                users: 100,
                bonus_percent: 50,
            },
        ];
        ChainStateBuilder {
            config: ChainConfig::default(),
            genesis,
            fund_budget_blocks: None,
            hardfork: None,
        }
    }

    pub fn with_config(mut self, config: ChainConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_account(mut self, account: &str, balance: Asset, scorumpower: Asset) -> Self {
        self.genesis.accounts.push(GenesisAccount {
            name: name(account),
            balance: balance.amount,
            scorumpower: scorumpower.amount,
        });
        self
    }

    pub fn with_witness(mut self, owner: &str) -> Self {
        self.genesis.witnesses.push(GenesisWitness {
            owner: name(owner),
            url: format!("https://{}.example", owner),
            signing_key: format!("SCR{}", owner),
        });
        self
    }

    pub fn with_committee_member(mut self, committee: CommitteeKind, account: &str) -> Self {
        let members = match committee {
            CommitteeKind::Registration => &mut self.genesis.registration.committee,
            CommitteeKind::Development => &mut self.genesis.development_committee,
        };
        members.push(name(account));
        self
    }

    /// Fund budget paying `balance` out over `blocks` blocks.
    pub fn with_fund_budget(mut self, balance: Asset, blocks: u32) -> Self {
        self.fund_budget_blocks = Some((balance, blocks));
        self
    }

    pub fn with_rewards_supply(mut self, supply: Asset) -> Self {
        self.genesis.rewards_supply = supply.amount;
        self
    }

    /// Run under `hardfork` from genesis on.
    pub fn with_hardfork(mut self, hardfork: Hardfork) -> Self {
        self.hardfork = Some(hardfork);
        self
    }

    pub fn build(mut self) -> Result<ChainState> {
        if let Some((balance, blocks)) = self.fund_budget_blocks {
            let deadline = GENESIS_TIME.add_seconds(blocks * self.config.block_interval);
            self.genesis.fund_budget = Some(GenesisFundBudget { balance, deadline });
        }
        let mut state = ChainState::from_genesis(Arc::new(self.config), &self.genesis)?;
        if let Some(hardfork) = self.hardfork {
            state
                .database_mut()
                .update_dynamic_global_properties(|p| p.hardfork = hardfork)?;
        }
        Ok(state)
    }
}

impl Default for ChainStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
