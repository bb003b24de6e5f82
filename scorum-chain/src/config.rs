//! Consensus parameters.
//!
//! Every policy value used by services, block tasks and evaluators lives
//! here. The configuration is read once at start up and shared read only.
use crate::types::Hardfork;
use crate::Percent;
use rewards_math::{CurveId, PERCENT_1, PERCENT_100};
use serde_derive::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

const DAY: u32 = 24 * 60 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read configuration file {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        cause: io::Error,
    },
    #[error("malformed configuration")]
    Format(#[from] serde_yaml::Error),
    #[error("`{name}` must not exceed 100%, found {value}")]
    PercentOutOfRange { name: &'static str, value: Percent },
    #[error("`{name}` must be positive")]
    Zero { name: &'static str },
    #[error("witness and active stake holder shares exceed the users reward")]
    RewardSplitOverflow,
    #[error("block interval of {0}s does not divide a day")]
    BlockInterval(u32),
}

/// Reward balancer tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RewardBalancerConfig {
    /// Step by which the per block reward moves.
    pub adjust_percent: Percent,
    /// Below this many days of supply the per block reward shrinks.
    pub guaranteed_supply_days: u32,
    /// Above this many days of supply the per block reward grows.
    pub increase_threshold_days: u32,
    pub min_per_block_reward: i64,
}

impl Default for RewardBalancerConfig {
    fn default() -> Self {
        RewardBalancerConfig {
            adjust_percent: 5 * PERCENT_1,
            guaranteed_supply_days: 30,
            increase_threshold_days: 100,
            min_per_block_reward: 1,
        }
    }
}

/// Activation of a hardfork at a block number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HardforkActivation {
    pub hardfork: Hardfork,
    pub block_num: u32,
}

/// Which per block amount a historical patch overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrutchTarget {
    FundBudget,
    RewardBalancer,
}

/// One off override of a per block reward at a given block, kept to replay
/// a chain history that carries it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduleCrutch {
    pub block_num: u32,
    pub target: CrutchTarget,
    pub per_block: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChainConfig {
    pub block_interval: u32,
    /// Blocks kept in the undo history before they are committed.
    pub irreversible_distance: u32,

    pub cashout_window_seconds: u32,
    pub upvote_lockout_seconds: u32,
    pub reverse_auction_window_seconds: u32,
    pub vote_regeneration_seconds: u32,
    pub min_vote_interval_seconds: u32,
    pub max_votes_per_day_rate: u16,
    pub vote_dust_threshold: i64,
    pub max_vote_changes: i32,
    pub max_comment_depth: u16,
    pub max_permlink_length: usize,

    pub recent_rshares_decay_seconds: u32,
    pub min_comment_payout_share: i64,
    pub author_reward_curve: CurveId,
    pub curation_reward_curve: CurveId,
    pub curation_reward_percent: Percent,
    pub parent_comment_reward_percent: Percent,

    pub dev_team_reward_percent: Percent,
    pub witness_reward_percent: Percent,
    pub active_sp_holders_reward_percent: Percent,
    /// Accounts that voted within this period share the active stake
    /// holders reward.
    pub active_sp_holders_reward_period_seconds: u32,
    pub reward_balancer: RewardBalancerConfig,

    pub vesting_withdraw_intervals: u32,
    pub vesting_withdraw_interval_seconds: u32,
    pub max_withdraw_routes: usize,

    pub max_proxy_recursion_depth: usize,
    pub max_account_witness_votes: u32,
    pub budgets_limit_per_owner: usize,

    pub registration_bonus_expiration_seconds: u32,
    /// Length of the sliding window limiting a committee member's bonuses.
    pub registration_limit_window_blocks: u32,
    /// Maximum bonuses a member may hand out over one window.
    pub registration_limit_per_window: u32,

    pub proposal_min_lifetime_seconds: u32,
    pub proposal_max_lifetime_seconds: u32,
    pub min_quorum_percent: u64,

    pub hardforks: Vec<HardforkActivation>,
    pub schedule_crutches: Vec<ScheduleCrutch>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        ChainConfig {
            block_interval: 3,
            irreversible_distance: 21,

            cashout_window_seconds: 7 * DAY,
            upvote_lockout_seconds: 12 * 60 * 60,
            reverse_auction_window_seconds: 30 * 60,
            vote_regeneration_seconds: 5 * DAY,
            min_vote_interval_seconds: 3,
            max_votes_per_day_rate: 10,
            vote_dust_threshold: 0,
            max_vote_changes: 5,
            max_comment_depth: 0xffff,
            max_permlink_length: 256,

            recent_rshares_decay_seconds: 15 * DAY,
            min_comment_payout_share: 0,
            author_reward_curve: CurveId::Linear,
            curation_reward_curve: CurveId::SquareRoot,
            curation_reward_percent: 25 * PERCENT_1,
            parent_comment_reward_percent: 50 * PERCENT_1,

            dev_team_reward_percent: 50 * PERCENT_1,
            witness_reward_percent: 10 * PERCENT_1,
            active_sp_holders_reward_percent: 10 * PERCENT_1,
            active_sp_holders_reward_period_seconds: 7 * DAY,
            reward_balancer: RewardBalancerConfig::default(),

            vesting_withdraw_intervals: 52,
            vesting_withdraw_interval_seconds: 7 * DAY,
            max_withdraw_routes: 10,

            max_proxy_recursion_depth: 4,
            max_account_witness_votes: 30,
            budgets_limit_per_owner: 1_000_000,

            registration_bonus_expiration_seconds: 150 * DAY,
            registration_limit_window_blocks: DAY / 3,
            registration_limit_per_window: 5,

            proposal_min_lifetime_seconds: DAY,
            proposal_max_lifetime_seconds: 10 * DAY,
            min_quorum_percent: 5,

            hardforks: Vec::new(),
            schedule_crutches: Vec::new(),
        }
    }
}

impl ChainConfig {
    /// Short windows for test networks.
    pub fn testnet() -> Self {
        ChainConfig {
            cashout_window_seconds: 60 * 60,
            upvote_lockout_seconds: 5 * 60,
            reward_balancer: RewardBalancerConfig {
                guaranteed_supply_days: 2,
                increase_threshold_days: 3,
                ..RewardBalancerConfig::default()
            },
            vesting_withdraw_intervals: 13,
            vesting_withdraw_interval_seconds: 60 * 7,
            budgets_limit_per_owner: 5,
            active_sp_holders_reward_period_seconds: 60 * 60,
            registration_bonus_expiration_seconds: 60 * 60,
            proposal_min_lifetime_seconds: 60,
            ..ChainConfig::default()
        }
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|cause| ConfigError::Io {
            path: path.to_owned(),
            cause,
        })?;
        let config: ChainConfig = serde_yaml::from_reader(file)?;
        config.validate()?;
        Ok(config)
    }

    pub fn blocks_per_day(&self) -> u32 {
        DAY / self.block_interval
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let percents = [
            ("curation_reward_percent", self.curation_reward_percent),
            ("parent_comment_reward_percent", self.parent_comment_reward_percent),
            ("dev_team_reward_percent", self.dev_team_reward_percent),
            ("witness_reward_percent", self.witness_reward_percent),
            (
                "active_sp_holders_reward_percent",
                self.active_sp_holders_reward_percent,
            ),
            ("reward_balancer.adjust_percent", self.reward_balancer.adjust_percent),
        ];
        for (name, value) in percents.iter() {
            if *value > PERCENT_100 {
                return Err(ConfigError::PercentOutOfRange {
                    name: *name,
                    value: *value,
                });
            }
        }
        if self.witness_reward_percent as u32 + self.active_sp_holders_reward_percent as u32
            > PERCENT_100 as u32
        {
            return Err(ConfigError::RewardSplitOverflow);
        }

        let positive = [
            ("block_interval", self.block_interval),
            ("vote_regeneration_seconds", self.vote_regeneration_seconds),
            ("recent_rshares_decay_seconds", self.recent_rshares_decay_seconds),
            (
                "reverse_auction_window_seconds",
                self.reverse_auction_window_seconds,
            ),
            ("vesting_withdraw_intervals", self.vesting_withdraw_intervals),
            (
                "registration_limit_window_blocks",
                self.registration_limit_window_blocks,
            ),
            ("max_votes_per_day_rate", self.max_votes_per_day_rate as u32),
        ];
        for (name, value) in positive.iter() {
            if *value == 0 {
                return Err(ConfigError::Zero { name: *name });
            }
        }
        if DAY % self.block_interval != 0 {
            return Err(ConfigError::BlockInterval(self.block_interval));
        }
        Ok(())
    }

    /// Hardfork in force at `block_num`, starting from `initial`.
    pub fn hardfork_at(&self, initial: Hardfork, block_num: u32) -> Hardfork {
        self.hardforks
            .iter()
            .filter(|activation| activation.block_num <= block_num)
            .map(|activation| activation.hardfork)
            .fold(initial, std::cmp::max)
    }

    pub fn crutches_at(&self, block_num: u32) -> impl Iterator<Item = &ScheduleCrutch> + '_ {
        self.schedule_crutches
            .iter()
            .filter(move |crutch| crutch.block_num == block_num)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        ChainConfig::default().validate().unwrap();
        ChainConfig::testnet().validate().unwrap();
        assert_eq!(ChainConfig::default().blocks_per_day(), 28_800);
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config: ChainConfig = serde_yaml::from_str(
            r#"
            block_interval: 3
            author_reward_curve: quadratic
            reward_balancer:
              min_per_block_reward: 10
            schedule_crutches:
              - block_num: 1000
                target: reward_balancer
                per_block: 5
            "#,
        )
        .unwrap();
        assert_eq!(config.author_reward_curve, CurveId::Quadratic);
        assert_eq!(config.reward_balancer.min_per_block_reward, 10);
        assert_eq!(config.reward_balancer.adjust_percent, 500);
        assert_eq!(config.crutches_at(1000).count(), 1);
        assert_eq!(config.crutches_at(999).count(), 0);
        assert_eq!(config.cashout_window_seconds, 7 * DAY);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(serde_yaml::from_str::<ChainConfig>("no_such_field: 1").is_err());
    }

    #[test]
    fn invalid_values_are_rejected() {
        let config = ChainConfig {
            witness_reward_percent: 6000,
            active_sp_holders_reward_percent: 6000,
            ..ChainConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::RewardSplitOverflow)
        ));

        let config = ChainConfig {
            block_interval: 7,
            ..ChainConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::BlockInterval(7))));
    }

    #[test]
    fn hardfork_schedule() {
        let config = ChainConfig {
            hardforks: vec![
                HardforkActivation {
                    hardfork: Hardfork::HARDFORK_0_1,
                    block_num: 10,
                },
                HardforkActivation {
                    hardfork: Hardfork::HARDFORK_0_2,
                    block_num: 20,
                },
            ],
            ..ChainConfig::default()
        };
        assert_eq!(config.hardfork_at(Hardfork::GENESIS, 9), Hardfork::GENESIS);
        assert_eq!(config.hardfork_at(Hardfork::GENESIS, 10), Hardfork::HARDFORK_0_1);
        assert_eq!(config.hardfork_at(Hardfork::GENESIS, 25), Hardfork::HARDFORK_0_2);
    }
}
