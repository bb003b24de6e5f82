//! Initial state of a chain.
//!
//! The genesis description is read from YAML and turned into the records of
//! block 0: the singletons every service expects plus the initial accounts,
//! witnesses, committees and budgets.

use crate::asset::{Asset, Symbol};
use crate::config::ConfigError;
use crate::database::Database;
use crate::error::{Result, ValidationError};
use crate::schema::{
    DevPoolObject, DynamicGlobalPropertyObject, RegistrationPoolObject, RewardBalancerObject,
    RewardFundObject, ScheduleItem,
};
use crate::services::{
    AccountService, BudgetService, CommitteeService, DevPoolService, RewardBalancerService,
    WitnessService,
};
use crate::time::TimePointSec;
use crate::types::{AccountName, CommitteeKind, Hardfork, Quorums};
use serde_derive::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenesisAccount {
    pub name: AccountName,
    /// Liquid balance, in SCR units.
    #[serde(default)]
    pub balance: i64,
    /// Staked balance, in SP units.
    #[serde(default)]
    pub scorumpower: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenesisWitness {
    pub owner: AccountName,
    #[serde(default)]
    pub url: String,
    pub signing_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenesisFundBudget {
    pub balance: Asset,
    pub deadline: TimePointSec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenesisRegistration {
    pub balance: i64,
    pub maximum_bonus: i64,
    pub schedule: Vec<ScheduleItem>,
    pub committee: Vec<AccountName>,
}

impl Default for GenesisRegistration {
    fn default() -> Self {
        GenesisRegistration {
            balance: 0,
            maximum_bonus: 0,
            schedule: Vec::new(),
            committee: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Genesis {
    pub initial_timestamp: TimePointSec,
    #[serde(default)]
    pub accounts: Vec<GenesisAccount>,
    #[serde(default)]
    pub witnesses: Vec<GenesisWitness>,
    #[serde(default)]
    pub fund_budget: Option<GenesisFundBudget>,
    /// Initial reward balancer balance, in SCR units.
    #[serde(default)]
    pub rewards_supply: i64,
    #[serde(default)]
    pub registration: GenesisRegistration,
    #[serde(default)]
    pub development_committee: Vec<AccountName>,
    #[serde(default)]
    pub dev_pool_scr: i64,
    #[serde(default)]
    pub dev_pool_sp: i64,
}

impl Genesis {
    /// Empty chain starting at `initial_timestamp`.
    pub fn new(initial_timestamp: TimePointSec) -> Self {
        Genesis {
            initial_timestamp,
            accounts: Vec::new(),
            witnesses: Vec::new(),
            fund_budget: None,
            rewards_supply: 0,
            registration: GenesisRegistration::default(),
            development_committee: Vec::new(),
            dev_pool_scr: 0,
            dev_pool_sp: 0,
        }
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> std::result::Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|cause| ConfigError::Io {
            path: path.to_owned(),
            cause,
        })?;
        Ok(serde_yaml::from_reader(file)?)
    }

    fn validate(&self) -> Result<()> {
        let amounts = [
            ("rewards_supply", self.rewards_supply),
            ("registration.balance", self.registration.balance),
            ("registration.maximum_bonus", self.registration.maximum_bonus),
            ("dev_pool_scr", self.dev_pool_scr),
            ("dev_pool_sp", self.dev_pool_sp),
        ];
        for (field, amount) in amounts.iter() {
            ensure!(
                *amount >= 0,
                ValidationError::NonPositiveAmount { field: *field }
            )?;
        }
        for account in self.accounts.iter() {
            ensure!(
                account.balance >= 0 && account.scorumpower >= 0,
                ValidationError::NonPositiveAmount { field: "accounts" }
            )?;
        }
        Ok(())
    }

    /// Write the block 0 records into an empty database.
    pub fn apply(&self, db: &mut Database) -> Result<()> {
        self.validate()?;
        let time = self.initial_timestamp;
        let config = db.config.clone();

        db.dynamic_global_properties
            .create(|id| DynamicGlobalPropertyObject {
                id,
                head_block_number: 0,
                time,
                current_witness: None,
                last_irreversible_block_num: 0,
                hardfork: config.hardfork_at(Hardfork::GENESIS, 0),
                circulating_capital: Asset::scr(0),
                total_scorumpower: Asset::sp(0),
                total_pending_scr: Asset::scr(0),
                total_pending_sp: Asset::sp(0),
                registration_quorums: Quorums::default(),
            })?;

        for symbol in [Symbol::Scr, Symbol::Sp].iter() {
            db.reward_funds.create(|id| RewardFundObject {
                id,
                activity_reward_balance: Asset::new(0, *symbol),
                recent_claims: 0,
                last_payout_check: time,
                author_reward_curve: config.author_reward_curve,
                curation_reward_curve: config.curation_reward_curve,
            })?;
        }

        db.reward_balancers.create(|id| RewardBalancerObject {
            id,
            balance: Asset::scr(0),
            current_per_block_reward: Asset::scr(config.reward_balancer.min_per_block_reward),
        })?;
        if self.rewards_supply > 0 {
            db.increase_reward_balancer(Asset::scr(self.rewards_supply))?;
        }

        db.dev_pools.create(|id| DevPoolObject {
            id,
            scr_balance: Asset::scr(0),
            sp_balance: Asset::sp(0),
            quorums: Quorums::default(),
        })?;
        if self.dev_pool_scr > 0 {
            db.increase_dev_pool(Asset::scr(self.dev_pool_scr))?;
        }
        if self.dev_pool_sp > 0 {
            db.increase_dev_pool(Asset::sp(self.dev_pool_sp))?;
        }

        db.registration_pools.create(|id| RegistrationPoolObject {
            id,
            balance: Asset::scr(self.registration.balance),
            maximum_bonus: Asset::scr(self.registration.maximum_bonus),
            schedule_items: self.registration.schedule.clone(),
            already_allocated_count: 0,
        })?;

        for account in self.accounts.iter() {
            let id = db.create_account(&account.name, None, "", Asset::scr(0))?;
            if account.balance > 0 {
                db.increase_balance(id, Asset::scr(account.balance))?;
            }
            if account.scorumpower > 0 {
                db.increase_scorumpower(id, Asset::sp(account.scorumpower))?;
            }
        }
        for witness in self.witnesses.iter() {
            db.check_account_existence(&witness.owner)?;
            db.create_witness(&witness.owner, &witness.url, &witness.signing_key)?;
        }

        for member in self.registration.committee.iter() {
            db.add_member(CommitteeKind::Registration, member)?;
        }
        for member in self.development_committee.iter() {
            db.add_member(CommitteeKind::Development, member)?;
        }

        if let Some(budget) = &self.fund_budget {
            db.create_fund_budget(budget.balance, budget.deadline)?;
        }

        tracing::info!(
            accounts = self.accounts.len(),
            witnesses = self.witnesses.len(),
            timestamp = %time,
            "genesis applied"
        );
        Ok(())
    }
}
