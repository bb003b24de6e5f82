use super::{DynamicGlobalPropertyService, WitnessService};
use crate::asset::{Asset, AssetError, Symbol};
use crate::database::Database;
use crate::error::{EvaluateError, Result};
use crate::schema::{AccountObject, WitnessVoteObject, PROXIED_VOTES_DEPTH};
use crate::time::TimePointSec;
use crate::types::AccountName;
use crate::Percent;
use chainbase::{key, ObjectId};

/// Stake delta per proxy level, index 0 being the account's own stake.
pub type ProxiedDelta = [i64; PROXIED_VOTES_DEPTH + 1];

pub trait AccountService {
    fn find_account(&self, name: &AccountName) -> Option<&AccountObject>;

    fn get_account(&self, name: &AccountName) -> Result<&AccountObject>;

    fn get_account_by_id(&self, id: ObjectId<AccountObject>) -> Result<&AccountObject>;

    fn check_account_existence(&self, name: &AccountName) -> Result<()> {
        self.get_account(name).map(|_| ())
    }

    /// Create an account, `fee` is turned into its initial scorumpower.
    fn create_account(
        &mut self,
        name: &AccountName,
        creator: Option<&AccountName>,
        json_metadata: &str,
        fee: Asset,
    ) -> Result<ObjectId<AccountObject>>;

    /// Create an account whose initial scorumpower is the registration
    /// `bonus`.
    fn create_account_with_bonus(
        &mut self,
        name: &AccountName,
        creator: &AccountName,
        json_metadata: &str,
        bonus: Asset,
    ) -> Result<ObjectId<AccountObject>> {
        self.create_account(name, Some(creator), json_metadata, bonus)
    }

    fn update_account<F>(&mut self, id: ObjectId<AccountObject>, f: F) -> Result<()>
    where
        F: FnOnce(&mut AccountObject);

    /// Credit liquid balance, never fails for a positive amount.
    fn increase_balance(&mut self, id: ObjectId<AccountObject>, amount: Asset) -> Result<()>;

    fn decrease_balance(&mut self, id: ObjectId<AccountObject>, amount: Asset) -> Result<()>;

    fn increase_scorumpower(&mut self, id: ObjectId<AccountObject>, amount: Asset) -> Result<()>;

    fn decrease_scorumpower(&mut self, id: ObjectId<AccountObject>, amount: Asset) -> Result<()>;

    /// Stake `scorum` 1:1, returning the scorumpower created.
    fn create_scorumpower(&mut self, id: ObjectId<AccountObject>, scorum: Asset) -> Result<Asset> {
        let scorumpower = scorum.convert(Symbol::Sp);
        self.increase_scorumpower(id, scorumpower)?;
        Ok(scorumpower)
    }

    fn increase_pending_balance(&mut self, id: ObjectId<AccountObject>, amount: Asset)
        -> Result<()>;

    fn increase_pending_scorumpower(
        &mut self,
        id: ObjectId<AccountObject>,
        amount: Asset,
    ) -> Result<()>;

    fn update_voting_power(&mut self, id: ObjectId<AccountObject>, voting_power: Percent)
        -> Result<()>;

    /// Schedule the next active stake holder payout unless one is already
    /// scheduled.
    fn update_active_sp_holders_cashout_time(&mut self, id: ObjectId<AccountObject>) -> Result<()>;

    /// Accounts whose pending active stake holder rewards are due.
    fn active_sp_holders_due(&self, until: TimePointSec) -> Vec<ObjectId<AccountObject>>;

    /// Propagate a stake change up the proxy chain of `id`, ending in the
    /// witness votes of the last account of the chain.
    fn adjust_proxied_witness_votes(&mut self, id: ObjectId<AccountObject>, delta: i64)
        -> Result<()>;

    fn adjust_proxied_witness_votes_by_level(
        &mut self,
        id: ObjectId<AccountObject>,
        delta: ProxiedDelta,
    ) -> Result<()>;

    fn clear_witness_votes(&mut self, id: ObjectId<AccountObject>) -> Result<()>;

    /// Set or clear the proxy of `id`, moving its stake between chains.
    fn update_proxy(&mut self, id: ObjectId<AccountObject>, proxy: Option<&AccountName>)
        -> Result<()>;
}

fn require_symbol(amount: Asset, symbol: Symbol) -> Result<()> {
    if amount.symbol == symbol {
        Ok(())
    } else {
        Err(AssetError::SymbolMismatch {
            left: symbol,
            right: amount.symbol,
        }
        .into())
    }
}

impl Database {
    fn max_proxy_depth(&self) -> usize {
        (self.config.max_proxy_recursion_depth as usize).min(PROXIED_VOTES_DEPTH)
    }
}

impl AccountService for Database {
    fn find_account(&self, name: &AccountName) -> Option<&AccountObject> {
        self.accounts.find_by(AccountObject::BY_NAME, &key![name])
    }

    fn get_account(&self, name: &AccountName) -> Result<&AccountObject> {
        self.find_account(name)
            .ok_or_else(|| EvaluateError::AccountNotFound(name.clone()).into())
    }

    fn get_account_by_id(&self, id: ObjectId<AccountObject>) -> Result<&AccountObject> {
        Ok(self.accounts.get(id)?)
    }

    fn create_account(
        &mut self,
        name: &AccountName,
        creator: Option<&AccountName>,
        json_metadata: &str,
        fee: Asset,
    ) -> Result<ObjectId<AccountObject>> {
        ensure!(
            self.find_account(name).is_none(),
            EvaluateError::AccountAlreadyExists(name.clone())
        )?;
        let created = self.head_block_time()?;
        let id = self
            .accounts
            .create(|id| {
                let mut account = AccountObject::new(id, name.clone(), created);
                account.creator = creator.cloned();
                account.json_metadata = json_metadata.to_owned();
                account
            })?
            .id;
        if fee.is_positive() {
            self.create_scorumpower(id, fee)?;
        }
        tracing::debug!(account = %name, fee = %fee, "account created");
        Ok(id)
    }

    fn update_account<F>(&mut self, id: ObjectId<AccountObject>, f: F) -> Result<()>
    where
        F: FnOnce(&mut AccountObject),
    {
        self.accounts.modify(id, f)?;
        Ok(())
    }

    fn increase_balance(&mut self, id: ObjectId<AccountObject>, amount: Asset) -> Result<()> {
        require_symbol(amount, Symbol::Scr)?;
        let account = self.get_account_by_id(id)?;
        let balance = match account.balance.checked_adjust(amount) {
            Ok(balance) => balance,
            Err(AssetError::NegativeAmount) => {
                return Err(EvaluateError::InsufficientFunds {
                    account: account.name.to_string(),
                    required: -amount,
                    available: account.balance,
                }
                .into())
            }
            Err(e) => return Err(e.into()),
        };
        let capital = self
            .dynamic_global_properties()?
            .circulating_capital
            .checked_adjust(amount)?;

        self.accounts.modify(id, |a| a.balance = balance)?;
        self.update_dynamic_global_properties(|p| p.circulating_capital = capital)
    }

    fn decrease_balance(&mut self, id: ObjectId<AccountObject>, amount: Asset) -> Result<()> {
        self.increase_balance(id, -amount)
    }

    fn increase_scorumpower(&mut self, id: ObjectId<AccountObject>, amount: Asset) -> Result<()> {
        require_symbol(amount, Symbol::Sp)?;
        let account = self.get_account_by_id(id)?;
        let scorumpower = match account.scorumpower.checked_adjust(amount) {
            Ok(sp) => sp,
            Err(AssetError::NegativeAmount) => {
                return Err(EvaluateError::InsufficientFunds {
                    account: account.name.to_string(),
                    required: -amount,
                    available: account.scorumpower,
                }
                .into())
            }
            Err(e) => return Err(e.into()),
        };
        let props = self.dynamic_global_properties()?;
        let capital = props
            .circulating_capital
            .checked_adjust(amount.convert(Symbol::Scr))?;
        let total = props.total_scorumpower.checked_adjust(amount)?;

        self.accounts.modify(id, |a| a.scorumpower = scorumpower)?;
        self.update_dynamic_global_properties(|p| {
            p.circulating_capital = capital;
            p.total_scorumpower = total;
        })?;
        self.adjust_proxied_witness_votes(id, amount.amount)
    }

    fn decrease_scorumpower(&mut self, id: ObjectId<AccountObject>, amount: Asset) -> Result<()> {
        self.increase_scorumpower(id, -amount)
    }

    fn increase_pending_balance(
        &mut self,
        id: ObjectId<AccountObject>,
        amount: Asset,
    ) -> Result<()> {
        require_symbol(amount, Symbol::Scr)?;
        let pending = self
            .get_account_by_id(id)?
            .active_sp_holders_pending_scr_reward
            .checked_adjust(amount)?;
        let total = self
            .dynamic_global_properties()?
            .total_pending_scr
            .checked_adjust(amount)?;
        self.accounts
            .modify(id, |a| a.active_sp_holders_pending_scr_reward = pending)?;
        self.update_dynamic_global_properties(|p| p.total_pending_scr = total)
    }

    fn increase_pending_scorumpower(
        &mut self,
        id: ObjectId<AccountObject>,
        amount: Asset,
    ) -> Result<()> {
        require_symbol(amount, Symbol::Sp)?;
        let pending = self
            .get_account_by_id(id)?
            .active_sp_holders_pending_sp_reward
            .checked_adjust(amount)?;
        let total = self
            .dynamic_global_properties()?
            .total_pending_sp
            .checked_adjust(amount)?;
        self.accounts
            .modify(id, |a| a.active_sp_holders_pending_sp_reward = pending)?;
        self.update_dynamic_global_properties(|p| p.total_pending_sp = total)
    }

    fn update_voting_power(
        &mut self,
        id: ObjectId<AccountObject>,
        voting_power: Percent,
    ) -> Result<()> {
        if voting_power < self.get_account_by_id(id)?.voting_power {
            self.update_active_sp_holders_cashout_time(id)?;
        }
        let now = self.head_block_time()?;
        self.accounts.modify(id, |a| {
            a.voting_power = voting_power;
            a.last_vote_time = now;
            a.vote_reward_competitive_sp = a.effective_scorumpower();
        })?;
        Ok(())
    }

    fn update_active_sp_holders_cashout_time(&mut self, id: ObjectId<AccountObject>) -> Result<()> {
        if self
            .get_account_by_id(id)?
            .active_sp_holders_cashout_time
            .is_maximum()
        {
            let cashout = self
                .head_block_time()?
                .add_seconds(self.config.active_sp_holders_reward_period_seconds);
            self.accounts
                .modify(id, |a| a.active_sp_holders_cashout_time = cashout)?;
        }
        Ok(())
    }

    fn active_sp_holders_due(&self, until: TimePointSec) -> Vec<ObjectId<AccountObject>> {
        self.accounts
            .iter_by(AccountObject::BY_ACTIVE_SP_HOLDERS_CASHOUT)
            .take_while(|a| a.active_sp_holders_cashout_time <= until)
            .map(|a| a.id)
            .collect()
    }

    fn adjust_proxied_witness_votes(
        &mut self,
        id: ObjectId<AccountObject>,
        delta: i64,
    ) -> Result<()> {
        let max_depth = self.max_proxy_depth();
        let mut current = id;
        for depth in 0..=max_depth {
            let proxy = match self.get_account_by_id(current)?.proxy.clone() {
                Some(proxy) => proxy,
                None => return self.adjust_witness_votes(current, delta),
            };
            if depth >= max_depth {
                // deeper proxies are not followed
                return Ok(());
            }
            let proxy_id = self.get_account(&proxy)?.id;
            self.accounts
                .modify(proxy_id, |a| a.proxied_vsf_votes[depth] += delta)?;
            current = proxy_id;
        }
        Ok(())
    }

    fn adjust_proxied_witness_votes_by_level(
        &mut self,
        id: ObjectId<AccountObject>,
        delta: ProxiedDelta,
    ) -> Result<()> {
        let max_depth = self.max_proxy_depth();
        let mut current = id;
        for depth in 0..=max_depth {
            let proxy = match self.get_account_by_id(current)?.proxy.clone() {
                Some(proxy) => proxy,
                None => {
                    let total: i64 = delta[..=(max_depth - depth)].iter().sum();
                    return self.adjust_witness_votes(current, total);
                }
            };
            if depth >= max_depth {
                return Ok(());
            }
            let proxy_id = self.get_account(&proxy)?.id;
            self.accounts.modify(proxy_id, |a| {
                for i in (0..max_depth - depth).rev() {
                    a.proxied_vsf_votes[i + depth] += delta[i];
                }
            })?;
            current = proxy_id;
        }
        Ok(())
    }

    fn clear_witness_votes(&mut self, id: ObjectId<AccountObject>) -> Result<()> {
        let votes: Vec<_> = self
            .witness_votes
            .prefix_by(WitnessVoteObject::BY_ACCOUNT_WITNESS, &key![id])
            .map(|v| v.id)
            .collect();
        for vote in votes {
            self.witness_votes.remove(vote)?;
        }
        self.accounts.modify(id, |a| a.witnesses_voted_for = 0)?;
        Ok(())
    }

    fn update_proxy(
        &mut self,
        id: ObjectId<AccountObject>,
        proxy: Option<&AccountName>,
    ) -> Result<()> {
        if let Some(proxy) = proxy {
            let mut chain = vec![id];
            let mut next = Some(proxy.clone());
            while let Some(name) = next {
                let link = self.get_account(&name)?;
                ensure!(!chain.contains(&link.id), EvaluateError::ProxyCycle)?;
                chain.push(link.id);
                ensure!(
                    chain.len() <= self.max_proxy_depth(),
                    EvaluateError::ProxyCycle
                )?;
                next = link.proxy.clone();
            }
        }

        let account = self.get_account_by_id(id)?;
        let mut delta: ProxiedDelta = [0; PROXIED_VOTES_DEPTH + 1];
        delta[0] = -account.scorumpower.amount;
        for (i, proxied) in account.proxied_vsf_votes.iter().enumerate() {
            delta[i + 1] = -proxied;
        }
        self.adjust_proxied_witness_votes_by_level(id, delta)?;

        match proxy {
            Some(proxy) => {
                self.clear_witness_votes(id)?;
                let proxy = proxy.clone();
                self.accounts.modify(id, |a| a.proxy = Some(proxy))?;
                for d in delta.iter_mut() {
                    *d = -*d;
                }
                self.adjust_proxied_witness_votes_by_level(id, delta)
            }
            None => {
                self.accounts.modify(id, |a| a.proxy = None)?;
                Ok(())
            }
        }
    }
}
