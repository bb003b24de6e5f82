use super::{
    AccountService, DevPoolService, DynamicGlobalPropertyService, RegistrationPoolService,
};
use crate::asset::Asset;
use crate::database::Database;
use crate::error::{EvaluateError, Result, ValidationError};
use crate::schema::CommitteeMemberObject;
use crate::types::{AccountName, CommitteeKind, QuorumKind, Quorums};
use chainbase::key;

/// Whether `votes` out of `members` reach `quorum_percent` (0 to 100).
///
/// Integer arithmetic truncates: two votes out of three are 66.66%.
pub fn is_quorum(votes: u64, members: u64, quorum_percent: u64) -> bool {
    if members == 0 {
        return false;
    }
    let actual = votes.saturating_mul(crate::PERCENT_100 as u64) / members;
    actual >= quorum_percent.saturating_mul(crate::PERCENT_1 as u64)
}

/// Membership and voting rules of the registration and development
/// committees.
pub trait CommitteeService {
    fn committee_members(&self, committee: CommitteeKind) -> Vec<&CommitteeMemberObject>;

    fn members_count(&self, committee: CommitteeKind) -> usize {
        self.committee_members(committee).len()
    }

    fn find_member(
        &self,
        committee: CommitteeKind,
        account: &AccountName,
    ) -> Option<&CommitteeMemberObject>;

    fn is_member(&self, committee: CommitteeKind, account: &AccountName) -> bool {
        self.find_member(committee, account).is_some()
    }

    fn get_member(
        &self,
        committee: CommitteeKind,
        account: &AccountName,
    ) -> Result<&CommitteeMemberObject> {
        self.find_member(committee, account).ok_or_else(|| {
            EvaluateError::NotCommitteeMember {
                committee,
                account: account.clone(),
            }
            .into()
        })
    }

    fn add_member(&mut self, committee: CommitteeKind, account: &AccountName) -> Result<()>;

    /// Remove a member, the committee cannot become empty.
    fn exclude_member(&mut self, committee: CommitteeKind, account: &AccountName) -> Result<()>;

    fn quorums(&self, committee: CommitteeKind) -> Result<Quorums>;

    fn change_quorum(
        &mut self,
        committee: CommitteeKind,
        kind: QuorumKind,
        percent: u64,
    ) -> Result<()>;

    /// Account `amount` of registration bonus handed out by `account` in the
    /// current block against its sliding window allowance.
    fn use_registration_bandwidth(&mut self, account: &AccountName, amount: Asset) -> Result<()>;
}

impl CommitteeService for Database {
    fn committee_members(&self, committee: CommitteeKind) -> Vec<&CommitteeMemberObject> {
        self.committee_members
            .prefix_by(CommitteeMemberObject::BY_COMMITTEE_ACCOUNT, &key![committee])
            .collect()
    }

    fn find_member(
        &self,
        committee: CommitteeKind,
        account: &AccountName,
    ) -> Option<&CommitteeMemberObject> {
        self.committee_members.find_by(
            CommitteeMemberObject::BY_COMMITTEE_ACCOUNT,
            &key![committee, account],
        )
    }

    fn add_member(&mut self, committee: CommitteeKind, account: &AccountName) -> Result<()> {
        self.check_account_existence(account)?;
        ensure!(
            !self.is_member(committee, account),
            EvaluateError::AlreadyCommitteeMember {
                committee,
                account: account.clone(),
            }
        )?;
        self.committee_members.create(|id| CommitteeMemberObject {
            id,
            committee,
            account: account.clone(),
            last_allocated_block: 0,
            per_n_block_remain: 0,
            already_allocated_cash: Asset::scr(0),
        })?;
        tracing::info!(%committee, %account, "committee member added");
        Ok(())
    }

    fn exclude_member(&mut self, committee: CommitteeKind, account: &AccountName) -> Result<()> {
        let member = self.get_member(committee, account)?.id;
        ensure!(
            self.members_count(committee) > 1,
            EvaluateError::CommitteeWouldBeEmpty(committee)
        )?;
        self.committee_members.remove(member)?;
        tracing::info!(%committee, %account, "committee member excluded");
        Ok(())
    }

    fn quorums(&self, committee: CommitteeKind) -> Result<Quorums> {
        Ok(match committee {
            CommitteeKind::Registration => self.dynamic_global_properties()?.registration_quorums,
            CommitteeKind::Development => self.get_dev_pool()?.quorums,
        })
    }

    fn change_quorum(
        &mut self,
        committee: CommitteeKind,
        kind: QuorumKind,
        percent: u64,
    ) -> Result<()> {
        ensure!(
            percent >= self.config.min_quorum_percent && percent <= 100,
            ValidationError::QuorumOutOfRange(percent)
        )?;
        match committee {
            CommitteeKind::Registration => {
                self.update_dynamic_global_properties(|p| p.registration_quorums.set(kind, percent))
            }
            CommitteeKind::Development => self.update_dev_pool(|p| p.quorums.set(kind, percent)),
        }
    }

    fn use_registration_bandwidth(&mut self, account: &AccountName, amount: Asset) -> Result<()> {
        let head_block_num = self.head_block_num()?;
        let window = self.config.registration_limit_window_blocks;
        let maximum_bonus = self.get_registration_pool()?.maximum_bonus;
        let limit = maximum_bonus.amount as i128 * self.config.registration_limit_per_window as i128;
        let member = self.get_member(CommitteeKind::Registration, account)?;

        let passed = if member.last_allocated_block == 0 {
            0
        } else {
            head_block_num.saturating_sub(member.last_allocated_block)
        };
        let mut remain = member.per_n_block_remain.saturating_sub(passed);
        let allocated = if remain > 0 {
            (member.already_allocated_cash + amount)?
        } else {
            remain = window;
            amount
        };
        ensure!(
            allocated.amount as i128 <= limit,
            EvaluateError::RegistrationBandwidthExceeded(account.clone())
        )?;

        let id = member.id;
        self.committee_members.modify(id, |m| {
            m.last_allocated_block = head_block_num;
            m.per_n_block_remain = remain;
            m.already_allocated_cash = allocated;
        })?;
        Ok(())
    }
}
