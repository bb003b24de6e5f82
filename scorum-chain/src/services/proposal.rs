use super::{
    is_quorum, AccountService, CommitteeService, DevPoolService, DynamicGlobalPropertyService,
    WithdrawVestingService,
};
use crate::asset::Symbol;
use crate::database::Database;
use crate::error::{EvaluateError, Result};
use crate::schema::{ProposalAction, ProposalObject};
use crate::time::TimePointSec;
use crate::types::{AccountName, CommitteeKind, Withdrawable};
use chainbase::ObjectId;
use std::collections::BTreeSet;

pub trait ProposalService {
    fn get_proposal(&self, id: ObjectId<ProposalObject>) -> Result<&ProposalObject>;

    /// Open a proposal of a committee member, to be voted on for
    /// `lifetime_seconds`.
    fn create_proposal(
        &mut self,
        creator: &AccountName,
        action: ProposalAction,
        lifetime_seconds: u32,
    ) -> Result<ObjectId<ProposalObject>>;

    /// Record the vote of `voter`. Returns the actions executed because a
    /// quorum was reached, which can be more than one when the excluded
    /// member's votes are withdrawn from other proposals.
    fn vote_for_proposal(
        &mut self,
        id: ObjectId<ProposalObject>,
        voter: &AccountName,
    ) -> Result<Vec<ProposalAction>>;

    fn remove_proposal(&mut self, id: ObjectId<ProposalObject>) -> Result<()>;

    fn for_all_proposals_remove_from_voting_list(
        &mut self,
        committee: CommitteeKind,
        account: &AccountName,
    ) -> Result<()>;

    /// Drop every proposal expiring at `until` or earlier, returning how
    /// many were dropped.
    fn clear_expired_proposals(&mut self, until: TimePointSec) -> Result<usize>;
}

impl Database {
    fn proposal_reached_quorum(&self, proposal: &ProposalObject) -> bool {
        let members = self.members_count(proposal.action.committee()) as u64;
        is_quorum(
            proposal.voted_accounts.len() as u64,
            members,
            proposal.quorum_percent,
        )
    }

    fn execute_proposal(
        &mut self,
        id: ObjectId<ProposalObject>,
        executed: &mut Vec<ProposalAction>,
    ) -> Result<()> {
        let action = self.get_proposal(id)?.action.clone();
        self.remove_proposal(id)?;
        tracing::info!(proposal = id.value(), ?action, "proposal accepted");

        match &action {
            ProposalAction::AddMember { committee, account } => {
                self.add_member(*committee, account)?;
            }
            ProposalAction::ExcludeMember { committee, account } => {
                self.exclude_member(*committee, account)?;
                self.for_all_proposals_remove_from_voting_list(*committee, account)?;
            }
            ProposalAction::ChangeQuorum {
                committee,
                quorum,
                percent,
            } => {
                self.change_quorum(*committee, *quorum, *percent)?;
            }
            ProposalAction::WithdrawVesting { amount } => {
                let available = self.get_dev_pool()?.sp_balance;
                ensure!(
                    amount.amount <= available.amount,
                    EvaluateError::InsufficientFunds {
                        account: "dev pool".to_owned(),
                        required: *amount,
                        available,
                    }
                )?;
                self.start_withdraw_vesting(Withdrawable::DevPool, *amount)?;
            }
            ProposalAction::Transfer { to, amount } => {
                let to = self.get_account(to)?.id;
                self.decrease_dev_pool(amount.convert(Symbol::Scr))?;
                self.increase_balance(to, amount.convert(Symbol::Scr))?;
            }
        }
        executed.push(action.clone());

        // exclusion changes member counts and voting lists
        if let ProposalAction::ExcludeMember { committee, .. } = action {
            let pending: Vec<_> = self
                .proposals
                .iter()
                .filter(|p| p.action.committee() == committee)
                .map(|p| p.id)
                .collect();
            for id in pending {
                // an earlier execution may have removed it
                let ready = match self.proposals.find(id) {
                    Some(proposal) => self.proposal_reached_quorum(proposal),
                    None => false,
                };
                if ready {
                    self.execute_proposal(id, executed)?;
                }
            }
        }
        Ok(())
    }
}

impl ProposalService for Database {
    fn get_proposal(&self, id: ObjectId<ProposalObject>) -> Result<&ProposalObject> {
        self.proposals
            .find(id)
            .ok_or_else(|| EvaluateError::ProposalNotFound(id.value()).into())
    }

    fn create_proposal(
        &mut self,
        creator: &AccountName,
        action: ProposalAction,
        lifetime_seconds: u32,
    ) -> Result<ObjectId<ProposalObject>> {
        ensure!(
            lifetime_seconds >= self.config.proposal_min_lifetime_seconds
                && lifetime_seconds <= self.config.proposal_max_lifetime_seconds,
            EvaluateError::ProposalLifetime(lifetime_seconds)
        )?;
        self.check_account_existence(creator)?;
        let committee = action.committee();
        self.get_member(committee, creator)?;

        let quorum_percent = self.quorums(committee)?.get(action.quorum_kind());
        let created = self.head_block_time()?;
        let proposal = self.proposals.create(|id| ProposalObject {
            id,
            creator: creator.clone(),
            action,
            voted_accounts: BTreeSet::new(),
            quorum_percent,
            created,
            expiration: created.add_seconds(lifetime_seconds),
        })?;
        tracing::debug!(proposal = proposal.id.value(), %creator, "proposal created");
        Ok(proposal.id)
    }

    fn vote_for_proposal(
        &mut self,
        id: ObjectId<ProposalObject>,
        voter: &AccountName,
    ) -> Result<Vec<ProposalAction>> {
        let now = self.head_block_time()?;
        let proposal = self.get_proposal(id)?;
        ensure!(
            proposal.expiration > now,
            EvaluateError::ProposalExpired(id.value())
        )?;
        ensure!(
            !proposal.voted_accounts.contains(voter),
            EvaluateError::AlreadyVoted(voter.clone())
        )?;
        self.get_member(proposal.action.committee(), voter)?;

        let proposal = self
            .proposals
            .modify(id, |p| {
                p.voted_accounts.insert(voter.clone());
            })?
            .clone();

        let mut executed = Vec::new();
        if self.proposal_reached_quorum(&proposal) {
            self.execute_proposal(id, &mut executed)?;
        }
        Ok(executed)
    }

    fn remove_proposal(&mut self, id: ObjectId<ProposalObject>) -> Result<()> {
        self.proposals.remove(id)?;
        Ok(())
    }

    fn for_all_proposals_remove_from_voting_list(
        &mut self,
        committee: CommitteeKind,
        account: &AccountName,
    ) -> Result<()> {
        let voted: Vec<_> = self
            .proposals
            .iter()
            .filter(|p| p.action.committee() == committee && p.voted_accounts.contains(account))
            .map(|p| p.id)
            .collect();
        for id in voted {
            self.proposals.modify(id, |p| {
                p.voted_accounts.remove(account);
            })?;
        }
        Ok(())
    }

    fn clear_expired_proposals(&mut self, until: TimePointSec) -> Result<usize> {
        let expired: Vec<_> = self
            .proposals
            .iter_by(ProposalObject::BY_EXPIRATION)
            .take_while(|p| p.expiration <= until)
            .map(|p| p.id)
            .collect();
        for id in expired.iter() {
            self.proposals.remove(*id)?;
        }
        Ok(expired.len())
    }
}
