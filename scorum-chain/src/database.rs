//! All chain indices moving in lock step.

use crate::config::ChainConfig;
use crate::schema::*;
use chainbase::{coordinated, AbstractIndex, Index, IndexSet, Undoable};
use std::sync::Arc;

/// Every index of the chain plus the configuration it runs under.
///
/// Services are implemented as traits over this type, see
/// [`services`](crate::services).
pub struct Database {
    pub(crate) config: Arc<ChainConfig>,

    pub(crate) dynamic_global_properties: Index<DynamicGlobalPropertyObject>,
    pub(crate) accounts: Index<AccountObject>,
    pub(crate) registration_bonuses: Index<AccountRegistrationBonusObject>,
    pub(crate) witnesses: Index<WitnessObject>,
    pub(crate) witness_votes: Index<WitnessVoteObject>,
    pub(crate) comments: Index<CommentObject>,
    pub(crate) comment_votes: Index<CommentVoteObject>,
    pub(crate) budgets: Index<BudgetObject>,
    pub(crate) reward_funds: Index<RewardFundObject>,
    pub(crate) reward_balancers: Index<RewardBalancerObject>,
    pub(crate) dev_pools: Index<DevPoolObject>,
    pub(crate) registration_pools: Index<RegistrationPoolObject>,
    pub(crate) committee_members: Index<CommitteeMemberObject>,
    pub(crate) proposals: Index<ProposalObject>,
    pub(crate) withdraw_vestings: Index<WithdrawVestingObject>,
    pub(crate) withdraw_vesting_routes: Index<WithdrawVestingRouteObject>,
}

impl Database {
    pub fn new(config: Arc<ChainConfig>) -> Self {
        Database {
            config,
            dynamic_global_properties: Index::new(),
            accounts: Index::new(),
            registration_bonuses: Index::new(),
            witnesses: Index::new(),
            witness_votes: Index::new(),
            comments: Index::new(),
            comment_votes: Index::new(),
            budgets: Index::new(),
            reward_funds: Index::new(),
            reward_balancers: Index::new(),
            dev_pools: Index::new(),
            registration_pools: Index::new(),
            committee_members: Index::new(),
            proposals: Index::new(),
            withdraw_vestings: Index::new(),
            withdraw_vesting_routes: Index::new(),
        }
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn accounts(&self) -> &Index<AccountObject> {
        &self.accounts
    }

    pub fn registration_bonuses(&self) -> &Index<AccountRegistrationBonusObject> {
        &self.registration_bonuses
    }

    pub fn witnesses(&self) -> &Index<WitnessObject> {
        &self.witnesses
    }

    pub fn witness_votes(&self) -> &Index<WitnessVoteObject> {
        &self.witness_votes
    }

    pub fn comments(&self) -> &Index<CommentObject> {
        &self.comments
    }

    pub fn comment_votes(&self) -> &Index<CommentVoteObject> {
        &self.comment_votes
    }

    pub fn budgets(&self) -> &Index<BudgetObject> {
        &self.budgets
    }

    pub fn reward_funds(&self) -> &Index<RewardFundObject> {
        &self.reward_funds
    }

    pub fn committee_members(&self) -> &Index<CommitteeMemberObject> {
        &self.committee_members
    }

    pub fn proposals(&self) -> &Index<ProposalObject> {
        &self.proposals
    }

    pub fn withdraw_vestings(&self) -> &Index<WithdrawVestingObject> {
        &self.withdraw_vestings
    }

    pub fn withdraw_vesting_routes(&self) -> &Index<WithdrawVestingRouteObject> {
        &self.withdraw_vesting_routes
    }
}

impl IndexSet for Database {
    /// Fixed order, also the order of snapshot sections.
    fn indices(&self) -> Vec<&dyn AbstractIndex> {
        vec![
            &self.dynamic_global_properties,
            &self.accounts,
            &self.registration_bonuses,
            &self.witnesses,
            &self.witness_votes,
            &self.comments,
            &self.comment_votes,
            &self.budgets,
            &self.reward_funds,
            &self.reward_balancers,
            &self.dev_pools,
            &self.registration_pools,
            &self.committee_members,
            &self.proposals,
            &self.withdraw_vestings,
            &self.withdraw_vesting_routes,
        ]
    }

    fn indices_mut(&mut self) -> Vec<&mut dyn AbstractIndex> {
        vec![
            &mut self.dynamic_global_properties,
            &mut self.accounts,
            &mut self.registration_bonuses,
            &mut self.witnesses,
            &mut self.witness_votes,
            &mut self.comments,
            &mut self.comment_votes,
            &mut self.budgets,
            &mut self.reward_funds,
            &mut self.reward_balancers,
            &mut self.dev_pools,
            &mut self.registration_pools,
            &mut self.committee_members,
            &mut self.proposals,
            &mut self.withdraw_vestings,
            &mut self.withdraw_vesting_routes,
        ]
    }
}

impl Undoable for Database {
    fn revision(&self) -> i64 {
        coordinated::revision(self)
    }

    fn push_undo_state(&mut self) -> i64 {
        coordinated::push_undo_state(self)
    }

    fn undo(&mut self) {
        coordinated::undo(self)
    }

    fn squash(&mut self) {
        coordinated::squash(self)
    }

    fn commit(&mut self, revision: i64) {
        coordinated::commit(self, revision)
    }

    fn undo_all(&mut self) {
        coordinated::undo_all(self)
    }

    fn set_revision(&mut self, revision: i64) {
        coordinated::set_revision(self, revision)
    }

    fn undo_stack_size(&self) -> usize {
        coordinated::undo_stack_size(self)
    }
}
