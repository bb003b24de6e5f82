//! Typed access to the object store.
//!
//! Every service is a trait implemented by [`Database`](crate::Database).
//! Evaluators and block tasks only go through them, so the invariants of a
//! record live next to its index and nowhere else.

mod account;
mod budget;
mod comment;
mod committee;
mod dev_pool;
mod dgp;
mod proposal;
mod registration;
mod reward_balancer;
mod reward_fund;
mod withdraw_vesting;
mod witness;

pub use self::account::{AccountService, ProxiedDelta};
pub use self::budget::{calculate_per_block, Allocation, BudgetService};
pub use self::comment::{CommentParent, CommentService, CommentVoteService};
pub use self::committee::{is_quorum, CommitteeService};
pub use self::dev_pool::DevPoolService;
pub use self::dgp::DynamicGlobalPropertyService;
pub use self::proposal::ProposalService;
pub use self::registration::{
    calculate_per_reg, AccountRegistrationBonusService, RegistrationPoolService,
};
pub use self::reward_balancer::RewardBalancerService;
pub use self::reward_fund::RewardFundService;
pub use self::withdraw_vesting::{WithdrawVestingRouteService, WithdrawVestingService};
pub use self::witness::WitnessService;
