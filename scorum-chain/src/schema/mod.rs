//! Records stored by the chain, one [`chainbase::Index`] each.
//!
//! Records refer to each other by id or by account name, never by
//! ownership.

mod account;
mod comment;
mod committee;
mod economy;
mod vesting;
mod witness;

pub use self::account::{AccountObject, AccountRegistrationBonusObject, PROXIED_VOTES_DEPTH};
pub use self::comment::{Beneficiary, CommentObject, CommentVoteObject};
pub use self::committee::{CommitteeMemberObject, ProposalAction, ProposalObject};
pub use self::economy::{
    BudgetKind, BudgetObject, DevPoolObject, DynamicGlobalPropertyObject, RegistrationPoolObject,
    RewardBalancerObject, RewardFundObject, ScheduleItem,
};
pub use self::vesting::{WithdrawVestingObject, WithdrawVestingRouteObject};
pub use self::witness::{WitnessObject, WitnessVoteObject};
