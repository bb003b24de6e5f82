use crate::asset::{Asset, AssetError, Symbol};
use crate::block::BlockError;
use crate::config::ConfigError;
use crate::snapshot::SnapshotFileError;
use crate::types::{AccountName, CommitteeKind};
use rewards_math::FormulaError;
use thiserror::Error;

/// Failure of a chain operation. Everything but `Validation` and
/// `Evaluate` signals an internal inconsistency.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid operation")]
    Validation(#[from] ValidationError),
    #[error("operation rejected")]
    Evaluate(#[from] EvaluateError),
    #[error("object store failure")]
    Store(#[from] chainbase::Error),
    #[error("invalid asset arithmetic")]
    Asset(#[from] AssetError),
    #[error("reward computation failed")]
    Formula(#[from] FormulaError),
    #[error("snapshot failure")]
    Snapshot(#[from] SnapshotFileError),
    #[error("invalid configuration")]
    Config(#[from] ConfigError),
    #[error("block rejected")]
    Block(#[from] BlockError),
}

impl Error {
    /// Whether only the transaction at fault is to be rejected.
    pub fn is_user_error(&self) -> bool {
        matches!(self, Error::Validation(_) | Error::Evaluate(_))
    }
}

/// Malformed operation, detected before any state is read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must be positive")]
    NonPositiveAmount { field: &'static str },
    #[error("{field} must be {expected}")]
    WrongSymbol {
        field: &'static str,
        expected: Symbol,
    },
    #[error("{field} percent {value} is out of range")]
    PercentOutOfRange { field: &'static str, value: u64 },
    #[error("vote weight {0} is out of range")]
    VoteWeightOutOfRange(i16),
    #[error("{0} cannot be empty")]
    Empty(&'static str),
    #[error("{field} is longer than {max}")]
    TooLong { field: &'static str, max: usize },
    #[error("beneficiary {0} is listed twice")]
    DuplicateBeneficiary(AccountName),
    #[error("beneficiaries must be sorted by name")]
    UnsortedBeneficiaries,
    #[error("account cannot proxy to itself")]
    SelfProxy,
    #[error("route cannot point back to its source")]
    SelfRoute,
    #[error("quorum {0} is out of range")]
    QuorumOutOfRange(u64),
    #[error("deadline must be after start")]
    InvalidPeriod,
    #[error("fund budgets are created by the chain only")]
    WrongBudgetKind,
}

/// Operation well formed but not applicable to the current state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluateError {
    #[error("account {0} does not exist")]
    AccountNotFound(AccountName),
    #[error("account {0} already exists")]
    AccountAlreadyExists(AccountName),
    #[error("{account} holds {available}, {required} needed")]
    InsufficientFunds {
        account: String,
        required: Asset,
        available: Asset,
    },
    #[error("comment {author}/{permlink} does not exist")]
    CommentNotFound {
        author: AccountName,
        permlink: String,
    },
    #[error("comment {author}/{permlink} already exists")]
    CommentAlreadyExists {
        author: AccountName,
        permlink: String,
    },
    #[error("comment is too deep")]
    CommentTooDeep,
    #[error("replies are disabled on the parent comment")]
    RepliesNotAllowed,
    #[error("comment options can only be restricted once voting started")]
    CommentOptionsLocked,
    #[error("comment was already paid out")]
    VoteAfterPayout,
    #[error("votes are disabled on the comment")]
    VotesNotAllowed,
    #[error("account {0} cannot vote")]
    VotingDisabled(AccountName),
    #[error("voting too frequently")]
    VoteTooFrequent,
    #[error("no voting power left")]
    NoVotingPower,
    #[error("vote weight is too small")]
    VoteDust,
    #[error("a new vote cannot have a zero weight")]
    ZeroWeightVote,
    #[error("vote weight did not change")]
    VoteUnchanged,
    #[error("vote was changed too many times")]
    TooManyVoteChanges,
    #[error("upvotes are locked before payout")]
    VoteLockout,
    #[error("{account} is not a {committee} committee member")]
    NotCommitteeMember {
        committee: CommitteeKind,
        account: AccountName,
    },
    #[error("{account} is already a {committee} committee member")]
    AlreadyCommitteeMember {
        committee: CommitteeKind,
        account: AccountName,
    },
    #[error("{0} committee cannot become empty")]
    CommitteeWouldBeEmpty(CommitteeKind),
    #[error("registration pool is exhausted")]
    RegistrationPoolExhausted,
    #[error("registration schedule gives no bonus")]
    InvalidRegistrationSchedule,
    #[error("committee member {0} reached the registration limit")]
    RegistrationBandwidthExceeded(AccountName),
    #[error("too many withdraw routes")]
    TooManyRoutes,
    #[error("withdraw routes exceed 100%")]
    RoutePercentOverflow,
    #[error("withdraw route does not exist")]
    RouteNotFound,
    #[error("nothing to withdraw")]
    NothingToWithdraw,
    #[error("proposal {0} does not exist")]
    ProposalNotFound(u64),
    #[error("proposal {0} has expired")]
    ProposalExpired(u64),
    #[error("{0} already voted")]
    AlreadyVoted(AccountName),
    #[error("proposal lifetime {0}s is out of range")]
    ProposalLifetime(u32),
    #[error("witness {0} does not exist")]
    WitnessNotFound(AccountName),
    #[error("too many witness votes")]
    TooManyWitnessVotes,
    #[error("witness vote does not exist")]
    WitnessVoteNotFound,
    #[error("witness vote already exists")]
    WitnessVoteExists,
    #[error("account votes through a proxy")]
    VotingThroughProxy,
    #[error("proxy is unchanged")]
    ProxyUnchanged,
    #[error("proxy chain would loop")]
    ProxyCycle,
    #[error("{0} owns too many budgets")]
    TooManyBudgets(AccountName),
    #[error("budget deadline is in the past")]
    BudgetDeadlinePassed,
    #[error("fund budgets cannot be closed")]
    FundBudgetNotClosable,
    #[error("budget {0} is not owned by {1}")]
    NotBudgetOwner(u64, AccountName),
}

/// Result of a chain operation.
pub type Result<T> = std::result::Result<T, Error>;
