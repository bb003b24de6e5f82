use crate::asset::Asset;
use crate::time::TimePointSec;
use crate::types::{AccountName, CommitteeKind, QuorumKind};
use chainbase::{key, KeyId, Object, ObjectId, SecondaryKey};
use serde_derive::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitteeMemberObject {
    pub id: ObjectId<CommitteeMemberObject>,
    pub committee: CommitteeKind,
    pub account: AccountName,
    /// Registration bandwidth window of the member.
    pub last_allocated_block: u32,
    pub per_n_block_remain: u32,
    pub already_allocated_cash: Asset,
}

impl CommitteeMemberObject {
    pub const BY_COMMITTEE_ACCOUNT: KeyId = KeyId(0);
}

impl Object for CommitteeMemberObject {
    const TYPE_NAME: &'static str = "committee_member";

    fn id(&self) -> ObjectId<Self> {
        self.id
    }

    fn secondary_keys() -> Vec<SecondaryKey<Self>> {
        vec![SecondaryKey::unique("by_committee_account", |m| {
            key![m.committee, &m.account]
        })]
    }
}

/// Decision a committee votes on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalAction {
    AddMember {
        committee: CommitteeKind,
        account: AccountName,
    },
    ExcludeMember {
        committee: CommitteeKind,
        account: AccountName,
    },
    ChangeQuorum {
        committee: CommitteeKind,
        quorum: QuorumKind,
        percent: u64,
    },
    /// Start a scorumpower withdrawal of the development pool.
    WithdrawVesting { amount: Asset },
    /// Pay out of the development pool liquid balance.
    Transfer { to: AccountName, amount: Asset },
}

impl ProposalAction {
    pub fn committee(&self) -> CommitteeKind {
        match self {
            ProposalAction::AddMember { committee, .. }
            | ProposalAction::ExcludeMember { committee, .. }
            | ProposalAction::ChangeQuorum { committee, .. } => *committee,
            ProposalAction::WithdrawVesting { .. } | ProposalAction::Transfer { .. } => {
                CommitteeKind::Development
            }
        }
    }

    /// Quorum the proposal must gather.
    pub fn quorum_kind(&self) -> QuorumKind {
        match self {
            ProposalAction::AddMember { .. } => QuorumKind::AddMember,
            ProposalAction::ExcludeMember { .. } => QuorumKind::ExcludeMember,
            ProposalAction::ChangeQuorum { .. } => QuorumKind::Base,
            ProposalAction::WithdrawVesting { .. } | ProposalAction::Transfer { .. } => {
                QuorumKind::Transfer
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalObject {
    pub id: ObjectId<ProposalObject>,
    pub creator: AccountName,
    pub action: ProposalAction,
    pub voted_accounts: BTreeSet<AccountName>,
    /// Required quorum, fixed at creation.
    pub quorum_percent: u64,
    pub created: TimePointSec,
    pub expiration: TimePointSec,
}

impl ProposalObject {
    pub const BY_EXPIRATION: KeyId = KeyId(0);
}

impl Object for ProposalObject {
    const TYPE_NAME: &'static str = "proposal";

    fn id(&self) -> ObjectId<Self> {
        self.id
    }

    fn secondary_keys() -> Vec<SecondaryKey<Self>> {
        vec![SecondaryKey::unique("by_expiration", |p| key![p.expiration, p.id])]
    }
}
