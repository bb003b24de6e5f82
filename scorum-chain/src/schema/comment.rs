use crate::asset::Asset;
use crate::time::TimePointSec;
use crate::types::AccountName;
use crate::Percent;
use chainbase::{key, KeyId, KeyPart, Object, ObjectId, SecondaryKey};
use serde_derive::{Deserialize, Serialize};

use super::AccountObject;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Beneficiary {
    pub account: AccountName,
    pub weight: Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentObject {
    pub id: ObjectId<CommentObject>,
    pub author: AccountName,
    pub permlink: String,
    /// `None` for root posts, whose `parent_permlink` is the category.
    pub parent_author: Option<AccountName>,
    pub parent_permlink: String,
    pub category: String,
    pub title: String,
    pub body: String,
    pub json_metadata: String,

    pub depth: u16,
    pub children: u32,
    pub root_comment: ObjectId<CommentObject>,

    pub created: TimePointSec,
    pub last_update: TimePointSec,
    pub active: TimePointSec,
    /// `MINIMUM` until the first payout.
    pub last_payout: TimePointSec,
    /// `MAXIMUM` once paid out.
    pub cashout_time: TimePointSec,

    pub net_rshares: i64,
    pub abs_rshares: i64,
    pub vote_rshares: i64,
    pub children_abs_rshares: i64,
    pub total_vote_weight: u64,
    pub net_votes: i32,

    pub max_accepted_payout: Asset,
    pub allow_replies: bool,
    pub allow_votes: bool,
    pub allow_curation_rewards: bool,
    pub beneficiaries: Vec<Beneficiary>,
}

impl CommentObject {
    pub const BY_PERMLINK: KeyId = KeyId(0);
    pub const BY_CASHOUT_TIME: KeyId = KeyId(1);
    pub const BY_ROOT: KeyId = KeyId(2);

    pub fn is_root(&self) -> bool {
        self.parent_author.is_none()
    }

    pub fn is_paid(&self) -> bool {
        self.cashout_time.is_maximum()
    }
}

impl Object for CommentObject {
    const TYPE_NAME: &'static str = "comment";

    fn id(&self) -> ObjectId<Self> {
        self.id
    }

    fn secondary_keys() -> Vec<SecondaryKey<Self>> {
        vec![
            SecondaryKey::unique("by_permlink", |c| key![&c.author, c.permlink.as_str()]),
            SecondaryKey::unique("by_cashout_time", |c| key![c.cashout_time, c.id]),
            SecondaryKey::unique("by_root", |c| key![c.root_comment, c.id]),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentVoteObject {
    pub id: ObjectId<CommentVoteObject>,
    pub voter: ObjectId<AccountObject>,
    pub comment: ObjectId<CommentObject>,
    /// Curation weight, zero for votes that earn no curation reward.
    pub weight: u64,
    pub rshares: i64,
    pub vote_percent: i16,
    pub last_update: TimePointSec,
    /// `-1` once the vote can no longer change.
    pub num_changes: i32,
}

impl CommentVoteObject {
    pub const BY_COMMENT_VOTER: KeyId = KeyId(0);
    pub const BY_VOTER_COMMENT: KeyId = KeyId(1);
    /// Heaviest votes first.
    pub const BY_COMMENT_WEIGHT_VOTER: KeyId = KeyId(2);
}

impl Object for CommentVoteObject {
    const TYPE_NAME: &'static str = "comment_vote";

    fn id(&self) -> ObjectId<Self> {
        self.id
    }

    fn secondary_keys() -> Vec<SecondaryKey<Self>> {
        vec![
            SecondaryKey::unique("by_comment_voter", |v| key![v.comment, v.voter]),
            SecondaryKey::unique("by_voter_comment", |v| key![v.voter, v.comment]),
            SecondaryKey::unique("by_comment_weight_voter", |v| {
                key![v.comment, KeyPart::Int(-(v.weight as i128)), v.voter]
            }),
        ]
    }
}
