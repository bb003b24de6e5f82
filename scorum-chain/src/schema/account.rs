use crate::asset::Asset;
use crate::time::TimePointSec;
use crate::types::AccountName;
use crate::Percent;
use chainbase::{key, KeyId, Object, ObjectId, SecondaryKey};
use rewards_math::PERCENT_100;
use serde_derive::{Deserialize, Serialize};

/// Depth of the proxy chain whose stake is tracked per account.
pub const PROXIED_VOTES_DEPTH: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountObject {
    pub id: ObjectId<AccountObject>,
    pub name: AccountName,
    pub creator: Option<AccountName>,
    pub created: TimePointSec,
    pub json_metadata: String,

    pub balance: Asset,
    pub scorumpower: Asset,
    pub delegated_scorumpower: Asset,
    pub received_scorumpower: Asset,

    pub can_vote: bool,
    pub voting_power: Percent,
    pub last_vote_time: TimePointSec,
    /// Effective scorumpower at the last vote, weight of the account in the
    /// active stake holders reward.
    pub vote_reward_competitive_sp: Asset,

    pub proxy: Option<AccountName>,
    /// Scorumpower proxied to this account, per level of the proxy chain.
    pub proxied_vsf_votes: [i64; PROXIED_VOTES_DEPTH],
    pub witnesses_voted_for: u32,

    pub active_sp_holders_cashout_time: TimePointSec,
    pub active_sp_holders_pending_scr_reward: Asset,
    pub active_sp_holders_pending_sp_reward: Asset,

    pub post_count: u32,
    pub last_post: TimePointSec,
    pub last_root_post: TimePointSec,
}

impl AccountObject {
    pub const BY_NAME: KeyId = KeyId(0);
    pub const BY_PROXY: KeyId = KeyId(1);
    pub const BY_ACTIVE_SP_HOLDERS_CASHOUT: KeyId = KeyId(2);

    pub fn new(id: ObjectId<AccountObject>, name: AccountName, created: TimePointSec) -> Self {
        AccountObject {
            id,
            name,
            creator: None,
            created,
            json_metadata: String::new(),
            balance: Asset::scr(0),
            scorumpower: Asset::sp(0),
            delegated_scorumpower: Asset::sp(0),
            received_scorumpower: Asset::sp(0),
            can_vote: true,
            voting_power: PERCENT_100,
            last_vote_time: created,
            vote_reward_competitive_sp: Asset::sp(0),
            proxy: None,
            proxied_vsf_votes: [0; PROXIED_VOTES_DEPTH],
            witnesses_voted_for: 0,
            active_sp_holders_cashout_time: TimePointSec::MAXIMUM,
            active_sp_holders_pending_scr_reward: Asset::scr(0),
            active_sp_holders_pending_sp_reward: Asset::sp(0),
            post_count: 0,
            last_post: TimePointSec::MINIMUM,
            last_root_post: TimePointSec::MINIMUM,
        }
    }

    /// Scorumpower the account votes with.
    pub fn effective_scorumpower(&self) -> Asset {
        Asset::sp(
            self.scorumpower.amount - self.delegated_scorumpower.amount
                + self.received_scorumpower.amount,
        )
    }

    pub fn proxied_vsf_votes_total(&self) -> i64 {
        self.proxied_vsf_votes.iter().sum()
    }

    /// Weight of the account's witness votes, own stake plus proxied stake.
    pub fn witness_vote_weight(&self) -> i64 {
        self.scorumpower.amount + self.proxied_vsf_votes_total()
    }
}

impl Object for AccountObject {
    const TYPE_NAME: &'static str = "account";

    fn id(&self) -> ObjectId<Self> {
        self.id
    }

    fn secondary_keys() -> Vec<SecondaryKey<Self>> {
        vec![
            SecondaryKey::unique("by_name", |a| key![&a.name]),
            SecondaryKey::unique("by_proxy", |a| {
                key![a.proxy.as_ref().map_or("", |p| p.as_str()), a.id]
            }),
            SecondaryKey::unique("by_active_sp_holders_cashout", |a| {
                key![a.active_sp_holders_cashout_time, a.id]
            }),
        ]
    }
}

/// Registration bonus that is taken back when it expires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountRegistrationBonusObject {
    pub id: ObjectId<AccountRegistrationBonusObject>,
    pub account: AccountName,
    pub bonus: Asset,
    pub expires: TimePointSec,
}

impl AccountRegistrationBonusObject {
    pub const BY_ACCOUNT: KeyId = KeyId(0);
    pub const BY_EXPIRATION: KeyId = KeyId(1);
}

impl Object for AccountRegistrationBonusObject {
    const TYPE_NAME: &'static str = "account_registration_bonus";

    fn id(&self) -> ObjectId<Self> {
        self.id
    }

    fn secondary_keys() -> Vec<SecondaryKey<Self>> {
        vec![
            SecondaryKey::unique("by_account", |b| key![&b.account]),
            SecondaryKey::unique("by_expiration", |b| key![b.expires, b.id]),
        ]
    }
}
