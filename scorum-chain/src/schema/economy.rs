use crate::asset::{Asset, Symbol};
use crate::time::TimePointSec;
use crate::types::{AccountName, Hardfork, Quorums};
use chainbase::{key, KeyId, Object, ObjectId, SecondaryKey};
use rewards_math::CurveId;
use serde_derive::{Deserialize, Serialize};

/// Chain wide counters, a singleton.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicGlobalPropertyObject {
    pub id: ObjectId<DynamicGlobalPropertyObject>,
    pub head_block_number: u32,
    pub time: TimePointSec,
    pub current_witness: Option<AccountName>,
    pub last_irreversible_block_num: u32,
    pub hardfork: Hardfork,

    /// Liquid supply plus scorumpower held by accounts.
    pub circulating_capital: Asset,
    pub total_scorumpower: Asset,
    pub total_pending_scr: Asset,
    pub total_pending_sp: Asset,

    pub registration_quorums: Quorums,
}

impl Object for DynamicGlobalPropertyObject {
    const TYPE_NAME: &'static str = "dynamic_global_property";

    fn id(&self) -> ObjectId<Self> {
        self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetKind {
    /// System budget, owned by nobody, feeding the reward pipeline.
    Fund,
    Post,
    Banner,
}

impl From<BudgetKind> for chainbase::KeyPart {
    fn from(kind: BudgetKind) -> Self {
        chainbase::KeyPart::Int(kind as i128)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetObject {
    pub id: ObjectId<BudgetObject>,
    pub kind: BudgetKind,
    pub owner: Option<AccountName>,
    pub content_permlink: String,
    pub created: TimePointSec,
    pub deadline: TimePointSec,
    pub balance: Asset,
    pub per_block: Asset,
    pub last_cashout_block: u32,
}

impl BudgetObject {
    pub const BY_KIND: KeyId = KeyId(0);
    pub const BY_OWNER: KeyId = KeyId(1);
}

impl Object for BudgetObject {
    const TYPE_NAME: &'static str = "budget";

    fn id(&self) -> ObjectId<Self> {
        self.id
    }

    fn secondary_keys() -> Vec<SecondaryKey<Self>> {
        vec![
            SecondaryKey::unique("by_kind", |b| key![b.kind, b.id]),
            SecondaryKey::unique("by_owner", |b| {
                key![b.owner.as_ref().map_or("", |o| o.as_str()), b.id]
            }),
        ]
    }
}

/// Content reward fund of one currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardFundObject {
    pub id: ObjectId<RewardFundObject>,
    pub activity_reward_balance: Asset,
    pub recent_claims: u128,
    pub last_payout_check: TimePointSec,
    pub author_reward_curve: CurveId,
    pub curation_reward_curve: CurveId,
}

impl RewardFundObject {
    pub const BY_SYMBOL: KeyId = KeyId(0);

    pub fn symbol(&self) -> Symbol {
        self.activity_reward_balance.symbol
    }
}

impl Object for RewardFundObject {
    const TYPE_NAME: &'static str = "reward_fund";

    fn id(&self) -> ObjectId<Self> {
        self.id
    }

    fn secondary_keys() -> Vec<SecondaryKey<Self>> {
        vec![SecondaryKey::unique("by_symbol", |f| {
            key![f.activity_reward_balance.symbol == Symbol::Sp]
        })]
    }
}

/// Smooths the liquid users reward, a singleton.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardBalancerObject {
    pub id: ObjectId<RewardBalancerObject>,
    pub balance: Asset,
    pub current_per_block_reward: Asset,
}

impl Object for RewardBalancerObject {
    const TYPE_NAME: &'static str = "reward_balancer";

    fn id(&self) -> ObjectId<Self> {
        self.id
    }
}

/// Development team treasury, a singleton governed by the development
/// committee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DevPoolObject {
    pub id: ObjectId<DevPoolObject>,
    pub scr_balance: Asset,
    pub sp_balance: Asset,
    pub quorums: Quorums,
}

impl Object for DevPoolObject {
    const TYPE_NAME: &'static str = "dev_committee";

    fn id(&self) -> ObjectId<Self> {
        self.id
    }
}

/// Step of the registration bonus schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleItem {
    /// Accounts registered while this stage lasts.
    pub users: u64,
    /// Share of the maximum bonus, in whole percents.
    pub bonus_percent: u16,
}

/// Pool paying registration bonuses, a singleton.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationPoolObject {
    pub id: ObjectId<RegistrationPoolObject>,
    pub balance: Asset,
    pub maximum_bonus: Asset,
    pub schedule_items: Vec<ScheduleItem>,
    pub already_allocated_count: u64,
}

impl Object for RegistrationPoolObject {
    const TYPE_NAME: &'static str = "registration_pool";

    fn id(&self) -> ObjectId<Self> {
        self.id
    }
}
