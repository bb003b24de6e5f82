use crate::asset::Asset;
use crate::time::TimePointSec;
use crate::types::Withdrawable;
use crate::Percent;
use chainbase::{key, KeyId, Object, ObjectId, SecondaryKey};
use serde_derive::{Deserialize, Serialize};

/// Running scorumpower withdrawal, paid out in equal installments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithdrawVestingObject {
    pub id: ObjectId<WithdrawVestingObject>,
    pub from: Withdrawable,
    pub vesting_withdraw_rate: Asset,
    pub next_vesting_withdrawal: TimePointSec,
    pub withdrawn: Asset,
    pub to_withdraw: Asset,
}

impl WithdrawVestingObject {
    pub const BY_FROM: KeyId = KeyId(0);
    pub const BY_NEXT_WITHDRAWAL: KeyId = KeyId(1);
}

impl Object for WithdrawVestingObject {
    const TYPE_NAME: &'static str = "withdraw_vesting";

    fn id(&self) -> ObjectId<Self> {
        self.id
    }

    fn secondary_keys() -> Vec<SecondaryKey<Self>> {
        vec![
            SecondaryKey::unique("by_from", |w| key![w.from]),
            SecondaryKey::unique("by_next_withdrawal", |w| {
                key![w.next_vesting_withdrawal, w.id]
            }),
        ]
    }
}

/// Share of a withdrawal redirected to another holder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithdrawVestingRouteObject {
    pub id: ObjectId<WithdrawVestingRouteObject>,
    pub from: Withdrawable,
    pub to: Withdrawable,
    pub percent: Percent,
    /// Deliver scorumpower instead of converting to the liquid currency.
    pub auto_vest: bool,
}

impl WithdrawVestingRouteObject {
    pub const BY_ROUTE: KeyId = KeyId(0);
}

impl Object for WithdrawVestingRouteObject {
    const TYPE_NAME: &'static str = "withdraw_vesting_route";

    fn id(&self) -> ObjectId<Self> {
        self.id
    }

    fn secondary_keys() -> Vec<SecondaryKey<Self>> {
        vec![SecondaryKey::unique("by_route", |r| key![r.from, r.to])]
    }
}
