use crate::time::TimePointSec;
use crate::types::AccountName;
use chainbase::{key, KeyId, KeyPart, Object, ObjectId, SecondaryKey};
use serde_derive::{Deserialize, Serialize};

use super::AccountObject;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WitnessObject {
    pub id: ObjectId<WitnessObject>,
    pub owner: AccountName,
    pub created: TimePointSec,
    pub url: String,
    pub signing_key: String,
    /// Stake voting for this witness.
    pub votes: i64,
    pub total_missed: u32,
    pub last_confirmed_block_num: u32,
}

impl WitnessObject {
    pub const BY_NAME: KeyId = KeyId(0);
    /// Most voted first.
    pub const BY_VOTE: KeyId = KeyId(1);
}

impl Object for WitnessObject {
    const TYPE_NAME: &'static str = "witness";

    fn id(&self) -> ObjectId<Self> {
        self.id
    }

    fn secondary_keys() -> Vec<SecondaryKey<Self>> {
        vec![
            SecondaryKey::unique("by_name", |w| key![&w.owner]),
            SecondaryKey::unique("by_vote", |w| {
                key![KeyPart::Int(-(w.votes as i128)), &w.owner]
            }),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WitnessVoteObject {
    pub id: ObjectId<WitnessVoteObject>,
    pub witness: ObjectId<WitnessObject>,
    pub account: ObjectId<AccountObject>,
}

impl WitnessVoteObject {
    pub const BY_ACCOUNT_WITNESS: KeyId = KeyId(0);
    pub const BY_WITNESS_ACCOUNT: KeyId = KeyId(1);
}

impl Object for WitnessVoteObject {
    const TYPE_NAME: &'static str = "witness_vote";

    fn id(&self) -> ObjectId<Self> {
        self.id
    }

    fn secondary_keys() -> Vec<SecondaryKey<Self>> {
        vec![
            SecondaryKey::unique("by_account_witness", |v| key![v.account, v.witness]),
            SecondaryKey::unique("by_witness_account", |v| key![v.witness, v.account]),
        ]
    }
}
