use crate::schema::AccountObject;
use chainbase::{KeyPart, ObjectId};
use serde_derive::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const MIN_ACCOUNT_NAME_LENGTH: usize = 3;
pub const MAX_ACCOUNT_NAME_LENGTH: usize = 16;

/// Validated account name: lowercase letters, digits, `-` and `.`,
/// starting with a letter.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountName(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountNameError {
    #[error("account name '{0}' length must be within 3 and 16")]
    Length(String),
    #[error("account name '{0}' holds invalid characters")]
    InvalidCharacter(String),
}

impl AccountName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for AccountName {
    type Err = AccountNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() < MIN_ACCOUNT_NAME_LENGTH || s.len() > MAX_ACCOUNT_NAME_LENGTH {
            return Err(AccountNameError::Length(s.to_owned()));
        }
        let starts_with_letter = s.chars().next().map_or(false, |c| c.is_ascii_lowercase());
        let valid = s
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.');
        if !starts_with_letter || !valid {
            return Err(AccountNameError::InvalidCharacter(s.to_owned()));
        }
        Ok(AccountName(s.to_owned()))
    }
}

impl std::convert::TryFrom<String> for AccountName {
    type Error = AccountNameError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<AccountName> for String {
    fn from(name: AccountName) -> String {
        name.0
    }
}

impl fmt::Display for AccountName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&AccountName> for KeyPart {
    fn from(name: &AccountName) -> Self {
        KeyPart::from(name.as_str())
    }
}

/// Consensus rule sets, in activation order.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Hardfork(pub u32);

impl Hardfork {
    pub const GENESIS: Hardfork = Hardfork(0);
    /// Permlinks take part in comment reward bookkeeping.
    pub const HARDFORK_0_1: Hardfork = Hardfork(1);
    /// Percent vote weights and pending active stake holder rewards.
    pub const HARDFORK_0_2: Hardfork = Hardfork(2);
    pub const LATEST: Hardfork = Hardfork::HARDFORK_0_2;
}

impl fmt::Display for Hardfork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0.{}", self.0)
    }
}

/// Party able to hold and withdraw scorumpower.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Withdrawable {
    Account(ObjectId<AccountObject>),
    DevPool,
}

impl From<Withdrawable> for KeyPart {
    fn from(w: Withdrawable) -> Self {
        match w {
            Withdrawable::Account(id) => KeyPart::from(id),
            Withdrawable::DevPool => KeyPart::Int(-1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitteeKind {
    Registration,
    Development,
}

impl From<CommitteeKind> for KeyPart {
    fn from(kind: CommitteeKind) -> Self {
        match kind {
            CommitteeKind::Registration => KeyPart::Int(0),
            CommitteeKind::Development => KeyPart::Int(1),
        }
    }
}

impl fmt::Display for CommitteeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommitteeKind::Registration => f.write_str("registration"),
            CommitteeKind::Development => f.write_str("development"),
        }
    }
}

/// Quorum a committee decision is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuorumKind {
    AddMember,
    ExcludeMember,
    Base,
    Transfer,
}

/// Quorums of one committee, in whole percents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quorums {
    pub add_member: u64,
    pub exclude_member: u64,
    pub base: u64,
    pub transfer: u64,
}

impl Quorums {
    pub fn get(&self, kind: QuorumKind) -> u64 {
        match kind {
            QuorumKind::AddMember => self.add_member,
            QuorumKind::ExcludeMember => self.exclude_member,
            QuorumKind::Base => self.base,
            QuorumKind::Transfer => self.transfer,
        }
    }

    pub fn set(&mut self, kind: QuorumKind, percent: u64) {
        match kind {
            QuorumKind::AddMember => self.add_member = percent,
            QuorumKind::ExcludeMember => self.exclude_member = percent,
            QuorumKind::Base => self.base = percent,
            QuorumKind::Transfer => self.transfer = percent,
        }
    }
}

impl Default for Quorums {
    fn default() -> Self {
        Quorums {
            add_member: 60,
            exclude_member: 60,
            base: 60,
            transfer: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_names() {
        assert!("alice".parse::<AccountName>().is_ok());
        assert!("dev.pool-1".parse::<AccountName>().is_ok());
        assert!("al".parse::<AccountName>().is_err());
        assert!("Alice".parse::<AccountName>().is_err());
        assert!("1alice".parse::<AccountName>().is_err());
        assert!("averyveryverylongname".parse::<AccountName>().is_err());

        let name: AccountName = serde_json::from_str("\"bob\"").unwrap();
        assert_eq!(name.as_str(), "bob");
        assert!(serde_json::from_str::<AccountName>("\"b\"").is_err());
    }
}
