//! Operations a transaction carries.
//!
//! Every operation checks its own shape with [`Operation::validate`] before
//! any state is read. Authority is not checked: the acting account named by
//! the operation is taken as the signer.

use crate::asset::{Asset, Symbol};
use crate::error::ValidationError;
use crate::schema::{Beneficiary, BudgetKind, ProposalAction};
use crate::time::TimePointSec;
use crate::types::AccountName;
use crate::{Percent, PERCENT_100};
use serde_derive::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountCreate {
    /// Paid by the creator, staked for the new account.
    pub fee: Asset,
    pub creator: AccountName,
    pub new_account_name: AccountName,
    #[serde(default)]
    pub json_metadata: String,
}

/// Registration of an account by a registration committee member, funded
/// by the registration pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountCreateByCommittee {
    pub creator: AccountName,
    pub new_account_name: AccountName,
    #[serde(default)]
    pub json_metadata: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub from: AccountName,
    pub to: AccountName,
    pub amount: Asset,
    #[serde(default)]
    pub memo: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferToScorumpower {
    pub from: AccountName,
    /// Defaults to `from`.
    #[serde(default)]
    pub to: Option<AccountName>,
    pub amount: Asset,
}

/// Start, replace or, with a zero amount, stop a scorumpower withdrawal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawScorumpower {
    pub account: AccountName,
    pub scorumpower: Asset,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetWithdrawScorumpowerRouteToAccount {
    pub from_account: AccountName,
    pub to_account: AccountName,
    pub percent: Percent,
    pub auto_vest: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetWithdrawScorumpowerRouteToDevPool {
    pub from_account: AccountName,
    pub percent: Percent,
    pub auto_vest: bool,
}

/// Create or edit a post or a reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// `None` for a root post, `parent_permlink` is then its category.
    #[serde(default)]
    pub parent_author: Option<AccountName>,
    pub parent_permlink: String,
    pub author: AccountName,
    pub permlink: String,
    #[serde(default)]
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub json_metadata: String,
}

/// Restrict the payout of a comment. Options can only get stricter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentOptions {
    pub author: AccountName,
    pub permlink: String,
    pub max_accepted_payout: Asset,
    pub allow_votes: bool,
    pub allow_curation_rewards: bool,
    #[serde(default)]
    pub beneficiaries: Vec<Beneficiary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub voter: AccountName,
    pub author: AccountName,
    pub permlink: String,
    /// Percent of the voting power, negative to flag. Whole percents before
    /// hardfork 0.2, hundredths after.
    pub weight: i16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountWitnessVote {
    pub account: AccountName,
    pub witness: AccountName,
    pub approve: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountWitnessProxy {
    pub account: AccountName,
    /// `None` clears the proxy.
    #[serde(default)]
    pub proxy: Option<AccountName>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WitnessUpdate {
    pub owner: AccountName,
    #[serde(default)]
    pub url: String,
    pub block_signing_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBudget {
    pub owner: AccountName,
    pub kind: BudgetKind,
    #[serde(default)]
    pub content_permlink: String,
    pub balance: Asset,
    pub deadline: TimePointSec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseBudget {
    pub owner: AccountName,
    pub budget_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalCreate {
    pub creator: AccountName,
    pub action: ProposalAction,
    pub lifetime_sec: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalVote {
    pub voting_account: AccountName,
    pub proposal_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    AccountCreate(AccountCreate),
    AccountCreateByCommittee(AccountCreateByCommittee),
    Transfer(Transfer),
    TransferToScorumpower(TransferToScorumpower),
    WithdrawScorumpower(WithdrawScorumpower),
    SetWithdrawScorumpowerRouteToAccount(SetWithdrawScorumpowerRouteToAccount),
    SetWithdrawScorumpowerRouteToDevPool(SetWithdrawScorumpowerRouteToDevPool),
    Comment(Comment),
    CommentOptions(CommentOptions),
    Vote(Vote),
    AccountWitnessVote(AccountWitnessVote),
    AccountWitnessProxy(AccountWitnessProxy),
    WitnessUpdate(WitnessUpdate),
    CreateBudget(CreateBudget),
    CloseBudget(CloseBudget),
    ProposalCreate(ProposalCreate),
    ProposalVote(ProposalVote),
}

fn valid_amount(field: &'static str, amount: Asset, symbol: Symbol) -> Result<(), ValidationError> {
    if amount.symbol != symbol {
        return Err(ValidationError::WrongSymbol {
            field,
            expected: symbol,
        });
    }
    if !amount.is_positive() {
        return Err(ValidationError::NonPositiveAmount { field });
    }
    Ok(())
}

fn valid_percent(field: &'static str, percent: Percent) -> Result<(), ValidationError> {
    if percent > PERCENT_100 {
        return Err(ValidationError::PercentOutOfRange {
            field,
            value: percent as u64,
        });
    }
    Ok(())
}

fn not_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::Empty(field));
    }
    Ok(())
}

fn valid_beneficiaries(beneficiaries: &[Beneficiary]) -> Result<(), ValidationError> {
    let mut total = 0u32;
    for (i, beneficiary) in beneficiaries.iter().enumerate() {
        if beneficiary.weight == 0 {
            return Err(ValidationError::PercentOutOfRange {
                field: "beneficiary weight",
                value: 0,
            });
        }
        total += beneficiary.weight as u32;
        if let Some(previous) = i.checked_sub(1).map(|p| &beneficiaries[p]) {
            if previous.account == beneficiary.account {
                return Err(ValidationError::DuplicateBeneficiary(
                    beneficiary.account.clone(),
                ));
            }
            if previous.account > beneficiary.account {
                return Err(ValidationError::UnsortedBeneficiaries);
            }
        }
    }
    if total > PERCENT_100 as u32 {
        return Err(ValidationError::PercentOutOfRange {
            field: "beneficiaries",
            value: total as u64,
        });
    }
    Ok(())
}

impl Operation {
    /// Checks that need nothing but the operation itself.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Operation::AccountCreate(op) => {
                if op.fee.symbol != Symbol::Scr {
                    return Err(ValidationError::WrongSymbol {
                        field: "fee",
                        expected: Symbol::Scr,
                    });
                }
                if op.fee.amount < 0 {
                    return Err(ValidationError::NonPositiveAmount { field: "fee" });
                }
                Ok(())
            }
            Operation::AccountCreateByCommittee(_) => Ok(()),
            Operation::Transfer(op) => valid_amount("amount", op.amount, Symbol::Scr),
            Operation::TransferToScorumpower(op) => valid_amount("amount", op.amount, Symbol::Scr),
            Operation::WithdrawScorumpower(op) => {
                if op.scorumpower.symbol != Symbol::Sp {
                    return Err(ValidationError::WrongSymbol {
                        field: "scorumpower",
                        expected: Symbol::Sp,
                    });
                }
                if op.scorumpower.amount < 0 {
                    return Err(ValidationError::NonPositiveAmount {
                        field: "scorumpower",
                    });
                }
                Ok(())
            }
            Operation::SetWithdrawScorumpowerRouteToAccount(op) => {
                if op.from_account == op.to_account {
                    return Err(ValidationError::SelfRoute);
                }
                valid_percent("percent", op.percent)
            }
            Operation::SetWithdrawScorumpowerRouteToDevPool(op) => {
                valid_percent("percent", op.percent)
            }
            Operation::Comment(op) => {
                not_empty("permlink", &op.permlink)?;
                not_empty("parent_permlink", &op.parent_permlink)?;
                not_empty("body", &op.body)
            }
            Operation::CommentOptions(op) => {
                not_empty("permlink", &op.permlink)?;
                if op.max_accepted_payout.symbol != Symbol::Scr {
                    return Err(ValidationError::WrongSymbol {
                        field: "max_accepted_payout",
                        expected: Symbol::Scr,
                    });
                }
                if op.max_accepted_payout.amount < 0 {
                    return Err(ValidationError::NonPositiveAmount {
                        field: "max_accepted_payout",
                    });
                }
                valid_beneficiaries(&op.beneficiaries)
            }
            Operation::Vote(op) => {
                not_empty("permlink", &op.permlink)?;
                if (op.weight as i32).abs() > PERCENT_100 as i32 {
                    return Err(ValidationError::VoteWeightOutOfRange(op.weight));
                }
                Ok(())
            }
            Operation::AccountWitnessVote(_) => Ok(()),
            Operation::AccountWitnessProxy(op) => {
                if op.proxy.as_ref() == Some(&op.account) {
                    return Err(ValidationError::SelfProxy);
                }
                Ok(())
            }
            Operation::WitnessUpdate(op) => not_empty("block_signing_key", &op.block_signing_key),
            Operation::CreateBudget(op) => {
                valid_amount("balance", op.balance, Symbol::Scr)?;
                if op.kind == BudgetKind::Fund {
                    return Err(ValidationError::WrongBudgetKind);
                }
                Ok(())
            }
            Operation::CloseBudget(_) => Ok(()),
            Operation::ProposalCreate(op) => match &op.action {
                ProposalAction::ChangeQuorum { percent, .. } if *percent > 100 => {
                    Err(ValidationError::QuorumOutOfRange(*percent))
                }
                ProposalAction::WithdrawVesting { amount } => {
                    valid_amount("amount", *amount, Symbol::Sp)
                }
                ProposalAction::Transfer { amount, .. } => {
                    valid_amount("amount", *amount, Symbol::Scr)
                }
                _ => Ok(()),
            },
            Operation::ProposalVote(_) => Ok(()),
        }
    }

    /// Account acting in the operation.
    pub fn actor(&self) -> &AccountName {
        match self {
            Operation::AccountCreate(op) => &op.creator,
            Operation::AccountCreateByCommittee(op) => &op.creator,
            Operation::Transfer(op) => &op.from,
            Operation::TransferToScorumpower(op) => &op.from,
            Operation::WithdrawScorumpower(op) => &op.account,
            Operation::SetWithdrawScorumpowerRouteToAccount(op) => &op.from_account,
            Operation::SetWithdrawScorumpowerRouteToDevPool(op) => &op.from_account,
            Operation::Comment(op) => &op.author,
            Operation::CommentOptions(op) => &op.author,
            Operation::Vote(op) => &op.voter,
            Operation::AccountWitnessVote(op) => &op.account,
            Operation::AccountWitnessProxy(op) => &op.account,
            Operation::WitnessUpdate(op) => &op.owner,
            Operation::CreateBudget(op) => &op.owner,
            Operation::CloseBudget(op) => &op.owner,
            Operation::ProposalCreate(op) => &op.creator,
            Operation::ProposalVote(op) => &op.voting_account,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PERCENT_1;

    fn name(s: &str) -> AccountName {
        s.parse().unwrap()
    }

    #[test]
    fn transfer_needs_positive_liquid_amount() {
        let transfer = |amount| {
            Operation::Transfer(Transfer {
                from: name("alice"),
                to: name("bob"),
                amount,
                memo: String::new(),
            })
        };
        assert!(transfer(Asset::scr(1)).validate().is_ok());
        assert_eq!(
            transfer(Asset::scr(0)).validate(),
            Err(ValidationError::NonPositiveAmount { field: "amount" })
        );
        assert_eq!(
            transfer(Asset::sp(1)).validate(),
            Err(ValidationError::WrongSymbol {
                field: "amount",
                expected: Symbol::Scr
            })
        );
    }

    #[test]
    fn beneficiaries_are_sorted_and_bounded() {
        let options = |beneficiaries| {
            Operation::CommentOptions(CommentOptions {
                author: name("alice"),
                permlink: "post".to_owned(),
                max_accepted_payout: Asset::scr(1_000),
                allow_votes: true,
                allow_curation_rewards: true,
                beneficiaries,
            })
        };
        let beneficiary = |account: &str, weight| Beneficiary {
            account: name(account),
            weight,
        };
        assert!(options(vec![
            beneficiary("bob", 10 * PERCENT_1),
            beneficiary("carol", 90 * PERCENT_1)
        ])
        .validate()
        .is_ok());
        assert_eq!(
            options(vec![
                beneficiary("carol", PERCENT_1),
                beneficiary("bob", PERCENT_1)
            ])
            .validate(),
            Err(ValidationError::UnsortedBeneficiaries)
        );
        assert_eq!(
            options(vec![beneficiary("bob", PERCENT_1), beneficiary("bob", PERCENT_1)]).validate(),
            Err(ValidationError::DuplicateBeneficiary(name("bob")))
        );
        assert!(options(vec![
            beneficiary("bob", 60 * PERCENT_1),
            beneficiary("carol", 41 * PERCENT_1)
        ])
        .validate()
        .is_err());
    }

    #[test]
    fn self_references_are_rejected() {
        let proxy = Operation::AccountWitnessProxy(AccountWitnessProxy {
            account: name("alice"),
            proxy: Some(name("alice")),
        });
        assert_eq!(proxy.validate(), Err(ValidationError::SelfProxy));

        let route = Operation::SetWithdrawScorumpowerRouteToAccount(
            SetWithdrawScorumpowerRouteToAccount {
                from_account: name("alice"),
                to_account: name("alice"),
                percent: PERCENT_100,
                auto_vest: false,
            },
        );
        assert_eq!(route.validate(), Err(ValidationError::SelfRoute));
    }

    #[test]
    fn operations_read_from_json() {
        let op: Operation = serde_json::from_str(
            r#"{"type":"vote","voter":"alice","author":"bob","permlink":"post","weight":-10000}"#,
        )
        .unwrap();
        assert_eq!(op.actor(), &name("alice"));
        assert!(op.validate().is_ok());
    }
}
