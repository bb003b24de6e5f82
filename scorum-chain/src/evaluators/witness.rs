use super::EvaluationContext;
use crate::error::{EvaluateError, Result};
use crate::operations::{AccountWitnessProxy, AccountWitnessVote, WitnessUpdate};
use crate::services::{AccountService, WitnessService};

pub(super) fn account_witness_vote(
    ctx: &mut EvaluationContext<'_>,
    op: &AccountWitnessVote,
) -> Result<()> {
    let account = ctx.db.get_account(&op.account)?.id;
    let witness = ctx.db.get_witness(&op.witness)?.id;
    if op.approve {
        ctx.db.vote_for_witness(account, witness)
    } else {
        ctx.db.remove_witness_vote(account, witness)
    }
}

pub(super) fn account_witness_proxy(
    ctx: &mut EvaluationContext<'_>,
    op: &AccountWitnessProxy,
) -> Result<()> {
    let account = ctx.db.get_account(&op.account)?;
    ensure!(account.proxy != op.proxy, EvaluateError::ProxyUnchanged)?;
    let id = account.id;
    ctx.db.update_proxy(id, op.proxy.as_ref())
}

pub(super) fn witness_update(ctx: &mut EvaluationContext<'_>, op: &WitnessUpdate) -> Result<()> {
    ctx.db.check_account_existence(&op.owner)?;
    match ctx.db.find_witness(&op.owner).map(|w| w.id) {
        Some(id) => ctx.db.update_witness(id, |w| {
            w.url = op.url.clone();
            w.signing_key = op.block_signing_key.clone();
        }),
        None => {
            ctx.db
                .create_witness(&op.owner, &op.url, &op.block_signing_key)?;
            tracing::info!(witness = %op.owner, "witness registered");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::asset::Asset;
    use crate::error::{Error, EvaluateError, ValidationError};
    use crate::operations::{AccountWitnessProxy, AccountWitnessVote, Operation, WitnessUpdate};
    use crate::services::{AccountService, WitnessService};
    use crate::testing::{apply_operation, ChainStateBuilder};
    use crate::types::AccountName;
    use crate::ChainState;

    fn name(s: &str) -> AccountName {
        s.parse().unwrap()
    }

    fn witness_vote(account: &str, witness: &str, approve: bool) -> Operation {
        Operation::AccountWitnessVote(AccountWitnessVote {
            account: name(account),
            witness: name(witness),
            approve,
        })
    }

    fn proxy(account: &str, proxy: Option<&str>) -> Operation {
        Operation::AccountWitnessProxy(AccountWitnessProxy {
            account: name(account),
            proxy: proxy.map(name),
        })
    }

    fn votes(state: &ChainState, witness: &str) -> i64 {
        state.database().get_witness(&name(witness)).unwrap().votes
    }

    fn network() -> ChainState {
        ChainStateBuilder::new()
            .with_account("alice", Asset::scr(0), Asset::sp(100))
            .with_account("bob", Asset::scr(0), Asset::sp(30))
            .with_account("carol", Asset::scr(0), Asset::sp(0))
            .with_witness("carol")
            .build()
            .unwrap()
    }

    #[test]
    fn update_registers_then_edits() {
        let mut state = network();
        let update = |url: &str| {
            Operation::WitnessUpdate(WitnessUpdate {
                owner: name("alice"),
                url: url.to_owned(),
                block_signing_key: "SCR1key".to_owned(),
            })
        };
        apply_operation(&mut state, update("https://first")).unwrap();
        apply_operation(&mut state, update("https://second")).unwrap();
        let witness = state.database().get_witness(&name("alice")).unwrap();
        assert_eq!(witness.url, "https://second");
        assert_eq!(witness.votes, 0);
    }

    #[test]
    fn stake_follows_votes_and_proxies() {
        let mut state = network();
        apply_operation(&mut state, witness_vote("alice", "carol", true)).unwrap();
        assert_eq!(votes(&state, "carol"), 100);
        assert_err_match!(
            Error::Evaluate(EvaluateError::WitnessVoteExists),
            apply_operation(&mut state, witness_vote("alice", "carol", true))
        );

        // bob's stake reaches carol through alice
        apply_operation(&mut state, proxy("bob", Some("alice"))).unwrap();
        assert_eq!(votes(&state, "carol"), 130);
        assert_eq!(
            state
                .database()
                .get_account(&name("alice"))
                .unwrap()
                .proxied_vsf_votes[0],
            30
        );
        assert_err_match!(
            Error::Evaluate(EvaluateError::ProxyUnchanged),
            apply_operation(&mut state, proxy("bob", Some("alice")))
        );
        assert_err_match!(
            Error::Evaluate(EvaluateError::VotingThroughProxy),
            apply_operation(&mut state, witness_vote("bob", "carol", true))
        );

        apply_operation(&mut state, proxy("bob", None)).unwrap();
        assert_eq!(votes(&state, "carol"), 100);
        apply_operation(&mut state, witness_vote("alice", "carol", false)).unwrap();
        assert_eq!(votes(&state, "carol"), 0);
        assert_err_match!(
            Error::Evaluate(EvaluateError::WitnessVoteNotFound),
            apply_operation(&mut state, witness_vote("alice", "carol", false))
        );
    }

    #[test]
    fn proxy_rules() {
        let mut state = network();
        assert_err_match!(
            Error::Validation(ValidationError::SelfProxy),
            apply_operation(&mut state, proxy("alice", Some("alice")))
        );
        apply_operation(&mut state, proxy("alice", Some("bob"))).unwrap();
        assert_err_match!(
            Error::Evaluate(EvaluateError::ProxyCycle),
            apply_operation(&mut state, proxy("bob", Some("alice")))
        );
        assert_err_match!(
            Error::Evaluate(EvaluateError::WitnessNotFound(_)),
            apply_operation(&mut state, witness_vote("bob", "alice", true))
        );
    }
}
