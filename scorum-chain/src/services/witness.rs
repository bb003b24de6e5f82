use super::{AccountService, DynamicGlobalPropertyService};
use crate::database::Database;
use crate::error::{EvaluateError, Result};
use crate::schema::{AccountObject, WitnessObject, WitnessVoteObject};
use crate::types::AccountName;
use chainbase::{key, ObjectId};

pub trait WitnessService {
    fn find_witness(&self, owner: &AccountName) -> Option<&WitnessObject>;

    fn get_witness(&self, owner: &AccountName) -> Result<&WitnessObject>;

    fn create_witness(
        &mut self,
        owner: &AccountName,
        url: &str,
        signing_key: &str,
    ) -> Result<ObjectId<WitnessObject>>;

    fn update_witness<F>(&mut self, id: ObjectId<WitnessObject>, f: F) -> Result<()>
    where
        F: FnOnce(&mut WitnessObject);

    /// Add `delta` to every witness `account` votes for.
    fn adjust_witness_votes(&mut self, account: ObjectId<AccountObject>, delta: i64)
        -> Result<()>;

    fn adjust_witness_vote(&mut self, witness: ObjectId<WitnessObject>, delta: i64) -> Result<()>;

    fn vote_for_witness(
        &mut self,
        account: ObjectId<AccountObject>,
        witness: ObjectId<WitnessObject>,
    ) -> Result<()>;

    fn remove_witness_vote(
        &mut self,
        account: ObjectId<AccountObject>,
        witness: ObjectId<WitnessObject>,
    ) -> Result<()>;

    /// Most voted witnesses first.
    fn top_witnesses(&self, count: usize) -> Vec<&WitnessObject>;
}

impl WitnessService for Database {
    fn find_witness(&self, owner: &AccountName) -> Option<&WitnessObject> {
        self.witnesses.find_by(WitnessObject::BY_NAME, &key![owner])
    }

    fn get_witness(&self, owner: &AccountName) -> Result<&WitnessObject> {
        self.find_witness(owner)
            .ok_or_else(|| EvaluateError::WitnessNotFound(owner.clone()).into())
    }

    fn create_witness(
        &mut self,
        owner: &AccountName,
        url: &str,
        signing_key: &str,
    ) -> Result<ObjectId<WitnessObject>> {
        let created = self.head_block_time()?;
        let witness = self.witnesses.create(|id| WitnessObject {
            id,
            owner: owner.clone(),
            created,
            url: url.to_owned(),
            signing_key: signing_key.to_owned(),
            votes: 0,
            total_missed: 0,
            last_confirmed_block_num: 0,
        })?;
        Ok(witness.id)
    }

    fn update_witness<F>(&mut self, id: ObjectId<WitnessObject>, f: F) -> Result<()>
    where
        F: FnOnce(&mut WitnessObject),
    {
        self.witnesses.modify(id, f)?;
        Ok(())
    }

    fn adjust_witness_votes(
        &mut self,
        account: ObjectId<AccountObject>,
        delta: i64,
    ) -> Result<()> {
        let witnesses: Vec<_> = self
            .witness_votes
            .prefix_by(WitnessVoteObject::BY_ACCOUNT_WITNESS, &key![account])
            .map(|v| v.witness)
            .collect();
        for witness in witnesses {
            self.adjust_witness_vote(witness, delta)?;
        }
        Ok(())
    }

    fn adjust_witness_vote(&mut self, witness: ObjectId<WitnessObject>, delta: i64) -> Result<()> {
        self.witnesses.modify(witness, |w| w.votes += delta)?;
        Ok(())
    }

    fn vote_for_witness(
        &mut self,
        account: ObjectId<AccountObject>,
        witness: ObjectId<WitnessObject>,
    ) -> Result<()> {
        let voter = self.get_account_by_id(account)?;
        ensure!(voter.proxy.is_none(), EvaluateError::VotingThroughProxy)?;
        ensure!(
            voter.witnesses_voted_for < self.config.max_account_witness_votes,
            EvaluateError::TooManyWitnessVotes
        )?;
        ensure!(
            self.witness_votes
                .find_by(
                    WitnessVoteObject::BY_ACCOUNT_WITNESS,
                    &key![account, witness]
                )
                .is_none(),
            EvaluateError::WitnessVoteExists
        )?;
        let weight = voter.witness_vote_weight();

        self.witness_votes
            .create(|id| WitnessVoteObject {
                id,
                witness,
                account,
            })?;
        self.adjust_witness_vote(witness, weight)?;
        self.update_account(account, |a| a.witnesses_voted_for += 1)
    }

    fn remove_witness_vote(
        &mut self,
        account: ObjectId<AccountObject>,
        witness: ObjectId<WitnessObject>,
    ) -> Result<()> {
        let vote = self
            .witness_votes
            .find_by(
                WitnessVoteObject::BY_ACCOUNT_WITNESS,
                &key![account, witness],
            )
            .ok_or(EvaluateError::WitnessVoteNotFound)?
            .id;
        let weight = self.get_account_by_id(account)?.witness_vote_weight();

        self.adjust_witness_vote(witness, -weight)?;
        self.witness_votes.remove(vote)?;
        self.update_account(account, |a| a.witnesses_voted_for -= 1)
    }

    fn top_witnesses(&self, count: usize) -> Vec<&WitnessObject> {
        self.witnesses
            .iter_by(WitnessObject::BY_VOTE)
            .take(count)
            .collect()
    }
}
