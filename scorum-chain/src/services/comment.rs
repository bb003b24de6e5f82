use super::DynamicGlobalPropertyService;
use crate::asset::{Asset, Symbol};
use crate::database::Database;
use crate::error::{EvaluateError, Result};
use crate::schema::{AccountObject, CommentObject, CommentVoteObject};
use crate::time::TimePointSec;
use crate::types::AccountName;
use chainbase::{key, ObjectId};

/// Where a new comment hangs in its discussion tree.
#[derive(Debug, Clone)]
pub enum CommentParent {
    /// Root post, under a category.
    Category(String),
    Comment(ObjectId<CommentObject>),
}

pub trait CommentService {
    fn find_comment(&self, author: &AccountName, permlink: &str) -> Option<&CommentObject>;

    fn get_comment(&self, author: &AccountName, permlink: &str) -> Result<&CommentObject> {
        self.find_comment(author, permlink).ok_or_else(|| {
            EvaluateError::CommentNotFound {
                author: author.clone(),
                permlink: permlink.to_owned(),
            }
            .into()
        })
    }

    fn get_comment_by_id(&self, id: ObjectId<CommentObject>) -> Result<&CommentObject>;

    /// Create a comment open for votes until the end of the cashout window.
    /// Ancestors count the new child.
    fn create_comment(
        &mut self,
        author: &AccountName,
        permlink: &str,
        parent: CommentParent,
    ) -> Result<ObjectId<CommentObject>>;

    fn update_comment<F>(&mut self, id: ObjectId<CommentObject>, f: F) -> Result<()>
    where
        F: FnOnce(&mut CommentObject);

    /// Unpaid comments whose cashout time is `until` or earlier.
    fn comments_due(&self, until: TimePointSec) -> Vec<ObjectId<CommentObject>>;
}

pub trait CommentVoteService {
    fn find_comment_vote(
        &self,
        comment: ObjectId<CommentObject>,
        voter: ObjectId<AccountObject>,
    ) -> Option<&CommentVoteObject>;

    fn create_comment_vote<F>(
        &mut self,
        comment: ObjectId<CommentObject>,
        voter: ObjectId<AccountObject>,
        f: F,
    ) -> Result<ObjectId<CommentVoteObject>>
    where
        F: FnOnce(&mut CommentVoteObject);

    fn update_comment_vote<F>(&mut self, id: ObjectId<CommentVoteObject>, f: F) -> Result<()>
    where
        F: FnOnce(&mut CommentVoteObject);

    /// Votes of `comment`, heaviest curation weight first.
    fn comment_votes_by_weight(&self, comment: ObjectId<CommentObject>) -> Vec<&CommentVoteObject>;
}

impl CommentService for Database {
    fn find_comment(&self, author: &AccountName, permlink: &str) -> Option<&CommentObject> {
        self.comments
            .find_by(CommentObject::BY_PERMLINK, &key![author, permlink])
    }

    fn get_comment_by_id(&self, id: ObjectId<CommentObject>) -> Result<&CommentObject> {
        Ok(self.comments.get(id)?)
    }

    fn create_comment(
        &mut self,
        author: &AccountName,
        permlink: &str,
        parent: CommentParent,
    ) -> Result<ObjectId<CommentObject>> {
        ensure!(
            self.find_comment(author, permlink).is_none(),
            EvaluateError::CommentAlreadyExists {
                author: author.clone(),
                permlink: permlink.to_owned(),
            }
        )?;
        let now = self.head_block_time()?;
        let cashout_time = now.add_seconds(self.config.cashout_window_seconds);

        let (parent_author, parent_permlink, category, depth, root) = match &parent {
            CommentParent::Category(category) => (None, category.clone(), category.clone(), 0, None),
            CommentParent::Comment(parent) => {
                let parent = self.get_comment_by_id(*parent)?;
                ensure!(parent.allow_replies, EvaluateError::RepliesNotAllowed)?;
                ensure!(
                    parent.depth < self.config.max_comment_depth,
                    EvaluateError::CommentTooDeep
                )?;
                (
                    Some(parent.author.clone()),
                    parent.permlink.clone(),
                    parent.category.clone(),
                    parent.depth + 1,
                    Some(parent.root_comment),
                )
            }
        };

        let id = self
            .comments
            .create(|id| CommentObject {
                id,
                author: author.clone(),
                permlink: permlink.to_owned(),
                parent_author,
                parent_permlink,
                category,
                title: String::new(),
                body: String::new(),
                json_metadata: String::new(),
                depth,
                children: 0,
                root_comment: root.unwrap_or(id),
                created: now,
                last_update: now,
                active: now,
                last_payout: TimePointSec::MINIMUM,
                cashout_time,
                net_rshares: 0,
                abs_rshares: 0,
                vote_rshares: 0,
                children_abs_rshares: 0,
                total_vote_weight: 0,
                net_votes: 0,
                max_accepted_payout: Asset::new(i64::MAX, Symbol::Scr),
                allow_replies: true,
                allow_votes: true,
                allow_curation_rewards: true,
                beneficiaries: Vec::new(),
            })?
            .id;

        if let CommentParent::Comment(mut ancestor) = parent {
            loop {
                let grandparent = {
                    let parent = self.comments.modify(ancestor, |c| {
                        c.children += 1;
                        c.active = now;
                    })?;
                    parent
                        .parent_author
                        .clone()
                        .map(|author| (author, parent.parent_permlink.clone()))
                };
                match grandparent {
                    Some((author, permlink)) => ancestor = self.get_comment(&author, &permlink)?.id,
                    None => break,
                }
            }
        }
        Ok(id)
    }

    fn update_comment<F>(&mut self, id: ObjectId<CommentObject>, f: F) -> Result<()>
    where
        F: FnOnce(&mut CommentObject),
    {
        self.comments.modify(id, f)?;
        Ok(())
    }

    fn comments_due(&self, until: TimePointSec) -> Vec<ObjectId<CommentObject>> {
        self.comments
            .iter_by(CommentObject::BY_CASHOUT_TIME)
            .take_while(|c| c.cashout_time <= until && !c.is_paid())
            .map(|c| c.id)
            .collect()
    }
}

impl CommentVoteService for Database {
    fn find_comment_vote(
        &self,
        comment: ObjectId<CommentObject>,
        voter: ObjectId<AccountObject>,
    ) -> Option<&CommentVoteObject> {
        self.comment_votes
            .find_by(CommentVoteObject::BY_COMMENT_VOTER, &key![comment, voter])
    }

    fn create_comment_vote<F>(
        &mut self,
        comment: ObjectId<CommentObject>,
        voter: ObjectId<AccountObject>,
        f: F,
    ) -> Result<ObjectId<CommentVoteObject>>
    where
        F: FnOnce(&mut CommentVoteObject),
    {
        let now = self.head_block_time()?;
        let vote = self.comment_votes.create(|id| {
            let mut vote = CommentVoteObject {
                id,
                voter,
                comment,
                weight: 0,
                rshares: 0,
                vote_percent: 0,
                last_update: now,
                num_changes: 0,
            };
            f(&mut vote);
            vote
        })?;
        Ok(vote.id)
    }

    fn update_comment_vote<F>(&mut self, id: ObjectId<CommentVoteObject>, f: F) -> Result<()>
    where
        F: FnOnce(&mut CommentVoteObject),
    {
        self.comment_votes.modify(id, f)?;
        Ok(())
    }

    fn comment_votes_by_weight(&self, comment: ObjectId<CommentObject>) -> Vec<&CommentVoteObject> {
        self.comment_votes
            .prefix_by(CommentVoteObject::BY_COMMENT_WEIGHT_VOTER, &key![comment])
            .collect()
    }
}
