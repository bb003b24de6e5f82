use super::EvaluationContext;
use crate::error::{EvaluateError, Result, ValidationError};
use crate::operations::{Comment, CommentOptions};
use crate::services::{AccountService, CommentParent, CommentService, DynamicGlobalPropertyService};

pub(super) fn comment(ctx: &mut EvaluationContext<'_>, op: &Comment) -> Result<()> {
    let max = ctx.db.config().max_permlink_length;
    ensure!(
        op.permlink.len() <= max,
        ValidationError::TooLong {
            field: "permlink",
            max
        }
    )?;
    let author = ctx.db.get_account(&op.author)?.id;
    let now = ctx.db.head_block_time()?;

    if let Some(id) = ctx.db.find_comment(&op.author, &op.permlink).map(|c| c.id) {
        return ctx.db.update_comment(id, |c| {
            c.title = op.title.clone();
            c.body = op.body.clone();
            c.json_metadata = op.json_metadata.clone();
            c.last_update = now;
            c.active = now;
        });
    }

    let parent = match &op.parent_author {
        None => CommentParent::Category(op.parent_permlink.clone()),
        Some(parent_author) => {
            CommentParent::Comment(ctx.db.get_comment(parent_author, &op.parent_permlink)?.id)
        }
    };
    let is_root = matches!(parent, CommentParent::Category(_));
    let id = ctx.db.create_comment(&op.author, &op.permlink, parent)?;
    ctx.db.update_comment(id, |c| {
        c.title = op.title.clone();
        c.body = op.body.clone();
        c.json_metadata = op.json_metadata.clone();
    })?;
    ctx.db.update_account(author, |a| {
        a.post_count += 1;
        a.last_post = now;
        if is_root {
            a.last_root_post = now;
        }
    })
}

pub(super) fn comment_options(ctx: &mut EvaluationContext<'_>, op: &CommentOptions) -> Result<()> {
    let comment = ctx.db.get_comment(&op.author, &op.permlink)?;
    let id = comment.id;

    // options only ever get stricter
    ensure!(
        comment.allow_votes || !op.allow_votes,
        EvaluateError::CommentOptionsLocked
    )?;
    ensure!(
        comment.allow_curation_rewards || !op.allow_curation_rewards,
        EvaluateError::CommentOptionsLocked
    )?;
    ensure!(
        op.max_accepted_payout.amount <= comment.max_accepted_payout.amount,
        EvaluateError::CommentOptionsLocked
    )?;
    if !op.beneficiaries.is_empty() {
        ensure!(
            comment.beneficiaries.is_empty() && comment.abs_rshares == 0,
            EvaluateError::CommentOptionsLocked
        )?;
        for beneficiary in op.beneficiaries.iter() {
            ctx.db.check_account_existence(&beneficiary.account)?;
        }
    }

    ctx.db.update_comment(id, |c| {
        c.max_accepted_payout = op.max_accepted_payout;
        c.allow_votes = op.allow_votes;
        c.allow_curation_rewards = op.allow_curation_rewards;
        if !op.beneficiaries.is_empty() {
            c.beneficiaries = op.beneficiaries.clone();
        }
    })
}
