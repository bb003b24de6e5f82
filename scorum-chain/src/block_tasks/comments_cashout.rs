use super::BlockTaskContext;
use crate::asset::{Asset, Symbol};
use crate::error::Result;
use crate::schema::{AccountObject, CommentObject};
use crate::services::{
    AccountService, CommentService, CommentVoteService, DynamicGlobalPropertyService,
    RewardFundService,
};
use crate::time::TimePointSec;
use crate::types::{AccountName, Hardfork};
use crate::virtual_ops::VirtualOperation;
use chainbase::ObjectId;
use rewards_math::{
    calculate_curation_payout, calculate_curations_payout, calculate_payout,
    calculate_total_claims,
};
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

/// Comment identity the rewards of a cashout are gathered under.
type CommentKey = (AccountName, String);

#[derive(Debug, Default, Clone, Copy)]
struct CommentReward {
    /// From the reward fund.
    fund: i64,
    /// Collected from the replies paid in the same cashout.
    commenting: i64,
}

struct CommentPayout {
    total_claimed: Asset,
    parent_reward: Asset,
}

/// Pay every comment whose cashout time has come, out of the liquid and
/// the staked reward funds independently, then close their payout.
pub fn process_comments_cashout(ctx: &mut BlockTaskContext<'_>) -> Result<()> {
    let now = ctx.db.head_block_time()?;
    let due = ctx.db.comments_due(now);
    if due.is_empty() {
        return Ok(());
    }
    tracing::debug!(comments = due.len(), "comments cashout");

    for symbol in [Symbol::Scr, Symbol::Sp].iter() {
        reward(ctx, *symbol, &due, now)?;
    }
    for id in due {
        close_comment_payout(ctx, id, now)?;
    }
    Ok(())
}

fn reward(
    ctx: &mut BlockTaskContext<'_>,
    symbol: Symbol,
    comments: &[ObjectId<CommentObject>],
    now: TimePointSec,
) -> Result<()> {
    let fund = ctx.db.get_reward_fund(symbol)?.clone();
    if fund.activity_reward_balance.amount < 1 {
        return Ok(());
    }
    let config = &ctx.db.config;
    let (decay, min_share) = (
        config.recent_rshares_decay_seconds,
        config.min_comment_payout_share,
    );

    let rshares = comments
        .iter()
        .map(|id| Ok(ctx.db.get_comment_by_id(*id)?.net_rshares))
        .collect::<Result<Vec<_>>>()?;
    let total_claims = calculate_total_claims(
        fund.recent_claims,
        now.secs(),
        fund.last_payout_check.secs(),
        fund.author_reward_curve,
        &rshares,
        decay,
    )?;

    let mut rewards = BTreeMap::new();
    for id in comments {
        let comment = ctx.db.get_comment_by_id(*id)?;
        let payout = if comment.net_rshares > 0 && total_claims > 0 {
            calculate_payout(
                comment.net_rshares,
                total_claims,
                fund.activity_reward_balance.amount,
                fund.author_reward_curve,
                comment.max_accepted_payout.amount,
                min_share,
            )?
        } else {
            0
        };
        let key = comment_key(ctx, &comment.author, &comment.permlink)?;
        rewards.entry(key).or_insert(CommentReward {
            fund: payout,
            commenting: 0,
        });
    }

    let paid = pay_for_comments(ctx, symbol, comments, rewards)?;

    let balance = (fund.activity_reward_balance - paid)?;
    ctx.db.update_reward_fund(symbol, |f| {
        f.recent_claims = total_claims;
        f.activity_reward_balance = balance;
        f.last_payout_check = now;
    })
}

/// Before hardfork 0.1 rewards were gathered by author only.
fn comment_key(
    ctx: &BlockTaskContext<'_>,
    author: &AccountName,
    permlink: &str,
) -> Result<CommentKey> {
    let permlink = if ctx.db.has_hardfork(Hardfork::HARDFORK_0_1)? {
        permlink.to_owned()
    } else {
        String::new()
    };
    Ok((author.clone(), permlink))
}

/// The comments with all their ancestors, deepest first.
fn collect_parents(
    ctx: &BlockTaskContext<'_>,
    comments: &[ObjectId<CommentObject>],
) -> Result<Vec<ObjectId<CommentObject>>> {
    let mut ordered = BTreeSet::new();
    let mut pending = Vec::with_capacity(comments.len());
    for id in comments {
        let comment = ctx.db.get_comment_by_id(*id)?;
        if ordered.insert(Reverse((comment.depth, *id))) {
            pending.push(*id);
        }
    }
    while let Some(id) = pending.pop() {
        let comment = ctx.db.get_comment_by_id(id)?;
        if let Some(parent_author) = &comment.parent_author {
            let parent = ctx.db.get_comment(parent_author, &comment.parent_permlink)?;
            if ordered.insert(Reverse((parent.depth, parent.id))) {
                pending.push(parent.id);
            }
        }
    }
    Ok(ordered.into_iter().map(|Reverse((_, id))| id).collect())
}

fn pay_for_comments(
    ctx: &mut BlockTaskContext<'_>,
    symbol: Symbol,
    comments: &[ObjectId<CommentObject>],
    mut rewards: BTreeMap<CommentKey, CommentReward>,
) -> Result<Asset> {
    let mut total = Asset::zero(symbol);
    for id in collect_parents(ctx, comments)? {
        let comment = ctx.db.get_comment_by_id(id)?;
        let key = comment_key(ctx, &comment.author, &comment.permlink)?;
        let parent_key = match &comment.parent_author {
            Some(author) => Some(comment_key(ctx, author, &comment.parent_permlink)?),
            None => None,
        };
        let reward = rewards.get(&key).copied().unwrap_or_default();

        let payout = pay_for_comment(
            ctx,
            id,
            Asset::new(reward.fund, symbol),
            Asset::new(reward.commenting, symbol),
        )?;
        total = (total + payout.total_claimed)?;

        if let Some(parent_key) = parent_key {
            rewards.entry(parent_key).or_default().commenting += payout.parent_reward.amount;
        }
    }
    Ok(total)
}

fn pay_for_comment(
    ctx: &mut BlockTaskContext<'_>,
    id: ObjectId<CommentObject>,
    fund_reward: Asset,
    children_reward: Asset,
) -> Result<CommentPayout> {
    let symbol = fund_reward.symbol;
    if fund_reward.amount < 1 && children_reward.amount < 1 {
        return Ok(CommentPayout {
            total_claimed: Asset::zero(symbol),
            parent_reward: Asset::zero(symbol),
        });
    }
    let comment = ctx.db.get_comment_by_id(id)?.clone();
    let config = &ctx.db.config;
    let (curation_percent, parent_percent) = (
        config.curation_reward_percent,
        config.parent_comment_reward_percent,
    );

    let mut author_reward = Asset::zero(symbol);
    let mut curators_reward = Asset::zero(symbol);
    if fund_reward.is_positive() {
        curators_reward = Asset::new(
            calculate_curations_payout(fund_reward.amount, curation_percent),
            symbol,
        );
        author_reward = (fund_reward - curators_reward)?;
        let unclaimed = pay_curators(ctx, &comment, &mut curators_reward)?;
        author_reward = (author_reward + unclaimed)?;
    }

    let parent_reward = if comment.is_root() {
        Asset::zero(symbol)
    } else {
        (author_reward + children_reward)?.percent(parent_percent)
    };
    let author_reward = ((author_reward + children_reward)? - parent_reward)?;
    let total_claimed = (author_reward + curators_reward)?;

    let mut beneficiaries_reward = Asset::zero(symbol);
    for beneficiary in comment.beneficiaries.iter() {
        let reward = author_reward.percent(beneficiary.weight);
        let account = ctx.db.get_account(&beneficiary.account)?.id;
        pay_account(ctx, account, reward)?;
        ctx.push_virtual_operation(VirtualOperation::CommentBenefactorReward {
            benefactor: beneficiary.account.clone(),
            author: comment.author.clone(),
            permlink: comment.permlink.clone(),
            reward,
        });
        beneficiaries_reward = (beneficiaries_reward + reward)?;
    }
    let author_reward = (author_reward - beneficiaries_reward)?;

    let author = ctx.db.get_account(&comment.author)?.id;
    pay_account(ctx, author, author_reward)?;
    let now = ctx.db.head_block_time()?;
    ctx.db.update_comment(id, |c| c.last_payout = now)?;

    ctx.push_virtual_operation(VirtualOperation::AuthorReward {
        author: comment.author.clone(),
        permlink: comment.permlink.clone(),
        reward: author_reward,
    });
    ctx.push_virtual_operation(VirtualOperation::CommentReward {
        author: comment.author.clone(),
        permlink: comment.permlink.clone(),
        fund_reward,
        total_payout: total_claimed,
        author_payout: author_reward,
        curators_payout: curators_reward,
        from_children_payout: children_reward,
        to_parent_payout: parent_reward,
        beneficiaries_payout: beneficiaries_reward,
    });

    Ok(CommentPayout {
        total_claimed,
        parent_reward,
    })
}

/// Pay the voters of `comment` out of `curators_reward`, heaviest first.
/// Returns what no curator claimed, `curators_reward` is left with what
/// was paid.
fn pay_curators(
    ctx: &mut BlockTaskContext<'_>,
    comment: &CommentObject,
    curators_reward: &mut Asset,
) -> Result<Asset> {
    let symbol = curators_reward.symbol;
    let mut unclaimed = *curators_reward;

    if !comment.allow_curation_rewards {
        // lost for the comment, stays in the fund
        unclaimed = Asset::zero(symbol);
        *curators_reward = Asset::zero(symbol);
    } else if comment.total_vote_weight > 0 {
        let votes: Vec<_> = ctx
            .db
            .comment_votes_by_weight(comment.id)
            .into_iter()
            .map(|v| (v.voter, v.weight))
            .collect();
        for (voter, weight) in votes {
            let claim = Asset::new(
                calculate_curation_payout(
                    curators_reward.amount,
                    comment.total_vote_weight,
                    weight,
                )?,
                symbol,
            );
            if !claim.is_positive() {
                continue;
            }
            unclaimed = (unclaimed - claim)?;
            pay_account(ctx, voter, claim)?;
            let curator = ctx.db.get_account_by_id(voter)?.name.clone();
            ctx.push_virtual_operation(VirtualOperation::CurationReward {
                curator,
                reward: claim,
                comment_author: comment.author.clone(),
                comment_permlink: comment.permlink.clone(),
            });
        }
    }
    *curators_reward = (*curators_reward - unclaimed)?;
    Ok(unclaimed)
}

fn pay_account(
    ctx: &mut BlockTaskContext<'_>,
    account: ObjectId<AccountObject>,
    reward: Asset,
) -> Result<()> {
    if !reward.is_positive() {
        return Ok(());
    }
    match reward.symbol {
        Symbol::Scr => ctx.db.increase_balance(account, reward),
        Symbol::Sp => ctx.db.increase_scorumpower(account, reward),
    }
}

fn close_comment_payout(
    ctx: &mut BlockTaskContext<'_>,
    id: ObjectId<CommentObject>,
    now: TimePointSec,
) -> Result<()> {
    ctx.db.update_comment(id, |c| {
        c.children_abs_rshares = 0;
        c.abs_rshares = 0;
        // curators of a later payout start from scratch
        c.total_vote_weight = 0;
        c.cashout_time = TimePointSec::MAXIMUM;
        c.last_payout = now;
    })?;
    let comment = ctx.db.get_comment_by_id(id)?;
    let op = VirtualOperation::CommentPayoutUpdate {
        author: comment.author.clone(),
        permlink: comment.permlink.clone(),
    };
    ctx.push_virtual_operation(op);
    Ok(())
}
