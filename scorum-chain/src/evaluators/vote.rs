use super::EvaluationContext;
use crate::asset::Symbol;
use crate::error::{EvaluateError, Result, ValidationError};
use crate::operations::Vote;
use crate::services::{
    AccountService, CommentService, CommentVoteService, DynamicGlobalPropertyService,
    RewardFundService,
};
use crate::time::TimePointSec;
use crate::types::Hardfork;
use crate::PERCENT_1;
use rewards_math as math;

/// Change of a comment's `net_votes` when a vote moves from `old_rshares`
/// to `new_rshares`: an upvote counts one, a flag minus one, a removed vote
/// nothing.
pub fn net_votes_delta(old_rshares: i64, new_rshares: i64) -> i32 {
    new_rshares.signum() as i32 - old_rshares.signum() as i32
}

pub(super) fn vote(ctx: &mut EvaluationContext<'_>, op: &Vote) -> Result<()> {
    let config = ctx.db.config.clone();
    let weight = if ctx.db.has_hardfork(Hardfork::HARDFORK_0_2)? {
        op.weight
    } else {
        // whole percents
        ensure!(
            (op.weight as i32).abs() <= 100,
            ValidationError::VoteWeightOutOfRange(op.weight)
        )?;
        op.weight * PERCENT_1 as i16
    };

    let voter = ctx.db.get_account(&op.voter)?.clone();
    ensure!(
        voter.can_vote,
        EvaluateError::VotingDisabled(op.voter.clone())
    )?;
    let comment = ctx.db.get_comment(&op.author, &op.permlink)?.clone();
    ensure!(!comment.is_paid(), EvaluateError::VoteAfterPayout)?;
    ensure!(
        comment.allow_votes || weight <= 0,
        EvaluateError::VotesNotAllowed
    )?;

    let now = ctx.db.head_block_time()?;
    ensure!(
        now.since(voter.last_vote_time) >= config.min_vote_interval_seconds as i64,
        EvaluateError::VoteTooFrequent
    )?;

    let current_power = math::calculate_restoring_power(
        voter.voting_power,
        now.secs(),
        voter.last_vote_time.secs(),
        config.vote_regeneration_seconds,
    )?;
    ensure!(current_power > 0, EvaluateError::NoVotingPower)?;
    let used_power = math::calculate_used_power(
        current_power,
        weight,
        config.max_votes_per_day_rate,
        config.vote_regeneration_seconds,
    )?;
    ensure!(used_power <= current_power, EvaluateError::NoVotingPower)?;

    let abs_rshares =
        math::calculate_abs_reward_shares(used_power, voter.effective_scorumpower().amount);
    ensure!(
        abs_rshares > config.vote_dust_threshold || weight == 0,
        EvaluateError::VoteDust
    )?;
    let rshares = if weight < 0 { -abs_rshares } else { abs_rshares };
    let lockout_start = comment.cashout_time.sub_seconds(config.upvote_lockout_seconds);

    match ctx
        .db
        .find_comment_vote(comment.id, voter.id)
        .map(|v| (v.id, v.rshares, v.vote_percent, v.weight, v.num_changes))
    {
        None => {
            ensure!(weight != 0, EvaluateError::ZeroWeightVote)?;
            ensure!(abs_rshares > 0, EvaluateError::VoteDust)?;
            ensure!(rshares <= 0 || now < lockout_start, EvaluateError::VoteLockout)?;

            ctx.db
                .update_voting_power(voter.id, current_power - used_power)?;
            ctx.db.update_comment(comment.id, |c| {
                c.net_rshares += rshares;
                c.abs_rshares += abs_rshares;
                if rshares > 0 {
                    c.vote_rshares += rshares;
                }
                c.net_votes += net_votes_delta(0, rshares);
            })?;
            ctx.db.update_comment(comment.root_comment, |c| {
                c.children_abs_rshares += abs_rshares
            })?;

            let eligible = rshares > 0
                && comment.last_payout == TimePointSec::MINIMUM
                && comment.allow_curation_rewards;
            let (max_vote_weight, vote_weight) = if eligible {
                let curve = ctx.db.get_reward_fund(Symbol::Scr)?.curation_reward_curve;
                let max = math::calculate_max_vote_weight(
                    comment.vote_rshares + rshares,
                    comment.vote_rshares,
                    curve,
                )?;
                let weight = math::calculate_vote_weight(
                    max,
                    now.secs(),
                    comment.created.secs(),
                    config.reverse_auction_window_seconds,
                )?;
                (max, weight)
            } else {
                (0, 0)
            };

            ctx.db.create_comment_vote(comment.id, voter.id, |v| {
                v.rshares = rshares;
                v.vote_percent = weight;
                v.weight = vote_weight;
            })?;
            if max_vote_weight > 0 {
                ctx.db
                    .update_comment(comment.id, |c| c.total_vote_weight += max_vote_weight)?;
            }
            tracing::debug!(
                voter = %op.voter,
                author = %op.author,
                permlink = %op.permlink,
                rshares,
                "vote cast"
            );
        }
        Some((id, old_rshares, old_percent, old_weight, num_changes)) => {
            ensure!(
                num_changes >= 0 && num_changes < config.max_vote_changes,
                EvaluateError::TooManyVoteChanges
            )?;
            ensure!(old_percent != weight, EvaluateError::VoteUnchanged)?;
            ensure!(
                old_rshares >= rshares || now < lockout_start,
                EvaluateError::VoteLockout
            )?;

            ctx.db
                .update_voting_power(voter.id, current_power - used_power)?;
            ctx.db.update_comment(comment.id, |c| {
                c.net_rshares += rshares - old_rshares;
                c.abs_rshares += abs_rshares;
                c.net_votes += net_votes_delta(old_rshares, rshares);
                c.total_vote_weight -= old_weight;
            })?;
            ctx.db.update_comment(comment.root_comment, |c| {
                c.children_abs_rshares += abs_rshares
            })?;
            ctx.db.update_comment_vote(id, |v| {
                v.rshares = rshares;
                v.vote_percent = weight;
                v.last_update = now;
                // a changed vote earns no curation reward
                v.weight = 0;
                v.num_changes += 1;
            })?;
            tracing::debug!(
                voter = %op.voter,
                author = %op.author,
                permlink = %op.permlink,
                rshares,
                "vote changed"
            );
        }
    }
    Ok(())
}
