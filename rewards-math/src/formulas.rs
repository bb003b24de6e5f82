use crate::curve::CurveId;
use crate::{Percent, PERCENT_100};
use primitive_types::U256;
use std::cmp;
use thiserror::Error;

const SECONDS_PER_DAY: u64 = 60 * 60 * 24;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    #[error("time went backwards: {now} is before {last}")]
    TimeWentBackwards { now: u32, last: u32 },
    #[error("time window must be positive")]
    ZeroWindow,
    #[error("reward shares must be positive, got {0}")]
    NonPositiveShares(i64),
    #[error("total claims must be positive")]
    ZeroTotalClaims,
    #[error("total curation weight must be positive")]
    ZeroTotalWeight,
    #[error("payout does not fit a share amount")]
    PayoutOverflow,
    #[error("positive shares must grow: {positive} <= {recent}")]
    SharesNotIncreasing { positive: i64, recent: i64 },
    #[error("vote rate must be positive")]
    ZeroVoteRate,
}

fn elapsed(now: u32, last: u32) -> Result<u32, FormulaError> {
    now.checked_sub(last)
        .ok_or(FormulaError::TimeWentBackwards { now, last })
}

/// Decay `recent_claims` by the time elapsed since the last payout check
/// and add the claims of every comment about to be paid.
///
/// Decay is linear over `decay_seconds` and never goes below zero.
pub fn calculate_total_claims(
    recent_claims: u128,
    now: u32,
    last_payout_check: u32,
    curve: CurveId,
    rshares: &[i64],
    decay_seconds: u32,
) -> Result<u128, FormulaError> {
    let elapsed = elapsed(now, last_payout_check)?;
    if decay_seconds == 0 {
        return Err(FormulaError::ZeroWindow);
    }

    let decayed = U256::from(recent_claims) * U256::from(elapsed) / U256::from(decay_seconds);
    let mut total_claims = if decayed >= U256::from(recent_claims) {
        0
    } else {
        recent_claims - decayed.low_u128()
    };

    for shares in rshares {
        total_claims = total_claims.saturating_add(curve.evaluate(*shares));
    }
    Ok(total_claims)
}

/// Share of `reward_fund` earned by `rshares` out of `total_claims`.
///
/// Payouts below `min_comment_payout_share` are zeroed, and the result
/// never exceeds `max_payout`.
pub fn calculate_payout(
    rshares: i64,
    total_claims: u128,
    reward_fund: i64,
    curve: CurveId,
    max_payout: i64,
    min_comment_payout_share: i64,
) -> Result<i64, FormulaError> {
    if rshares <= 0 {
        return Err(FormulaError::NonPositiveShares(rshares));
    }
    if total_claims == 0 {
        return Err(FormulaError::ZeroTotalClaims);
    }

    let fund = U256::from(cmp::max(reward_fund, 0) as u64);
    let claim = U256::from(curve.evaluate(rshares));
    let payout = fund * claim / U256::from(total_claims);
    if payout > U256::from(i64::MAX as u64) {
        return Err(FormulaError::PayoutOverflow);
    }
    let mut payout = payout.low_u64() as i64;

    if payout < min_comment_payout_share {
        payout = 0;
    }
    Ok(cmp::min(payout, max_payout))
}

/// Payout of a single comment if it was the only one cashed out now.
pub fn predict_payout(
    recent_claims: u128,
    reward_fund: i64,
    rshares: i64,
    curve: CurveId,
    max_payout: i64,
    decay_seconds: u32,
    min_comment_payout_share: i64,
) -> Result<i64, FormulaError> {
    let total_claims =
        calculate_total_claims(recent_claims, 0, 0, curve, &[rshares], decay_seconds)?;
    calculate_payout(
        rshares,
        total_claims,
        reward_fund,
        curve,
        max_payout,
        min_comment_payout_share,
    )
}

/// Part of a comment payout going to its curators.
pub fn calculate_curations_payout(payout: i64, curation_percent: Percent) -> i64 {
    (payout as i128 * curation_percent as i128 / PERCENT_100 as i128) as i64
}

/// Part of the curators' payout going to one vote of `weight`.
pub fn calculate_curation_payout(
    curations_payout: i64,
    total_weight: u64,
    weight: u64,
) -> Result<i64, FormulaError> {
    if total_weight == 0 {
        return Err(FormulaError::ZeroTotalWeight);
    }
    Ok((weight as u128 * curations_payout as u128 / total_weight as u128) as i64)
}

/// Curation weight added by the growth of the comment positive shares
/// from `recent_positive_rshares` to `positive_rshares`.
pub fn calculate_max_vote_weight(
    positive_rshares: i64,
    recent_positive_rshares: i64,
    curve: CurveId,
) -> Result<u64, FormulaError> {
    if positive_rshares <= recent_positive_rshares {
        return Err(FormulaError::SharesNotIncreasing {
            positive: positive_rshares,
            recent: recent_positive_rshares,
        });
    }
    let grown = curve.evaluate(positive_rshares) - curve.evaluate(recent_positive_rshares);
    Ok(cmp::min(grown, u64::MAX as u128) as u64)
}

/// Discount `max_vote_weight` linearly while the comment is younger than
/// the reverse auction window.
pub fn calculate_vote_weight(
    max_vote_weight: u64,
    now: u32,
    comment_created: u32,
    reverse_auction_seconds: u32,
) -> Result<u64, FormulaError> {
    let age = elapsed(now, comment_created)?;
    if reverse_auction_seconds == 0 {
        return Err(FormulaError::ZeroWindow);
    }
    let delta = cmp::min(age, reverse_auction_seconds);
    Ok((max_vote_weight as u128 * delta as u128 / reverse_auction_seconds as u128) as u64)
}

/// Voting power regenerated since the last vote, capped at 100%.
pub fn calculate_restoring_power(
    voting_power: Percent,
    now: u32,
    last_voted: u32,
    regeneration_seconds: u32,
) -> Result<Percent, FormulaError> {
    let elapsed = elapsed(now, last_voted)?;
    if regeneration_seconds == 0 {
        return Err(FormulaError::ZeroWindow);
    }
    let regenerated = PERCENT_100 as u64 * elapsed as u64 / regeneration_seconds as u64;
    Ok(cmp::min(voting_power as u64 + regenerated, PERCENT_100 as u64) as Percent)
}

/// Voting power consumed by a vote of `vote_weight`, rounded up.
///
/// A full weight vote at full power consumes `1 / (rate * regeneration
/// days)` of the power, so `rate` full votes a day are sustainable.
pub fn calculate_used_power(
    voting_power: Percent,
    vote_weight: i16,
    max_votes_per_day_rate: u16,
    regeneration_seconds: u32,
) -> Result<Percent, FormulaError> {
    let abs_weight = (vote_weight as i64).abs() as u64;
    let used_power = voting_power as u64 * abs_weight / PERCENT_100 as u64;

    let max_vote_denom =
        max_votes_per_day_rate as u64 * regeneration_seconds as u64 / SECONDS_PER_DAY;
    if max_vote_denom == 0 {
        return Err(FormulaError::ZeroVoteRate);
    }

    Ok(((used_power + max_vote_denom - 1) / max_vote_denom) as Percent)
}

/// Absolute reward shares of a vote using `used_voting_power` of
/// `effective_shares`.
pub fn calculate_abs_reward_shares(used_voting_power: Percent, effective_shares: i64) -> i64 {
    (cmp::max(effective_shares, 0) as u128 * used_voting_power as u128 / PERCENT_100 as u128) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::TestResult;
    use quickcheck_macros::quickcheck;

    const DECAY: u32 = 15 * 24 * 3600;
    const REGENERATION: u32 = 5 * 24 * 3600;

    #[test]
    fn single_claimant_takes_whole_fund() {
        let rshares = 1_000_000;
        let total_claims =
            calculate_total_claims(0, 10, 10, CurveId::Linear, &[rshares], DECAY).unwrap();
        assert_eq!(total_claims, rshares as u128);

        let payout =
            calculate_payout(rshares, total_claims, 500, CurveId::Linear, i64::MAX, 0).unwrap();
        assert_eq!(payout, 500);

        let curators = calculate_curations_payout(payout, 2500);
        assert_eq!(curators, 125);
        assert_eq!(payout - curators, 375);
    }

    #[test]
    fn predicted_payout_is_capped() {
        let fund = 100_000_000_000_000;
        assert_eq!(
            predict_payout(0, fund, 2222, CurveId::Linear, fund / 2, DECAY, 0),
            Ok(fund / 2)
        );
        assert_eq!(
            predict_payout(0, fund, 2222, CurveId::Linear, fund * 2, DECAY, 0),
            Ok(fund)
        );
    }

    #[test]
    fn claims_decay_linearly() {
        let claims = calculate_total_claims(1000, DECAY / 2, 0, CurveId::Linear, &[], DECAY);
        assert_eq!(claims, Ok(500));
        let claims = calculate_total_claims(1000, DECAY * 3, 0, CurveId::Linear, &[], DECAY);
        assert_eq!(claims, Ok(0));
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        assert_eq!(
            calculate_total_claims(0, 1, 2, CurveId::Linear, &[], DECAY),
            Err(FormulaError::TimeWentBackwards { now: 1, last: 2 })
        );
        assert_eq!(
            calculate_total_claims(0, 1, 1, CurveId::Linear, &[], 0),
            Err(FormulaError::ZeroWindow)
        );
        assert_eq!(
            calculate_payout(0, 1, 1, CurveId::Linear, 1, 0),
            Err(FormulaError::NonPositiveShares(0))
        );
        assert_eq!(
            calculate_payout(1, 0, 1, CurveId::Linear, 1, 0),
            Err(FormulaError::ZeroTotalClaims)
        );
        assert_eq!(
            calculate_curation_payout(1, 0, 1),
            Err(FormulaError::ZeroTotalWeight)
        );
    }

    #[test]
    fn voting_power_regenerates() {
        assert_eq!(
            calculate_restoring_power(0, REGENERATION / 2, 0, REGENERATION),
            Ok(5000)
        );
        assert_eq!(
            calculate_restoring_power(9000, REGENERATION, 0, REGENERATION),
            Ok(PERCENT_100)
        );
    }

    #[test]
    fn full_vote_uses_two_percent() {
        // 10 votes a day over a 5 days regeneration
        assert_eq!(
            calculate_used_power(PERCENT_100, 10000, 10, REGENERATION),
            Ok(200)
        );
        assert_eq!(calculate_used_power(PERCENT_100, -10000, 10, REGENERATION), Ok(200));
        assert_eq!(calculate_used_power(PERCENT_100, 1, 10, REGENERATION), Ok(1));
        assert_eq!(
            calculate_used_power(PERCENT_100, 10000, 0, REGENERATION),
            Err(FormulaError::ZeroVoteRate)
        );
    }

    #[test]
    fn vote_weight_reverse_auction() {
        assert_eq!(calculate_vote_weight(1000, 100, 100, 1800), Ok(0));
        assert_eq!(calculate_vote_weight(1000, 1000, 100, 1800), Ok(500));
        assert_eq!(calculate_vote_weight(1000, 10_000, 100, 1800), Ok(1000));
    }

    #[test]
    fn max_vote_weight_requires_growth() {
        assert_eq!(calculate_max_vote_weight(10, 4, CurveId::Linear), Ok(6));
        assert!(calculate_max_vote_weight(4, 4, CurveId::Linear).is_err());
    }

    #[quickcheck]
    fn payout_is_monotonic_and_capped(
        curve: crate::CurveId,
        a: u32,
        b: u32,
        fund: u32,
        max_payout: u32,
    ) -> TestResult {
        if a == 0 || b == 0 {
            return TestResult::discard();
        }
        let (lo, hi) = if a <= b { (a as i64, b as i64) } else { (b as i64, a as i64) };
        let total_claims =
            calculate_total_claims(0, 0, 0, curve, &[lo, hi], DECAY).unwrap();
        let low = calculate_payout(lo, total_claims, fund as i64, curve, max_payout as i64, 0).unwrap();
        let high =
            calculate_payout(hi, total_claims, fund as i64, curve, max_payout as i64, 0).unwrap();
        TestResult::from_bool(low <= high && high <= max_payout as i64)
    }

    #[quickcheck]
    fn dust_payout_is_zero(rshares: u32, total_extra: u32, fund: u32, min_share: u32) -> TestResult {
        if rshares == 0 {
            return TestResult::discard();
        }
        let total_claims = rshares as u128 + total_extra as u128;
        let raw = fund as u128 * rshares as u128 / total_claims;
        let payout = calculate_payout(
            rshares as i64,
            total_claims,
            fund as i64,
            CurveId::Linear,
            i64::MAX,
            min_share as i64,
        )
        .unwrap();
        if raw < min_share as u128 {
            TestResult::from_bool(payout == 0)
        } else {
            TestResult::from_bool(payout as u128 == raw)
        }
    }

    #[quickcheck]
    fn curation_split_never_exceeds_payout(payout: u32, percent: u16) -> TestResult {
        if percent > PERCENT_100 {
            return TestResult::discard();
        }
        let curators = calculate_curations_payout(payout as i64, percent);
        TestResult::from_bool(curators >= 0 && curators <= payout as i64)
    }
}
