//! Reward arithmetic of the chain.
//!
//! Pure functions only: reward shares to claims through a [`CurveId`],
//! claims to payouts out of a reward fund, curation weights and voting
//! power. Intermediate products are computed on 256 bits so none of them
//! can overflow.
#[cfg(test)]
extern crate quickcheck;
#[cfg(test)]
#[macro_use(quickcheck)]
extern crate quickcheck_macros;

mod curve;
mod formulas;

pub use curve::{CurveId, CONTENT_CONSTANT};
pub use formulas::*;

/// Hundredths of a percent.
pub type Percent = u16;

pub const PERCENT_1: Percent = 100;
pub const PERCENT_100: Percent = 100 * PERCENT_1;
