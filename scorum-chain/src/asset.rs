use crate::Percent;
use rewards_math::PERCENT_100;
use serde_derive::{Deserialize, Serialize};
use std::fmt;
use std::ops;
use std::str::FromStr;
use thiserror::Error;

/// Number of decimals of both currencies.
pub const PRECISION: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Symbol {
    /// Liquid currency.
    Scr,
    /// Staked currency, scorumpower.
    Sp,
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Scr => f.write_str("SCR"),
            Symbol::Sp => f.write_str("SP"),
        }
    }
}

impl FromStr for Symbol {
    type Err = AssetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SCR" => Ok(Symbol::Scr),
            "SP" => Ok(Symbol::Sp),
            other => Err(AssetError::UnknownSymbol(other.to_owned())),
        }
    }
}

/// Amount of one of the chain currencies, in its smallest unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Asset {
    pub amount: i64,
    pub symbol: Symbol,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    #[error("cannot mix {left} and {right}")]
    SymbolMismatch { left: Symbol, right: Symbol },
    #[error("negative amount")]
    NegativeAmount,
    #[error("amount overflow")]
    Overflow,
    #[error("unknown asset symbol '{0}'")]
    UnknownSymbol(String),
    #[error("malformed asset '{0}'")]
    Malformed(String),
}

impl Asset {
    pub const fn new(amount: i64, symbol: Symbol) -> Self {
        Asset { amount, symbol }
    }

    pub const fn scr(amount: i64) -> Self {
        Asset::new(amount, Symbol::Scr)
    }

    pub const fn sp(amount: i64) -> Self {
        Asset::new(amount, Symbol::Sp)
    }

    pub const fn zero(symbol: Symbol) -> Self {
        Asset::new(0, symbol)
    }

    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }

    pub fn is_positive(&self) -> bool {
        self.amount > 0
    }

    /// Same amount in the other currency, conversion is 1:1.
    pub fn convert(self, symbol: Symbol) -> Self {
        Asset::new(self.amount, symbol)
    }

    /// `self * percent / 100%`, rounded down.
    pub fn percent(self, percent: Percent) -> Self {
        let amount = self.amount as i128 * percent as i128 / PERCENT_100 as i128;
        Asset::new(amount as i64, self.symbol)
    }

    /// `self * numerator / denominator`, rounded down. A zero denominator
    /// yields zero.
    pub fn fraction(self, numerator: u128, denominator: u128) -> Self {
        if denominator == 0 || self.amount <= 0 {
            return Asset::zero(self.symbol);
        }
        let amount = self.amount as u128 * numerator / denominator;
        Asset::new(amount.min(i64::MAX as u128) as i64, self.symbol)
    }

    pub fn min(self, other: Asset) -> Self {
        if other.amount < self.amount {
            Asset::new(other.amount, self.symbol)
        } else {
            self
        }
    }

    fn same_symbol(self, other: Asset) -> Result<(), AssetError> {
        if self.symbol == other.symbol {
            Ok(())
        } else {
            Err(AssetError::SymbolMismatch {
                left: self.symbol,
                right: other.symbol,
            })
        }
    }

    /// Add with the sign of `delta` allowed to be negative, the result must
    /// not be.
    pub fn checked_adjust(self, delta: Asset) -> Result<Asset, AssetError> {
        self.same_symbol(delta)?;
        let amount = self
            .amount
            .checked_add(delta.amount)
            .ok_or(AssetError::Overflow)?;
        if amount < 0 {
            return Err(AssetError::NegativeAmount);
        }
        Ok(Asset::new(amount, self.symbol))
    }

    pub fn sum<I>(symbol: Symbol, values: I) -> Result<Self, AssetError>
    where
        I: Iterator<Item = Self>,
    {
        values.fold(Ok(Asset::zero(symbol)), |acc, v| acc? + v)
    }
}

impl ops::Add for Asset {
    type Output = Result<Asset, AssetError>;

    fn add(self, other: Asset) -> Self::Output {
        self.same_symbol(other)?;
        self.amount
            .checked_add(other.amount)
            .map(|amount| Asset::new(amount, self.symbol))
            .ok_or(AssetError::Overflow)
    }
}

impl ops::Sub for Asset {
    type Output = Result<Asset, AssetError>;

    fn sub(self, other: Asset) -> Self::Output {
        self.same_symbol(other)?;
        match self.amount.checked_sub(other.amount) {
            Some(amount) if amount >= 0 => Ok(Asset::new(amount, self.symbol)),
            Some(_) => Err(AssetError::NegativeAmount),
            None => Err(AssetError::Overflow),
        }
    }
}

impl ops::Neg for Asset {
    type Output = Asset;

    fn neg(self) -> Asset {
        Asset::new(-self.amount, self.symbol)
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scale = 10i64.pow(PRECISION);
        let sign = if self.amount < 0 { "-" } else { "" };
        let abs = (self.amount as i128).abs();
        write!(
            f,
            "{}{}.{:03} {}",
            sign,
            abs / scale as i128,
            abs % scale as i128,
            self.symbol
        )
    }
}

impl FromStr for Asset {
    type Err = AssetError;

    /// Parse the `Display` form, e.g. `"12.500 SCR"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || AssetError::Malformed(s.to_owned());
        let mut parts = s.trim().split_whitespace();
        let number = parts.next().ok_or_else(malformed)?;
        let symbol: Symbol = parts.next().ok_or_else(malformed)?.parse()?;
        if parts.next().is_some() {
            return Err(malformed());
        }

        let (negative, number) = match number.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, number),
        };
        let (units, decimals) = match number.split_once('.') {
            Some((units, decimals)) if decimals.len() == PRECISION as usize => (units, decimals),
            Some(_) => return Err(malformed()),
            None => (number, "000"),
        };
        let units: i64 = units.parse().map_err(|_| malformed())?;
        let decimals: i64 = decimals.parse().map_err(|_| malformed())?;
        let amount = units
            .checked_mul(10i64.pow(PRECISION))
            .and_then(|v| v.checked_add(decimals))
            .ok_or(AssetError::Overflow)?;
        Ok(Asset::new(if negative { -amount } else { amount }, symbol))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::{Arbitrary, Gen};
    use quickcheck_macros::quickcheck;

    impl Arbitrary for Symbol {
        fn arbitrary<G: Gen>(g: &mut G) -> Self {
            if bool::arbitrary(g) {
                Symbol::Scr
            } else {
                Symbol::Sp
            }
        }
    }

    impl Arbitrary for Asset {
        fn arbitrary<G: Gen>(g: &mut G) -> Self {
            Asset::new(u32::arbitrary(g) as i64, Symbol::arbitrary(g))
        }
    }

    #[test]
    fn symbols_do_not_mix() {
        assert_eq!(
            Asset::scr(1) + Asset::sp(1),
            Err(AssetError::SymbolMismatch {
                left: Symbol::Scr,
                right: Symbol::Sp
            })
        );
    }

    #[test]
    fn subtraction_never_goes_negative() {
        assert_eq!(Asset::scr(1) - Asset::scr(2), Err(AssetError::NegativeAmount));
        assert_eq!(Asset::scr(2) - Asset::scr(2), Ok(Asset::scr(0)));
        assert_eq!(
            Asset::scr(1).checked_adjust(Asset::scr(-2)),
            Err(AssetError::NegativeAmount)
        );
    }

    #[test]
    fn display_and_parse() {
        assert_eq!(Asset::scr(12_500).to_string(), "12.500 SCR");
        assert_eq!(Asset::sp(-5).to_string(), "-0.005 SP");
        assert_eq!("12.500 SCR".parse::<Asset>(), Ok(Asset::scr(12_500)));
        assert_eq!("7 SP".parse::<Asset>(), Ok(Asset::sp(7_000)));
        assert!("1.5 SCR".parse::<Asset>().is_err());
        assert!("1.500 BTC".parse::<Asset>().is_err());
    }

    #[test]
    fn percent_rounds_down() {
        assert_eq!(Asset::scr(999).percent(5000), Asset::scr(499));
        assert_eq!(Asset::scr(1000).fraction(1, 3), Asset::scr(333));
        assert_eq!(Asset::scr(1000).fraction(1, 0), Asset::scr(0));
    }

    #[quickcheck]
    fn percent_parts_add_up(asset: Asset, percent: u16) -> bool {
        let percent = percent % (PERCENT_100 + 1);
        let part = asset.percent(percent);
        let rest = (asset - part).unwrap();
        (part + rest) == Ok(asset)
    }
}
