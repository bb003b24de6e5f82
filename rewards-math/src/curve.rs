use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Offset of the quadratic curve, it flattens the curve for small claims.
pub const CONTENT_CONSTANT: u128 = 2_000_000_000_000;

/// Shape used to turn reward shares into claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveId {
    Quadratic,
    Linear,
    SquareRoot,
    Power1dot5,
}

impl CurveId {
    /// Evaluate the curve, non positive shares claim nothing.
    pub fn evaluate(self, rshares: i64) -> u128 {
        if rshares <= 0 {
            return 0;
        }
        let r = rshares as u128;
        match self {
            CurveId::Quadratic => {
                let s = CONTENT_CONSTANT;
                (r + s) * (r + s) - s * s
            }
            CurveId::Linear => r,
            CurveId::SquareRoot => isqrt(r),
            CurveId::Power1dot5 => r * isqrt(r),
        }
    }
}

impl fmt::Display for CurveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CurveId::Quadratic => "quadratic",
            CurveId::Linear => "linear",
            CurveId::SquareRoot => "square_root",
            CurveId::Power1dot5 => "power1dot5",
        };
        f.write_str(s)
    }
}

impl FromStr for CurveId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match &*s.trim().to_lowercase() {
            "quadratic" => Ok(CurveId::Quadratic),
            "linear" => Ok(CurveId::Linear),
            "square_root" => Ok(CurveId::SquareRoot),
            "power1dot5" => Ok(CurveId::Power1dot5),
            other => Err(format!("unknown reward curve '{}'", other)),
        }
    }
}

// floor(sqrt(n)), Newton iteration from above
fn isqrt(n: u128) -> u128 {
    if n < 2 {
        return n;
    }
    let mut x = n;
    let mut y = x / 2 + (x & 1);
    while y < x {
        x = y;
        y = (x + n / x) / 2;
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::{Arbitrary, Gen, TestResult};
    use quickcheck_macros::quickcheck;

    impl Arbitrary for CurveId {
        fn arbitrary<G: Gen>(g: &mut G) -> Self {
            match u8::arbitrary(g) % 4 {
                0 => CurveId::Quadratic,
                1 => CurveId::Linear,
                2 => CurveId::SquareRoot,
                _ => CurveId::Power1dot5,
            }
        }
    }

    #[test]
    fn square_roots() {
        assert_eq!(isqrt(0), 0);
        assert_eq!(isqrt(1), 1);
        assert_eq!(isqrt(15), 3);
        assert_eq!(isqrt(16), 4);
        assert_eq!(isqrt(u64::MAX as u128), u32::MAX as u128);
    }

    #[test]
    fn negative_shares_claim_nothing() {
        for curve in &[
            CurveId::Quadratic,
            CurveId::Linear,
            CurveId::SquareRoot,
            CurveId::Power1dot5,
        ] {
            assert_eq!(curve.evaluate(-5), 0);
            assert_eq!(curve.evaluate(0), 0);
        }
    }

    #[test]
    fn curve_names_round_trip() {
        let curve: CurveId = serde_yaml::from_str("power1dot5").unwrap();
        assert_eq!(curve, CurveId::Power1dot5);
        assert_eq!("square_root".parse::<CurveId>(), Ok(CurveId::SquareRoot));
        assert_eq!(CurveId::Quadratic.to_string(), "quadratic");
    }

    #[quickcheck]
    fn curves_are_monotonic(curve: CurveId, a: i64, b: i64) -> TestResult {
        if a < 0 || b < 0 {
            return TestResult::discard();
        }
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        TestResult::from_bool(curve.evaluate(lo) <= curve.evaluate(hi))
    }
}
