use std::{
    fmt,
    ops::{Add, Sub},
    str::FromStr,
};

use crate::EngineError;

/// Basis points in 100%.
pub const FULL_BPS: u32 = 10_000;

/// Money amount represented as **integer cents** (minor units).
///
/// Prices, booking totals, commissions and refunds all go through this type so
/// percentages are applied with integer arithmetic and never drift.
///
/// # Examples
///
/// ```rust
/// use engine::MoneyCents;
///
/// let price = MoneyCents::new(150_00);
/// assert_eq!(price.to_string(), "150.00");
/// assert_eq!(price.apply_bps(1500).cents(), 22_50);
/// ```
///
/// Parsing from user input (accepts `.` or `,` as decimal separator; rejects >
/// 2 decimals):
///
/// ```rust
/// use engine::MoneyCents;
///
/// assert_eq!("150".parse::<MoneyCents>().unwrap().cents(), 15000);
/// assert_eq!("89,9".parse::<MoneyCents>().unwrap().cents(), 8990);
/// assert!("12.345".parse::<MoneyCents>().is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct MoneyCents(i64);

impl MoneyCents {
    pub const ZERO: MoneyCents = MoneyCents(0);

    /// Creates a new amount from integer cents.
    #[must_use]
    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    /// Returns the raw value in cents.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Multiplies a unit price by a quantity (returns `None` on overflow).
    #[must_use]
    pub fn checked_mul(self, quantity: i64) -> Option<MoneyCents> {
        self.0.checked_mul(quantity).map(MoneyCents)
    }

    /// Applies a rate expressed in basis points, rounding half away from zero.
    ///
    /// `apply_bps(10_000)` returns the amount unchanged, `apply_bps(0)` zero.
    #[must_use]
    pub fn apply_bps(self, bps: u32) -> MoneyCents {
        let scaled = i128::from(self.0) * i128::from(bps);
        let full = i128::from(FULL_BPS);
        let half = full / 2;
        let rounded = if scaled >= 0 {
            (scaled + half) / full
        } else {
            (scaled - half) / full
        };
        // |rounded| <= |self.0| because bps is capped by callers at FULL_BPS.
        MoneyCents(i64::try_from(rounded).unwrap_or(self.0))
    }
}

impl fmt::Display for MoneyCents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl From<i64> for MoneyCents {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<MoneyCents> for i64 {
    fn from(value: MoneyCents) -> Self {
        value.0
    }
}

impl Add for MoneyCents {
    type Output = MoneyCents;

    fn add(self, rhs: MoneyCents) -> Self::Output {
        MoneyCents(self.0 + rhs.0)
    }
}

impl Sub for MoneyCents {
    type Output = MoneyCents;

    fn sub(self, rhs: MoneyCents) -> Self::Output {
        MoneyCents(self.0 - rhs.0)
    }
}

impl FromStr for MoneyCents {
    type Err = EngineError;

    /// Parses a non-negative decimal price into cents.
    ///
    /// Accepts `.` or `,` as decimal separator. Prices are never negative, so
    /// a sign is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |why: &str| EngineError::Validation(format!("invalid amount: {why}"));

        let normalized = s.trim().replace(',', ".");
        if normalized.is_empty() {
            return Err(invalid("empty"));
        }

        let (units, fraction) = match normalized.split_once('.') {
            Some((units, fraction)) => (units, fraction),
            None => (normalized.as_str(), ""),
        };
        let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        if units.is_empty() || !all_digits(units) || !all_digits(fraction) {
            return Err(invalid("not a number"));
        }

        let fraction_cents: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| invalid("not a number"))? * 10,
            2 => fraction.parse::<i64>().map_err(|_| invalid("not a number"))?,
            _ => return Err(invalid("too many decimals")),
        };

        units
            .parse::<i64>()
            .ok()
            .and_then(|units| units.checked_mul(100))
            .and_then(|cents| cents.checked_add(fraction_cents))
            .map(MoneyCents)
            .ok_or_else(|| invalid("too large"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_two_decimals() {
        assert_eq!(MoneyCents::new(0).to_string(), "0.00");
        assert_eq!(MoneyCents::new(7).to_string(), "0.07");
        assert_eq!(MoneyCents::new(15050).to_string(), "150.50");
        assert_eq!(MoneyCents::new(-1050).to_string(), "-10.50");
    }

    #[test]
    fn parse_accepts_dot_or_comma() {
        assert_eq!("10".parse::<MoneyCents>().unwrap().cents(), 1000);
        assert_eq!("10.5".parse::<MoneyCents>().unwrap().cents(), 1050);
        assert_eq!("10,50".parse::<MoneyCents>().unwrap().cents(), 1050);
        assert_eq!("  2.30 ".parse::<MoneyCents>().unwrap().cents(), 230);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("12.345".parse::<MoneyCents>().is_err());
        assert!("-5".parse::<MoneyCents>().is_err());
        assert!("1.2.3".parse::<MoneyCents>().is_err());
        assert!("".parse::<MoneyCents>().is_err());
    }

    #[test]
    fn apply_bps_rounds_half_up() {
        assert_eq!(MoneyCents::new(10_000).apply_bps(1500).cents(), 1500);
        // 333 * 0.15 = 49.95 -> 50
        assert_eq!(MoneyCents::new(333).apply_bps(1500).cents(), 50);
        assert_eq!(MoneyCents::new(999).apply_bps(FULL_BPS).cents(), 999);
        assert_eq!(MoneyCents::new(999).apply_bps(0).cents(), 0);
    }
}
