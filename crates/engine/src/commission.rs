//! Platform commission on bookings.
//!
//! The marketplace keeps a percentage of every booking. The rate is resolved
//! from the most specific override available:
//!
//! 1. a rate set on the booking itself,
//! 2. a rate negotiated with the guide,
//! 3. the global rate (15% by default).
//!
//! Rates are basis points (`1500` = 15%) so that the split is exact integer
//! arithmetic on cents.

use serde::{Deserialize, Serialize};

use crate::{EngineError, MoneyCents, ResultEngine, money::FULL_BPS};

/// Default global commission: 15%.
pub const DEFAULT_COMMISSION_BPS: u32 = 1500;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommissionSource {
    Global,
    GuideOverride,
    BookingOverride,
}

/// The rates that may apply to one booking.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommissionRates {
    pub global_bps: u32,
    pub guide_bps: Option<u32>,
    pub booking_bps: Option<u32>,
}

impl CommissionRates {
    #[must_use]
    pub fn global(global_bps: u32) -> Self {
        Self {
            global_bps,
            guide_bps: None,
            booking_bps: None,
        }
    }

    /// Picks the effective rate and where it came from.
    #[must_use]
    pub fn resolve(&self) -> (u32, CommissionSource) {
        if let Some(bps) = self.booking_bps {
            return (bps, CommissionSource::BookingOverride);
        }
        if let Some(bps) = self.guide_bps {
            return (bps, CommissionSource::GuideOverride);
        }
        (self.global_bps, CommissionSource::Global)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Commission {
    pub amount: MoneyCents,
    pub rate_bps: u32,
    pub commission: MoneyCents,
    /// What the guide receives: `amount - commission`.
    pub net: MoneyCents,
    pub source: CommissionSource,
}

/// Checks that a rate is a valid percentage (0..=100%).
pub fn validate_rate(bps: u32) -> ResultEngine<u32> {
    if bps > FULL_BPS {
        return Err(EngineError::Validation(format!(
            "commission rate must be between 0 and {FULL_BPS} bps, got {bps}"
        )));
    }
    Ok(bps)
}

/// Splits `amount` between the platform and the guide.
pub fn calculate(amount: MoneyCents, rates: CommissionRates) -> ResultEngine<Commission> {
    if amount.cents() < 0 {
        return Err(EngineError::Validation(
            "commission base must not be negative".to_string(),
        ));
    }
    let (rate_bps, source) = rates.resolve();
    let rate_bps = validate_rate(rate_bps)?;
    let commission = amount.apply_bps(rate_bps);
    Ok(Commission {
        amount,
        rate_bps,
        commission,
        net: amount - commission,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_rate_applies_without_overrides() {
        let c = calculate(
            MoneyCents::new(100_00),
            CommissionRates::global(DEFAULT_COMMISSION_BPS),
        )
        .unwrap();
        assert_eq!(c.commission.cents(), 15_00);
        assert_eq!(c.net.cents(), 85_00);
        assert_eq!(c.source, CommissionSource::Global);
    }

    #[test]
    fn booking_override_beats_guide_override() {
        let rates = CommissionRates {
            global_bps: 1500,
            guide_bps: Some(1000),
            booking_bps: Some(500),
        };
        let c = calculate(MoneyCents::new(200_00), rates).unwrap();
        assert_eq!(c.rate_bps, 500);
        assert_eq!(c.commission.cents(), 10_00);
        assert_eq!(c.source, CommissionSource::BookingOverride);

        let rates = CommissionRates {
            booking_bps: None,
            ..rates
        };
        let c = calculate(MoneyCents::new(200_00), rates).unwrap();
        assert_eq!(c.rate_bps, 1000);
        assert_eq!(c.source, CommissionSource::GuideOverride);
    }

    #[test]
    fn rejects_rates_above_hundred_percent() {
        assert!(validate_rate(10_001).is_err());
        let rates = CommissionRates {
            global_bps: 1500,
            guide_bps: Some(20_000),
            booking_bps: None,
        };
        assert!(calculate(MoneyCents::new(100), rates).is_err());
    }

    #[test]
    fn commission_and_net_always_sum_to_amount() {
        for cents in [0, 1, 333, 999, 12_345] {
            let c = calculate(MoneyCents::new(cents), CommissionRates::global(1500)).unwrap();
            assert_eq!(c.commission.cents() + c.net.cents(), cents);
        }
    }
}
