//! Refund policy for cancelled bookings.
//!
//! The refunded share depends on how long before the expedition starts the
//! cancellation happens. Windows are checked in order and the first one whose
//! threshold is met wins.

use chrono::{DateTime, Utc};

use crate::{MoneyCents, money::FULL_BPS};

/// One refund window: cancelling at least `min_hours` before the start
/// refunds `refund_bps` of the amount.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RefundWindow {
    pub min_hours: i64,
    pub refund_bps: u32,
}

/// Default policy: 100% up to 48h before, 50% up to 24h before, nothing after.
pub const DEFAULT_REFUND_WINDOWS: [RefundWindow; 3] = [
    RefundWindow {
        min_hours: 48,
        refund_bps: FULL_BPS,
    },
    RefundWindow {
        min_hours: 24,
        refund_bps: FULL_BPS / 2,
    },
    RefundWindow {
        min_hours: 0,
        refund_bps: 0,
    },
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RefundQuote {
    pub amount: MoneyCents,
    /// Whole minutes between the request and the start, negative once started.
    pub minutes_until_start: i64,
    pub refund_bps: u32,
    pub refund: MoneyCents,
    pub retained: MoneyCents,
    pub window: Option<RefundWindow>,
}

/// Computes the refund of `amount` for a cancellation requested at
/// `requested_at` on an expedition starting at `starts_at`.
#[must_use]
pub fn calculate(
    amount: MoneyCents,
    starts_at: DateTime<Utc>,
    requested_at: DateTime<Utc>,
) -> RefundQuote {
    calculate_with(&DEFAULT_REFUND_WINDOWS, amount, starts_at, requested_at)
}

#[must_use]
pub fn calculate_with(
    windows: &[RefundWindow],
    amount: MoneyCents,
    starts_at: DateTime<Utc>,
    requested_at: DateTime<Utc>,
) -> RefundQuote {
    let minutes_until_start = (starts_at - requested_at).num_minutes();

    let window = windows
        .iter()
        .copied()
        .find(|w| minutes_until_start >= w.min_hours * 60);
    let refund_bps = window.map_or(0, |w| w.refund_bps.min(FULL_BPS));
    let refund = amount.apply_bps(refund_bps);

    RefundQuote {
        amount,
        minutes_until_start,
        refund_bps,
        refund,
        retained: amount - refund,
        window,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 7, 10, 6, 0, 0).unwrap()
    }

    #[test]
    fn full_refund_at_least_48h_before() {
        let q = calculate(MoneyCents::new(300_00), start(), start() - Duration::hours(48));
        assert_eq!(q.refund.cents(), 300_00);
        assert_eq!(q.retained.cents(), 0);
        assert_eq!(q.minutes_until_start, 48 * 60);
    }

    #[test]
    fn half_refund_between_24h_and_48h() {
        let q = calculate(
            MoneyCents::new(300_00),
            start(),
            start() - Duration::hours(47) - Duration::minutes(59),
        );
        assert_eq!(q.refund_bps, 5000);
        assert_eq!(q.refund.cents(), 150_00);
        assert_eq!(q.retained.cents(), 150_00);
    }

    #[test]
    fn nothing_back_on_the_last_day_or_after_start() {
        let q = calculate(MoneyCents::new(300_00), start(), start() - Duration::hours(23));
        assert_eq!(q.refund.cents(), 0);

        let q = calculate(MoneyCents::new(300_00), start(), start() + Duration::hours(1));
        assert_eq!(q.refund.cents(), 0);
        assert!(q.window.is_none());
        assert_eq!(q.retained.cents(), 300_00);
    }
}
