//! Platform-wide counters for the admin dashboard.

use crate::{Currency, MoneyCents};

/// Bookings per status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BookingCounts {
    pub pending: u64,
    pub confirmed: u64,
    pub cancelled: u64,
    pub refunded: u64,
}

/// Captured money in one currency.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Revenue {
    pub currency: Currency,
    /// Sum of captured payments, refunded or not.
    pub gross: MoneyCents,
    /// Commission kept on payments that were not refunded.
    pub fees: MoneyCents,
    pub refunded: MoneyCents,
    /// `gross - refunded`.
    pub net: MoneyCents,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DashboardMetrics {
    pub users: u64,
    pub trails: u64,
    pub guides_verified: u64,
    pub guides_pending: u64,
    /// Expeditions currently accepting bookings.
    pub open_expeditions: u64,
    pub bookings: BookingCounts,
    /// One entry per currency with captured payments, ordered by code.
    pub revenue: Vec<Revenue>,
}
