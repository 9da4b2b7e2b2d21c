//! Command structs for engine operations.
//!
//! These types group parameters for write operations and list filters,
//! keeping call sites readable and avoiding long argument lists. Patch types
//! use `None` for "leave unchanged".

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    AuditAction, AuditEntity, BookingStatus, Currency, Difficulty, ExpeditionStatus, MediaKind,
    PaymentMethod, Role,
};

/// Reserve `headcount` seats on an expedition.
#[derive(Clone, Debug)]
pub struct ReserveCmd {
    pub expedition_id: Uuid,
    pub headcount: i32,
    pub notes: Option<String>,
}

impl ReserveCmd {
    #[must_use]
    pub fn new(expedition_id: Uuid, headcount: i32) -> Self {
        Self {
            expedition_id,
            headcount,
            notes: None,
        }
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct BookingPatch {
    pub status: Option<BookingStatus>,
    pub notes: Option<String>,
    /// `Some(None)` clears the override.
    pub commission_rate_bps: Option<Option<u32>>,
}

impl BookingPatch {
    pub(crate) fn is_empty(&self) -> bool {
        self.status.is_none() && self.notes.is_none() && self.commission_rate_bps.is_none()
    }
}

#[derive(Clone, Debug, Default)]
pub struct BookingFilter {
    pub expedition_id: Option<Uuid>,
    pub trekker_id: Option<Uuid>,
    pub status: Option<BookingStatus>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Clone, Debug)]
pub struct SignupCmd {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub cadastur: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub password: Option<String>,
    pub bio: Option<String>,
    pub phone: Option<String>,
    pub cadastur: Option<String>,
    /// Admin only.
    pub role: Option<Role>,
    /// Admin only. `Some(None)` clears the guide override.
    pub commission_rate_bps: Option<Option<u32>>,
}

#[derive(Clone, Debug)]
pub struct TrailNew {
    pub name: String,
    pub state: String,
    pub city: String,
    pub region_or_park: String,
    pub distance_meters: i64,
    pub elevation_gain_m: i32,
    pub difficulty: Difficulty,
    pub requires_guide: bool,
    pub entry_fee_cents: Option<i64>,
    pub description: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct TrailPatch {
    pub name: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub region_or_park: Option<String>,
    pub distance_meters: Option<i64>,
    pub elevation_gain_m: Option<i32>,
    pub difficulty: Option<Difficulty>,
    pub requires_guide: Option<bool>,
    pub entry_fee_cents: Option<Option<i64>>,
    pub description: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct TrailFilter {
    pub state: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Clone, Debug)]
pub struct ExpeditionNew {
    pub trail_id: Uuid,
    /// Only honoured for admins; guides always lead their own expeditions.
    pub guide_id: Option<Uuid>,
    pub title: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub price_per_person_cents: i64,
    pub max_people: i32,
    pub currency: Currency,
    pub status: ExpeditionStatus,
    pub description: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct ExpeditionPatch {
    pub title: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub price_per_person_cents: Option<i64>,
    pub max_people: Option<i32>,
    pub status: Option<ExpeditionStatus>,
    pub description: Option<String>,
}

/// `from` is inclusive and `to` is exclusive (`[from, to)`) on `start_date`.
#[derive(Clone, Debug, Default)]
pub struct ExpeditionFilter {
    pub trail_id: Option<Uuid>,
    pub guide_id: Option<Uuid>,
    pub status: Option<ExpeditionStatus>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Clone, Debug)]
pub struct ReviewNew {
    pub trail_id: Option<Uuid>,
    pub expedition_id: Option<Uuid>,
    pub rating: i32,
    pub comment: Option<String>,
}

#[derive(Clone, Debug)]
pub struct MediaNew {
    pub trail_id: Option<Uuid>,
    pub expedition_id: Option<Uuid>,
    pub url: String,
    pub kind: MediaKind,
    pub caption: Option<String>,
}

/// One page of a list operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
}

impl<T> Page<T> {
    #[must_use]
    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(self.page_size.max(1))
    }
}

#[derive(Clone, Debug, Default)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

/// Records money received for a booking.
#[derive(Clone, Debug, Default)]
pub struct PaymentCapture {
    pub method: PaymentMethod,
    pub reference: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct PaymentRefund {
    pub reason: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct AuditFilter {
    pub entity: Option<AuditEntity>,
    pub entity_id: Option<Uuid>,
    pub action: Option<AuditAction>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}
