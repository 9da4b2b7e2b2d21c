use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Brl,
    Usd,
    Eur,
}

/// Distinguishes a missing field (`None`) from an explicit `null`
/// (`Some(None)`) in PATCH bodies.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable machine-readable code, e.g. `CAPACITY_EXCEEDED`.
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
}

pub mod user {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum Role {
        Admin,
        Guide,
        Trekker,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Signup {
        pub name: String,
        pub email: String,
        pub password: String,
        pub role: Role,
        pub cadastur: Option<String>,
    }

    /// A user as returned by the API. Never carries the password.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct User {
        pub id: Uuid,
        pub email: String,
        pub name: String,
        pub role: Role,
        pub cadastur: Option<String>,
        pub cadastur_verified: bool,
        pub commission_rate_bps: Option<u32>,
        pub bio: Option<String>,
        pub phone: Option<String>,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct UserUpdate {
        pub name: Option<String>,
        pub password: Option<String>,
        pub bio: Option<String>,
        pub phone: Option<String>,
        pub cadastur: Option<String>,
        pub role: Option<Role>,
        /// `null` clears the guide override.
        #[serde(
            default,
            deserialize_with = "double_option",
            skip_serializing_if = "Option::is_none"
        )]
        pub commission_rate_bps: Option<Option<u32>>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct UserQuery {
        pub role: Option<Role>,
        pub page: Option<u64>,
        pub page_size: Option<u64>,
    }

    /// Request body of the Cadastur check: the name found in the registry.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct CadasturCheck {
        pub registry_name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CadasturResult {
        pub user: User,
        pub exact_match: bool,
        pub loose_match: bool,
        pub normalized_input: String,
        pub normalized_candidate: String,
    }
}

pub mod trail {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum Difficulty {
        Easy,
        Moderate,
        Hard,
        Extreme,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TrailNew {
        pub name: String,
        pub state: String,
        pub city: String,
        pub region_or_park: String,
        pub distance_meters: i64,
        pub elevation_gain_m: i32,
        pub difficulty: Option<Difficulty>,
        #[serde(default)]
        pub requires_guide: bool,
        pub entry_fee_cents: Option<i64>,
        pub description: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TrailUpdate {
        pub name: Option<String>,
        pub state: Option<String>,
        pub city: Option<String>,
        pub region_or_park: Option<String>,
        pub distance_meters: Option<i64>,
        pub elevation_gain_m: Option<i32>,
        pub difficulty: Option<Difficulty>,
        pub requires_guide: Option<bool>,
        #[serde(
            default,
            deserialize_with = "double_option",
            skip_serializing_if = "Option::is_none"
        )]
        pub entry_fee_cents: Option<Option<i64>>,
        pub description: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TrailQuery {
        pub state: Option<String>,
        pub difficulty: Option<Difficulty>,
        pub page: Option<u64>,
        pub page_size: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Trail {
        pub id: Uuid,
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
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TrailState {
        pub state: String,
        pub trails: u64,
    }
}

pub mod expedition {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum ExpeditionStatus {
        Draft,
        Published,
        Scheduled,
        InProgress,
        Cancelled,
        Completed,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpeditionNew {
        pub trail_id: Uuid,
        /// Only used when an admin creates the expedition.
        pub guide_id: Option<Uuid>,
        pub title: String,
        pub start_date: DateTime<Utc>,
        pub end_date: DateTime<Utc>,
        pub price_per_person_cents: i64,
        pub max_people: i32,
        pub currency: Option<Currency>,
        pub status: Option<ExpeditionStatus>,
        pub description: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ExpeditionUpdate {
        pub title: Option<String>,
        pub start_date: Option<DateTime<Utc>>,
        pub end_date: Option<DateTime<Utc>>,
        pub price_per_person_cents: Option<i64>,
        pub max_people: Option<i32>,
        pub status: Option<ExpeditionStatus>,
        pub description: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ExpeditionQuery {
        pub trail_id: Option<Uuid>,
        pub guide_id: Option<Uuid>,
        pub status: Option<ExpeditionStatus>,
        pub from: Option<DateTime<Utc>>,
        pub to: Option<DateTime<Utc>>,
        pub page: Option<u64>,
        pub page_size: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Expedition {
        pub id: Uuid,
        pub trail_id: Uuid,
        pub guide_id: Uuid,
        pub title: String,
        pub start_date: DateTime<Utc>,
        pub end_date: DateTime<Utc>,
        pub price_per_person_cents: i64,
        pub max_people: i32,
        pub currency: Currency,
        pub status: ExpeditionStatus,
        pub description: Option<String>,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Availability {
        pub expedition_id: Uuid,
        pub capacity: i32,
        pub occupied: i64,
        pub available: i64,
    }
}

pub mod booking {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum BookingStatus {
        Pending,
        Confirmed,
        Cancelled,
        Refunded,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BookingNew {
        pub expedition_id: Uuid,
        pub headcount: i32,
        pub notes: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct BookingUpdate {
        pub status: Option<BookingStatus>,
        pub notes: Option<String>,
        /// Admin only. `null` clears the booking override.
        #[serde(
            default,
            deserialize_with = "double_option",
            skip_serializing_if = "Option::is_none"
        )]
        pub commission_rate_bps: Option<Option<u32>>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct BookingCancel {
        pub reason: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct BookingQuery {
        pub expedition_id: Option<Uuid>,
        pub trekker_id: Option<Uuid>,
        pub status: Option<BookingStatus>,
        pub page: Option<u64>,
        pub page_size: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Booking {
        pub id: Uuid,
        pub code: String,
        pub expedition_id: Uuid,
        pub trekker_id: Uuid,
        pub headcount: i32,
        pub total_cents: i64,
        pub currency: Currency,
        pub status: BookingStatus,
        pub notes: Option<String>,
        pub commission_rate_bps: Option<u32>,
        pub refund_cents: Option<i64>,
        pub cancellation_reason: Option<String>,
        pub created_at: DateTime<Utc>,
        pub confirmed_at: Option<DateTime<Utc>>,
        pub cancelled_at: Option<DateTime<Utc>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RefundQuote {
        pub amount_cents: i64,
        pub hours_until_start: f64,
        pub refund_percent: f64,
        pub refund_cents: i64,
        pub retained_cents: i64,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum CommissionSource {
        Global,
        GuideOverride,
        BookingOverride,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Commission {
        pub amount_cents: i64,
        pub rate_bps: u32,
        pub commission_cents: i64,
        pub net_cents: i64,
        pub source: CommissionSource,
    }
}

pub mod review {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReviewNew {
        pub trail_id: Option<Uuid>,
        pub expedition_id: Option<Uuid>,
        pub rating: i32,
        pub comment: Option<String>,
    }

    /// Reviews and media are listed by target.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TargetQuery {
        pub trail_id: Option<Uuid>,
        pub expedition_id: Option<Uuid>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Review {
        pub id: Uuid,
        pub author_id: Uuid,
        pub trail_id: Option<Uuid>,
        pub expedition_id: Option<Uuid>,
        pub rating: i32,
        pub comment: Option<String>,
        pub created_at: DateTime<Utc>,
    }
}

pub mod media {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum MediaKind {
        Image,
        Video,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MediaNew {
        pub trail_id: Option<Uuid>,
        pub expedition_id: Option<Uuid>,
        pub url: String,
        pub kind: MediaKind,
        pub caption: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Media {
        pub id: Uuid,
        pub uploaded_by: Uuid,
        pub trail_id: Option<Uuid>,
        pub expedition_id: Option<Uuid>,
        pub url: String,
        pub kind: MediaKind,
        pub caption: Option<String>,
        pub created_at: DateTime<Utc>,
    }
}

pub mod payment {
    use super::*;

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum PaymentMethod {
        #[default]
        Pix,
        CreditCard,
        Boleto,
        BankTransfer,
        Cash,
        Other,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum PaymentStatus {
        Paid,
        Refunded,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct PaymentCapture {
        #[serde(default)]
        pub method: PaymentMethod,
        pub reference: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct PaymentRefund {
        pub reason: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Payment {
        pub id: Uuid,
        pub booking_id: Uuid,
        pub method: PaymentMethod,
        pub status: PaymentStatus,
        pub amount_cents: i64,
        pub fee_cents: i64,
        pub net_cents: i64,
        pub refunded_cents: Option<i64>,
        pub currency: Currency,
        pub reference: Option<String>,
        pub refund_reason: Option<String>,
        pub captured_by: Uuid,
        pub captured_at: DateTime<Utc>,
        pub refunded_at: Option<DateTime<Utc>>,
    }
}

pub mod admin {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum AuditAction {
        BookingReserved,
        BookingUpdated,
        BookingCancelled,
        BookingDeleted,
        CommissionOverridden,
        PaymentCaptured,
        PaymentRefunded,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum AuditEntity {
        Booking,
        User,
        Payment,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct AuditQuery {
        pub entity: Option<AuditEntity>,
        pub entity_id: Option<Uuid>,
        pub action: Option<AuditAction>,
        pub page: Option<u64>,
        pub page_size: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AuditEntry {
        pub id: Uuid,
        pub actor_id: Uuid,
        pub entity: AuditEntity,
        pub entity_id: Uuid,
        pub action: AuditAction,
        pub detail: Option<String>,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BookingCounts {
        pub pending: u64,
        pub confirmed: u64,
        pub cancelled: u64,
        pub refunded: u64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Revenue {
        pub currency: Currency,
        pub gross_cents: i64,
        pub fee_cents: i64,
        pub refunded_cents: i64,
        pub net_cents: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DashboardMetrics {
        pub users: u64,
        pub trails: u64,
        pub guides_verified: u64,
        pub guides_pending: u64,
        pub open_expeditions: u64,
        pub bookings: BookingCounts,
        pub revenue: Vec<Revenue>,
    }
}
