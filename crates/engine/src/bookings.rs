//! The module contains `Booking`, a reservation of seats on an expedition.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, EngineError, MoneyCents};

/// Upper bound on the seats a single booking may hold.
pub const MAX_HEADCOUNT: i32 = 100;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    #[default]
    Pending,
    Confirmed,
    Cancelled,
    Refunded,
}

/// Statuses whose headcount counts against the expedition capacity.
pub const ACTIVE_STATUSES: [BookingStatus; 2] = [BookingStatus::Pending, BookingStatus::Confirmed];

impl BookingStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Cancelled => "CANCELLED",
            Self::Refunded => "REFUNDED",
        }
    }

    /// `true` when the booking holds seats.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }
}

impl TryFrom<&str> for BookingStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "CONFIRMED" => Ok(Self::Confirmed),
            "CANCELLED" => Ok(Self::Cancelled),
            "REFUNDED" => Ok(Self::Refunded),
            other => Err(EngineError::Validation(format!(
                "invalid booking status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Booking {
    pub id: Uuid,
    /// Human-friendly reference, e.g. `RSV-3F9A0C12DE`.
    pub code: String,
    pub expedition_id: Uuid,
    pub trekker_id: Uuid,
    pub headcount: i32,
    pub total: MoneyCents,
    pub currency: Currency,
    pub status: BookingStatus,
    pub notes: Option<String>,
    /// Per-booking commission override, in basis points.
    pub commission_rate_bps: Option<u32>,
    /// Amount due back to the trekker, set when the booking is cancelled.
    pub refund: Option<MoneyCents>,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

/// Generates a booking reference code.
pub(crate) fn generate_code() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("RSV-{}", hex[..10].to_ascii_uppercase())
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "bookings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub code: String,
    pub expedition_id: Uuid,
    pub trekker_id: Uuid,
    pub headcount: i32,
    pub total_cents: i64,
    pub currency: String,
    pub status: String,
    pub notes: Option<String>,
    pub commission_rate_bps: Option<i32>,
    pub refund_cents: Option<i64>,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTimeUtc,
    pub confirmed_at: Option<DateTimeUtc>,
    pub cancelled_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::expeditions::Entity",
        from = "Column::ExpeditionId",
        to = "super::expeditions::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Expedition,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::TrekkerId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Trekker,
}

impl Related<super::expeditions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expedition.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Trekker.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Booking {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            code: model.code,
            expedition_id: model.expedition_id,
            trekker_id: model.trekker_id,
            headcount: model.headcount,
            total: MoneyCents::new(model.total_cents),
            currency: Currency::try_from(model.currency.as_str())?,
            status: BookingStatus::try_from(model.status.as_str())?,
            notes: model.notes,
            commission_rate_bps: model
                .commission_rate_bps
                .map(u32::try_from)
                .transpose()
                .map_err(|_| EngineError::Validation("negative commission rate".to_string()))?,
            refund: model.refund_cents.map(MoneyCents::new),
            cancellation_reason: model.cancellation_reason,
            created_at: model.created_at,
            confirmed_at: model.confirmed_at,
            cancelled_at: model.cancelled_at,
        })
    }
}
