//! The module contains `Payment`, the money received for a booking.
//!
//! Capturing a payment confirms the booking; refunding it closes the booking
//! as `REFUNDED` with the amount the refund windows grant.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, EngineError, MoneyCents};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
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

impl PaymentMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pix => "PIX",
            Self::CreditCard => "CREDIT_CARD",
            Self::Boleto => "BOLETO",
            Self::BankTransfer => "BANK_TRANSFER",
            Self::Cash => "CASH",
            Self::Other => "OTHER",
        }
    }
}

impl TryFrom<&str> for PaymentMethod {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "PIX" => Ok(Self::Pix),
            "CREDIT_CARD" => Ok(Self::CreditCard),
            "BOLETO" => Ok(Self::Boleto),
            "BANK_TRANSFER" => Ok(Self::BankTransfer),
            "CASH" => Ok(Self::Cash),
            "OTHER" => Ok(Self::Other),
            other => Err(EngineError::Validation(format!(
                "invalid payment method: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Paid,
    Refunded,
}

impl PaymentStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Paid => "PAID",
            Self::Refunded => "REFUNDED",
        }
    }
}

impl TryFrom<&str> for PaymentStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "PAID" => Ok(Self::Paid),
            "REFUNDED" => Ok(Self::Refunded),
            other => Err(EngineError::Validation(format!(
                "invalid payment status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Payment {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    /// The booking total at capture time.
    pub amount: MoneyCents,
    /// Platform commission kept from `amount`.
    pub fee: MoneyCents,
    /// What the guide receives.
    pub net: MoneyCents,
    pub refunded: Option<MoneyCents>,
    pub currency: Currency,
    /// External transaction id, e.g. a PIX end-to-end id.
    pub reference: Option<String>,
    pub refund_reason: Option<String>,
    pub captured_by: Uuid,
    pub captured_at: DateTime<Utc>,
    pub refunded_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub booking_id: Uuid,
    pub method: String,
    pub status: String,
    pub amount_cents: i64,
    pub fee_cents: i64,
    pub net_cents: i64,
    pub refunded_cents: Option<i64>,
    pub currency: String,
    pub reference: Option<String>,
    pub refund_reason: Option<String>,
    pub captured_by: Uuid,
    pub captured_at: DateTimeUtc,
    pub refunded_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::bookings::Entity",
        from = "Column::BookingId",
        to = "super::bookings::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Booking,
}

impl Related<super::bookings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Booking.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Payment {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            booking_id: model.booking_id,
            method: PaymentMethod::try_from(model.method.as_str())?,
            status: PaymentStatus::try_from(model.status.as_str())?,
            amount: MoneyCents::new(model.amount_cents),
            fee: MoneyCents::new(model.fee_cents),
            net: MoneyCents::new(model.net_cents),
            refunded: model.refunded_cents.map(MoneyCents::new),
            currency: Currency::try_from(model.currency.as_str())?,
            reference: model.reference,
            refund_reason: model.refund_reason,
            captured_by: model.captured_by,
            captured_at: model.captured_at,
            refunded_at: model.refunded_at,
        })
    }
}
