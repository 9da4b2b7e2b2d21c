//! Append-only trail of who changed money-relevant state and when.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
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

impl AuditAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BookingReserved => "BOOKING_RESERVED",
            Self::BookingUpdated => "BOOKING_UPDATED",
            Self::BookingCancelled => "BOOKING_CANCELLED",
            Self::BookingDeleted => "BOOKING_DELETED",
            Self::CommissionOverridden => "COMMISSION_OVERRIDDEN",
            Self::PaymentCaptured => "PAYMENT_CAPTURED",
            Self::PaymentRefunded => "PAYMENT_REFUNDED",
        }
    }
}

impl TryFrom<&str> for AuditAction {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "BOOKING_RESERVED" => Ok(Self::BookingReserved),
            "BOOKING_UPDATED" => Ok(Self::BookingUpdated),
            "BOOKING_CANCELLED" => Ok(Self::BookingCancelled),
            "BOOKING_DELETED" => Ok(Self::BookingDeleted),
            "COMMISSION_OVERRIDDEN" => Ok(Self::CommissionOverridden),
            "PAYMENT_CAPTURED" => Ok(Self::PaymentCaptured),
            "PAYMENT_REFUNDED" => Ok(Self::PaymentRefunded),
            other => Err(EngineError::Validation(format!(
                "invalid audit action: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditEntity {
    Booking,
    User,
    Payment,
}

impl AuditEntity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Booking => "BOOKING",
            Self::User => "USER",
            Self::Payment => "PAYMENT",
        }
    }
}

impl TryFrom<&str> for AuditEntity {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "BOOKING" => Ok(Self::Booking),
            "USER" => Ok(Self::User),
            "PAYMENT" => Ok(Self::Payment),
            other => Err(EngineError::Validation(format!(
                "invalid audit entity: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuditEntry {
    pub id: Uuid,
    pub actor_id: Uuid,
    pub entity: AuditEntity,
    pub entity_id: Uuid,
    pub action: AuditAction,
    /// Short `key=value` summary of what changed.
    pub detail: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "audit_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub actor_id: Uuid,
    pub entity: String,
    pub entity_id: Uuid,
    pub action: String,
    pub detail: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for AuditEntry {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            actor_id: model.actor_id,
            entity: AuditEntity::try_from(model.entity.as_str())?,
            entity_id: model.entity_id,
            action: AuditAction::try_from(model.action.as_str())?,
            detail: model.detail,
            created_at: model.created_at,
        })
    }
}
