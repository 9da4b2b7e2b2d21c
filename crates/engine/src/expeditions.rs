//! An expedition is a dated, guided trip on a trail with a fixed number of
//! seats. It is the capacity-bounded resource bookings reserve against.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, EngineError, MoneyCents};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExpeditionStatus {
    #[default]
    Draft,
    Published,
    Scheduled,
    InProgress,
    Cancelled,
    Completed,
}

impl ExpeditionStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Published => "PUBLISHED",
            Self::Scheduled => "SCHEDULED",
            Self::InProgress => "IN_PROGRESS",
            Self::Cancelled => "CANCELLED",
            Self::Completed => "COMPLETED",
        }
    }

    /// Only published, scheduled or running expeditions accept bookings.
    #[must_use]
    pub const fn is_bookable(self) -> bool {
        matches!(self, Self::Published | Self::Scheduled | Self::InProgress)
    }

    /// A closed expedition exposes no available seats regardless of occupancy.
    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Cancelled | Self::Completed)
    }
}

impl TryFrom<&str> for ExpeditionStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "DRAFT" => Ok(Self::Draft),
            "PUBLISHED" => Ok(Self::Published),
            "SCHEDULED" => Ok(Self::Scheduled),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "CANCELLED" => Ok(Self::Cancelled),
            "COMPLETED" => Ok(Self::Completed),
            other => Err(EngineError::Validation(format!(
                "invalid expedition status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Expedition {
    pub id: Uuid,
    pub trail_id: Uuid,
    pub guide_id: Uuid,
    pub title: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub price_per_person: MoneyCents,
    /// Capacity: the maximum number of seats across active bookings.
    pub max_people: i32,
    pub currency: Currency,
    pub status: ExpeditionStatus,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Seats snapshot of an expedition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Availability {
    pub expedition_id: Uuid,
    pub capacity: i32,
    pub occupied: i64,
    pub available: i64,
}

impl Availability {
    #[must_use]
    pub fn new(expedition_id: Uuid, capacity: i32, occupied: i64, status: ExpeditionStatus) -> Self {
        let available = if status.is_closed() {
            0
        } else {
            (i64::from(capacity) - occupied).max(0)
        };
        Self {
            expedition_id,
            capacity,
            occupied,
            available,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "expeditions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub trail_id: Uuid,
    pub guide_id: Uuid,
    pub title: String,
    pub start_date: DateTimeUtc,
    pub end_date: DateTimeUtc,
    pub price_per_person_cents: i64,
    pub max_people: i32,
    pub currency: String,
    pub status: String,
    pub description: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::trails::Entity",
        from = "Column::TrailId",
        to = "super::trails::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Trail,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::GuideId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Guide,
    #[sea_orm(has_many = "super::bookings::Entity")]
    Bookings,
}

impl Related<super::trails::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Trail.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Guide.def()
    }
}

impl Related<super::bookings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Expedition {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            trail_id: model.trail_id,
            guide_id: model.guide_id,
            title: model.title,
            start_date: model.start_date,
            end_date: model.end_date,
            price_per_person: MoneyCents::new(model.price_per_person_cents),
            max_people: model.max_people,
            currency: Currency::try_from(model.currency.as_str())?,
            status: ExpeditionStatus::try_from(model.status.as_str())?,
            description: model.description,
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bookable_statuses() {
        assert!(!ExpeditionStatus::Draft.is_bookable());
        assert!(ExpeditionStatus::Published.is_bookable());
        assert!(ExpeditionStatus::Scheduled.is_bookable());
        assert!(ExpeditionStatus::InProgress.is_bookable());
        assert!(!ExpeditionStatus::Cancelled.is_bookable());
        assert!(!ExpeditionStatus::Completed.is_bookable());
    }

    #[test]
    fn availability_is_zero_when_closed_or_overbooked() {
        let id = Uuid::new_v4();
        assert_eq!(
            Availability::new(id, 10, 8, ExpeditionStatus::Published).available,
            2
        );
        assert_eq!(
            Availability::new(id, 10, 3, ExpeditionStatus::Cancelled).available,
            0
        );
        assert_eq!(
            Availability::new(id, 10, 12, ExpeditionStatus::Published).available,
            0
        );
    }
}
