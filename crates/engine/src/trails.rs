//! Trails are the places expeditions happen on.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Difficulty {
    Easy,
    #[default]
    Moderate,
    Hard,
    Extreme,
}

impl Difficulty {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "EASY",
            Self::Moderate => "MODERATE",
            Self::Hard => "HARD",
            Self::Extreme => "EXTREME",
        }
    }
}

impl TryFrom<&str> for Difficulty {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "EASY" => Ok(Self::Easy),
            "MODERATE" => Ok(Self::Moderate),
            "HARD" => Ok(Self::Hard),
            "EXTREME" => Ok(Self::Extreme),
            other => Err(EngineError::Validation(format!(
                "invalid difficulty: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Trail {
    pub id: Uuid,
    pub name: String,
    /// Brazilian state code (e.g. `MG`).
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

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "trails")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub state: String,
    pub city: String,
    pub region_or_park: String,
    pub distance_meters: i64,
    pub elevation_gain_m: i32,
    pub difficulty: String,
    pub requires_guide: bool,
    pub entry_fee_cents: Option<i64>,
    pub description: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::expeditions::Entity")]
    Expeditions,
}

impl Related<super::expeditions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expeditions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Trail {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            name: model.name,
            state: model.state,
            city: model.city,
            region_or_park: model.region_or_park,
            distance_meters: model.distance_meters,
            elevation_gain_m: model.elevation_gain_m,
            difficulty: Difficulty::try_from(model.difficulty.as_str())?,
            requires_guide: model.requires_guide,
            entry_fee_cents: model.entry_fee_cents,
            description: model.description,
            created_at: model.created_at,
        })
    }
}
