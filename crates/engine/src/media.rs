//! Photos and videos attached to trails or expeditions.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Image => "IMAGE",
            Self::Video => "VIDEO",
        }
    }
}

impl TryFrom<&str> for MediaKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "IMAGE" => Ok(Self::Image),
            "VIDEO" => Ok(Self::Video),
            other => Err(EngineError::Validation(format!(
                "invalid media kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
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

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "media")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub uploaded_by: Uuid,
    pub trail_id: Option<Uuid>,
    pub expedition_id: Option<Uuid>,
    pub url: String,
    pub kind: String,
    pub caption: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Media {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            uploaded_by: model.uploaded_by,
            trail_id: model.trail_id,
            expedition_id: model.expedition_id,
            url: model.url,
            kind: MediaKind::try_from(model.kind.as_str())?,
            caption: model.caption,
            created_at: model.created_at,
        })
    }
}
