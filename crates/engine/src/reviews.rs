//! Trekker reviews of trails and expeditions.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Review {
    pub id: Uuid,
    pub author_id: Uuid,
    pub trail_id: Option<Uuid>,
    pub expedition_id: Option<Uuid>,
    /// 1 to 5 stars.
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "reviews")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub author_id: Uuid,
    pub trail_id: Option<Uuid>,
    pub expedition_id: Option<Uuid>,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Review {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            author_id: model.author_id,
            trail_id: model.trail_id,
            expedition_id: model.expedition_id,
            rating: model.rating,
            comment: model.comment,
            created_at: model.created_at,
        }
    }
}
