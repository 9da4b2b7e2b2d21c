use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*,
};
use uuid::Uuid;

use crate::{
    Actor, EngineError, Review, ReviewNew, ResultEngine, reviews, util::normalize_optional_text,
};

use super::{Engine, with_tx};

impl Engine {
    /// Fails unless at least one target is given and every given target exists.
    pub(super) async fn require_target<C: ConnectionTrait>(
        &self,
        db: &C,
        trail_id: Option<Uuid>,
        expedition_id: Option<Uuid>,
    ) -> ResultEngine<()> {
        if trail_id.is_none() && expedition_id.is_none() {
            return Err(EngineError::Validation(
                "trail_id or expedition_id is required".to_string(),
            ));
        }
        if let Some(trail_id) = trail_id {
            self.require_trail(db, trail_id).await?;
        }
        if let Some(expedition_id) = expedition_id {
            self.require_expedition(db, expedition_id).await?;
        }
        Ok(())
    }

    /// Any authenticated user can review a trail or an expedition.
    pub async fn new_review(&self, cmd: ReviewNew, actor: &Actor) -> ResultEngine<Review> {
        if !(1..=5).contains(&cmd.rating) {
            return Err(EngineError::Validation(format!(
                "rating must be between 1 and 5, got {}",
                cmd.rating
            )));
        }

        with_tx!(self, |db_tx| {
            self.require_target(&db_tx, cmd.trail_id, cmd.expedition_id)
                .await?;
            let model = reviews::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                author_id: ActiveValue::Set(actor.id),
                trail_id: ActiveValue::Set(cmd.trail_id),
                expedition_id: ActiveValue::Set(cmd.expedition_id),
                rating: ActiveValue::Set(cmd.rating),
                comment: ActiveValue::Set(normalize_optional_text(cmd.comment.as_deref())),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;
            Ok(Review::from(model))
        })
    }

    /// Reviews of a trail and/or an expedition, newest first.
    pub async fn list_reviews(
        &self,
        trail_id: Option<Uuid>,
        expedition_id: Option<Uuid>,
    ) -> ResultEngine<Vec<Review>> {
        if trail_id.is_none() && expedition_id.is_none() {
            return Err(EngineError::Validation(
                "trail_id or expedition_id is required".to_string(),
            ));
        }
        let mut query = reviews::Entity::find();
        if let Some(trail_id) = trail_id {
            query = query.filter(reviews::Column::TrailId.eq(trail_id));
        }
        if let Some(expedition_id) = expedition_id {
            query = query.filter(reviews::Column::ExpeditionId.eq(expedition_id));
        }
        let models = query
            .order_by_desc(reviews::Column::CreatedAt)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Review::from).collect())
    }
}
