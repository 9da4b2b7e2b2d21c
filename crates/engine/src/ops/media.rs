use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    Actor, EngineError, Media, MediaNew, ResultEngine, Role, media,
    util::{normalize_optional_text, validate_url},
};

use super::{Engine, with_tx};

impl Engine {
    /// Guides and admins attach media to a trail or an expedition.
    pub async fn new_media(&self, cmd: MediaNew, actor: &Actor) -> ResultEngine<Media> {
        actor.require_role(&[Role::Guide, Role::Admin])?;
        let url = validate_url(&cmd.url)?;

        with_tx!(self, |db_tx| {
            self.require_target(&db_tx, cmd.trail_id, cmd.expedition_id)
                .await?;
            let model = media::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                uploaded_by: ActiveValue::Set(actor.id),
                trail_id: ActiveValue::Set(cmd.trail_id),
                expedition_id: ActiveValue::Set(cmd.expedition_id),
                url: ActiveValue::Set(url),
                kind: ActiveValue::Set(cmd.kind.as_str().to_string()),
                caption: ActiveValue::Set(normalize_optional_text(cmd.caption.as_deref())),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;
            Media::try_from(model)
        })
    }

    /// Media of a trail and/or an expedition, newest first.
    pub async fn list_media(
        &self,
        trail_id: Option<Uuid>,
        expedition_id: Option<Uuid>,
    ) -> ResultEngine<Vec<Media>> {
        let mut query = media::Entity::find();
        if let Some(trail_id) = trail_id {
            query = query.filter(media::Column::TrailId.eq(trail_id));
        }
        if let Some(expedition_id) = expedition_id {
            query = query.filter(media::Column::ExpeditionId.eq(expedition_id));
        }
        query
            .order_by_desc(media::Column::CreatedAt)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Media::try_from)
            .collect()
    }

    /// The uploader or an admin.
    pub async fn delete_media(&self, media_id: Uuid, actor: &Actor) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = media::Entity::find_by_id(media_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("media not exists".to_string()))?;
            if !actor.is_admin() && model.uploaded_by != actor.id {
                return Err(EngineError::Forbidden(
                    "media belongs to another user".to_string(),
                ));
            }
            media::Entity::delete_by_id(media_id).exec(&db_tx).await?;
            Ok(())
        })
    }
}
