//! Media API endpoints

use api_types::{
    media::{Media, MediaNew},
    review::TargetQuery,
};
use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    ServerError,
    convert::{media_kind_from_api, media_kind_to_api},
    server::{CurrentUser, ServerState},
};

fn media_to_api(media: engine::Media) -> Media {
    Media {
        id: media.id,
        uploaded_by: media.uploaded_by,
        trail_id: media.trail_id,
        expedition_id: media.expedition_id,
        url: media.url,
        kind: media_kind_to_api(media.kind),
        caption: media.caption,
        created_at: media.created_at,
    }
}

pub async fn create(
    CurrentUser(user): CurrentUser,
    State(state): State<ServerState>,
    payload: Result<Json<MediaNew>, JsonRejection>,
) -> Result<(StatusCode, Json<Media>), ServerError> {
    let Json(payload) = payload?;
    let media = state
        .engine
        .new_media(
            engine::MediaNew {
                trail_id: payload.trail_id,
                expedition_id: payload.expedition_id,
                url: payload.url,
                kind: media_kind_from_api(payload.kind),
                caption: payload.caption,
            },
            &user.actor(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(media_to_api(media))))
}

pub async fn list(
    State(state): State<ServerState>,
    query: Result<Query<TargetQuery>, QueryRejection>,
) -> Result<Json<Vec<Media>>, ServerError> {
    let Query(query) = query?;
    let media = state
        .engine
        .list_media(query.trail_id, query.expedition_id)
        .await?;
    Ok(Json(media.into_iter().map(media_to_api).collect()))
}

pub async fn delete(
    CurrentUser(user): CurrentUser,
    State(state): State<ServerState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, ServerError> {
    let Path(id) = id?;
    state.engine.delete_media(id, &user.actor()).await?;
    Ok(StatusCode::NO_CONTENT)
}
