//! Trail API endpoints

use api_types::trail::{Trail, TrailNew, TrailQuery, TrailState, TrailUpdate};
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
    convert::{difficulty_from_api, difficulty_to_api, page_to_api},
    server::{CurrentUser, ServerState},
};

fn trail_to_api(trail: engine::Trail) -> Trail {
    Trail {
        id: trail.id,
        name: trail.name,
        state: trail.state,
        city: trail.city,
        region_or_park: trail.region_or_park,
        distance_meters: trail.distance_meters,
        elevation_gain_m: trail.elevation_gain_m,
        difficulty: difficulty_to_api(trail.difficulty),
        requires_guide: trail.requires_guide,
        entry_fee_cents: trail.entry_fee_cents,
        description: trail.description,
        created_at: trail.created_at,
    }
}

pub async fn create(
    CurrentUser(user): CurrentUser,
    State(state): State<ServerState>,
    payload: Result<Json<TrailNew>, JsonRejection>,
) -> Result<(StatusCode, Json<Trail>), ServerError> {
    let Json(payload) = payload?;
    let trail = state
        .engine
        .new_trail(
            engine::TrailNew {
                name: payload.name,
                state: payload.state,
                city: payload.city,
                region_or_park: payload.region_or_park,
                distance_meters: payload.distance_meters,
                elevation_gain_m: payload.elevation_gain_m,
                difficulty: payload.difficulty.map(difficulty_from_api).unwrap_or_default(),
                requires_guide: payload.requires_guide,
                entry_fee_cents: payload.entry_fee_cents,
                description: payload.description,
            },
            &user.actor(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(trail_to_api(trail))))
}

pub async fn get(
    State(state): State<ServerState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Trail>, ServerError> {
    let Path(id) = id?;
    let trail = state.engine.trail(id).await?;
    Ok(Json(trail_to_api(trail)))
}

pub async fn list(
    State(state): State<ServerState>,
    query: Result<Query<TrailQuery>, QueryRejection>,
) -> Result<Json<api_types::Page<Trail>>, ServerError> {
    let Query(query) = query?;
    let page = state
        .engine
        .list_trails(engine::TrailFilter {
            state: query.state,
            difficulty: query.difficulty.map(difficulty_from_api),
            page: query.page,
            page_size: query.page_size,
        })
        .await?;
    Ok(Json(page_to_api(page, trail_to_api)))
}

pub async fn update(
    CurrentUser(user): CurrentUser,
    State(state): State<ServerState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<TrailUpdate>, JsonRejection>,
) -> Result<Json<Trail>, ServerError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    let trail = state
        .engine
        .update_trail(
            id,
            engine::TrailPatch {
                name: payload.name,
                state: payload.state,
                city: payload.city,
                region_or_park: payload.region_or_park,
                distance_meters: payload.distance_meters,
                elevation_gain_m: payload.elevation_gain_m,
                difficulty: payload.difficulty.map(difficulty_from_api),
                requires_guide: payload.requires_guide,
                entry_fee_cents: payload.entry_fee_cents,
                description: payload.description,
            },
            &user.actor(),
        )
        .await?;
    Ok(Json(trail_to_api(trail)))
}

pub async fn delete(
    CurrentUser(user): CurrentUser,
    State(state): State<ServerState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, ServerError> {
    let Path(id) = id?;
    state.engine.delete_trail(id, &user.actor()).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn states(State(state): State<ServerState>) -> Result<Json<Vec<TrailState>>, ServerError> {
    let states = state
        .engine
        .trail_states()
        .await?
        .into_iter()
        .map(|s| TrailState {
            state: s.state,
            trails: s.trails,
        })
        .collect();
    Ok(Json(states))
}
