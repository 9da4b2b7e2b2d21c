//! Expedition API endpoints

use api_types::expedition::{
    Availability, Expedition, ExpeditionNew, ExpeditionQuery, ExpeditionUpdate,
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
    convert::{
        currency_from_api, currency_to_api, expedition_status_from_api, expedition_status_to_api,
        page_to_api,
    },
    server::{CurrentUser, ServerState},
};

fn expedition_to_api(expedition: engine::Expedition) -> Expedition {
    Expedition {
        id: expedition.id,
        trail_id: expedition.trail_id,
        guide_id: expedition.guide_id,
        title: expedition.title,
        start_date: expedition.start_date,
        end_date: expedition.end_date,
        price_per_person_cents: expedition.price_per_person.cents(),
        max_people: expedition.max_people,
        currency: currency_to_api(expedition.currency),
        status: expedition_status_to_api(expedition.status),
        description: expedition.description,
        created_at: expedition.created_at,
    }
}

fn filter_from_query(query: ExpeditionQuery) -> engine::ExpeditionFilter {
    engine::ExpeditionFilter {
        trail_id: query.trail_id,
        guide_id: query.guide_id,
        status: query.status.map(expedition_status_from_api),
        from: query.from,
        to: query.to,
        page: query.page,
        page_size: query.page_size,
    }
}

/// Guides create their own expeditions; admins name the guide.
pub async fn create(
    CurrentUser(user): CurrentUser,
    State(state): State<ServerState>,
    payload: Result<Json<ExpeditionNew>, JsonRejection>,
) -> Result<(StatusCode, Json<Expedition>), ServerError> {
    let Json(payload) = payload?;
    let expedition = state
        .engine
        .new_expedition(
            engine::ExpeditionNew {
                trail_id: payload.trail_id,
                guide_id: payload.guide_id,
                title: payload.title,
                start_date: payload.start_date,
                end_date: payload.end_date,
                price_per_person_cents: payload.price_per_person_cents,
                max_people: payload.max_people,
                currency: payload.currency.map(currency_from_api).unwrap_or_default(),
                status: payload
                    .status
                    .map(expedition_status_from_api)
                    .unwrap_or_default(),
                description: payload.description,
            },
            &user.actor(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(expedition_to_api(expedition))))
}

pub async fn get(
    State(state): State<ServerState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Expedition>, ServerError> {
    let Path(id) = id?;
    let expedition = state.engine.expedition(id).await?;
    Ok(Json(expedition_to_api(expedition)))
}

pub async fn list(
    State(state): State<ServerState>,
    query: Result<Query<ExpeditionQuery>, QueryRejection>,
) -> Result<Json<api_types::Page<Expedition>>, ServerError> {
    let Query(query) = query?;
    let page = state
        .engine
        .list_expeditions(filter_from_query(query))
        .await?;
    Ok(Json(page_to_api(page, expedition_to_api)))
}

/// Same as [`list`] with the trail taken from the path.
pub async fn list_for_trail(
    State(state): State<ServerState>,
    id: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<ExpeditionQuery>, QueryRejection>,
) -> Result<Json<api_types::Page<Expedition>>, ServerError> {
    let Path(trail_id) = id?;
    let Query(query) = query?;
    state.engine.trail(trail_id).await?;

    let mut filter = filter_from_query(query);
    filter.trail_id = Some(trail_id);
    let page = state.engine.list_expeditions(filter).await?;
    Ok(Json(page_to_api(page, expedition_to_api)))
}

pub async fn update(
    CurrentUser(user): CurrentUser,
    State(state): State<ServerState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<ExpeditionUpdate>, JsonRejection>,
) -> Result<Json<Expedition>, ServerError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    let expedition = state
        .engine
        .update_expedition(
            id,
            engine::ExpeditionPatch {
                title: payload.title,
                start_date: payload.start_date,
                end_date: payload.end_date,
                price_per_person_cents: payload.price_per_person_cents,
                max_people: payload.max_people,
                status: payload.status.map(expedition_status_from_api),
                description: payload.description,
            },
            &user.actor(),
        )
        .await?;
    Ok(Json(expedition_to_api(expedition)))
}

pub async fn availability(
    State(state): State<ServerState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Availability>, ServerError> {
    let Path(id) = id?;
    let availability = state.engine.availability(id).await?;
    Ok(Json(Availability {
        expedition_id: availability.expedition_id,
        capacity: availability.capacity,
        occupied: availability.occupied,
        available: availability.available,
    }))
}
