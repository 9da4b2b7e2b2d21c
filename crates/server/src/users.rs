//! User API endpoints

use api_types::user::{CadasturCheck, CadasturResult, Signup, User, UserQuery, UserUpdate};
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
    convert::{page_to_api, role_from_api, role_to_api},
    server::{CurrentUser, ServerState},
};

pub(crate) fn user_to_api(user: engine::User) -> User {
    User {
        id: user.id,
        email: user.email,
        name: user.name,
        role: role_to_api(user.role),
        cadastur: user.cadastur,
        cadastur_verified: user.cadastur_verified,
        commission_rate_bps: user.commission_rate_bps,
        bio: user.bio,
        phone: user.phone,
        created_at: user.created_at,
    }
}

/// Public registration of guides and trekkers.
pub async fn signup(
    State(state): State<ServerState>,
    payload: Result<Json<Signup>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), ServerError> {
    let Json(payload) = payload?;
    let user = state
        .engine
        .signup(engine::SignupCmd {
            name: payload.name,
            email: payload.email,
            password: payload.password,
            role: role_from_api(payload.role),
            cadastur: payload.cadastur,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(user_to_api(user))))
}

pub async fn me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user_to_api(user))
}

pub async fn get(
    CurrentUser(user): CurrentUser,
    State(state): State<ServerState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<User>, ServerError> {
    let Path(id) = id?;
    let found = state.engine.user(id, &user.actor()).await?;
    Ok(Json(user_to_api(found)))
}

pub async fn list(
    CurrentUser(user): CurrentUser,
    State(state): State<ServerState>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> Result<Json<api_types::Page<User>>, ServerError> {
    let Query(query) = query?;
    let page = state
        .engine
        .list_users(
            engine::UserFilter {
                role: query.role.map(role_from_api),
                page: query.page,
                page_size: query.page_size,
            },
            &user.actor(),
        )
        .await?;
    Ok(Json(page_to_api(page, user_to_api)))
}

pub async fn update(
    CurrentUser(user): CurrentUser,
    State(state): State<ServerState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UserUpdate>, JsonRejection>,
) -> Result<Json<User>, ServerError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    let updated = state
        .engine
        .update_user(
            id,
            engine::UserPatch {
                name: payload.name,
                password: payload.password,
                bio: payload.bio,
                phone: payload.phone,
                cadastur: payload.cadastur,
                role: payload.role.map(role_from_api),
                commission_rate_bps: payload.commission_rate_bps,
            },
            &user.actor(),
        )
        .await?;
    Ok(Json(user_to_api(updated)))
}

/// Checks a guide's name against the one found in the Cadastur registry.
pub async fn verify_cadastur(
    CurrentUser(user): CurrentUser,
    State(state): State<ServerState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<CadasturCheck>, JsonRejection>,
) -> Result<Json<CadasturResult>, ServerError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    let (guide, comparison) = state
        .engine
        .verify_cadastur(id, &payload.registry_name, &user.actor())
        .await?;

    Ok(Json(CadasturResult {
        user: user_to_api(guide),
        exact_match: comparison.exact_match,
        loose_match: comparison.loose_match,
        normalized_input: comparison.normalized_input,
        normalized_candidate: comparison.normalized_candidate,
    }))
}
