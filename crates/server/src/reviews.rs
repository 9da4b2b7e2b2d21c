//! Review API endpoints

use api_types::review::{Review, ReviewNew, TargetQuery};
use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};

use crate::{
    ServerError,
    server::{CurrentUser, ServerState},
};

fn review_to_api(review: engine::Review) -> Review {
    Review {
        id: review.id,
        author_id: review.author_id,
        trail_id: review.trail_id,
        expedition_id: review.expedition_id,
        rating: review.rating,
        comment: review.comment,
        created_at: review.created_at,
    }
}

pub async fn create(
    CurrentUser(user): CurrentUser,
    State(state): State<ServerState>,
    payload: Result<Json<ReviewNew>, JsonRejection>,
) -> Result<(StatusCode, Json<Review>), ServerError> {
    let Json(payload) = payload?;
    let review = state
        .engine
        .new_review(
            engine::ReviewNew {
                trail_id: payload.trail_id,
                expedition_id: payload.expedition_id,
                rating: payload.rating,
                comment: payload.comment,
            },
            &user.actor(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(review_to_api(review))))
}

pub async fn list(
    State(state): State<ServerState>,
    query: Result<Query<TargetQuery>, QueryRejection>,
) -> Result<Json<Vec<Review>>, ServerError> {
    let Query(query) = query?;
    let reviews = state
        .engine
        .list_reviews(query.trail_id, query.expedition_id)
        .await?;
    Ok(Json(reviews.into_iter().map(review_to_api).collect()))
}
