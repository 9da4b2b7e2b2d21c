//! Booking API endpoints

use api_types::booking::{
    Booking, BookingCancel, BookingNew, BookingQuery, BookingUpdate, Commission, RefundQuote,
};
use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    ServerError,
    convert::{
        booking_status_from_api, booking_status_to_api, commission_source_to_api, currency_to_api,
        page_to_api,
    },
    server::{CurrentUser, ServerState},
};

fn booking_to_api(booking: engine::Booking) -> Booking {
    Booking {
        id: booking.id,
        code: booking.code,
        expedition_id: booking.expedition_id,
        trekker_id: booking.trekker_id,
        headcount: booking.headcount,
        total_cents: booking.total.cents(),
        currency: currency_to_api(booking.currency),
        status: booking_status_to_api(booking.status),
        notes: booking.notes,
        commission_rate_bps: booking.commission_rate_bps,
        refund_cents: booking.refund.map(engine::MoneyCents::cents),
        cancellation_reason: booking.cancellation_reason,
        created_at: booking.created_at,
        confirmed_at: booking.confirmed_at,
        cancelled_at: booking.cancelled_at,
    }
}

/// Reserves seats for the caller.
///
/// Answers 201 with the pending booking, 409 `CAPACITY_EXCEEDED` when the
/// seats are gone and 409 `CONFLICT` when concurrent updates kept winning.
pub async fn reserve(
    CurrentUser(user): CurrentUser,
    State(state): State<ServerState>,
    payload: Result<Json<BookingNew>, JsonRejection>,
) -> Result<(StatusCode, Json<Booking>), ServerError> {
    let Json(payload) = payload?;
    let mut cmd = engine::ReserveCmd::new(payload.expedition_id, payload.headcount);
    if let Some(notes) = payload.notes {
        cmd = cmd.notes(notes);
    }

    let booking = state.engine.reserve(cmd, &user.actor()).await?;
    Ok((StatusCode::CREATED, Json(booking_to_api(booking))))
}

pub async fn get(
    CurrentUser(user): CurrentUser,
    State(state): State<ServerState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Booking>, ServerError> {
    let Path(id) = id?;
    let booking = state.engine.booking(id, &user.actor()).await?;
    Ok(Json(booking_to_api(booking)))
}

pub async fn list(
    CurrentUser(user): CurrentUser,
    State(state): State<ServerState>,
    query: Result<Query<BookingQuery>, QueryRejection>,
) -> Result<Json<api_types::Page<Booking>>, ServerError> {
    let Query(query) = query?;
    let page = state
        .engine
        .list_bookings(
            engine::BookingFilter {
                expedition_id: query.expedition_id,
                trekker_id: query.trekker_id,
                status: query.status.map(booking_status_from_api),
                page: query.page,
                page_size: query.page_size,
            },
            &user.actor(),
        )
        .await?;
    Ok(Json(page_to_api(page, booking_to_api)))
}

pub async fn update(
    CurrentUser(user): CurrentUser,
    State(state): State<ServerState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<BookingUpdate>, JsonRejection>,
) -> Result<Json<Booking>, ServerError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    let booking = state
        .engine
        .update_booking(
            id,
            engine::BookingPatch {
                status: payload.status.map(booking_status_from_api),
                notes: payload.notes,
                commission_rate_bps: payload.commission_rate_bps,
            },
            &user.actor(),
        )
        .await?;
    Ok(Json(booking_to_api(booking)))
}

/// The body is optional; an empty request cancels without a reason.
pub async fn cancel(
    CurrentUser(user): CurrentUser,
    State(state): State<ServerState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Option<Json<BookingCancel>>,
) -> Result<Json<Booking>, ServerError> {
    let Path(id) = id?;
    let reason = payload.and_then(|Json(body)| body.reason);
    let booking = state
        .engine
        .cancel_booking(id, reason.as_deref(), &user.actor(), Utc::now())
        .await?;
    Ok(Json(booking_to_api(booking)))
}

pub async fn refund_quote(
    CurrentUser(user): CurrentUser,
    State(state): State<ServerState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<RefundQuote>, ServerError> {
    let Path(id) = id?;
    let quote = state
        .engine
        .refund_quote(id, &user.actor(), Utc::now())
        .await?;

    Ok(Json(RefundQuote {
        amount_cents: quote.amount.cents(),
        hours_until_start: quote.minutes_until_start as f64 / 60.0,
        refund_percent: f64::from(quote.refund_bps) / 100.0,
        refund_cents: quote.refund.cents(),
        retained_cents: quote.retained.cents(),
    }))
}

pub async fn commission(
    CurrentUser(user): CurrentUser,
    State(state): State<ServerState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Commission>, ServerError> {
    let Path(id) = id?;
    let commission = state.engine.booking_commission(id, &user.actor()).await?;

    Ok(Json(Commission {
        amount_cents: commission.amount.cents(),
        rate_bps: commission.rate_bps,
        commission_cents: commission.commission.cents(),
        net_cents: commission.net.cents(),
        source: commission_source_to_api(commission.source),
    }))
}

pub async fn delete(
    CurrentUser(user): CurrentUser,
    State(state): State<ServerState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, ServerError> {
    let Path(id) = id?;
    state.engine.delete_booking(id, &user.actor()).await?;
    Ok(StatusCode::NO_CONTENT)
}
