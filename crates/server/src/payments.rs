//! Payment capture and refund endpoints

use api_types::payment::{Payment, PaymentCapture, PaymentRefund};
use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    ServerError,
    convert::{
        currency_to_api, payment_method_from_api, payment_method_to_api, payment_status_to_api,
    },
    server::{CurrentUser, ServerState},
};

fn payment_to_api(payment: engine::Payment) -> Payment {
    Payment {
        id: payment.id,
        booking_id: payment.booking_id,
        method: payment_method_to_api(payment.method),
        status: payment_status_to_api(payment.status),
        amount_cents: payment.amount.cents(),
        fee_cents: payment.fee.cents(),
        net_cents: payment.net.cents(),
        refunded_cents: payment.refunded.map(engine::MoneyCents::cents),
        currency: currency_to_api(payment.currency),
        reference: payment.reference,
        refund_reason: payment.refund_reason,
        captured_by: payment.captured_by,
        captured_at: payment.captured_at,
        refunded_at: payment.refunded_at,
    }
}

/// Records the payment of a booking and confirms it. Admin only.
pub async fn capture(
    CurrentUser(user): CurrentUser,
    State(state): State<ServerState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Option<Json<PaymentCapture>>,
) -> Result<(StatusCode, Json<Payment>), ServerError> {
    let Path(id) = id?;
    let body = payload.map(|Json(body)| body).unwrap_or_default();
    let cmd = engine::PaymentCapture {
        method: payment_method_from_api(body.method),
        reference: body.reference,
    };
    let payment = state
        .engine
        .capture_payment(id, cmd, &user.actor())
        .await?;
    Ok((StatusCode::CREATED, Json(payment_to_api(payment))))
}

pub async fn get(
    CurrentUser(user): CurrentUser,
    State(state): State<ServerState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Payment>, ServerError> {
    let Path(id) = id?;
    let payment = state.engine.booking_payment(id, &user.actor()).await?;
    Ok(Json(payment_to_api(payment)))
}

/// Refunds the payment and closes the booking as `REFUNDED`. Admin only.
pub async fn refund(
    CurrentUser(user): CurrentUser,
    State(state): State<ServerState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<PaymentRefund>, JsonRejection>,
) -> Result<Json<Payment>, ServerError> {
    let Path(id) = id?;
    let Json(body) = payload?;
    let payment = state
        .engine
        .refund_payment(
            id,
            engine::PaymentRefund {
                reason: body.reason,
            },
            &user.actor(),
            Utc::now(),
        )
        .await?;
    Ok(Json(payment_to_api(payment)))
}
