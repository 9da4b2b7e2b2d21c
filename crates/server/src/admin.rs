//! Admin-only audit trail and dashboard endpoints

use api_types::{
    Page,
    admin::{AuditEntry, AuditQuery, BookingCounts, DashboardMetrics, Revenue},
};
use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};

use crate::{
    ServerError,
    convert::{
        audit_action_from_api, audit_action_to_api, audit_entity_from_api, audit_entity_to_api,
        currency_to_api, page_to_api,
    },
    server::{CurrentUser, ServerState},
};

pub async fn audit_log(
    CurrentUser(user): CurrentUser,
    State(state): State<ServerState>,
    query: Result<Query<AuditQuery>, QueryRejection>,
) -> Result<Json<Page<AuditEntry>>, ServerError> {
    let Query(query) = query?;
    let filter = engine::AuditFilter {
        entity: query.entity.map(audit_entity_from_api),
        entity_id: query.entity_id,
        action: query.action.map(audit_action_from_api),
        page: query.page,
        page_size: query.page_size,
    };
    let page = state.engine.audit_log(filter, &user.actor()).await?;
    Ok(Json(page_to_api(page, |entry| AuditEntry {
        id: entry.id,
        actor_id: entry.actor_id,
        entity: audit_entity_to_api(entry.entity),
        entity_id: entry.entity_id,
        action: audit_action_to_api(entry.action),
        detail: entry.detail,
        created_at: entry.created_at,
    })))
}

pub async fn metrics(
    CurrentUser(user): CurrentUser,
    State(state): State<ServerState>,
) -> Result<Json<DashboardMetrics>, ServerError> {
    let metrics = state.engine.dashboard_metrics(&user.actor()).await?;
    Ok(Json(DashboardMetrics {
        users: metrics.users,
        trails: metrics.trails,
        guides_verified: metrics.guides_verified,
        guides_pending: metrics.guides_pending,
        open_expeditions: metrics.open_expeditions,
        bookings: BookingCounts {
            pending: metrics.bookings.pending,
            confirmed: metrics.bookings.confirmed,
            cancelled: metrics.bookings.cancelled,
            refunded: metrics.bookings.refunded,
        },
        revenue: metrics
            .revenue
            .into_iter()
            .map(|r| Revenue {
                currency: currency_to_api(r.currency),
                gross_cents: r.gross.cents(),
                fee_cents: r.fees.cents(),
                refunded_cents: r.refunded.cents(),
                net_cents: r.net.cents(),
            })
            .collect(),
    }))
}
