use sea_orm::{
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*,
    sea_query::Expr,
};

use crate::{
    Actor, BookingCounts, BookingStatus, Currency, DashboardMetrics, ExpeditionStatus, MoneyCents,
    ResultEngine, Revenue, Role, bookings, expeditions, payments, trails, users,
};

use super::{Engine, with_tx};

const OPEN_EXPEDITION_STATUSES: [ExpeditionStatus; 3] = [
    ExpeditionStatus::Published,
    ExpeditionStatus::Scheduled,
    ExpeditionStatus::InProgress,
];

fn count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}

impl Engine {
    /// Platform counters for the admin dashboard. Admin only.
    pub async fn dashboard_metrics(&self, actor: &Actor) -> ResultEngine<DashboardMetrics> {
        actor.require_role(&[Role::Admin])?;

        with_tx!(self, |db_tx| {
            let user_count = users::Entity::find().count(&db_tx).await?;
            let trail_count = trails::Entity::find().count(&db_tx).await?;
            let guides = users::Entity::find().filter(users::Column::Role.eq(Role::Guide.as_str()));
            let guides_verified = guides
                .clone()
                .filter(users::Column::CadasturVerified.eq(true))
                .count(&db_tx)
                .await?;
            let guides_pending = guides
                .filter(users::Column::CadasturVerified.eq(false))
                .count(&db_tx)
                .await?;
            let open_expeditions = expeditions::Entity::find()
                .filter(
                    expeditions::Column::Status
                        .is_in(OPEN_EXPEDITION_STATUSES.map(|s| s.as_str())),
                )
                .count(&db_tx)
                .await?;

            let by_status: Vec<(String, i64)> = bookings::Entity::find()
                .select_only()
                .column(bookings::Column::Status)
                .column_as(Expr::cust("COUNT(*)"), "bookings")
                .group_by(bookings::Column::Status)
                .into_tuple()
                .all(&db_tx)
                .await?;
            let mut counts = BookingCounts::default();
            for (status, n) in by_status {
                let slot = match BookingStatus::try_from(status.as_str())? {
                    BookingStatus::Pending => &mut counts.pending,
                    BookingStatus::Confirmed => &mut counts.confirmed,
                    BookingStatus::Cancelled => &mut counts.cancelled,
                    BookingStatus::Refunded => &mut counts.refunded,
                };
                *slot = count(n);
            }

            let by_currency: Vec<(String, i64, i64, i64)> = payments::Entity::find()
                .select_only()
                .column(payments::Column::Currency)
                .column_as(Expr::cust("COALESCE(SUM(amount_cents), 0)"), "gross")
                .column_as(
                    Expr::cust(
                        "COALESCE(SUM(CASE WHEN status = 'PAID' THEN fee_cents ELSE 0 END), 0)",
                    ),
                    "fees",
                )
                .column_as(Expr::cust("COALESCE(SUM(refunded_cents), 0)"), "refunded")
                .group_by(payments::Column::Currency)
                .order_by_asc(payments::Column::Currency)
                .into_tuple()
                .all(&db_tx)
                .await?;
            let revenue = by_currency
                .into_iter()
                .map(|(currency, gross, fees, refunded)| {
                    Ok(Revenue {
                        currency: Currency::try_from(currency.as_str())?,
                        gross: MoneyCents::new(gross),
                        fees: MoneyCents::new(fees),
                        refunded: MoneyCents::new(refunded),
                        net: MoneyCents::new(gross - refunded),
                    })
                })
                .collect::<ResultEngine<Vec<_>>>()?;

            Ok(DashboardMetrics {
                users: user_count,
                trails: trail_count,
                guides_verified,
                guides_pending,
                open_expeditions,
                bookings: counts,
                revenue,
            })
        })
    }
}
