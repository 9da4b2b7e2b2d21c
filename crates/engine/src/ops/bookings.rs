use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue, ConnectionTrait, DatabaseTransaction, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    Actor, AuditAction, AuditEntity, Booking, BookingFilter, BookingPatch, BookingStatus,
    Commission, CommissionRates, EngineError, Expedition, MAX_HEADCOUNT, MoneyCents, Page,
    RefundQuote, ReserveCmd, ResultEngine, Role, bookings, bookings::generate_code, commission,
    expeditions, refund,
    util::{normalize_optional_text, page_bounds},
};

use super::{Engine, audit, with_retry, with_serializable_tx, with_tx};

fn validate_headcount(headcount: i32) -> ResultEngine<()> {
    if !(1..=MAX_HEADCOUNT).contains(&headcount) {
        return Err(EngineError::Validation(format!(
            "headcount must be between 1 and {MAX_HEADCOUNT}, got {headcount}"
        )));
    }
    Ok(())
}

fn bps_column(bps: Option<u32>) -> ResultEngine<Option<i32>> {
    bps.map(commission::validate_rate)
        .transpose()?
        .map(i32::try_from)
        .transpose()
        .map_err(|_| EngineError::Validation("commission rate out of range".to_string()))
}

/// Marks a booking model as cancelled and records the refund owed at `now`.
fn apply_cancellation(
    model: &mut bookings::ActiveModel,
    total_cents: i64,
    expedition: &expeditions::Model,
    reason: Option<String>,
    now: DateTime<Utc>,
) -> RefundQuote {
    let quote = refund::calculate(total_cents.into(), expedition.start_date, now);
    model.status = ActiveValue::Set(BookingStatus::Cancelled.as_str().to_string());
    model.cancelled_at = ActiveValue::Set(Some(now));
    model.cancellation_reason = ActiveValue::Set(reason);
    model.refund_cents = ActiveValue::Set(Some(quote.refund.cents()));
    quote
}

/// The booking being closed as `REFUNDED`, as it was before the change.
pub(super) struct RefundTarget<'a> {
    pub status: BookingStatus,
    pub refund_cents: Option<i64>,
    pub total_cents: i64,
    pub expedition: &'a expeditions::Model,
}

/// Marks a booking model as refunded and returns the amount given back.
///
/// An active booking is cancelled first, so its refund is quoted at `now`.
/// A cancelled booking keeps the amount quoted when it was cancelled.
pub(super) fn apply_refund(
    model: &mut bookings::ActiveModel,
    target: &RefundTarget<'_>,
    reason: Option<String>,
    now: DateTime<Utc>,
) -> MoneyCents {
    let refund = match target.refund_cents {
        Some(cents) if !target.status.is_active() => MoneyCents::new(cents),
        _ => apply_cancellation(model, target.total_cents, target.expedition, reason, now).refund,
    };
    model.status = ActiveValue::Set(BookingStatus::Refunded.as_str().to_string());
    model.refund_cents = ActiveValue::Set(Some(refund.cents()));
    refund
}

fn bps_detail(bps: Option<u32>) -> String {
    match bps {
        Some(bps) => format!("rate_bps={bps}"),
        None => "rate_bps=none".to_string(),
    }
}

impl Engine {
    /// Reserves `cmd.headcount` seats on an expedition for `actor`.
    ///
    /// The occupancy read and the insert of the new `PENDING` booking happen in
    /// one transaction, run while holding the expedition lock. If the store
    /// still reports a serialization conflict the whole attempt is retried with
    /// backoff, and `Conflict` is returned once the retry budget is spent.
    ///
    /// Rejections persist nothing:
    /// - `Validation` when the headcount is outside `1..=100`;
    /// - `KeyNotFound` when the expedition does not exist;
    /// - `NotBookable` when the expedition is not open for bookings;
    /// - `CapacityExceeded` when the seats left are fewer than requested.
    pub async fn reserve(&self, cmd: ReserveCmd, actor: &Actor) -> ResultEngine<Booking> {
        actor.require_role(&[Role::Trekker, Role::Guide, Role::Admin])?;
        validate_headcount(cmd.headcount)?;
        let notes = normalize_optional_text(cmd.notes.as_deref());

        let _guard = self.locks.acquire(cmd.expedition_id).await;
        let booking = with_retry!(
            self,
            "reservation",
            self.try_reserve(&cmd, notes.clone(), actor).await
        )?;

        tracing::info!(
            booking_id = %booking.id,
            code = %booking.code,
            expedition_id = %booking.expedition_id,
            headcount = booking.headcount,
            "reservation accepted"
        );
        Ok(booking)
    }

    async fn try_reserve(
        &self,
        cmd: &ReserveCmd,
        notes: Option<String>,
        actor: &Actor,
    ) -> ResultEngine<Booking> {
        with_serializable_tx!(self, |db_tx| {
            let expedition =
                Expedition::try_from(self.require_expedition(&db_tx, cmd.expedition_id).await?)?;
            if !expedition.status.is_bookable() {
                return Err(EngineError::NotBookable(format!(
                    "expedition is {}",
                    expedition.status.as_str()
                )));
            }

            let requested = i64::from(cmd.headcount);
            self.ensure_seats(&db_tx, &expedition, requested).await?;

            let total = expedition
                .price_per_person
                .checked_mul(requested)
                .ok_or_else(|| EngineError::Validation("booking total overflows".to_string()))?;

            let model = bookings::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                code: ActiveValue::Set(generate_code()),
                expedition_id: ActiveValue::Set(expedition.id),
                trekker_id: ActiveValue::Set(actor.id),
                headcount: ActiveValue::Set(cmd.headcount),
                total_cents: ActiveValue::Set(total.cents()),
                currency: ActiveValue::Set(expedition.currency.code().to_string()),
                status: ActiveValue::Set(BookingStatus::Pending.as_str().to_string()),
                notes: ActiveValue::Set(notes),
                commission_rate_bps: ActiveValue::Set(None),
                refund_cents: ActiveValue::Set(None),
                cancellation_reason: ActiveValue::Set(None),
                created_at: ActiveValue::Set(Utc::now()),
                confirmed_at: ActiveValue::Set(None),
                cancelled_at: ActiveValue::Set(None),
            }
            .insert(&db_tx)
            .await?;

            audit::record(
                &db_tx,
                actor,
                AuditEntity::Booking,
                model.id,
                AuditAction::BookingReserved,
                Some(format!(
                    "headcount={} total_cents={}",
                    model.headcount, model.total_cents
                )),
            )
            .await?;
            Booking::try_from(model)
        })
    }

    /// Fails with `CapacityExceeded` unless `requested` more seats fit.
    async fn ensure_seats(
        &self,
        db_tx: &DatabaseTransaction,
        expedition: &Expedition,
        requested: i64,
    ) -> ResultEngine<()> {
        let occupied = self.occupancy(db_tx, expedition.id).await?;
        let capacity = i64::from(expedition.max_people);
        if occupied + requested > capacity {
            let available = (capacity - occupied).max(0);
            tracing::debug!(
                expedition_id = %expedition.id,
                occupied,
                requested,
                capacity,
                "reservation rejected"
            );
            return Err(EngineError::CapacityExceeded(format!(
                "{requested} seats requested, {available} available"
            )));
        }
        Ok(())
    }

    pub async fn booking(&self, booking_id: Uuid, actor: &Actor) -> ResultEngine<Booking> {
        let (model, _) = self
            .require_booking_access(&self.database, booking_id, actor)
            .await?;
        Booking::try_from(model)
    }

    /// Lists bookings newest first.
    ///
    /// Trekkers only see their own bookings and guides only the bookings of
    /// their expeditions; filters narrow the result further.
    pub async fn list_bookings(
        &self,
        filter: BookingFilter,
        actor: &Actor,
    ) -> ResultEngine<Page<Booking>> {
        let (page, page_size) = page_bounds(filter.page, filter.page_size);

        let mut query = bookings::Entity::find();
        match actor.role {
            Role::Admin => {}
            Role::Trekker => {
                query = query.filter(bookings::Column::TrekkerId.eq(actor.id));
            }
            Role::Guide => {
                query = query
                    .inner_join(expeditions::Entity)
                    .filter(expeditions::Column::GuideId.eq(actor.id));
            }
        }
        if let Some(expedition_id) = filter.expedition_id {
            query = query.filter(bookings::Column::ExpeditionId.eq(expedition_id));
        }
        if let Some(trekker_id) = filter.trekker_id {
            query = query.filter(bookings::Column::TrekkerId.eq(trekker_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(bookings::Column::Status.eq(status.as_str()));
        }

        let total = query.clone().count(&self.database).await?;
        let items = query
            .order_by_desc(bookings::Column::CreatedAt)
            .order_by_desc(bookings::Column::Id)
            .offset((page - 1) * page_size)
            .limit(page_size)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Booking::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;

        Ok(Page {
            items,
            total,
            page,
            page_size,
        })
    }

    /// Changes status, notes or the commission override of a booking.
    ///
    /// Trekkers may only cancel; commission overrides are admin only. A
    /// booking moving from an inactive to an active status takes seats again,
    /// so the capacity check is rerun exactly as in [`Engine::reserve`].
    pub async fn update_booking(
        &self,
        booking_id: Uuid,
        patch: BookingPatch,
        actor: &Actor,
    ) -> ResultEngine<Booking> {
        if patch.is_empty() {
            return Err(EngineError::Validation("nothing to update".to_string()));
        }
        if patch.commission_rate_bps.is_some() && !actor.is_admin() {
            return Err(EngineError::Forbidden(
                "only admins can override commission".to_string(),
            ));
        }

        let expedition_id = self
            .require_booking(&self.database, booking_id)
            .await?
            .expedition_id;
        let _guard = self.locks.acquire(expedition_id).await;
        let booking = with_retry!(
            self,
            "booking update",
            self.try_update_booking(booking_id, &patch, actor, Utc::now())
                .await
        )?;
        tracing::info!(booking_id = %booking.id, status = booking.status.as_str(), "booking updated");
        Ok(booking)
    }

    async fn try_update_booking(
        &self,
        booking_id: Uuid,
        patch: &BookingPatch,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> ResultEngine<Booking> {
        with_serializable_tx!(self, |db_tx| {
            let (current, expedition_model) = self
                .require_booking_access(&db_tx, booking_id, actor)
                .await?;
            let current_status = BookingStatus::try_from(current.status.as_str())?;
            let is_trekker_only = !actor.is_admin() && expedition_model.guide_id != actor.id;
            let total_cents = current.total_cents;
            let current_refund = current.refund_cents;
            let headcount = i64::from(current.headcount);

            let mut model: bookings::ActiveModel = current.into();

            let status_change = patch.status.filter(|s| *s != current_status);
            if let Some(status) = status_change {
                if is_trekker_only && status != BookingStatus::Cancelled {
                    return Err(EngineError::Forbidden(
                        "trekkers can only cancel their bookings".to_string(),
                    ));
                }
                if status == BookingStatus::Cancelled && !current_status.is_active() {
                    return Err(EngineError::Validation(format!(
                        "booking is already {}",
                        current_status.as_str()
                    )));
                }

                if status.is_active() && !current_status.is_active() {
                    let expedition = Expedition::try_from(expedition_model.clone())?;
                    if !expedition.status.is_bookable() {
                        return Err(EngineError::NotBookable(format!(
                            "expedition is {}",
                            expedition.status.as_str()
                        )));
                    }
                    self.ensure_seats(&db_tx, &expedition, headcount).await?;
                    model.cancelled_at = ActiveValue::Set(None);
                    model.cancellation_reason = ActiveValue::Set(None);
                    model.refund_cents = ActiveValue::Set(None);
                }

                match status {
                    BookingStatus::Cancelled => {
                        apply_cancellation(&mut model, total_cents, &expedition_model, None, now);
                    }
                    BookingStatus::Confirmed => {
                        model.status = ActiveValue::Set(status.as_str().to_string());
                        model.confirmed_at = ActiveValue::Set(Some(now));
                    }
                    BookingStatus::Refunded => {
                        let target = RefundTarget {
                            status: current_status,
                            refund_cents: current_refund,
                            total_cents,
                            expedition: &expedition_model,
                        };
                        apply_refund(&mut model, &target, None, now);
                    }
                    BookingStatus::Pending => {
                        model.status = ActiveValue::Set(status.as_str().to_string());
                        model.confirmed_at = ActiveValue::Set(None);
                    }
                }
            }

            if let Some(notes) = patch.notes.as_deref() {
                model.notes = ActiveValue::Set(normalize_optional_text(Some(notes)));
            }
            if let Some(bps) = patch.commission_rate_bps {
                model.commission_rate_bps = ActiveValue::Set(bps_column(bps)?);
            }

            let model = model.update(&db_tx).await?;

            if let Some(status) = status_change {
                audit::record(
                    &db_tx,
                    actor,
                    AuditEntity::Booking,
                    booking_id,
                    AuditAction::BookingUpdated,
                    Some(format!(
                        "status={}->{}",
                        current_status.as_str(),
                        status.as_str()
                    )),
                )
                .await?;
            }
            if let Some(bps) = patch.commission_rate_bps {
                audit::record(
                    &db_tx,
                    actor,
                    AuditEntity::Booking,
                    booking_id,
                    AuditAction::CommissionOverridden,
                    Some(bps_detail(bps)),
                )
                .await?;
            }
            Booking::try_from(model)
        })
    }

    /// Cancels a booking, freeing its seats immediately, and records the
    /// refund owed according to how long before the start it happens.
    pub async fn cancel_booking(
        &self,
        booking_id: Uuid,
        reason: Option<&str>,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> ResultEngine<Booking> {
        let reason = normalize_optional_text(reason);
        with_tx!(self, |db_tx| {
            let (current, expedition) = self
                .require_booking_access(&db_tx, booking_id, actor)
                .await?;
            let status = BookingStatus::try_from(current.status.as_str())?;
            if !status.is_active() {
                return Err(EngineError::Validation(format!(
                    "booking is already {}",
                    status.as_str()
                )));
            }

            let total_cents = current.total_cents;
            let mut model: bookings::ActiveModel = current.into();
            let quote = apply_cancellation(&mut model, total_cents, &expedition, reason, now);
            let model = model.update(&db_tx).await?;
            audit::record(
                &db_tx,
                actor,
                AuditEntity::Booking,
                booking_id,
                AuditAction::BookingCancelled,
                Some(format!(
                    "refund_cents={} refund_bps={}",
                    quote.refund.cents(),
                    quote.refund_bps
                )),
            )
            .await?;

            tracing::info!(
                %booking_id,
                refund_cents = quote.refund.cents(),
                refund_bps = quote.refund_bps,
                "booking cancelled"
            );
            Booking::try_from(model)
        })
    }

    /// What cancelling the booking at `now` would refund.
    pub async fn refund_quote(
        &self,
        booking_id: Uuid,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> ResultEngine<RefundQuote> {
        let (booking, expedition) = self
            .require_booking_access(&self.database, booking_id, actor)
            .await?;
        Ok(refund::calculate(
            booking.total_cents.into(),
            expedition.start_date,
            now,
        ))
    }

    /// Platform commission on a booking. Not visible to trekkers.
    pub async fn booking_commission(
        &self,
        booking_id: Uuid,
        actor: &Actor,
    ) -> ResultEngine<Commission> {
        let (booking, expedition) = self
            .require_booking_access(&self.database, booking_id, actor)
            .await?;
        self.require_expedition_owner(actor, &expedition)?;
        self.commission_for(&self.database, booking, &expedition)
            .await
    }

    /// Commission on `booking` under the global, guide and booking rates.
    pub(super) async fn commission_for<C: ConnectionTrait>(
        &self,
        db: &C,
        booking: bookings::Model,
        expedition: &expeditions::Model,
    ) -> ResultEngine<Commission> {
        let guide = self.require_user(db, expedition.guide_id).await?;
        let booking = Booking::try_from(booking)?;
        let rates = CommissionRates {
            global_bps: self.commission_bps,
            guide_bps: guide.commission_rate_bps.and_then(|b| u32::try_from(b).ok()),
            booking_bps: booking.commission_rate_bps,
        };
        commission::calculate(booking.total, rates)
    }

    pub async fn delete_booking(&self, booking_id: Uuid, actor: &Actor) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let (booking, _) = self
                .require_booking_access(&db_tx, booking_id, actor)
                .await?;
            bookings::Entity::delete_by_id(booking.id)
                .exec(&db_tx)
                .await?;
            audit::record(
                &db_tx,
                actor,
                AuditEntity::Booking,
                booking_id,
                AuditAction::BookingDeleted,
                Some(format!("code={}", booking.code)),
            )
            .await?;
            tracing::info!(%booking_id, "booking deleted");
            Ok(())
        })
    }
}
