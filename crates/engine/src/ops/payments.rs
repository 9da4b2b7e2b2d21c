use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue, ConnectionTrait, QueryFilter, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    Actor, AuditAction, AuditEntity, BookingStatus, EngineError, Payment, PaymentCapture,
    PaymentRefund, PaymentStatus, ResultEngine, Role, bookings, payments,
    util::normalize_optional_text,
};

use super::{
    Engine, audit,
    bookings::{RefundTarget, apply_refund},
    with_retry, with_serializable_tx,
};

impl Engine {
    /// Records the payment of a booking and confirms it. Admin only.
    ///
    /// The payment holds the booking total with the platform commission split
    /// off. A booking is paid at most once; cancelled or refunded bookings
    /// cannot be paid.
    pub async fn capture_payment(
        &self,
        booking_id: Uuid,
        cmd: PaymentCapture,
        actor: &Actor,
    ) -> ResultEngine<Payment> {
        actor.require_role(&[Role::Admin])?;
        let reference = normalize_optional_text(cmd.reference.as_deref());

        let expedition_id = self
            .require_booking(&self.database, booking_id)
            .await?
            .expedition_id;
        let _guard = self.locks.acquire(expedition_id).await;
        let payment = with_retry!(
            self,
            "payment capture",
            self.try_capture_payment(booking_id, &cmd, reference.clone(), actor, Utc::now())
                .await
        )?;

        tracing::info!(
            %booking_id,
            payment_id = %payment.id,
            amount_cents = payment.amount.cents(),
            "payment captured"
        );
        Ok(payment)
    }

    async fn try_capture_payment(
        &self,
        booking_id: Uuid,
        cmd: &PaymentCapture,
        reference: Option<String>,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> ResultEngine<Payment> {
        with_serializable_tx!(self, |db_tx| {
            let (booking, expedition) = self
                .require_booking_access(&db_tx, booking_id, actor)
                .await?;
            let status = BookingStatus::try_from(booking.status.as_str())?;
            if !status.is_active() {
                return Err(EngineError::Validation(format!(
                    "cannot capture a payment for a {} booking",
                    status.as_str()
                )));
            }
            if self.find_payment(&db_tx, booking_id).await?.is_some() {
                return Err(EngineError::ExistingKey(format!(
                    "payment for {}",
                    booking.code
                )));
            }

            let split = self
                .commission_for(&db_tx, booking.clone(), &expedition)
                .await?;
            let payment = payments::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                booking_id: ActiveValue::Set(booking_id),
                method: ActiveValue::Set(cmd.method.as_str().to_string()),
                status: ActiveValue::Set(PaymentStatus::Paid.as_str().to_string()),
                amount_cents: ActiveValue::Set(split.amount.cents()),
                fee_cents: ActiveValue::Set(split.commission.cents()),
                net_cents: ActiveValue::Set(split.net.cents()),
                refunded_cents: ActiveValue::Set(None),
                currency: ActiveValue::Set(booking.currency.clone()),
                reference: ActiveValue::Set(reference),
                refund_reason: ActiveValue::Set(None),
                captured_by: ActiveValue::Set(actor.id),
                captured_at: ActiveValue::Set(now),
                refunded_at: ActiveValue::Set(None),
            }
            .insert(&db_tx)
            .await?;

            let confirmed_at = booking.confirmed_at.unwrap_or(now);
            let mut model: bookings::ActiveModel = booking.into();
            model.status = ActiveValue::Set(BookingStatus::Confirmed.as_str().to_string());
            model.confirmed_at = ActiveValue::Set(Some(confirmed_at));
            model.update(&db_tx).await?;

            audit::record(
                &db_tx,
                actor,
                AuditEntity::Payment,
                payment.id,
                AuditAction::PaymentCaptured,
                Some(format!(
                    "booking_id={booking_id} amount_cents={} fee_cents={}",
                    payment.amount_cents, payment.fee_cents
                )),
            )
            .await?;
            Payment::try_from(payment)
        })
    }

    /// Refunds the captured payment of a booking and closes the booking as
    /// `REFUNDED`. Admin only.
    ///
    /// The amount follows the refund windows: an active booking is quoted at
    /// `now`, a cancelled one keeps the amount quoted at cancellation.
    pub async fn refund_payment(
        &self,
        booking_id: Uuid,
        cmd: PaymentRefund,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> ResultEngine<Payment> {
        actor.require_role(&[Role::Admin])?;
        let reason = normalize_optional_text(cmd.reason.as_deref());

        let expedition_id = self
            .require_booking(&self.database, booking_id)
            .await?
            .expedition_id;
        let _guard = self.locks.acquire(expedition_id).await;
        let payment = with_retry!(
            self,
            "payment refund",
            self.try_refund_payment(booking_id, reason.clone(), actor, now)
                .await
        )?;

        tracing::info!(
            %booking_id,
            payment_id = %payment.id,
            refunded_cents = payment.refunded.map(|r| r.cents()).unwrap_or_default(),
            "payment refunded"
        );
        Ok(payment)
    }

    async fn try_refund_payment(
        &self,
        booking_id: Uuid,
        reason: Option<String>,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> ResultEngine<Payment> {
        with_serializable_tx!(self, |db_tx| {
            let (booking, expedition) = self
                .require_booking_access(&db_tx, booking_id, actor)
                .await?;
            let payment = self
                .find_payment(&db_tx, booking_id)
                .await?
                .ok_or_else(|| {
                    EngineError::Validation("booking has no captured payment".to_string())
                })?;
            let payment_status = PaymentStatus::try_from(payment.status.as_str())?;
            if payment_status != PaymentStatus::Paid {
                return Err(EngineError::Validation(format!(
                    "payment is already {}",
                    payment_status.as_str()
                )));
            }

            let target = RefundTarget {
                status: BookingStatus::try_from(booking.status.as_str())?,
                refund_cents: booking.refund_cents,
                total_cents: booking.total_cents,
                expedition: &expedition,
            };
            let mut model: bookings::ActiveModel = booking.into();
            let refund = apply_refund(&mut model, &target, reason.clone(), now);
            model.update(&db_tx).await?;

            let mut payment: payments::ActiveModel = payment.into();
            payment.status = ActiveValue::Set(PaymentStatus::Refunded.as_str().to_string());
            payment.refunded_cents = ActiveValue::Set(Some(refund.cents()));
            payment.refund_reason = ActiveValue::Set(reason);
            payment.refunded_at = ActiveValue::Set(Some(now));
            let payment = payment.update(&db_tx).await?;

            audit::record(
                &db_tx,
                actor,
                AuditEntity::Payment,
                payment.id,
                AuditAction::PaymentRefunded,
                Some(format!(
                    "booking_id={booking_id} refunded_cents={}",
                    refund.cents()
                )),
            )
            .await?;
            Payment::try_from(payment)
        })
    }

    /// The payment of a booking, for anyone who can see the booking.
    pub async fn booking_payment(&self, booking_id: Uuid, actor: &Actor) -> ResultEngine<Payment> {
        self.require_booking_access(&self.database, booking_id, actor)
            .await?;
        let model = self
            .find_payment(&self.database, booking_id)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("payment not exists".to_string()))?;
        Payment::try_from(model)
    }

    async fn find_payment<C: ConnectionTrait>(
        &self,
        db: &C,
        booking_id: Uuid,
    ) -> ResultEngine<Option<payments::Model>> {
        Ok(payments::Entity::find()
            .filter(payments::Column::BookingId.eq(booking_id))
            .one(db)
            .await?)
    }
}
