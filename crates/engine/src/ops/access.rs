use sea_orm::{ConnectionTrait, prelude::*};
use uuid::Uuid;

use crate::{Actor, EngineError, ResultEngine, Role, bookings, expeditions, trails, users};

use super::Engine;

/// Generates a `require_*` lookup that maps a missing row to `KeyNotFound`.
macro_rules! impl_require {
    ($require_fn:ident, $entity:path, $model:path, $err_msg:literal) => {
        pub(super) async fn $require_fn<C: ConnectionTrait>(
            &self,
            db: &C,
            id: Uuid,
        ) -> ResultEngine<$model> {
            <$entity>::find_by_id(id)
                .one(db)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound($err_msg.to_string()))
        }
    };
}

impl Engine {
    impl_require!(require_user, users::Entity, users::Model, "user not exists");
    impl_require!(require_trail, trails::Entity, trails::Model, "trail not exists");
    impl_require!(
        require_expedition,
        expeditions::Entity,
        expeditions::Model,
        "expedition not exists"
    );
    impl_require!(
        require_booking,
        bookings::Entity,
        bookings::Model,
        "booking not exists"
    );

    /// The expedition's guide or an admin.
    pub(super) fn require_expedition_owner(
        &self,
        actor: &Actor,
        expedition: &expeditions::Model,
    ) -> ResultEngine<()> {
        if actor.is_admin() || (actor.role == Role::Guide && expedition.guide_id == actor.id) {
            return Ok(());
        }
        Err(EngineError::Forbidden(
            "not the guide of this expedition".to_string(),
        ))
    }

    /// Loads the booking together with its expedition, failing with
    /// `Forbidden` unless `actor` is an admin, the trekker or the guide.
    pub(super) async fn require_booking_access<C: ConnectionTrait>(
        &self,
        db: &C,
        booking_id: Uuid,
        actor: &Actor,
    ) -> ResultEngine<(bookings::Model, expeditions::Model)> {
        let booking = self.require_booking(db, booking_id).await?;
        let expedition = self.require_expedition(db, booking.expedition_id).await?;
        let allowed = actor.is_admin()
            || booking.trekker_id == actor.id
            || (actor.role == Role::Guide && expedition.guide_id == actor.id);
        if !allowed {
            return Err(EngineError::Forbidden(
                "booking belongs to another user".to_string(),
            ));
        }
        Ok((booking, expedition))
    }

    /// Self or an admin.
    pub(super) fn require_self_or_admin(&self, actor: &Actor, user_id: Uuid) -> ResultEngine<()> {
        if actor.is_admin() || actor.id == user_id {
            return Ok(());
        }
        Err(EngineError::Forbidden("not your account".to_string()))
    }
}
