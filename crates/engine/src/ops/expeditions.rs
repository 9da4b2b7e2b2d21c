use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ConnectionTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait, prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    ACTIVE_STATUSES, Actor, Availability, EngineError, Expedition, ExpeditionFilter,
    ExpeditionNew, ExpeditionPatch, Page, ResultEngine, Role, bookings, expeditions,
    util::{normalize_optional_text, normalize_required, page_bounds, validate_date_range},
};

use super::{Engine, with_retry, with_serializable_tx, with_tx};

fn validate_price(cents: i64) -> ResultEngine<()> {
    if cents <= 0 {
        return Err(EngineError::Validation(
            "price_per_person must be > 0".to_string(),
        ));
    }
    Ok(())
}

fn validate_max_people(max_people: i32) -> ResultEngine<()> {
    if max_people <= 0 {
        return Err(EngineError::Validation("max_people must be > 0".to_string()));
    }
    Ok(())
}

impl Engine {
    /// Seats held by PENDING and CONFIRMED bookings of an expedition.
    ///
    /// Always recomputed from the booking rows: callers that need a stable
    /// value must run it inside the transaction that acts on it.
    pub(super) async fn occupancy<C: ConnectionTrait>(
        &self,
        db: &C,
        expedition_id: Uuid,
    ) -> ResultEngine<i64> {
        let occupied = bookings::Entity::find()
            .select_only()
            .column_as(Expr::cust("COALESCE(SUM(headcount), 0)"), "occupied")
            .filter(bookings::Column::ExpeditionId.eq(expedition_id))
            .filter(bookings::Column::Status.is_in(ACTIVE_STATUSES.map(|s| s.as_str())))
            .into_tuple::<i64>()
            .one(db)
            .await?;
        Ok(occupied.unwrap_or(0))
    }

    /// Creates an expedition in `DRAFT` unless another status is requested.
    ///
    /// Guides always lead the expeditions they create; admins must name a
    /// guide.
    pub async fn new_expedition(&self, cmd: ExpeditionNew, actor: &Actor) -> ResultEngine<Expedition> {
        actor.require_role(&[Role::Guide, Role::Admin])?;
        let title = normalize_required(&cmd.title, "title", 1)?;
        validate_date_range(cmd.start_date, cmd.end_date)?;
        validate_price(cmd.price_per_person_cents)?;
        validate_max_people(cmd.max_people)?;

        let guide_id = if actor.is_admin() {
            cmd.guide_id.ok_or_else(|| {
                EngineError::Validation("guide_id is required".to_string())
            })?
        } else {
            actor.id
        };

        with_tx!(self, |db_tx| {
            self.require_trail(&db_tx, cmd.trail_id).await?;
            let guide = self.require_user(&db_tx, guide_id).await?;
            if guide.role != Role::Guide.as_str() {
                return Err(EngineError::Validation(
                    "guide_id must reference a guide".to_string(),
                ));
            }

            let model = expeditions::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                trail_id: ActiveValue::Set(cmd.trail_id),
                guide_id: ActiveValue::Set(guide_id),
                title: ActiveValue::Set(title),
                start_date: ActiveValue::Set(cmd.start_date),
                end_date: ActiveValue::Set(cmd.end_date),
                price_per_person_cents: ActiveValue::Set(cmd.price_per_person_cents),
                max_people: ActiveValue::Set(cmd.max_people),
                currency: ActiveValue::Set(cmd.currency.code().to_string()),
                status: ActiveValue::Set(cmd.status.as_str().to_string()),
                description: ActiveValue::Set(normalize_optional_text(cmd.description.as_deref())),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;

            tracing::info!(expedition_id = %model.id, %guide_id, "expedition created");
            Expedition::try_from(model)
        })
    }

    pub async fn expedition(&self, expedition_id: Uuid) -> ResultEngine<Expedition> {
        let model = self.require_expedition(&self.database, expedition_id).await?;
        Expedition::try_from(model)
    }

    /// Lists expeditions ordered by `start_date` ascending.
    pub async fn list_expeditions(&self, filter: ExpeditionFilter) -> ResultEngine<Page<Expedition>> {
        let (page, page_size) = page_bounds(filter.page, filter.page_size);

        let mut query = expeditions::Entity::find();
        if let Some(trail_id) = filter.trail_id {
            query = query.filter(expeditions::Column::TrailId.eq(trail_id));
        }
        if let Some(guide_id) = filter.guide_id {
            query = query.filter(expeditions::Column::GuideId.eq(guide_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(expeditions::Column::Status.eq(status.as_str()));
        }
        if let Some(from) = filter.from {
            query = query.filter(expeditions::Column::StartDate.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(expeditions::Column::StartDate.lt(to));
        }

        let total = query.clone().count(&self.database).await?;
        let items = query
            .order_by_asc(expeditions::Column::StartDate)
            .order_by_asc(expeditions::Column::Id)
            .offset((page - 1) * page_size)
            .limit(page_size)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Expedition::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;

        Ok(Page {
            items,
            total,
            page,
            page_size,
        })
    }

    /// Updates an expedition. Only its guide or an admin may do it.
    ///
    /// Runs under the expedition lock so `max_people` is checked against an
    /// occupancy no reservation can change meanwhile.
    pub async fn update_expedition(
        &self,
        expedition_id: Uuid,
        patch: ExpeditionPatch,
        actor: &Actor,
    ) -> ResultEngine<Expedition> {
        let title = patch
            .title
            .as_deref()
            .map(|t| normalize_required(t, "title", 1))
            .transpose()?;
        if let Some(cents) = patch.price_per_person_cents {
            validate_price(cents)?;
        }
        if let Some(max_people) = patch.max_people {
            validate_max_people(max_people)?;
        }

        let _guard = self.locks.acquire(expedition_id).await;
        with_retry!(
            self,
            "expedition update",
            self.try_update_expedition(expedition_id, title.as_deref(), &patch, actor)
                .await
        )
    }

    async fn try_update_expedition(
        &self,
        expedition_id: Uuid,
        title: Option<&str>,
        patch: &ExpeditionPatch,
        actor: &Actor,
    ) -> ResultEngine<Expedition> {
        with_serializable_tx!(self, |db_tx| {
            let current = self.require_expedition(&db_tx, expedition_id).await?;
            self.require_expedition_owner(actor, &current)?;

            let start = patch.start_date.unwrap_or(current.start_date);
            let end = patch.end_date.unwrap_or(current.end_date);
            validate_date_range(start, end)?;

            if let Some(max_people) = patch.max_people {
                let occupied = self.occupancy(&db_tx, expedition_id).await?;
                if i64::from(max_people) < occupied {
                    return Err(EngineError::Validation(format!(
                        "max_people cannot drop below the {occupied} seats already booked"
                    )));
                }
            }

            let mut model: expeditions::ActiveModel = current.into();
            if let Some(title) = title {
                model.title = ActiveValue::Set(title.to_string());
            }
            model.start_date = ActiveValue::Set(start);
            model.end_date = ActiveValue::Set(end);
            if let Some(cents) = patch.price_per_person_cents {
                model.price_per_person_cents = ActiveValue::Set(cents);
            }
            if let Some(max_people) = patch.max_people {
                model.max_people = ActiveValue::Set(max_people);
            }
            if let Some(status) = patch.status {
                model.status = ActiveValue::Set(status.as_str().to_string());
            }
            if let Some(description) = patch.description.as_deref() {
                model.description = ActiveValue::Set(normalize_optional_text(Some(description)));
            }
            let model = model.update(&db_tx).await?;
            Expedition::try_from(model)
        })
    }

    /// Capacity, occupancy and seats left on an expedition.
    pub async fn availability(&self, expedition_id: Uuid) -> ResultEngine<Availability> {
        with_tx!(self, |db_tx| {
            let model = self.require_expedition(&db_tx, expedition_id).await?;
            let expedition = Expedition::try_from(model)?;
            let occupied = self.occupancy(&db_tx, expedition_id).await?;
            Ok(Availability::new(
                expedition.id,
                expedition.max_people,
                occupied,
                expedition.status,
            ))
        })
    }
}
