use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait, prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    Actor, EngineError, Page, ResultEngine, Role, Trail, TrailFilter, TrailNew, TrailPatch,
    trails,
    util::{normalize_optional_text, normalize_required, page_bounds},
};

use super::{Engine, with_tx};

/// A state with the number of trails it has.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrailState {
    pub state: String,
    pub trails: u64,
}

fn normalize_state(value: &str) -> ResultEngine<String> {
    let state = value.trim().to_ascii_uppercase();
    if state.len() != 2 || !state.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(EngineError::Validation(format!(
            "state must be a two-letter code, got {value:?}"
        )));
    }
    Ok(state)
}

fn validate_measures(
    distance_meters: Option<i64>,
    elevation_gain_m: Option<i32>,
    entry_fee_cents: Option<i64>,
) -> ResultEngine<()> {
    if distance_meters.is_some_and(|d| d <= 0) {
        return Err(EngineError::Validation(
            "distance_meters must be > 0".to_string(),
        ));
    }
    if elevation_gain_m.is_some_and(|e| e < 0) {
        return Err(EngineError::Validation(
            "elevation_gain_m must be >= 0".to_string(),
        ));
    }
    if entry_fee_cents.is_some_and(|f| f < 0) {
        return Err(EngineError::Validation(
            "entry_fee must be >= 0".to_string(),
        ));
    }
    Ok(())
}

impl Engine {
    /// Admin only.
    pub async fn new_trail(&self, cmd: TrailNew, actor: &Actor) -> ResultEngine<Trail> {
        actor.require_role(&[Role::Admin])?;
        let name = normalize_required(&cmd.name, "name", 2)?;
        let state = normalize_state(&cmd.state)?;
        let city = normalize_required(&cmd.city, "city", 2)?;
        let region_or_park = normalize_required(&cmd.region_or_park, "region_or_park", 2)?;
        validate_measures(
            Some(cmd.distance_meters),
            Some(cmd.elevation_gain_m),
            cmd.entry_fee_cents,
        )?;

        let model = trails::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4()),
            name: ActiveValue::Set(name),
            state: ActiveValue::Set(state),
            city: ActiveValue::Set(city),
            region_or_park: ActiveValue::Set(region_or_park),
            distance_meters: ActiveValue::Set(cmd.distance_meters),
            elevation_gain_m: ActiveValue::Set(cmd.elevation_gain_m),
            difficulty: ActiveValue::Set(cmd.difficulty.as_str().to_string()),
            requires_guide: ActiveValue::Set(cmd.requires_guide),
            entry_fee_cents: ActiveValue::Set(cmd.entry_fee_cents),
            description: ActiveValue::Set(normalize_optional_text(cmd.description.as_deref())),
            created_at: ActiveValue::Set(Utc::now()),
        }
        .insert(&self.database)
        .await?;

        tracing::info!(trail_id = %model.id, name = %model.name, "trail created");
        Trail::try_from(model)
    }

    pub async fn trail(&self, trail_id: Uuid) -> ResultEngine<Trail> {
        let model = self.require_trail(&self.database, trail_id).await?;
        Trail::try_from(model)
    }

    /// Lists trails ordered by name.
    pub async fn list_trails(&self, filter: TrailFilter) -> ResultEngine<Page<Trail>> {
        let (page, page_size) = page_bounds(filter.page, filter.page_size);

        let mut query = trails::Entity::find();
        if let Some(state) = filter.state.as_deref() {
            query = query.filter(trails::Column::State.eq(normalize_state(state)?));
        }
        if let Some(difficulty) = filter.difficulty {
            query = query.filter(trails::Column::Difficulty.eq(difficulty.as_str()));
        }

        let total = query.clone().count(&self.database).await?;
        let items = query
            .order_by_asc(trails::Column::Name)
            .order_by_asc(trails::Column::Id)
            .offset((page - 1) * page_size)
            .limit(page_size)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Trail::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;

        Ok(Page {
            items,
            total,
            page,
            page_size,
        })
    }

    /// Admin only.
    pub async fn update_trail(
        &self,
        trail_id: Uuid,
        patch: TrailPatch,
        actor: &Actor,
    ) -> ResultEngine<Trail> {
        actor.require_role(&[Role::Admin])?;
        validate_measures(
            patch.distance_meters,
            patch.elevation_gain_m,
            patch.entry_fee_cents.flatten(),
        )?;

        with_tx!(self, |db_tx| {
            let current = self.require_trail(&db_tx, trail_id).await?;
            let mut model: trails::ActiveModel = current.into();

            if let Some(name) = patch.name.as_deref() {
                model.name = ActiveValue::Set(normalize_required(name, "name", 2)?);
            }
            if let Some(state) = patch.state.as_deref() {
                model.state = ActiveValue::Set(normalize_state(state)?);
            }
            if let Some(city) = patch.city.as_deref() {
                model.city = ActiveValue::Set(normalize_required(city, "city", 2)?);
            }
            if let Some(region) = patch.region_or_park.as_deref() {
                model.region_or_park =
                    ActiveValue::Set(normalize_required(region, "region_or_park", 2)?);
            }
            if let Some(distance) = patch.distance_meters {
                model.distance_meters = ActiveValue::Set(distance);
            }
            if let Some(elevation) = patch.elevation_gain_m {
                model.elevation_gain_m = ActiveValue::Set(elevation);
            }
            if let Some(difficulty) = patch.difficulty {
                model.difficulty = ActiveValue::Set(difficulty.as_str().to_string());
            }
            if let Some(requires_guide) = patch.requires_guide {
                model.requires_guide = ActiveValue::Set(requires_guide);
            }
            if let Some(fee) = patch.entry_fee_cents {
                model.entry_fee_cents = ActiveValue::Set(fee);
            }
            if let Some(description) = patch.description.as_deref() {
                model.description = ActiveValue::Set(normalize_optional_text(Some(description)));
            }

            let model = model.update(&db_tx).await?;
            Trail::try_from(model)
        })
    }

    /// Admin only. Expeditions and their bookings go with the trail.
    pub async fn delete_trail(&self, trail_id: Uuid, actor: &Actor) -> ResultEngine<()> {
        actor.require_role(&[Role::Admin])?;
        with_tx!(self, |db_tx| {
            self.require_trail(&db_tx, trail_id).await?;
            trails::Entity::delete_by_id(trail_id).exec(&db_tx).await?;
            tracing::info!(%trail_id, "trail deleted");
            Ok(())
        })
    }

    /// Distinct states with at least one trail, alphabetically.
    pub async fn trail_states(&self) -> ResultEngine<Vec<TrailState>> {
        let rows: Vec<(String, i64)> = trails::Entity::find()
            .select_only()
            .column(trails::Column::State)
            .column_as(Expr::cust("COUNT(*)"), "trails")
            .group_by(trails::Column::State)
            .order_by_asc(trails::Column::State)
            .into_tuple()
            .all(&self.database)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(state, trails)| TrailState {
                state,
                trails: u64::try_from(trails).unwrap_or_default(),
            })
            .collect())
    }
}
