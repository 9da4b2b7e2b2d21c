use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ConnectionTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, prelude::*,
};
use uuid::Uuid;

use crate::{
    Actor, AuditAction, AuditEntity, AuditEntry, AuditFilter, Page, ResultEngine, Role, audit,
    util::page_bounds,
};

use super::Engine;

/// Appends an audit row on `db`, inside the caller's transaction so the row
/// only exists if the audited change commits.
pub(super) async fn record<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
    entity: AuditEntity,
    entity_id: Uuid,
    action: AuditAction,
    detail: Option<String>,
) -> ResultEngine<()> {
    audit::ActiveModel {
        id: ActiveValue::Set(Uuid::new_v4()),
        actor_id: ActiveValue::Set(actor.id),
        entity: ActiveValue::Set(entity.as_str().to_string()),
        entity_id: ActiveValue::Set(entity_id),
        action: ActiveValue::Set(action.as_str().to_string()),
        detail: ActiveValue::Set(detail),
        created_at: ActiveValue::Set(Utc::now()),
    }
    .insert(db)
    .await?;
    tracing::debug!(%entity_id, action = action.as_str(), "audit entry recorded");
    Ok(())
}

impl Engine {
    /// Admin only. Newest first.
    pub async fn audit_log(
        &self,
        filter: AuditFilter,
        actor: &Actor,
    ) -> ResultEngine<Page<AuditEntry>> {
        actor.require_role(&[Role::Admin])?;
        let (page, page_size) = page_bounds(filter.page, filter.page_size);

        let mut query = audit::Entity::find();
        if let Some(entity) = filter.entity {
            query = query.filter(audit::Column::Entity.eq(entity.as_str()));
        }
        if let Some(entity_id) = filter.entity_id {
            query = query.filter(audit::Column::EntityId.eq(entity_id));
        }
        if let Some(action) = filter.action {
            query = query.filter(audit::Column::Action.eq(action.as_str()));
        }

        let total = query.clone().count(&self.database).await?;
        let items = query
            .order_by_desc(audit::Column::CreatedAt)
            .order_by_desc(audit::Column::Id)
            .offset((page - 1) * page_size)
            .limit(page_size)
            .all(&self.database)
            .await?
            .into_iter()
            .map(AuditEntry::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;

        Ok(Page {
            items,
            total,
            page,
            page_size,
        })
    }
}
