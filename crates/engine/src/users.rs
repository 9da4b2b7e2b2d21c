//! Marketplace users: admins, guides and trekkers.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// What a user is allowed to do on the marketplace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Guide,
    Trekker,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Guide => "GUIDE",
            Self::Trekker => "TREKKER",
        }
    }
}

impl TryFrom<&str> for Role {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Self::Admin),
            "GUIDE" => Ok(Self::Guide),
            "TREKKER" => Ok(Self::Trekker),
            other => Err(EngineError::Validation(format!("invalid role: {other}"))),
        }
    }
}

/// The authenticated caller of an engine operation.
///
/// Every write and every scoped read takes an `Actor`: the engine decides what
/// the caller may see or touch from its id and role.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    #[must_use]
    pub const fn new(id: Uuid, role: Role) -> Self {
        Self { id, role }
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Fails with `Forbidden` unless the actor has one of `roles`.
    pub fn require_role(&self, roles: &[Role]) -> ResultEngine<()> {
        if roles.contains(&self.role) {
            return Ok(());
        }
        Err(EngineError::Forbidden("insufficient role".to_string()))
    }
}

/// A user as exposed by the engine (never carries the password).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub cadastur: Option<String>,
    pub cadastur_verified: bool,
    /// Per-guide commission override, in basis points.
    pub commission_rate_bps: Option<u32>,
    pub bio: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    #[must_use]
    pub fn actor(&self) -> Actor {
        Actor::new(self.id, self.role)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub role: String,
    pub cadastur: Option<String>,
    pub cadastur_verified: bool,
    pub commission_rate_bps: Option<i32>,
    pub bio: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::bookings::Entity")]
    Bookings,
    #[sea_orm(has_many = "super::expeditions::Entity")]
    Expeditions,
}

impl Related<super::bookings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

impl Related<super::expeditions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expeditions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for User {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            email: model.email,
            name: model.name,
            role: Role::try_from(model.role.as_str())?,
            cadastur: model.cadastur,
            cadastur_verified: model.cadastur_verified,
            commission_rate_bps: model
                .commission_rate_bps
                .map(u32::try_from)
                .transpose()
                .map_err(|_| EngineError::Validation("negative commission rate".to_string()))?,
            bio: model.bio,
            phone: model.phone,
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_storage_string() {
        for role in [Role::Admin, Role::Guide, Role::Trekker] {
            assert_eq!(Role::try_from(role.as_str()).unwrap(), role);
        }
        assert_eq!(Role::try_from("guide").unwrap(), Role::Guide);
        assert!(Role::try_from("owner").is_err());
    }

    #[test]
    fn require_role_rejects_other_roles() {
        let trekker = Actor::new(Uuid::new_v4(), Role::Trekker);
        assert!(trekker.require_role(&[Role::Trekker, Role::Admin]).is_ok());
        assert_eq!(
            trekker.require_role(&[Role::Guide]),
            Err(EngineError::Forbidden("insufficient role".to_string()))
        );
    }
}
