use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ConnectionTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    Actor, AuditAction, AuditEntity, EngineError, NameComparison, Page, ResultEngine, Role,
    SignupCmd, User, UserFilter, UserPatch, cadastur, commission, password, users,
    util::{normalize_email, normalize_optional_text, normalize_required, page_bounds},
};

use super::{Engine, audit, with_tx};

const MIN_PASSWORD_CHARS: usize = 8;

fn validate_password(password: &str) -> ResultEngine<String> {
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(EngineError::Validation(format!(
            "password must have at least {MIN_PASSWORD_CHARS} characters"
        )));
    }
    Ok(password.to_string())
}

fn normalize_cadastur(value: Option<&str>) -> ResultEngine<Option<String>> {
    let Some(raw) = normalize_optional_text(value) else {
        return Ok(None);
    };
    if !raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '/') {
        return Err(EngineError::Validation(format!(
            "invalid cadastur number: {raw}"
        )));
    }
    Ok(Some(raw))
}

impl Engine {
    async fn email_taken<C: ConnectionTrait>(&self, db: &C, email: &str) -> ResultEngine<bool> {
        Ok(users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(db)
            .await?
            .is_some())
    }

    /// Public registration. Only guides and trekkers can sign up.
    pub async fn signup(&self, cmd: SignupCmd) -> ResultEngine<User> {
        if cmd.role == Role::Admin {
            return Err(EngineError::Validation(
                "role must be GUIDE or TREKKER".to_string(),
            ));
        }
        self.create_user(cmd).await
    }

    /// Creates a user with any role. Used by signup and by the admin CLI.
    pub async fn create_user(&self, cmd: SignupCmd) -> ResultEngine<User> {
        let name = normalize_required(&cmd.name, "name", 2)?;
        let email = normalize_email(&cmd.email)?;
        let password = validate_password(&cmd.password)?;
        let cadastur = normalize_cadastur(cmd.cadastur.as_deref())?;
        let password_hash = password::hash(password, self.password_cost).await?;

        with_tx!(self, |db_tx| {
            if self.email_taken(&db_tx, &email).await? {
                return Err(EngineError::ExistingKey(email));
            }

            let model = users::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                email: ActiveValue::Set(email),
                name: ActiveValue::Set(name),
                password_hash: ActiveValue::Set(password_hash),
                role: ActiveValue::Set(cmd.role.as_str().to_string()),
                cadastur: ActiveValue::Set(cadastur),
                cadastur_verified: ActiveValue::Set(false),
                commission_rate_bps: ActiveValue::Set(None),
                bio: ActiveValue::Set(None),
                phone: ActiveValue::Set(None),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;

            tracing::info!(user_id = %model.id, role = %model.role, "user created");
            User::try_from(model)
        })
    }

    /// Checks credentials. `None` when the email is unknown or the password
    /// does not match.
    pub async fn authenticate(&self, email: &str, password: &str) -> ResultEngine<Option<User>> {
        let email = email.trim().to_lowercase();
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.database)
            .await?;
        let Some(model) = model else {
            return Ok(None);
        };
        if !password::verify(password.to_string(), model.password_hash.clone()).await? {
            return Ok(None);
        }
        User::try_from(model).map(Some)
    }

    pub async fn user(&self, user_id: Uuid, actor: &Actor) -> ResultEngine<User> {
        self.require_self_or_admin(actor, user_id)?;
        let model = self.require_user(&self.database, user_id).await?;
        User::try_from(model)
    }

    /// Admin only. Ordered by creation date, newest first.
    pub async fn list_users(&self, filter: UserFilter, actor: &Actor) -> ResultEngine<Page<User>> {
        actor.require_role(&[Role::Admin])?;
        let (page, page_size) = page_bounds(filter.page, filter.page_size);

        let mut query = users::Entity::find();
        if let Some(role) = filter.role {
            query = query.filter(users::Column::Role.eq(role.as_str()));
        }
        let total = query.clone().count(&self.database).await?;
        let items = query
            .order_by_desc(users::Column::CreatedAt)
            .order_by_asc(users::Column::Id)
            .offset((page - 1) * page_size)
            .limit(page_size)
            .all(&self.database)
            .await?
            .into_iter()
            .map(User::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;

        Ok(Page {
            items,
            total,
            page,
            page_size,
        })
    }

    /// Self-service profile update. `role` and `commission_rate_bps` are
    /// admin only; changing the cadastur number drops its verification.
    pub async fn update_user(
        &self,
        user_id: Uuid,
        patch: UserPatch,
        actor: &Actor,
    ) -> ResultEngine<User> {
        self.require_self_or_admin(actor, user_id)?;
        if (patch.role.is_some() || patch.commission_rate_bps.is_some()) && !actor.is_admin() {
            return Err(EngineError::Forbidden(
                "only admins can change role or commission".to_string(),
            ));
        }
        let name = patch
            .name
            .as_deref()
            .map(|n| normalize_required(n, "name", 2))
            .transpose()?;
        let password_hash = match patch.password.as_deref() {
            Some(raw) => Some(password::hash(validate_password(raw)?, self.password_cost).await?),
            None => None,
        };
        let commission_bps = patch
            .commission_rate_bps
            .map(|bps| {
                bps.map(commission::validate_rate)
                    .transpose()?
                    .map(i32::try_from)
                    .transpose()
                    .map_err(|_| EngineError::Validation("commission rate out of range".to_string()))
            })
            .transpose()?;

        with_tx!(self, |db_tx| {
            let current = self.require_user(&db_tx, user_id).await?;
            let current_cadastur = current.cadastur.clone();
            let mut model: users::ActiveModel = current.into();

            if let Some(name) = name {
                model.name = ActiveValue::Set(name);
            }
            if let Some(password_hash) = password_hash {
                model.password_hash = ActiveValue::Set(password_hash);
            }
            if let Some(bio) = patch.bio.as_deref() {
                model.bio = ActiveValue::Set(normalize_optional_text(Some(bio)));
            }
            if let Some(phone) = patch.phone.as_deref() {
                model.phone = ActiveValue::Set(normalize_optional_text(Some(phone)));
            }
            if let Some(raw) = patch.cadastur.as_deref() {
                let cadastur = normalize_cadastur(Some(raw))?;
                if cadastur != current_cadastur {
                    model.cadastur_verified = ActiveValue::Set(false);
                }
                model.cadastur = ActiveValue::Set(cadastur);
            }
            if let Some(role) = patch.role {
                model.role = ActiveValue::Set(role.as_str().to_string());
            }
            if let Some(bps) = commission_bps {
                model.commission_rate_bps = ActiveValue::Set(bps);
            }

            let model = model.update(&db_tx).await?;
            if let Some(bps) = commission_bps {
                let detail = match bps {
                    Some(bps) => format!("rate_bps={bps}"),
                    None => "rate_bps=none".to_string(),
                };
                audit::record(
                    &db_tx,
                    actor,
                    AuditEntity::User,
                    user_id,
                    AuditAction::CommissionOverridden,
                    Some(detail),
                )
                .await?;
            }
            User::try_from(model)
        })
    }

    /// Compares the name registered in the Cadastur registry with the guide's
    /// name and stores the outcome in `cadastur_verified`.
    ///
    /// Admin only. The guide must have a Cadastur number on file.
    pub async fn verify_cadastur(
        &self,
        guide_id: Uuid,
        registry_name: &str,
        actor: &Actor,
    ) -> ResultEngine<(User, NameComparison)> {
        actor.require_role(&[Role::Admin])?;
        let registry_name = normalize_required(registry_name, "registry name", 2)?;

        with_tx!(self, |db_tx| {
            let guide = self.require_user(&db_tx, guide_id).await?;
            if guide.role != Role::Guide.as_str() {
                return Err(EngineError::Validation("user is not a guide".to_string()));
            }
            if guide.cadastur.is_none() {
                return Err(EngineError::Validation(
                    "guide has no cadastur number".to_string(),
                ));
            }

            let comparison = cadastur::compare_names(&registry_name, &guide.name);
            let mut model: users::ActiveModel = guide.into();
            model.cadastur_verified = ActiveValue::Set(comparison.loose_match);
            let model = model.update(&db_tx).await?;

            tracing::info!(
                %guide_id,
                verified = comparison.loose_match,
                exact = comparison.exact_match,
                "cadastur checked"
            );
            Ok((User::try_from(model)?, comparison))
        })
    }
}
