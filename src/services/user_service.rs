use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, NotSet, QueryFilter, Set,
};
use serde::Deserialize;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::{
    auth::{user, AuthUser, Role},
    auth::password::hash_password_blocking,
    db::{is_unique_violation, run_migrations, DbPool},
    errors::ServiceError,
};

/// Account to be created by an administrator
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewUser {
    #[validate(length(min = 1, max = 64))]
    pub name: String,
    #[validate(length(min = 1))]
    pub password: String,
    /// Role name, case-insensitive
    #[validate(length(min = 1))]
    pub role: String,
}

/// Whether [`UserService::upsert_credentials`] inserted or rewrote a row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// One account applied by [`UserService::bootstrap`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedAccount {
    pub name: String,
    pub password: String,
    pub role: Role,
}

impl SeedAccount {
    pub fn new(name: impl Into<String>, password: impl Into<String>, role: Role) -> Self {
        Self {
            name: name.into(),
            password: password.into(),
            role,
        }
    }

    /// The three stock accounts, one per role
    pub fn defaults() -> Vec<SeedAccount> {
        vec![
            SeedAccount::new("ADMIN", "admin123", Role::Admin),
            SeedAccount::new("PRODUCTOS", "productos 19", Role::Productos),
            SeedAccount::new("ALMACENES", "almacenes11", Role::Almacenes),
        ]
    }
}

/// Credential administration
#[derive(Clone)]
pub struct UserService {
    db_pool: Arc<DbPool>,
}

impl UserService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Creates an account on behalf of `actor`. Duplicate names are a conflict.
    #[instrument(skip(self, new_user), fields(actor = %actor.name, name = %new_user.name))]
    pub async fn create_user(
        &self,
        new_user: NewUser,
        actor: &AuthUser,
    ) -> Result<user::Model, ServiceError> {
        self.insert_user(new_user).await
    }

    /// Validates, hashes and inserts `new_user` without an acting session.
    /// Used by the admin CLI.
    pub async fn insert_user(&self, new_user: NewUser) -> Result<user::Model, ServiceError> {
        new_user.validate()?;
        let name = new_user.name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::ValidationError(
                "invalid fields: name".to_string(),
            ));
        }
        let role = Role::parse(&new_user.role)
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let password_hash = hash_password_blocking(new_user.password).await?;
        let created = user::ActiveModel {
            id: NotSet,
            name: Set(name.clone()),
            password_hash: Set(password_hash),
            role: Set(role.to_string()),
            last_login_at: Set(None),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db_pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ServiceError::Conflict(format!("user {name} already exists"))
            } else {
                ServiceError::DatabaseError(e)
            }
        })?;

        info!(user_id = created.id, role = %role, "User created");
        Ok(created)
    }

    /// Inserts `name` or overwrites its password hash and role
    #[instrument(skip(self, password))]
    pub async fn upsert_credentials(
        &self,
        name: &str,
        password: &str,
        role: Role,
    ) -> Result<UpsertOutcome, ServiceError> {
        let password_hash = hash_password_blocking(password.to_string()).await?;
        let db = &*self.db_pool;

        let existing = user::Entity::find()
            .filter(user::Column::Name.eq(name))
            .one(db)
            .await?;

        match existing {
            Some(account) => {
                let mut active = account.into_active_model();
                active.password_hash = Set(password_hash);
                active.role = Set(role.to_string());
                active.update(db).await?;
                Ok(UpsertOutcome::Updated)
            }
            None => {
                user::ActiveModel {
                    id: NotSet,
                    name: Set(name.to_string()),
                    password_hash: Set(password_hash),
                    role: Set(role.to_string()),
                    last_login_at: Set(None),
                    created_at: Set(Utc::now()),
                }
                .insert(db)
                .await?;
                Ok(UpsertOutcome::Created)
            }
        }
    }

    /// Applies migrations, then upserts every seed account. Safe to rerun.
    pub async fn bootstrap(&self, accounts: &[SeedAccount]) -> Result<(), ServiceError> {
        run_migrations(&self.db_pool).await?;

        for account in accounts {
            if account.password.is_empty() {
                warn!(name = %account.name, "skipping seed account with empty password");
                continue;
            }
            let outcome = self
                .upsert_credentials(&account.name, &account.password, account.role)
                .await?;
            info!(name = %account.name, role = %account.role, ?outcome, "seed account applied");
        }
        Ok(())
    }

    /// Changes the role of `name`. Open sessions pick it up on their next request.
    #[instrument(skip(self))]
    pub async fn set_role(&self, name: &str, role: Role) -> Result<user::Model, ServiceError> {
        let db = &*self.db_pool;
        let account = user::Entity::find()
            .filter(user::Column::Name.eq(name))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("user", name))?;
        let mut active = account.into_active_model();
        active.role = Set(role.to_string());
        Ok(active.update(db).await?)
    }
}
