use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, IntoActiveModel, ModelTrait, NotSet,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::AuthUser,
    db::{flatten_transaction_error, is_foreign_key_violation, DbPool},
    entities::{
        product::{self, Entity as Product},
        warehouse::{self, Entity as Warehouse},
    },
    errors::{ServiceError, WAREHOUSE_IN_USE_MESSAGE},
    services::audit::AuditStamp,
};

const MAX_NAME_LEN: usize = 255;

/// A delete refused by the products foreign key means the warehouse is in use
fn map_delete_error(err: DbErr) -> ServiceError {
    if is_foreign_key_violation(&err) {
        ServiceError::ReferentialConflict(WAREHOUSE_IN_USE_MESSAGE.to_string())
    } else {
        ServiceError::DatabaseError(err)
    }
}

/// Warehouse fields as received from a client
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WarehouseDraft {
    pub name: Option<String>,
}

impl WarehouseDraft {
    /// Returns the trimmed name or a validation error naming `nombre`
    pub fn validate(self) -> Result<String, ServiceError> {
        self.name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty() && n.chars().count() <= MAX_NAME_LEN)
            .ok_or_else(|| {
                ServiceError::ValidationError("missing or invalid fields: nombre".to_string())
            })
    }
}

/// Service for managing warehouses
#[derive(Clone)]
pub struct WarehouseService {
    db_pool: Arc<DbPool>,
}

impl WarehouseService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// All warehouses, ordered by id
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<warehouse::Model>, ServiceError> {
        Warehouse::find()
            .order_by_asc(warehouse::Column::Id)
            .all(&*self.db_pool)
            .await
            .map_err(|e| {
                error!(error = %e, "Database error when listing warehouses");
                ServiceError::DatabaseError(e)
            })
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<warehouse::Model, ServiceError> {
        Warehouse::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("warehouse", id))
    }

    #[instrument(skip(self, draft), fields(actor = %actor.name))]
    pub async fn create(
        &self,
        draft: WarehouseDraft,
        actor: &AuthUser,
    ) -> Result<warehouse::Model, ServiceError> {
        let name = draft.validate()?;
        let stamp = AuditStamp::now(actor);

        let created = warehouse::ActiveModel {
            id: NotSet,
            name: Set(name),
            created_at: Set(stamp.at),
            updated_at: Set(stamp.at),
            updated_by: Set(stamp.by),
        }
        .insert(&*self.db_pool)
        .await?;

        info!(warehouse_id = created.id, "Warehouse created successfully");
        Ok(created)
    }

    /// Rename warehouse `id`
    #[instrument(skip(self, draft), fields(actor = %actor.name))]
    pub async fn update(
        &self,
        id: i32,
        draft: WarehouseDraft,
        actor: &AuthUser,
    ) -> Result<warehouse::Model, ServiceError> {
        let name = draft.validate()?;
        let stamp = AuditStamp::now(actor);

        let updated = self
            .db_pool
            .transaction::<_, warehouse::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let existing = Warehouse::find_by_id(id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| ServiceError::not_found("warehouse", id))?;
                    let mut active = existing.into_active_model();
                    active.name = Set(name);
                    active.updated_at = Set(stamp.at);
                    active.updated_by = Set(stamp.by);
                    Ok(active.update(txn).await?)
                })
            })
            .await
            .map_err(flatten_transaction_error)?;

        info!(warehouse_id = id, "Warehouse updated successfully");
        Ok(updated)
    }

    /// Delete warehouse `id` unless a product still references it.
    ///
    /// The reference check and the delete share one transaction; the
    /// restricting foreign key catches any product inserted concurrently
    /// and is reported the same way.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        self.db_pool
            .transaction::<_, (), ServiceError>(move |txn| {
                Box::pin(async move {
                    let existing = Warehouse::find_by_id(id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| ServiceError::not_found("warehouse", id))?;

                    let referencing = Product::find()
                        .filter(product::Column::WarehouseId.eq(id))
                        .count(txn)
                        .await?;
                    if referencing > 0 {
                        warn!(warehouse_id = id, referencing, "warehouse still in use");
                        return Err(ServiceError::ReferentialConflict(
                            WAREHOUSE_IN_USE_MESSAGE.to_string(),
                        ));
                    }

                    existing.delete(txn).await.map_err(map_delete_error)?;
                    Ok(())
                })
            })
            .await
            .map_err(flatten_transaction_error)?;

        info!(warehouse_id = id, "Warehouse deleted");
        Ok(())
    }
}
