use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DbErr, EntityTrait, IntoActiveModel, NotSet, QueryOrder,
    Set, TransactionTrait,
};
use tracing::{error, info, instrument};

use crate::{
    auth::AuthUser,
    db::{flatten_transaction_error, is_foreign_key_violation, DbPool},
    entities::{
        product::{self, Entity as Product},
        warehouse::Entity as Warehouse,
    },
    errors::ServiceError,
    services::audit::AuditStamp,
};

const MAX_NAME_LEN: usize = 255;

/// Product fields as received from a client. Every field may be missing or
/// malformed; [`ProductDraft::validate`] reports all problems at once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductDraft {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub quantity: Option<i64>,
    pub department: Option<String>,
    pub warehouse_id: Option<i32>,
}

/// A product write that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ProductInput {
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
    pub department: String,
    pub warehouse_id: i32,
}

fn normalize_string(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ProductDraft {
    /// Checks presence and range of every field. The error lists the
    /// offending fields by their wire names.
    pub fn validate(self) -> Result<ProductInput, ServiceError> {
        let mut invalid = Vec::new();

        let name = normalize_string(self.name).filter(|n| n.chars().count() <= MAX_NAME_LEN);
        if name.is_none() {
            invalid.push("nombre");
        }
        let price = self.price.filter(|p| *p >= Decimal::ZERO);
        if price.is_none() {
            invalid.push("precio");
        }
        let quantity = self.quantity.and_then(|q| i32::try_from(q).ok()).filter(|q| *q >= 0);
        if quantity.is_none() {
            invalid.push("cantidad");
        }
        let department = normalize_string(self.department);
        if department.is_none() {
            invalid.push("departamento");
        }
        if self.warehouse_id.is_none() {
            invalid.push("almacen");
        }

        match (name, price, quantity, department, self.warehouse_id) {
            (Some(name), Some(price), Some(quantity), Some(department), Some(warehouse_id)) => {
                Ok(ProductInput {
                    name,
                    price,
                    quantity,
                    department,
                    warehouse_id,
                })
            }
            _ => Err(ServiceError::ValidationError(format!(
                "missing or invalid fields: {}",
                invalid.join(", ")
            ))),
        }
    }
}

async fn ensure_warehouse_exists<C>(conn: &C, warehouse_id: i32) -> Result<(), ServiceError>
where
    C: ConnectionTrait,
{
    let found = Warehouse::find_by_id(warehouse_id).one(conn).await?;
    if found.is_none() {
        return Err(unknown_warehouse(warehouse_id));
    }
    Ok(())
}

fn unknown_warehouse(warehouse_id: i32) -> ServiceError {
    ServiceError::ReferentialError(format!("warehouse {warehouse_id} does not exist"))
}

fn map_write_error(err: DbErr, warehouse_id: i32) -> ServiceError {
    if is_foreign_key_violation(&err) {
        unknown_warehouse(warehouse_id)
    } else {
        error!(error = %err, "product write failed");
        ServiceError::DatabaseError(err)
    }
}

/// Service for managing products
#[derive(Clone)]
pub struct ProductService {
    db_pool: Arc<DbPool>,
}

impl ProductService {
    /// Creates a new product service instance
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// All products, ordered by id
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<product::Model>, ServiceError> {
        Product::find()
            .order_by_asc(product::Column::Id)
            .all(&*self.db_pool)
            .await
            .map_err(|e| {
                error!(error = %e, "Database error when listing products");
                ServiceError::DatabaseError(e)
            })
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<product::Model, ServiceError> {
        Product::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("product", id))
    }

    /// Create a new product stocked in an existing warehouse
    #[instrument(skip(self, draft), fields(actor = %actor.name))]
    pub async fn create(
        &self,
        draft: ProductDraft,
        actor: &AuthUser,
    ) -> Result<product::Model, ServiceError> {
        let input = draft.validate()?;
        let stamp = AuditStamp::now(actor);

        let created = self
            .db_pool
            .transaction::<_, product::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    ensure_warehouse_exists(txn, input.warehouse_id).await?;
                    let warehouse_id = input.warehouse_id;
                    product::ActiveModel {
                        id: NotSet,
                        name: Set(input.name),
                        price: Set(input.price),
                        quantity: Set(input.quantity),
                        department: Set(input.department),
                        warehouse_id: Set(input.warehouse_id),
                        created_at: Set(stamp.at),
                        updated_at: Set(stamp.at),
                        updated_by: Set(stamp.by),
                    }
                    .insert(txn)
                    .await
                    .map_err(|e| map_write_error(e, warehouse_id))
                })
            })
            .await
            .map_err(flatten_transaction_error)?;

        info!(product_id = created.id, "Product created successfully");
        Ok(created)
    }

    /// Replace every mutable field of product `id`. `created_at` is kept.
    #[instrument(skip(self, draft), fields(actor = %actor.name))]
    pub async fn update(
        &self,
        id: i32,
        draft: ProductDraft,
        actor: &AuthUser,
    ) -> Result<product::Model, ServiceError> {
        let input = draft.validate()?;
        let stamp = AuditStamp::now(actor);

        let updated = self
            .db_pool
            .transaction::<_, product::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let existing = Product::find_by_id(id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| ServiceError::not_found("product", id))?;
                    ensure_warehouse_exists(txn, input.warehouse_id).await?;

                    let warehouse_id = input.warehouse_id;
                    let mut active = existing.into_active_model();
                    active.name = Set(input.name);
                    active.price = Set(input.price);
                    active.quantity = Set(input.quantity);
                    active.department = Set(input.department);
                    active.warehouse_id = Set(input.warehouse_id);
                    active.updated_at = Set(stamp.at);
                    active.updated_by = Set(stamp.by);
                    active
                        .update(txn)
                        .await
                        .map_err(|e| map_write_error(e, warehouse_id))
                })
            })
            .await
            .map_err(flatten_transaction_error)?;

        info!(product_id = id, "Product updated successfully");
        Ok(updated)
    }

    /// Delete product `id`
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let result = Product::delete_by_id(id).exec(&*self.db_pool).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::not_found("product", id));
        }
        info!(product_id = id, "Product deleted");
        Ok(())
    }
}
