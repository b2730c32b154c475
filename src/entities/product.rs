use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product entity. Every product is stocked in exactly one warehouse.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,

    /// Unit price, never negative
    #[sea_orm(column_type = "Decimal(Some((14, 4)))")]
    pub price: Decimal,

    /// Units on hand, never negative
    pub quantity: i32,

    pub department: String,

    /// Warehouse holding the stock; the schema refuses dangling references
    pub warehouse_id: i32,

    /// Set once on insert
    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    /// Name of the last user who wrote the row
    pub updated_by: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::warehouse::Entity",
        from = "Column::WarehouseId",
        to = "super::warehouse::Column::Id",
        on_delete = "Restrict"
    )]
    Warehouse,
}

impl Related<super::warehouse::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Warehouse.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
