use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::ManufacturingOrderStatus;

/// Manufacturing order driving production of one product.
///
/// `source_order_id` links back to the customer order whose payment
/// approval created this row. `serial_numbers` holds the JSON array of
/// serials generated at start; the canonical per-unit rows live in the
/// `serial_numbers` table.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "manufacturing_orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub order_number: String,
    pub product_id: i64,
    pub recipe_id: Option<i64>,
    pub planned_quantity: i32,
    pub produced_quantity: Option<i32>,
    pub status: ManufacturingOrderStatus,
    pub warehouse_id: Option<i64>,
    pub source_order_id: Option<i64>,
    pub material_cost: Option<Decimal>,
    pub labor_cost: Option<Decimal>,
    pub overhead_cost: Option<Decimal>,
    pub quality_rating: Option<i32>,
    pub notes: Option<String>,
    #[sea_orm(column_type = "Json", nullable)]
    pub serial_numbers: Option<Json>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
    #[sea_orm(
        belongs_to = "super::recipe::Entity",
        from = "Column::RecipeId",
        to = "super::recipe::Column::Id"
    )]
    Recipe,
    #[sea_orm(has_many = "super::manufacturing_step::Entity")]
    Steps,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::manufacturing_step::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Steps.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
