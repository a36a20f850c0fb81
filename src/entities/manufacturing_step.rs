use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::StepStatus;

/// Ordered sub-task of a manufacturing order.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "manufacturing_steps")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub manufacturing_order_id: i64,
    pub sequence: i32,
    pub name: String,
    pub status: StepStatus,
    pub estimated_duration_minutes: i32,
    pub assigned_worker: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::manufacturing_order::Entity",
        from = "Column::ManufacturingOrderId",
        to = "super::manufacturing_order::Column::Id"
    )]
    ManufacturingOrder,
}

impl Related<super::manufacturing_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ManufacturingOrder.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
