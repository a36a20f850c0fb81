use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::PaymentType;

/// Customer order header. `production_approved` implies a set of
/// manufacturing orders exists with `source_order_id` pointing back here;
/// the order service enforces that inside one transaction.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub order_number: String,
    pub client_id: i64,
    pub status: String,
    pub total_amount: Decimal,
    pub payment_type: PaymentType,
    pub paid_amount: Decimal,
    pub paid_at: Option<DateTime<Utc>>,
    pub contract_number: Option<String>,
    pub production_approved: bool,
    pub production_approved_by: Option<String>,
    pub production_approved_at: Option<DateTime<Utc>>,
    pub due_date: Option<NaiveDate>,
    pub ship_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
    #[sea_orm(has_many = "super::shipment::Entity")]
    Shipments,
    #[sea_orm(
        belongs_to = "super::client::Entity",
        from = "Column::ClientId",
        to = "super::client::Column::Id"
    )]
    Client,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl Related<super::shipment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shipments.def()
    }
}

impl Related<super::client::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Client.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
