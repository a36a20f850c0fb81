use chrono::Utc;
use metrics::counter;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

use crate::{
    entities::{
        inventory_level::{self, Entity as InventoryLevelEntity},
        warehouse::{self, Entity as WarehouseEntity},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateWarehouseRequest {
    #[validate(length(min = 1))]
    pub code: String,
    #[validate(length(min = 1))]
    pub name: String,
}

/// Explicit stock level, used by the set/replace path. Adjustments go
/// through `adjust_quantity`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SetInventoryLevelRequest {
    pub product_id: i64,
    pub warehouse_id: i64,
    #[validate(range(min = 0))]
    pub quantity: i32,
    #[validate(range(min = 0))]
    pub min_stock: i32,
    pub max_stock: Option<i32>,
}

/// Warehouses and per-warehouse stock levels.
#[derive(Clone)]
pub struct InventoryService {
    db: Arc<DatabaseConnection>,
    event_sender: Option<EventSender>,
}

impl InventoryService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Option<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn create_warehouse(
        &self,
        request: CreateWarehouseRequest,
    ) -> Result<warehouse::Model, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let existing = WarehouseEntity::find()
            .filter(warehouse::Column::Code.eq(request.code.clone()))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::InvalidInput(format!(
                "Warehouse code {} already exists",
                request.code
            )));
        }

        let created = warehouse::ActiveModel {
            code: Set(request.code),
            name: Set(request.name),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        counter!("inventory.warehouses.created", 1);
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_warehouse(&self, id: i64) -> Result<warehouse::Model, ServiceError> {
        WarehouseEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Warehouse {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn list_warehouses(&self) -> Result<Vec<warehouse::Model>, ServiceError> {
        Ok(WarehouseEntity::find()
            .order_by_asc(warehouse::Column::Code)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn rename_warehouse(
        &self,
        id: i64,
        name: String,
    ) -> Result<warehouse::Model, ServiceError> {
        if name.is_empty() {
            return Err(ServiceError::InvalidInput(
                "Warehouse name cannot be empty".to_string(),
            ));
        }
        let existing = self.get_warehouse(id).await?;
        let mut active: warehouse::ActiveModel = existing.into();
        active.name = Set(name);
        Ok(active.update(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_warehouse(&self, id: i64) -> Result<bool, ServiceError> {
        let result = WarehouseEntity::delete_by_id(id).exec(&*self.db).await?;
        Ok(result.rows_affected > 0)
    }

    #[instrument(skip(self))]
    pub async fn get_level(
        &self,
        product_id: i64,
        warehouse_id: i64,
    ) -> Result<Option<inventory_level::Model>, ServiceError> {
        Ok(InventoryLevelEntity::find()
            .filter(inventory_level::Column::ProductId.eq(product_id))
            .filter(inventory_level::Column::WarehouseId.eq(warehouse_id))
            .one(&*self.db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn list_levels_for_warehouse(
        &self,
        warehouse_id: i64,
    ) -> Result<Vec<inventory_level::Model>, ServiceError> {
        Ok(InventoryLevelEntity::find()
            .filter(inventory_level::Column::WarehouseId.eq(warehouse_id))
            .all(&*self.db)
            .await?)
    }

    /// Sets a stock level outright, creating the row if it does not exist.
    #[instrument(skip(self))]
    pub async fn set_level(
        &self,
        request: SetInventoryLevelRequest,
    ) -> Result<inventory_level::Model, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let existing = self
            .get_level(request.product_id, request.warehouse_id)
            .await?;

        let model = match existing {
            Some(row) => {
                let mut active: inventory_level::ActiveModel = row.into();
                active.quantity = Set(request.quantity);
                active.min_stock = Set(request.min_stock);
                active.max_stock = Set(request.max_stock);
                active.updated_at = Set(Utc::now());
                active.update(&*self.db).await?
            }
            None => {
                inventory_level::ActiveModel {
                    product_id: Set(request.product_id),
                    warehouse_id: Set(request.warehouse_id),
                    quantity: Set(request.quantity),
                    min_stock: Set(request.min_stock),
                    max_stock: Set(request.max_stock),
                    updated_at: Set(Utc::now()),
                    ..Default::default()
                }
                .insert(&*self.db)
                .await?
            }
        };

        Ok(model)
    }

    /// Applies a signed delta to a stock level. Negative results are
    /// rejected; production output and manual corrections both land here.
    #[instrument(skip(self))]
    pub async fn adjust_quantity(
        &self,
        product_id: i64,
        warehouse_id: i64,
        delta: i32,
    ) -> Result<inventory_level::Model, ServiceError> {
        let txn = self.db.begin().await?;
        let (old_quantity, updated) =
            Self::upsert_increment(&txn, product_id, warehouse_id, delta).await?;
        txn.commit().await?;

        counter!("inventory.adjustments", 1);
        info!(
            product_id,
            warehouse_id,
            old_quantity,
            new_quantity = updated.quantity,
            "inventory adjusted"
        );

        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::InventoryAdjusted {
                    product_id,
                    warehouse_id,
                    old_quantity,
                    new_quantity: updated.quantity,
                })
                .await;
        }

        Ok(updated)
    }

    /// Increments (or creates) the (product, warehouse) row on the caller's
    /// connection, so lifecycle services can fold it into their own
    /// transaction. Returns the previous quantity and the updated row.
    pub async fn upsert_increment<C: ConnectionTrait>(
        conn: &C,
        product_id: i64,
        warehouse_id: i64,
        delta: i32,
    ) -> Result<(i32, inventory_level::Model), ServiceError> {
        let existing = InventoryLevelEntity::find()
            .filter(inventory_level::Column::ProductId.eq(product_id))
            .filter(inventory_level::Column::WarehouseId.eq(warehouse_id))
            .one(conn)
            .await?;

        match existing {
            Some(row) => {
                let old = row.quantity;
                let new_quantity = old + delta;
                if new_quantity < 0 {
                    return Err(ServiceError::InvalidOperation(format!(
                        "Adjustment would drive stock negative: {} + {} for product {} in warehouse {}",
                        old, delta, product_id, warehouse_id
                    )));
                }
                let mut active: inventory_level::ActiveModel = row.into();
                active.quantity = Set(new_quantity);
                active.updated_at = Set(Utc::now());
                Ok((old, active.update(conn).await?))
            }
            None => {
                if delta < 0 {
                    return Err(ServiceError::InvalidOperation(format!(
                        "No stock to remove for product {} in warehouse {}",
                        product_id, warehouse_id
                    )));
                }
                let created = inventory_level::ActiveModel {
                    product_id: Set(product_id),
                    warehouse_id: Set(warehouse_id),
                    quantity: Set(delta),
                    min_stock: Set(0),
                    max_stock: Set(None),
                    updated_at: Set(Utc::now()),
                    ..Default::default()
                }
                .insert(conn)
                .await?;
                Ok((0, created))
            }
        }
    }
}
