use chrono::Utc;
use metrics::counter;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

use crate::{
    entities::{
        order::Entity as OrderEntity,
        order_item::{self, Entity as OrderItemEntity},
        shipment::{self, Entity as ShipmentEntity},
        shipment_item::{self, Entity as ShipmentItemEntity},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

const STATUS_CREATED: &str = "created";
const STATUS_SHIPPED: &str = "shipped";

#[derive(Debug, Clone, Deserialize, serde::Serialize, Validate)]
pub struct ShipmentLine {
    pub order_item_id: i64,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateShipmentRequest {
    pub order_id: i64,
    #[validate(length(min = 1))]
    pub lines: Vec<ShipmentLine>,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
}

/// Shipments, including partial ones: each line is validated against the
/// order item's remaining unshipped quantity and the shipped counters move
/// in the same transaction as the shipment insert.
#[derive(Clone)]
pub struct ShipmentService {
    db: Arc<DatabaseConnection>,
    event_sender: Option<EventSender>,
}

impl ShipmentService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Option<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, request), fields(order_id = request.order_id))]
    pub async fn create_partial_shipment(
        &self,
        request: CreateShipmentRequest,
    ) -> Result<(shipment::Model, Vec<shipment_item::Model>), ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        for line in &request.lines {
            line.validate()
                .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        }

        let txn = self.db.begin().await?;

        OrderEntity::find_by_id(request.order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Order {} not found", request.order_id))
            })?;

        let created = shipment::ActiveModel {
            order_id: Set(request.order_id),
            status: Set(STATUS_CREATED.to_string()),
            carrier: Set(request.carrier),
            tracking_number: Set(request.tracking_number),
            shipped_at: Set(None),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let mut inserted = Vec::with_capacity(request.lines.len());
        for line in &request.lines {
            let item = OrderItemEntity::find_by_id(line.order_item_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Order item {} not found", line.order_item_id))
                })?;

            if item.order_id != request.order_id {
                return Err(ServiceError::InvalidInput(format!(
                    "Order item {} does not belong to order {}",
                    line.order_item_id, request.order_id
                )));
            }

            let remaining = item.quantity - item.shipped_quantity;
            if line.quantity > remaining {
                return Err(ServiceError::InvalidInput(format!(
                    "Cannot ship {} of order item {}: only {} remaining",
                    line.quantity, line.order_item_id, remaining
                )));
            }

            let new_shipped = item.shipped_quantity + line.quantity;
            let mut active: order_item::ActiveModel = item.into();
            active.shipped_quantity = Set(new_shipped);
            active.update(&txn).await?;

            let row = shipment_item::ActiveModel {
                shipment_id: Set(created.id),
                order_item_id: Set(line.order_item_id),
                quantity: Set(line.quantity),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            inserted.push(row);
        }

        txn.commit().await?;

        counter!("shipments.created", 1);
        info!(
            shipment_id = created.id,
            order_id = request.order_id,
            lines = inserted.len(),
            "shipment created"
        );

        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::ShipmentCreated {
                    shipment_id: created.id,
                    order_id: request.order_id,
                })
                .await;
        }

        Ok((created, inserted))
    }

    /// Marks a shipment as handed to the carrier.
    #[instrument(skip(self))]
    pub async fn mark_shipped(&self, id: i64) -> Result<shipment::Model, ServiceError> {
        let existing = self.get_shipment(id).await?.0;

        if existing.status == STATUS_SHIPPED {
            return Err(ServiceError::InvalidOperation(format!(
                "Shipment {} is already shipped",
                id
            )));
        }

        let mut active: shipment::ActiveModel = existing.into();
        active.status = Set(STATUS_SHIPPED.to_string());
        active.shipped_at = Set(Some(Utc::now()));
        Ok(active.update(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn get_shipment(
        &self,
        id: i64,
    ) -> Result<(shipment::Model, Vec<shipment_item::Model>), ServiceError> {
        let shipment = ShipmentEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Shipment {} not found", id)))?;
        let items = ShipmentItemEntity::find()
            .filter(shipment_item::Column::ShipmentId.eq(id))
            .all(&*self.db)
            .await?;
        Ok((shipment, items))
    }

    #[instrument(skip(self))]
    pub async fn list_for_order(
        &self,
        order_id: i64,
    ) -> Result<Vec<shipment::Model>, ServiceError> {
        Ok(ShipmentEntity::find()
            .filter(shipment::Column::OrderId.eq(order_id))
            .order_by_desc(shipment::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    /// Deletes a shipment and returns its quantities to the order items.
    /// Returns false when the id does not exist.
    #[instrument(skip(self))]
    pub async fn delete_shipment(&self, id: i64) -> Result<bool, ServiceError> {
        let txn = self.db.begin().await?;

        let Some(_) = ShipmentEntity::find_by_id(id).one(&txn).await? else {
            return Ok(false);
        };

        let items = ShipmentItemEntity::find()
            .filter(shipment_item::Column::ShipmentId.eq(id))
            .all(&txn)
            .await?;
        for item in items {
            if let Some(order_item) = OrderItemEntity::find_by_id(item.order_item_id)
                .one(&txn)
                .await?
            {
                let new_shipped = (order_item.shipped_quantity - item.quantity).max(0);
                let mut active: order_item::ActiveModel = order_item.into();
                active.shipped_quantity = Set(new_shipped);
                active.update(&txn).await?;
            }
        }

        ShipmentItemEntity::delete_many()
            .filter(shipment_item::Column::ShipmentId.eq(id))
            .exec(&txn)
            .await?;
        ShipmentEntity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        Ok(true)
    }
}
