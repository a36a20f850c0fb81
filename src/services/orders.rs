use chrono::{NaiveDate, Utc};
use metrics::{counter, histogram};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::{
    domain::{ManufacturingOrderStatus, PaymentType},
    entities::{
        manufacturing_order::{self, Entity as ManufacturingOrderEntity},
        order::{self, Entity as OrderEntity},
        order_item::{self, Entity as OrderItemEntity},
        recipe::{self, Entity as RecipeEntity},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

#[derive(Debug, Clone, Deserialize, serde::Serialize, Validate)]
pub struct OrderItemLine {
    pub product_id: i64,
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1))]
    pub order_number: String,
    pub client_id: i64,
    #[validate(length(min = 1))]
    pub items: Vec<OrderItemLine>,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Header patch; absent fields stay untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateOrderPatch {
    pub status: Option<String>,
    pub client_id: Option<i64>,
    pub due_date: Option<NaiveDate>,
    pub ship_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentRequest {
    pub payment_type: PaymentType,
    pub paid_amount: Option<Decimal>,
    pub contract_number: Option<String>,
    pub approved_by: Option<String>,
    /// Only consulted for partial payments; full and contract payments
    /// approve production unconditionally.
    pub production_approved: Option<bool>,
}

/// Result of a payment or approval call: the updated order plus the ids of
/// any manufacturing orders the approval created.
#[derive(Debug)]
pub struct PaymentOutcome {
    pub order: order::Model,
    pub created_manufacturing_order_ids: Vec<i64>,
}

const STATUS_NEW: &str = "new";

/// Customer orders: CRUD, payment processing and production approval.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    event_sender: Option<EventSender>,
}

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Option<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Creates an order header and its line items in one transaction.
    #[instrument(skip(self, request), fields(order_number = %request.order_number))]
    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> Result<order::Model, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        for line in &request.items {
            line.validate()
                .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        }

        let total: Decimal = request
            .items
            .iter()
            .map(|line| line.unit_price * Decimal::from(line.quantity))
            .sum();

        let txn = self.db.begin().await?;

        let existing = OrderEntity::find()
            .filter(order::Column::OrderNumber.eq(request.order_number.clone()))
            .one(&txn)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::InvalidInput(format!(
                "Order number {} already exists",
                request.order_number
            )));
        }

        let created = order::ActiveModel {
            order_number: Set(request.order_number.clone()),
            client_id: Set(request.client_id),
            status: Set(STATUS_NEW.to_string()),
            total_amount: Set(total),
            payment_type: Set(PaymentType::None),
            paid_amount: Set(Decimal::ZERO),
            paid_at: Set(None),
            contract_number: Set(None),
            production_approved: Set(false),
            production_approved_by: Set(None),
            production_approved_at: Set(None),
            due_date: Set(request.due_date),
            ship_date: Set(None),
            notes: Set(request.notes),
            created_at: Set(Utc::now()),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        for line in &request.items {
            order_item::ActiveModel {
                order_id: Set(created.id),
                product_id: Set(line.product_id),
                quantity: Set(line.quantity),
                shipped_quantity: Set(0),
                unit_price: Set(line.unit_price),
                total_price: Set(line.unit_price * Decimal::from(line.quantity)),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;

        counter!("orders.created", 1);
        histogram!("orders.total_amount", total.to_f64().unwrap_or(0.0));
        info!(order_id = created.id, %total, "order created");

        if let Some(sender) = &self.event_sender {
            sender.send_or_log(Event::OrderCreated(created.id)).await;
        }

        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_order(&self, id: i64) -> Result<order::Model, ServiceError> {
        OrderEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn get_order_with_items(
        &self,
        id: i64,
    ) -> Result<(order::Model, Vec<order_item::Model>), ServiceError> {
        let order = self.get_order(id).await?;
        let items = OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(id))
            .all(&*self.db)
            .await?;
        Ok((order, items))
    }

    #[instrument(skip(self))]
    pub async fn list_orders(&self, client_id: Option<i64>) -> Result<Vec<order::Model>, ServiceError> {
        let mut query = OrderEntity::find().order_by_desc(order::Column::CreatedAt);
        if let Some(client_id) = client_id {
            query = query.filter(order::Column::ClientId.eq(client_id));
        }
        Ok(query.all(&*self.db).await?)
    }

    /// Applies a header patch; present fields overwrite, absent fields are
    /// untouched.
    #[instrument(skip(self, patch))]
    pub async fn update_order(
        &self,
        id: i64,
        patch: UpdateOrderPatch,
    ) -> Result<order::Model, ServiceError> {
        let existing = self.get_order(id).await?;
        let mut active: order::ActiveModel = existing.into();

        if let Some(status) = patch.status {
            active.status = Set(status);
        }
        if let Some(client_id) = patch.client_id {
            active.client_id = Set(client_id);
        }
        if let Some(due_date) = patch.due_date {
            active.due_date = Set(Some(due_date));
        }
        if let Some(ship_date) = patch.ship_date {
            active.ship_date = Set(Some(ship_date));
        }
        if let Some(notes) = patch.notes {
            active.notes = Set(Some(notes));
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&*self.db).await?;

        if let Some(sender) = &self.event_sender {
            sender.send_or_log(Event::OrderUpdated(id)).await;
        }

        Ok(updated)
    }

    /// Replaces all line items of an order and recomputes the total. The
    /// child rows are deleted and reinserted inside one transaction.
    #[instrument(skip(self, items))]
    pub async fn replace_order_items(
        &self,
        id: i64,
        items: Vec<OrderItemLine>,
    ) -> Result<(order::Model, Vec<order_item::Model>), ServiceError> {
        if items.is_empty() {
            return Err(ServiceError::InvalidInput(
                "An order must have at least one line item".to_string(),
            ));
        }
        for line in &items {
            line.validate()
                .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        }

        let txn = self.db.begin().await?;

        let existing = OrderEntity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", id)))?;

        OrderItemEntity::delete_many()
            .filter(order_item::Column::OrderId.eq(id))
            .exec(&txn)
            .await?;

        let mut inserted = Vec::with_capacity(items.len());
        for line in &items {
            let row = order_item::ActiveModel {
                order_id: Set(id),
                product_id: Set(line.product_id),
                quantity: Set(line.quantity),
                shipped_quantity: Set(0),
                unit_price: Set(line.unit_price),
                total_price: Set(line.unit_price * Decimal::from(line.quantity)),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            inserted.push(row);
        }

        let total: Decimal = inserted.iter().map(|i| i.total_price).sum();
        let mut active: order::ActiveModel = existing.into();
        active.total_amount = Set(total);
        active.updated_at = Set(Utc::now());
        let updated = active.update(&txn).await?;

        txn.commit().await?;

        if let Some(sender) = &self.event_sender {
            sender.send_or_log(Event::OrderUpdated(id)).await;
        }

        Ok((updated, inserted))
    }

    /// Deletes an order and its line items. Returns false when the id does
    /// not exist.
    #[instrument(skip(self))]
    pub async fn delete_order(&self, id: i64) -> Result<bool, ServiceError> {
        let txn = self.db.begin().await?;

        let existing = OrderEntity::find_by_id(id).one(&txn).await?;
        if existing.is_none() {
            return Ok(false);
        }

        OrderItemEntity::delete_many()
            .filter(order_item::Column::OrderId.eq(id))
            .exec(&txn)
            .await?;
        OrderEntity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;

        counter!("orders.deleted", 1);
        if let Some(sender) = &self.event_sender {
            sender.send_or_log(Event::OrderDeleted(id)).await;
        }

        Ok(true)
    }

    /// Records a payment on an order.
    ///
    /// Full and contract payments approve production unconditionally; a
    /// partial payment approves only when the caller asked for it. The first
    /// false-to-true approval transition creates one pending manufacturing
    /// order per distinct product on the order, all inside the same
    /// transaction as the order update.
    #[instrument(skip(self, request))]
    pub async fn process_payment(
        &self,
        order_id: i64,
        request: PaymentRequest,
    ) -> Result<PaymentOutcome, ServiceError> {
        if request.payment_type == PaymentType::None {
            return Err(ServiceError::InvalidInput(
                "Payment type 'none' is reserved for cancel_payment".to_string(),
            ));
        }
        if let Some(amount) = request.paid_amount {
            if amount < Decimal::ZERO {
                return Err(ServiceError::InvalidInput(format!(
                    "Paid amount cannot be negative, got: {}",
                    amount
                )));
            }
        }
        if request.payment_type == PaymentType::Contract && request.contract_number.is_none() {
            return Err(ServiceError::InvalidInput(
                "Contract payments require a contract number".to_string(),
            ));
        }

        let txn = self.db.begin().await?;

        let existing = OrderEntity::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let was_approved = existing.production_approved;
        let now = Utc::now();

        let approve = match request.payment_type {
            PaymentType::Full | PaymentType::Contract => true,
            PaymentType::Partial => request.production_approved.unwrap_or(false),
            PaymentType::None => unreachable!("rejected above"),
        };

        let mut active: order::ActiveModel = existing.clone().into();
        active.payment_type = Set(request.payment_type);
        match request.payment_type {
            PaymentType::Full => {
                active.paid_amount = Set(request.paid_amount.unwrap_or(existing.total_amount));
                active.paid_at = Set(Some(now));
            }
            PaymentType::Partial => {
                active.paid_amount = Set(request.paid_amount.unwrap_or(Decimal::ZERO));
                active.paid_at = Set(Some(now));
            }
            PaymentType::Contract => {
                active.contract_number = Set(request.contract_number.clone());
            }
            PaymentType::None => unreachable!("rejected above"),
        }

        let mut created_ids = Vec::new();
        if approve && !was_approved {
            active.production_approved = Set(true);
            active.production_approved_by = Set(request.approved_by.clone());
            active.production_approved_at = Set(Some(now));
            created_ids = Self::create_manufacturing_orders(&txn, &existing).await?;
        }
        active.updated_at = Set(now);

        let updated = active.update(&txn).await?;
        txn.commit().await?;

        counter!("orders.payments.processed", 1);
        info!(
            order_id,
            payment_type = %request.payment_type,
            approved = approve,
            manufacturing_orders = created_ids.len(),
            "payment processed"
        );

        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::OrderPaymentProcessed {
                    order_id,
                    payment_type: request.payment_type.to_string(),
                })
                .await;
            if approve && !was_approved {
                sender
                    .send_or_log(Event::ProductionApproved {
                        order_id,
                        approved_by: request.approved_by,
                        manufacturing_order_ids: created_ids.clone(),
                    })
                    .await;
            }
        }

        Ok(PaymentOutcome {
            order: updated,
            created_manufacturing_order_ids: created_ids,
        })
    }

    /// Resets the payment and approval state of an order and cancels every
    /// manufacturing order created from it.
    #[instrument(skip(self))]
    pub async fn cancel_payment(&self, order_id: i64) -> Result<order::Model, ServiceError> {
        let txn = self.db.begin().await?;

        let existing = OrderEntity::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let mut active: order::ActiveModel = existing.into();
        active.payment_type = Set(PaymentType::None);
        active.paid_amount = Set(Decimal::ZERO);
        active.paid_at = Set(None);
        active.contract_number = Set(None);
        active.production_approved = Set(false);
        active.production_approved_by = Set(None);
        active.production_approved_at = Set(None);
        active.updated_at = Set(Utc::now());
        let updated = active.update(&txn).await?;

        let linked = ManufacturingOrderEntity::find()
            .filter(manufacturing_order::Column::SourceOrderId.eq(order_id))
            .all(&txn)
            .await?;
        let mut cancelled = 0usize;
        for mo in linked {
            if mo.status.is_terminal() {
                continue;
            }
            let mut active: manufacturing_order::ActiveModel = mo.into();
            active.status = Set(ManufacturingOrderStatus::Cancelled);
            active.updated_at = Set(Utc::now());
            active.update(&txn).await?;
            cancelled += 1;
        }

        txn.commit().await?;

        counter!("orders.payments.cancelled", 1);
        info!(order_id, cancelled_manufacturing_orders = cancelled, "payment cancelled");

        if let Some(sender) = &self.event_sender {
            sender.send_or_log(Event::OrderPaymentCancelled(order_id)).await;
        }

        Ok(updated)
    }

    /// Approves production without touching payment fields. Idempotent: an
    /// already-approved order is returned unchanged with no new
    /// manufacturing orders.
    #[instrument(skip(self))]
    pub async fn approve_production(
        &self,
        order_id: i64,
        approved_by: Option<String>,
    ) -> Result<PaymentOutcome, ServiceError> {
        let txn = self.db.begin().await?;

        let existing = OrderEntity::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        if existing.production_approved {
            txn.commit().await?;
            return Ok(PaymentOutcome {
                order: existing,
                created_manufacturing_order_ids: Vec::new(),
            });
        }

        let created_ids = Self::create_manufacturing_orders(&txn, &existing).await?;

        let mut active: order::ActiveModel = existing.into();
        active.production_approved = Set(true);
        active.production_approved_by = Set(approved_by.clone());
        active.production_approved_at = Set(Some(Utc::now()));
        active.updated_at = Set(Utc::now());
        let updated = active.update(&txn).await?;

        txn.commit().await?;

        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::ProductionApproved {
                    order_id,
                    approved_by,
                    manufacturing_order_ids: created_ids.clone(),
                })
                .await;
        }

        Ok(PaymentOutcome {
            order: updated,
            created_manufacturing_order_ids: created_ids,
        })
    }

    /// One pending manufacturing order per distinct product across the
    /// order's line items, quantities summed. Products without a recipe are
    /// skipped; the approval itself still succeeds.
    async fn create_manufacturing_orders<C: ConnectionTrait>(
        conn: &C,
        order: &order::Model,
    ) -> Result<Vec<i64>, ServiceError> {
        let items = OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(order.id))
            .all(conn)
            .await?;

        let mut quantities: BTreeMap<i64, i32> = BTreeMap::new();
        for item in &items {
            *quantities.entry(item.product_id).or_insert(0) += item.quantity;
        }

        let mut created = Vec::new();
        for (product_id, quantity) in quantities {
            let recipe = RecipeEntity::find()
                .filter(recipe::Column::ProductId.eq(product_id))
                .one(conn)
                .await?;

            let Some(recipe) = recipe else {
                warn!(
                    order_id = order.id,
                    product_id, "product has no recipe, skipping manufacturing order"
                );
                continue;
            };

            let mo = manufacturing_order::ActiveModel {
                order_number: Set(format!("MO-{}-{}", order.order_number, product_id)),
                product_id: Set(product_id),
                recipe_id: Set(Some(recipe.id)),
                planned_quantity: Set(quantity),
                produced_quantity: Set(None),
                status: Set(ManufacturingOrderStatus::Pending),
                warehouse_id: Set(None),
                source_order_id: Set(Some(order.id)),
                material_cost: Set(None),
                labor_cost: Set(None),
                overhead_cost: Set(None),
                quality_rating: Set(None),
                notes: Set(None),
                serial_numbers: Set(None),
                started_at: Set(None),
                completed_at: Set(None),
                created_at: Set(Utc::now()),
                updated_at: Set(Utc::now()),
                ..Default::default()
            }
            .insert(conn)
            .await?;

            counter!("manufacturing.orders.created_from_order", 1);
            created.push(mo.id);
        }

        Ok(created)
    }
}
