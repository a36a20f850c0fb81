use chrono::Utc;
use metrics::{counter, histogram};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

use crate::{
    domain::{ManufacturingOrderStatus, ProductionTaskStatus, StepStatus},
    entities::{
        manufacturing_order::{self, Entity as ManufacturingOrderEntity},
        manufacturing_step::{self, Entity as ManufacturingStepEntity},
        product::Entity as ProductEntity,
        production_task::{self, Entity as ProductionTaskEntity},
        serial_number::{self, Entity as SerialNumberEntity},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{inventory::InventoryService, serial_numbers::SerialNumberService},
};

/// Default step plan inserted when a manufacturing order starts:
/// (sequence, name, estimated minutes).
const DEFAULT_STEPS: [(i32, &str, i32); 5] = [
    (1, "Material preparation", 30),
    (2, "Setup", 20),
    (3, "Production", 120),
    (4, "Quality check", 25),
    (5, "Packaging", 15),
];

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateManufacturingOrderRequest {
    #[validate(length(min = 1))]
    pub order_number: String,
    pub product_id: i64,
    pub recipe_id: Option<i64>,
    #[validate(range(min = 1))]
    pub planned_quantity: i32,
    pub warehouse_id: Option<i64>,
    pub notes: Option<String>,
}

/// Patch for fields outside the lifecycle; status moves only through the
/// start/stop/complete/cancel methods.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateManufacturingOrderPatch {
    pub planned_quantity: Option<i32>,
    pub recipe_id: Option<i64>,
    pub warehouse_id: Option<i64>,
    pub material_cost: Option<Decimal>,
    pub labor_cost: Option<Decimal>,
    pub overhead_cost: Option<Decimal>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CompleteManufacturingOrderRequest {
    #[validate(range(min = 1))]
    pub produced_quantity: i32,
    #[validate(range(min = 1, max = 5))]
    pub quality_rating: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateStepPatch {
    pub status: Option<StepStatus>,
    pub assigned_worker: Option<String>,
}

/// Manufacturing order lifecycle: pending orders move through production
/// with step tracking, serial number generation and inventory booking.
#[derive(Clone)]
pub struct ManufacturingService {
    db: Arc<DatabaseConnection>,
    event_sender: Option<EventSender>,
}

impl ManufacturingService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Option<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, request), fields(order_number = %request.order_number))]
    pub async fn create(
        &self,
        request: CreateManufacturingOrderRequest,
    ) -> Result<manufacturing_order::Model, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        ProductEntity::find_by_id(request.product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product {} not found", request.product_id))
            })?;

        let created = manufacturing_order::ActiveModel {
            order_number: Set(request.order_number),
            product_id: Set(request.product_id),
            recipe_id: Set(request.recipe_id),
            planned_quantity: Set(request.planned_quantity),
            produced_quantity: Set(None),
            status: Set(ManufacturingOrderStatus::Pending),
            warehouse_id: Set(request.warehouse_id),
            source_order_id: Set(None),
            material_cost: Set(None),
            labor_cost: Set(None),
            overhead_cost: Set(None),
            quality_rating: Set(None),
            notes: Set(request.notes),
            serial_numbers: Set(None),
            started_at: Set(None),
            completed_at: Set(None),
            created_at: Set(Utc::now()),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        counter!("manufacturing.orders.created", 1);
        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::ManufacturingOrderCreated {
                    manufacturing_order_id: created.id,
                    product_id: created.product_id,
                    planned_quantity: created.planned_quantity,
                })
                .await;
        }

        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<manufacturing_order::Model, ServiceError> {
        ManufacturingOrderEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Manufacturing order {} not found", id))
            })
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        status: Option<ManufacturingOrderStatus>,
    ) -> Result<Vec<manufacturing_order::Model>, ServiceError> {
        let mut query =
            ManufacturingOrderEntity::find().order_by_desc(manufacturing_order::Column::CreatedAt);
        if let Some(status) = status {
            query = query.filter(manufacturing_order::Column::Status.eq(status));
        }
        Ok(query.all(&*self.db).await?)
    }

    #[instrument(skip(self, patch))]
    pub async fn update(
        &self,
        id: i64,
        patch: UpdateManufacturingOrderPatch,
    ) -> Result<manufacturing_order::Model, ServiceError> {
        if let Some(qty) = patch.planned_quantity {
            if qty < 1 {
                return Err(ServiceError::InvalidInput(format!(
                    "Planned quantity must be positive, got: {}",
                    qty
                )));
            }
        }

        let existing = self.get(id).await?;
        let mut active: manufacturing_order::ActiveModel = existing.into();

        if let Some(qty) = patch.planned_quantity {
            active.planned_quantity = Set(qty);
        }
        if let Some(recipe_id) = patch.recipe_id {
            active.recipe_id = Set(Some(recipe_id));
        }
        if let Some(warehouse_id) = patch.warehouse_id {
            active.warehouse_id = Set(Some(warehouse_id));
        }
        if let Some(cost) = patch.material_cost {
            active.material_cost = Set(Some(cost));
        }
        if let Some(cost) = patch.labor_cost {
            active.labor_cost = Set(Some(cost));
        }
        if let Some(cost) = patch.overhead_cost {
            active.overhead_cost = Set(Some(cost));
        }
        if let Some(notes) = patch.notes {
            active.notes = Set(Some(notes));
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(&*self.db).await?)
    }

    /// Starts a pending manufacturing order.
    ///
    /// Inserts the default step plan, pairs up a matching production task,
    /// generates one serial per planned unit and stamps started_at, all in
    /// one transaction. Starting an order in any other state is rejected, so
    /// the step plan cannot be inserted twice.
    #[instrument(skip(self))]
    pub async fn start(&self, id: i64) -> Result<manufacturing_order::Model, ServiceError> {
        let txn = self.db.begin().await?;

        let existing = ManufacturingOrderEntity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Manufacturing order {} not found", id))
            })?;

        // Resume from paused goes through update, not start; only a pending
        // order gets the step plan and serials.
        if existing.status != ManufacturingOrderStatus::Pending {
            return Err(ServiceError::InvalidOperation(format!(
                "Manufacturing order {} cannot start from status {}",
                id, existing.status
            )));
        }

        let now = Utc::now();

        for (sequence, name, minutes) in DEFAULT_STEPS {
            manufacturing_step::ActiveModel {
                manufacturing_order_id: Set(id),
                sequence: Set(sequence),
                name: Set(name.to_string()),
                status: Set(StepStatus::Pending),
                estimated_duration_minutes: Set(minutes),
                assigned_worker: Set(None),
                started_at: Set(None),
                completed_at: Set(None),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }

        // Planning-board pairing: tasks carry no order reference, so the
        // match is by product and quantity.
        if let Some(task) =
            Self::find_matching_task(&txn, &existing, ProductionTaskStatus::Planned).await?
        {
            let mut active: production_task::ActiveModel = task.into();
            active.status = Set(ProductionTaskStatus::InProgress);
            active.start_date = Set(Some(now));
            active.updated_at = Set(now);
            active.update(&txn).await?;
        }

        let serials = SerialNumberService::generate_for_production(
            &txn,
            existing.product_id,
            id,
            &existing.order_number,
            existing.planned_quantity,
        )
        .await?;

        let serial_count = serials.len();
        let mut active: manufacturing_order::ActiveModel = existing.into();
        active.status = Set(ManufacturingOrderStatus::InProgress);
        active.started_at = Set(Some(now));
        active.serial_numbers = Set(Some(serde_json::json!(serials)));
        active.updated_at = Set(now);
        let updated = active.update(&txn).await?;

        txn.commit().await?;

        counter!("manufacturing.orders.started", 1);
        info!(
            manufacturing_order_id = id,
            serials = serial_count,
            "manufacturing order started"
        );

        if let Some(sender) = &self.event_sender {
            sender.send_or_log(Event::ManufacturingOrderStarted(id)).await;
            sender
                .send_or_log(Event::SerialNumbersGenerated {
                    manufacturing_order_id: id,
                    count: serial_count,
                })
                .await;
        }

        Ok(updated)
    }

    /// Pauses a running order; any step still in progress is force-completed
    /// so the step log never shows work continuing on a paused order.
    #[instrument(skip(self))]
    pub async fn stop(&self, id: i64) -> Result<manufacturing_order::Model, ServiceError> {
        let txn = self.db.begin().await?;

        let existing = ManufacturingOrderEntity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Manufacturing order {} not found", id))
            })?;

        if !existing
            .status
            .can_transition_to(ManufacturingOrderStatus::Paused)
        {
            return Err(ServiceError::InvalidOperation(format!(
                "Manufacturing order {} cannot stop from status {}",
                id, existing.status
            )));
        }

        let now = Utc::now();

        let running_steps = ManufacturingStepEntity::find()
            .filter(manufacturing_step::Column::ManufacturingOrderId.eq(id))
            .filter(manufacturing_step::Column::Status.eq(StepStatus::InProgress))
            .all(&txn)
            .await?;
        for step in running_steps {
            let mut active: manufacturing_step::ActiveModel = step.into();
            active.status = Set(StepStatus::Completed);
            active.completed_at = Set(Some(now));
            active.update(&txn).await?;
        }

        let mut active: manufacturing_order::ActiveModel = existing.into();
        active.status = Set(ManufacturingOrderStatus::Paused);
        active.updated_at = Set(now);
        let updated = active.update(&txn).await?;

        txn.commit().await?;

        counter!("manufacturing.orders.paused", 1);
        if let Some(sender) = &self.event_sender {
            sender.send_or_log(Event::ManufacturingOrderPaused(id)).await;
        }

        Ok(updated)
    }

    /// Completes a running order and books the produced quantity into the
    /// order's warehouse. The status update and the inventory upsert share
    /// one transaction.
    #[instrument(skip(self, request))]
    pub async fn complete(
        &self,
        id: i64,
        request: CompleteManufacturingOrderRequest,
    ) -> Result<manufacturing_order::Model, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let txn = self.db.begin().await?;

        let existing = ManufacturingOrderEntity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Manufacturing order {} not found", id))
            })?;

        if !existing
            .status
            .can_transition_to(ManufacturingOrderStatus::Completed)
        {
            return Err(ServiceError::InvalidOperation(format!(
                "Manufacturing order {} cannot complete from status {}",
                id, existing.status
            )));
        }

        let now = Utc::now();
        let mut inventory_change = None;
        if let Some(warehouse_id) = existing.warehouse_id {
            let (old, level) = InventoryService::upsert_increment(
                &txn,
                existing.product_id,
                warehouse_id,
                request.produced_quantity,
            )
            .await?;
            inventory_change = Some((warehouse_id, old, level.quantity));
        }

        let product_id = existing.product_id;
        let mut active: manufacturing_order::ActiveModel = existing.into();
        active.status = Set(ManufacturingOrderStatus::Completed);
        active.produced_quantity = Set(Some(request.produced_quantity));
        active.quality_rating = Set(request.quality_rating);
        if let Some(notes) = request.notes {
            active.notes = Set(Some(notes));
        }
        active.completed_at = Set(Some(now));
        active.updated_at = Set(now);
        let updated = active.update(&txn).await?;

        txn.commit().await?;

        counter!("manufacturing.orders.completed", 1);
        histogram!(
            "manufacturing.orders.produced_quantity",
            request.produced_quantity as f64
        );
        info!(
            manufacturing_order_id = id,
            produced = request.produced_quantity,
            "manufacturing order completed"
        );

        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::ManufacturingOrderCompleted {
                    manufacturing_order_id: id,
                    produced_quantity: request.produced_quantity,
                })
                .await;
            if let Some((warehouse_id, old_quantity, new_quantity)) = inventory_change {
                sender
                    .send_or_log(Event::InventoryAdjusted {
                        product_id,
                        warehouse_id,
                        old_quantity,
                        new_quantity,
                    })
                    .await;
            }
        }

        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn cancel(&self, id: i64) -> Result<manufacturing_order::Model, ServiceError> {
        let existing = self.get(id).await?;

        if !existing
            .status
            .can_transition_to(ManufacturingOrderStatus::Cancelled)
        {
            return Err(ServiceError::InvalidOperation(format!(
                "Manufacturing order {} cannot cancel from status {}",
                id, existing.status
            )));
        }

        let mut active: manufacturing_order::ActiveModel = existing.into();
        active.status = Set(ManufacturingOrderStatus::Cancelled);
        active.updated_at = Set(Utc::now());
        let updated = active.update(&*self.db).await?;

        counter!("manufacturing.orders.cancelled", 1);
        if let Some(sender) = &self.event_sender {
            sender.send_or_log(Event::ManufacturingOrderCancelled(id)).await;
        }

        Ok(updated)
    }

    /// Deletes an order, its steps and its serial rows; a production task
    /// paired with the order is reverted to planned. Returns false when the
    /// id does not exist.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<bool, ServiceError> {
        let txn = self.db.begin().await?;

        let Some(existing) = ManufacturingOrderEntity::find_by_id(id).one(&txn).await? else {
            return Ok(false);
        };

        ManufacturingStepEntity::delete_many()
            .filter(manufacturing_step::Column::ManufacturingOrderId.eq(id))
            .exec(&txn)
            .await?;
        SerialNumberEntity::delete_many()
            .filter(serial_number::Column::ManufacturingOrderId.eq(id))
            .exec(&txn)
            .await?;

        if let Some(task) =
            Self::find_matching_task(&txn, &existing, ProductionTaskStatus::InProgress).await?
        {
            let mut active: production_task::ActiveModel = task.into();
            active.status = Set(ProductionTaskStatus::Planned);
            active.progress = Set(0);
            active.start_date = Set(None);
            active.end_date = Set(None);
            active.updated_at = Set(Utc::now());
            active.update(&txn).await?;
        }

        ManufacturingOrderEntity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        counter!("manufacturing.orders.deleted", 1);
        if let Some(sender) = &self.event_sender {
            sender.send_or_log(Event::ManufacturingOrderDeleted(id)).await;
        }

        Ok(true)
    }

    #[instrument(skip(self))]
    pub async fn list_steps(
        &self,
        manufacturing_order_id: i64,
    ) -> Result<Vec<manufacturing_step::Model>, ServiceError> {
        Ok(ManufacturingStepEntity::find()
            .filter(manufacturing_step::Column::ManufacturingOrderId.eq(manufacturing_order_id))
            .order_by_asc(manufacturing_step::Column::Sequence)
            .all(&*self.db)
            .await?)
    }

    /// Worker-facing step update; moving into in_progress/completed stamps
    /// the corresponding timestamp. Steps only move forward, so a finished
    /// or skipped step cannot be reopened.
    #[instrument(skip(self, patch))]
    pub async fn update_step(
        &self,
        step_id: i64,
        patch: UpdateStepPatch,
    ) -> Result<manufacturing_step::Model, ServiceError> {
        let existing = ManufacturingStepEntity::find_by_id(step_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Manufacturing step {} not found", step_id))
            })?;

        let current = existing.status;
        let mut active: manufacturing_step::ActiveModel = existing.into();
        if let Some(status) = patch.status {
            if status != current {
                if !current.can_transition_to(status) {
                    return Err(ServiceError::InvalidOperation(format!(
                        "Manufacturing step {} cannot move from {} to {}",
                        step_id, current, status
                    )));
                }
                active.status = Set(status);
                match status {
                    StepStatus::InProgress => active.started_at = Set(Some(Utc::now())),
                    StepStatus::Completed => active.completed_at = Set(Some(Utc::now())),
                    _ => {}
                }
            }
        }
        if let Some(worker) = patch.assigned_worker {
            active.assigned_worker = Set(Some(worker));
        }

        Ok(active.update(&*self.db).await?)
    }

    /// Production tasks have no foreign key to manufacturing orders; the
    /// pairing heuristic is (product_id, quantity) against the given status.
    async fn find_matching_task<C: ConnectionTrait>(
        conn: &C,
        order: &manufacturing_order::Model,
        status: ProductionTaskStatus,
    ) -> Result<Option<production_task::Model>, ServiceError> {
        Ok(ProductionTaskEntity::find()
            .filter(production_task::Column::ProductId.eq(order.product_id))
            .filter(production_task::Column::Quantity.eq(order.planned_quantity))
            .filter(production_task::Column::Status.eq(status))
            .one(conn)
            .await?)
    }
}
