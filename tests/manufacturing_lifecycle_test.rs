mod common;

use assert_matches::assert_matches;
use chrono::{Datelike, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};

use forgeline_api::{
    domain::{ManufacturingOrderStatus, ProductionTaskStatus, SerialNumberStatus, StepStatus},
    entities::{
        inventory_level::{self, Entity as InventoryLevelEntity},
        manufacturing_step::{self, Entity as ManufacturingStepEntity},
        numbering_settings::{self, Entity as NumberingSettingsEntity},
        production_task::{self, Entity as ProductionTaskEntity},
        serial_number::{self, Entity as SerialNumberEntity},
    },
    errors::ServiceError,
    services::manufacturing::{
        CompleteManufacturingOrderRequest, CreateManufacturingOrderRequest, ManufacturingService,
        UpdateStepPatch,
    },
};

use common::{create_category, create_product, create_warehouse, setup};

fn create_request(order_number: &str, product_id: i64, quantity: i32) -> CreateManufacturingOrderRequest {
    CreateManufacturingOrderRequest {
        order_number: order_number.to_string(),
        product_id,
        recipe_id: None,
        planned_quantity: quantity,
        warehouse_id: None,
        notes: None,
    }
}

async fn steps_of(
    db: &sea_orm::DatabaseConnection,
    manufacturing_order_id: i64,
) -> Vec<manufacturing_step::Model> {
    ManufacturingStepEntity::find()
        .filter(manufacturing_step::Column::ManufacturingOrderId.eq(manufacturing_order_id))
        .all(db)
        .await
        .unwrap()
}

#[tokio::test]
async fn start_inserts_default_steps_and_generates_serials() {
    let db = setup("mo_start_steps").await;
    let product = create_product(&db, "UNIT-1", None).await;
    let service = ManufacturingService::new(db.clone(), None);

    let mo = service
        .create(create_request("MO-2001", product.id, 3))
        .await
        .unwrap();
    assert_eq!(mo.status, ManufacturingOrderStatus::Pending);

    let started = service.start(mo.id).await.unwrap();
    assert_eq!(started.status, ManufacturingOrderStatus::InProgress);
    assert!(started.started_at.is_some());

    let steps = steps_of(db.as_ref(), mo.id).await;
    assert_eq!(steps.len(), 5);
    assert!(steps.iter().all(|s| s.status == StepStatus::Pending));
    let mut sequences: Vec<i32> = steps.iter().map(|s| s.sequence).collect();
    sequences.sort_unstable();
    assert_eq!(sequences, vec![1, 2, 3, 4, 5]);

    // One serial per planned unit, all available and linked back.
    let serials = SerialNumberEntity::find()
        .filter(serial_number::Column::ManufacturingOrderId.eq(mo.id))
        .all(db.as_ref())
        .await
        .unwrap();
    assert_eq!(serials.len(), 3);
    assert!(serials
        .iter()
        .all(|s| s.status == SerialNumberStatus::Available && s.product_id == product.id));

    // The serial array is mirrored on the order row.
    let stored = started.serial_numbers.unwrap();
    assert_eq!(stored.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn starting_twice_is_rejected_and_steps_are_not_duplicated() {
    let db = setup("mo_double_start").await;
    let product = create_product(&db, "UNIT-2", None).await;
    let service = ManufacturingService::new(db.clone(), None);

    let mo = service
        .create(create_request("MO-2002", product.id, 1))
        .await
        .unwrap();
    service.start(mo.id).await.unwrap();

    let err = service.start(mo.id).await.unwrap_err();
    assert_matches!(err, ServiceError::InvalidOperation(_));

    assert_eq!(steps_of(db.as_ref(), mo.id).await.len(), 5);
}

#[tokio::test]
async fn category_template_drives_serials_and_advances_counter() {
    let db = setup("mo_category_serials").await;
    let category = create_category(&db, "Motors", Some("MTR-{counter:4}")).await;
    let product = create_product(&db, "UNIT-3", Some(category.id)).await;
    let service = ManufacturingService::new(db.clone(), None);

    let mo = service
        .create(create_request("MO-2003", product.id, 3))
        .await
        .unwrap();
    service.start(mo.id).await.unwrap();

    let mut serials: Vec<String> = SerialNumberEntity::find()
        .filter(serial_number::Column::ManufacturingOrderId.eq(mo.id))
        .all(db.as_ref())
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.serial)
        .collect();
    serials.sort();
    assert_eq!(serials, vec!["MTR-0001", "MTR-0002", "MTR-0003"]);

    let cat = forgeline_api::entities::category::Entity::find_by_id(category.id)
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cat.serial_counter, 4);
}

#[tokio::test]
async fn global_cross_numbering_wins_over_category_template() {
    let db = setup("mo_global_serials").await;
    let category = create_category(&db, "Motors", Some("MTR-{counter:4}")).await;
    let product = create_product(&db, "UNIT-4", Some(category.id)).await;

    let settings = NumberingSettingsEntity::find()
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    let mut active: numbering_settings::ActiveModel = settings.into();
    active.cross_numbering_enabled = Set(true);
    active.global_template = Set("GLB-{counter:5}".to_string());
    active.global_counter = Set(10);
    active.update(db.as_ref()).await.unwrap();

    let service = ManufacturingService::new(db.clone(), None);
    let mo = service
        .create(create_request("MO-2004", product.id, 2))
        .await
        .unwrap();
    service.start(mo.id).await.unwrap();

    let mut serials: Vec<String> = SerialNumberEntity::find()
        .filter(serial_number::Column::ManufacturingOrderId.eq(mo.id))
        .all(db.as_ref())
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.serial)
        .collect();
    serials.sort();
    assert_eq!(serials, vec!["GLB-00010", "GLB-00011"]);

    let settings = NumberingSettingsEntity::find()
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(settings.global_counter, 12);
}

#[tokio::test]
async fn fallback_serials_derive_from_the_order_number() {
    let db = setup("mo_fallback_serials").await;
    let product = create_product(&db, "UNIT-5", None).await;
    let service = ManufacturingService::new(db.clone(), None);

    let mo = service
        .create(create_request("MO-2005", product.id, 2))
        .await
        .unwrap();
    service.start(mo.id).await.unwrap();

    let year = Utc::now().year();
    let mut serials: Vec<String> = SerialNumberEntity::find()
        .filter(serial_number::Column::ManufacturingOrderId.eq(mo.id))
        .all(db.as_ref())
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.serial)
        .collect();
    serials.sort();
    assert_eq!(
        serials,
        vec![format!("{}-2005-001", year), format!("{}-2005-002", year)]
    );
}

#[tokio::test]
async fn start_pairs_matching_production_task() {
    let db = setup("mo_task_pairing").await;
    let product = create_product(&db, "UNIT-6", None).await;

    let task = production_task::ActiveModel {
        product_id: Set(product.id),
        quantity: Set(4),
        status: Set(ProductionTaskStatus::Planned),
        progress: Set(0),
        start_date: Set(None),
        end_date: Set(None),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db.as_ref())
    .await
    .unwrap();

    let service = ManufacturingService::new(db.clone(), None);
    let mo = service
        .create(create_request("MO-2006", product.id, 4))
        .await
        .unwrap();
    service.start(mo.id).await.unwrap();

    let task = ProductionTaskEntity::find_by_id(task.id)
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(task.status, ProductionTaskStatus::InProgress);
    assert!(task.start_date.is_some());

    // Deleting the order reverts the paired task to the planning board.
    assert!(service.delete(mo.id).await.unwrap());
    let task = ProductionTaskEntity::find_by_id(task.id)
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(task.status, ProductionTaskStatus::Planned);
    assert_eq!(task.progress, 0);
    assert!(task.start_date.is_none());
    assert!(task.end_date.is_none());
}

#[tokio::test]
async fn stop_pauses_order_and_force_completes_running_steps() {
    let db = setup("mo_stop").await;
    let product = create_product(&db, "UNIT-7", None).await;
    let service = ManufacturingService::new(db.clone(), None);

    let mo = service
        .create(create_request("MO-2007", product.id, 1))
        .await
        .unwrap();
    service.start(mo.id).await.unwrap();

    let steps = service.list_steps(mo.id).await.unwrap();
    service
        .update_step(
            steps[0].id,
            UpdateStepPatch {
                status: Some(StepStatus::InProgress),
                assigned_worker: Some("kim".to_string()),
            },
        )
        .await
        .unwrap();

    let stopped = service.stop(mo.id).await.unwrap();
    assert_eq!(stopped.status, ManufacturingOrderStatus::Paused);

    let steps = service.list_steps(mo.id).await.unwrap();
    let first = &steps[0];
    assert_eq!(first.status, StepStatus::Completed);
    assert!(first.completed_at.is_some());
    assert!(steps[1..].iter().all(|s| s.status == StepStatus::Pending));
}

#[tokio::test]
async fn completed_step_cannot_be_reopened() {
    let db = setup("mo_step_reopen").await;
    let product = create_product(&db, "UNIT-12", None).await;
    let service = ManufacturingService::new(db.clone(), None);

    let mo = service
        .create(create_request("MO-2013", product.id, 1))
        .await
        .unwrap();
    service.start(mo.id).await.unwrap();

    let steps = service.list_steps(mo.id).await.unwrap();
    let done = service
        .update_step(
            steps[0].id,
            UpdateStepPatch {
                status: Some(StepStatus::Completed),
                assigned_worker: None,
            },
        )
        .await
        .unwrap();
    assert!(done.completed_at.is_some());

    let err = service
        .update_step(
            steps[0].id,
            UpdateStepPatch {
                status: Some(StepStatus::Pending),
                assigned_worker: None,
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidOperation(_));

    // Status and completion stamp both survive the rejected regress.
    let steps = service.list_steps(mo.id).await.unwrap();
    assert_eq!(steps[0].status, StepStatus::Completed);
    assert!(steps[0].completed_at.is_some());
}

#[tokio::test]
async fn complete_books_produced_quantity_into_inventory() {
    let db = setup("mo_complete_inventory").await;
    let product = create_product(&db, "UNIT-8", None).await;
    let warehouse = create_warehouse(&db, "WH-MAIN").await;
    let service = ManufacturingService::new(db.clone(), None);

    let mo = service
        .create(CreateManufacturingOrderRequest {
            order_number: "MO-2008".to_string(),
            product_id: product.id,
            recipe_id: None,
            planned_quantity: 5,
            warehouse_id: Some(warehouse.id),
            notes: None,
        })
        .await
        .unwrap();
    service.start(mo.id).await.unwrap();

    let completed = service
        .complete(
            mo.id,
            CompleteManufacturingOrderRequest {
                produced_quantity: 5,
                quality_rating: Some(4),
                notes: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(completed.status, ManufacturingOrderStatus::Completed);
    assert_eq!(completed.produced_quantity, Some(5));
    assert!(completed.completed_at.is_some());

    // Row created with exactly the produced quantity.
    let level = InventoryLevelEntity::find()
        .filter(inventory_level::Column::ProductId.eq(product.id))
        .filter(inventory_level::Column::WarehouseId.eq(warehouse.id))
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(level.quantity, 5);

    // A second run increments the same row.
    let mo2 = service
        .create(CreateManufacturingOrderRequest {
            order_number: "MO-2009".to_string(),
            product_id: product.id,
            recipe_id: None,
            planned_quantity: 2,
            warehouse_id: Some(warehouse.id),
            notes: None,
        })
        .await
        .unwrap();
    service.start(mo2.id).await.unwrap();
    service
        .complete(
            mo2.id,
            CompleteManufacturingOrderRequest {
                produced_quantity: 2,
                quality_rating: None,
                notes: None,
            },
        )
        .await
        .unwrap();

    let level = InventoryLevelEntity::find_by_id(level.id)
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(level.quantity, 7);
}

#[tokio::test]
async fn complete_from_pending_is_rejected() {
    let db = setup("mo_complete_pending").await;
    let product = create_product(&db, "UNIT-9", None).await;
    let service = ManufacturingService::new(db.clone(), None);

    let mo = service
        .create(create_request("MO-2010", product.id, 1))
        .await
        .unwrap();

    let err = service
        .complete(
            mo.id,
            CompleteManufacturingOrderRequest {
                produced_quantity: 1,
                quality_rating: None,
                notes: None,
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidOperation(_));
}

#[tokio::test]
async fn cancelled_order_cannot_be_started() {
    let db = setup("mo_cancel_terminal").await;
    let product = create_product(&db, "UNIT-10", None).await;
    let service = ManufacturingService::new(db.clone(), None);

    let mo = service
        .create(create_request("MO-2011", product.id, 1))
        .await
        .unwrap();
    let cancelled = service.cancel(mo.id).await.unwrap();
    assert_eq!(cancelled.status, ManufacturingOrderStatus::Cancelled);

    let err = service.start(mo.id).await.unwrap_err();
    assert_matches!(err, ServiceError::InvalidOperation(_));
}

#[tokio::test]
async fn delete_removes_steps_and_serials_and_reports_missing_ids() {
    let db = setup("mo_delete").await;
    let product = create_product(&db, "UNIT-11", None).await;
    let service = ManufacturingService::new(db.clone(), None);

    let mo = service
        .create(create_request("MO-2012", product.id, 2))
        .await
        .unwrap();
    service.start(mo.id).await.unwrap();

    assert!(service.delete(mo.id).await.unwrap());
    assert!(steps_of(db.as_ref(), mo.id).await.is_empty());
    let serials = SerialNumberEntity::find()
        .filter(serial_number::Column::ManufacturingOrderId.eq(mo.id))
        .all(db.as_ref())
        .await
        .unwrap();
    assert!(serials.is_empty());

    // Missing ids report false instead of an error.
    assert!(!service.delete(mo.id).await.unwrap());
}
