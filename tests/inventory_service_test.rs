mod common;

use assert_matches::assert_matches;

use forgeline_api::{
    errors::ServiceError,
    services::inventory::{CreateWarehouseRequest, InventoryService, SetInventoryLevelRequest},
};

use common::{create_product, setup};

#[tokio::test]
async fn warehouse_codes_are_unique() {
    let db = setup("inv_warehouse_codes").await;
    let service = InventoryService::new(db.clone(), None);

    service
        .create_warehouse(CreateWarehouseRequest {
            code: "WH-1".to_string(),
            name: "Main".to_string(),
        })
        .await
        .unwrap();

    let err = service
        .create_warehouse(CreateWarehouseRequest {
            code: "WH-1".to_string(),
            name: "Duplicate".to_string(),
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidInput(_));
}

#[tokio::test]
async fn adjust_quantity_applies_signed_deltas_and_guards_negatives() {
    let db = setup("inv_adjust").await;
    let product = create_product(&db, "STOCK-1", None).await;
    let service = InventoryService::new(db.clone(), None);

    let warehouse = service
        .create_warehouse(CreateWarehouseRequest {
            code: "WH-2".to_string(),
            name: "Main".to_string(),
        })
        .await
        .unwrap();

    // First adjustment creates the row.
    let level = service
        .adjust_quantity(product.id, warehouse.id, 10)
        .await
        .unwrap();
    assert_eq!(level.quantity, 10);

    let level = service
        .adjust_quantity(product.id, warehouse.id, -4)
        .await
        .unwrap();
    assert_eq!(level.quantity, 6);

    let err = service
        .adjust_quantity(product.id, warehouse.id, -7)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidOperation(_));

    let unchanged = service
        .get_level(product.id, warehouse.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unchanged.quantity, 6);
}

#[tokio::test]
async fn set_level_overwrites_and_creates() {
    let db = setup("inv_set_level").await;
    let product = create_product(&db, "STOCK-2", None).await;
    let service = InventoryService::new(db.clone(), None);

    let warehouse = service
        .create_warehouse(CreateWarehouseRequest {
            code: "WH-3".to_string(),
            name: "Main".to_string(),
        })
        .await
        .unwrap();

    let created = service
        .set_level(SetInventoryLevelRequest {
            product_id: product.id,
            warehouse_id: warehouse.id,
            quantity: 20,
            min_stock: 5,
            max_stock: Some(100),
        })
        .await
        .unwrap();
    assert_eq!(created.quantity, 20);
    assert_eq!(created.min_stock, 5);

    let replaced = service
        .set_level(SetInventoryLevelRequest {
            product_id: product.id,
            warehouse_id: warehouse.id,
            quantity: 3,
            min_stock: 5,
            max_stock: None,
        })
        .await
        .unwrap();
    assert_eq!(replaced.id, created.id);
    assert_eq!(replaced.quantity, 3);
    assert_eq!(replaced.max_stock, None);
}

#[tokio::test]
async fn delete_warehouse_reports_missing_ids() {
    let db = setup("inv_delete_warehouse").await;
    let service = InventoryService::new(db.clone(), None);

    let warehouse = service
        .create_warehouse(CreateWarehouseRequest {
            code: "WH-4".to_string(),
            name: "Temp".to_string(),
        })
        .await
        .unwrap();

    assert!(service.delete_warehouse(warehouse.id).await.unwrap());
    assert!(!service.delete_warehouse(warehouse.id).await.unwrap());
}
