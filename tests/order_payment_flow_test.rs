mod common;

use assert_matches::assert_matches;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use forgeline_api::{
    domain::{ManufacturingOrderStatus, PaymentType},
    entities::manufacturing_order::{self, Entity as ManufacturingOrderEntity},
    errors::ServiceError,
    services::{
        manufacturing::{CompleteManufacturingOrderRequest, ManufacturingService},
        orders::{CreateOrderRequest, OrderItemLine, OrderService, PaymentRequest},
    },
};

use common::{create_client, create_product, create_recipe, dec, setup};

fn payment(payment_type: PaymentType) -> PaymentRequest {
    PaymentRequest {
        payment_type,
        paid_amount: None,
        contract_number: None,
        approved_by: Some("inspector".to_string()),
        production_approved: None,
    }
}

#[tokio::test]
async fn full_payment_approves_production_and_creates_manufacturing_orders() {
    let db = setup("full_payment_approves").await;
    let client = create_client(&db, "Acme").await;
    let widget = create_product(&db, "WIDGET-1", None).await;
    let gadget = create_product(&db, "GADGET-1", None).await;
    create_recipe(&db, widget.id).await;
    create_recipe(&db, gadget.id).await;

    let service = OrderService::new(db.clone(), None);
    let order = service
        .create_order(CreateOrderRequest {
            order_number: "ORD-1001".to_string(),
            client_id: client.id,
            items: vec![
                OrderItemLine {
                    product_id: widget.id,
                    quantity: 3,
                    unit_price: dec(25),
                },
                OrderItemLine {
                    product_id: gadget.id,
                    quantity: 2,
                    unit_price: dec(40),
                },
            ],
            due_date: None,
            notes: None,
        })
        .await
        .unwrap();
    assert_eq!(order.total_amount, dec(155));

    let outcome = service
        .process_payment(order.id, payment(PaymentType::Full))
        .await
        .unwrap();

    assert!(outcome.order.production_approved);
    assert!(outcome.order.paid_at.is_some());
    assert_eq!(outcome.order.paid_amount, dec(155));
    assert_eq!(
        outcome.order.production_approved_by.as_deref(),
        Some("inspector")
    );
    assert_eq!(outcome.created_manufacturing_order_ids.len(), 2);

    // Exactly one pending manufacturing order per product, quantities 3 and 2.
    let mut mos = ManufacturingOrderEntity::find()
        .filter(manufacturing_order::Column::SourceOrderId.eq(order.id))
        .all(db.as_ref())
        .await
        .unwrap();
    mos.sort_by_key(|m| m.product_id);
    assert_eq!(mos.len(), 2);
    assert!(mos
        .iter()
        .all(|m| m.status == ManufacturingOrderStatus::Pending));
    let by_product: Vec<(i64, i32)> = mos.iter().map(|m| (m.product_id, m.planned_quantity)).collect();
    assert!(by_product.contains(&(widget.id, 3)));
    assert!(by_product.contains(&(gadget.id, 2)));
}

#[tokio::test]
async fn repeated_line_items_for_one_product_are_merged() {
    let db = setup("merged_line_items").await;
    let client = create_client(&db, "Acme").await;
    let widget = create_product(&db, "WIDGET-2", None).await;
    create_recipe(&db, widget.id).await;

    let service = OrderService::new(db.clone(), None);
    let order = service
        .create_order(CreateOrderRequest {
            order_number: "ORD-1002".to_string(),
            client_id: client.id,
            items: vec![
                OrderItemLine {
                    product_id: widget.id,
                    quantity: 2,
                    unit_price: dec(25),
                },
                OrderItemLine {
                    product_id: widget.id,
                    quantity: 1,
                    unit_price: dec(25),
                },
            ],
            due_date: None,
            notes: None,
        })
        .await
        .unwrap();

    let outcome = service
        .process_payment(order.id, payment(PaymentType::Full))
        .await
        .unwrap();

    assert_eq!(outcome.created_manufacturing_order_ids.len(), 1);
    let mo = ManufacturingOrderEntity::find_by_id(outcome.created_manufacturing_order_ids[0])
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(mo.planned_quantity, 3);
}

#[tokio::test]
async fn partial_payment_approves_only_on_request() {
    let db = setup("partial_payment").await;
    let client = create_client(&db, "Acme").await;
    let widget = create_product(&db, "WIDGET-3", None).await;
    create_recipe(&db, widget.id).await;

    let service = OrderService::new(db.clone(), None);
    let order = service
        .create_order(CreateOrderRequest {
            order_number: "ORD-1003".to_string(),
            client_id: client.id,
            items: vec![OrderItemLine {
                product_id: widget.id,
                quantity: 1,
                unit_price: dec(25),
            }],
            due_date: None,
            notes: None,
        })
        .await
        .unwrap();

    let outcome = service
        .process_payment(
            order.id,
            PaymentRequest {
                payment_type: PaymentType::Partial,
                paid_amount: Some(dec(10)),
                contract_number: None,
                approved_by: None,
                production_approved: None,
            },
        )
        .await
        .unwrap();
    assert!(!outcome.order.production_approved);
    assert!(outcome.created_manufacturing_order_ids.is_empty());
    assert_eq!(outcome.order.paid_amount, dec(10));

    // Same order, second partial payment, this time with explicit approval.
    let outcome = service
        .process_payment(
            order.id,
            PaymentRequest {
                payment_type: PaymentType::Partial,
                paid_amount: Some(dec(15)),
                contract_number: None,
                approved_by: Some("inspector".to_string()),
                production_approved: Some(true),
            },
        )
        .await
        .unwrap();
    assert!(outcome.order.production_approved);
    assert_eq!(outcome.created_manufacturing_order_ids.len(), 1);
}

#[tokio::test]
async fn contract_payment_requires_contract_number() {
    let db = setup("contract_payment").await;
    let client = create_client(&db, "Acme").await;
    let widget = create_product(&db, "WIDGET-4", None).await;
    create_recipe(&db, widget.id).await;

    let service = OrderService::new(db.clone(), None);
    let order = service
        .create_order(CreateOrderRequest {
            order_number: "ORD-1004".to_string(),
            client_id: client.id,
            items: vec![OrderItemLine {
                product_id: widget.id,
                quantity: 1,
                unit_price: dec(25),
            }],
            due_date: None,
            notes: None,
        })
        .await
        .unwrap();

    let err = service
        .process_payment(order.id, payment(PaymentType::Contract))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidInput(_));

    let outcome = service
        .process_payment(
            order.id,
            PaymentRequest {
                payment_type: PaymentType::Contract,
                paid_amount: None,
                contract_number: Some("CTR-77".to_string()),
                approved_by: None,
                production_approved: None,
            },
        )
        .await
        .unwrap();
    assert!(outcome.order.production_approved);
    assert_eq!(outcome.order.contract_number.as_deref(), Some("CTR-77"));
    assert!(outcome.order.paid_at.is_none());
}

#[tokio::test]
async fn second_full_payment_does_not_duplicate_manufacturing_orders() {
    let db = setup("idempotent_payment").await;
    let client = create_client(&db, "Acme").await;
    let widget = create_product(&db, "WIDGET-5", None).await;
    create_recipe(&db, widget.id).await;

    let service = OrderService::new(db.clone(), None);
    let order = service
        .create_order(CreateOrderRequest {
            order_number: "ORD-1005".to_string(),
            client_id: client.id,
            items: vec![OrderItemLine {
                product_id: widget.id,
                quantity: 2,
                unit_price: dec(25),
            }],
            due_date: None,
            notes: None,
        })
        .await
        .unwrap();

    let first = service
        .process_payment(order.id, payment(PaymentType::Full))
        .await
        .unwrap();
    assert_eq!(first.created_manufacturing_order_ids.len(), 1);

    let second = service
        .process_payment(order.id, payment(PaymentType::Full))
        .await
        .unwrap();
    assert!(second.created_manufacturing_order_ids.is_empty());

    let count = ManufacturingOrderEntity::find()
        .filter(manufacturing_order::Column::SourceOrderId.eq(order.id))
        .all(db.as_ref())
        .await
        .unwrap()
        .len();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn product_without_recipe_is_skipped_but_payment_succeeds() {
    let db = setup("no_recipe_skip").await;
    let client = create_client(&db, "Acme").await;
    let widget = create_product(&db, "WIDGET-6", None).await;
    let raw = create_product(&db, "RAW-1", None).await;
    create_recipe(&db, widget.id).await;
    // raw has no recipe on purpose

    let service = OrderService::new(db.clone(), None);
    let order = service
        .create_order(CreateOrderRequest {
            order_number: "ORD-1006".to_string(),
            client_id: client.id,
            items: vec![
                OrderItemLine {
                    product_id: widget.id,
                    quantity: 1,
                    unit_price: dec(25),
                },
                OrderItemLine {
                    product_id: raw.id,
                    quantity: 4,
                    unit_price: dec(5),
                },
            ],
            due_date: None,
            notes: None,
        })
        .await
        .unwrap();

    let outcome = service
        .process_payment(order.id, payment(PaymentType::Full))
        .await
        .unwrap();
    assert!(outcome.order.production_approved);
    assert_eq!(outcome.created_manufacturing_order_ids.len(), 1);
}

#[tokio::test]
async fn cancel_payment_resets_order_and_cancels_linked_manufacturing_orders() {
    let db = setup("cancel_payment").await;
    let client = create_client(&db, "Acme").await;
    let widget = create_product(&db, "WIDGET-7", None).await;
    create_recipe(&db, widget.id).await;

    let service = OrderService::new(db.clone(), None);
    let order = service
        .create_order(CreateOrderRequest {
            order_number: "ORD-1007".to_string(),
            client_id: client.id,
            items: vec![OrderItemLine {
                product_id: widget.id,
                quantity: 2,
                unit_price: dec(25),
            }],
            due_date: None,
            notes: None,
        })
        .await
        .unwrap();

    service
        .process_payment(order.id, payment(PaymentType::Full))
        .await
        .unwrap();

    let reset = service.cancel_payment(order.id).await.unwrap();
    assert_eq!(reset.payment_type, PaymentType::None);
    assert_eq!(reset.paid_amount, Decimal::ZERO);
    assert!(reset.paid_at.is_none());
    assert!(reset.contract_number.is_none());
    assert!(!reset.production_approved);
    assert!(reset.production_approved_by.is_none());
    assert!(reset.production_approved_at.is_none());

    let mos = ManufacturingOrderEntity::find()
        .filter(manufacturing_order::Column::SourceOrderId.eq(order.id))
        .all(db.as_ref())
        .await
        .unwrap();
    assert!(!mos.is_empty());
    assert!(mos
        .iter()
        .all(|m| m.status == ManufacturingOrderStatus::Cancelled));
}

#[tokio::test]
async fn cancel_payment_leaves_completed_runs_untouched() {
    let db = setup("cancel_completed_run").await;
    let client = create_client(&db, "Acme").await;
    let widget = create_product(&db, "WIDGET-11", None).await;
    let gadget = create_product(&db, "GADGET-2", None).await;
    create_recipe(&db, widget.id).await;
    create_recipe(&db, gadget.id).await;

    let service = OrderService::new(db.clone(), None);
    let order = service
        .create_order(CreateOrderRequest {
            order_number: "ORD-1011".to_string(),
            client_id: client.id,
            items: vec![
                OrderItemLine {
                    product_id: widget.id,
                    quantity: 2,
                    unit_price: dec(25),
                },
                OrderItemLine {
                    product_id: gadget.id,
                    quantity: 1,
                    unit_price: dec(40),
                },
            ],
            due_date: None,
            notes: None,
        })
        .await
        .unwrap();

    let outcome = service
        .process_payment(order.id, payment(PaymentType::Full))
        .await
        .unwrap();
    assert_eq!(outcome.created_manufacturing_order_ids.len(), 2);

    // Run the widget order to completion before the payment is reversed.
    let manufacturing = ManufacturingService::new(db.clone(), None);
    let widget_mo = ManufacturingOrderEntity::find()
        .filter(manufacturing_order::Column::SourceOrderId.eq(order.id))
        .filter(manufacturing_order::Column::ProductId.eq(widget.id))
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    manufacturing.start(widget_mo.id).await.unwrap();
    manufacturing
        .complete(
            widget_mo.id,
            CompleteManufacturingOrderRequest {
                produced_quantity: 2,
                quality_rating: None,
                notes: None,
            },
        )
        .await
        .unwrap();

    let reset = service.cancel_payment(order.id).await.unwrap();
    assert!(!reset.production_approved);

    // The finished run keeps its history; only the pending one is cancelled.
    let mos = ManufacturingOrderEntity::find()
        .filter(manufacturing_order::Column::SourceOrderId.eq(order.id))
        .all(db.as_ref())
        .await
        .unwrap();
    let widget_mo = mos.iter().find(|m| m.product_id == widget.id).unwrap();
    let gadget_mo = mos.iter().find(|m| m.product_id == gadget.id).unwrap();
    assert_eq!(widget_mo.status, ManufacturingOrderStatus::Completed);
    assert_eq!(widget_mo.produced_quantity, Some(2));
    assert_eq!(gadget_mo.status, ManufacturingOrderStatus::Cancelled);
}

#[tokio::test]
async fn approve_production_without_payment_is_idempotent() {
    let db = setup("approve_without_payment").await;
    let client = create_client(&db, "Acme").await;
    let widget = create_product(&db, "WIDGET-8", None).await;
    create_recipe(&db, widget.id).await;

    let service = OrderService::new(db.clone(), None);
    let order = service
        .create_order(CreateOrderRequest {
            order_number: "ORD-1008".to_string(),
            client_id: client.id,
            items: vec![OrderItemLine {
                product_id: widget.id,
                quantity: 1,
                unit_price: dec(25),
            }],
            due_date: None,
            notes: None,
        })
        .await
        .unwrap();

    let first = service
        .approve_production(order.id, Some("lead".to_string()))
        .await
        .unwrap();
    assert!(first.order.production_approved);
    assert_eq!(first.order.payment_type, PaymentType::None);
    assert_eq!(first.created_manufacturing_order_ids.len(), 1);

    let second = service.approve_production(order.id, None).await.unwrap();
    assert!(second.created_manufacturing_order_ids.is_empty());
}

#[tokio::test]
async fn payment_with_type_none_is_rejected() {
    let db = setup("none_payment_rejected").await;
    let client = create_client(&db, "Acme").await;
    let widget = create_product(&db, "WIDGET-9", None).await;

    let service = OrderService::new(db.clone(), None);
    let order = service
        .create_order(CreateOrderRequest {
            order_number: "ORD-1009".to_string(),
            client_id: client.id,
            items: vec![OrderItemLine {
                product_id: widget.id,
                quantity: 1,
                unit_price: dec(25),
            }],
            due_date: None,
            notes: None,
        })
        .await
        .unwrap();

    let err = service
        .process_payment(order.id, payment(PaymentType::None))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidInput(_));
}

#[tokio::test]
async fn delete_order_returns_false_for_missing_id() {
    let db = setup("delete_missing_order").await;
    let service = OrderService::new(db.clone(), None);

    assert!(!service.delete_order(9999).await.unwrap());
}

#[tokio::test]
async fn replace_order_items_recomputes_total() {
    let db = setup("replace_items").await;
    let client = create_client(&db, "Acme").await;
    let widget = create_product(&db, "WIDGET-10", None).await;

    let service = OrderService::new(db.clone(), None);
    let order = service
        .create_order(CreateOrderRequest {
            order_number: "ORD-1010".to_string(),
            client_id: client.id,
            items: vec![OrderItemLine {
                product_id: widget.id,
                quantity: 1,
                unit_price: dec(25),
            }],
            due_date: None,
            notes: None,
        })
        .await
        .unwrap();
    assert_eq!(order.total_amount, dec(25));

    let (updated, items) = service
        .replace_order_items(
            order.id,
            vec![OrderItemLine {
                product_id: widget.id,
                quantity: 4,
                unit_price: dec(30),
            }],
        )
        .await
        .unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(updated.total_amount, dec(120));
}
