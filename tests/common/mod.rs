#![allow(dead_code)]

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use std::sync::Arc;

use forgeline_api::{
    db::{connect, run_migrations},
    entities::{category, client, product, recipe, warehouse},
};

/// Fresh named in-memory database with the full schema applied. Each test
/// passes its own name so parallel tests never share state.
pub async fn setup(name: &str) -> Arc<DatabaseConnection> {
    let url = format!("sqlite:file:{}?mode=memory&cache=shared", name);
    let pool = connect(&url).await.expect("failed to create test database");
    run_migrations(&pool).await.expect("failed to run migrations");
    Arc::new(pool)
}

pub async fn create_client(db: &DatabaseConnection, name: &str) -> client::Model {
    client::ActiveModel {
        name: Set(name.to_string()),
        email: Set(None),
        phone: Set(None),
        company_id: Set(None),
        external_id: Set(None),
        source: Set(None),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("failed to insert client")
}

pub async fn create_category(
    db: &DatabaseConnection,
    name: &str,
    serial_template: Option<&str>,
) -> category::Model {
    category::ActiveModel {
        name: Set(name.to_string()),
        serial_numbering_enabled: Set(serial_template.is_some()),
        serial_template: Set(serial_template.map(str::to_string)),
        serial_counter: Set(1),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("failed to insert category")
}

pub async fn create_product(
    db: &DatabaseConnection,
    sku: &str,
    category_id: Option<i64>,
) -> product::Model {
    product::ActiveModel {
        sku: Set(sku.to_string()),
        name: Set(format!("Product {}", sku)),
        category_id: Set(category_id),
        price: Set(Decimal::new(10_00, 2)),
        is_manufactured: Set(true),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("failed to insert product")
}

pub async fn create_recipe(db: &DatabaseConnection, product_id: i64) -> recipe::Model {
    recipe::ActiveModel {
        product_id: Set(product_id),
        name: Set(format!("Recipe for product {}", product_id)),
        output_quantity: Set(1),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("failed to insert recipe")
}

pub async fn create_warehouse(db: &DatabaseConnection, code: &str) -> warehouse::Model {
    warehouse::ActiveModel {
        code: Set(code.to_string()),
        name: Set(format!("Warehouse {}", code)),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("failed to insert warehouse")
}

pub fn dec(value: i64) -> Decimal {
    Decimal::new(value * 100, 2)
}
