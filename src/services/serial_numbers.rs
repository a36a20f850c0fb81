use chrono::Utc;
use metrics::counter;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter,
};
use std::sync::Arc;
use tracing::{instrument, warn};

use crate::{
    domain::{serial, SerialNumberStatus},
    entities::{
        category::{self, Entity as CategoryEntity},
        numbering_settings::{self, Entity as NumberingSettingsEntity},
        product::Entity as ProductEntity,
        serial_number::{self, Entity as SerialNumberEntity},
    },
    errors::ServiceError,
};

const UNIQUENESS_RETRIES: u32 = 10;

/// Serial number issuing and numbering policy.
///
/// The policy chain for bulk generation, first match wins:
/// 1. global cross-numbering (single `numbering_settings` row)
/// 2. the product category's own template and counter
/// 3. a fallback derived from the manufacturing order number
#[derive(Clone)]
pub struct SerialNumberService {
    db: Arc<DatabaseConnection>,
}

impl SerialNumberService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Generates `quantity` serials for a production run and inserts the
    /// per-unit rows. Runs on the caller's connection so the manufacturing
    /// service can call it inside its own transaction.
    pub async fn generate_for_production<C: ConnectionTrait>(
        conn: &C,
        product_id: i64,
        manufacturing_order_id: i64,
        order_number: &str,
        quantity: i32,
    ) -> Result<Vec<String>, ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::InvalidInput(format!(
                "Serial quantity must be positive, got: {}",
                quantity
            )));
        }

        let today = Utc::now().date_naive();
        let mut serials = Vec::with_capacity(quantity as usize);

        let settings = NumberingSettingsEntity::find()
            .one(conn)
            .await?
            .ok_or_else(|| {
                ServiceError::InternalError("numbering settings row is missing".to_string())
            })?;

        if settings.cross_numbering_enabled {
            let mut counter_value = settings.global_counter;
            for _ in 0..quantity {
                serials.push(serial::render_template(
                    &settings.global_template,
                    today,
                    counter_value,
                ));
                counter_value += 1;
            }
            let mut active: numbering_settings::ActiveModel = settings.into();
            active.global_counter = Set(counter_value);
            active.update(conn).await?;
        } else if let Some(cat) = Self::numbering_category(conn, product_id).await? {
            let template = cat.serial_template.clone().ok_or_else(|| {
                ServiceError::InvalidOperation(format!(
                    "Category {} has serial numbering enabled but no template",
                    cat.id
                ))
            })?;
            let mut counter_value = cat.serial_counter;
            for _ in 0..quantity {
                serials.push(serial::render_template(&template, today, counter_value));
                counter_value += 1;
            }
            let mut active: category::ActiveModel = cat.into();
            active.serial_counter = Set(counter_value);
            active.update(conn).await?;
        } else {
            for seq in 1..=quantity as u32 {
                serials.push(serial::fallback_serial(order_number, today, seq));
            }
        }

        for s in &serials {
            serial_number::ActiveModel {
                serial: Set(s.clone()),
                product_id: Set(product_id),
                status: Set(SerialNumberStatus::Available),
                manufacturing_order_id: Set(Some(manufacturing_order_id)),
                order_id: Set(None),
                created_at: Set(Utc::now()),
                ..Default::default()
            }
            .insert(conn)
            .await?;
        }

        counter!("serial_numbers.generated", serials.len() as u64);

        Ok(serials)
    }

    /// Issues a single serial for a product using the same policy chain,
    /// retrying on collision and finally disambiguating with a timestamp.
    #[instrument(skip(self))]
    pub async fn generate_unique_serial_number(
        &self,
        product_id: i64,
        template: &str,
        starting_counter: i64,
    ) -> Result<String, ServiceError> {
        let today = Utc::now().date_naive();

        for attempt in 0..UNIQUENESS_RETRIES {
            let candidate =
                serial::render_template(template, today, starting_counter + attempt as i64);
            if !self.serial_exists(&candidate).await? {
                return Ok(candidate);
            }
        }

        // Every rendered candidate collided; a millisecond suffix breaks the tie.
        let base = serial::render_template(template, today, starting_counter);
        let candidate = format!("{}-{}", base, Utc::now().timestamp_millis());
        warn!(
            product_id,
            serial = %candidate,
            "serial template exhausted after {} retries, using timestamp suffix",
            UNIQUENESS_RETRIES
        );
        Ok(candidate)
    }

    #[instrument(skip(self))]
    pub async fn get_serial(&self, serial: &str) -> Result<serial_number::Model, ServiceError> {
        SerialNumberEntity::find()
            .filter(serial_number::Column::Serial.eq(serial))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Serial number {} not found", serial)))
    }

    #[instrument(skip(self))]
    pub async fn list_for_product(
        &self,
        product_id: i64,
    ) -> Result<Vec<serial_number::Model>, ServiceError> {
        Ok(SerialNumberEntity::find()
            .filter(serial_number::Column::ProductId.eq(product_id))
            .all(&*self.db)
            .await?)
    }

    /// Moves a unit through its lifecycle (available, reserved, sold,
    /// defective). `order_id` is attached when a unit is sold.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        serial: &str,
        status: SerialNumberStatus,
        order_id: Option<i64>,
    ) -> Result<serial_number::Model, ServiceError> {
        let row = self.get_serial(serial).await?;
        let mut active: serial_number::ActiveModel = row.into();
        active.status = Set(status);
        if order_id.is_some() {
            active.order_id = Set(order_id);
        }
        Ok(active.update(&*self.db).await?)
    }

    async fn serial_exists(&self, candidate: &str) -> Result<bool, ServiceError> {
        Ok(SerialNumberEntity::find()
            .filter(serial_number::Column::Serial.eq(candidate))
            .one(&*self.db)
            .await?
            .is_some())
    }

    async fn numbering_category<C: ConnectionTrait>(
        conn: &C,
        product_id: i64,
    ) -> Result<Option<category::Model>, ServiceError> {
        let product = ProductEntity::find_by_id(product_id)
            .one(conn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product {} not found", product_id))
            })?;

        let Some(category_id) = product.category_id else {
            return Ok(None);
        };

        let cat = CategoryEntity::find_by_id(category_id).one(conn).await?;
        Ok(cat.filter(|c| c.serial_numbering_enabled))
    }
}
