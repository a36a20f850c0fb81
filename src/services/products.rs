use chrono::Utc;
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;
use validator::Validate;

use crate::{
    entities::{
        category::{self, Entity as CategoryEntity},
        product::{self, Entity as ProductEntity},
        recipe::{self, Entity as RecipeEntity},
    },
    errors::ServiceError,
};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1))]
    pub sku: String,
    #[validate(length(min = 1))]
    pub name: String,
    pub category_id: Option<i64>,
    pub price: Decimal,
    #[serde(default)]
    pub is_manufactured: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProductPatch {
    pub name: Option<String>,
    pub category_id: Option<i64>,
    pub price: Option<Decimal>,
    pub is_manufactured: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(default)]
    pub serial_numbering_enabled: bool,
    pub serial_template: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCategoryPatch {
    pub name: Option<String>,
    pub serial_numbering_enabled: Option<bool>,
    pub serial_template: Option<String>,
    pub serial_counter: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateRecipeRequest {
    pub product_id: i64,
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(range(min = 1))]
    pub output_quantity: i32,
}

/// Catalog: products, categories and production recipes.
#[derive(Clone)]
pub struct ProductService {
    db: Arc<DatabaseConnection>,
}

impl ProductService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(sku = %request.sku))]
    pub async fn create_product(
        &self,
        request: CreateProductRequest,
    ) -> Result<product::Model, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let existing = ProductEntity::find()
            .filter(product::Column::Sku.eq(request.sku.clone()))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::InvalidInput(format!(
                "SKU {} already exists",
                request.sku
            )));
        }

        if let Some(category_id) = request.category_id {
            CategoryEntity::find_by_id(category_id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Category {} not found", category_id))
                })?;
        }

        let created = product::ActiveModel {
            sku: Set(request.sku),
            name: Set(request.name),
            category_id: Set(request.category_id),
            price: Set(request.price),
            is_manufactured: Set(request.is_manufactured),
            created_at: Set(Utc::now()),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        counter!("catalog.products.created", 1);
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, id: i64) -> Result<product::Model, ServiceError> {
        ProductEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        category_id: Option<i64>,
    ) -> Result<Vec<product::Model>, ServiceError> {
        let mut query = ProductEntity::find().order_by_asc(product::Column::Sku);
        if let Some(category_id) = category_id {
            query = query.filter(product::Column::CategoryId.eq(category_id));
        }
        Ok(query.all(&*self.db).await?)
    }

    #[instrument(skip(self, patch))]
    pub async fn update_product(
        &self,
        id: i64,
        patch: UpdateProductPatch,
    ) -> Result<product::Model, ServiceError> {
        let existing = self.get_product(id).await?;
        let mut active: product::ActiveModel = existing.into();

        if let Some(name) = patch.name {
            active.name = Set(name);
        }
        if let Some(category_id) = patch.category_id {
            active.category_id = Set(Some(category_id));
        }
        if let Some(price) = patch.price {
            active.price = Set(price);
        }
        if let Some(is_manufactured) = patch.is_manufactured {
            active.is_manufactured = Set(is_manufactured);
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: i64) -> Result<bool, ServiceError> {
        let result = ProductEntity::delete_by_id(id).exec(&*self.db).await?;
        Ok(result.rows_affected > 0)
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_category(
        &self,
        request: CreateCategoryRequest,
    ) -> Result<category::Model, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        if request.serial_numbering_enabled && request.serial_template.is_none() {
            return Err(ServiceError::InvalidInput(
                "Serial numbering requires a template".to_string(),
            ));
        }

        let created = category::ActiveModel {
            name: Set(request.name),
            serial_numbering_enabled: Set(request.serial_numbering_enabled),
            serial_template: Set(request.serial_template),
            serial_counter: Set(1),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_category(&self, id: i64) -> Result<category::Model, ServiceError> {
        CategoryEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Category {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<category::Model>, ServiceError> {
        Ok(CategoryEntity::find()
            .order_by_asc(category::Column::Name)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self, patch))]
    pub async fn update_category(
        &self,
        id: i64,
        patch: UpdateCategoryPatch,
    ) -> Result<category::Model, ServiceError> {
        let existing = self.get_category(id).await?;
        let mut active: category::ActiveModel = existing.into();

        if let Some(name) = patch.name {
            active.name = Set(name);
        }
        if let Some(enabled) = patch.serial_numbering_enabled {
            active.serial_numbering_enabled = Set(enabled);
        }
        if let Some(template) = patch.serial_template {
            active.serial_template = Set(Some(template));
        }
        if let Some(counter_value) = patch.serial_counter {
            if counter_value < 1 {
                return Err(ServiceError::InvalidInput(format!(
                    "Serial counter must be positive, got: {}",
                    counter_value
                )));
            }
            active.serial_counter = Set(counter_value);
        }

        Ok(active.update(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_category(&self, id: i64) -> Result<bool, ServiceError> {
        let result = CategoryEntity::delete_by_id(id).exec(&*self.db).await?;
        Ok(result.rows_affected > 0)
    }

    #[instrument(skip(self, request))]
    pub async fn create_recipe(
        &self,
        request: CreateRecipeRequest,
    ) -> Result<recipe::Model, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        self.get_product(request.product_id).await?;

        let created = recipe::ActiveModel {
            product_id: Set(request.product_id),
            name: Set(request.name),
            output_quantity: Set(request.output_quantity),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        counter!("catalog.recipes.created", 1);
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn list_recipes_for_product(
        &self,
        product_id: i64,
    ) -> Result<Vec<recipe::Model>, ServiceError> {
        Ok(RecipeEntity::find()
            .filter(recipe::Column::ProductId.eq(product_id))
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_recipe(&self, id: i64) -> Result<bool, ServiceError> {
        let result = RecipeEntity::delete_by_id(id).exec(&*self.db).await?;
        Ok(result.rows_affected > 0)
    }
}
