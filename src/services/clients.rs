use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;
use validator::Validate;

use crate::{
    entities::{
        client::{self, Entity as ClientEntity},
        client_contact::{self, Entity as ClientContactEntity},
        company::{self, Entity as CompanyEntity},
    },
    errors::ServiceError,
};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateClientRequest {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateClientPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateContactRequest {
    pub client_id: i64,
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub position: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateContactPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub position: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCompanyRequest {
    #[validate(length(min = 1))]
    pub name: String,
    pub tax_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCompanyPatch {
    pub name: Option<String>,
    pub tax_id: Option<String>,
}

/// CRM records: clients, their contacts and companies.
#[derive(Clone)]
pub struct ClientService {
    db: Arc<DatabaseConnection>,
}

impl ClientService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_client(
        &self,
        request: CreateClientRequest,
    ) -> Result<client::Model, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        if let Some(company_id) = request.company_id {
            CompanyEntity::find_by_id(company_id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Company {} not found", company_id))
                })?;
        }

        let created = client::ActiveModel {
            name: Set(request.name),
            email: Set(request.email),
            phone: Set(request.phone),
            company_id: Set(request.company_id),
            external_id: Set(None),
            source: Set(None),
            created_at: Set(Utc::now()),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_client(&self, id: i64) -> Result<client::Model, ServiceError> {
        ClientEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Client {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn list_clients(&self) -> Result<Vec<client::Model>, ServiceError> {
        Ok(ClientEntity::find()
            .order_by_asc(client::Column::Name)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self, patch))]
    pub async fn update_client(
        &self,
        id: i64,
        patch: UpdateClientPatch,
    ) -> Result<client::Model, ServiceError> {
        let existing = self.get_client(id).await?;
        let mut active: client::ActiveModel = existing.into();

        if let Some(name) = patch.name {
            active.name = Set(name);
        }
        if let Some(email) = patch.email {
            active.email = Set(Some(email));
        }
        if let Some(phone) = patch.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(company_id) = patch.company_id {
            active.company_id = Set(Some(company_id));
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(&*self.db).await?)
    }

    /// Deletes a client and its contacts. Returns false when the id does
    /// not exist.
    #[instrument(skip(self))]
    pub async fn delete_client(&self, id: i64) -> Result<bool, ServiceError> {
        let txn = self.db.begin().await?;

        let existing = ClientEntity::find_by_id(id).one(&txn).await?;
        if existing.is_none() {
            return Ok(false);
        }

        ClientContactEntity::delete_many()
            .filter(client_contact::Column::ClientId.eq(id))
            .exec(&txn)
            .await?;
        ClientEntity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        Ok(true)
    }

    #[instrument(skip(self, request))]
    pub async fn create_contact(
        &self,
        request: CreateContactRequest,
    ) -> Result<client_contact::Model, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        self.get_client(request.client_id).await?;

        let created = client_contact::ActiveModel {
            client_id: Set(request.client_id),
            name: Set(request.name),
            email: Set(request.email),
            phone: Set(request.phone),
            position: Set(request.position),
            external_id: Set(None),
            source: Set(None),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn list_contacts(
        &self,
        client_id: i64,
    ) -> Result<Vec<client_contact::Model>, ServiceError> {
        Ok(ClientContactEntity::find()
            .filter(client_contact::Column::ClientId.eq(client_id))
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self, patch))]
    pub async fn update_contact(
        &self,
        id: i64,
        patch: UpdateContactPatch,
    ) -> Result<client_contact::Model, ServiceError> {
        let existing = ClientContactEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Contact {} not found", id)))?;

        let mut active: client_contact::ActiveModel = existing.into();
        if let Some(name) = patch.name {
            active.name = Set(name);
        }
        if let Some(email) = patch.email {
            active.email = Set(Some(email));
        }
        if let Some(phone) = patch.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(position) = patch.position {
            active.position = Set(Some(position));
        }

        Ok(active.update(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_contact(&self, id: i64) -> Result<bool, ServiceError> {
        let result = ClientContactEntity::delete_by_id(id).exec(&*self.db).await?;
        Ok(result.rows_affected > 0)
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_company(
        &self,
        request: CreateCompanyRequest,
    ) -> Result<company::Model, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let created = company::ActiveModel {
            name: Set(request.name),
            tax_id: Set(request.tax_id),
            external_id: Set(None),
            source: Set(None),
            created_at: Set(Utc::now()),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_company(&self, id: i64) -> Result<company::Model, ServiceError> {
        CompanyEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Company {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn list_companies(&self) -> Result<Vec<company::Model>, ServiceError> {
        Ok(CompanyEntity::find()
            .order_by_asc(company::Column::Name)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self, patch))]
    pub async fn update_company(
        &self,
        id: i64,
        patch: UpdateCompanyPatch,
    ) -> Result<company::Model, ServiceError> {
        let existing = self.get_company(id).await?;
        let mut active: company::ActiveModel = existing.into();

        if let Some(name) = patch.name {
            active.name = Set(name);
        }
        if let Some(tax_id) = patch.tax_id {
            active.tax_id = Set(Some(tax_id));
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_company(&self, id: i64) -> Result<bool, ServiceError> {
        let result = CompanyEntity::delete_by_id(id).exec(&*self.db).await?;
        Ok(result.rows_affected > 0)
    }
}
