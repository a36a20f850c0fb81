use chrono::{NaiveDate, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::{
    entities::{
        client::{self, Entity as ClientEntity},
        client_contact::{self, Entity as ClientContactEntity},
        company::{self, Entity as CompanyEntity},
        invoice::{self, Entity as InvoiceEntity},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

#[derive(Debug, Clone, Deserialize)]
pub struct ClientRecord {
    pub external_id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company_external_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContactRecord {
    pub external_id: String,
    pub client_external_id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub position: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompanyRecord {
    pub external_id: String,
    pub name: String,
    pub tax_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceRecord {
    pub external_id: String,
    pub number: String,
    pub client_external_id: String,
    pub amount: Decimal,
    pub status: String,
    pub issued_at: Option<NaiveDate>,
}

/// One push from an external CRM. Records are keyed by
/// (`source`, `external_id`), which makes replays idempotent.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SyncBatch {
    #[validate(length(min = 1))]
    pub source: String,
    #[serde(default)]
    pub companies: Vec<CompanyRecord>,
    #[serde(default)]
    pub clients: Vec<ClientRecord>,
    #[serde(default)]
    pub contacts: Vec<ContactRecord>,
    #[serde(default)]
    pub invoices: Vec<InvoiceRecord>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncCounts {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub companies: SyncCounts,
    pub clients: SyncCounts,
    pub contacts: SyncCounts,
    pub invoices: SyncCounts,
}

impl SyncReport {
    pub fn total_created(&self) -> usize {
        self.companies.created + self.clients.created + self.contacts.created
            + self.invoices.created
    }

    pub fn total_updated(&self) -> usize {
        self.companies.updated + self.clients.updated + self.contacts.updated
            + self.invoices.updated
    }
}

/// Idempotent CRM batch upsert. Companies land first so client records can
/// reference them, then clients, contacts, invoices.
#[derive(Clone)]
pub struct SyncService {
    db: Arc<DatabaseConnection>,
    event_sender: Option<EventSender>,
}

impl SyncService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Option<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, batch), fields(source = %batch.source))]
    pub async fn sync_batch(&self, batch: SyncBatch) -> Result<SyncReport, ServiceError> {
        batch
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let txn = self.db.begin().await?;
        let mut report = SyncReport::default();

        for record in &batch.companies {
            match Self::upsert_company(&txn, &batch.source, record).await? {
                true => report.companies.created += 1,
                false => report.companies.updated += 1,
            }
        }
        for record in &batch.clients {
            match Self::upsert_client(&txn, &batch.source, record).await? {
                Some(true) => report.clients.created += 1,
                Some(false) => report.clients.updated += 1,
                None => report.clients.skipped += 1,
            }
        }
        for record in &batch.contacts {
            match Self::upsert_contact(&txn, &batch.source, record).await? {
                Some(true) => report.contacts.created += 1,
                Some(false) => report.contacts.updated += 1,
                None => report.contacts.skipped += 1,
            }
        }
        for record in &batch.invoices {
            match Self::upsert_invoice(&txn, &batch.source, record).await? {
                Some(true) => report.invoices.created += 1,
                Some(false) => report.invoices.updated += 1,
                None => report.invoices.skipped += 1,
            }
        }

        txn.commit().await?;

        counter!("sync.batches.processed", 1);
        counter!("sync.records.created", report.total_created() as u64);
        counter!("sync.records.updated", report.total_updated() as u64);
        info!(
            source = %batch.source,
            created = report.total_created(),
            updated = report.total_updated(),
            "sync batch processed"
        );

        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::SyncBatchProcessed {
                    source: batch.source.clone(),
                    created: report.total_created(),
                    updated: report.total_updated(),
                })
                .await;
        }

        Ok(report)
    }

    /// Returns true when a row was created, false when updated.
    async fn upsert_company<C: ConnectionTrait>(
        conn: &C,
        source: &str,
        record: &CompanyRecord,
    ) -> Result<bool, ServiceError> {
        let existing = CompanyEntity::find()
            .filter(company::Column::Source.eq(source))
            .filter(company::Column::ExternalId.eq(record.external_id.clone()))
            .one(conn)
            .await?;

        match existing {
            Some(row) => {
                let mut active: company::ActiveModel = row.into();
                active.name = Set(record.name.clone());
                active.tax_id = Set(record.tax_id.clone());
                active.updated_at = Set(Utc::now());
                active.update(conn).await?;
                Ok(false)
            }
            None => {
                company::ActiveModel {
                    name: Set(record.name.clone()),
                    tax_id: Set(record.tax_id.clone()),
                    external_id: Set(Some(record.external_id.clone())),
                    source: Set(Some(source.to_string())),
                    created_at: Set(Utc::now()),
                    updated_at: Set(Utc::now()),
                    ..Default::default()
                }
                .insert(conn)
                .await?;
                Ok(true)
            }
        }
    }

    async fn upsert_client<C: ConnectionTrait>(
        conn: &C,
        source: &str,
        record: &ClientRecord,
    ) -> Result<Option<bool>, ServiceError> {
        let company_id = match &record.company_external_id {
            Some(company_ext) => {
                let company = CompanyEntity::find()
                    .filter(company::Column::Source.eq(source))
                    .filter(company::Column::ExternalId.eq(company_ext.clone()))
                    .one(conn)
                    .await?;
                match company {
                    Some(c) => Some(c.id),
                    None => {
                        warn!(
                            source,
                            external_id = %record.external_id,
                            company_external_id = %company_ext,
                            "client references unknown company, skipping"
                        );
                        return Ok(None);
                    }
                }
            }
            None => None,
        };

        let existing = ClientEntity::find()
            .filter(client::Column::Source.eq(source))
            .filter(client::Column::ExternalId.eq(record.external_id.clone()))
            .one(conn)
            .await?;

        match existing {
            Some(row) => {
                let mut active: client::ActiveModel = row.into();
                active.name = Set(record.name.clone());
                active.email = Set(record.email.clone());
                active.phone = Set(record.phone.clone());
                active.company_id = Set(company_id);
                active.updated_at = Set(Utc::now());
                active.update(conn).await?;
                Ok(Some(false))
            }
            None => {
                client::ActiveModel {
                    name: Set(record.name.clone()),
                    email: Set(record.email.clone()),
                    phone: Set(record.phone.clone()),
                    company_id: Set(company_id),
                    external_id: Set(Some(record.external_id.clone())),
                    source: Set(Some(source.to_string())),
                    created_at: Set(Utc::now()),
                    updated_at: Set(Utc::now()),
                    ..Default::default()
                }
                .insert(conn)
                .await?;
                Ok(Some(true))
            }
        }
    }

    async fn upsert_contact<C: ConnectionTrait>(
        conn: &C,
        source: &str,
        record: &ContactRecord,
    ) -> Result<Option<bool>, ServiceError> {
        let parent = ClientEntity::find()
            .filter(client::Column::Source.eq(source))
            .filter(client::Column::ExternalId.eq(record.client_external_id.clone()))
            .one(conn)
            .await?;
        let Some(parent) = parent else {
            warn!(
                source,
                external_id = %record.external_id,
                client_external_id = %record.client_external_id,
                "contact references unknown client, skipping"
            );
            return Ok(None);
        };

        let existing = ClientContactEntity::find()
            .filter(client_contact::Column::Source.eq(source))
            .filter(client_contact::Column::ExternalId.eq(record.external_id.clone()))
            .one(conn)
            .await?;

        match existing {
            Some(row) => {
                let mut active: client_contact::ActiveModel = row.into();
                active.client_id = Set(parent.id);
                active.name = Set(record.name.clone());
                active.email = Set(record.email.clone());
                active.phone = Set(record.phone.clone());
                active.position = Set(record.position.clone());
                active.update(conn).await?;
                Ok(Some(false))
            }
            None => {
                client_contact::ActiveModel {
                    client_id: Set(parent.id),
                    name: Set(record.name.clone()),
                    email: Set(record.email.clone()),
                    phone: Set(record.phone.clone()),
                    position: Set(record.position.clone()),
                    external_id: Set(Some(record.external_id.clone())),
                    source: Set(Some(source.to_string())),
                    ..Default::default()
                }
                .insert(conn)
                .await?;
                Ok(Some(true))
            }
        }
    }

    async fn upsert_invoice<C: ConnectionTrait>(
        conn: &C,
        source: &str,
        record: &InvoiceRecord,
    ) -> Result<Option<bool>, ServiceError> {
        let parent = ClientEntity::find()
            .filter(client::Column::Source.eq(source))
            .filter(client::Column::ExternalId.eq(record.client_external_id.clone()))
            .one(conn)
            .await?;
        let Some(parent) = parent else {
            warn!(
                source,
                external_id = %record.external_id,
                client_external_id = %record.client_external_id,
                "invoice references unknown client, skipping"
            );
            return Ok(None);
        };

        let existing = InvoiceEntity::find()
            .filter(invoice::Column::Source.eq(source))
            .filter(invoice::Column::ExternalId.eq(record.external_id.clone()))
            .one(conn)
            .await?;

        match existing {
            Some(row) => {
                let mut active: invoice::ActiveModel = row.into();
                active.number = Set(record.number.clone());
                active.client_id = Set(parent.id);
                active.amount = Set(record.amount);
                active.status = Set(record.status.clone());
                active.issued_at = Set(record.issued_at);
                active.updated_at = Set(Utc::now());
                active.update(conn).await?;
                Ok(Some(false))
            }
            None => {
                invoice::ActiveModel {
                    number: Set(record.number.clone()),
                    client_id: Set(parent.id),
                    order_id: Set(None),
                    amount: Set(record.amount),
                    status: Set(record.status.clone()),
                    issued_at: Set(record.issued_at),
                    external_id: Set(Some(record.external_id.clone())),
                    source: Set(Some(source.to_string())),
                    created_at: Set(Utc::now()),
                    updated_at: Set(Utc::now()),
                    ..Default::default()
                }
                .insert(conn)
                .await?;
                Ok(Some(true))
            }
        }
    }
}
