//! Forgeline API Library
//!
//! ERP backend core: customer orders and payments, manufacturing order
//! lifecycle, serial numbering, inventory, CRM sync and shipments.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod domain;
pub mod entities;
pub mod errors;
pub mod events;
pub mod logging;
pub mod migrator;
pub mod services;

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use events::EventSender;

/// All services wired over one connection pool and one event channel.
#[derive(Clone)]
pub struct AppServices {
    pub orders: services::OrderService,
    pub manufacturing: services::ManufacturingService,
    pub serial_numbers: services::SerialNumberService,
    pub inventory: services::InventoryService,
    pub products: services::ProductService,
    pub clients: services::ClientService,
    pub sync: services::SyncService,
    pub shipments: services::ShipmentService,
}

impl AppServices {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Option<EventSender>) -> Self {
        Self {
            orders: services::OrderService::new(db.clone(), event_sender.clone()),
            manufacturing: services::ManufacturingService::new(db.clone(), event_sender.clone()),
            serial_numbers: services::SerialNumberService::new(db.clone()),
            inventory: services::InventoryService::new(db.clone(), event_sender.clone()),
            products: services::ProductService::new(db.clone()),
            clients: services::ClientService::new(db.clone()),
            sync: services::SyncService::new(db.clone(), event_sender.clone()),
            shipments: services::ShipmentService::new(db, event_sender),
        }
    }
}

/// Application state shared by whatever surface sits on top (HTTP layer,
/// background jobs, CLI tools).
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub services: AppServices,
}

impl AppState {
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        event_sender: Option<EventSender>,
    ) -> Self {
        let services = AppServices::new(db.clone(), event_sender);
        Self {
            db,
            config,
            services,
        }
    }
}
