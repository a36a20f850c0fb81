//! SeaORM entity definitions for the ERP schema.

pub mod category;
pub mod client;
pub mod client_contact;
pub mod company;
pub mod inventory_level;
pub mod invoice;
pub mod manufacturing_order;
pub mod manufacturing_step;
pub mod numbering_settings;
pub mod order;
pub mod order_item;
pub mod product;
pub mod production_task;
pub mod recipe;
pub mod serial_number;
pub mod shipment;
pub mod shipment_item;
pub mod warehouse;
