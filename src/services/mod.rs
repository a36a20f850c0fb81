// Order management and payment/approval flow
pub mod orders;

// Production: manufacturing orders, steps, serial numbering
pub mod manufacturing;
pub mod serial_numbers;

// Stock
pub mod inventory;

// Catalog: products, categories, recipes
pub mod products;

// CRM
pub mod clients;
pub mod sync;

// Fulfillment
pub mod shipments;

pub use clients::ClientService;
pub use inventory::InventoryService;
pub use manufacturing::ManufacturingService;
pub use orders::OrderService;
pub use products::ProductService;
pub use serial_numbers::SerialNumberService;
pub use shipments::ShipmentService;
pub use sync::SyncService;
