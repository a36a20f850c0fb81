//! Domain types shared across entities and services.
//!
//! Status values that the storage layer used to pass around as free-text
//! strings live here as real enums, so every transition is checked at the
//! type level instead of by string comparison scattered across handlers.

pub mod serial;
pub mod status;

pub use status::{
    ManufacturingOrderStatus, PaymentType, ProductionTaskStatus, SerialNumberStatus, StepStatus,
};
