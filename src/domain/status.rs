use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::Display;

/// How an order was paid. `None` is the reset state after a cancelled
/// payment, not a real payment.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentType {
    #[sea_orm(string_value = "full")]
    Full,
    #[sea_orm(string_value = "partial")]
    Partial,
    #[sea_orm(string_value = "contract")]
    Contract,
    #[sea_orm(string_value = "none")]
    None,
}

impl PaymentType {
    /// Full and contract payments approve production unconditionally.
    pub fn approves_production(self) -> bool {
        matches!(self, PaymentType::Full | PaymentType::Contract)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ManufacturingOrderStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
    #[sea_orm(string_value = "paused")]
    Paused,
}

impl ManufacturingOrderStatus {
    /// Legal lifecycle edges. Completed and cancelled are terminal.
    pub fn can_transition_to(self, next: ManufacturingOrderStatus) -> bool {
        use ManufacturingOrderStatus::*;
        matches!(
            (self, next),
            (Pending, InProgress)
                | (Pending, Cancelled)
                | (InProgress, Completed)
                | (InProgress, Paused)
                | (InProgress, Cancelled)
                | (Paused, InProgress)
                | (Paused, Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ManufacturingOrderStatus::Completed | ManufacturingOrderStatus::Cancelled
        )
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StepStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "skipped")]
    Skipped,
}

impl StepStatus {
    /// Steps only move forward: picked up, finished or skipped, never
    /// reopened. Completing straight from pending is allowed because workers
    /// often log a step only after the fact.
    pub fn can_transition_to(self, next: StepStatus) -> bool {
        use StepStatus::*;
        matches!(
            (self, next),
            (Pending, InProgress)
                | (Pending, Completed)
                | (Pending, Skipped)
                | (InProgress, Completed)
                | (InProgress, Skipped)
        )
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProductionTaskStatus {
    #[sea_orm(string_value = "planned")]
    Planned,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "completed")]
    Completed,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SerialNumberStatus {
    #[sea_orm(string_value = "available")]
    Available,
    #[sea_orm(string_value = "reserved")]
    Reserved,
    #[sea_orm(string_value = "sold")]
    Sold,
    #[sea_orm(string_value = "defective")]
    Defective,
}
