use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Single-row table holding the global cross-numbering policy. The
/// migration seeds the row with cross-numbering disabled.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "numbering_settings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub cross_numbering_enabled: bool,
    pub global_template: String,
    pub global_counter: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
