use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One stock record: the on-hand count of an item of one category at one
/// location. `branch_id` is NULL for main-warehouse stock, so a
/// main-warehouse lookup must filter on `branch_id IS NULL` rather than
/// matching any row sharing the `item_id`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_levels")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub category: String,
    pub item_id: String,
    pub branch_id: Option<String>,
    pub item_name: String,
    pub quantity: i64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
