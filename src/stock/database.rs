use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter};
use tracing::debug;

use crate::entities::stock_level::{self, Entity as StockLevel};
use crate::models::StockKey;

use super::{StockError, StockOnHand, StockStore};

/// Durable stock store over a relational backend.
///
/// The decrement is a single conditional `UPDATE ... SET quantity =
/// quantity - ? WHERE ... AND quantity >= ?`; the row-level write lock makes
/// the check and the write one indivisible step, so concurrent decrements on
/// the same record serialize at the database and none can act on a stale
/// quantity. `rows_affected == 0` means the precondition failed.
#[derive(Clone)]
pub struct DatabaseStockStore {
    db: Arc<DatabaseConnection>,
}

impl DatabaseStockStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    fn key_condition(key: &StockKey) -> Condition {
        let condition = Condition::all()
            .add(stock_level::Column::Category.eq(key.category.as_ref()))
            .add(stock_level::Column::ItemId.eq(key.item_id.as_str()));
        match &key.branch_id {
            Some(branch) => condition.add(stock_level::Column::BranchId.eq(branch.as_str())),
            None => condition.add(stock_level::Column::BranchId.is_null()),
        }
    }
}

#[async_trait]
impl StockStore for DatabaseStockStore {
    async fn get_available(&self, key: &StockKey) -> Result<StockOnHand, StockError> {
        let record = StockLevel::find()
            .filter(Self::key_condition(key))
            .one(&*self.db)
            .await?
            .ok_or_else(|| StockError::NotFound { key: key.clone() })?;

        Ok(StockOnHand {
            quantity: record.quantity,
            item_name: record.item_name,
        })
    }

    async fn try_decrement(&self, key: &StockKey, amount: i64) -> Result<(), StockError> {
        if amount <= 0 {
            return Ok(());
        }

        let result = StockLevel::update_many()
            .col_expr(
                stock_level::Column::Quantity,
                Expr::col(stock_level::Column::Quantity).sub(amount),
            )
            .col_expr(stock_level::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(Self::key_condition(key))
            .filter(stock_level::Column::Quantity.gte(amount))
            .exec(&*self.db)
            .await?;

        if result.rows_affected == 0 {
            // The conditional update rejected: either the row is missing or
            // it holds too little. A follow-up read tells the two apart.
            let on_hand = self.get_available(key).await?;
            debug!(%key, amount, available = on_hand.quantity, "conditional decrement rejected");
            return Err(StockError::Insufficient {
                key: key.clone(),
                requested: amount,
                available: on_hand.quantity,
            });
        }

        Ok(())
    }

    async fn increment(&self, key: &StockKey, amount: i64) -> Result<(), StockError> {
        if amount <= 0 {
            return Ok(());
        }

        let result = StockLevel::update_many()
            .col_expr(
                stock_level::Column::Quantity,
                Expr::col(stock_level::Column::Quantity).add(amount),
            )
            .col_expr(stock_level::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(Self::key_condition(key))
            .exec(&*self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(StockError::NotFound { key: key.clone() });
        }

        Ok(())
    }
}
