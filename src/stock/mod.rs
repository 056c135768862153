//! The quantity store: race-free read and decrement access to stock records.
//!
//! Every mutation of a stock quantity in this crate goes through
//! [`StockStore::try_decrement`] or [`StockStore::increment`]. No caller may
//! read a quantity and later write a value computed from that stale read;
//! the check-and-write is a single indivisible step owned by the store, so
//! two concurrent requests can never both take the last unit of an item.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::StockKey;

mod database;
mod memory;

pub use database::DatabaseStockStore;
pub use memory::InMemoryStockStore;

/// Snapshot of one stock record: the on-hand count plus the display name
/// carried for reporting and error messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockOnHand {
    pub quantity: i64,
    pub item_name: String,
}

/// Store-level errors.
#[derive(Debug, Error)]
pub enum StockError {
    /// The record holds fewer units than requested. Expected in normal
    /// operation; the record is left untouched.
    #[error("not enough stock for {key}: requested {requested}, available {available}")]
    Insufficient {
        key: StockKey,
        requested: i64,
        available: i64,
    },

    /// No record exists for the (category, location, item) triple.
    #[error("no stock record for {key}")]
    NotFound { key: StockKey },

    #[error("storage error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl StockError {
    /// Requested minus available, for shortage reporting. Not authoritative
    /// for retry logic; stock may have changed by the time it is read.
    pub fn shortfall(&self) -> Option<i64> {
        match self {
            StockError::Insufficient {
                requested,
                available,
                ..
            } => Some(requested - available),
            _ => None,
        }
    }
}

/// Atomic per-record access to stock quantities.
///
/// `try_decrement` must be serializable with every other concurrent
/// operation on the same record: it verifies `quantity >= amount` and writes
/// the new value in one indivisible step keyed by that precondition, never
/// by a previously read value. Operations on different records do not block
/// each other.
#[async_trait]
pub trait StockStore: Send + Sync {
    /// Current quantity and display name for a record. Pure read.
    async fn get_available(&self, key: &StockKey) -> Result<StockOnHand, StockError>;

    /// Conditionally subtracts `amount` from the record's quantity.
    ///
    /// `amount <= 0` is a no-op that trivially succeeds. On
    /// [`StockError::Insufficient`] the record is left completely
    /// unmodified.
    async fn try_decrement(&self, key: &StockKey, amount: i64) -> Result<(), StockError>;

    /// Adds `amount` back to the record's quantity; the exact inverse of
    /// `try_decrement`. `amount <= 0` is a no-op. Fails only if the record
    /// does not exist.
    async fn increment(&self, key: &StockKey, amount: i64) -> Result<(), StockError>;
}
