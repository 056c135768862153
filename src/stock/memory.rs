use async_trait::async_trait;
use dashmap::DashMap;

use crate::models::StockKey;

use super::{StockError, StockOnHand, StockStore};

#[derive(Debug, Clone)]
struct StockRecord {
    quantity: i64,
    item_name: String,
}

/// In-memory stock store backed by a sharded concurrent map.
///
/// `get_mut` holds the shard's write guard across the compare-and-write, so
/// all access to one record is serialized: a decrement can never act on a
/// stale quantity, even when many tasks race for the same item.
#[derive(Debug, Default)]
pub struct InMemoryStockStore {
    records: DashMap<StockKey, StockRecord>,
}

impl InMemoryStockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds or replaces a record. This is the entry point for inventory
    /// receiving, which is outside the fulfillment path; fulfillment itself
    /// never creates records.
    pub fn insert_record(&self, key: StockKey, item_name: impl Into<String>, quantity: i64) {
        self.records.insert(
            key,
            StockRecord {
                quantity,
                item_name: item_name.into(),
            },
        );
    }
}

#[async_trait]
impl StockStore for InMemoryStockStore {
    async fn get_available(&self, key: &StockKey) -> Result<StockOnHand, StockError> {
        self.records
            .get(key)
            .map(|record| StockOnHand {
                quantity: record.quantity,
                item_name: record.item_name.clone(),
            })
            .ok_or_else(|| StockError::NotFound { key: key.clone() })
    }

    async fn try_decrement(&self, key: &StockKey, amount: i64) -> Result<(), StockError> {
        if amount <= 0 {
            return Ok(());
        }

        let mut record = self
            .records
            .get_mut(key)
            .ok_or_else(|| StockError::NotFound { key: key.clone() })?;

        if record.quantity < amount {
            return Err(StockError::Insufficient {
                key: key.clone(),
                requested: amount,
                available: record.quantity,
            });
        }

        record.quantity -= amount;
        Ok(())
    }

    async fn increment(&self, key: &StockKey, amount: i64) -> Result<(), StockError> {
        if amount <= 0 {
            return Ok(());
        }

        let mut record = self
            .records
            .get_mut(key)
            .ok_or_else(|| StockError::NotFound { key: key.clone() })?;

        record.quantity += amount;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ItemCategory;

    #[tokio::test]
    async fn decrement_and_increment_round_trip() {
        let store = InMemoryStockStore::new();
        let key = StockKey::main(ItemCategory::Medicine, "AMX-500");
        store.insert_record(key.clone(), "Amoxicillin 500mg", 10);

        store.try_decrement(&key, 4).await.unwrap();
        assert_eq!(store.get_available(&key).await.unwrap().quantity, 6);

        store.increment(&key, 4).await.unwrap();
        assert_eq!(store.get_available(&key).await.unwrap().quantity, 10);
    }

    #[tokio::test]
    async fn insufficient_leaves_record_untouched() {
        let store = InMemoryStockStore::new();
        let key = StockKey::main(ItemCategory::MedicalDevice, "THERM-01");
        store.insert_record(key.clone(), "Digital thermometer", 3);

        let err = store.try_decrement(&key, 5).await.unwrap_err();
        assert_eq!(err.shortfall(), Some(2));
        assert_eq!(store.get_available(&key).await.unwrap().quantity, 3);
    }

    #[tokio::test]
    async fn non_positive_amount_is_a_no_op() {
        let store = InMemoryStockStore::new();
        let key = StockKey::main(ItemCategory::Medicine, "IBU-200");
        store.insert_record(key.clone(), "Ibuprofen 200mg", 5);

        store.try_decrement(&key, 0).await.unwrap();
        store.try_decrement(&key, -3).await.unwrap();
        store.increment(&key, 0).await.unwrap();
        assert_eq!(store.get_available(&key).await.unwrap().quantity, 5);
    }
}
