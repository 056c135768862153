use std::sync::Arc;

use medstock_core::{InMemoryStockStore, ItemCategory, StockKey, StockStore};

#[tokio::test]
async fn concurrent_unit_decrements_never_oversell() {
    let store = Arc::new(InMemoryStockStore::new());
    let key = StockKey::main(ItemCategory::Medicine, "AMX-500");
    store.insert_record(key.clone(), "Amoxicillin 500mg", 10);

    // 20 concurrent takers of 1 unit each against 10 on hand: exactly 10
    // may succeed.
    let mut tasks = vec![];
    for _ in 0..20 {
        let store = Arc::clone(&store);
        let key = key.clone();
        tasks.push(tokio::spawn(async move {
            store.try_decrement(&key, 1).await.is_ok()
        }));
    }

    let mut success = 0;
    for task in tasks {
        if task.await.unwrap() {
            success += 1;
        }
    }

    assert_eq!(
        success, 10,
        "exactly 10 decrements should succeed; got {}",
        success
    );
    assert_eq!(store.get_available(&key).await.unwrap().quantity, 0);
}

#[tokio::test]
async fn two_takers_of_the_last_units_produce_one_winner() {
    let store = Arc::new(InMemoryStockStore::new());
    let key = StockKey::main(ItemCategory::MedicalDevice, "VENT-01");
    store.insert_record(key.clone(), "Portable ventilator", 5);

    // Both tasks request the full quantity; the conditional write lets only
    // one of them through.
    let a = {
        let store = Arc::clone(&store);
        let key = key.clone();
        tokio::spawn(async move { store.try_decrement(&key, 5).await.is_ok() })
    };
    let b = {
        let store = Arc::clone(&store);
        let key = key.clone();
        tokio::spawn(async move { store.try_decrement(&key, 5).await.is_ok() })
    };

    let (a, b) = (a.await.unwrap(), b.await.unwrap());
    assert!(a ^ b, "exactly one of the two concurrent takers must win");
    assert_eq!(store.get_available(&key).await.unwrap().quantity, 0);
}

#[tokio::test]
async fn final_quantity_accounts_for_every_successful_decrement() {
    let store = Arc::new(InMemoryStockStore::new());
    let key = StockKey::main(ItemCategory::Medicine, "IBU-200");
    let initial = 100;
    store.insert_record(key.clone(), "Ibuprofen 200mg", initial);

    // Mixed request sizes racing against each other; the amounts that got
    // through must account exactly for what is left.
    let mut tasks = vec![];
    for amount in [1i64, 2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31] {
        for _ in 0..3 {
            let store = Arc::clone(&store);
            let key = key.clone();
            tasks.push(tokio::spawn(async move {
                if store.try_decrement(&key, amount).await.is_ok() {
                    amount
                } else {
                    0
                }
            }));
        }
    }

    let mut taken = 0;
    for task in tasks {
        taken += task.await.unwrap();
    }

    let remaining = store.get_available(&key).await.unwrap().quantity;
    assert_eq!(remaining, initial - taken);
    assert!(remaining >= 0);
}

#[tokio::test]
async fn decrements_on_different_records_proceed_independently() {
    let store = Arc::new(InMemoryStockStore::new());
    for i in 0..8 {
        store.insert_record(
            StockKey::main(ItemCategory::Medicine, format!("ITEM-{}", i)),
            format!("Item {}", i),
            50,
        );
    }

    let mut tasks = vec![];
    for i in 0..8 {
        let store = Arc::clone(&store);
        tasks.push(tokio::spawn(async move {
            let key = StockKey::main(ItemCategory::Medicine, format!("ITEM-{}", i));
            for _ in 0..50 {
                store.try_decrement(&key, 1).await.unwrap();
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    for i in 0..8 {
        let key = StockKey::main(ItemCategory::Medicine, format!("ITEM-{}", i));
        assert_eq!(store.get_available(&key).await.unwrap().quantity, 0);
    }
}
