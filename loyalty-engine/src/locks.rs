//! Per-Customer Serialization
//!
//! Two concurrent ledger mutations for the same customer must never both
//! read the same starting balance and both succeed. Every mutation
//! acquires the customer's lock first; operations on different customers
//! proceed independently.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use loyalty_core::CustomerId;

/// Customer-keyed lock map
pub struct CustomerLocks {
    locks: RwLock<HashMap<CustomerId, Arc<Mutex<()>>>>,
}

impl CustomerLocks {
    pub fn new() -> Self {
        Self {
            locks: RwLock::new(HashMap::new()),
        }
    }

    /// Acquire the mutation lock for one customer, creating it on first use
    pub async fn acquire(&self, customer_id: &CustomerId) -> OwnedMutexGuard<()> {
        let existing = {
            let locks = self.locks.read().await;
            locks.get(customer_id).cloned()
        };

        let lock = match existing {
            Some(lock) => lock,
            None => {
                let mut locks = self.locks.write().await;
                locks
                    .entry(customer_id.clone())
                    .or_insert_with(|| Arc::new(Mutex::new(())))
                    .clone()
            }
        };

        lock.lock_owned().await
    }
}

impl Default for CustomerLocks {
    fn default() -> Self {
        Self::new()
    }
}
