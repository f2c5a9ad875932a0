use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use common::{IdempotencyKey, OrderId};
use tokio::sync::RwLock;

use domain::{
    IdempotencyRecord, IdempotencyStore, ListFilter, Order, OrderStatus, OrderStore, StoreError,
    StoredResponse,
};

#[derive(Default)]
struct OrderTable {
    rows: HashMap<OrderId, (u64, Order)>,
    next_seq: u64,
}

/// In-memory order store for tests and local runs.
///
/// Orders are stored and returned as value copies, so callers can never
/// mutate stored state through a returned order.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    table: Arc<RwLock<OrderTable>>,
    fail_on_create: Arc<AtomicBool>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent `create` calls fail with a backend error.
    pub fn set_fail_on_create(&self, fail: bool) {
        self.fail_on_create.store(fail, Ordering::SeqCst);
    }

    /// Returns the number of orders stored.
    pub async fn len(&self) -> usize {
        self.table.read().await.rows.len()
    }

    /// Returns true if no order has been stored.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Clears all orders.
    pub async fn clear(&self) {
        let mut table = self.table.write().await;
        table.rows.clear();
        table.next_seq = 0;
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create(&self, order: &Order) -> Result<(), StoreError> {
        if self.fail_on_create.load(Ordering::SeqCst) {
            return Err(StoreError::backend("in-memory store configured to fail"));
        }

        let mut guard = self.table.write().await;
        let table = &mut *guard;
        let seq = table.next_seq;
        match table.rows.entry(order.id().clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict(order.id().clone())),
            Entry::Vacant(slot) => {
                slot.insert((seq, order.clone()));
                table.next_seq += 1;
                Ok(())
            }
        }
    }

    async fn get_by_id(&self, id: &OrderId) -> Result<Order, StoreError> {
        self.table
            .read()
            .await
            .rows
            .get(id)
            .map(|(_, order)| order.clone())
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn list(&self, filter: &ListFilter) -> Result<Vec<Order>, StoreError> {
        let table = self.table.read().await;
        let mut rows: Vec<_> = table
            .rows
            .values()
            .filter(|(_, order)| filter.matches(order))
            .collect();

        // Newest first; insertion order breaks timestamp ties
        rows.sort_by(|(a_seq, a), (b_seq, b)| {
            b.created_at()
                .cmp(&a.created_at())
                .then(b_seq.cmp(a_seq))
        });

        let orders = rows.into_iter().map(|(_, order)| order.clone()).collect();
        Ok(filter.paginate(orders))
    }

    async fn update_status(
        &self,
        id: &OrderId,
        expected: OrderStatus,
        status: OrderStatus,
    ) -> Result<Order, StoreError> {
        let mut table = self.table.write().await;
        let (_, order) = table
            .rows
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        if order.status() != expected {
            return Err(StoreError::StatusChanged {
                id: id.clone(),
                actual: order.status(),
            });
        }
        order.record_status(status, Utc::now());
        Ok(order.clone())
    }
}

/// In-memory idempotency store for tests and local runs.
///
/// Records never expire.
#[derive(Clone, Default)]
pub struct InMemoryIdempotencyStore {
    records: Arc<RwLock<HashMap<IdempotencyKey, IdempotencyRecord>>>,
}

impl InMemoryIdempotencyStore {
    /// Creates a new empty in-memory idempotency store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the full record stored under a key.
    pub async fn record(&self, key: &IdempotencyKey) -> Option<IdempotencyRecord> {
        self.records.read().await.get(key).cloned()
    }

    /// Returns the number of recorded keys.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Returns true if no key has been recorded.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl IdempotencyStore for InMemoryIdempotencyStore {
    async fn get(&self, key: &IdempotencyKey) -> Result<Option<StoredResponse>, StoreError> {
        Ok(self
            .records
            .read()
            .await
            .get(key)
            .map(|record| record.response.clone()))
    }

    async fn save(&self, key: &IdempotencyKey, response: &StoredResponse) -> Result<bool, StoreError> {
        match self.records.write().await.entry(key.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(IdempotencyRecord::new(key.clone(), response.clone()));
                Ok(true)
            }
        }
    }
}
