//! Minimal port fakes for unit tests in this crate.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use common::{IdempotencyKey, OrderId};

use crate::error::{PublishError, StoreError};
use crate::order::{ListFilter, Order, OrderStatus};
use crate::ports::{EventPublisher, IdempotencyStore, OrderStore, StoredResponse};

#[derive(Clone, Default)]
pub struct FakeOrders {
    orders: Arc<Mutex<Vec<Order>>>,
    pub fail_create: Arc<Mutex<bool>>,
}

impl FakeOrders {
    pub fn count(&self) -> usize {
        self.orders.lock().unwrap().len()
    }

    pub fn insert(&self, order: Order) {
        self.orders.lock().unwrap().push(order);
    }
}

#[async_trait]
impl OrderStore for FakeOrders {
    async fn create(&self, order: &Order) -> Result<(), StoreError> {
        if *self.fail_create.lock().unwrap() {
            return Err(StoreError::backend("disk full"));
        }
        self.orders.lock().unwrap().push(order.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: &OrderId) -> Result<Order, StoreError> {
        self.orders
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.id() == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn list(&self, filter: &ListFilter) -> Result<Vec<Order>, StoreError> {
        let orders: Vec<Order> = self
            .orders
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|o| filter.matches(o))
            .cloned()
            .collect();
        Ok(filter.paginate(orders))
    }

    async fn update_status(
        &self,
        id: &OrderId,
        expected: OrderStatus,
        status: OrderStatus,
    ) -> Result<Order, StoreError> {
        let mut orders = self.orders.lock().unwrap();
        let order = orders
            .iter_mut()
            .find(|o| o.id() == id)
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

#[derive(Clone, Default)]
pub struct FakeIdempotency {
    records: Arc<Mutex<HashMap<String, StoredResponse>>>,
}

impl FakeIdempotency {
    pub fn count(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

#[async_trait]
impl IdempotencyStore for FakeIdempotency {
    async fn get(&self, key: &IdempotencyKey) -> Result<Option<StoredResponse>, StoreError> {
        Ok(self.records.lock().unwrap().get(key.as_str()).cloned())
    }

    async fn save(&self, key: &IdempotencyKey, response: &StoredResponse) -> Result<bool, StoreError> {
        let mut records = self.records.lock().unwrap();
        if records.contains_key(key.as_str()) {
            return Ok(false);
        }
        records.insert(key.as_str().to_string(), response.clone());
        Ok(true)
    }
}

#[derive(Clone, Default)]
pub struct FakePublisher {
    pub published: Arc<Mutex<Vec<(String, OrderId)>>>,
    pub fail: Arc<Mutex<bool>>,
}

impl FakePublisher {
    pub fn failing() -> Self {
        let publisher = Self::default();
        *publisher.fail.lock().unwrap() = true;
        publisher
    }

    pub fn events(&self) -> Vec<(String, OrderId)> {
        self.published.lock().unwrap().clone()
    }

    fn record(&self, event_type: &str, order_id: &OrderId) -> Result<(), PublishError> {
        if *self.fail.lock().unwrap() {
            return Err(PublishError::Unavailable("broker down".into()));
        }
        self.published
            .lock()
            .unwrap()
            .push((event_type.to_string(), order_id.clone()));
        Ok(())
    }
}

#[async_trait]
impl EventPublisher for FakePublisher {
    async fn publish_order_created(&self, order_id: &OrderId) -> Result<(), PublishError> {
        self.record("order.created", order_id)
    }

    async fn publish_order_processed(&self, order_id: &OrderId) -> Result<(), PublishError> {
        self.record("order.processed", order_id)
    }

    async fn publish_order_failed(&self, order_id: &OrderId, _reason: &str) -> Result<(), PublishError> {
        self.record("order.failed", order_id)
    }
}
