//! PostgreSQL integration tests
//!
//! These tests share one PostgreSQL container. Each test gets its own
//! freshly migrated database, so they can run in parallel:
//!
//! ```bash
//! cargo test -p order-store --test postgres_integration
//! ```

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use common::{IdempotencyKey, OrderId};
use domain::{
    IdempotencyStore, ListFilter, Order, OrderStatus, OrderStore, StoreError, StoredResponse,
};
use order_store::postgres::{self, PostgresIdempotencyStore, PostgresOrderStore};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    base_url: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            Arc::new(ContainerInfo {
                container,
                base_url: format!("postgres://postgres:postgres@{}:{}", host, port),
            })
        })
        .await
        .clone()
}

/// Creates an isolated, migrated database and returns a pool for it.
async fn get_test_pool() -> PgPool {
    let info = get_container_info().await;
    let db_name = format!("test_{}", OrderId::generate());

    let admin = PgPool::connect(&format!("{}/postgres", info.base_url))
        .await
        .unwrap();
    sqlx::query(&format!("CREATE DATABASE {db_name}"))
        .execute(&admin)
        .await
        .unwrap();
    admin.close().await;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&format!("{}/{}", info.base_url, db_name))
        .await
        .unwrap();
    postgres::run_migrations(&pool).await.unwrap();
    pool
}

fn order_at(id: &str, secs: i64) -> Order {
    let at = Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap();
    Order::new_pending(OrderId::new(id), "a@b.com", 500, at).unwrap()
}

fn response(order_id: &str, body: &[u8]) -> StoredResponse {
    StoredResponse {
        status_code: 202,
        body: body.to_vec(),
        order_id: OrderId::new(order_id),
    }
}

#[tokio::test]
async fn create_and_get_order() {
    let store = PostgresOrderStore::new(get_test_pool().await);
    let order = order_at("o-1", 0);

    store.create(&order).await.unwrap();

    let loaded = store.get_by_id(order.id()).await.unwrap();
    assert_eq!(loaded, order);
}

#[tokio::test]
async fn duplicate_id_is_conflict() {
    let store = PostgresOrderStore::new(get_test_pool().await);
    let order = order_at("o-1", 0);
    store.create(&order).await.unwrap();

    let err = store.create(&order).await.unwrap_err();

    assert!(matches!(err, StoreError::Conflict(_)));
}

#[tokio::test]
async fn get_missing_order_is_not_found() {
    let store = PostgresOrderStore::new(get_test_pool().await);

    let err = store.get_by_id(&OrderId::new("missing")).await.unwrap_err();

    assert!(matches!(err, StoreError::NotFound(_)));
}

#[tokio::test]
async fn list_is_newest_first_and_paginated() {
    let store = PostgresOrderStore::new(get_test_pool().await);
    store.create(&order_at("old", 0)).await.unwrap();
    store.create(&order_at("mid", 10)).await.unwrap();
    store.create(&order_at("new", 20)).await.unwrap();

    let first = store
        .list(&ListFilter::new().page(1).page_size(2))
        .await
        .unwrap();
    let second = store
        .list(&ListFilter::new().page(2).page_size(2))
        .await
        .unwrap();
    let beyond = store
        .list(&ListFilter::new().page(3).page_size(2))
        .await
        .unwrap();

    let ids: Vec<_> = first.iter().map(|o| o.id().as_str()).collect();
    assert_eq!(ids, vec!["new", "mid"]);
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].id().as_str(), "old");
    assert!(beyond.is_empty());
}

#[tokio::test]
async fn list_filters_by_status() {
    let store = PostgresOrderStore::new(get_test_pool().await);
    store.create(&order_at("a", 0)).await.unwrap();
    store.create(&order_at("b", 1)).await.unwrap();
    store
        .update_status(&OrderId::new("b"), OrderStatus::Pending, OrderStatus::Canceled)
        .await
        .unwrap();

    let pending = store
        .list(&ListFilter::new().status(OrderStatus::Pending))
        .await
        .unwrap();
    let canceled = store
        .list(&ListFilter::new().status(OrderStatus::Canceled))
        .await
        .unwrap();

    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id().as_str(), "a");
    assert_eq!(canceled.len(), 1);
    assert_eq!(canceled[0].status(), OrderStatus::Canceled);
}

#[tokio::test]
async fn update_status_returns_updated_order() {
    let store = PostgresOrderStore::new(get_test_pool().await);
    let order = order_at("o-1", 0);
    store.create(&order).await.unwrap();

    let updated = store
        .update_status(order.id(), OrderStatus::Pending, OrderStatus::Processing)
        .await
        .unwrap();

    assert_eq!(updated.status(), OrderStatus::Processing);
    assert!(updated.updated_at() > order.updated_at());
    assert_eq!(updated.created_at(), order.created_at());
    assert_eq!(store.get_by_id(order.id()).await.unwrap(), updated);
}

#[tokio::test]
async fn update_status_keeps_updated_at_monotonic() {
    let store = PostgresOrderStore::new(get_test_pool().await);
    let future = Utc.timestamp_opt(Utc::now().timestamp(), 0).unwrap() + Duration::hours(1);
    let order = Order::new_pending(OrderId::new("o-1"), "a@b.com", 500, future).unwrap();
    store.create(&order).await.unwrap();

    let updated = store
        .update_status(order.id(), OrderStatus::Pending, OrderStatus::Canceled)
        .await
        .unwrap();

    assert_eq!(updated.updated_at(), future);
}

#[tokio::test]
async fn update_missing_order_is_not_found() {
    let store = PostgresOrderStore::new(get_test_pool().await);

    let err = store
        .update_status(&OrderId::new("missing"), OrderStatus::Pending, OrderStatus::Canceled)
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::NotFound(_)));
}

#[tokio::test]
async fn update_from_stale_status_changes_nothing() {
    let store = PostgresOrderStore::new(get_test_pool().await);
    let order = order_at("o-1", 0);
    store.create(&order).await.unwrap();
    store
        .update_status(order.id(), OrderStatus::Pending, OrderStatus::Canceled)
        .await
        .unwrap();

    let err = store
        .update_status(order.id(), OrderStatus::Pending, OrderStatus::Processing)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        StoreError::StatusChanged {
            actual: OrderStatus::Canceled,
            ..
        }
    ));
    assert_eq!(
        store.get_by_id(order.id()).await.unwrap().status(),
        OrderStatus::Canceled
    );
}

#[tokio::test]
async fn concurrent_transitions_from_pending_have_one_winner() {
    let store = PostgresOrderStore::new(get_test_pool().await);
    let order = order_at("o-1", 0);
    store.create(&order).await.unwrap();

    let (cancel, process) = tokio::join!(
        store.update_status(order.id(), OrderStatus::Pending, OrderStatus::Canceled),
        store.update_status(order.id(), OrderStatus::Pending, OrderStatus::Processing),
    );

    let winner = match (cancel, process) {
        (Ok(o), Err(StoreError::StatusChanged { actual, .. }))
        | (Err(StoreError::StatusChanged { actual, .. }), Ok(o)) => {
            assert_eq!(actual, o.status());
            o.status()
        }
        other => panic!("expected exactly one winner, got {other:?}"),
    };
    assert_eq!(store.get_by_id(order.id()).await.unwrap().status(), winner);
}

#[tokio::test]
async fn idempotency_unseen_key_returns_none() {
    let store = PostgresIdempotencyStore::new(get_test_pool().await);
    let key = IdempotencyKey::parse("K1").unwrap();

    assert!(store.get(&key).await.unwrap().is_none());
}

#[tokio::test]
async fn idempotency_first_writer_wins() {
    let store = PostgresIdempotencyStore::new(get_test_pool().await);
    let key = IdempotencyKey::parse("K1").unwrap();

    assert!(store.save(&key, &response("o-1", b"{\"first\":1}")).await.unwrap());
    assert!(!store.save(&key, &response("o-2", b"{\"second\":2}")).await.unwrap());

    let stored = store.get(&key).await.unwrap().unwrap();
    assert_eq!(stored, response("o-1", b"{\"first\":1}"));
}

#[tokio::test]
async fn idempotency_concurrent_saves_keep_one_response() {
    let store = PostgresIdempotencyStore::new(get_test_pool().await);
    let key = IdempotencyKey::parse("K-race").unwrap();

    let saves = (0..8).map(|i| {
        let store = store.clone();
        let key = key.clone();
        tokio::spawn(async move {
            store
                .save(&key, &response(&format!("o-{i}"), format!("{i}").as_bytes()))
                .await
                .unwrap()
        })
    });
    let results = futures_util::future::join_all(saves).await;

    let winners = results.into_iter().filter(|r| *r.as_ref().unwrap()).count();
    assert_eq!(winners, 1);
    assert!(store.get(&key).await.unwrap().is_some());
}

#[tokio::test]
async fn ping_reports_reachable_database() {
    let pool = get_test_pool().await;
    postgres::ping(&pool).await.unwrap();
}
