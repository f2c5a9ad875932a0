use common::IdempotencyKey;
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{CreateOrder, CreateOrderHandler, OrderService, OrderStatus, accepted_response};
use messaging::InMemoryEventPublisher;
use order_store::{InMemoryIdempotencyStore, InMemoryOrderStore};

fn create_service() -> OrderService<InMemoryOrderStore, InMemoryEventPublisher, InMemoryIdempotencyStore>
{
    OrderService::new(
        InMemoryOrderStore::new(),
        InMemoryEventPublisher::new(),
        InMemoryIdempotencyStore::new(),
    )
}

fn bench_create_order(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let handler = CreateOrderHandler::new(InMemoryOrderStore::new(), InMemoryEventPublisher::new());

    c.bench_function("domain/create_order", |b| {
        b.iter(|| {
            rt.block_on(async {
                handler
                    .handle(CreateOrder::new("bench@example.com", 1000))
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_guarded_first_request(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let service = create_service();
    let mut n = 0u64;

    c.bench_function("domain/guarded_first_request", |b| {
        b.iter(|| {
            n += 1;
            let key = IdempotencyKey::parse(&format!("bench-{n}")).unwrap();
            rt.block_on(async {
                service
                    .create_order(&key, CreateOrder::new("bench@example.com", 1000))
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_replay(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let service = create_service();
    let key = IdempotencyKey::parse("bench-replay").unwrap();
    rt.block_on(async {
        service
            .create_order(&key, CreateOrder::new("bench@example.com", 1000))
            .await
            .unwrap()
    });

    c.bench_function("domain/replay", |b| {
        b.iter(|| {
            rt.block_on(async {
                service
                    .create_order(&key, CreateOrder::new("bench@example.com", 1000))
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_full_lifecycle(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let service = create_service();
    let mut n = 0u64;

    c.bench_function("domain/create_process_complete", |b| {
        b.iter(|| {
            n += 1;
            let key = IdempotencyKey::parse(&format!("cycle-{n}")).unwrap();
            rt.block_on(async {
                let id = service
                    .create_order(&key, CreateOrder::new("bench@example.com", 1000))
                    .await
                    .unwrap()
                    .response
                    .order_id;
                service.start_processing(&id).await.unwrap();
                let order = service.complete_order(&id).await.unwrap();
                assert_eq!(order.status(), OrderStatus::Completed);
            });
        });
    });
}

fn bench_accepted_response(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let handler = CreateOrderHandler::new(InMemoryOrderStore::new(), InMemoryEventPublisher::new());
    let order = rt.block_on(async {
        handler
            .handle(CreateOrder::new("bench@example.com", 1000))
            .await
            .unwrap()
    });

    c.bench_function("domain/accepted_response", |b| {
        b.iter(|| accepted_response(&order).unwrap());
    });
}

criterion_group!(
    benches,
    bench_create_order,
    bench_guarded_first_request,
    bench_replay,
    bench_full_lifecycle,
    bench_accepted_response,
);

criterion_main!(benches);
