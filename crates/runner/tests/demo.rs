use domain::{OrderService, OrderState};
use order_store::{InMemoryOrderStore, OrderStoreExt};
use runner::{RunnerError, run_demo};

#[tokio::test]
async fn demo_walks_order_to_fulfilled() {
    let store = InMemoryOrderStore::new();
    let service = OrderService::new(store.clone()).unwrap();

    let report = run_demo(&service).await.unwrap();

    assert_eq!(
        report.states,
        vec![OrderState::Submitted, OrderState::Paid, OrderState::Fulfilled]
    );
    assert!(uuid::Uuid::parse_str(&report.confirmation_number).is_ok());
    assert_eq!(
        store.get_required(report.order_id).await.unwrap().state,
        "FULFILLED"
    );
}

#[tokio::test]
async fn each_run_creates_a_new_order() {
    let store = InMemoryOrderStore::new();
    let service = OrderService::new(store.clone()).unwrap();

    let first = run_demo(&service).await.unwrap();
    let second = run_demo(&service).await.unwrap();

    assert_ne!(first.order_id, second.order_id);
    assert_ne!(first.confirmation_number, second.confirmation_number);
    assert_eq!(store.len().await, 2);
}

#[tokio::test]
async fn storage_failure_stops_the_demo() {
    let store = InMemoryOrderStore::new();
    store.fail_writes(true);
    let service = OrderService::new(store).unwrap();

    let result = run_demo(&service).await;

    assert!(matches!(result, Err(RunnerError::Order(_))));
}
