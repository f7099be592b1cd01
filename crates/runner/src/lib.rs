//! Demo runner for the order state machine.
//!
//! Creates one order, pays it with a generated confirmation number and
//! fulfills it, logging the state after each step. Orders live in Postgres
//! when `DATABASE_URL` is set and in memory otherwise.

pub mod config;
pub mod error;

use chrono::Utc;
use common::EntityId;
use domain::{OrderService, OrderState, TransitionOutcome};
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::{OrderStore, PostgresOrderStore};
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

pub use config::Config;
pub use error::RunnerError;

/// What happened to the demo order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoReport {
    pub order_id: EntityId,
    pub confirmation_number: String,
    /// State after create, pay and fulfill, in that order.
    pub states: Vec<OrderState>,
}

/// Connects to Postgres and brings the schema up to date.
pub async fn connect_postgres(config: &Config, url: &str) -> Result<PostgresOrderStore, RunnerError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(url)
        .await?;

    let store = PostgresOrderStore::new(pool);
    store.run_migrations().await?;
    tracing::info!(max_connections = config.max_connections, "connected to postgres");
    Ok(store)
}

/// Logs the rendered Prometheus snapshot at info and returns it.
pub fn log_metrics_snapshot(handle: &PrometheusHandle) -> String {
    let rendered = handle.render();
    tracing::info!(metrics = %rendered, "final metrics snapshot");
    rendered
}

/// Walks a new order through create, pay and fulfill.
#[tracing::instrument(skip(service))]
pub async fn run_demo<S: OrderStore + 'static>(
    service: &OrderService<S>,
) -> Result<DemoReport, RunnerError> {
    let order = service.create(Utc::now()).await?;
    tracing::info!(order_id = %order.id(), state = %order.state(), "after calling create()");

    let confirmation_number = Uuid::new_v4().to_string();
    let paid = expect_accepted(service.pay(order.id(), &confirmation_number).await?, "PAY")?;
    tracing::info!(order_id = %order.id(), state = %paid.state, "after calling pay()");

    let fulfilled = expect_accepted(service.fulfill(order.id()).await?, "FULFILL")?;
    tracing::info!(order_id = %order.id(), state = %fulfilled.state, "after calling fulfill()");

    Ok(DemoReport {
        order_id: order.id(),
        confirmation_number,
        states: vec![order.state(), paid.state, fulfilled.state],
    })
}

fn expect_accepted(
    outcome: TransitionOutcome,
    event: &'static str,
) -> Result<TransitionOutcome, RunnerError> {
    if outcome.accepted {
        Ok(outcome)
    } else {
        Err(RunnerError::Rejected {
            order_id: outcome.order_id,
            event,
        })
    }
}
