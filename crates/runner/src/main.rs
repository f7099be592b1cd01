//! Runner entry point.

use domain::OrderService;
use order_store::{InMemoryOrderStore, OrderStore};
use runner::{Config, RunnerError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

async fn run<S: OrderStore + 'static>(store: S) -> Result<(), RunnerError> {
    let service = OrderService::new(store)?;
    let report = runner::run_demo(&service).await?;
    tracing::info!(
        order_id = %report.order_id,
        confirmation = %report.confirmation_number,
        "demo complete"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env();

    // 1. Initialize tracing
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if config.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()?;

    // 3. Pick the order store and run the demo
    match config.database_url.as_deref() {
        Some(url) => run(runner::connect_postgres(&config, url).await?).await?,
        None => {
            tracing::info!("DATABASE_URL not set, using in-memory store");
            run(InMemoryOrderStore::new()).await?
        }
    }

    runner::log_metrics_snapshot(&metrics_handle);
    Ok(())
}
