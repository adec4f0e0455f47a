mod bus;
mod investments;
mod problem;
mod router;
mod telemetry;

use std::{net::SocketAddr, sync::Arc};

use isa_invest_core::InvestmentEngine;
use isa_invest_storage::InMemoryInvestmentStore;
use isa_invest_util::{load_env_file, AppConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    load_env_file();
    let config = AppConfig::from_env()?;

    telemetry::init_tracing(&config)?;
    let metrics = telemetry::init_metrics()?;

    let bus = bus::EventBus::new(config.event_bus_capacity);
    bus.spawn_audit_logger();

    let store = Arc::new(InMemoryInvestmentStore::new());
    let engine = InvestmentEngine::new(store, Arc::new(bus.clone()));
    let state = router::AppState::new(metrics, bus, engine);

    let addr: SocketAddr = config.bind_addr;
    info!(stage = "app", %addr, env = %config.environment.as_str(), "starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router::app_router(state))
        .await
        .map_err(|err| err.into())
}
