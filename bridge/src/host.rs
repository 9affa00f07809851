use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use infinity_common::{BridgeConfig, ObservedState, ReconciliationEngine};
use tokio::{net::TcpListener, sync::watch};
use tracing::info;

use crate::{
    bus,
    engine::SharedEngine,
    http::{self, AppState},
};

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = BridgeConfig::from_env().context("invalid bridge configuration")?;
    info!(
        "bridging thermostat {} to mqtt://{}:{} (commands {}/#, state {})",
        config.document.serial,
        config.network.mqtt_host,
        config.network.mqtt_port,
        config.command_prefix,
        config.state_topic
    );

    let (telemetry_tx, telemetry_rx) = watch::channel(ObservedState::default());
    let engine = SharedEngine::new(
        ReconciliationEngine::new(config.monitored_fields.iter().cloned()),
        telemetry_tx,
    );

    let (mqtt, eventloop) = bus::connect(&config);
    bus::spawn_mqtt_loop(
        mqtt.clone(),
        eventloop,
        engine.clone(),
        config.command_prefix.clone(),
        config.state_topic.clone(),
    );
    bus::spawn_telemetry_publisher(mqtt, config.state_topic.clone(), telemetry_rx);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.network.listen_port));
    let app = http::router(AppState {
        engine,
        config: Arc::new(config),
    });

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind bridge server at {addr}"))?;

    info!("bridge listening on http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("bridge stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
}
