use std::time::Duration;

use anyhow::Context;
use infinity_common::{
    availability_topic, command_filter, command_suffix, decode_command, encode_telemetry,
    BridgeConfig, CommandKind, CommandOutcome, ObservedState, PAYLOAD_OFFLINE, PAYLOAD_ONLINE,
};
use rumqttc::{AsyncClient, Event, EventLoop, Incoming, LastWill, MqttOptions, QoS};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::engine::SharedEngine;

const CLIENT_ID: &str = "infinity-bridge";

pub fn connect(config: &BridgeConfig) -> (AsyncClient, EventLoop) {
    let network = &config.network;
    let mut options = MqttOptions::new(CLIENT_ID, network.mqtt_host.clone(), network.mqtt_port);
    options.set_keep_alive(Duration::from_secs(5));
    options.set_last_will(LastWill::new(
        availability_topic(&config.state_topic),
        PAYLOAD_OFFLINE,
        QoS::AtLeastOnce,
        true,
    ));
    if !network.mqtt_user.is_empty() {
        options.set_credentials(network.mqtt_user.clone(), network.mqtt_pass.clone());
    }

    AsyncClient::new(options, 64)
}

/// Drives the connection, re-subscribing and announcing availability on
/// every (re)connect, and feeds commands into the engine.
pub fn spawn_mqtt_loop(
    mqtt: AsyncClient,
    mut eventloop: EventLoop,
    engine: SharedEngine,
    command_prefix: String,
    state_topic: String,
) {
    tokio::spawn(async move {
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Incoming::Publish(message))) => {
                    let handled = handle_mqtt_message(
                        &engine,
                        &command_prefix,
                        &message.topic,
                        &message.payload,
                    )
                    .await;
                    if let Err(err) = handled {
                        warn!("mqtt message handling error: {err:#}");
                    }
                }
                Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                    info!("mqtt connected");
                    if let Err(err) = on_connected(&mqtt, &command_prefix, &state_topic) {
                        warn!("mqtt subscribe failed: {err:#}");
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    warn!("mqtt poll error: {err}");
                    tokio::time::sleep(Duration::from_secs(2)).await;
                }
            }
        }
    });
}

/// Publishes the latest observed-state snapshot, retained. Snapshots that
/// arrive while a publish is in flight collapse into the newest one.
pub fn spawn_telemetry_publisher(
    mqtt: AsyncClient,
    state_topic: String,
    mut snapshots: watch::Receiver<ObservedState>,
) {
    tokio::spawn(async move {
        while snapshots.changed().await.is_ok() {
            let encoded = encode_telemetry(&snapshots.borrow_and_update());
            let body = match encoded {
                Ok(body) => body,
                Err(err) => {
                    warn!("state serialization failed: {err}");
                    continue;
                }
            };

            if let Err(err) = mqtt
                .publish(state_topic.as_str(), QoS::AtLeastOnce, true, body)
                .await
            {
                warn!("state publish failed: {err}");
            }
        }
    });
}

fn on_connected(mqtt: &AsyncClient, command_prefix: &str, state_topic: &str) -> anyhow::Result<()> {
    let filter = command_filter(command_prefix);
    mqtt.try_subscribe(filter.as_str(), QoS::AtMostOnce)
        .with_context(|| format!("failed to subscribe to {filter}"))?;
    info!("subscribed to {filter}");

    mqtt.try_publish(
        availability_topic(state_topic),
        QoS::AtLeastOnce,
        true,
        PAYLOAD_ONLINE,
    )
    .context("failed to publish availability")?;
    Ok(())
}

async fn handle_mqtt_message(
    engine: &SharedEngine,
    command_prefix: &str,
    topic: &str,
    payload: &[u8],
) -> anyhow::Result<()> {
    let Some(kind) = command_suffix(command_prefix, topic).and_then(CommandKind::from_topic_suffix)
    else {
        debug!("ignoring message on {topic}");
        return Ok(());
    };

    let value = decode_command(payload).with_context(|| format!("dropping command on {topic}"))?;
    info!("new message: {topic} {value}");

    match engine
        .apply_command(kind, value)
        .await
        .with_context(|| format!("rejected {} command", kind.as_str()))?
    {
        CommandOutcome::Applied => debug!("{} command applied, change pending", kind.as_str()),
        CommandOutcome::Ignored => debug!("{} command left desired state unchanged", kind.as_str()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use infinity_common::{DocumentContext, ReconciliationEngine, DEFAULT_COMMAND_PREFIX};

    use super::*;

    fn engine() -> (SharedEngine, watch::Receiver<ObservedState>) {
        let (tx, rx) = watch::channel(ObservedState::default());
        let engine = ReconciliationEngine::new(["mode", "clsp", "htsp"]);
        (SharedEngine::new(engine, tx), rx)
    }

    async fn seed(engine: &SharedEngine) {
        engine
            .exchange_status(vec![
                ("mode".to_string(), Some("cool".to_string())),
                ("clsp".to_string(), Some("78".to_string())),
                ("htsp".to_string(), Some("65".to_string())),
            ])
            .await;
    }

    fn context() -> DocumentContext {
        DocumentContext {
            api_server_address: "api.example".to_string(),
            serial: "S1".to_string(),
        }
    }

    #[tokio::test]
    async fn command_topics_drive_the_engine() {
        let (engine, _rx) = engine();
        seed(&engine).await;

        for (topic, payload) in [
            ("cmnd/thermostat/temperature", "72.5"),
            ("cmnd/thermostat/fan_mode", "low"),
            ("cmnd/thermostat/hold", "off"),
        ] {
            handle_mqtt_message(&engine, DEFAULT_COMMAND_PREFIX, topic, payload.as_bytes())
                .await
                .unwrap();
        }

        assert!(engine.has_pending_changes().await);
        let document = engine.config_document(&context(), Utc::now()).await.unwrap();
        assert_eq!(document.zones[0].clsp, "72");
        assert_eq!(document.fan, "low");
        assert_eq!(document.zones[0].hold, "off");
    }

    #[tokio::test]
    async fn unrelated_topics_are_ignored() {
        let (engine, _rx) = engine();
        seed(&engine).await;

        handle_mqtt_message(&engine, DEFAULT_COMMAND_PREFIX, "cmnd/thermostat/humidity", b"40")
            .await
            .unwrap();
        handle_mqtt_message(&engine, DEFAULT_COMMAND_PREFIX, "cmnd/other/hold", b"off")
            .await
            .unwrap();

        assert!(!engine.has_pending_changes().await);
    }

    #[tokio::test]
    async fn bad_setpoint_is_reported_and_dropped() {
        let (engine, _rx) = engine();
        seed(&engine).await;

        let err = handle_mqtt_message(
            &engine,
            DEFAULT_COMMAND_PREFIX,
            "cmnd/thermostat/temperature",
            b"warmer",
        )
        .await
        .unwrap_err();

        assert!(format!("{err:#}").contains("warmer"));
        assert!(!engine.has_pending_changes().await);
    }

    #[tokio::test]
    async fn non_utf8_payload_is_dropped() {
        let (engine, _rx) = engine();
        seed(&engine).await;

        let result = handle_mqtt_message(
            &engine,
            DEFAULT_COMMAND_PREFIX,
            "cmnd/thermostat/operating_mode",
            &[0xff, 0xfe],
        )
        .await;

        assert!(result.is_err());
        assert!(!engine.has_pending_changes().await);
    }
}
