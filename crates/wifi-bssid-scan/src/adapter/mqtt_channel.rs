//! [`PublishChannel`] adapter for an MQTT broker, built on `rumqttc`.
//!
//! `rumqttc` splits a connection into an [`AsyncClient`] handle and an
//! [`EventLoop`] that must be polled for anything to move on the wire.
//! [`MqttChannel::connect`] polls the event loop itself until the broker's
//! CONNACK arrives, then hands it to a background task that keeps polling
//! until the channel is disconnected. A dropped connection is re-established
//! by that task on its next poll, after a short backoff.
//!
//! QoS 1 and 2 publishes are counted until the broker acknowledges them, and
//! [`disconnect`](PublishChannel::disconnect) waits (bounded) for that count
//! to reach zero before sending DISCONNECT.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{
    AsyncClient, ConnectReturnCode, ConnectionError, Event, EventLoop, MqttOptions, Outgoing,
    Packet, QoS,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::WifiScanError;
use crate::port::{PublishChannel, Qos};
use crate::publish::PublishConfig;

/// Maximum wait for the broker's CONNACK.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Pause between a lost connection and the next reconnect attempt.
const RECONNECT_BACKOFF: Duration = Duration::from_secs(1);

/// Maximum wait for outstanding acknowledgments before DISCONNECT.
const ACK_TIMEOUT: Duration = Duration::from_secs(5);

/// Maximum wait for the background task to drain after DISCONNECT.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Outgoing request queue depth between the client handle and event loop.
const REQUEST_CAPACITY: usize = 10;

/// A connected MQTT session.
pub struct MqttChannel {
    client: AsyncClient,
    /// Publishes at QoS 1 or 2 that the broker has not acknowledged yet.
    unacked: Arc<watch::Sender<usize>>,
    /// Event-loop driver; `None` once disconnected.
    driver: Option<JoinHandle<()>>,
}

impl MqttChannel {
    /// Connect to the broker named in `config` and wait for it to accept.
    ///
    /// # Errors
    ///
    /// [`WifiScanError::Publish`] when the broker is unreachable, refuses the
    /// session, or does not answer within the connect timeout.
    pub async fn connect(config: &PublishConfig) -> Result<Self, WifiScanError> {
        let mut options = MqttOptions::new(&config.client_id, &config.broker, config.port);
        options.set_keep_alive(config.keep_alive);
        options.set_clean_session(true);

        let (client, mut eventloop) = AsyncClient::new(options, REQUEST_CAPACITY);

        tokio::time::timeout(CONNECT_TIMEOUT, wait_for_connack(&mut eventloop))
            .await
            .map_err(|_| {
                WifiScanError::Publish(format!(
                    "timed out after {}s connecting to {}:{}",
                    CONNECT_TIMEOUT.as_secs(),
                    config.broker,
                    config.port
                ))
            })??;

        tracing::info!(broker = %config.broker, port = config.port, "connected to MQTT broker");

        let (unacked, _) = watch::channel(0);
        let unacked = Arc::new(unacked);
        let driver = tokio::spawn(drive(eventloop, Arc::clone(&unacked)));
        Ok(Self {
            client,
            unacked,
            driver: Some(driver),
        })
    }
}

async fn wait_for_connack(eventloop: &mut EventLoop) -> Result<(), WifiScanError> {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                return if ack.code == ConnectReturnCode::Success {
                    Ok(())
                } else {
                    Err(WifiScanError::Publish(format!(
                        "broker refused connection: {:?}",
                        ack.code
                    )))
                };
            }
            Ok(_) => {}
            Err(e) => {
                return Err(WifiScanError::Publish(format!("connection failed: {e}")));
            }
        }
    }
}

/// Poll the event loop until DISCONNECT goes out or the client is dropped.
///
/// Connection errors are logged and retried: `rumqttc` reconnects on the
/// poll that follows an error.
async fn drive(mut eventloop: EventLoop, unacked: Arc<watch::Sender<usize>>) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::PubAck(ack))) => {
                tracing::debug!(pkid = ack.pkid, "publish acknowledged");
                settle_one(&unacked);
            }
            Ok(Event::Incoming(Packet::PubComp(comp))) => {
                tracing::debug!(pkid = comp.pkid, "publish completed");
                settle_one(&unacked);
            }
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                tracing::info!("reconnected to MQTT broker");
                if !ack.session_present {
                    // A fresh session never acknowledges what the old one had in flight.
                    let lost = unacked.send_replace(0);
                    if lost > 0 {
                        tracing::warn!(lost, "unacknowledged publishes lost with the previous session");
                    }
                }
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                tracing::debug!("disconnect sent");
                break;
            }
            Ok(_) => {}
            Err(ConnectionError::RequestsDone) => break,
            Err(e) => {
                tracing::warn!(
                    "MQTT connection lost, reconnecting in {}s: {e}",
                    RECONNECT_BACKOFF.as_secs()
                );
                tokio::time::sleep(RECONNECT_BACKOFF).await;
            }
        }
    }
}

fn settle_one(unacked: &watch::Sender<usize>) {
    unacked.send_modify(|n| *n = n.saturating_sub(1));
}

/// Resolve once no acknowledgment is outstanding.
async fn acks_settled(mut unacked: watch::Receiver<usize>) {
    loop {
        if *unacked.borrow_and_update() == 0 {
            return;
        }
        if unacked.changed().await.is_err() {
            return;
        }
    }
}

fn to_mqtt_qos(qos: Qos) -> QoS {
    match qos {
        Qos::AtMostOnce => QoS::AtMostOnce,
        Qos::AtLeastOnce => QoS::AtLeastOnce,
        Qos::ExactlyOnce => QoS::ExactlyOnce,
    }
}

#[async_trait]
impl PublishChannel for MqttChannel {
    async fn publish(
        &mut self,
        topic: &str,
        payload: Vec<u8>,
        qos: Qos,
    ) -> Result<(), WifiScanError> {
        if self.driver.is_none() {
            return Err(WifiScanError::Publish("channel is disconnected".into()));
        }

        let acknowledged = qos != Qos::AtMostOnce;
        if acknowledged {
            self.unacked.send_modify(|n| *n += 1);
        }
        let sent = self
            .client
            .publish(topic, to_mqtt_qos(qos), false, payload)
            .await;
        if sent.is_err() && acknowledged {
            settle_one(&self.unacked);
        }
        sent.map_err(|e| WifiScanError::Publish(format!("publish to {topic} failed: {e}")))
    }

    async fn disconnect(&mut self) -> Result<(), WifiScanError> {
        let Some(mut driver) = self.driver.take() else {
            return Ok(());
        };

        let settled = tokio::time::timeout(ACK_TIMEOUT, acks_settled(self.unacked.subscribe()))
            .await
            .is_ok();
        if !settled {
            let pending = *self.unacked.borrow();
            tracing::warn!(pending, "disconnecting before every publish was acknowledged");
        }

        let sent = self.client.disconnect().await;

        if tokio::time::timeout(DRAIN_TIMEOUT, &mut driver).await.is_err() {
            tracing::warn!("MQTT event loop did not stop in time; aborting it");
            driver.abort();
        }
        tracing::info!("disconnected from MQTT broker");

        sent.map_err(|e| WifiScanError::Publish(format!("disconnect failed: {e}")))
    }
}
