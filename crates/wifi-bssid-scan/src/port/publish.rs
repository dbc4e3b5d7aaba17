//! The driven port for publishing scan envelopes.

use async_trait::async_trait;

use crate::error::WifiScanError;

/// Delivery guarantee requested for a published message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Qos {
    /// Fire and forget.
    AtMostOnce,
    /// Delivered with acknowledgment; duplicates possible.
    AtLeastOnce,
    /// Delivered exactly once.
    ExactlyOnce,
}

/// A connected message channel.
///
/// A value of this type is already connected; background delivery runs
/// until [`disconnect`](Self::disconnect) is awaited.
#[async_trait]
pub trait PublishChannel: Send {
    /// Hand `payload` to the channel for delivery on `topic`.
    async fn publish(&mut self, topic: &str, payload: Vec<u8>, qos: Qos)
        -> Result<(), WifiScanError>;

    /// Close the connection and stop background delivery.
    async fn disconnect(&mut self) -> Result<(), WifiScanError>;
}
