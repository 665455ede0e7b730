//! Multicast sender: outbound delivery to a messaging provider

use crate::models::{MulticastMessage, SendResult};
use async_trait::async_trait;
use thiserror::Error;

/// Call-level provider failures. These abort the whole send; per-token
/// rejections are reported inside [`SendResult`] instead.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Messaging provider initialization failed: {0}")]
    Initialization(String),

    #[error("Invalid multicast message: {0}")]
    InvalidArgument(String),

    #[error("Messaging provider request failed: {0}")]
    Request(String),
}

/// Client for a multicast-send capability (e.g. FCM).
///
/// Constructed explicitly and passed to whichever component issues sends, so
/// tests can substitute a fake.
#[async_trait]
pub trait MulticastSender: Send + Sync {
    /// Provider name for logging (e.g. "fcm").
    fn name(&self) -> &str;

    /// Send `message` to every token. The returned responses are index-aligned
    /// with `message.tokens`.
    async fn send_multicast(&self, message: &MulticastMessage) -> Result<SendResult, ProviderError>;
}
