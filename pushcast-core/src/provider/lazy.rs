//! Sender that builds its provider client on first use

use crate::models::{MulticastMessage, SendResult};
use crate::provider::{MulticastSender, ProviderError};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::OnceCell;

type SenderFactory =
    Box<dyn Fn() -> Result<Arc<dyn MulticastSender>, ProviderError> + Send + Sync>;

/// Defers provider construction until the first send.
///
/// A failed construction is returned from that send and retried on the next
/// one, so a server can start (and serve templates) before credentials are
/// available.
pub struct LazySender {
    name: String,
    factory: SenderFactory,
    inner: OnceCell<Arc<dyn MulticastSender>>,
}

impl LazySender {
    pub fn new<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn MulticastSender>, ProviderError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            factory: Box::new(factory),
            inner: OnceCell::new(),
        }
    }

    async fn sender(&self) -> Result<&Arc<dyn MulticastSender>, ProviderError> {
        self.inner
            .get_or_try_init(|| async {
                let sender = (self.factory)();
                match &sender {
                    Ok(_) => tracing::info!(provider = %self.name, "Messaging provider initialized"),
                    Err(e) => {
                        tracing::warn!(provider = %self.name, error = %e, "Messaging provider unavailable")
                    }
                }
                sender
            })
            .await
    }
}

#[async_trait]
impl MulticastSender for LazySender {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send_multicast(&self, message: &MulticastMessage) -> Result<SendResult, ProviderError> {
        self.sender().await?.send_multicast(message).await
    }
}
