//! Main server integration for pushcast

use crate::provider::MulticastSender;
use crate::store::TemplateStore;
use anyhow::{Context, Result};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use warp::Filter;

/// All routes of the web UI: JSON API, static client, JSON rejections
pub fn create_routes(
    sender: Arc<dyn MulticastSender>,
    store: Arc<dyn TemplateStore>,
) -> impl Filter<Extract = impl warp::Reply, Error = Infallible> + Clone {
    crate::server::api::create_api_routes(sender, store)
        .or(crate::server::assets::create_asset_routes())
        .recover(crate::server::rejection::handle_rejection)
        .with(warp::trace::request())
}

/// Local web UI server
pub struct PushcastServer {
    host: String,
    port: u16,
    sender: Arc<dyn MulticastSender>,
    store: Arc<dyn TemplateStore>,
}

impl PushcastServer {
    /// Create a new server around an explicitly constructed provider client and store
    pub fn new(
        host: String,
        port: u16,
        sender: Arc<dyn MulticastSender>,
        store: Arc<dyn TemplateStore>,
    ) -> Self {
        Self {
            host,
            port,
            sender,
            store,
        }
    }

    fn address(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .context("Invalid server address")
    }

    /// Start the server and run until Ctrl+C
    pub async fn start(self) -> Result<()> {
        let address = self.address()?;
        let provider = self.sender.name().to_string();
        let routes = create_routes(self.sender, self.store);

        let (bound, server) = warp::serve(routes)
            .try_bind_with_graceful_shutdown(address, async {
                let _ = tokio::signal::ctrl_c().await;
            })
            .context(format!("Failed to bind to {}", address))?;

        tracing::info!(address = %bound, provider = %provider, "Web UI listening");
        println!("🚀 pushcast web UI running at http://{}", bound);
        println!("Press Ctrl+C to stop the server");

        server.await;

        println!("\n🛑 Server stopped");
        Ok(())
    }
}
