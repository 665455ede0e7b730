//! CLI command handlers

use anyhow::{Context, Result};
use pushcast_core::models::{Configuration, ProviderConfig};
use pushcast_core::payload::format_lenient;
use pushcast_core::provider::{
    FcmCredentials, FcmSender, LazySender, MulticastSender, ProviderError,
};
use pushcast_core::server::PushcastServer;
use pushcast_core::store::{FileTemplateStore, TemplateStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Load configuration from `path`, or from the default location when none is given.
/// A missing file yields defaults.
pub fn load_config(path: Option<&Path>) -> Result<Configuration> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            Configuration::default_config_path().unwrap_or_else(|_| PathBuf::from("config.toml"))
        }
    };
    Configuration::load_from_file(&path)
        .map_err(|e| anyhow::anyhow!("Failed to load configuration from {}: {}", path.display(), e))
}

fn fcm_sender(provider: &ProviderConfig) -> Result<FcmSender, ProviderError> {
    let credentials = FcmCredentials::from_env(provider.project_id.as_deref())?;
    tracing::debug!(
        credentials = ?credentials,
        endpoint = %provider.endpoint,
        "FCM client configured"
    );
    Ok(FcmSender::new(credentials).with_endpoint(provider.endpoint.clone()))
}

/// Build the FCM client from ambient credentials and the configured endpoint
pub fn build_sender(config: &Configuration) -> Result<Arc<dyn MulticastSender>> {
    let sender = fcm_sender(&config.provider).context("Failed to initialize the FCM client")?;
    Ok(Arc::new(sender))
}

/// FCM client built on the first send, so the web UI starts without credentials
pub fn lazy_sender(config: &Configuration) -> Arc<dyn MulticastSender> {
    let provider = config.provider.clone();
    Arc::new(LazySender::new("fcm", move || {
        fcm_sender(&provider).map(|sender| Arc::new(sender) as Arc<dyn MulticastSender>)
    }))
}

/// Apply command-line overrides on top of file configuration
fn apply_serve_overrides(
    mut config: Configuration,
    host: Option<String>,
    port: Option<u16>,
    data_dir: Option<PathBuf>,
) -> Result<Configuration> {
    if let Some(host) = host {
        config.server_host = host;
    }
    if let Some(port) = port {
        config.server_port = port;
    }
    if let Some(data_dir) = data_dir {
        config.data_dir = data_dir;
    }

    if let Err(problems) = config.validate() {
        anyhow::bail!("Invalid configuration:\n  - {}", problems.join("\n  - "));
    }
    Ok(config)
}

/// Handle the 'serve' command
pub async fn handle_serve(
    config: Configuration,
    host: Option<String>,
    port: Option<u16>,
    data_dir: Option<PathBuf>,
) -> Result<()> {
    let config = apply_serve_overrides(config, host, port, data_dir)?;

    let sender = lazy_sender(&config);
    let store = FileTemplateStore::open(&config.data_dir).with_context(|| {
        format!(
            "Failed to open template directory {}",
            config.data_dir.display()
        )
    })?;
    tracing::info!(data_dir = %store.dir().display(), "Template store ready");
    let store: Arc<dyn TemplateStore> = Arc::new(store);

    let server = PushcastServer::new(config.server_host, config.server_port, sender, store);
    server.start().await
}

/// Handle the 'format' command
pub fn handle_format(file: Option<PathBuf>, text: Option<String>) -> Result<()> {
    let input = match (file, text) {
        (Some(path), _) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        (None, Some(text)) => text,
        (None, None) => {
            anyhow::bail!("Nothing to format.\nUsage: pushcast format --file <FILE> | --str <JSON>")
        }
    };

    println!("{}", format_lenient(&input)?);
    Ok(())
}
