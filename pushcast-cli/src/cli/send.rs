//! Default command: multicast one payload to a list of device tokens

use anyhow::{Context, Result};
use clap::Args;
use pushcast_core::models::{MulticastMessage, Payload, SendResponse, SendResult};
use pushcast_core::payload::{parse_payload, parse_token_list, read_payload_file, read_token_file};
use pushcast_core::provider::MulticastSender;
use pushcast_core::services::logging;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Printed with every usage error
pub const USAGE_EXAMPLE: &str = "Usage examples:
  pushcast --tokens tokens.txt --payload payload.json
  pushcast --tokens-str tokenA,tokenB --payload-str '{\"notification\":{\"title\":\"Hi\"}}'";

/// Inputs of the send command. A file source wins over its string counterpart.
#[derive(Args, Debug, Default, Clone)]
pub struct SendArgs {
    /// File with one device token per line
    #[arg(short = 't', long = "tokens", value_name = "FILE")]
    pub tokens_file: Option<PathBuf>,

    /// File containing the JSON payload
    #[arg(short = 'p', long = "payload", value_name = "FILE")]
    pub payload_file: Option<PathBuf>,

    /// Comma-separated device tokens
    #[arg(long = "tokens-str", value_name = "CSV")]
    pub tokens_str: Option<String>,

    /// JSON payload given inline
    #[arg(long = "payload-str", value_name = "JSON")]
    pub payload_str: Option<String>,

    /// Print the message that would be sent and exit without contacting FCM
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Error, Debug)]
pub enum InputError {
    #[error("Both a token source and a payload source are required.\n{}", USAGE_EXAMPLE)]
    MissingSource,

    #[error("No device tokens found")]
    NoTokens,
}

/// Read tokens and payload from whichever sources were given
pub fn resolve_message(args: &SendArgs) -> Result<MulticastMessage> {
    let has_tokens = args.tokens_file.is_some() || args.tokens_str.is_some();
    let has_payload = args.payload_file.is_some() || args.payload_str.is_some();
    if !has_tokens || !has_payload {
        return Err(InputError::MissingSource.into());
    }

    let tokens = match (&args.tokens_file, &args.tokens_str) {
        (Some(path), _) => read_token_file(path)?,
        (None, Some(list)) => parse_token_list(list),
        (None, None) => Vec::new(),
    };
    if tokens.is_empty() {
        return Err(InputError::NoTokens.into());
    }

    let payload: Payload = match (&args.payload_file, &args.payload_str) {
        (Some(path), _) => read_payload_file(path)?,
        (None, Some(text)) => parse_payload(text)?,
        (None, None) => Payload::new(),
    };

    Ok(MulticastMessage::new(tokens, payload))
}

/// Resolve inputs, then either print the message (dry run) or send it.
///
/// `make_sender` is only called for a real send.
pub async fn handle_send<F>(args: &SendArgs, make_sender: F) -> Result<()>
where
    F: FnOnce() -> Result<Arc<dyn MulticastSender>>,
{
    let message = resolve_message(args)?;
    println!("🎯 {} destination token(s)", message.tokens.len());

    if args.dry_run {
        println!("{}", serde_json::to_string(&message.to_value())?);
        return Ok(());
    }

    let sender = make_sender()?;
    let result = sender
        .send_multicast(&message)
        .await
        .context("Multicast send failed")?;

    logging::log_send(
        sender.name(),
        message.tokens.len(),
        result.success_count,
        result.failure_count,
    );
    print!("{}", render_summary(&message.tokens, &result));
    Ok(())
}

/// One line per token followed by the aggregate counts
pub fn render_summary(tokens: &[String], result: &SendResult) -> String {
    let mut out = String::new();
    for (index, (token, response)) in tokens.iter().zip(&result.responses).enumerate() {
        let line = match response {
            SendResponse::Delivered { message_id } => {
                format!("{} {}: ok {}\n", index, token, message_id)
            }
            SendResponse::Failed { code, .. } => format!("{} {}: error {}\n", index, token, code),
        };
        out.push_str(&line);
    }
    out.push_str(&format!(
        "success {}, failure {}\n",
        result.success_count, result.failure_count
    ));
    out
}
