//! Message data structures exchanged with the messaging provider

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Provider-specific message fields (`notification`, `data`, `android`, ...)
pub type Payload = Map<String, Value>;

/// One message addressed to many device tokens.
///
/// The payload fields are copied into every per-token message. A `tokens` key
/// inside the payload is dropped: the explicit token list always wins, so
/// per-token results can be correlated with it by index.
#[derive(Debug, Clone, PartialEq)]
pub struct MulticastMessage {
    pub tokens: Vec<String>,
    pub payload: Payload,
}

impl MulticastMessage {
    /// Combine a token list and payload fields into a multicast message
    pub fn new(tokens: Vec<String>, mut payload: Payload) -> Self {
        if payload.remove("tokens").is_some() {
            tracing::debug!("Ignoring `tokens` key inside payload");
        }
        Self { tokens, payload }
    }

    /// The combined `{...payload, tokens}` object, as handed to the provider
    pub fn to_value(&self) -> Value {
        let mut combined = self.payload.clone();
        combined.insert(
            "tokens".to_string(),
            Value::Array(self.tokens.iter().cloned().map(Value::String).collect()),
        );
        Value::Object(combined)
    }
}

/// Outcome of delivering to a single token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum SendResponse {
    /// Accepted by the provider
    #[serde(rename_all = "camelCase")]
    Delivered { message_id: String },
    /// Rejected for this token; `code` is a stable provider error code
    Failed { code: String, message: String },
}

impl SendResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, SendResponse::Delivered { .. })
    }

    /// Error code for failed deliveries
    pub fn error_code(&self) -> Option<&str> {
        match self {
            SendResponse::Delivered { .. } => None,
            SendResponse::Failed { code, .. } => Some(code),
        }
    }
}

/// Summary of one multicast send. `responses` is index-aligned with the
/// message's token list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResult {
    pub success_count: usize,
    pub failure_count: usize,
    pub responses: Vec<SendResponse>,
}

impl SendResult {
    /// Build a result, deriving the counts from the per-token responses
    pub fn from_responses(responses: Vec<SendResponse>) -> Self {
        let success_count = responses.iter().filter(|r| r.is_success()).count();
        Self {
            success_count,
            failure_count: responses.len() - success_count,
            responses,
        }
    }

    /// Failed tokens with their error codes, correlated by index with `tokens`
    pub fn failures(&self, tokens: &[String]) -> Vec<TokenFailure> {
        self.responses
            .iter()
            .zip(tokens)
            .filter_map(|(response, token)| {
                response.error_code().map(|code| TokenFailure {
                    token: token.clone(),
                    error: code.to_string(),
                })
            })
            .collect()
    }
}

/// A token the provider refused, with its error code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenFailure {
    pub token: String,
    pub error: String,
}
