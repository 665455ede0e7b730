//! FCM provider: send each token's message through the HTTP v1 `messages:send` API.

use crate::models::{
    MulticastMessage, Payload, SendResponse, SendResult, DEFAULT_FCM_ENDPOINT,
};
use crate::provider::{FcmCredentials, MulticastSender, ProviderError};
use async_trait::async_trait;
use futures_util::future::join_all;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

/// Largest token list accepted for one multicast call
pub const MAX_MULTICAST_TOKENS: usize = 500;

const NETWORK_ERROR_CODE: &str = "app/network-error";
const FCM_ERROR_TYPE: &str = "type.googleapis.com/google.firebase.fcm.v1.FcmError";

/// FCM multicast sender. Never log the access token.
pub struct FcmSender {
    endpoint: String,
    credentials: FcmCredentials,
    client: Arc<Client>,
}

impl FcmSender {
    pub fn new(credentials: FcmCredentials) -> Self {
        Self {
            endpoint: DEFAULT_FCM_ENDPOINT.to_string(),
            credentials,
            client: Arc::new(Client::new()),
        }
    }

    /// Use a different API base URL (emulator, test double)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn send_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/messages:send",
            self.endpoint.trim_end_matches('/'),
            self.credentials.project_id
        )
    }

    fn message_body(payload: &Payload, token: &str) -> Value {
        let mut message = payload.clone();
        message.insert("token".to_string(), Value::String(token.to_string()));
        serde_json::json!({ "message": message })
    }

    async fn send_one(
        &self,
        url: &str,
        access_token: &str,
        payload: &Payload,
        token: &str,
    ) -> SendResponse {
        let body = Self::message_body(payload, token);
        let res = match self
            .client
            .post(url)
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await
        {
            Ok(res) => res,
            Err(e) => {
                return SendResponse::Failed {
                    code: NETWORK_ERROR_CODE.to_string(),
                    message: e.to_string(),
                }
            }
        };

        let status = res.status();
        let text = match res.text().await {
            Ok(text) => text,
            Err(e) => {
                return SendResponse::Failed {
                    code: NETWORK_ERROR_CODE.to_string(),
                    message: format!("failed to read FCM response: {}", e),
                }
            }
        };
        if status.is_success() {
            match serde_json::from_str::<SendSuccessBody>(&text) {
                Ok(body) => SendResponse::Delivered {
                    message_id: body.name,
                },
                Err(e) => SendResponse::Failed {
                    code: "messaging/unknown-error".to_string(),
                    message: format!("unexpected FCM response: {}", e),
                },
            }
        } else {
            classify_error(status.as_u16(), &text)
        }
    }
}

#[async_trait]
impl MulticastSender for FcmSender {
    fn name(&self) -> &str {
        "fcm"
    }

    async fn send_multicast(&self, message: &MulticastMessage) -> Result<SendResult, ProviderError> {
        if message.tokens.is_empty() {
            return Err(ProviderError::InvalidArgument(
                "tokens must be a non-empty array".to_string(),
            ));
        }
        if message.tokens.len() > MAX_MULTICAST_TOKENS {
            return Err(ProviderError::InvalidArgument(format!(
                "tokens list must not contain more than {} items",
                MAX_MULTICAST_TOKENS
            )));
        }

        let access_token = self.credentials.access_token().await?;
        let url = self.send_url();
        let responses = join_all(
            message
                .tokens
                .iter()
                .map(|token| self.send_one(&url, &access_token, &message.payload, token)),
        )
        .await;

        Ok(SendResult::from_responses(responses))
    }
}

// --- error responses ---

#[derive(Deserialize)]
struct SendSuccessBody {
    name: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: RpcStatus,
}

#[derive(Deserialize)]
struct RpcStatus {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    details: Vec<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(rename = "@type", default)]
    type_url: String,
    #[serde(rename = "errorCode", default)]
    error_code: Option<String>,
}

/// Map an FCM error response to a stable `messaging/...` code.
///
/// The FCM-specific `errorCode` detail wins over the generic RPC status, which
/// wins over the HTTP status.
pub(crate) fn classify_error(http_status: u16, body: &str) -> SendResponse {
    let envelope = serde_json::from_str::<ErrorEnvelope>(body).ok();

    let fcm_code = envelope.as_ref().and_then(|env| {
        env.error
            .details
            .iter()
            .filter(|d| d.type_url == FCM_ERROR_TYPE)
            .find_map(|d| d.error_code.as_deref())
            .and_then(code_for_fcm_error)
    });
    let rpc_code = envelope
        .as_ref()
        .and_then(|env| env.error.status.as_deref())
        .and_then(code_for_rpc_status);

    let code = fcm_code
        .or(rpc_code)
        .unwrap_or_else(|| code_for_http_status(http_status));

    let message = match envelope {
        Some(env) if !env.error.message.is_empty() => env.error.message,
        _ => format!("FCM returned HTTP {}", http_status),
    };

    SendResponse::Failed {
        code: code.to_string(),
        message,
    }
}

fn code_for_fcm_error(error_code: &str) -> Option<&'static str> {
    let code = match error_code {
        "APNS_AUTH_ERROR" | "THIRD_PARTY_AUTH_ERROR" => "messaging/third-party-auth-error",
        "INTERNAL" => "messaging/internal-error",
        "INVALID_ARGUMENT" => "messaging/invalid-argument",
        "QUOTA_EXCEEDED" => "messaging/message-rate-exceeded",
        "SENDER_ID_MISMATCH" => "messaging/mismatched-credential",
        "UNAVAILABLE" => "messaging/server-unavailable",
        "UNREGISTERED" => "messaging/registration-token-not-registered",
        "UNSPECIFIED_ERROR" => "messaging/unknown-error",
        _ => return None,
    };
    Some(code)
}

fn code_for_rpc_status(status: &str) -> Option<&'static str> {
    let code = match status {
        "INVALID_ARGUMENT" => "messaging/invalid-argument",
        "NOT_FOUND" => "messaging/registration-token-not-registered",
        "PERMISSION_DENIED" => "messaging/mismatched-credential",
        "UNAUTHENTICATED" => "messaging/authentication-error",
        "RESOURCE_EXHAUSTED" => "messaging/message-rate-exceeded",
        "INTERNAL" => "messaging/internal-error",
        "UNAVAILABLE" => "messaging/server-unavailable",
        _ => return None,
    };
    Some(code)
}

fn code_for_http_status(status: u16) -> &'static str {
    match status {
        400 => "messaging/invalid-argument",
        401 => "messaging/authentication-error",
        403 => "messaging/mismatched-credential",
        404 => "messaging/registration-token-not-registered",
        429 => "messaging/message-rate-exceeded",
        500 => "messaging/internal-error",
        503 => "messaging/server-unavailable",
        _ => "messaging/unknown-error",
    }
}
