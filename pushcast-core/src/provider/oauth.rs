//! OAuth access tokens minted from a Google service-account key.
//!
//! The key signs a short-lived JWT assertion which is exchanged at the key's
//! `token_uri` for a bearer token. Tokens are cached and refreshed shortly
//! before they expire, so a long-running server keeps sending.

use super::ProviderError;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;

/// OAuth scope required by the FCM HTTP v1 API
pub const FCM_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: u64 = 3600;
const REFRESH_MARGIN: Duration = Duration::from_secs(300);

/// The fields of a service-account key file that matter here
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub token_uri: Option<String>,
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("project_id", &self.project_id)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountKey {
    pub fn from_json(content: &str) -> Result<Self, ProviderError> {
        serde_json::from_str(content).map_err(|e| {
            ProviderError::Initialization(format!("service account key is not valid: {}", e))
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, ProviderError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ProviderError::Initialization(format!(
                "cannot read service account key {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&content).map_err(|e| match e {
            ProviderError::Initialization(msg) => {
                ProviderError::Initialization(format!("{} ({})", msg, path.display()))
            }
            other => other,
        })
    }
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: u64,
    exp: u64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    ASSERTION_LIFETIME_SECS
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Refreshing token source backed by a service-account key
pub struct ServiceAccountTokens {
    client_email: String,
    token_uri: String,
    signing_key: EncodingKey,
    client: Client,
    cached: Mutex<Option<CachedToken>>,
}

impl fmt::Debug for ServiceAccountTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountTokens")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountTokens {
    /// Fails if the key's private key is not a usable RSA PEM.
    pub fn new(key: &ServiceAccountKey) -> Result<Self, ProviderError> {
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes()).map_err(|e| {
            ProviderError::Initialization(format!(
                "service account private key is not a valid RSA key: {}",
                e
            ))
        })?;

        Ok(Self {
            client_email: key.client_email.clone(),
            token_uri: key
                .token_uri
                .clone()
                .filter(|uri| !uri.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string()),
            signing_key,
            client: Client::new(),
            cached: Mutex::new(None),
        })
    }

    pub fn client_email(&self) -> &str {
        &self.client_email
    }

    /// Current bearer token, minting a new one when the cached token is
    /// missing or about to expire.
    pub async fn access_token(&self) -> Result<String, ProviderError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() + REFRESH_MARGIN < token.expires_at {
                return Ok(token.value.clone());
            }
        }

        let fresh = self.fetch().await?;
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }

    fn assertion(&self, now: u64) -> Result<String, ProviderError> {
        let claims = AssertionClaims {
            iss: &self.client_email,
            scope: FCM_SCOPE,
            aud: &self.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };
        encode(&Header::new(Algorithm::RS256), &claims, &self.signing_key)
            .map_err(|e| ProviderError::Request(format!("failed to sign token assertion: {}", e)))
    }

    async fn fetch(&self) -> Result<CachedToken, ProviderError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| ProviderError::Request(format!("system clock error: {}", e)))?
            .as_secs();
        let assertion = self.assertion(now)?;

        let requested_at = Instant::now();
        let res = self
            .client
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| ProviderError::Request(format!("OAuth token request failed: {}", e)))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| ProviderError::Request(format!("OAuth token response unreadable: {}", e)))?;
        if !status.is_success() {
            return Err(ProviderError::Request(format!(
                "OAuth token endpoint returned HTTP {}: {}",
                status.as_u16(),
                body
            )));
        }

        let token: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            ProviderError::Request(format!("unexpected OAuth token response: {}", e))
        })?;
        tracing::debug!(
            client_email = %self.client_email,
            expires_in = token.expires_in,
            "Minted OAuth access token"
        );

        Ok(CachedToken {
            value: token.access_token,
            expires_at: requested_at + Duration::from_secs(token.expires_in),
        })
    }
}
