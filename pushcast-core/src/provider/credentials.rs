//! Ambient FCM credentials resolved from the environment

use super::oauth::{ServiceAccountKey, ServiceAccountTokens};
use super::ProviderError;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

const PROJECT_ID_VARS: &[&str] = &["FCM_PROJECT_ID", "GOOGLE_CLOUD_PROJECT"];
const ACCESS_TOKEN_VARS: &[&str] = &["FCM_ACCESS_TOKEN", "GOOGLE_OAUTH_ACCESS_TOKEN"];
const SERVICE_ACCOUNT_VAR: &str = "GOOGLE_APPLICATION_CREDENTIALS";

/// Where bearer tokens come from
#[derive(Clone)]
enum AccessToken {
    /// Pre-minted token given explicitly; never refreshed
    Static(String),
    /// Minted from a service-account key and refreshed before expiry
    ServiceAccount(Arc<ServiceAccountTokens>),
}

/// Project id and OAuth bearer token source for the FCM HTTP v1 API
#[derive(Clone)]
pub struct FcmCredentials {
    pub project_id: String,
    token: AccessToken,
}

// Never log the access token.
impl fmt::Debug for FcmCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match &self.token {
            AccessToken::Static(_) => "static <redacted>".to_string(),
            AccessToken::ServiceAccount(tokens) => {
                format!("service account {}", tokens.client_email())
            }
        };
        f.debug_struct("FcmCredentials")
            .field("project_id", &self.project_id)
            .field("access_token", &source)
            .finish()
    }
}

#[derive(Deserialize)]
struct ProjectOnly {
    project_id: Option<String>,
}

impl FcmCredentials {
    /// Credentials with a fixed, pre-minted access token
    pub fn new(project_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            token: AccessToken::Static(access_token.into()),
        }
    }

    /// Credentials minting tokens from a service-account key
    pub fn from_service_account(
        project_id: impl Into<String>,
        tokens: ServiceAccountTokens,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            token: AccessToken::ServiceAccount(Arc::new(tokens)),
        }
    }

    pub fn uses_service_account(&self) -> bool {
        matches!(self.token, AccessToken::ServiceAccount(_))
    }

    /// Bearer token for the next request. Minting failures are call-level
    /// [`ProviderError::Request`] errors.
    pub async fn access_token(&self) -> Result<String, ProviderError> {
        match &self.token {
            AccessToken::Static(token) => Ok(token.clone()),
            AccessToken::ServiceAccount(tokens) => tokens.access_token().await,
        }
    }

    /// Resolve credentials from the process environment.
    ///
    /// `project_override` (from configuration) takes precedence over the
    /// environment.
    pub fn from_env(project_override: Option<&str>) -> Result<Self, ProviderError> {
        Self::from_lookup(|name| std::env::var(name).ok(), project_override)
    }

    /// Resolve credentials through an arbitrary variable lookup.
    ///
    /// Token: `FCM_ACCESS_TOKEN` or `GOOGLE_OAUTH_ACCESS_TOKEN` when set,
    /// otherwise minted from the service-account key named by
    /// `GOOGLE_APPLICATION_CREDENTIALS`. Project id: override, then
    /// `FCM_PROJECT_ID`, `GOOGLE_CLOUD_PROJECT`, then the key's `project_id`.
    pub fn from_lookup<F>(lookup: F, project_override: Option<&str>) -> Result<Self, ProviderError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let first_set = |names: &[&str]| {
            names
                .iter()
                .filter_map(|name| lookup(*name))
                .map(|value| value.trim().to_string())
                .find(|value| !value.is_empty())
        };
        let key_path = lookup(SERVICE_ACCOUNT_VAR)
            .map(|path| path.trim().to_string())
            .filter(|path| !path.is_empty());

        let (token, key_project) = match (first_set(ACCESS_TOKEN_VARS), &key_path) {
            (Some(token), _) => (AccessToken::Static(token), None),
            (None, Some(path)) => {
                let key = ServiceAccountKey::from_file(Path::new(path))?;
                let tokens = ServiceAccountTokens::new(&key)?;
                (
                    AccessToken::ServiceAccount(Arc::new(tokens)),
                    key.project_id.filter(|p| !p.trim().is_empty()),
                )
            }
            (None, None) => {
                return Err(ProviderError::Initialization(format!(
                    "no OAuth access token source; set {} to a service account key, or {}",
                    SERVICE_ACCOUNT_VAR,
                    ACCESS_TOKEN_VARS.join(" / ")
                )))
            }
        };

        let project_id = match project_override.map(str::trim).filter(|p| !p.is_empty()) {
            Some(project) => project.to_string(),
            None => match first_set(PROJECT_ID_VARS).or(key_project) {
                Some(project) => project,
                None => match &key_path {
                    Some(path) => project_from_key_file(Path::new(path))?,
                    None => {
                        return Err(ProviderError::Initialization(format!(
                            "no Firebase project id; set {} or {}",
                            PROJECT_ID_VARS.join("/"),
                            SERVICE_ACCOUNT_VAR
                        )))
                    }
                },
            },
        };

        Ok(Self { project_id, token })
    }
}

fn project_from_key_file(path: &Path) -> Result<String, ProviderError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        ProviderError::Initialization(format!(
            "cannot read service account key {}: {}",
            path.display(),
            e
        ))
    })?;
    let key: ProjectOnly = serde_json::from_str(&content).map_err(|e| {
        ProviderError::Initialization(format!(
            "service account key {} is not valid JSON: {}",
            path.display(),
            e
        ))
    })?;
    key.project_id
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| {
            ProviderError::Initialization(format!(
                "service account key {} has no project_id",
                path.display()
            ))
        })
}
