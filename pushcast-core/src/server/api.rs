//! HTTP API for the web UI: send, save, load and list

use crate::models::{MulticastMessage, Template, TemplateData, TokenFailure};
use crate::provider::MulticastSender;
use crate::services::logging;
use crate::store::{validate_template_name, StoreError, TemplateStore};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::Filter;

/// Largest accepted JSON request body
pub const MAX_BODY_BYTES: u64 = 1024 * 1024;

/// Request body for POST /send
#[derive(Debug, Clone, Deserialize)]
pub struct SendRequest {
    pub tokens: Option<Vec<String>>,
    pub payload: Option<Value>,
}

/// Request body for POST /save
#[derive(Debug, Clone, Deserialize)]
pub struct SaveRequest {
    pub name: Option<String>,
    pub tokens: Option<Vec<String>>,
    pub payload: Option<Value>,
}

impl SaveRequest {
    /// All three fields present and a non-blank name
    fn into_template(self) -> Option<Template> {
        match (self.name, self.tokens, self.payload) {
            (Some(name), Some(tokens), Some(payload)) if !name.trim().is_empty() => {
                Some(Template {
                    name,
                    data: TemplateData { tokens, payload },
                })
            }
            _ => None,
        }
    }
}

/// Query parameters for GET /load
#[derive(Debug, Deserialize)]
pub struct LoadQuery {
    pub name: Option<String>,
}

/// API response for a multicast send
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResponseBody {
    pub success: bool,
    pub success_count: usize,
    pub failure_count: usize,
    pub errors: Vec<TokenFailure>,
}

/// API response for a saved template
#[derive(Debug, Clone, Serialize)]
pub struct SaveResponse {
    pub success: bool,
    pub message: String,
}

/// API response for a loaded template
#[derive(Debug, Clone, Serialize)]
pub struct LoadResponse {
    pub success: bool,
    pub data: TemplateData,
}

/// API response for the template list
#[derive(Debug, Clone, Serialize)]
pub struct ListResponse {
    pub success: bool,
    pub names: Vec<String>,
}

/// Error body shared by every endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

type JsonReply = warp::reply::WithStatus<warp::reply::Json>;

fn json_reply<T: Serialize>(body: &T, status: StatusCode) -> JsonReply {
    warp::reply::with_status(warp::reply::json(body), status)
}

pub(crate) fn error_reply(status: StatusCode, message: impl Into<String>) -> JsonReply {
    json_reply(
        &ErrorResponse {
            success: false,
            error: message.into(),
        },
        status,
    )
}

/// Create HTTP API routes
pub fn create_api_routes(
    sender: Arc<dyn MulticastSender>,
    store: Arc<dyn TemplateStore>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let sender_filter = warp::any().map(move || Arc::clone(&sender));
    let store_filter = warp::any().map(move || Arc::clone(&store));

    // POST /send - Multicast a payload to a list of tokens
    let post_send = warp::path!("send")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json())
        .and(sender_filter)
        .and_then(handle_send);

    // POST /save - Store tokens + payload under a name
    let post_save = warp::path!("save")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json())
        .and(store_filter.clone())
        .and_then(handle_save);

    // GET /load?name= - Fetch a saved template
    let get_load = warp::path!("load")
        .and(warp::get())
        .and(warp::query::<LoadQuery>())
        .and(store_filter.clone())
        .and_then(handle_load);

    // GET /list - Names of all saved templates
    let get_list = warp::path!("list")
        .and(warp::get())
        .and(store_filter)
        .and_then(handle_list);

    post_send.or(post_save).or(get_load).or(get_list)
}

/// Run a blocking store operation off the async executor
async fn run_store<T, F>(store: Arc<dyn TemplateStore>, op: F) -> Result<T, StoreError>
where
    T: Send + 'static,
    F: FnOnce(&dyn TemplateStore) -> Result<T, StoreError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || op(store.as_ref()))
        .await
        .map_err(|e| StoreError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?
}

/// Handle POST /send
async fn handle_send(
    request: SendRequest,
    sender: Arc<dyn MulticastSender>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let tokens = match request.tokens {
        Some(tokens) if !tokens.is_empty() => tokens,
        _ => {
            return Ok(error_reply(
                StatusCode::BAD_REQUEST,
                "A non-empty tokens array and a payload are required",
            ))
        }
    };
    let payload = match request.payload {
        Some(Value::Object(payload)) => payload,
        Some(other) => {
            return Ok(error_reply(
                StatusCode::BAD_REQUEST,
                format!(
                    "payload must be a JSON object, got {}",
                    crate::payload::json_kind(&other)
                ),
            ))
        }
        None => {
            return Ok(error_reply(
                StatusCode::BAD_REQUEST,
                "A non-empty tokens array and a payload are required",
            ))
        }
    };

    let message = MulticastMessage::new(tokens, payload);
    match sender.send_multicast(&message).await {
        Ok(result) => {
            logging::log_send(
                sender.name(),
                message.tokens.len(),
                result.success_count,
                result.failure_count,
            );
            let response = SendResponseBody {
                success: true,
                success_count: result.success_count,
                failure_count: result.failure_count,
                errors: result.failures(&message.tokens),
            };
            Ok(json_reply(&response, StatusCode::OK))
        }
        Err(e) => {
            logging::log_error(&e.to_string(), Some("multicast send"));
            Ok(error_reply(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

/// Handle POST /save
async fn handle_save(
    request: SaveRequest,
    store: Arc<dyn TemplateStore>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let template = match request.into_template() {
        Some(template) => template,
        None => {
            return Ok(error_reply(
                StatusCode::BAD_REQUEST,
                "name, tokens and payload are all required",
            ))
        }
    };
    if let Err(e) = validate_template_name(&template.name) {
        return Ok(error_reply(StatusCode::BAD_REQUEST, e.to_string()));
    }
    // Same payload rule as /send, so a saved template can always be sent
    if !template.data.payload.is_object() {
        return Ok(error_reply(
            StatusCode::BAD_REQUEST,
            format!(
                "payload must be a JSON object, got {}",
                crate::payload::json_kind(&template.data.payload)
            ),
        ));
    }

    let name = template.name.clone();
    let result = run_store(store, move |store| {
        store.put(&template.name, &template.data)
    })
    .await;

    match result {
        Ok(()) => {
            logging::log_template_event("save", &name);
            let response = SaveResponse {
                success: true,
                message: format!("Saved template \"{}\"", name),
            };
            Ok(json_reply(&response, StatusCode::OK))
        }
        Err(StoreError::InvalidName(e)) => Ok(error_reply(StatusCode::BAD_REQUEST, e.to_string())),
        Err(e) => {
            logging::log_error(&e.to_string(), Some("template save"));
            Ok(error_reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to save the template",
            ))
        }
    }
}

/// Handle GET /load
async fn handle_load(
    query: LoadQuery,
    store: Arc<dyn TemplateStore>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let name = match query.name {
        Some(name) if !name.is_empty() => name,
        _ => {
            return Ok(error_reply(
                StatusCode::BAD_REQUEST,
                "Template name is required",
            ))
        }
    };
    if let Err(e) = validate_template_name(&name) {
        return Ok(error_reply(StatusCode::BAD_REQUEST, e.to_string()));
    }

    let lookup = name.clone();
    match run_store(store, move |store| store.get(&lookup)).await {
        Ok(Some(data)) => {
            logging::log_template_event("load", &name);
            Ok(json_reply(
                &LoadResponse {
                    success: true,
                    data,
                },
                StatusCode::OK,
            ))
        }
        Ok(None) => Ok(error_reply(
            StatusCode::NOT_FOUND,
            format!("Template \"{}\" not found", name),
        )),
        Err(StoreError::InvalidName(e)) => Ok(error_reply(StatusCode::BAD_REQUEST, e.to_string())),
        Err(e) => {
            logging::log_error(&e.to_string(), Some("template load"));
            Ok(error_reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load the template",
            ))
        }
    }
}

/// Handle GET /list
async fn handle_list(store: Arc<dyn TemplateStore>) -> Result<impl warp::Reply, warp::Rejection> {
    match run_store(store, |store| store.list()).await {
        Ok(names) => Ok(json_reply(
            &ListResponse {
                success: true,
                names,
            },
            StatusCode::OK,
        )),
        Err(e) => {
            logging::log_error(&e.to_string(), Some("template list"));
            Ok(error_reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to list saved templates",
            ))
        }
    }
}
