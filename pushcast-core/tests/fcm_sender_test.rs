//! Integration test: FcmSender against an in-process stand-in for the FCM HTTP v1 API.

use pushcast_core::models::{MulticastMessage, Payload, SendResponse};
use pushcast_core::provider::{
    FcmCredentials, FcmSender, MulticastSender, ProviderError, ServiceAccountKey,
    ServiceAccountTokens,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use warp::http::StatusCode;
use warp::Filter;

const ACCESS_TOKEN: &str = "test-access-token";
const TEST_KEY: &str = include_str!("fixtures/test_service_account_key.pem");

struct FakeFcm {
    addr: SocketAddr,
    received: Arc<RwLock<Vec<Value>>>,
    token_requests: Arc<AtomicUsize>,
}

/// Start a fake FCM endpoint plus an OAuth token endpoint at `/token`.
/// Tokens starting with "stale" are unregistered, "bad" are invalid, anything
/// else is accepted. Every send body is recorded.
async fn start_fake_fcm() -> FakeFcm {
    let received = Arc::new(RwLock::new(Vec::new()));
    let received_filter = {
        let received = Arc::clone(&received);
        warp::any().map(move || Arc::clone(&received))
    };
    let token_requests = Arc::new(AtomicUsize::new(0));
    let token_counter = Arc::clone(&token_requests);

    let oauth = warp::path!("token")
        .and(warp::post())
        .and(warp::body::form())
        .map(move |form: HashMap<String, String>| {
            token_counter.fetch_add(1, Ordering::SeqCst);
            let grant_ok = form.get("grant_type").map(String::as_str)
                == Some("urn:ietf:params:oauth:grant-type:jwt-bearer");
            let jwt_ok = form
                .get("assertion")
                .map(|jwt| jwt.split('.').count() == 3)
                .unwrap_or(false);
            if grant_ok && jwt_ok {
                warp::reply::with_status(
                    warp::reply::json(&json!({
                        "access_token": ACCESS_TOKEN,
                        "expires_in": 3599,
                        "token_type": "Bearer"
                    })),
                    StatusCode::OK,
                )
            } else {
                warp::reply::with_status(
                    warp::reply::json(&json!({"error": "invalid_grant"})),
                    StatusCode::BAD_REQUEST,
                )
            }
        });

    let send = warp::path!("v1" / "projects" / String / "messages:send")
        .and(warp::post())
        .and(warp::header::<String>("authorization"))
        .and(warp::body::json())
        .and(received_filter)
        .and_then(
            |project: String,
             authorization: String,
             body: Value,
             received: Arc<RwLock<Vec<Value>>>| async move {
                received.write().await.push(body.clone());

                if authorization != format!("Bearer {}", ACCESS_TOKEN) {
                    return Ok::<_, warp::Rejection>(warp::reply::with_status(
                        warp::reply::json(&json!({"error": {
                            "code": 401,
                            "message": "Request had invalid authentication credentials.",
                            "status": "UNAUTHENTICATED"
                        }})),
                        StatusCode::UNAUTHORIZED,
                    ));
                }

                let token = body["message"]["token"].as_str().unwrap_or_default();
                let reply = if token.starts_with("stale") {
                    warp::reply::with_status(
                        warp::reply::json(&json!({"error": {
                            "code": 404,
                            "message": "Requested entity was not found.",
                            "status": "NOT_FOUND",
                            "details": [{
                                "@type": "type.googleapis.com/google.firebase.fcm.v1.FcmError",
                                "errorCode": "UNREGISTERED"
                            }]
                        }})),
                        StatusCode::NOT_FOUND,
                    )
                } else if token.starts_with("bad") {
                    warp::reply::with_status(
                        warp::reply::json(&json!({"error": {
                            "code": 400,
                            "message": "The registration token is not a valid FCM registration token",
                            "status": "INVALID_ARGUMENT",
                            "details": [{
                                "@type": "type.googleapis.com/google.firebase.fcm.v1.FcmError",
                                "errorCode": "INVALID_ARGUMENT"
                            }]
                        }})),
                        StatusCode::BAD_REQUEST,
                    )
                } else {
                    warp::reply::with_status(
                        warp::reply::json(&json!({
                            "name": format!("projects/{}/messages/{}", project, token)
                        })),
                        StatusCode::OK,
                    )
                };
                Ok(reply)
            },
        );

    let (addr, server) = warp::serve(send.or(oauth)).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    FakeFcm {
        addr,
        received,
        token_requests,
    }
}

fn payload(value: Value) -> Payload {
    value.as_object().cloned().expect("payload object")
}

#[tokio::test]
async fn test_multicast_reports_each_token_in_order() {
    let fake = start_fake_fcm().await;
    let sender = FcmSender::new(FcmCredentials::new("demo-project", ACCESS_TOKEN))
        .with_endpoint(format!("http://{}", fake.addr));

    let message = MulticastMessage::new(
        vec![
            "good-1".to_string(),
            "stale-1".to_string(),
            "bad-1".to_string(),
            "good-2".to_string(),
        ],
        payload(json!({
            "notification": {"title": "Hello", "body": "World"},
            "data": {"k": "v"}
        })),
    );

    let result = sender.send_multicast(&message).await.unwrap();

    assert_eq!(result.success_count, 2);
    assert_eq!(result.failure_count, 2);
    assert_eq!(
        result.responses[0],
        SendResponse::Delivered {
            message_id: "projects/demo-project/messages/good-1".to_string()
        }
    );
    assert_eq!(
        result.responses[1].error_code(),
        Some("messaging/registration-token-not-registered")
    );
    assert_eq!(
        result.responses[2].error_code(),
        Some("messaging/invalid-argument")
    );
    assert!(result.responses[3].is_success());

    let failures = result.failures(&message.tokens);
    assert_eq!(failures.len(), 2);
    assert_eq!(failures[0].token, "stale-1");
    assert_eq!(failures[1].token, "bad-1");

    // One request per token, each carrying the payload plus its own token
    let received = fake.received.read().await;
    assert_eq!(received.len(), 4);
    let first = received
        .iter()
        .find(|body| body["message"]["token"] == "good-1")
        .expect("request for good-1");
    assert_eq!(
        first["message"],
        json!({
            "notification": {"title": "Hello", "body": "World"},
            "data": {"k": "v"},
            "token": "good-1"
        })
    );
}

#[tokio::test]
async fn test_bad_credentials_fail_per_token() {
    let fake = start_fake_fcm().await;
    let sender = FcmSender::new(FcmCredentials::new("demo-project", "wrong-token"))
        .with_endpoint(format!("http://{}/", fake.addr));

    let message = MulticastMessage::new(vec!["good-1".to_string()], Payload::new());
    let result = sender.send_multicast(&message).await.unwrap();

    assert_eq!(result.success_count, 0);
    assert_eq!(result.failure_count, 1);
    assert_eq!(
        result.responses[0].error_code(),
        Some("messaging/authentication-error")
    );
}

#[tokio::test]
async fn test_unreachable_endpoint_is_network_error() {
    // Bind and immediately drop a listener to get a port nothing listens on
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let sender = FcmSender::new(FcmCredentials::new("demo-project", ACCESS_TOKEN))
        .with_endpoint(format!("http://127.0.0.1:{}", port));

    let message = MulticastMessage::new(vec!["a".to_string(), "b".to_string()], Payload::new());
    let result = sender.send_multicast(&message).await.unwrap();

    assert_eq!(result.failure_count, 2);
    assert!(result
        .responses
        .iter()
        .all(|r| r.error_code() == Some("app/network-error")));
}

fn service_account_credentials(token_uri: &str) -> FcmCredentials {
    let key = ServiceAccountKey::from_json(
        &json!({
            "type": "service_account",
            "project_id": "demo-project",
            "client_email": "pushcast@demo-project.iam.gserviceaccount.com",
            "private_key": TEST_KEY,
            "token_uri": token_uri,
        })
        .to_string(),
    )
    .unwrap();
    FcmCredentials::from_service_account("demo-project", ServiceAccountTokens::new(&key).unwrap())
}

#[tokio::test]
async fn test_service_account_token_is_minted_and_reused() {
    let fake = start_fake_fcm().await;
    let credentials = service_account_credentials(&format!("http://{}/token", fake.addr));
    let sender = FcmSender::new(credentials).with_endpoint(format!("http://{}", fake.addr));

    let message = MulticastMessage::new(
        vec!["good-1".to_string(), "good-2".to_string()],
        Payload::new(),
    );
    let first = sender.send_multicast(&message).await.unwrap();
    let second = sender.send_multicast(&message).await.unwrap();

    // The fake FCM only accepts the minted bearer token
    assert_eq!(first.success_count, 2);
    assert_eq!(second.success_count, 2);
    assert_eq!(fake.token_requests.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_token_endpoint_failure_aborts_the_call() {
    let fake = start_fake_fcm().await;
    let credentials = service_account_credentials(&format!("http://{}/no-such-path", fake.addr));
    let sender = FcmSender::new(credentials).with_endpoint(format!("http://{}", fake.addr));

    let message = MulticastMessage::new(vec!["good-1".to_string()], Payload::new());
    assert!(matches!(
        sender.send_multicast(&message).await,
        Err(ProviderError::Request(_))
    ));
    assert!(fake.received.read().await.is_empty());
}

#[tokio::test]
async fn test_truncated_response_body_is_network_error() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::time::{timeout, Duration};

    // Headers promise more body than is ever written
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 4096];
        while let Ok(Ok(n)) = timeout(Duration::from_millis(100), socket.read(&mut buf)).await {
            if n == 0 {
                break;
            }
        }
        socket
            .write_all(b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 100\r\n\r\n{\"na")
            .await
            .unwrap();
        socket.shutdown().await.unwrap();
    });

    let sender = FcmSender::new(FcmCredentials::new("demo-project", ACCESS_TOKEN))
        .with_endpoint(format!("http://{}", addr));
    let message = MulticastMessage::new(vec!["good-1".to_string()], Payload::new());
    let result = sender.send_multicast(&message).await.unwrap();

    assert_eq!(result.failure_count, 1);
    assert_eq!(result.responses[0].error_code(), Some("app/network-error"));
}
