//! DruidClient against a local axum stand-in for the overlord task API.

use axum::extract::Path;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use repan_druid::{DruidClient, DruidError, IndexingEngine, TaskStatus};

// base64("admin:secret")
const AUTH: &str = "Basic YWRtaW46c2VjcmV0";

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == AUTH)
}

async fn submit(headers: HeaderMap, Json(body): Json<Value>) -> impl IntoResponse {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "unauthorized"})));
    }
    if body["type"] != "index_parallel" {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "unknown task type"})));
    }
    (StatusCode::OK, Json(json!({"task": "index_parallel_Test1_abc"})))
}

async fn status(headers: HeaderMap, Path(id): Path<String>) -> impl IntoResponse {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({})));
    }
    let code = match id.as_str() {
        "done" => "SUCCESS",
        "bad" => "FAILED",
        "odd" => return (StatusCode::OK, Json(json!({"task": &id}))),
        "boom" => return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({}))),
        _ => "RUNNING",
    };
    (
        StatusCode::OK,
        Json(json!({"task": &id, "status": {"id": &id, "statusCode": code, "status": code}})),
    )
}

async fn serve() -> String {
    let app = Router::new()
        .route("/druid/indexer/v1/task", post(submit))
        .route("/druid/indexer/v1/task/{id}/status", get(status));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/")
}

fn client(base: &str) -> DruidClient {
    DruidClient::new(base, "admin", Some("secret".to_string()))
}

#[tokio::test]
async fn submit_returns_task_id() {
    let base = serve().await;
    let id = client(&base)
        .submit_task(&json!({"type": "index_parallel", "spec": {}}))
        .await
        .unwrap();
    assert_eq!(id, "index_parallel_Test1_abc");
}

#[tokio::test]
async fn rejected_submission_carries_status_and_body() {
    let base = serve().await;
    let err = client(&base)
        .submit_task(&json!({"type": "compact"}))
        .await
        .unwrap_err();
    match err {
        DruidError::Status { status, body } => {
            assert_eq!(status, 400);
            assert!(body.contains("unknown task type"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn wrong_credentials_are_rejected() {
    let base = serve().await;
    let err = DruidClient::new(&base, "admin", Some("nope".to_string()))
        .submit_task(&json!({"type": "index_parallel"}))
        .await
        .unwrap_err();
    assert!(matches!(err, DruidError::Status { status: 401, .. }));
}

#[tokio::test]
async fn status_codes_are_mapped() {
    let base = serve().await;
    let client = client(&base);

    assert_eq!(client.task_status("done").await.unwrap(), TaskStatus::Success);
    assert_eq!(client.task_status("bad").await.unwrap(), TaskStatus::Failed);
    assert_eq!(
        client.task_status("t-1").await.unwrap(),
        TaskStatus::InProgress("RUNNING".to_string())
    );
}

#[tokio::test]
async fn status_errors_surface_as_transport_errors() {
    let base = serve().await;
    let client = client(&base);

    assert!(matches!(
        client.task_status("boom").await,
        Err(DruidError::Status { status: 500, .. })
    ));
    assert!(matches!(
        client.task_status("odd").await,
        Err(DruidError::Malformed(_))
    ));
}

#[tokio::test]
async fn unreachable_engine_is_http_error() {
    // Bind then drop to get a port with nothing listening.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(&format!("http://{addr}"))
        .task_status("t-1")
        .await
        .unwrap_err();
    assert!(matches!(err, DruidError::Http(_)));
}
