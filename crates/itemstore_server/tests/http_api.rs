use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::Json;
use itemstore_core::{DatabaseConfig, ItemError, ItemFacade, ServiceConfig, StorageMode};
use itemstore_server::api::{
    handle_create_item, handle_delete_item, handle_get_item, handle_health, handle_list_items,
    ApiError, CreateItemRequest, DeleteItemResponse, ErrorBody,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

fn facade_at(dir: &tempfile::TempDir, reachable: bool) -> Arc<ItemFacade> {
    let path = if reachable {
        dir.path().join("items.db")
    } else {
        dir.path().join("missing").join("items.db")
    };
    let mut database = DatabaseConfig::at(path);
    database.startup_retries = 1;
    database.startup_retry_delay = Duration::ZERO;

    let config = ServiceConfig {
        database,
        environment: "test".to_string(),
        ..ServiceConfig::default()
    };
    Arc::new(ItemFacade::bootstrap(&config))
}

fn create_request(name: Option<&str>, description: Option<&str>) -> CreateItemRequest {
    CreateItemRequest {
        name: name.map(str::to_string),
        description: description.map(str::to_string),
    }
}

#[tokio::test]
async fn create_get_delete_flow_matches_in_both_modes() {
    for reachable in [true, false] {
        let dir = tempfile::tempdir().unwrap();
        let facade = facade_at(&dir, reachable);

        let (status, Json(created)) = handle_create_item(
            Extension(Arc::clone(&facade)),
            Ok(Json(create_request(Some("Widget"), Some("blue")))),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created.id, 1);
        assert_eq!(created.name, "Widget");
        assert_eq!(created.description.as_deref(), Some("blue"));

        let (status, Json(loaded)) =
            handle_get_item(Extension(Arc::clone(&facade)), Path("1".to_string()))
                .await
                .unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(loaded, created);

        let (status, Json(deleted)) =
            handle_delete_item(Extension(Arc::clone(&facade)), Path("1".to_string()))
                .await
                .unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(deleted.id, 1);
        assert_eq!(deleted.message, "Item deleted");

        let err = handle_get_item(Extension(Arc::clone(&facade)), Path("1".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::NotFound);
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn create_rejects_missing_or_blank_name() {
    let dir = tempfile::tempdir().unwrap();
    let facade = facade_at(&dir, false);

    for request in [create_request(None, Some("d")), create_request(Some("  "), None)] {
        let err = handle_create_item(Extension(Arc::clone(&facade)), Ok(Json(request)))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    let (_, Json(items)) = handle_list_items(Extension(facade)).await.unwrap();
    assert!(items.is_empty());
}

#[tokio::test]
async fn malformed_ids_are_bad_requests() {
    let dir = tempfile::tempdir().unwrap();
    let facade = facade_at(&dir, true);

    let err = handle_get_item(Extension(Arc::clone(&facade)), Path("abc".to_string()))
        .await
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);

    let err = handle_delete_item(Extension(facade), Path("1.5".to_string()))
        .await
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_reports_storage_mode() {
    let dir = tempfile::tempdir().unwrap();

    let (status, Json(report)) = handle_health(Extension(facade_at(&dir, true)))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report.storage_mode, StorageMode::Database);
    assert_eq!(report.environment, "test");

    let (_, Json(report)) = handle_health(Extension(facade_at(&dir, false)))
        .await
        .unwrap();
    assert_eq!(report.storage_mode, StorageMode::InMemory);
}

#[test]
fn response_envelopes_serialize_to_documented_shape() {
    let deleted = serde_json::to_value(DeleteItemResponse {
        message: "Item deleted".to_string(),
        id: 7,
    })
    .unwrap();
    assert_eq!(deleted, serde_json::json!({"message": "Item deleted", "id": 7}));

    let error = serde_json::to_value(ErrorBody {
        detail: "Item not found".to_string(),
    })
    .unwrap();
    assert_eq!(error, serde_json::json!({"detail": "Item not found"}));
}

#[test]
fn exhausted_ids_map_to_conflict() {
    let err = ApiError::from(ItemError::IdSpaceExhausted);
    assert_eq!(err.status(), StatusCode::CONFLICT);
    assert!(err.detail().contains("exhausted"));
}

#[tokio::test]
async fn router_allows_cross_origin_requests() {
    let dir = tempfile::tempdir().unwrap();
    let facade = facade_at(&dir, false);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(itemstore_server::serve(listener, facade, async move {
        let _ = stop_rx.await;
    }));

    let preflight = send_raw(
        addr,
        "OPTIONS",
        "/items",
        &[
            "Origin: http://frontend.test",
            "Access-Control-Request-Method: POST",
            "Access-Control-Request-Headers: content-type",
        ],
        "",
    )
    .await
    .to_ascii_lowercase();
    assert!(preflight.starts_with("http/1.1 200"), "{preflight}");
    assert!(preflight.contains("access-control-allow-origin: http://frontend.test"));
    assert!(preflight.contains("access-control-allow-credentials: true"));
    assert!(preflight.contains("access-control-allow-methods: post"));
    assert!(preflight.contains("access-control-allow-headers: content-type"));

    let listed = send_raw(addr, "GET", "/items", &["Origin: http://frontend.test"], "")
        .await
        .to_ascii_lowercase();
    assert!(listed.starts_with("http/1.1 200"), "{listed}");
    assert!(listed.contains("access-control-allow-origin: http://frontend.test"));
    assert!(listed.contains("access-control-allow-credentials: true"));

    stop_tx.send(()).unwrap();
    server.await.unwrap().unwrap();
}

#[tokio::test]
async fn router_serves_items_over_http() {
    let dir = tempfile::tempdir().unwrap();
    let facade = facade_at(&dir, false);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(itemstore_server::serve(listener, facade, async move {
        let _ = stop_rx.await;
    }));

    let (status, body) = send(
        addr,
        "POST",
        "/items",
        Some(r#"{"id":99,"name":"Widget","description":"blue","created_at":null}"#),
    )
    .await;
    assert_eq!(status, 201);
    assert_eq!(body["id"], 1);
    assert_eq!(body["name"], "Widget");
    assert_eq!(body["description"], "blue");
    assert!(body["created_at"].is_string());

    let (status, listed) = send(addr, "GET", "/items", None).await;
    assert_eq!(status, 200);
    assert_eq!(listed, Value::Array(vec![body.clone()]));

    let (status, fetched) = send(addr, "GET", "/items/1", None).await;
    assert_eq!(status, 200);
    assert_eq!(fetched, body);

    let (status, deleted) = send(addr, "DELETE", "/items/1", None).await;
    assert_eq!(status, 200);
    assert_eq!(deleted["id"], 1);

    let (status, missing) = send(addr, "GET", "/items/1", None).await;
    assert_eq!(status, 404);
    assert_eq!(missing["detail"], "Item not found");

    let (status, _) = send(addr, "POST", "/items", Some("{not json")).await;
    assert_eq!(status, 400);

    let (status, health) = send(addr, "GET", "/health", None).await;
    assert_eq!(status, 200);
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["database"], "disconnected");
    assert_eq!(health["storage_mode"], "in-memory");
    assert_eq!(health["environment"], "test");

    stop_tx.send(()).unwrap();
    server.await.unwrap().unwrap();
}

async fn send(
    addr: std::net::SocketAddr,
    method: &str,
    path: &str,
    body: Option<&str>,
) -> (u16, Value) {
    let raw = send_raw(
        addr,
        method,
        path,
        &["Content-Type: application/json"],
        body.unwrap_or(""),
    )
    .await;

    let status = raw
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .unwrap();
    let payload = raw
        .split_once("\r\n\r\n")
        .map(|(_, payload)| payload)
        .unwrap_or("");
    let json = serde_json::from_str(payload).unwrap_or(Value::Null);
    (status, json)
}

async fn send_raw(
    addr: std::net::SocketAddr,
    method: &str,
    path: &str,
    headers: &[&str],
    body: &str,
) -> String {
    let mut request = format!("{method} {path} HTTP/1.1\r\nHost: {addr}\r\n");
    for header in headers {
        request.push_str(header);
        request.push_str("\r\n");
    }
    request.push_str(&format!(
        "Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    ));

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    String::from_utf8(raw).unwrap()
}
