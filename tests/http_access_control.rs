//! Authentication and HTTP-level routing

mod test_helpers;

use std::sync::Arc;

use a2a_actions::CardConfig;
use a2a_http_server::A2aHttpServer;
use hyper::header::{ACCESS_CONTROL_ALLOW_ORIGIN, WWW_AUTHENTICATE};
use hyper::{Method, StatusCode};
use serde_json::json;
use test_helpers::*;

async fn get(server: &A2aHttpServer, path: &str, credentials: Option<&str>) -> (StatusCode, String) {
    let response = server
        .handler()
        .handle(request(Method::GET, path, credentials, ""))
        .await;
    let status = response.status();
    let body = String::from_utf8(body_bytes(response).await.to_vec()).unwrap();
    (status, body)
}

#[tokio::test]
async fn public_content_is_open() {
    let server = server();
    for credentials in [ANONYMOUS, USER, ADMIN] {
        assert_eq!(
            get(&server, "/public", credentials).await,
            (StatusCode::OK, "Public content".to_string())
        );
    }
}

#[tokio::test]
async fn secured_content_requires_user_role() {
    let server = server();
    assert_eq!(get(&server, "/secured", ANONYMOUS).await.0, StatusCode::UNAUTHORIZED);
    assert_eq!(
        get(&server, "/secured", USER).await,
        (StatusCode::OK, "Secured content".to_string())
    );
    assert_eq!(get(&server, "/secured", ADMIN).await.0, StatusCode::OK);
}

#[tokio::test]
async fn admin_content_requires_admin_role() {
    let server = server();
    assert_eq!(get(&server, "/admin", ANONYMOUS).await.0, StatusCode::UNAUTHORIZED);
    assert_eq!(get(&server, "/admin", USER).await.0, StatusCode::FORBIDDEN);
    assert_eq!(
        get(&server, "/admin", ADMIN).await,
        (StatusCode::OK, "Admin content".to_string())
    );
}

#[tokio::test]
async fn bad_credentials_get_a_challenge() {
    let server = server();
    let response = server
        .handler()
        .handle(request(
            Method::POST,
            "/",
            Some("admin:wrong"),
            call(1, "echo", json!(["hi"])).to_string(),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get(WWW_AUTHENTICATE).unwrap(),
        "Basic realm=\"integration\""
    );

    let (status, _) = get(&server, "/public", Some("nobody:nothing")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn oversized_bodies_are_refused() {
    let server = A2aHttpServer::builder(registry())
        .card_config(CardConfig::default())
        .max_body_size(64)
        .build()
        .unwrap();
    let body = call(1, "echo", json!(["x".repeat(500)])).to_string();
    let response = server
        .handler()
        .handle(request(Method::POST, "/", ANONYMOUS, body))
        .await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn routing_statuses_and_cors() {
    let server = Arc::new(server());

    assert_eq!(get(&server, "/missing", ANONYMOUS).await.0, StatusCode::NOT_FOUND);
    assert_eq!(get(&server, "/", ANONYMOUS).await.0, StatusCode::METHOD_NOT_ALLOWED);

    let response = server
        .handler()
        .handle(request(Method::OPTIONS, "/admin", ANONYMOUS, ""))
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");

    let quiet = A2aHttpServer::builder(registry()).cors(false).build().unwrap();
    let response = quiet
        .handler()
        .handle(request(Method::GET, "/.well-known/agent.json", ANONYMOUS, ""))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!response.headers().contains_key(ACCESS_CONTROL_ALLOW_ORIGIN));
}

#[tokio::test]
async fn card_path_ignores_bad_credentials() {
    let server = server();
    let (status, body) = get(&server, "/.well-known/agent.json", Some("admin:wrong")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"actions\""));
}
