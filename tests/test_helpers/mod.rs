//! Shared fixtures: a small action set served through the HTTP handler

#![allow(dead_code)]

use std::sync::Arc;

use a2a_actions::{
    ActionArgs, ActionDescriptor, ActionRegistry, AuthPredicate, CardConfig, DispatchConfig,
    HandlerError,
};
use a2a_http_server::{A2aHttpServer, BasicAuthResolver};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::{AUTHORIZATION, CONTENT_TYPE};
use hyper::{Method, Request, Response, StatusCode};
use serde_json::{Value, json};

pub const USER: Option<&str> = Some("user:password");
pub const ADMIN: Option<&str> = Some("admin:admin");
pub const ANONYMOUS: Option<&str> = None;

pub fn echo() -> ActionDescriptor {
    ActionDescriptor::builder("echo")
        .description("Echo the input")
        .string_param("text")
        .handler_fn(|args: ActionArgs| async move { Ok::<Value, HandlerError>(json!(args.str(0)?)) })
        .build()
        .unwrap()
}

pub fn admin_only() -> ActionDescriptor {
    ActionDescriptor::builder("adminOnly")
        .description("Restricted action")
        .requires(AuthPredicate::all(["ADMIN"]))
        .handler_fn(|_args: ActionArgs| async { Ok::<Value, HandlerError>(json!("granted")) })
        .build()
        .unwrap()
}

#[allow(unreachable_code)]
pub fn explode() -> ActionDescriptor {
    ActionDescriptor::builder("explode")
        .description("Always panics")
        .handler_fn(|_args: ActionArgs| async {
            let outcome: Result<Value, HandlerError> = panic!("boom");
            outcome
        })
        .build()
        .unwrap()
}

pub fn registry() -> Arc<ActionRegistry> {
    let registry = ActionRegistry::new();
    registry.register_all([echo(), admin_only(), explode()]).unwrap();
    Arc::new(registry)
}

pub fn users() -> BasicAuthResolver {
    BasicAuthResolver::new("integration")
        .user("user", "password", ["USER"])
        .user("admin", "admin", ["ADMIN", "USER"])
}

pub fn server_with(registry: Arc<ActionRegistry>, card: CardConfig) -> A2aHttpServer {
    A2aHttpServer::builder(registry)
        .card_config(card)
        .dispatch_config(DispatchConfig::default())
        .identity_resolver(users())
        .content_route("/public", AuthPredicate::Any, "Public content")
        .content_route("/secured", AuthPredicate::all(["USER"]), "Secured content")
        .content_route("/admin", AuthPredicate::all(["ADMIN"]), "Admin content")
        .build()
        .unwrap()
}

pub fn server() -> A2aHttpServer {
    server_with(registry(), CardConfig::new("integration agent"))
}

pub fn request(method: Method, path: &str, credentials: Option<&str>, body: impl Into<Bytes>) -> Request<Full<Bytes>> {
    let mut builder = Request::builder()
        .method(method)
        .uri(path)
        .header(CONTENT_TYPE, "application/json");
    if let Some(credentials) = credentials {
        builder = builder.header(AUTHORIZATION, format!("Basic {}", STANDARD.encode(credentials)));
    }
    builder.body(Full::new(body.into())).unwrap()
}

pub async fn body_bytes(response: Response<Full<Bytes>>) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

/// POST a JSON-RPC call and decode the envelope, asserting HTTP 200
pub async fn rpc(server: &A2aHttpServer, credentials: Option<&str>, envelope: Value) -> Value {
    let response = server
        .handler()
        .handle(request(Method::POST, "/", credentials, envelope.to_string()))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub fn call(id: i64, method: &str, params: Value) -> Value {
    json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params})
}

/// Exactly one of `result` / `error` is present
pub fn assert_single_outcome(response: &Value) {
    let has_result = response.get("result").is_some();
    let has_error = response.get("error").is_some();
    assert!(has_result ^ has_error, "bad envelope: {}", response);
}
