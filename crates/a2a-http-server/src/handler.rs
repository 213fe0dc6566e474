//! HTTP request handler
//!
//! Routes by exact path:
//! - `POST {rpc_path}`: JSON-RPC dispatch, always `200` once the body is read
//! - `GET {card_path}`: capability card, no credentials needed
//! - `GET` content routes: fixed bodies gated by an [`AuthPredicate`]
//!
//! `OPTIONS` on a known path answers `204`, a known path with any other
//! method answers `405` and everything else `404`.

use std::sync::Arc;

use a2a_actions::{
    ActionDispatcher, AuthPredicate, AuthorizationGate, CallerContext, CapabilityCardCache,
    Decision, DenyReason,
};
use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::header::{ALLOW, CONTENT_TYPE, HeaderValue, WWW_AUTHENTICATE};
use hyper::{Method, Request, Response, StatusCode};
use tracing::{debug, error, warn};

use crate::cors::CorsLayer;
use crate::identity::{AuthenticationError, IdentityResolver};
use crate::routes::ContentRoutes;
use crate::server::ServerConfig;

const APPLICATION_JSON: &str = "application/json";
const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Shared, cheaply cloneable request handler
#[derive(Clone)]
pub struct A2aHttpHandler {
    config: Arc<ServerConfig>,
    dispatcher: Arc<ActionDispatcher>,
    card: Arc<CapabilityCardCache>,
    resolver: Arc<dyn IdentityResolver>,
    routes: Arc<ContentRoutes>,
    gate: AuthorizationGate,
}

enum Endpoint<'a> {
    Rpc,
    Card,
    Content(&'a AuthPredicate, &'a str),
}

impl A2aHttpHandler {
    pub fn new(
        config: Arc<ServerConfig>,
        dispatcher: Arc<ActionDispatcher>,
        card: Arc<CapabilityCardCache>,
        resolver: Arc<dyn IdentityResolver>,
        routes: Arc<ContentRoutes>,
    ) -> Self {
        Self {
            config,
            dispatcher,
            card,
            resolver,
            routes,
            gate: AuthorizationGate::new(),
        }
    }

    pub fn dispatcher(&self) -> &Arc<ActionDispatcher> {
        &self.dispatcher
    }

    pub fn card(&self) -> &Arc<CapabilityCardCache> {
        &self.card
    }

    /// Handle one request. Generic over the body so tests can drive it
    /// with in-memory bodies.
    pub async fn handle<B>(&self, req: Request<B>) -> Response<Full<Bytes>>
    where
        B: Body + Send,
        B::Data: Send,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        debug!("Handling {} {}", method, path);

        let mut response = match (self.endpoint(&path), &method) {
            (None, _) => text(StatusCode::NOT_FOUND, "Not Found"),
            (Some(_), &Method::OPTIONS) => empty(StatusCode::NO_CONTENT),
            (Some(Endpoint::Rpc), &Method::POST) => self.handle_rpc(req).await,
            (Some(Endpoint::Card), &Method::GET) => self.handle_card(),
            (Some(Endpoint::Content(predicate, body)), &Method::GET) => {
                self.handle_content(req, &path, predicate, body.to_string())
                    .await
            }
            (Some(Endpoint::Rpc), _) => method_not_allowed("POST, OPTIONS"),
            (Some(_), _) => method_not_allowed("GET, OPTIONS"),
        };

        if self.config.enable_cors {
            CorsLayer::apply_cors_headers(response.headers_mut());
        }
        response
    }

    fn endpoint(&self, path: &str) -> Option<Endpoint<'_>> {
        if path == self.config.rpc_path {
            Some(Endpoint::Rpc)
        } else if path == self.config.card_path {
            Some(Endpoint::Card)
        } else {
            self.routes
                .get(path)
                .map(|route| Endpoint::Content(&route.predicate, route.body.as_str()))
        }
    }

    async fn handle_rpc<B>(&self, req: Request<B>) -> Response<Full<Bytes>>
    where
        B: Body + Send,
        B::Data: Send,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let caller = match self.resolver.resolve(req.headers()).await {
            Ok(caller) => caller,
            Err(err) => return self.unauthenticated(&err),
        };

        let body = match Limited::new(req.into_body(), self.config.max_body_size)
            .collect()
            .await
        {
            Ok(collected) => collected.to_bytes(),
            Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => {
                warn!(limit = self.config.max_body_size, "Request body too large");
                return text(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large");
            }
            Err(err) => {
                error!("Failed to read request body: {}", err);
                return text(StatusCode::BAD_REQUEST, "Failed to read request body");
            }
        };

        let message = self.dispatcher.dispatch_bytes(&body, &caller).await;
        match serde_json::to_vec(&message) {
            Ok(json) => json_response(StatusCode::OK, json),
            Err(err) => {
                error!("Failed to serialize JSON-RPC response: {}", err);
                text(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        }
    }

    fn handle_card(&self) -> Response<Full<Bytes>> {
        match self.card.document() {
            Ok(document) => json_response(StatusCode::OK, document),
            Err(err) => {
                error!("Failed to build capability card: {}", err);
                text(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        }
    }

    async fn handle_content<B>(
        &self,
        req: Request<B>,
        path: &str,
        predicate: &AuthPredicate,
        body: String,
    ) -> Response<Full<Bytes>> {
        let caller = match self.resolver.resolve(req.headers()).await {
            Ok(caller) => caller,
            Err(err) => return self.unauthenticated(&err),
        };

        match self.gate.check(predicate, &caller) {
            Decision::Allow => text(StatusCode::OK, body),
            Decision::Deny(reason) => {
                log_denied(path, predicate, &caller, &reason);
                match reason {
                    DenyReason::Unauthenticated => self.challenge(),
                    _ => text(StatusCode::FORBIDDEN, "Forbidden"),
                }
            }
        }
    }

    fn unauthenticated(&self, err: &AuthenticationError) -> Response<Full<Bytes>> {
        debug!("Authentication failed: {}", err);
        self.challenge()
    }

    fn challenge(&self) -> Response<Full<Bytes>> {
        let mut response = text(StatusCode::UNAUTHORIZED, "Unauthorized");
        if let Some(challenge) = self.resolver.challenge() {
            match HeaderValue::from_str(&challenge) {
                Ok(value) => {
                    response.headers_mut().insert(WWW_AUTHENTICATE, value);
                }
                Err(_) => warn!("Authentication challenge is not a valid header value"),
            }
        }
        response
    }
}

fn log_denied(path: &str, predicate: &AuthPredicate, caller: &CallerContext, reason: &DenyReason) {
    warn!(
        path,
        principal = %caller.principal_id,
        authenticated = caller.authenticated,
        required = %predicate,
        %reason,
        "Content access denied"
    );
}

fn empty(status: StatusCode) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}

fn text(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    with_content_type(status, body.into(), TEXT_PLAIN)
}

fn json_response(status: StatusCode, body: Vec<u8>) -> Response<Full<Bytes>> {
    with_content_type(status, Bytes::from(body), APPLICATION_JSON)
}

fn with_content_type(
    status: StatusCode,
    body: Bytes,
    content_type: &'static str,
) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

fn method_not_allowed(allow: &'static str) -> Response<Full<Bytes>> {
    let mut response = text(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
    response
        .headers_mut()
        .insert(ALLOW, HeaderValue::from_static(allow));
    response
}
