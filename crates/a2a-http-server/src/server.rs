//! HTTP server for the A2A action endpoint
//!
//! Accepts HTTP/1.1 connections, one task per connection, and hands every
//! request to the shared [`A2aHttpHandler`].

use std::net::SocketAddr;
use std::sync::Arc;

use a2a_actions::{
    ActionDispatcher, ActionRegistry, AuthPredicate, CapabilityCardCache, CardConfig,
    DispatchConfig,
};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::handler::A2aHttpHandler;
use crate::identity::{AnonymousResolver, IdentityResolver};
use crate::routes::{ContentRoute, ContentRoutes};
use crate::{HttpServerError, Result};

/// Default path of the JSON-RPC endpoint
pub const DEFAULT_RPC_PATH: &str = "/";
/// Default path of the capability card
pub const DEFAULT_CARD_PATH: &str = "/.well-known/agent.json";

/// Configuration for the HTTP server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_address: SocketAddr,
    /// Path accepting JSON-RPC `POST`s
    pub rpc_path: String,
    /// Path serving the capability card
    pub card_path: String,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum request body size
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 8080)),
            rpc_path: DEFAULT_RPC_PATH.to_string(),
            card_path: DEFAULT_CARD_PATH.to_string(),
            enable_cors: true,
            max_body_size: 1024 * 1024, // 1MB
        }
    }
}

/// Builder for [`A2aHttpServer`]
pub struct A2aHttpServerBuilder {
    registry: Arc<ActionRegistry>,
    config: ServerConfig,
    dispatch_config: DispatchConfig,
    card_config: CardConfig,
    resolver: Arc<dyn IdentityResolver>,
    routes: ContentRoutes,
}

impl A2aHttpServerBuilder {
    /// Create a builder serving the actions of `registry`
    pub fn new(registry: Arc<ActionRegistry>) -> Self {
        Self {
            registry,
            config: ServerConfig::default(),
            dispatch_config: DispatchConfig::default(),
            card_config: CardConfig::default(),
            resolver: Arc::new(AnonymousResolver),
            routes: ContentRoutes::new(),
        }
    }

    /// Set the bind address
    pub fn bind_address(mut self, addr: SocketAddr) -> Self {
        self.config.bind_address = addr;
        self
    }

    /// Set the JSON-RPC endpoint path
    pub fn rpc_path(mut self, path: impl Into<String>) -> Self {
        self.config.rpc_path = path.into();
        self
    }

    /// Set the capability card path
    pub fn card_path(mut self, path: impl Into<String>) -> Self {
        self.config.card_path = path.into();
        self
    }

    /// Enable or disable CORS
    pub fn cors(mut self, enable: bool) -> Self {
        self.config.enable_cors = enable;
        self
    }

    /// Set maximum request body size
    pub fn max_body_size(mut self, size: usize) -> Self {
        self.config.max_body_size = size;
        self
    }

    pub fn dispatch_config(mut self, config: DispatchConfig) -> Self {
        self.dispatch_config = config;
        self
    }

    pub fn card_config(mut self, config: CardConfig) -> Self {
        self.card_config = config;
        self
    }

    /// How callers are identified; defaults to [`AnonymousResolver`]
    pub fn identity_resolver<R>(mut self, resolver: R) -> Self
    where
        R: IdentityResolver + 'static,
    {
        self.resolver = Arc::new(resolver);
        self
    }

    /// Serve a fixed text body at `path` to callers satisfying `predicate`
    pub fn content_route(
        mut self,
        path: impl Into<String>,
        predicate: AuthPredicate,
        body: impl Into<String>,
    ) -> Self {
        self.routes.insert(ContentRoute::new(path, predicate, body));
        self
    }

    /// Build the server, rejecting paths that are relative or collide
    pub fn build(self) -> Result<A2aHttpServer> {
        let config = self.config;
        for path in [&config.rpc_path, &config.card_path] {
            if !path.starts_with('/') {
                return Err(HttpServerError::InvalidConfig(format!(
                    "path '{}' must start with '/'",
                    path
                )));
            }
        }
        if config.rpc_path == config.card_path {
            return Err(HttpServerError::InvalidConfig(format!(
                "JSON-RPC and card endpoints share the path '{}'",
                config.rpc_path
            )));
        }
        for path in self.routes.paths() {
            if !path.starts_with('/') || path == config.rpc_path || path == config.card_path {
                return Err(HttpServerError::InvalidConfig(format!(
                    "content route '{}' is relative or shadows an endpoint",
                    path
                )));
            }
        }

        let dispatcher = ActionDispatcher::with_config(Arc::clone(&self.registry), self.dispatch_config);
        let card = CapabilityCardCache::new(self.registry, self.card_config);
        let handler = A2aHttpHandler::new(
            Arc::new(config.clone()),
            Arc::new(dispatcher),
            Arc::new(card),
            self.resolver,
            Arc::new(self.routes),
        );

        Ok(A2aHttpServer { config, handler })
    }
}

/// HTTP server exposing the action registry
#[derive(Clone)]
pub struct A2aHttpServer {
    config: ServerConfig,
    handler: A2aHttpHandler,
}

impl A2aHttpServer {
    pub fn builder(registry: Arc<ActionRegistry>) -> A2aHttpServerBuilder {
        A2aHttpServerBuilder::new(registry)
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Request handler shared by all connections
    pub fn handler(&self) -> &A2aHttpHandler {
        &self.handler
    }

    /// Bind the configured address and serve until an accept error
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(&self.config.bind_address).await?;
        info!("A2A server listening on {}", self.config.bind_address);
        info!("JSON-RPC endpoint available at: {}", self.config.rpc_path);
        info!("Capability card available at: {}", self.config.card_path);
        self.serve(listener).await
    }

    /// Serve connections from an already-bound listener
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        loop {
            let (stream, peer_addr) = listener.accept().await?;
            debug!("New connection from {}", peer_addr);

            let handler = self.handler.clone();
            tokio::spawn(async move {
                let io = TokioIo::new(stream);
                let service = service_fn(move |req| {
                    let handler = handler.clone();
                    async move { Ok::<_, std::convert::Infallible>(handler.handle(req).await) }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    // Clients hanging up mid-request are routine
                    if err.is_incomplete_message() {
                        debug!("Client disconnected: {}", err);
                    } else {
                        error!("Error serving connection: {}", err);
                    }
                }
            });
        }
    }
}
