//! # A2A Actions
//!
//! Registry of named actions, each guarded by a declarative role predicate,
//! plus the JSON-RPC dispatcher that routes calls to them and the capability
//! card that advertises them.
//!
//! ## Features
//! - Actions declared once with a builder: name, parameters, required roles, handler
//! - `ANY`, `ALL(..)` and `ANY_OF(..)` authorization evaluated per request
//! - Parameter shape checking before any handler runs
//! - Handler deadline and panic isolation; failures never leak their cause
//! - Capability card rebuilt only when the registry changes, optionally signed
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use a2a_actions::prelude::*;
//! use serde_json::json;
//!
//! # async fn run() -> a2a_actions::Result<()> {
//! let registry = Arc::new(ActionRegistry::new());
//! registry.register(
//!     ActionDescriptor::builder("echo")
//!         .string_param("text")
//!         .handler_fn(|args: ActionArgs| async move {
//!             Ok::<_, HandlerError>(json!(args.str(0)?))
//!         })
//!         .build()?,
//! )?;
//!
//! let dispatcher = ActionDispatcher::new(Arc::clone(&registry));
//! let response = dispatcher
//!     .dispatch_bytes(br#"{"jsonrpc":"2.0","id":1,"method":"echo","params":["hi"]}"#, &CallerContext::anonymous())
//!     .await;
//! assert_eq!(response.result(), Some(&json!("hi")));
//! # Ok(())
//! # }
//! ```

pub mod action;
pub mod auth;
pub mod card;
pub mod dispatch;
pub mod error;
pub mod params;
pub mod prelude;
pub mod registry;

pub use action::{ActionDescriptor, ActionDescriptorBuilder, ActionHandler, FunctionHandler};
pub use auth::{AuthPredicate, AuthorizationGate, CallerContext, Decision, DenyReason};
pub use card::{
    CapabilityCard, CapabilityCardCache, CardAction, CardConfig, CardSignature, CardSigningKey,
    verify_card,
};
pub use dispatch::{ActionDispatcher, DenyPolicy, DispatchConfig};
pub use error::{ActionError, CardError, HandlerError, ParamError, RegistryError, Result};
pub use params::{ActionArgs, ParamSpec, ParamType};
pub use registry::{ActionRegistry, RegistrySnapshot};

// Envelope types callers need alongside the dispatcher
pub use a2a_json_rpc;
