//! # A2A Actions Prelude
//!
//! ```rust
//! use a2a_actions::prelude::*;
//! ```

pub use crate::action::{ActionDescriptor, ActionHandler};
pub use crate::auth::{AuthPredicate, CallerContext};
pub use crate::card::{CapabilityCard, CapabilityCardCache, CardConfig, CardSigningKey};
pub use crate::dispatch::{ActionDispatcher, DenyPolicy, DispatchConfig};
pub use crate::error::{CardError, HandlerError, RegistryError};
pub use crate::params::{ActionArgs, ParamType};
pub use crate::registry::ActionRegistry;

pub use a2a_json_rpc::{JsonRpcMessage, JsonRpcRequest, RequestId};
