//! Action descriptors and handlers
//!
//! An action is a named operation with a fixed parameter shape, a required
//! [`AuthPredicate`] and a handler. Descriptors are built once at startup
//! and are immutable after registration.

use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::auth::AuthPredicate;
use crate::error::{HandlerError, RegistryError};
use crate::params::{ActionArgs, ParamSpec, ParamType};

/// Business logic behind an action.
///
/// Handlers receive arguments already checked against the declared shape.
/// The core never interprets the returned value.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    async fn invoke(&self, args: ActionArgs) -> Result<Value, HandlerError>;
}

/// Handler backed by an async closure
pub struct FunctionHandler<F> {
    handler_fn: F,
}

impl<F> FunctionHandler<F> {
    pub fn new(handler_fn: F) -> Self {
        Self { handler_fn }
    }
}

#[async_trait]
impl<F, Fut> ActionHandler for FunctionHandler<F>
where
    F: Fn(ActionArgs) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, HandlerError>> + Send + 'static,
{
    async fn invoke(&self, args: ActionArgs) -> Result<Value, HandlerError> {
        (self.handler_fn)(args).await
    }
}

/// Registered metadata for one action
#[derive(Clone)]
pub struct ActionDescriptor {
    name: String,
    description: String,
    parameters: Vec<ParamSpec>,
    required_authorization: AuthPredicate,
    handler: Arc<dyn ActionHandler>,
}

impl ActionDescriptor {
    pub fn builder(name: impl Into<String>) -> ActionDescriptorBuilder {
        ActionDescriptorBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn parameters(&self) -> &[ParamSpec] {
        &self.parameters
    }

    pub fn required_authorization(&self) -> &AuthPredicate {
        &self.required_authorization
    }

    pub fn handler(&self) -> Arc<dyn ActionHandler> {
        Arc::clone(&self.handler)
    }
}

impl fmt::Debug for ActionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionDescriptor")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("parameters", &self.parameters)
            .field("required_authorization", &self.required_authorization)
            .finish_non_exhaustive()
    }
}

/// Builder for [`ActionDescriptor`]
pub struct ActionDescriptorBuilder {
    name: String,
    description: String,
    parameters: Vec<ParamSpec>,
    required_authorization: AuthPredicate,
    handler: Option<Arc<dyn ActionHandler>>,
}

impl ActionDescriptorBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            parameters: Vec::new(),
            required_authorization: AuthPredicate::Any,
            handler: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Append a parameter; declaration order is the positional order
    pub fn param(mut self, name: impl Into<String>, param_type: ParamType) -> Self {
        self.parameters.push(ParamSpec::new(name, param_type));
        self
    }

    /// Shorthand for a string parameter
    pub fn string_param(self, name: impl Into<String>) -> Self {
        self.param(name, ParamType::String)
    }

    /// Required authorization; defaults to [`AuthPredicate::Any`]
    pub fn requires(mut self, predicate: AuthPredicate) -> Self {
        self.required_authorization = predicate;
        self
    }

    pub fn handler<H>(mut self, handler: H) -> Self
    where
        H: ActionHandler + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }

    pub fn handler_fn<F, Fut>(self, handler_fn: F) -> Self
    where
        F: Fn(ActionArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, HandlerError>> + Send + 'static,
    {
        self.handler(FunctionHandler::new(handler_fn))
    }

    pub fn build(self) -> Result<ActionDescriptor, RegistryError> {
        if self.name.trim().is_empty() {
            return Err(RegistryError::EmptyName);
        }

        let mut seen = HashSet::new();
        for spec in &self.parameters {
            if !seen.insert(spec.name.as_str()) {
                return Err(RegistryError::DuplicateParam {
                    action: self.name.clone(),
                    param: spec.name.clone(),
                });
            }
        }

        let handler = self
            .handler
            .ok_or_else(|| RegistryError::MissingHandler(self.name.clone()))?;

        Ok(ActionDescriptor {
            name: self.name,
            description: self.description,
            parameters: self.parameters,
            required_authorization: self.required_authorization,
            handler,
        })
    }
}
