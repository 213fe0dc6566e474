use thiserror::Error;

use crate::params::ParamType;

/// Result type for registry and card operations
pub type Result<T> = std::result::Result<T, ActionError>;

/// Errors raised while building or querying the action surface
#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Card(#[from] CardError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Action '{0}' is already registered")]
    DuplicateAction(String),

    #[error("Action '{0}' is not registered")]
    UnknownAction(String),

    #[error("Action '{action}' declares parameter '{param}' more than once")]
    DuplicateParam { action: String, param: String },

    #[error("Action name must not be empty")]
    EmptyName,

    #[error("Action '{0}' has no handler")]
    MissingHandler(String),
}

/// Request params that do not fit an action's declared shape.
/// Messages name the offending field; they carry nothing security-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    #[error("expected {expected} params, got {actual}")]
    Arity { expected: usize, actual: usize },

    #[error("param '{param}' must be {expected}, got {actual}")]
    Type {
        param: String,
        expected: ParamType,
        actual: &'static str,
    },

    #[error("missing param '{0}'")]
    Missing(String),

    #[error("unknown param '{0}'")]
    Unknown(String),
}

/// Failure reported by an action handler
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    /// Internal fault; the cause is logged and never sent to the caller
    #[error("Action failed: {0}")]
    Failed(String),

    /// Message explicitly cleared for the caller
    #[error("{0}")]
    Public(String),

    /// A bound argument was unusable; reported as invalid params
    #[error("Invalid argument '{param}': {message}")]
    InvalidArgument { param: String, message: String },
}

impl HandlerError {
    pub fn failed(cause: impl Into<String>) -> Self {
        Self::Failed(cause.into())
    }

    pub fn public(message: impl Into<String>) -> Self {
        Self::Public(message.into())
    }

    pub fn invalid_argument(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            param: param.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum CardError {
    #[error("Card serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Card is not signed")]
    Unsigned,

    #[error("Unsupported signature algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Signature key '{0}' does not match the verifying key")]
    KeyMismatch(String),

    #[error("Malformed signature: {0}")]
    MalformedSignature(String),

    #[error("Signature verification failed")]
    VerificationFailed,
}
