//! Caller identity resolution
//!
//! Turns request headers into the [`CallerContext`] handed to the dispatcher.
//! A request with no credentials is anonymous; a request with credentials
//! that do not check out is rejected before any routing happens.

use std::collections::{BTreeSet, HashMap};

use a2a_actions::CallerContext;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hyper::HeaderMap;
use hyper::header::AUTHORIZATION;
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

/// Why presented credentials were rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthenticationError {
    #[error("Malformed Authorization header: {0}")]
    Malformed(String),

    #[error("Unsupported authorization scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Invalid credentials")]
    InvalidCredentials,
}

/// Resolves the caller for one HTTP request
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Absent credentials must resolve to [`CallerContext::anonymous`];
    /// only credentials that were presented and failed are an error.
    async fn resolve(&self, headers: &HeaderMap) -> Result<CallerContext, AuthenticationError>;

    /// `WWW-Authenticate` value sent with 401 responses
    fn challenge(&self) -> Option<String> {
        None
    }
}

/// Treats every caller as anonymous
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousResolver;

#[async_trait]
impl IdentityResolver for AnonymousResolver {
    async fn resolve(&self, _headers: &HeaderMap) -> Result<CallerContext, AuthenticationError> {
        Ok(CallerContext::anonymous())
    }
}

/// Compared against when the username is unknown
const UNKNOWN_USER_PASSWORD: &str = "\0unknown-user\0";

fn password_matches(expected: &str, presented: &str) -> bool {
    expected.as_bytes().ct_eq(presented.as_bytes()).into()
}

#[derive(Clone)]
struct UserRecord {
    password: String,
    roles: BTreeSet<String>,
}

/// HTTP Basic authentication against an in-memory user table
#[derive(Clone)]
pub struct BasicAuthResolver {
    realm: String,
    users: HashMap<String, UserRecord>,
}

impl BasicAuthResolver {
    pub fn new(realm: impl Into<String>) -> Self {
        Self {
            realm: realm.into(),
            users: HashMap::new(),
        }
    }

    /// Add a user; a later entry with the same name replaces the earlier one
    pub fn user<I, S>(mut self, username: impl Into<String>, password: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.users.insert(
            username.into(),
            UserRecord {
                password: password.into(),
                roles: roles.into_iter().map(Into::into).collect(),
            },
        );
        self
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    fn decode_credentials(value: &str) -> Result<(String, String), AuthenticationError> {
        let (scheme, encoded) = value
            .trim()
            .split_once(' ')
            .ok_or_else(|| AuthenticationError::Malformed("missing credentials".to_string()))?;
        if !scheme.eq_ignore_ascii_case("basic") {
            return Err(AuthenticationError::UnsupportedScheme(scheme.to_string()));
        }

        let decoded = STANDARD
            .decode(encoded.trim())
            .map_err(|e| AuthenticationError::Malformed(e.to_string()))?;
        let decoded = String::from_utf8(decoded)
            .map_err(|_| AuthenticationError::Malformed("credentials are not UTF-8".to_string()))?;
        let (username, password) = decoded
            .split_once(':')
            .ok_or_else(|| AuthenticationError::Malformed("missing ':' separator".to_string()))?;
        Ok((username.to_string(), password.to_string()))
    }
}

#[async_trait]
impl IdentityResolver for BasicAuthResolver {
    async fn resolve(&self, headers: &HeaderMap) -> Result<CallerContext, AuthenticationError> {
        let Some(header) = headers.get(AUTHORIZATION) else {
            return Ok(CallerContext::anonymous());
        };
        let value = header
            .to_str()
            .map_err(|_| AuthenticationError::Malformed("header is not visible ASCII".to_string()))?;

        let (username, password) = Self::decode_credentials(value)?;
        let record = self.users.get(&username);
        let expected = record.map_or(UNKNOWN_USER_PASSWORD, |r| r.password.as_str());
        let matched = password_matches(expected, &password);

        match record {
            Some(record) if matched => {
                debug!(principal = %username, "Authenticated caller");
                Ok(CallerContext::authenticated(username, record.roles.iter().cloned()))
            }
            _ => {
                warn!(principal = %username, "Rejected credentials");
                Err(AuthenticationError::InvalidCredentials)
            }
        }
    }

    fn challenge(&self) -> Option<String> {
        Some(format!("Basic realm=\"{}\"", self.realm))
    }
}
