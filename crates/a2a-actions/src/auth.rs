//! Declarative authorization
//!
//! Every action carries an [`AuthPredicate`] fixed at registration time. The
//! [`AuthorizationGate`] evaluates it against the [`CallerContext`] supplied
//! by the transport for one request. Evaluation is pure: no logging, no
//! mutation, so the dispatcher alone decides how a denial is reported.

use std::collections::BTreeSet;
use std::fmt;

use crate::action::ActionDescriptor;

/// Role requirement attached to an action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthPredicate {
    /// No authentication required
    Any,
    /// Caller must be authenticated and hold every listed role
    All(Vec<String>),
    /// Caller must be authenticated and hold at least one listed role
    AnyOf(Vec<String>),
}

impl AuthPredicate {
    pub fn all<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AuthPredicate::All(roles.into_iter().map(Into::into).collect())
    }

    pub fn any_of<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AuthPredicate::AnyOf(roles.into_iter().map(Into::into).collect())
    }

    /// Roles named by this predicate (empty for `Any`)
    pub fn roles(&self) -> &[String] {
        match self {
            AuthPredicate::Any => &[],
            AuthPredicate::All(roles) | AuthPredicate::AnyOf(roles) => roles,
        }
    }

    /// Evaluate the predicate against a caller
    pub fn evaluate(&self, caller: &CallerContext) -> Decision {
        match self {
            AuthPredicate::Any => Decision::Allow,
            AuthPredicate::All(required) => {
                if !caller.authenticated {
                    return Decision::Deny(DenyReason::Unauthenticated);
                }
                let missing: Vec<String> = required
                    .iter()
                    .filter(|role| !caller.has_role(role))
                    .cloned()
                    .collect();
                if missing.is_empty() {
                    Decision::Allow
                } else {
                    Decision::Deny(DenyReason::MissingRoles(missing))
                }
            }
            AuthPredicate::AnyOf(accepted) => {
                if !caller.authenticated {
                    return Decision::Deny(DenyReason::Unauthenticated);
                }
                if accepted.iter().any(|role| caller.has_role(role)) {
                    Decision::Allow
                } else {
                    Decision::Deny(DenyReason::NoMatchingRole(accepted.clone()))
                }
            }
        }
    }
}

impl fmt::Display for AuthPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthPredicate::Any => write!(f, "ANY"),
            AuthPredicate::All(roles) => write!(f, "ALL({})", roles.join(", ")),
            AuthPredicate::AnyOf(roles) => write!(f, "ANY_OF({})", roles.join(", ")),
        }
    }
}

/// Identity of the caller for a single request.
///
/// Produced by the transport's authentication layer and passed in
/// explicitly; the core never verifies credentials itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    pub principal_id: String,
    pub roles: BTreeSet<String>,
    pub authenticated: bool,
}

impl CallerContext {
    pub const ANONYMOUS_PRINCIPAL: &'static str = "anonymous";

    /// Unauthenticated caller with no roles
    pub fn anonymous() -> Self {
        Self {
            principal_id: Self::ANONYMOUS_PRINCIPAL.to_string(),
            roles: BTreeSet::new(),
            authenticated: false,
        }
    }

    /// Authenticated caller holding the given roles
    pub fn authenticated<I, S>(principal_id: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            principal_id: principal_id.into(),
            roles: roles.into_iter().map(Into::into).collect(),
            authenticated: true,
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

impl Default for CallerContext {
    fn default() -> Self {
        Self::anonymous()
    }
}

/// Outcome of an authorization check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Why a caller was denied. For server-side audit only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    Unauthenticated,
    /// Roles required by an `All` predicate that the caller lacks
    MissingRoles(Vec<String>),
    /// None of the roles accepted by an `AnyOf` predicate were held
    NoMatchingRole(Vec<String>),
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::Unauthenticated => write!(f, "unauthenticated"),
            DenyReason::MissingRoles(roles) => write!(f, "missing role: {}", roles.join(", ")),
            DenyReason::NoMatchingRole(roles) => {
                write!(f, "missing role: one of {}", roles.join(", "))
            }
        }
    }
}

/// Evaluates an action's predicate for a caller
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthorizationGate;

impl AuthorizationGate {
    pub fn new() -> Self {
        Self
    }

    pub fn authorize(&self, descriptor: &ActionDescriptor, caller: &CallerContext) -> Decision {
        self.check(descriptor.required_authorization(), caller)
    }

    /// Evaluate a bare predicate; used for gated resources that are not actions
    pub fn check(&self, predicate: &AuthPredicate, caller: &CallerContext) -> Decision {
        predicate.evaluate(caller)
    }
}
