//! Role-gated content routes
//!
//! Plain `GET` resources protected by the same predicates as actions, for
//! callers that want to probe their access without speaking JSON-RPC.

use std::collections::HashMap;

use a2a_actions::AuthPredicate;

/// Fixed text body served at `path` to callers satisfying `predicate`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRoute {
    pub path: String,
    pub predicate: AuthPredicate,
    pub body: String,
}

impl ContentRoute {
    pub fn new(path: impl Into<String>, predicate: AuthPredicate, body: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            predicate,
            body: body.into(),
        }
    }
}

/// Content routes keyed by exact path
#[derive(Debug, Clone, Default)]
pub struct ContentRoutes {
    routes: HashMap<String, ContentRoute>,
}

impl ContentRoutes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a route, returning the one it replaced
    pub fn insert(&mut self, route: ContentRoute) -> Option<ContentRoute> {
        self.routes.insert(route.path.clone(), route)
    }

    pub fn get(&self, path: &str) -> Option<&ContentRoute> {
        self.routes.get(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
