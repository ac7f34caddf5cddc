//! Router core - the request hot path.
//!
//! Matching allocates only the per-request parameter values; parameter names
//! are shared `Arc<str>` taken from the trie.

#![deny(clippy::inefficient_to_string)]
#![deny(clippy::format_push_string)]
#![deny(clippy::unnecessary_to_owned)]

use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use super::radix::RouteTrie;
use crate::validator::CompileError;

/// Maximum number of path/query parameters before heap allocation.
/// Most REST APIs have ≤4 path params (e.g. /users/{id}/posts/{postId}).
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the hot path.
///
/// Names are `Arc<str>` because they come from the route tree built at
/// startup; values are per-request data from the URL.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Look up a parameter by name. Last write wins for duplicate names.
#[inline]
#[must_use]
pub fn find_param<'a>(params: &'a ParamVec, name: &str) -> Option<&'a str> {
    params
        .iter()
        .rfind(|(k, _)| k.as_ref() == name)
        .map(|(_, v)| v.as_str())
}

/// Result of matching a request path to a route node.
#[derive(Debug)]
pub struct RouteMatch<T> {
    /// The matched route (shared, read-only)
    pub route: Arc<T>,
    /// Path parameters extracted from the URL (e.g. `{id}` → `("id", "123")`)
    pub path_params: ParamVec,
}

impl<T> RouteMatch<T> {
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        find_param(&self.path_params, name)
    }

    /// Convert path_params to a HashMap.
    /// Note: This allocates - use get_path_param() in hot paths instead
    #[must_use]
    pub fn path_params_map(&self) -> HashMap<String, String> {
        self.path_params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}

/// Path router over compiled route nodes.
///
/// Built once from `(template, route)` pairs and never mutated afterwards, so
/// it can be shared across any number of concurrent requests.
pub struct Router<T> {
    trie: RouteTrie<Arc<T>>,
    templates: Vec<String>,
}

impl<T> Router<T> {
    /// Build a router, rejecting ambiguous templates.
    pub fn build<I>(routes: I) -> Result<Self, CompileError>
    where
        I: IntoIterator<Item = (String, T)>,
    {
        let mut trie = RouteTrie::new();
        let mut templates = Vec::new();
        for (template, route) in routes {
            trie.insert(&template, Arc::new(route))?;
            templates.push(template);
        }

        info!(
            routes_count = templates.len(),
            routes_summary = ?templates.iter().take(10).collect::<Vec<_>>(),
            routing_algorithm = "radix_tree",
            "Routing table loaded"
        );

        Ok(Self { trie, templates })
    }

    /// Match a request path. `None` means the path is not ours.
    #[must_use]
    pub fn route(&self, path: &str) -> Option<RouteMatch<T>> {
        let Some((route, path_params)) = self.trie.match_path(path) else {
            debug!(path = %path, "No route matched");
            return None;
        };
        Some(RouteMatch {
            route: Arc::clone(route),
            path_params,
        })
    }

    /// Templates in insertion order.
    #[must_use]
    pub fn templates(&self) -> &[String] {
        &self.templates
    }
}
