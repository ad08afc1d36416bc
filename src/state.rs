//! Router state: the registered route table and the current location.
//!
//! [`RouterState`] owns the route forest produced by the permission pipeline,
//! resolves concrete paths against it (with an LRU cache in front of the tree
//! walk), and tracks the navigation history (push/replace).
//!
//! Route registration is additive; [`reset`](RouterState::reset) removes every
//! route whose name is not on the whitelist captured from the basic (static)
//! routes at construction time, which is how logout discards the
//! session-specific dynamic routes.

use crate::params::{QueryParams, RouteParams};
use crate::route::{join_paths, normalize_path, RouteMeta, RouteNode};
use lru::LruCache;
use std::collections::HashSet;
use std::num::NonZeroUsize;

/// A concrete path resolved against the registered route table.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLocation {
    /// Name of the matched route.
    pub name: String,
    /// The absolute route pattern that matched (may contain `:param`
    /// segments).
    pub pattern: String,
    /// Extracted path parameters.
    pub params: RouteParams,
    /// Metadata of the matched route.
    pub meta: RouteMeta,
    /// Redirect target, if the matched route declares one.
    pub redirect: Option<String>,
}

/// A navigation in flight, handed to every guard.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationRequest {
    /// Concrete path without the query string.
    pub path: String,
    /// Concrete path including the query string; tab identity key.
    pub full_path: String,
    /// Name of the matched route (empty when unmatched).
    pub name: String,
    /// Extracted path parameters.
    pub params: RouteParams,
    /// Parsed query parameters.
    pub query: QueryParams,
    /// Metadata of the matched route. Guards may mark it (e.g. `loaded`).
    pub meta: RouteMeta,
}

impl NavigationRequest {
    /// Build a request for a raw location string (path plus optional query).
    pub fn new(location: impl Into<String>) -> Self {
        let location = location.into();
        let (path, query) = match location.split_once('?') {
            Some((p, q)) => (p.to_string(), QueryParams::parse(q)),
            None => (location.clone(), QueryParams::new()),
        };
        Self {
            path: normalize_path(&path).into_owned(),
            full_path: location,
            name: String::new(),
            params: RouteParams::new(),
            query,
            meta: RouteMeta::default(),
        }
    }

    /// Attach the outcome of route resolution.
    pub fn with_resolution(mut self, resolved: &ResolvedLocation) -> Self {
        self.name = resolved.name.clone();
        self.params = resolved.params.clone();
        self.meta = resolved.meta.clone();
        self
    }
}

const MATCH_CACHE_CAPACITY: usize = 256;

/// The registered route table plus navigation history.
pub struct RouterState {
    routes: Vec<RouteNode>,
    whitelist: HashSet<String>,
    history: Vec<String>,
    current: usize,
    match_cache: LruCache<String, Option<ResolvedLocation>>,
}

impl RouterState {
    /// Create a router over the basic (static) routes. Their names become the
    /// reset whitelist.
    pub fn new(basic_routes: Vec<RouteNode>) -> Self {
        let mut whitelist = HashSet::new();
        collect_names(&basic_routes, &mut whitelist);
        Self {
            routes: basic_routes,
            whitelist,
            history: vec!["/".to_string()],
            current: 0,
            match_cache: LruCache::new(
                NonZeroUsize::new(MATCH_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN),
            ),
        }
    }

    /// Register additional (dynamic) routes. Clears the match cache.
    pub fn add_routes(&mut self, routes: Vec<RouteNode>) {
        for route in routes {
            if route.name.is_empty() {
                log::warn!("refusing to register anonymous route '{}'", route.path);
                continue;
            }
            // Re-registering a name replaces the previous definition.
            self.routes.retain(|r| r.name != route.name);
            self.routes.push(route);
        }
        self.match_cache.clear();
    }

    /// Drop every route that is not on the static whitelist.
    pub fn reset(&mut self) {
        let whitelist = &self.whitelist;
        self.routes.retain(|r| whitelist.contains(&r.name));
        self.match_cache.clear();
    }

    /// The registered route forest.
    pub fn routes(&self) -> &[RouteNode] {
        &self.routes
    }

    /// Whether a route with the given name is registered at any depth.
    pub fn has_route(&self, name: &str) -> bool {
        fn contains(nodes: &[RouteNode], name: &str) -> bool {
            nodes
                .iter()
                .any(|n| n.name == name || contains(&n.children, name))
        }
        contains(&self.routes, name)
    }

    /// The current full path (including query).
    pub fn current_full_path(&self) -> &str {
        &self.history[self.current]
    }

    /// The current path without the query string.
    pub fn current_path(&self) -> &str {
        self.current_full_path()
            .split_once('?')
            .map_or_else(|| self.current_full_path(), |(p, _)| p)
    }

    /// Push a new location onto the history.
    pub fn push(&mut self, location: impl Into<String>) {
        self.history.truncate(self.current + 1);
        self.history.push(location.into());
        self.current += 1;
    }

    /// Replace the current location in the history.
    pub fn replace(&mut self, location: impl Into<String>) {
        self.history[self.current] = location.into();
    }

    /// Resolve a concrete path (query string ignored) against the route
    /// table. Cached per path.
    pub fn resolve(&mut self, path: &str) -> Option<ResolvedLocation> {
        let path = normalize_path(path.split_once('?').map_or(path, |(p, _)| p)).into_owned();
        if let Some(cached) = self.match_cache.get(&path) {
            return cached.clone();
        }
        let resolved = resolve_in_forest(&self.routes, "", &path);
        self.match_cache.put(path, resolved.clone());
        resolved
    }
}

fn collect_names(nodes: &[RouteNode], out: &mut HashSet<String>) {
    for node in nodes {
        if !node.name.is_empty() {
            out.insert(node.name.clone());
        }
        collect_names(&node.children, out);
    }
}

/// Depth-first search for the deepest node whose composed pattern matches.
fn resolve_in_forest(nodes: &[RouteNode], parent: &str, path: &str) -> Option<ResolvedLocation> {
    for node in nodes {
        let pattern = join_paths(parent, &node.path);

        // Children win over their parent: the deepest match is the page.
        if let Some(found) = resolve_in_forest(&node.children, &pattern, path) {
            return Some(found);
        }

        if let Some(params) = match_pattern(path, &pattern) {
            return Some(ResolvedLocation {
                name: node.name.clone(),
                pattern,
                params,
                meta: node.meta.clone(),
                redirect: node.redirect.clone(),
            });
        }
    }
    None
}

/// Segment matcher: `:name` captures, literals match exactly, segment counts
/// must agree.
fn match_pattern(path: &str, pattern: &str) -> Option<RouteParams> {
    let path_segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let pattern_segments: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    if path_segments.len() != pattern_segments.len() {
        return None;
    }
    let mut params = RouteParams::new();
    for (path_seg, pattern_seg) in path_segments.iter().zip(&pattern_segments) {
        if let Some(name) = pattern_seg.strip_prefix(':') {
            params.insert(name, *path_seg);
        } else if pattern_seg != path_seg {
            return None;
        }
    }
    Some(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_router() -> RouterState {
        let basic = vec![RouteNode::new("/login", "Login")];
        let mut router = RouterState::new(basic);
        router.add_routes(vec![
            RouteNode::new("/dashboard", "Dashboard")
                .child(RouteNode::new("analytics", "Analytics")),
            RouteNode::new("/users", "Users").child(RouteNode::new(":id", "UserDetail")),
        ]);
        router
    }

    #[test]
    fn resolves_static_child() {
        let mut router = sample_router();
        let resolved = router.resolve("/dashboard/analytics").unwrap();
        assert_eq!(resolved.name, "Analytics");
        assert_eq!(resolved.pattern, "/dashboard/analytics");
    }

    #[test]
    fn resolves_param_child() {
        let mut router = sample_router();
        let resolved = router.resolve("/users/42").unwrap();
        assert_eq!(resolved.name, "UserDetail");
        assert_eq!(resolved.params.get("id"), Some("42"));
    }

    #[test]
    fn query_string_is_ignored_for_matching() {
        let mut router = sample_router();
        let resolved = router.resolve("/users/42?tab=profile").unwrap();
        assert_eq!(resolved.name, "UserDetail");
    }

    #[test]
    fn unmatched_path_is_none_and_cached() {
        let mut router = sample_router();
        assert!(router.resolve("/nowhere").is_none());
        assert!(router.resolve("/nowhere").is_none());
    }

    #[test]
    fn reset_keeps_only_whitelisted_routes() {
        let mut router = sample_router();
        assert!(router.has_route("Dashboard"));
        router.reset();
        assert!(!router.has_route("Dashboard"));
        assert!(router.has_route("Login"));
    }

    #[test]
    fn reregistering_a_name_replaces_it() {
        let mut router = sample_router();
        router.add_routes(vec![RouteNode::new("/dashboard-v2", "Dashboard")]);
        assert!(router.resolve("/dashboard-v2").is_some());
        assert!(router.resolve("/dashboard/analytics").is_none());
    }

    #[test]
    fn history_push_and_replace() {
        let mut router = sample_router();
        router.push("/dashboard/analytics?from=home");
        assert_eq!(router.current_full_path(), "/dashboard/analytics?from=home");
        assert_eq!(router.current_path(), "/dashboard/analytics");
        router.replace("/users/1");
        assert_eq!(router.current_full_path(), "/users/1");
    }

    #[test]
    fn navigation_request_splits_query() {
        let request = NavigationRequest::new("/users/42?tab=posts");
        assert_eq!(request.path, "/users/42");
        assert_eq!(request.full_path, "/users/42?tab=posts");
        assert_eq!(request.query.get("tab"), Some("posts"));
    }
}
