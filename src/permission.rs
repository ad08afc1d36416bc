//! Permission-driven route table construction.
//!
//! [`build_routes`] is the once-per-session pipeline that turns authored (or
//! backend-delivered) route descriptors into the registrable, authorized
//! route forest, and derives the menu forest as a side product stored in
//! [`PermissionState`]:
//!
//! - **route-mapping mode**: role-filter the static modules, project menus
//!   from the role-filtered (pre-ignore) forest, strip menu-only nodes,
//!   materialize, flatten.
//! - **backend mode**: promote and materialize the backend descriptors,
//!   project menus, strip menu-only nodes, flatten, prepend the not-found
//!   catch-all.
//!
//! Filtering is strict and non-mutating: a node survives iff the predicate
//! holds for it and, transitively, for every ancestor. A route with no
//! matching role is silently excluded, never an error.

use crate::flatten::flat_multi_level_routes;
use crate::materialize::{materialize_routes, transform_backend_routes, ViewRegistry};
use crate::menu::{project_menus, MenuNode};
use crate::route::{join_paths, RoleId, RouteNode};
use crate::settings::{pages, PermissionMode};
use std::time::{SystemTime, UNIX_EPOCH};

// ============================================================================
// Tree filtering
// ============================================================================

/// Depth-first structural filter over a route forest.
///
/// Returns a fresh forest containing only nodes for which `keep` holds;
/// children of dropped nodes are dropped with them. The input is never
/// mutated or aliased.
pub fn filter_tree(forest: &[RouteNode], keep: &dyn Fn(&RouteNode) -> bool) -> Vec<RouteNode> {
    forest
        .iter()
        .filter(|node| keep(node))
        .map(|node| {
            let mut node = node.clone();
            node.children = filter_tree(&node.children, keep);
            node
        })
        .collect()
}

/// Role predicate: a node with no declared roles is visible to everyone,
/// otherwise the caller's role set must intersect it.
pub fn roles_allow(node: &RouteNode, roles: &[RoleId]) -> bool {
    if node.meta.roles.is_empty() {
        return true;
    }
    node.meta.roles.iter().any(|role| roles.contains(role))
}

// ============================================================================
// Session permission state
// ============================================================================

/// Menu lists and the one-shot route-registration flag for the current
/// session.
#[derive(Debug, Default)]
pub struct PermissionState {
    is_dynamic_added_route: bool,
    last_build_menu_time: u64,
    front_menu_list: Vec<MenuNode>,
    back_menu_list: Vec<MenuNode>,
}

impl PermissionState {
    /// Fresh, pre-login state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the dynamic routes of this session were already registered.
    pub fn is_dynamic_added_route(&self) -> bool {
        self.is_dynamic_added_route
    }

    /// Mark the one-shot route registration as done (or undone, on reset).
    pub fn set_dynamic_added_route(&mut self, added: bool) {
        self.is_dynamic_added_route = added;
    }

    /// Cache-busting token observers compare to detect menu rebuilds.
    pub fn last_build_menu_time(&self) -> u64 {
        self.last_build_menu_time
    }

    /// The menu forest for the given permission mode.
    pub fn menus(&self, mode: PermissionMode) -> &[MenuNode] {
        match mode {
            PermissionMode::RouteMapping => &self.front_menu_list,
            PermissionMode::Back => &self.back_menu_list,
        }
    }

    /// Mutable access for the dynamic-parameter menu patch.
    pub fn menus_mut(&mut self, mode: PermissionMode) -> &mut [MenuNode] {
        match mode {
            PermissionMode::RouteMapping => &mut self.front_menu_list,
            PermissionMode::Back => &mut self.back_menu_list,
        }
    }

    /// Store the frontend-authored menu forest.
    pub fn set_front_menu_list(&mut self, menus: Vec<MenuNode>) {
        self.front_menu_list = menus;
    }

    /// Store the backend-delivered menu forest and bump the rebuild token.
    pub fn set_back_menu_list(&mut self, menus: Vec<MenuNode>) {
        if !menus.is_empty() {
            self.touch_build_time();
        }
        self.back_menu_list = menus;
    }

    fn touch_build_time(&mut self) {
        self.last_build_menu_time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
    }

    /// Drop everything; called on logout.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// ============================================================================
// Static routes
// ============================================================================

/// The catch-all registered after dynamic routes so unmatched paths land on
/// the exception page.
pub fn page_not_found_route() -> RouteNode {
    let mut route = RouteNode::new(pages::ERROR_PAGE, pages::PAGE_NOT_FOUND_NAME)
        .component("LAYOUT")
        .child({
            let mut child = RouteNode::new("", pages::PAGE_NOT_FOUND_NAME).component("EXCEPTION");
            child.meta.title = "ErrorPage".to_string();
            child.meta.hide_menu = true;
            child.meta.hide_breadcrumb = true;
            child
        });
    route.meta.title = "ErrorPage".to_string();
    route.meta.hide_menu = true;
    route.meta.hide_breadcrumb = true;
    route
}

/// The static routes registered before login. Their names form the reset
/// whitelist of the router.
pub fn basic_routes() -> Vec<RouteNode> {
    let mut login = RouteNode::new(pages::BASE_LOGIN, "Login");
    login.meta.title = "Login".to_string();

    let mut root = RouteNode::new("/", "Root").redirect(pages::BASE_HOME);
    root.meta.title = "Root".to_string();

    let mut redirect_child = RouteNode::new(":path", pages::REDIRECT_NAME).component("EXCEPTION");
    redirect_child.meta.title = pages::REDIRECT_NAME.to_string();
    redirect_child.meta.hide_breadcrumb = true;
    let mut redirect = RouteNode::new(pages::REDIRECT_PATH, "RedirectTo")
        .component("LAYOUT")
        .child(redirect_child);
    redirect.meta.title = pages::REDIRECT_NAME.to_string();
    redirect.meta.hide_menu = true;
    redirect.meta.hide_breadcrumb = true;

    vec![root, login, redirect, page_not_found_route()]
}

// ============================================================================
// Route building
// ============================================================================

/// Mark the route matching the user's home path as an affix tab, following a
/// redirect chain if the home path lands on a redirecting node. Stops at the
/// first hit.
pub fn patch_home_affix(routes: &mut [RouteNode], home_path: &str) {
    fn patcher(routes: &mut [RouteNode], parent: &str, home: &mut String) -> bool {
        for route in routes {
            let current = if route.path.starts_with('/') {
                route.path.clone()
            } else {
                join_paths(parent, &route.path)
            };
            if current == *home {
                match &route.redirect {
                    Some(redirect) => *home = redirect.clone(),
                    None => {
                        route.meta.affix = true;
                        return true;
                    }
                }
            }
            if patcher(&mut route.children, &current, home) {
                return true;
            }
        }
        false
    }
    let mut home = home_path.to_string();
    patcher(routes, "", &mut home);
}

/// Everything [`build_routes`] needs besides the permission state.
pub struct RouteBuildInput<'a> {
    /// Which pipeline branch to run.
    pub mode: PermissionMode,
    /// The caller's role set (route-mapping mode).
    pub roles: &'a [RoleId],
    /// Frontend-authored dynamic route modules (route-mapping mode).
    pub static_modules: &'a [RouteNode],
    /// Backend-delivered route descriptors (backend mode).
    pub backend_menu: Vec<RouteNode>,
    /// View table for component resolution.
    pub registry: &'a ViewRegistry,
    /// The user's landing page, marked as an affix tab.
    pub home_path: &'a str,
}

/// Build the authorized, materialized, depth-flattened route forest and store
/// the derived menus in `permission`.
pub fn build_routes(input: RouteBuildInput<'_>, permission: &mut PermissionState) -> Vec<RouteNode> {
    let ignore_filter = |node: &RouteNode| !node.meta.ignore_route;

    match input.mode {
        PermissionMode::RouteMapping => {
            let role_filter = |node: &RouteNode| roles_allow(node, input.roles);
            let mut routes = filter_tree(input.static_modules, &role_filter);
            // Top level is filtered explicitly as well.
            routes.retain(|node| role_filter(node));

            // Menus come from the role-filtered forest before menu-only
            // nodes are stripped; the two views diverge here.
            let menus = project_menus(&routes, true);

            let mut routes = filter_tree(&routes, &ignore_filter);
            routes.retain(|node| ignore_filter(node));

            permission.set_front_menu_list(menus);
            patch_home_affix(&mut routes, input.home_path);
            materialize_routes(&mut routes, input.registry);
            flat_multi_level_routes(&routes)
        }
        PermissionMode::Back => {
            let route_list = transform_backend_routes(input.backend_menu, input.registry);
            let menus = project_menus(&route_list, false);
            permission.set_back_menu_list(menus);

            let mut route_list = filter_tree(&route_list, &ignore_filter);
            route_list.retain(|node| ignore_filter(node));

            patch_home_affix(&mut route_list, input.home_path);
            let route_list = flat_multi_level_routes(&route_list);

            let mut routes = vec![page_not_found_route()];
            routes.extend(route_list);
            routes
        }
    }
}
