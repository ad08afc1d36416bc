//! Menu projection.
//!
//! Derives the rendered menu forest from an authorized route forest. The input
//! is the role-filtered tree *before* depth flattening; the projection is
//! independent of the flattening step so deep trees still render as deep
//! menus.
//!
//! Projection rules:
//!
//! - a route with `hide_menu` set produces no menu entry (subtree included),
//! - `hide_children_in_menu` keeps the entry but collapses its children,
//! - a synthetic single-child wrapper (`meta.single`) is skipped in favor of
//!   its sole child,
//! - siblings are ordered by `order_no` ascending, ties keep authored order.

use crate::params::RouteParams;
use crate::route::{join_paths, RouteNode};
use serde::{Deserialize, Serialize};

/// A node in the rendered navigation-menu tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MenuNode {
    /// Identity: the backing route's name.
    pub id: String,
    /// Display label (route title, falling back to the route name).
    pub name: String,
    /// Absolute path this entry navigates to.
    pub path: String,
    /// Original parameterized path, kept once dynamic segments have been
    /// substituted so later navigations can re-substitute.
    pub param_path: Option<String>,
    /// Icon identifier, if the route declares one.
    pub icon: Option<String>,
    /// Sibling sort key.
    pub order_no: i32,
    /// Child entries.
    pub children: Vec<MenuNode>,
}

/// Top-level preprocessing: apply the redirect shortcut and unwrap synthetic
/// single-child wrappers.
///
/// `route_mapping` enables the redirect shortcut used when routes are authored
/// in the frontend: a top-level node hiding its children navigates straight to
/// its redirect target.
fn promote_top_level(routes: &[RouteNode], route_mapping: bool) -> Vec<RouteNode> {
    let mut top = Vec::with_capacity(routes.len());
    for route in routes {
        let mut route = route.clone();
        if route_mapping && route.meta.hide_children_in_menu {
            if let Some(redirect) = &route.redirect {
                route.path = redirect.clone();
            }
        }
        if route.meta.single {
            // Synthetic wrapper: render its sole child instead.
            if let Some(real) = route.children.first() {
                top.push(real.clone());
            }
        } else {
            top.push(route);
        }
    }
    top
}

/// Project an authorized route forest into a menu forest: wrapper promotion,
/// hidden-entry filtering, path composition and ordering.
pub fn project_menus(routes: &[RouteNode], route_mapping: bool) -> Vec<MenuNode> {
    let top = promote_top_level(routes, route_mapping);
    let mut menus: Vec<MenuNode> = top.iter().filter_map(to_menu).collect();
    join_parent_paths(&mut menus, "");
    sort_menus(&mut menus);
    menus
}

fn to_menu(route: &RouteNode) -> Option<MenuNode> {
    if route.meta.hide_menu {
        return None;
    }
    let children = if route.meta.hide_children_in_menu {
        Vec::new()
    } else {
        route.children.iter().filter_map(to_menu).collect()
    };
    let name = if route.meta.title.is_empty() {
        route.name.clone()
    } else {
        route.meta.title.clone()
    };
    Some(MenuNode {
        id: route.name.clone(),
        name,
        path: route.path.clone(),
        param_path: None,
        icon: route.meta.icon.clone(),
        order_no: route.meta.order_no,
        children,
    })
}

fn join_parent_paths(menus: &mut [MenuNode], parent: &str) {
    for menu in menus {
        if !menu.path.starts_with('/') {
            menu.path = join_paths(parent, &menu.path);
        }
        join_parent_paths(&mut menu.children, &menu.path.clone());
    }
}

fn sort_menus(menus: &mut [MenuNode]) {
    menus.sort_by_key(|m| m.order_no);
    for menu in menus {
        sort_menus(&mut menu.children);
    }
}

/// Substitute the resolved path parameters of the current navigation into a
/// parameterized menu entry, recursively.
///
/// The first substitution stashes the original pattern in `param_path` so the
/// entry can be re-substituted on later navigations with different parameter
/// values. Segments with no matching parameter keep their placeholder.
pub fn configure_dynamic_params_menu(menu: &mut MenuNode, params: &RouteParams) {
    let template = menu
        .param_path
        .clone()
        .unwrap_or_else(|| menu.path.clone());
    let has_params = template
        .split('/')
        .any(|segment| segment.starts_with(':'));
    if has_params {
        if menu.param_path.is_none() {
            menu.param_path = Some(menu.path.clone());
        }
        menu.path = template
            .split('/')
            .map(|segment| match segment.strip_prefix(':') {
                Some(name) => params.get(name).unwrap_or(segment),
                None => segment,
            })
            .collect::<Vec<_>>()
            .join("/");
    }
    for child in &mut menu.children {
        configure_dynamic_params_menu(child, params);
    }
}
