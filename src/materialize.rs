//! Route materialization: symbolic component strings become loadable view
//! handles.
//!
//! The host registers its view-module paths in a [`ViewRegistry`]; this module
//! resolves each route's symbolic `component` against it. Resolution rules, in
//! order:
//!
//! 1. case-insensitive layout markers (`LAYOUT`, `PARENT_LAYOUT`) resolve to
//!    the shared layout handles,
//! 2. exactly one registry entry whose normalized path (views prefix and
//!    extension stripped) equals the symbol resolves to that view,
//! 3. zero matches logs a warning and substitutes the exception view so
//!    navigation keeps working,
//! 4. multiple matches (colliding basenames with different extensions) log a
//!    warning and resolve to nothing, which leaves the route unreachable
//!    rather than silently picking the wrong view.
//!
//! A node with no component but a name and children is a grouping-only route
//! and receives the pass-through parent layout.
//!
//! Backend-delivered top-level routes whose component is a concrete view (not
//! a layout marker) are additionally wrapped in a synthetic layout parent
//! named `<name>Parent` with `meta.single` set, so every registered top-level
//! route renders inside the shell layout.

use crate::route::{Component, ComponentRef, RouteNode};

/// Marker string for the shared shell layout.
pub const LAYOUT: &str = "LAYOUT";
/// Marker string for the pass-through grouping layout.
pub const PARENT_LAYOUT: &str = "PARENT_LAYOUT";
/// Marker string for the fallback exception view.
pub const EXCEPTION: &str = "EXCEPTION";

/// The view-module path table supplied by the view-loading host.
///
/// Entries are module paths as the host discovered them, e.g.
/// `"../../views/system/account/index.vue"`. Lookup normalizes each entry by
/// stripping the views-directory prefix and the file extension.
#[derive(Debug, Clone, Default)]
pub struct ViewRegistry {
    prefix: String,
    modules: Vec<String>,
}

impl ViewRegistry {
    /// Create a registry whose entries start with `prefix`.
    pub fn new(prefix: impl Into<String>, modules: Vec<String>) -> Self {
        Self {
            prefix: prefix.into(),
            modules,
        }
    }

    /// Registry entries matching a symbolic component string.
    fn matches(&self, symbol: &str) -> Vec<&str> {
        let wanted = symbol.strip_prefix('/').unwrap_or(symbol);
        let keep_extension = symbol.rsplit_once('.').is_some_and(|(_, ext)| {
            !ext.contains('/') && ext.chars().all(char::is_alphanumeric)
        });
        self.modules
            .iter()
            .filter_map(|module| {
                let key = module.strip_prefix(&self.prefix).unwrap_or(module);
                let key = key.strip_prefix('/').unwrap_or(key);
                let key = if keep_extension {
                    key
                } else {
                    key.rsplit_once('.').map_or(key, |(stem, _)| stem)
                };
                (key == wanted).then_some(module.as_str())
            })
            .collect()
    }
}

/// Resolve one symbolic component string.
///
/// `None` means the route must be left without a component (ambiguous match).
pub fn resolve_view(registry: &ViewRegistry, symbol: &str, route_name: &str) -> Option<Component> {
    match symbol.to_uppercase().as_str() {
        LAYOUT => return Some(Component::Layout),
        PARENT_LAYOUT => return Some(Component::ParentLayout),
        EXCEPTION => return Some(Component::Exception),
        _ => {}
    }
    let matches = registry.matches(symbol);
    match matches.as_slice() {
        [only] => Some(Component::View((*only).to_string())),
        [] => {
            log::warn!(
                "component '{}' of route '{}' not found in the view registry, using exception view",
                symbol,
                route_name
            );
            Some(Component::Exception)
        }
        _ => {
            log::warn!(
                "component '{}' of route '{}' matches {} view modules, leaving it unresolved",
                symbol,
                route_name,
                matches.len()
            );
            None
        }
    }
}

/// Resolve every symbolic component in a route forest, in place.
pub fn materialize_routes(routes: &mut [RouteNode], registry: &ViewRegistry) {
    for route in routes.iter_mut() {
        match route.component.take() {
            Some(ComponentRef::Symbolic(symbol)) => {
                route.component =
                    resolve_view(registry, &symbol, &route.name).map(ComponentRef::Resolved);
            }
            already_resolved @ Some(ComponentRef::Resolved(_)) => {
                route.component = already_resolved;
            }
            None => {
                // Grouping-only node: pass-through layout.
                if !route.name.is_empty() && !route.children.is_empty() {
                    route.component = Some(ComponentRef::Resolved(Component::ParentLayout));
                }
            }
        }
        materialize_routes(&mut route.children, registry);
    }
}

/// Convert backend-delivered route descriptors into registrable routes.
///
/// Top-level rules: a `LAYOUT` marker resolves directly; any other component
/// string is promoted into a synthetic single-child layout wrapper; a missing
/// component is a configuration error (warned, node kept as-is). Children are
/// then materialized recursively.
pub fn transform_backend_routes(
    routes: Vec<RouteNode>,
    registry: &ViewRegistry,
) -> Vec<RouteNode> {
    let mut out = Vec::with_capacity(routes.len());
    for mut route in routes {
        match route.component.as_ref().and_then(ComponentRef::as_symbolic) {
            Some(symbol) if symbol.eq_ignore_ascii_case(LAYOUT) => {
                route.component = Some(ComponentRef::Resolved(Component::Layout));
            }
            Some(_) => {
                route = wrap_in_layout_parent(route);
            }
            None => {
                log::warn!(
                    "backend route '{}' has no component configured",
                    route.name
                );
            }
        }
        materialize_routes(&mut route.children, registry);
        out.push(route);
    }
    out
}

/// Wrap a view-level top route in a synthetic layout parent so it renders
/// inside the shell. The wrapper carries the `single` marker the menu
/// projector uses to skip it.
fn wrap_in_layout_parent(route: RouteNode) -> RouteNode {
    let inner = route.clone();
    let mut wrapper = route;
    wrapper.name = format!("{}Parent", wrapper.name);
    wrapper.path = String::new();
    wrapper.component = Some(ComponentRef::Resolved(Component::Layout));
    wrapper.redirect = None;
    wrapper.meta.single = true;
    wrapper.meta.affix = false;
    wrapper.children = vec![inner];
    wrapper
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn registry() -> ViewRegistry {
        ViewRegistry::new(
            "../../views",
            vec![
                "../../views/dashboard/analytics/index.vue".to_string(),
                "../../views/system/account/index.vue".to_string(),
                "../../views/clash/both.vue".to_string(),
                "../../views/clash/both.tsx".to_string(),
            ],
        )
    }

    #[test]
    fn layout_markers_are_case_insensitive() {
        let reg = registry();
        assert_eq!(resolve_view(&reg, "layout", "X"), Some(Component::Layout));
        assert_eq!(
            resolve_view(&reg, "Parent_Layout", "X"),
            Some(Component::ParentLayout)
        );
    }

    #[test]
    fn unique_match_resolves_to_view() {
        let resolved = resolve_view(&registry(), "/system/account/index", "Account");
        assert_eq!(
            resolved,
            Some(Component::View(
                "../../views/system/account/index.vue".to_string()
            ))
        );
    }

    #[test]
    fn leading_slash_is_optional() {
        let with = resolve_view(&registry(), "/dashboard/analytics/index", "A");
        let without = resolve_view(&registry(), "dashboard/analytics/index", "A");
        assert_eq!(with, without);
    }

    #[test]
    fn missing_view_falls_back_to_exception() {
        let resolved = resolve_view(&registry(), "/does/not/exist", "Ghost");
        assert_eq!(resolved, Some(Component::Exception));
    }

    #[test]
    fn ambiguous_match_resolves_to_nothing() {
        assert_eq!(resolve_view(&registry(), "/clash/both", "Clash"), None);
    }

    #[test]
    fn explicit_extension_disambiguates() {
        let resolved = resolve_view(&registry(), "/clash/both.tsx", "Clash");
        assert_eq!(
            resolved,
            Some(Component::View("../../views/clash/both.tsx".to_string()))
        );
    }

    #[test]
    fn grouping_node_gets_parent_layout() {
        let mut routes = vec![RouteNode::new("/group", "Group")
            .child(RouteNode::new("leaf", "Leaf").component("/system/account/index"))];
        materialize_routes(&mut routes, &registry());
        assert_eq!(
            routes[0].component.as_ref().and_then(ComponentRef::as_resolved),
            Some(&Component::ParentLayout)
        );
        assert!(matches!(
            routes[0].children[0]
                .component
                .as_ref()
                .and_then(ComponentRef::as_resolved),
            Some(Component::View(_))
        ));
    }

    #[test]
    fn backend_layout_route_resolves_in_place() {
        let routes = vec![RouteNode::new("/system", "System")
            .component("LAYOUT")
            .child(RouteNode::new("account", "Account").component("/system/account/index"))];
        let out = transform_backend_routes(routes, &registry());
        assert_eq!(out[0].name, "System");
        assert_eq!(
            out[0].component.as_ref().and_then(ComponentRef::as_resolved),
            Some(&Component::Layout)
        );
    }

    #[test]
    fn backend_view_route_is_wrapped() {
        let mut route = RouteNode::new("/about", "About").component("/dashboard/analytics/index");
        route.meta.affix = true;
        let out = transform_backend_routes(vec![route], &registry());

        let wrapper = &out[0];
        assert_eq!(wrapper.name, "AboutParent");
        assert_eq!(wrapper.path, "");
        assert!(wrapper.meta.single);
        assert!(!wrapper.meta.affix);
        assert_eq!(
            wrapper.component.as_ref().and_then(ComponentRef::as_resolved),
            Some(&Component::Layout)
        );

        let inner = &wrapper.children[0];
        assert_eq!(inner.name, "About");
        assert_eq!(inner.path, "/about");
        assert!(inner.meta.affix);
        assert!(matches!(
            inner.component.as_ref().and_then(ComponentRef::as_resolved),
            Some(Component::View(_))
        ));
    }
}
