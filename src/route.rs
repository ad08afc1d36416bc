//! The route data model.
//!
//! [`RouteNode`] is a node in the authored (or backend-delivered) navigation
//! tree: a path, an optional component reference, optional redirect, children,
//! and a [`RouteMeta`] bag that drives permission filtering, menu projection,
//! and tab behavior.
//!
//! Component references start life as symbolic strings ([`ComponentRef::Symbolic`])
//! and are resolved to concrete [`Component`] handles by the
//! [`materialize`](crate::materialize) step. Every reachable node must carry a
//! non-empty `name` once materialized; anonymous nodes are warned about and
//! excluded from tab/keep-alive bookkeeping.
//!
//! The tree is serde-deserializable because the backend permission mode
//! delivers route descriptors as JSON (camelCase field names).

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// A role identifier as carried in route metadata and the user's role list.
pub type RoleId = String;

/// A resolved, loadable view reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Component {
    /// The shared application shell layout.
    Layout,
    /// Pass-through wrapper for grouping-only routes.
    ParentLayout,
    /// A concrete view module, identified by its registry path.
    View(String),
    /// Fallback exception view substituted when resolution fails.
    Exception,
}

/// A component reference on a route: symbolic until materialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ComponentRef {
    /// A symbolic string as authored or delivered by the backend, e.g.
    /// `"LAYOUT"` or `"/dashboard/analytics/index"`.
    Symbolic(String),
    /// A resolved view handle.
    Resolved(Component),
}

impl ComponentRef {
    /// The symbolic string, if not yet resolved.
    pub fn as_symbolic(&self) -> Option<&str> {
        match self {
            Self::Symbolic(s) => Some(s),
            Self::Resolved(_) => None,
        }
    }

    /// The resolved component, if materialization has run.
    pub fn as_resolved(&self) -> Option<&Component> {
        match self {
            Self::Resolved(c) => Some(c),
            Self::Symbolic(_) => None,
        }
    }
}

impl From<String> for ComponentRef {
    fn from(s: String) -> Self {
        Self::Symbolic(s)
    }
}

impl From<ComponentRef> for String {
    fn from(c: ComponentRef) -> Self {
        match c {
            ComponentRef::Symbolic(s) => s,
            ComponentRef::Resolved(Component::Layout) => "LAYOUT".to_string(),
            ComponentRef::Resolved(Component::ParentLayout) => "PARENT_LAYOUT".to_string(),
            ComponentRef::Resolved(Component::View(key)) => key,
            ComponentRef::Resolved(Component::Exception) => "EXCEPTION".to_string(),
        }
    }
}

/// Metadata attached to a route node.
///
/// Everything defaults to falsy/zero; backend payloads only need to send the
/// fields they care about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RouteMeta {
    /// Display title (menu entry, tab label, breadcrumb).
    pub title: String,
    /// Optional icon identifier for the menu.
    pub icon: Option<String>,
    /// Roles allowed to see this route. Empty means unrestricted.
    pub roles: Vec<RoleId>,
    /// Reachable without a login session.
    pub ignore_auth: bool,
    /// Menu-only node: excluded from the registered route table.
    pub ignore_route: bool,
    /// Sibling sort key in the menu; missing means 0.
    pub order_no: i32,
    /// Pinned tab, immune to bulk and interactive close.
    pub affix: bool,
    /// Cap on simultaneously open tab instances of this parameterized route.
    /// Values `<= 0` mean unlimited.
    pub dynamic_level: i32,
    /// Identity key for dynamic-level counting (the un-parameterized path).
    pub real_path: String,
    /// Hide this node from the menu.
    pub hide_menu: bool,
    /// Never record this route as a tab.
    pub hide_tab: bool,
    /// Hide this node from the breadcrumb trail.
    pub hide_breadcrumb: bool,
    /// Collapse this node's children out of the menu (route table unaffected).
    pub hide_children_in_menu: bool,
    /// Exclude this route's view from the keep-alive cache set.
    pub ignore_keep_alive: bool,
    /// Synthetic wrapper created by backend route promotion; the menu renders
    /// its sole child instead of the wrapper itself.
    pub single: bool,
    /// Set by the page guard once this path has been visited.
    pub loaded: bool,
}

impl Default for RouteMeta {
    fn default() -> Self {
        Self {
            title: String::new(),
            icon: None,
            roles: Vec::new(),
            ignore_auth: false,
            ignore_route: false,
            order_no: 0,
            affix: false,
            dynamic_level: -1,
            real_path: String::new(),
            hide_menu: false,
            hide_tab: false,
            hide_breadcrumb: false,
            hide_children_in_menu: false,
            ignore_keep_alive: false,
            single: false,
            loaded: false,
        }
    }
}

/// A node in the navigation route tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RouteNode {
    /// Path segment (absolute for top-level nodes, relative or absolute for
    /// children).
    pub path: String,
    /// Unique route name. Required for registration, tab identity and
    /// keep-alive caching.
    pub name: String,
    /// Component reference; `None` for grouping-only nodes (they receive the
    /// parent layout during materialization).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<ComponentRef>,
    /// Optional redirect target.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    /// Child routes.
    pub children: Vec<RouteNode>,
    /// Route metadata.
    pub meta: RouteMeta,
}

impl RouteNode {
    /// Create a node with a path and name.
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set a symbolic component reference.
    pub fn component(mut self, symbol: impl Into<String>) -> Self {
        self.component = Some(ComponentRef::Symbolic(symbol.into()));
        self
    }

    /// Set the redirect target.
    pub fn redirect(mut self, to: impl Into<String>) -> Self {
        self.redirect = Some(to.into());
        self
    }

    /// Append a child route.
    pub fn child(mut self, child: RouteNode) -> Self {
        self.children.push(child);
        self
    }

    /// Replace the children list.
    pub fn children(mut self, children: Vec<RouteNode>) -> Self {
        self.children = children;
        self
    }

    /// Replace the metadata.
    pub fn meta(mut self, meta: RouteMeta) -> Self {
        self.meta = meta;
        self
    }

    /// Set the allowed roles.
    pub fn roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.meta.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    /// Set the menu sort key.
    pub fn order_no(mut self, order: i32) -> Self {
        self.meta.order_no = order;
        self
    }

    /// Whether any child of this node has children of its own, i.e. the
    /// subtree exceeds the two levels the navigation shell can render.
    pub fn is_multi_level(&self) -> bool {
        self.children.iter().any(|c| !c.children.is_empty())
    }

    /// Collect the names of all leaf nodes in this subtree.
    pub fn leaf_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        collect_leaf_names(self, &mut names);
        names
    }
}

fn collect_leaf_names<'a>(node: &'a RouteNode, out: &mut Vec<&'a str>) {
    if node.children.is_empty() {
        out.push(node.name.as_str());
    } else {
        for child in &node.children {
            collect_leaf_names(child, out);
        }
    }
}

/// Normalize a path: leading slash ensured, trailing slash removed, empty
/// becomes `/`. Borrows when the input is already normalized.
pub fn normalize_path(path: &str) -> Cow<'_, str> {
    if path.is_empty() || path == "/" {
        return Cow::Borrowed("/");
    }
    if path.starts_with('/') && !path.ends_with('/') {
        return Cow::Borrowed(path);
    }
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        Cow::Borrowed("/")
    } else {
        Cow::Owned(format!("/{trimmed}"))
    }
}

/// Compose a child path against its parent's absolute path.
///
/// An absolute child path wins outright; an empty child path denotes an index
/// route and keeps the parent path.
pub fn join_paths(parent: &str, child: &str) -> String {
    if child.starts_with('/') {
        return normalize_path(child).into_owned();
    }
    if child.is_empty() {
        return normalize_path(parent).into_owned();
    }
    let parent = normalize_path(parent);
    let parent = parent.trim_end_matches('/');
    format!("{parent}/{child}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_level_detection() {
        let flat = RouteNode::new("/a", "A").child(RouteNode::new("b", "B"));
        assert!(!flat.is_multi_level());

        let deep = RouteNode::new("/a", "A")
            .child(RouteNode::new("b", "B").child(RouteNode::new("c", "C")));
        assert!(deep.is_multi_level());
    }

    #[test]
    fn leaf_names_cover_all_depths() {
        let tree = RouteNode::new("/a", "A")
            .child(RouteNode::new("b", "B").child(RouteNode::new("c", "C")))
            .child(RouteNode::new("d", "D"));
        assert_eq!(tree.leaf_names(), vec!["C", "D"]);
    }

    #[test]
    fn path_joining() {
        assert_eq!(join_paths("/dash", "analytics"), "/dash/analytics");
        assert_eq!(join_paths("/dash", "/abs"), "/abs");
        assert_eq!(join_paths("/dash", ""), "/dash");
        assert_eq!(join_paths("/", "home"), "/home");
    }

    #[test]
    fn normalize_variants() {
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("dash"), "/dash");
        assert_eq!(normalize_path("/dash/"), "/dash");
        assert_eq!(normalize_path("/dash"), "/dash");
    }

    #[test]
    fn backend_payload_deserializes() {
        let json = r#"{
            "path": "/system",
            "name": "System",
            "component": "LAYOUT",
            "meta": { "title": "System", "orderNo": 3, "roles": ["admin"] },
            "children": [
                { "path": "account", "name": "Account", "component": "/system/account/index",
                  "meta": { "ignoreKeepAlive": true } }
            ]
        }"#;
        let node: RouteNode = serde_json::from_str(json).unwrap();
        assert_eq!(node.meta.order_no, 3);
        assert_eq!(node.meta.roles, vec!["admin".to_string()]);
        assert_eq!(
            node.component.as_ref().and_then(ComponentRef::as_symbolic),
            Some("LAYOUT")
        );
        assert!(node.children[0].meta.ignore_keep_alive);
        assert_eq!(node.children[0].meta.dynamic_level, -1);
    }
}
