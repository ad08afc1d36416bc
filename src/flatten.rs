//! Multi-level route flattening.
//!
//! The navigation shell renders at most two menu levels, so any authorized
//! route subtree deeper than that is promoted: every descendant, at any
//! original depth, becomes an immediate child of its top-level ancestor. Path
//! reachability is preserved because promotion first resolves each
//! descendant's absolute path the same way the router would (parent/child
//! composition, absolute child paths winning), then reattaches the resolved
//! records.
//!
//! Resolution is a standalone walk over the subtree — no router instance is
//! required to obtain the composed paths.
//!
//! Flattening is idempotent: a forest that is already at most two levels deep
//! is returned unchanged.

use crate::route::{join_paths, RouteNode};

/// Convert a multi-level route forest into a two-level one.
///
/// The input is cloned; only top-level nodes whose subtree exceeds two levels
/// are rewritten.
pub fn flat_multi_level_routes(modules: &[RouteNode]) -> Vec<RouteNode> {
    let mut modules = modules.to_vec();
    for module in &mut modules {
        if module.is_multi_level() {
            promote_route_level(module);
        }
    }
    modules
}

/// Rewrite one top-level node so every descendant hangs directly off it.
fn promote_route_level(module: &mut RouteNode) {
    // Simulate full route resolution to get absolute paths for the whole
    // subtree, then reattach descendants by name.
    let resolved = resolve_routes(module);
    let original_children = module.children.clone();
    add_to_children(&resolved, &original_children, module);

    // The reattached nodes are leaves of a two-level tree now.
    for child in &mut module.children {
        child.children.clear();
    }
}

/// One record in the resolved flat route list: a clone of the node with its
/// path rewritten to the absolute composed form.
fn resolve_routes(module: &RouteNode) -> Vec<RouteNode> {
    let mut out = Vec::new();
    resolve_into(module, "", &mut out);
    out
}

fn resolve_into(node: &RouteNode, parent_path: &str, out: &mut Vec<RouteNode>) {
    let absolute = join_paths(parent_path, &node.path);
    let mut record = node.clone();
    record.path = absolute.clone();
    out.push(record);
    for child in &node.children {
        resolve_into(child, &absolute, out);
    }
}

/// Attach every descendant in `children` (recursively) as an immediate child
/// of `module`, looking each one up in the resolved list by name and skipping
/// names already present.
fn add_to_children(resolved: &[RouteNode], children: &[RouteNode], module: &mut RouteNode) {
    for child in children {
        let Some(record) = resolved.iter().find(|r| r.name == child.name) else {
            continue;
        };
        if !module.children.iter().any(|c| c.name == record.name) {
            module.children.push(record.clone());
        }
        if !child.children.is_empty() {
            add_to_children(resolved, &child.children, module);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn three_level_module() -> RouteNode {
        RouteNode::new("/system", "System").children(vec![
            RouteNode::new("settings", "Settings").children(vec![
                RouteNode::new("profile", "Profile"),
                RouteNode::new("security", "Security"),
            ]),
            RouteNode::new("logs", "Logs"),
        ])
    }

    #[test]
    fn flat_tree_is_untouched() {
        let flat = vec![RouteNode::new("/a", "A").child(RouteNode::new("b", "B"))];
        assert_eq!(flat_multi_level_routes(&flat), flat);
    }

    #[test]
    fn deep_descendants_become_direct_children() {
        let flattened = flat_multi_level_routes(&[three_level_module()]);
        let module = &flattened[0];

        // Existing direct children keep their positions; promoted
        // descendants append after them.
        let names: Vec<&str> = module.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Settings", "Logs", "Profile", "Security"]);
        assert!(module.children.iter().all(|c| c.children.is_empty()));
    }

    #[test]
    fn promoted_paths_are_absolute() {
        let flattened = flat_multi_level_routes(&[three_level_module()]);
        let profile = flattened[0]
            .children
            .iter()
            .find(|c| c.name == "Profile")
            .unwrap();
        assert_eq!(profile.path, "/system/settings/profile");
    }

    #[test]
    fn absolute_child_paths_are_respected() {
        let module = RouteNode::new("/a", "A")
            .child(RouteNode::new("b", "B").child(RouteNode::new("/elsewhere/c", "C")));
        let flattened = flat_multi_level_routes(&[module]);
        let c = flattened[0]
            .children
            .iter()
            .find(|c| c.name == "C")
            .unwrap();
        assert_eq!(c.path, "/elsewhere/c");
    }

    #[test]
    fn metadata_survives_promotion() {
        let mut module = three_level_module();
        module.children[0].children[0].meta.ignore_keep_alive = true;
        let flattened = flat_multi_level_routes(&[module]);
        let profile = flattened[0]
            .children
            .iter()
            .find(|c| c.name == "Profile")
            .unwrap();
        assert!(profile.meta.ignore_keep_alive);
    }

    #[test]
    fn duplicate_names_are_skipped() {
        // A descendant sharing a name with an existing direct child must not
        // be attached twice.
        let module = RouteNode::new("/a", "A").children(vec![
            RouteNode::new("b", "B").child(RouteNode::new("dup", "Dup")),
            RouteNode::new("dup-top", "Dup"),
        ]);
        let flattened = flat_multi_level_routes(&[module]);
        let count = flattened[0]
            .children
            .iter()
            .filter(|c| c.name == "Dup")
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn flattening_is_idempotent() {
        let once = flat_multi_level_routes(&[three_level_module()]);
        let twice = flat_multi_level_routes(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn leaf_names_are_preserved() {
        let original = three_level_module();
        let mut before: Vec<String> = original
            .leaf_names()
            .into_iter()
            .map(String::from)
            .collect();
        before.sort();

        let flattened = flat_multi_level_routes(&[original]);
        let mut after: Vec<String> = flattened[0]
            .children
            .iter()
            .map(|c| c.name.clone())
            .collect();
        // The top node's former intermediate nodes are now leaves too; the
        // original leaf set must be a subset of the flattened children.
        after.sort();
        for name in before {
            assert!(after.contains(&name), "missing leaf {name}");
        }
    }
}
