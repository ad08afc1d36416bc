//! The tab ledger: ordered open-page tabs, the derived keep-alive cache set,
//! and the drag-reorder counter.
//!
//! Tab identity is the full path (path plus query), falling back to the bare
//! path. Navigating to an already-open identity updates that tab in place;
//! it never duplicates or reorders. Routes for the login, redirect, exception
//! and not-found sentinels are never recorded.
//!
//! A parameterized route may cap how many of its instances can be open at
//! once (`meta.dynamic_level`, counted per `meta.real_path`). When the cap is
//! reached the earliest-opened instance is evicted; eviction is by insertion
//! position, not by last visit.
//!
//! The ledger never navigates itself. Operations that imply a navigation
//! return a [`TabNavTarget`] the caller feeds back into the navigator.

use crate::error::NavError;
use crate::params::{QueryParams, RouteParams};
use crate::route::RouteMeta;
use crate::settings::pages;
use crate::state::NavigationRequest;
use crate::storage::{keys, CacheStore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One open page instance in the multi-tab UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Tab {
    /// Identity key: path including the query string.
    pub full_path: String,
    /// Path without the query string.
    pub path: String,
    /// Matched route name; keep-alive cache key.
    pub name: String,
    /// Resolved path parameters.
    pub params: RouteParams,
    /// Parsed query parameters.
    pub query: QueryParams,
    /// Metadata of the matched route at open time.
    pub meta: RouteMeta,
}

impl Default for Tab {
    fn default() -> Self {
        Self {
            full_path: String::new(),
            path: String::new(),
            name: String::new(),
            params: RouteParams::new(),
            query: QueryParams::new(),
            meta: RouteMeta::default(),
        }
    }
}

impl From<&NavigationRequest> for Tab {
    fn from(request: &NavigationRequest) -> Self {
        Self {
            full_path: request.full_path.clone(),
            path: request.path.clone(),
            name: request.name.clone(),
            params: request.params.clone(),
            query: request.query.clone(),
            meta: request.meta.clone(),
        }
    }
}

impl Tab {
    fn key(&self) -> &str {
        if self.full_path.is_empty() {
            &self.path
        } else {
            &self.full_path
        }
    }
}

/// Where the caller should navigate after a ledger operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabNavTarget {
    /// No navigation required.
    Stay,
    /// Navigate to the configured home path.
    Home,
    /// Navigate to a concrete full path.
    FullPath(String),
}

/// Ordered tab list with derived keep-alive cache set.
#[derive(Debug, Default)]
pub struct TabLedger {
    tabs: Vec<Tab>,
    cached_names: BTreeSet<String>,
    reorder_count: u64,
}

impl TabLedger {
    /// An empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// The open tabs, in display order.
    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    /// Number of open tabs.
    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    /// Whether no tab is open.
    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    /// Route names whose views should stay cached across navigation.
    pub fn cached_names(&self) -> &BTreeSet<String> {
        &self.cached_names
    }

    /// Incremented on every drag reorder; lets observers tell drag-triggered
    /// changes from content changes.
    pub fn reorder_count(&self) -> u64 {
        self.reorder_count
    }

    /// Find an open tab by identity key.
    pub fn find(&self, full_path: &str) -> Option<&Tab> {
        self.tabs.iter().find(|tab| tab.key() == full_path)
    }

    fn position(&self, full_path: &str) -> Option<usize> {
        self.tabs.iter().position(|tab| tab.key() == full_path)
    }

    /// Record a committed navigation.
    ///
    /// Sentinel routes (login, redirect, exception, not-found), anonymous
    /// routes and `hide_tab` routes are skipped. An existing identity is
    /// updated in place; a new one is appended, evicting the oldest
    /// same-`real_path` tab first when the route's dynamic level is reached.
    pub fn add_tab(&mut self, request: &NavigationRequest) {
        if is_tab_exempt(request) {
            return;
        }

        let key = if request.full_path.is_empty() {
            request.path.as_str()
        } else {
            request.full_path.as_str()
        };
        if let Some(index) = self.position(key) {
            let tab = &mut self.tabs[index];
            tab.params = request.params.clone();
            tab.query = request.query.clone();
            tab.full_path = request.full_path.clone();
        } else {
            let dynamic_level = request.meta.dynamic_level;
            if dynamic_level > 0 {
                let real_path = &request.meta.real_path;
                let open = self
                    .tabs
                    .iter()
                    .filter(|tab| tab.meta.real_path == *real_path)
                    .count();
                if open >= dynamic_level as usize {
                    // Evict by insertion position, not by last visit.
                    if let Some(oldest) = self
                        .tabs
                        .iter()
                        .position(|tab| tab.meta.real_path == *real_path)
                    {
                        self.tabs.remove(oldest);
                    }
                }
            }
            self.tabs.push(Tab::from(request));
        }
        self.update_cache();
    }

    fn update_cache(&mut self) {
        self.cached_names = self
            .tabs
            .iter()
            .filter(|tab| !tab.meta.ignore_keep_alive && !tab.name.is_empty())
            .map(|tab| tab.name.clone())
            .collect();
    }

    /// Drop the keep-alive cache set without touching the tabs.
    pub fn clear_cache(&mut self) {
        self.cached_names.clear();
    }

    /// Close one tab.
    ///
    /// Affix tabs are immune. Closing a tab that is not the current route
    /// removes it without navigation. Closing the current route picks a
    /// replacement: right neighbor when it was leftmost, home when it was the
    /// only tab, left neighbor otherwise.
    pub fn close_tab(&mut self, full_path: &str, current_full_path: &str) -> TabNavTarget {
        let Some(index) = self.position(full_path) else {
            return TabNavTarget::Stay;
        };
        if self.tabs[index].meta.affix {
            log::debug!("refusing to close affix tab '{}'", full_path);
            return TabNavTarget::Stay;
        }

        if self.tabs[index].key() != current_full_path {
            self.tabs.remove(index);
            self.update_cache();
            return TabNavTarget::Stay;
        }

        let target = if index == 0 {
            match self.tabs.get(1) {
                Some(right) => TabNavTarget::FullPath(right.key().to_string()),
                None => TabNavTarget::Home,
            }
        } else {
            TabNavTarget::FullPath(self.tabs[index - 1].key().to_string())
        };
        self.tabs.remove(index);
        self.update_cache();
        target
    }

    /// Close every non-affix tab strictly left of the reference tab.
    pub fn close_left(&mut self, full_path: &str, current_full_path: &str) -> TabNavTarget {
        if let Some(index) = self.position(full_path) {
            let keep: Vec<Tab> = self
                .tabs
                .iter()
                .enumerate()
                .filter(|(i, tab)| *i >= index || tab.meta.affix)
                .map(|(_, tab)| tab.clone())
                .collect();
            self.tabs = keep;
            self.update_cache();
        }
        self.after_bulk_close(current_full_path)
    }

    /// Close every non-affix tab strictly right of the reference tab.
    pub fn close_right(&mut self, full_path: &str, current_full_path: &str) -> TabNavTarget {
        if let Some(index) = self.position(full_path) {
            let keep: Vec<Tab> = self
                .tabs
                .iter()
                .enumerate()
                .filter(|(i, tab)| *i <= index || tab.meta.affix)
                .map(|(_, tab)| tab.clone())
                .collect();
            self.tabs = keep;
            self.update_cache();
        }
        self.after_bulk_close(current_full_path)
    }

    /// Close every non-affix tab except the reference tab.
    pub fn close_other(&mut self, full_path: &str, current_full_path: &str) -> TabNavTarget {
        self.tabs
            .retain(|tab| tab.key() == full_path || tab.meta.affix);
        self.update_cache();
        self.after_bulk_close(current_full_path)
    }

    /// Close every non-affix tab.
    pub fn close_all(&mut self, current_full_path: &str) -> TabNavTarget {
        self.tabs.retain(|tab| tab.meta.affix);
        self.update_cache();
        self.after_bulk_close(current_full_path)
    }

    /// After a bulk close: stay if the current route is still open, otherwise
    /// go to the new last tab, or home when none remain.
    fn after_bulk_close(&self, current_full_path: &str) -> TabNavTarget {
        if self.position(current_full_path).is_some() {
            return TabNavTarget::Stay;
        }
        match self.tabs.last() {
            Some(last) => TabNavTarget::FullPath(last.key().to_string()),
            None => TabNavTarget::Home,
        }
    }

    /// Move one tab (drag reorder). Stable single-element move; bumps the
    /// reorder counter.
    pub fn reorder(&mut self, old_index: usize, new_index: usize) {
        if old_index >= self.tabs.len() || new_index >= self.tabs.len() {
            return;
        }
        let tab = self.tabs.remove(old_index);
        self.tabs.insert(new_index, tab);
        self.reorder_count += 1;
    }

    /// Refresh the current page: drop its view from the keep-alive cache and
    /// bounce through the redirect route so it remounts.
    pub fn refresh_page(&mut self, current: &NavigationRequest) -> TabNavTarget {
        self.cached_names.remove(&current.name);
        TabNavTarget::FullPath(format!("{}{}", pages::REDIRECT_PATH, current.full_path))
    }

    /// Override the display title of an open tab.
    pub fn set_tab_title(&mut self, full_path: &str, title: impl Into<String>) {
        if let Some(index) = self.position(full_path) {
            self.tabs[index].meta.title = title.into();
        }
    }

    /// Rewrite the path of an open tab (e.g. after a parameter change that
    /// keeps the same page instance).
    pub fn update_tab_path(&mut self, full_path: &str, new_path: impl Into<String>) {
        if let Some(index) = self.position(full_path) {
            let new_path = new_path.into();
            let tab = &mut self.tabs[index];
            tab.full_path = new_path.clone();
            tab.path = new_path;
        }
    }

    /// Drop everything; called on logout.
    pub fn reset(&mut self) {
        self.tabs.clear();
        self.cached_names.clear();
        self.reorder_count = 0;
    }

    /// Persist the open-tab list.
    pub fn save_to(&self, store: &mut CacheStore) -> Result<(), NavError> {
        store.set_local_json(keys::MULTIPLE_TABS_KEY, &self.tabs)
    }

    /// Restore a persisted tab list, recomputing the cache set. A missing or
    /// corrupt entry leaves the ledger empty.
    pub fn load_from(&mut self, store: &CacheStore) {
        if let Some(tabs) = store.get_local_json::<Vec<Tab>>(keys::MULTIPLE_TABS_KEY) {
            self.tabs = tabs;
            self.update_cache();
        }
    }
}

/// Routes that must never appear as tabs.
fn is_tab_exempt(request: &NavigationRequest) -> bool {
    if request.meta.hide_tab {
        return true;
    }
    if request.name.is_empty() {
        log::warn!("not recording tab for anonymous route '{}'", request.path);
        return true;
    }
    request.path == pages::ERROR_PAGE
        || request.path == pages::BASE_LOGIN
        || request.path.starts_with(pages::REDIRECT_PATH)
        || request.name == pages::REDIRECT_NAME
        || request.name == pages::PAGE_NOT_FOUND_NAME
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn request(full_path: &str, name: &str) -> NavigationRequest {
        let mut request = NavigationRequest::new(full_path);
        request.name = name.to_string();
        request
    }

    fn affix_request(full_path: &str, name: &str) -> NavigationRequest {
        let mut request = request(full_path, name);
        request.meta.affix = true;
        request
    }

    #[test]
    fn existing_identity_updates_in_place() {
        let mut ledger = TabLedger::new();
        ledger.add_tab(&request("/users/1?tab=a", "UserDetail"));
        ledger.add_tab(&request("/orders", "Orders"));

        // Same identity again: no growth, no reorder.
        ledger.add_tab(&request("/users/1?tab=a", "UserDetail"));
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.tabs()[0].name, "UserDetail");
    }

    #[test]
    fn different_query_opens_a_new_tab() {
        let mut ledger = TabLedger::new();
        ledger.add_tab(&request("/users/1?tab=a", "UserDetail"));
        ledger.add_tab(&request("/users/1?tab=b", "UserDetail"));
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn sentinel_routes_are_never_recorded() {
        let mut ledger = TabLedger::new();
        ledger.add_tab(&request("/login", "Login"));
        ledger.add_tab(&request("/exception", "Whatever"));
        ledger.add_tab(&request("/redirect/users/1", "Redirect"));
        ledger.add_tab(&request("/anon", ""));
        assert!(ledger.is_empty());
    }

    #[test]
    fn hidden_tab_routes_are_skipped() {
        let mut ledger = TabLedger::new();
        let mut hidden = request("/print-preview", "PrintPreview");
        hidden.meta.hide_tab = true;
        ledger.add_tab(&hidden);
        assert!(ledger.is_empty());
    }

    #[test]
    fn dynamic_level_evicts_earliest_opened() {
        let mut ledger = TabLedger::new();
        let mut first = request("/users/1", "UserDetail");
        first.meta.dynamic_level = 2;
        first.meta.real_path = "/users/:id".to_string();
        let mut second = first.clone();
        second.full_path = "/users/2".to_string();
        second.path = "/users/2".to_string();
        let mut third = first.clone();
        third.full_path = "/users/3".to_string();
        third.path = "/users/3".to_string();

        ledger.add_tab(&first);
        ledger.add_tab(&second);
        // Re-visiting the first does not make it "recent" for eviction.
        ledger.add_tab(&first);
        ledger.add_tab(&third);

        let open: Vec<&str> = ledger.tabs().iter().map(|t| t.full_path.as_str()).collect();
        assert_eq!(open, vec!["/users/2", "/users/3"]);
    }

    #[test]
    fn close_non_active_tab_never_navigates() {
        let mut ledger = TabLedger::new();
        ledger.add_tab(&request("/a", "A"));
        ledger.add_tab(&request("/b", "B"));
        let target = ledger.close_tab("/a", "/b");
        assert_eq!(target, TabNavTarget::Stay);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn close_sole_active_tab_goes_home() {
        let mut ledger = TabLedger::new();
        ledger.add_tab(&request("/a", "A"));
        assert_eq!(ledger.close_tab("/a", "/a"), TabNavTarget::Home);
        assert!(ledger.is_empty());
    }

    #[test]
    fn close_leftmost_active_tab_targets_right_neighbor() {
        let mut ledger = TabLedger::new();
        ledger.add_tab(&request("/a", "A"));
        ledger.add_tab(&request("/b", "B"));
        assert_eq!(
            ledger.close_tab("/a", "/a"),
            TabNavTarget::FullPath("/b".to_string())
        );
    }

    #[test]
    fn close_active_tab_targets_left_neighbor() {
        let mut ledger = TabLedger::new();
        ledger.add_tab(&request("/a", "A"));
        ledger.add_tab(&request("/b", "B"));
        ledger.add_tab(&request("/c", "C"));
        assert_eq!(
            ledger.close_tab("/b", "/b"),
            TabNavTarget::FullPath("/a".to_string())
        );
    }

    #[test]
    fn affix_tab_is_immune_to_close() {
        let mut ledger = TabLedger::new();
        ledger.add_tab(&affix_request("/home", "Home"));
        assert_eq!(ledger.close_tab("/home", "/home"), TabNavTarget::Stay);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn close_all_keeps_affix_tabs() {
        let mut ledger = TabLedger::new();
        ledger.add_tab(&affix_request("/t1", "T1"));
        ledger.add_tab(&request("/t2", "T2"));
        ledger.add_tab(&request("/t3", "T3"));

        let target = ledger.close_all("/t3");
        let names: Vec<&str> = ledger.tabs().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["T1"]);
        assert_eq!(target, TabNavTarget::FullPath("/t1".to_string()));
    }

    #[test]
    fn close_all_with_no_affix_goes_home() {
        let mut ledger = TabLedger::new();
        ledger.add_tab(&request("/t1", "T1"));
        assert_eq!(ledger.close_all("/t1"), TabNavTarget::Home);
    }

    #[test]
    fn close_left_and_right_respect_affix() {
        let mut ledger = TabLedger::new();
        ledger.add_tab(&affix_request("/pin", "Pin"));
        ledger.add_tab(&request("/a", "A"));
        ledger.add_tab(&request("/b", "B"));
        ledger.add_tab(&request("/c", "C"));

        assert_eq!(ledger.close_left("/b", "/b"), TabNavTarget::Stay);
        let names: Vec<&str> = ledger.tabs().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Pin", "B", "C"]);

        assert_eq!(ledger.close_right("/b", "/b"), TabNavTarget::Stay);
        let names: Vec<&str> = ledger.tabs().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Pin", "B"]);
    }

    #[test]
    fn close_other_keeps_reference_and_affix() {
        let mut ledger = TabLedger::new();
        ledger.add_tab(&affix_request("/pin", "Pin"));
        ledger.add_tab(&request("/a", "A"));
        ledger.add_tab(&request("/b", "B"));
        ledger.close_other("/b", "/b");
        let names: Vec<&str> = ledger.tabs().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Pin", "B"]);
    }

    #[test]
    fn bulk_close_removing_current_targets_last_tab() {
        let mut ledger = TabLedger::new();
        ledger.add_tab(&request("/a", "A"));
        ledger.add_tab(&request("/b", "B"));
        ledger.add_tab(&request("/c", "C"));
        // Reference /c, current /a: /a is strictly left of /c and closes.
        let target = ledger.close_left("/c", "/a");
        assert_eq!(target, TabNavTarget::FullPath("/c".to_string()));
    }

    #[test]
    fn cache_set_tracks_keep_alive() {
        let mut ledger = TabLedger::new();
        ledger.add_tab(&request("/a", "A"));
        let mut transient = request("/b", "B");
        transient.meta.ignore_keep_alive = true;
        ledger.add_tab(&transient);

        assert!(ledger.cached_names().contains("A"));
        assert!(!ledger.cached_names().contains("B"));

        ledger.close_tab("/a", "/b");
        assert!(!ledger.cached_names().contains("A"));
    }

    #[test]
    fn reorder_moves_and_counts() {
        let mut ledger = TabLedger::new();
        ledger.add_tab(&request("/a", "A"));
        ledger.add_tab(&request("/b", "B"));
        ledger.add_tab(&request("/c", "C"));

        ledger.reorder(2, 0);
        let names: Vec<&str> = ledger.tabs().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["C", "A", "B"]);
        assert_eq!(ledger.reorder_count(), 1);

        // Out-of-range indices are ignored.
        ledger.reorder(5, 0);
        assert_eq!(ledger.reorder_count(), 1);
    }

    #[test]
    fn refresh_page_drops_cache_and_bounces_through_redirect() {
        let mut ledger = TabLedger::new();
        let current = request("/users/1", "UserDetail");
        ledger.add_tab(&current);
        assert!(ledger.cached_names().contains("UserDetail"));

        let target = ledger.refresh_page(&current);
        assert!(!ledger.cached_names().contains("UserDetail"));
        assert_eq!(
            target,
            TabNavTarget::FullPath("/redirect/users/1".to_string())
        );
    }

    #[test]
    fn title_and_path_updates() {
        let mut ledger = TabLedger::new();
        ledger.add_tab(&request("/users/1", "UserDetail"));

        ledger.set_tab_title("/users/1", "Alice");
        assert_eq!(ledger.tabs()[0].meta.title, "Alice");

        ledger.update_tab_path("/users/1", "/users/2");
        assert_eq!(ledger.tabs()[0].full_path, "/users/2");
        assert!(ledger.find("/users/2").is_some());
    }

    #[test]
    fn persistence_round_trip() {
        let mut store = CacheStore::in_memory();
        let mut ledger = TabLedger::new();
        ledger.add_tab(&request("/a?x=1", "A"));
        ledger.save_to(&mut store).unwrap();

        let mut restored = TabLedger::new();
        restored.load_from(&store);
        assert_eq!(restored.tabs(), ledger.tabs());
        assert!(restored.cached_names().contains("A"));
    }
}
