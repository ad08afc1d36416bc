//! Project configuration consumed by the navigation core.
//!
//! [`ProjectConfig`] is the subset of the application's settings that the
//! route/menu/tab machinery actually reads: which permission mode builds the
//! route table, where auth state is cached, whether tabs persist, and which
//! navigation side effects (progress bar, page-loading spinner, pending-request
//! cancellation, message dismissal) are enabled.
//!
//! The config is serializable so it can round-trip through the key-value store
//! under [`keys::PROJ_CFG_KEY`](crate::storage::keys::PROJ_CFG_KEY).

use crate::http::RetryPolicy;
use serde::{Deserialize, Serialize};

/// Well-known paths and route names the core treats specially.
///
/// Routes matching these sentinels are never recorded as tabs, and several
/// guards key their behavior off them (e.g. the state guard resets stores when
/// arriving at [`BASE_LOGIN`](pages::BASE_LOGIN)).
pub mod pages {
    /// The login page.
    pub const BASE_LOGIN: &str = "/login";
    /// Default landing page when the user has no configured home path.
    pub const BASE_HOME: &str = "/dashboard";
    /// The generic exception/error page.
    pub const ERROR_PAGE: &str = "/exception";
    /// Internal redirect helper page (used by tab refresh).
    pub const REDIRECT_PATH: &str = "/redirect";

    /// Route name of the redirect helper.
    pub const REDIRECT_NAME: &str = "Redirect";
    /// Route name of the catch-all not-found route.
    pub const PAGE_NOT_FOUND_NAME: &str = "PageNotFound";
}

/// How the authorized route table is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionMode {
    /// Statically authored route modules, filtered by the user's roles.
    RouteMapping,
    /// Route descriptors delivered by the backend after login.
    Back,
}

/// Which storage tier holds auth-related cache entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CacheType {
    /// Discarded when the session ends.
    Session,
    /// Survives across sessions.
    Local,
}

/// What happens when the backend reports a session timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionTimeoutProcessing {
    /// Jump to the login route.
    RouteJump,
    /// Overlay the current page with the login form, keeping state.
    PageCoverage,
}

/// Dark/light theme flag, persisted independently of the project config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThemeMode {
    /// Dark theme.
    Dark,
    /// Light theme.
    Light,
}

/// Multi-tab behavior settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiTabsSetting {
    /// Persist the open-tab list across reloads.
    pub cache: bool,
    /// Show the tab bar at all.
    pub show: bool,
    /// Allow drag-reordering of tabs.
    pub can_drag: bool,
}

impl Default for MultiTabsSetting {
    fn default() -> Self {
        Self {
            cache: false,
            show: true,
            can_drag: true,
        }
    }
}

/// Settings for navigation-driven UI transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionSetting {
    /// Show the page-loading spinner while a navigation settles.
    pub open_page_loading: bool,
    /// Drive the top progress bar from navigation events.
    pub open_progress: bool,
}

impl Default for TransitionSetting {
    fn default() -> Self {
        Self {
            open_page_loading: true,
            open_progress: true,
        }
    }
}

/// Project-level configuration for the navigation core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// How the authorized route table is built.
    pub permission_mode: PermissionMode,
    /// Storage tier for auth-related cache entries.
    pub permission_cache_type: CacheType,
    /// Session-timeout handling strategy.
    pub session_timeout_processing: SessionTimeoutProcessing,
    /// Cancel all pending HTTP requests when leaving a route.
    pub remove_all_http_pending: bool,
    /// Dismiss transient messages/modals when switching routes.
    pub close_message_on_switch: bool,
    /// Multi-tab settings.
    pub multi_tabs_setting: MultiTabsSetting,
    /// Transition settings.
    pub transition_setting: TransitionSetting,
    /// Uniform retry policy applied to failed requests.
    pub retry_request: RetryPolicy,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            permission_mode: PermissionMode::RouteMapping,
            permission_cache_type: CacheType::Local,
            session_timeout_processing: SessionTimeoutProcessing::RouteJump,
            remove_all_http_pending: true,
            close_message_on_switch: true,
            multi_tabs_setting: MultiTabsSetting::default(),
            transition_setting: TransitionSetting::default(),
            retry_request: RetryPolicy::default(),
        }
    }
}
