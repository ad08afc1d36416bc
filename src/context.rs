//! The application context: one explicit object owning every piece of
//! navigation state.
//!
//! There are no global singleton stores. [`AppContext`] is constructed once at
//! startup and passed by reference to whatever needs route, tab or permission
//! access; guards receive it mutably on every navigation. Single-writer
//! discipline replaces locking because navigation is serialized by the host
//! event loop.

use crate::error::NavError;
use crate::events::RouteChangeDispatcher;
use crate::http::{AuthApi, LoginParams, LoginResult, PendingRequests, UserInfo};
use crate::materialize::ViewRegistry;
use crate::permission::{basic_routes, build_routes, PermissionState, RouteBuildInput};
use crate::route::{RoleId, RouteNode};
use crate::settings::{pages, ProjectConfig, ThemeMode};
use crate::state::RouterState;
use crate::storage::{keys, CacheStore};
use crate::tabs::TabLedger;
use std::time::{SystemTime, UNIX_EPOCH};

/// The login session: token, roles and profile of the current user.
#[derive(Debug, Default)]
pub struct UserSession {
    token: Option<String>,
    roles: Vec<RoleId>,
    role_id: i64,
    is_admin: bool,
    user_info: Option<UserInfo>,
    session_timeout: bool,
    last_update_time: u64,
}

impl UserSession {
    /// The auth token, if logged in.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Replace the auth token.
    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    /// The role set used for route filtering.
    pub fn roles(&self) -> &[RoleId] {
        &self.roles
    }

    /// Replace the role set.
    pub fn set_roles(&mut self, roles: Vec<RoleId>) {
        self.roles = roles;
    }

    /// Backend role id of the logged-in user.
    pub fn role_id(&self) -> i64 {
        self.role_id
    }

    /// Admin flag of the logged-in user.
    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    /// The profile of the logged-in user.
    pub fn user_info(&self) -> Option<&UserInfo> {
        self.user_info.as_ref()
    }

    /// Replace the profile and stamp the update time.
    pub fn set_user_info(&mut self, info: Option<UserInfo>) {
        self.user_info = info;
        self.last_update_time = now_millis();
    }

    /// When the profile was last written (0 = never).
    pub fn last_update_time(&self) -> u64 {
        self.last_update_time
    }

    /// Whether the session expired while the app was open. Consumed by the
    /// after-login flow to short-circuit the automatic home redirect.
    pub fn is_session_timeout(&self) -> bool {
        self.session_timeout
    }

    /// Flag or clear a session timeout.
    pub fn set_session_timeout(&mut self, timeout: bool) {
        self.session_timeout = timeout;
    }

    /// The user's landing page, falling back to the application default.
    pub fn home_path(&self) -> &str {
        self.user_info
            .as_ref()
            .and_then(|info| info.home_path.as_deref())
            .unwrap_or(pages::BASE_HOME)
    }

    /// Drop the session.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Counters for the UI side effects guards trigger. The host reads them (or
/// diffs them) to drive the real spinner, progress bar and message layers;
/// tests assert on them directly.
#[derive(Debug, Default)]
pub struct UiEffects {
    /// Full-page loading spinner shown.
    pub spinner_shown: u64,
    /// Full-page loading spinner hidden.
    pub spinner_hidden: u64,
    /// Top progress bar started.
    pub progress_started: u64,
    /// Top progress bar finished.
    pub progress_finished: u64,
    /// Viewport scrolled back to the top.
    pub scrolled_to_top: u64,
    /// Transient messages/modals dismissed on route switch.
    pub messages_dismissed: u64,
}

/// Everything the navigation core owns, in one place.
pub struct AppContext {
    /// Project configuration.
    pub config: ProjectConfig,
    /// Route table and history.
    pub router: RouterState,
    /// Session permission state (menus, one-shot registration flag).
    pub permission: PermissionState,
    /// Open tabs and keep-alive cache set.
    pub tabs: TabLedger,
    /// Login session.
    pub user: UserSession,
    /// Persistent key-value cache.
    pub store: CacheStore,
    /// In-flight HTTP registry.
    pub pending: PendingRequests,
    /// Route-change observers.
    pub dispatcher: RouteChangeDispatcher,
    /// UI side-effect counters.
    pub ui: UiEffects,
    registry: ViewRegistry,
    static_modules: Vec<RouteNode>,
    backend_menu: Vec<RouteNode>,
}

impl AppContext {
    /// Build a context over an in-memory cache store.
    ///
    /// `static_modules` are the frontend-authored dynamic route modules used
    /// in route-mapping mode; `registry` is the host's view table.
    pub fn new(
        config: ProjectConfig,
        registry: ViewRegistry,
        static_modules: Vec<RouteNode>,
    ) -> Self {
        let mut store = CacheStore::in_memory();
        store.set_auth_tier(config.permission_cache_type);
        Self {
            router: RouterState::new(basic_routes()),
            permission: PermissionState::new(),
            tabs: TabLedger::new(),
            user: UserSession::default(),
            store,
            pending: PendingRequests::new(),
            dispatcher: RouteChangeDispatcher::new(),
            ui: UiEffects::default(),
            registry,
            static_modules,
            backend_menu: Vec::new(),
            config,
        }
    }

    /// Swap in a host-provided cache store (e.g. browser storage adapters).
    pub fn with_store(mut self, mut store: CacheStore) -> Self {
        store.set_auth_tier(self.config.permission_cache_type);
        self.store = store;
        self
    }

    /// Persist the project config under its well-known key.
    pub fn persist_config(&mut self) -> Result<(), NavError> {
        let config = self.config.clone();
        self.store.set_local_json(keys::PROJ_CFG_KEY, &config)
    }

    /// The persisted theme flag; light when never set.
    pub fn dark_mode(&self) -> ThemeMode {
        self.store
            .get_local_json(keys::APP_DARK_MODE_KEY)
            .unwrap_or(ThemeMode::Light)
    }

    /// Persist the theme flag.
    pub fn set_dark_mode(&mut self, mode: ThemeMode) -> Result<(), NavError> {
        self.store.set_local_json(keys::APP_DARK_MODE_KEY, &mode)
    }

    /// Rehydrate config, session and tab state from the cache store, e.g.
    /// after a full page reload.
    pub fn restore_session(&mut self) {
        if let Some(config) = self.store.get_local_json::<ProjectConfig>(keys::PROJ_CFG_KEY) {
            self.store.set_auth_tier(config.permission_cache_type);
            self.config = config;
        }
        if let Some(token) = self.store.get_auth(keys::TOKEN_KEY) {
            self.user.set_token(Some(token));
        }
        if let Some(info) = self.store.get_auth_json::<UserInfo>(keys::USER_INFO_KEY) {
            self.user.user_info = Some(info);
        }
        if self.config.multi_tabs_setting.cache {
            self.tabs.load_from(&self.store);
        }
    }

    /// Authenticate against the backend (with the configured retry policy)
    /// and persist the session.
    ///
    /// Does not navigate; call [`after_login`](Self::after_login) (or
    /// [`Navigator::login`](crate::guards::Navigator::login)) for the
    /// post-login route handling.
    pub fn login(
        &mut self,
        api: &dyn AuthApi,
        params: &LoginParams,
    ) -> Result<LoginResult, NavError> {
        let result = self.config.retry_request.run(|| api.login(params))?;

        self.store.set_auth(keys::TOKEN_KEY, result.token.clone());
        self.store.set_auth(keys::ROLE_KEY, result.role_id.to_string());
        self.store
            .set_auth(keys::IS_ADMIN_KEY, result.is_admin.to_string());
        self.store
            .set_auth_json(keys::USER_INFO_KEY, &result.user_info)?;

        self.user.set_token(Some(result.token.clone()));
        self.user.set_roles(result.roles.clone());
        self.user.role_id = result.role_id;
        self.user.is_admin = result.is_admin;
        self.user.set_user_info(Some(result.user_info.clone()));
        self.backend_menu = result.menu.clone();

        log::info!("user '{}' logged in", result.user_info.username);
        Ok(result)
    }

    /// Post-login route handling: build and register the dynamic routes once,
    /// then return the landing path. A pending session timeout is consumed
    /// instead, returning `None` so the caller stays on the current page.
    pub fn after_login(&mut self) -> Option<String> {
        if self.user.is_session_timeout() {
            self.user.set_session_timeout(false);
            return None;
        }
        self.ensure_dynamic_routes();
        Some(self.user.home_path().to_string())
    }

    /// Build and register the authorized dynamic routes, exactly once per
    /// session. Returns whether the table was (re)built now.
    pub fn ensure_dynamic_routes(&mut self) -> bool {
        if self.permission.is_dynamic_added_route() {
            return false;
        }
        let home_path = self.user.home_path().to_string();
        let routes = build_routes(
            RouteBuildInput {
                mode: self.config.permission_mode,
                roles: &self.user.roles,
                static_modules: &self.static_modules,
                backend_menu: self.backend_menu.clone(),
                registry: &self.registry,
                home_path: &home_path,
            },
            &mut self.permission,
        );
        log::info!(
            "registering {} dynamic route(s) ({:?} mode)",
            routes.len(),
            self.config.permission_mode
        );
        self.router.add_routes(routes);
        self.permission.set_dynamic_added_route(true);
        true
    }

    /// End the session: cancel in-flight requests, wipe cached auth entries
    /// and reset every session-scoped store.
    pub fn logout(&mut self) {
        self.pending.remove_all_pending();
        for key in [
            keys::TOKEN_KEY,
            keys::ROLE_KEY,
            keys::IS_ADMIN_KEY,
            keys::USER_INFO_KEY,
            keys::MULTIPLE_TABS_KEY,
        ] {
            self.store.remove(key);
        }
        self.user.reset();
        self.permission.reset();
        self.tabs.reset();
        self.router.reset();
        log::info!("session ended, stores reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NavError;

    struct FakeApi {
        result: LoginResult,
    }

    impl AuthApi for FakeApi {
        fn login(&self, _params: &LoginParams) -> Result<LoginResult, NavError> {
            Ok(self.result.clone())
        }
    }

    fn context() -> AppContext {
        AppContext::new(
            ProjectConfig::default(),
            ViewRegistry::default(),
            vec![RouteNode::new("/dashboard", "Dashboard")
                .child(RouteNode::new("analytics", "Analytics"))],
        )
    }

    fn login_result() -> LoginResult {
        LoginResult {
            token: "tok".to_string(),
            roles: vec!["admin".to_string()],
            user_info: UserInfo {
                user_id: 1,
                username: "alice".to_string(),
                real_name: "Alice".to_string(),
                home_path: None,
            },
            ..Default::default()
        }
    }

    #[test]
    fn login_persists_session() {
        let mut ctx = context();
        let api = FakeApi {
            result: login_result(),
        };
        ctx.login(&api, &LoginParams {
            username: "alice".to_string(),
            password: "pw".to_string(),
        })
        .unwrap();

        assert_eq!(ctx.user.token(), Some("tok"));
        assert_eq!(ctx.store.get_auth(keys::TOKEN_KEY).as_deref(), Some("tok"));
        assert!(ctx.user.last_update_time() > 0);
    }

    #[test]
    fn dynamic_routes_register_exactly_once() {
        let mut ctx = context();
        ctx.user.set_roles(vec!["admin".to_string()]);
        assert!(ctx.ensure_dynamic_routes());
        assert!(ctx.router.has_route("Dashboard"));
        assert!(!ctx.ensure_dynamic_routes());
    }

    #[test]
    fn session_timeout_short_circuits_redirect() {
        let mut ctx = context();
        ctx.user.set_session_timeout(true);
        assert_eq!(ctx.after_login(), None);
        assert!(!ctx.user.is_session_timeout());
        // The normal flow resumes afterwards.
        assert_eq!(ctx.after_login().as_deref(), Some(pages::BASE_HOME));
    }

    #[test]
    fn logout_resets_everything() {
        let mut ctx = context();
        let api = FakeApi {
            result: login_result(),
        };
        ctx.login(&api, &LoginParams {
            username: "alice".to_string(),
            password: "pw".to_string(),
        })
        .unwrap();
        ctx.ensure_dynamic_routes();
        let _handle = ctx.pending.add_pending("GET:/api/x");

        ctx.logout();
        assert_eq!(ctx.user.token(), None);
        assert!(!ctx.router.has_route("Dashboard"));
        assert!(ctx.router.has_route("Login"));
        assert!(ctx.pending.is_empty());
        assert_eq!(ctx.store.get_auth(keys::TOKEN_KEY), None);
    }

    #[test]
    fn restore_session_reads_cached_auth() {
        let mut ctx = context();
        ctx.store.set_auth(keys::TOKEN_KEY, "cached".to_string());
        ctx.restore_session();
        assert_eq!(ctx.user.token(), Some("cached"));
    }

    #[test]
    fn config_and_theme_round_trip_through_store() {
        let mut ctx = context();
        ctx.config.close_message_on_switch = false;
        ctx.persist_config().unwrap();
        ctx.set_dark_mode(ThemeMode::Dark).unwrap();

        ctx.config = ProjectConfig::default();
        ctx.restore_session();
        assert!(!ctx.config.close_message_on_switch);
        assert_eq!(ctx.dark_mode(), ThemeMode::Dark);
    }
}
