//! The navigation guard chain and the [`Navigator`] driving it.
//!
//! Guards are observation and side-effect points, not veto points: none of
//! them blocks a navigation. A guard may *redirect* (login bounce, route
//! re-resolution after registration), which restarts the pipeline at the new
//! location.
//!
//! The chain order is fixed and load-bearing:
//!
//! 1. page-loaded tracking
//! 2. page-loading spinner (skipped when unauthenticated or already loaded)
//! 3. pending-request cancellation on leave
//! 4. scroll-to-top on arrival
//! 5. transient message dismissal on leave
//! 6. progress bar start/stop
//! 7. permission guard (the only guard that mutates the route table, once
//!    per session)
//! 8. dynamic-parameter menu patch (needs the menus the permission guard
//!    built)
//! 9. post-navigation state sync (tab ledger, route-change dispatch)
//!
//! For a single navigation all `before` phases run in order, then the
//! location commits, then all `after` phases run in the same order.

use crate::context::AppContext;
use crate::error::{NavError, NavigationResult};
use crate::http::{AuthApi, LoginParams};
use crate::menu::configure_dynamic_params_menu;
use crate::settings::pages;
use crate::state::NavigationRequest;
use std::collections::HashSet;

/// Outcome of a guard's `before` phase.
pub enum GuardFlow {
    /// Continue with the next guard.
    Proceed,
    /// Abandon this pass and restart navigation at the given location.
    Redirect(String),
}

/// One interceptor in the chain.
pub trait NavigationGuard {
    /// Stable name used in logs.
    fn name(&self) -> &'static str;

    /// Runs before the location commits. May redirect.
    fn before(&mut self, _ctx: &mut AppContext, _to: &mut NavigationRequest) -> GuardFlow {
        GuardFlow::Proceed
    }

    /// Runs after the location committed.
    fn after(&mut self, _ctx: &mut AppContext, _to: &NavigationRequest) {}
}

// ============================================================================
// Chain members
// ============================================================================

/// Tracks which paths have been visited; marks `meta.loaded` so later guards
/// can skip first-visit effects.
#[derive(Default)]
struct PageGuard {
    loaded: HashSet<String>,
}

impl NavigationGuard for PageGuard {
    fn name(&self) -> &'static str {
        "page"
    }

    fn before(&mut self, _ctx: &mut AppContext, to: &mut NavigationRequest) -> GuardFlow {
        to.meta.loaded = self.loaded.contains(&to.path);
        GuardFlow::Proceed
    }

    fn after(&mut self, _ctx: &mut AppContext, to: &NavigationRequest) {
        self.loaded.insert(to.path.clone());
    }
}

/// Full-page loading spinner around first visits of authenticated pages.
#[derive(Default)]
struct PageLoadingGuard {
    shown: bool,
}

impl NavigationGuard for PageLoadingGuard {
    fn name(&self) -> &'static str {
        "page-loading"
    }

    fn before(&mut self, ctx: &mut AppContext, to: &mut NavigationRequest) -> GuardFlow {
        // A guard redirect re-runs the before phase; the spinner is already
        // up then, so only the first pass may show it.
        if !self.shown
            && ctx.user.token().is_some()
            && !to.meta.loaded
            && ctx.config.transition_setting.open_page_loading
        {
            ctx.ui.spinner_shown += 1;
            self.shown = true;
        }
        GuardFlow::Proceed
    }

    fn after(&mut self, ctx: &mut AppContext, _to: &NavigationRequest) {
        if self.shown {
            ctx.ui.spinner_hidden += 1;
            self.shown = false;
        }
    }
}

/// Cancels in-flight HTTP requests when leaving a page. The flag is captured
/// at chain construction.
struct HttpGuard {
    cancel_on_leave: bool,
}

impl NavigationGuard for HttpGuard {
    fn name(&self) -> &'static str {
        "http"
    }

    fn before(&mut self, ctx: &mut AppContext, _to: &mut NavigationRequest) -> GuardFlow {
        if self.cancel_on_leave {
            ctx.pending.remove_all_pending();
        }
        GuardFlow::Proceed
    }
}

/// Scrolls the viewport back to the top after arriving.
struct ScrollGuard;

impl NavigationGuard for ScrollGuard {
    fn name(&self) -> &'static str {
        "scroll"
    }

    fn after(&mut self, ctx: &mut AppContext, _to: &NavigationRequest) {
        ctx.ui.scrolled_to_top += 1;
    }
}

/// Dismisses transient modals and notifications when switching pages.
struct MessageGuard;

impl NavigationGuard for MessageGuard {
    fn name(&self) -> &'static str {
        "message"
    }

    fn before(&mut self, ctx: &mut AppContext, _to: &mut NavigationRequest) -> GuardFlow {
        if ctx.config.close_message_on_switch {
            ctx.ui.messages_dismissed += 1;
        }
        GuardFlow::Proceed
    }
}

/// Top progress bar around not-yet-loaded pages.
#[derive(Default)]
struct ProgressGuard {
    started: bool,
}

impl NavigationGuard for ProgressGuard {
    fn name(&self) -> &'static str {
        "progress"
    }

    fn before(&mut self, ctx: &mut AppContext, to: &mut NavigationRequest) -> GuardFlow {
        if !self.started && !to.meta.loaded && ctx.config.transition_setting.open_progress {
            ctx.ui.progress_started += 1;
            self.started = true;
        }
        GuardFlow::Proceed
    }

    fn after(&mut self, ctx: &mut AppContext, _to: &NavigationRequest) {
        if self.started {
            ctx.ui.progress_finished += 1;
            self.started = false;
        }
    }
}

/// Authentication and one-shot dynamic route registration.
///
/// Unauthenticated access to a protected page bounces to the login page with
/// a `redirect` query. The first authenticated navigation builds and
/// registers the dynamic route table, then redirects to the same location so
/// it resolves against the fresh table.
struct PermissionGuard;

impl NavigationGuard for PermissionGuard {
    fn name(&self) -> &'static str {
        "permission"
    }

    fn before(&mut self, ctx: &mut AppContext, to: &mut NavigationRequest) -> GuardFlow {
        let at_login = to.path == pages::BASE_LOGIN;

        if ctx.user.token().is_none() {
            if at_login || to.meta.ignore_auth {
                return GuardFlow::Proceed;
            }
            let target = if to.path == "/" {
                pages::BASE_LOGIN.to_string()
            } else {
                format!("{}?redirect={}", pages::BASE_LOGIN, to.full_path)
            };
            return GuardFlow::Redirect(target);
        }

        // Authenticated users do not revisit the login page.
        if at_login && !ctx.user.is_session_timeout() {
            return GuardFlow::Redirect(ctx.user.home_path().to_string());
        }

        if !ctx.permission.is_dynamic_added_route() {
            ctx.ensure_dynamic_routes();
            // Resolve again, now against the full table.
            return GuardFlow::Redirect(to.full_path.clone());
        }
        GuardFlow::Proceed
    }
}

/// Substitutes the current navigation's path parameters into parameterized
/// menu entries. Must run after the permission guard so the menus exist.
struct ParamMenuGuard;

impl NavigationGuard for ParamMenuGuard {
    fn name(&self) -> &'static str {
        "param-menu"
    }

    fn before(&mut self, ctx: &mut AppContext, to: &mut NavigationRequest) -> GuardFlow {
        if to.name.is_empty() || !ctx.permission.is_dynamic_added_route() {
            return GuardFlow::Proceed;
        }
        let mode = ctx.config.permission_mode;
        for menu in ctx.permission.menus_mut(mode) {
            configure_dynamic_params_menu(menu, &to.params);
        }
        GuardFlow::Proceed
    }
}

/// Post-navigation sync: record the tab and notify route-change observers.
struct StateGuard;

impl NavigationGuard for StateGuard {
    fn name(&self) -> &'static str {
        "state"
    }

    fn after(&mut self, ctx: &mut AppContext, to: &NavigationRequest) {
        // Arriving at the login page without a session clears whatever
        // session-scoped state is left over.
        if to.path == pages::BASE_LOGIN && ctx.user.token().is_none() {
            ctx.tabs.reset();
            ctx.permission.reset();
        }
        if !to.name.is_empty() {
            ctx.tabs.add_tab(to);
        }
        ctx.dispatcher.dispatch(to);
    }
}

/// The standard chain, in its fixed order.
pub fn default_guard_chain(cancel_http_on_leave: bool) -> Vec<Box<dyn NavigationGuard>> {
    vec![
        Box::new(PageGuard::default()),
        Box::new(PageLoadingGuard::default()),
        Box::new(HttpGuard {
            cancel_on_leave: cancel_http_on_leave,
        }),
        Box::new(ScrollGuard),
        Box::new(MessageGuard),
        Box::new(ProgressGuard::default()),
        Box::new(PermissionGuard),
        Box::new(ParamMenuGuard),
        Box::new(StateGuard),
    ]
}

// ============================================================================
// Navigator
// ============================================================================

const MAX_REDIRECTS: usize = 10;

/// Owns the [`AppContext`] and the guard chain, and runs navigations through
/// them.
pub struct Navigator {
    ctx: AppContext,
    guards: Vec<Box<dyn NavigationGuard>>,
}

impl Navigator {
    /// Wrap a context with the standard guard chain.
    pub fn new(ctx: AppContext) -> Self {
        let guards = default_guard_chain(ctx.config.remove_all_http_pending);
        Self { ctx, guards }
    }

    /// Wrap a context with a caller-assembled chain.
    pub fn with_guards(ctx: AppContext, guards: Vec<Box<dyn NavigationGuard>>) -> Self {
        Self { ctx, guards }
    }

    /// Shared view of the context.
    pub fn ctx(&self) -> &AppContext {
        &self.ctx
    }

    /// Mutable view of the context.
    pub fn ctx_mut(&mut self) -> &mut AppContext {
        &mut self.ctx
    }

    /// Navigate, pushing onto the history.
    pub fn push(&mut self, location: &str) -> NavigationResult {
        self.run(location, false)
    }

    /// Navigate, replacing the current history entry.
    pub fn replace(&mut self, location: &str) -> NavigationResult {
        self.run(location, true)
    }

    /// Log in and run the post-login navigation (home page, unless a session
    /// timeout was pending).
    pub fn login(
        &mut self,
        api: &dyn AuthApi,
        params: &LoginParams,
    ) -> Result<NavigationResult, NavError> {
        self.ctx.login(api, params)?;
        match self.ctx.after_login() {
            Some(home) => Ok(self.replace(&home)),
            None => Ok(NavigationResult::Success {
                path: self.ctx.router.current_full_path().to_string(),
            }),
        }
    }

    /// Log out, reset every session store and land on the login page.
    pub fn logout(&mut self) -> NavigationResult {
        self.ctx.logout();
        self.replace(pages::BASE_LOGIN)
    }

    fn run(&mut self, location: &str, replace: bool) -> NavigationResult {
        let mut location = location.to_string();
        let mut not_found: Option<String> = None;

        for _ in 0..MAX_REDIRECTS {
            let mut to = NavigationRequest::new(location.clone());
            if let Some(resolved) = self.ctx.router.resolve(&to.path) {
                if let Some(redirect) = resolved.redirect {
                    location = redirect;
                    continue;
                }
                to = to.with_resolution(&resolved);
            }

            let mut redirected = None;
            for guard in &mut self.guards {
                match guard.before(&mut self.ctx, &mut to) {
                    GuardFlow::Proceed => {}
                    GuardFlow::Redirect(target) => {
                        redirected = Some((guard.name(), target));
                        break;
                    }
                }
            }
            if let Some((name, target)) = redirected {
                log::debug!("guard '{}' redirected '{}' to '{}'", name, to.full_path, target);
                location = target;
                continue;
            }

            if to.name.is_empty() {
                // Unmatched: land on the exception page but report the
                // original path.
                log::warn!("no route matches '{}', showing exception page", to.path);
                not_found.get_or_insert(to.path.clone());
                if to.path == pages::ERROR_PAGE {
                    break;
                }
                location = pages::ERROR_PAGE.to_string();
                continue;
            }

            if replace {
                self.ctx.router.replace(to.full_path.clone());
            } else {
                self.ctx.router.push(to.full_path.clone());
            }
            for guard in &mut self.guards {
                guard.after(&mut self.ctx, &to);
            }

            return match not_found {
                Some(path) => NavigationResult::NotFound { path },
                None => NavigationResult::Success { path: to.full_path },
            };
        }

        let path = not_found.unwrap_or(location);
        log::warn!("navigation to '{}' gave up after {} redirects", path, MAX_REDIRECTS);
        NavigationResult::NotFound { path }
    }
}
