//! HTTP policy layer.
//!
//! The core does not implement transport. It consumes one operation — login —
//! behind the [`AuthApi`] trait, and specifies two policies around the host's
//! request pipeline:
//!
//! - [`RetryPolicy`] — a uniform fixed-delay-and-retry rule applied to failed
//!   calls. Retry exhaustion is the one failure in this crate that propagates
//!   an error to the caller instead of degrading.
//! - [`PendingRequests`] — an in-flight registry keyed by request signature.
//!   The HTTP guard bulk-cancels it on route leave when
//!   [`remove_all_http_pending`](crate::settings::ProjectConfig::remove_all_http_pending)
//!   is set; the host observes cancellation through the [`CancelHandle`] it
//!   received at registration time.

use crate::error::NavError;
use crate::route::RouteNode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Credentials submitted by the login form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginParams {
    /// Account name.
    pub username: String,
    /// Plaintext password; transport-level protection is the host's concern.
    pub password: String,
}

/// Profile data for the logged-in user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserInfo {
    /// Backend user id.
    pub user_id: i64,
    /// Account name.
    pub username: String,
    /// Display name.
    pub real_name: String,
    /// Landing page after login; falls back to the configured home path.
    pub home_path: Option<String>,
}

/// Successful login payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoginResult {
    /// Auth token for subsequent requests.
    pub token: String,
    /// Role id assigned by the backend.
    pub role_id: i64,
    /// Admin flag.
    pub is_admin: bool,
    /// Role names used for route filtering in route-mapping mode.
    pub roles: Vec<String>,
    /// Backend-delivered menu/route descriptors (backend permission mode).
    pub menu: Vec<RouteNode>,
    /// User profile.
    pub user_info: UserInfo,
}

/// The single backend operation the core consumes.
pub trait AuthApi {
    /// Authenticate and return the session payload.
    fn login(&self, params: &LoginParams) -> Result<LoginResult, NavError>;
}

/// Fixed-delay retry policy applied uniformly to failed calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Number of retries after the initial attempt.
    pub count: u32,
    /// Delay between attempts, in milliseconds.
    pub wait_time_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            count: 3,
            wait_time_ms: 100,
        }
    }
}

impl RetryPolicy {
    /// Run `op`, retrying with a fixed delay until it succeeds or the retry
    /// budget is spent. The last failure is wrapped in
    /// [`NavError::RetryExhausted`].
    pub fn run<T, F>(&self, mut op: F) -> Result<T, NavError>
    where
        F: FnMut() -> Result<T, NavError>,
    {
        let attempts = self.count + 1;
        let mut last_message = String::new();
        for attempt in 0..attempts {
            match op() {
                Ok(value) => return Ok(value),
                Err(err) => {
                    last_message = err.to_string();
                    log::debug!(
                        "request attempt {}/{} failed: {}",
                        attempt + 1,
                        attempts,
                        last_message
                    );
                    if attempt + 1 < attempts && self.wait_time_ms > 0 {
                        std::thread::sleep(Duration::from_millis(self.wait_time_ms));
                    }
                }
            }
        }
        Err(NavError::RetryExhausted {
            attempts,
            message: last_message,
        })
    }
}

/// Handle the host polls to learn that its request was cancelled.
#[derive(Debug, Clone)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    /// Whether the request behind this handle has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Registry of in-flight requests keyed by request signature
/// (e.g. `"GET:/api/users?page=2"`).
///
/// Registering the same signature twice cancels the earlier request first, so
/// duplicate in-flight calls collapse to one.
#[derive(Debug, Default)]
pub struct PendingRequests {
    pending: HashMap<String, Arc<AtomicBool>>,
}

impl PendingRequests {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an outbound request and get its cancellation handle.
    pub fn add_pending(&mut self, signature: impl Into<String>) -> CancelHandle {
        let signature = signature.into();
        if let Some(previous) = self.pending.remove(&signature) {
            previous.store(true, Ordering::SeqCst);
            log::debug!("cancelled duplicate in-flight request '{}'", signature);
        }
        let flag = Arc::new(AtomicBool::new(false));
        self.pending.insert(signature, Arc::clone(&flag));
        CancelHandle(flag)
    }

    /// Unregister a request that completed normally.
    pub fn remove_pending(&mut self, signature: &str) {
        self.pending.remove(signature);
    }

    /// Cancel every in-flight request. Returns how many were cancelled.
    pub fn remove_all_pending(&mut self) -> usize {
        let count = self.pending.len();
        for flag in self.pending.values() {
            flag.store(true, Ordering::SeqCst);
        }
        self.pending.clear();
        if count > 0 {
            log::debug!("cancelled {} pending request(s) on route leave", count);
        }
        count
    }

    /// Number of currently tracked requests.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is in flight.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
