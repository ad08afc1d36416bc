//! Navigation core for a multi-tab admin dashboard shell.
//!
//! This crate owns the route/menu/tab reconciliation logic of an admin
//! dashboard: it turns authored or backend-delivered route descriptors into
//! an authorized route table, derives the rendered menu from it, keeps the
//! open-tab ledger and keep-alive cache set in sync with navigation, and runs
//! every navigation through a fixed chain of guards. Rendering, transport and
//! persistence stay with the host behind small trait seams.
//!
//! # Architecture
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`route`] | Route tree data model, path composition |
//! | [`permission`] | Role filtering and the route-building pipeline |
//! | [`flatten`] | Depth capping of multi-level route trees |
//! | [`menu`] | Menu projection and dynamic-parameter patching |
//! | [`materialize`] | Symbolic component resolution |
//! | [`tabs`] | Open-tab ledger and keep-alive cache set |
//! | [`guards`] | Guard chain and the [`Navigator`](guards::Navigator) |
//! | [`state`] | Route table registration, matching, history |
//! | [`context`] | The explicit application context |
//! | [`storage`], [`http`], [`events`] | Host collaborator seams |
//!
//! # Quick start
//!
//! ```
//! use admin_navigator::context::AppContext;
//! use admin_navigator::error::NavError;
//! use admin_navigator::guards::Navigator;
//! use admin_navigator::http::{AuthApi, LoginParams, LoginResult};
//! use admin_navigator::materialize::ViewRegistry;
//! use admin_navigator::route::RouteNode;
//! use admin_navigator::settings::ProjectConfig;
//!
//! struct Api;
//!
//! impl AuthApi for Api {
//!     fn login(&self, _: &LoginParams) -> Result<LoginResult, NavError> {
//!         Ok(LoginResult { token: "tok".into(), ..Default::default() })
//!     }
//! }
//!
//! let modules = vec![
//!     RouteNode::new("/dashboard", "Dashboard")
//!         .child(RouteNode::new("analytics", "Analytics")),
//! ];
//! let ctx = AppContext::new(ProjectConfig::default(), ViewRegistry::default(), modules);
//! let mut nav = Navigator::new(ctx);
//!
//! let result = nav
//!     .login(
//!         &Api,
//!         &LoginParams { username: "alice".into(), password: "secret".into() },
//!     )
//!     .unwrap();
//! assert!(result.is_success());
//! ```

pub mod context;
pub mod error;
pub mod events;
pub mod flatten;
pub mod guards;
pub mod http;
pub mod materialize;
pub mod menu;
pub mod params;
pub mod permission;
pub mod route;
pub mod settings;
pub mod state;
pub mod storage;
pub mod tabs;

pub use context::{AppContext, UserSession};
pub use error::{NavError, NavigationResult};
pub use guards::{GuardFlow, NavigationGuard, Navigator};
pub use menu::MenuNode;
pub use params::{QueryParams, RouteParams};
pub use route::{RouteMeta, RouteNode};
pub use settings::{PermissionMode, ProjectConfig};
pub use state::NavigationRequest;
pub use tabs::{Tab, TabLedger, TabNavTarget};
