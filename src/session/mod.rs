//! Session persistence, expiry monitoring and route guarding.
//!
//! This module is the state-bearing core of the client: it owns the stored
//! `{token, user}` pair across two durability tiers, decides whether a route
//! may render, and forces logout when a token expires while the app is idle.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tiffin_auth::{
//!     Durability, ExpiryMonitor, FileTier, MemoryTier, Role, RoleGuard,
//!     SessionConfig, SessionStore,
//! };
//!
//! // 1. Wire the two storage tiers
//! let store = Arc::new(SessionStore::new(
//!     MemoryTier::new(),
//!     FileTier::new(data_dir.join("session.json")),
//! ));
//!
//! // 2. Guard routes
//! let config = SessionConfig::new();
//! let guard = RoleGuard::new(store.clone(), config.routes().clone());
//! match guard.authorize(&[Role::Vendor], "/vendor/orders") {
//!     Access::Allow => { /* render */ }
//!     Access::Redirect(r) => router.go(&r.location()),
//! }
//!
//! // 3. Watch for idle-tab expiry (implement Navigator for your router)
//! let monitor = Arc::new(ExpiryMonitor::new(store, navigator, &config));
//! let handle = monitor.spawn(); // aborts and disarms on drop
//! ```

mod config;
mod error;
#[cfg(feature = "client")]
mod flow;
mod guard;
mod monitor;
mod storage;
mod store;

pub use config::{RoutePaths, SessionConfig};
pub use error::AuthError;
#[cfg(feature = "client")]
pub use flow::{AuthFlow, resolve_role, session_from_payload};
pub use guard::{Access, Redirect, RoleGuard};
pub use monitor::{ExpiryMonitor, MonitorHandle, Navigator};
pub use storage::{FileTier, MemoryTier, StorageTier, keys};
pub use store::{Durability, SessionStore, TierPrecedence};
