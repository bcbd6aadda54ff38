#![doc = include_str!("../README.md")]

#[cfg(feature = "client")]
pub mod api;
pub mod error;
pub mod session;
pub mod token;
pub mod types;

// Re-exports for convenient access
#[cfg(feature = "client")]
pub use api::{ApiClient, ApiConfig, LoginPayload, ProfilePayload};
pub use error::Error;
#[cfg(feature = "client")]
pub use session::{AuthFlow, resolve_role, session_from_payload};
pub use session::{
    Access, AuthError, Durability, ExpiryMonitor, FileTier, MemoryTier, MonitorHandle, Navigator,
    Redirect, RoleGuard, RoutePaths, SessionConfig, SessionStore, StorageTier, TierPrecedence,
};
pub use token::DecodedClaims;
pub use types::{Role, Session, Token, UserId, UserRecord};
