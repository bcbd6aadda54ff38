use std::time::Duration;

use super::store::TierPrecedence;
use crate::types::Role;

/// Route table the guard and monitor redirect into.
///
/// Defaults match the Tiffin Sathi front-end layout. Override with `with_*`
/// methods.
#[derive(Debug, Clone)]
pub struct RoutePaths {
    login: String,
    admin_home: String,
    vendor_home: String,
    delivery_home: String,
    user_home: String,
}

impl Default for RoutePaths {
    fn default() -> Self {
        Self {
            login: "/login".into(),
            admin_home: "/admin".into(),
            vendor_home: "/vendor/dashboard".into(),
            delivery_home: "/delivery".into(),
            user_home: "/".into(),
        }
    }
}

impl RoutePaths {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_login(mut self, path: impl Into<String>) -> Self {
        self.login = path.into();
        self
    }

    #[must_use]
    pub fn with_admin_home(mut self, path: impl Into<String>) -> Self {
        self.admin_home = path.into();
        self
    }

    #[must_use]
    pub fn with_vendor_home(mut self, path: impl Into<String>) -> Self {
        self.vendor_home = path.into();
        self
    }

    #[must_use]
    pub fn with_delivery_home(mut self, path: impl Into<String>) -> Self {
        self.delivery_home = path.into();
        self
    }

    #[must_use]
    pub fn with_user_home(mut self, path: impl Into<String>) -> Self {
        self.user_home = path.into();
        self
    }

    /// The login view path.
    #[must_use]
    pub fn login(&self) -> &str {
        &self.login
    }

    /// The landing page for a role. Fixed mapping, no wildcards.
    #[must_use]
    pub fn role_home(&self, role: Role) -> &str {
        match role {
            Role::Admin => &self.admin_home,
            Role::Vendor => &self.vendor_home,
            Role::Delivery => &self.delivery_home,
            Role::User => &self.user_home,
        }
    }
}

/// Session-layer configuration: routes, monitor timing, storage policy.
///
/// All fields have working defaults; override with `with_*` methods.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    routes: RoutePaths,
    precedence: TierPrecedence,
    monitor_interval: Duration,
    logout_cooldown: Duration,
    unknown_role_default: Role,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            routes: RoutePaths::default(),
            precedence: TierPrecedence::EphemeralFirst,
            monitor_interval: Duration::from_secs(60),
            logout_cooldown: Duration::from_secs(2),
            unknown_role_default: Role::User,
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_routes(mut self, routes: RoutePaths) -> Self {
        self.routes = routes;
        self
    }

    #[must_use]
    pub fn with_precedence(mut self, precedence: TierPrecedence) -> Self {
        self.precedence = precedence;
        self
    }

    /// Override the expiry monitor's tick period (default 60s).
    #[must_use]
    pub fn with_monitor_interval(mut self, interval: Duration) -> Self {
        self.monitor_interval = interval;
        self
    }

    /// Override the forced-logout cooldown window (default 2s).
    #[must_use]
    pub fn with_logout_cooldown(mut self, cooldown: Duration) -> Self {
        self.logout_cooldown = cooldown;
        self
    }

    /// Role assigned when login cannot resolve one (default [`Role::User`]).
    ///
    /// This is a deliberate graceful-degradation policy: a login whose
    /// response and profile fallback both omit the role still succeeds, as a
    /// plain user, rather than failing. Applied in exactly one place (the
    /// login flow's role resolution).
    #[must_use]
    pub fn with_unknown_role_default(mut self, role: Role) -> Self {
        self.unknown_role_default = role;
        self
    }

    #[must_use]
    pub fn routes(&self) -> &RoutePaths {
        &self.routes
    }

    #[must_use]
    pub fn precedence(&self) -> TierPrecedence {
        self.precedence
    }

    #[must_use]
    pub fn monitor_interval(&self) -> Duration {
        self.monitor_interval
    }

    #[must_use]
    pub fn logout_cooldown(&self) -> Duration {
        self.logout_cooldown
    }

    #[must_use]
    pub fn unknown_role_default(&self) -> Role {
        self.unknown_role_default
    }
}
