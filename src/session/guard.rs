use std::sync::Arc;

use super::config::RoutePaths;
use super::error::AuthError;
use super::store::SessionStore;
use crate::token;
use crate::types::Role;

pub(crate) const LOGIN_REASON: &str = "Please login to continue";

/// A redirect decision: target path plus optional login-flow context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    /// Target path.
    pub to: String,
    /// Human-readable reason shown by the login view.
    pub reason: Option<String>,
    /// Originating path, so the login flow can return the user afterward.
    pub return_to: Option<String>,
}

impl Redirect {
    /// A plain redirect with no message and no return path.
    #[must_use]
    pub fn to(path: impl Into<String>) -> Self {
        Self {
            to: path.into(),
            reason: None,
            return_to: None,
        }
    }

    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    #[must_use]
    pub fn with_return_to(mut self, path: impl Into<String>) -> Self {
        self.return_to = Some(path.into());
        self
    }

    /// Render the full location string:
    /// `to?message=<urlencoded>&redirect=<urlencoded>`, omitting query
    /// parameters that are not set.
    #[must_use]
    pub fn location(&self) -> String {
        let mut loc = self.to.clone();
        let mut sep = '?';
        if let Some(reason) = &self.reason {
            loc.push(sep);
            loc.push_str("message=");
            loc.push_str(&urlencoding::encode(reason));
            sep = '&';
        }
        if let Some(return_to) = &self.return_to {
            loc.push(sep);
            loc.push_str("redirect=");
            loc.push_str(&urlencoding::encode(return_to));
        }
        loc
    }
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// Render the route.
    Allow,
    /// Do not render; send the user here instead.
    Redirect(Redirect),
}

/// Route-level authorization: is the current session allowed here?
///
/// Every failure resolves to a redirect — unauthenticated sessions go to the
/// login view with a reason and a return path; authenticated sessions with
/// the wrong role are silently routed to their own landing page. No error
/// ever reaches the view behind the guard.
pub struct RoleGuard {
    store: Arc<SessionStore>,
    routes: RoutePaths,
}

impl RoleGuard {
    #[must_use]
    pub fn new(store: Arc<SessionStore>, routes: RoutePaths) -> Self {
        Self { store, routes }
    }

    /// Decide whether a route restricted to `required` roles may render.
    ///
    /// An empty `required` slice admits any authenticated session.
    #[must_use]
    pub fn authorize(&self, required: &[Role], current_path: &str) -> Access {
        match self.evaluate(required) {
            Ok(()) => Access::Allow,
            Err(e) => self.resolve(&e, current_path),
        }
    }

    /// Produce the failure taxonomy; resolution to redirects happens in one
    /// place, [`resolve`](Self::resolve).
    fn evaluate(&self, required: &[Role]) -> Result<(), AuthError> {
        let Some(stored) = self.store.load_token() else {
            return Err(AuthError::MissingSession);
        };

        let verdict = match token::decode(stored.as_str()) {
            None => Some(AuthError::InvalidToken),
            Some(claims) => match claims.expiry_epoch_seconds() {
                Some(exp) if exp <= token::now_epoch() => Some(AuthError::ExpiredToken),
                _ => None,
            },
        };
        if let Some(err) = verdict {
            // same self-healing as SessionStore::is_authenticated
            self.store.clear();
            return Err(err);
        }

        // A valid token with no readable user record fails closed: the pair
        // is one session, half of it is none of it.
        let Some(user) = self.store.load_user() else {
            return Err(AuthError::MissingSession);
        };

        if !required.is_empty() && !required.contains(&user.role) {
            return Err(AuthError::RoleMismatch { actual: user.role });
        }
        Ok(())
    }

    fn resolve(&self, err: &AuthError, current_path: &str) -> Access {
        match err {
            AuthError::RoleMismatch { actual } => {
                tracing::debug!(role = %actual, path = current_path, "role not permitted, routing home");
                Access::Redirect(Redirect::to(self.routes.role_home(*actual)))
            }
            e => {
                tracing::debug!(error = %e, path = current_path, "unauthenticated, routing to login");
                Access::Redirect(
                    Redirect::to(self.routes.login())
                        .with_reason(LOGIN_REASON)
                        .with_return_to(current_path),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::token::encode_for_tests;
    use crate::types::{Session, Token, UserRecord};
    use crate::session::store::Durability;

    fn guarded_store(role: Role, exp_offset: i64) -> Arc<SessionStore> {
        let store = Arc::new(SessionStore::in_memory());
        let token = encode_for_tests(&json!({"exp": crate::token::now_epoch() + exp_offset}));
        let session = Session::new(Token(token), UserRecord::new(role));
        store.save(&session, Durability::Ephemeral).unwrap();
        store
    }

    fn guard(store: Arc<SessionStore>) -> RoleGuard {
        RoleGuard::new(store, RoutePaths::default())
    }

    #[test]
    fn allow_when_role_matches() {
        let g = guard(guarded_store(Role::Vendor, 3600));
        assert_eq!(g.authorize(&[Role::Vendor], "/vendor/orders"), Access::Allow);
    }

    #[test]
    fn empty_required_set_admits_any_authenticated_session() {
        let g = guard(guarded_store(Role::Delivery, 3600));
        assert_eq!(g.authorize(&[], "/profile"), Access::Allow);
    }

    #[test]
    fn role_mismatch_routes_home_not_login() {
        let g = guard(guarded_store(Role::Vendor, 3600));
        let access = g.authorize(&[Role::Admin], "/admin/users");
        assert_eq!(
            access,
            Access::Redirect(Redirect::to("/vendor/dashboard"))
        );
    }

    #[test]
    fn missing_session_routes_to_login_with_context() {
        let g = guard(Arc::new(SessionStore::in_memory()));
        let access = g.authorize(&[Role::Admin], "/admin/users");
        let Access::Redirect(redirect) = access else {
            panic!("expected redirect");
        };
        assert_eq!(redirect.to, "/login");
        assert_eq!(redirect.reason.as_deref(), Some(LOGIN_REASON));
        assert_eq!(redirect.return_to.as_deref(), Some("/admin/users"));
    }

    #[test]
    fn expired_token_routes_to_login_and_clears() {
        let store = guarded_store(Role::Admin, -1);
        let g = guard(store.clone());
        let access = g.authorize(&[Role::Admin], "/admin");
        assert!(matches!(access, Access::Redirect(r) if r.to == "/login"));
        assert_eq!(store.load_token(), None);
    }

    #[test]
    fn malformed_token_routes_to_login_and_clears() {
        let store = Arc::new(SessionStore::in_memory());
        let session = Session::new(Token("garbage".into()), UserRecord::new(Role::User));
        store.save(&session, Durability::Ephemeral).unwrap();

        let g = guard(store.clone());
        let access = g.authorize(&[], "/profile");
        assert!(matches!(access, Access::Redirect(r) if r.to == "/login"));
        assert_eq!(store.load_token(), None);
    }

    #[test]
    fn valid_token_without_user_record_fails_closed() {
        use super::super::storage::{StorageTier as _, keys};

        let store = Arc::new(SessionStore::in_memory());
        let token = encode_for_tests(&json!({"exp": crate::token::now_epoch() + 3600}));
        store.ephemeral_tier().set(keys::TOKEN, &token).unwrap();
        store.ephemeral_tier().set(keys::USER, "{broken").unwrap();

        let g = guard(store);
        let access = g.authorize(&[], "/profile");
        assert!(matches!(access, Access::Redirect(r) if r.to == "/login"));
    }

    #[test]
    fn redirect_location_rendering() {
        let r = Redirect::to("/login")
            .with_reason("Session expired. Please login again.")
            .with_return_to("/vendor/orders?page=2");
        assert_eq!(
            r.location(),
            "/login?message=Session%20expired.%20Please%20login%20again.&redirect=%2Fvendor%2Forders%3Fpage%3D2"
        );
        assert_eq!(Redirect::to("/vendor/dashboard").location(), "/vendor/dashboard");
    }
}
