use std::sync::Arc;

use serde_json::Value as JsonValue;

use super::config::SessionConfig;
use super::error::AuthError;
use super::guard::Redirect;
use super::store::{Durability, SessionStore};
use crate::api::{ApiClient, LoginPayload};
use crate::error::Error;
use crate::token;
use crate::types::{Role, Session, Token, UserRecord};

/// Login/logout orchestration against the REST API.
///
/// Sequence on login: authenticate → normalize the bearer token → resolve the
/// role (declared, else profile fallback, else policy default) → build the
/// user record → persist under the chosen durability tier.
pub struct AuthFlow {
    api: ApiClient,
    store: Arc<SessionStore>,
    config: SessionConfig,
}

impl AuthFlow {
    #[must_use]
    pub fn new(api: ApiClient, store: Arc<SessionStore>, config: SessionConfig) -> Self {
        Self { api, store, config }
    }

    /// Authenticate and persist the resulting session.
    ///
    /// A profile-fetch failure during role fallback is tolerated and logged —
    /// the login still succeeds with the policy default role. Persistent
    /// logins also record the remember-me email prefill.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Api`] if the login call fails,
    /// [`AuthError::Api`] wrapping [`Error::MissingToken`] if the response
    /// carries no bearer token under any known field, or
    /// [`AuthError::Store`] if persisting the session fails.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        durability: Durability,
    ) -> Result<Session, AuthError> {
        let payload = self.api.login(email, password).await?;
        if payload.bearer_token().is_none() {
            return Err(Error::MissingToken.into());
        }

        let mut declared = payload.declared_role().map(str::to_owned);
        if declared.is_none() {
            match self
                .api
                .fetch_profile(&payload.bearer_token().unwrap_or_default())
                .await
            {
                Ok(profile) => declared = profile.declared_role().map(str::to_owned),
                Err(e) => {
                    tracing::warn!(error = %e, "profile fallback failed, continuing without a declared role");
                }
            }
        }
        let role = resolve_role(declared.as_deref(), self.config.unknown_role_default());

        let session = session_from_payload(&payload, role, email)?;
        self.store.save(&session, durability)?;

        if durability == Durability::Persistent {
            if let Err(e) = self.store.remember_email(email) {
                tracing::warn!(error = %e, "remembered-email write failed");
            }
        }

        tracing::info!(role = %session.user.role, "login successful");
        Ok(session)
    }

    /// Clear the session and return a plain redirect to the login view.
    ///
    /// User-initiated, so the redirect carries no reason message.
    pub fn logout(&self, current_path: &str) -> Redirect {
        self.store.clear();
        tracing::info!(from = current_path, "logged out");
        Redirect::to(self.config.routes().login())
    }
}

/// Resolve a declared role string to a [`Role`].
///
/// This is the only place the unknown-role policy applies: an absent or
/// unparseable role becomes `fallback` (with a warning for the unparseable
/// case), never an error — login degrades gracefully instead of failing.
#[must_use]
pub fn resolve_role(declared: Option<&str>, fallback: Role) -> Role {
    match declared {
        None => fallback,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(role = raw, "unknown role in login response, applying policy default");
            fallback
        }),
    }
}

/// Build a [`Session`] from a normalized login payload and a resolved role.
///
/// The user record comes from the payload's `user` object when present,
/// otherwise it is synthesized from the token's claims. Pure: no storage, no
/// network.
///
/// # Errors
///
/// Returns [`Error::MissingToken`] if the payload carries no bearer token.
pub fn session_from_payload(
    payload: &LoginPayload,
    role: Role,
    login_email: &str,
) -> Result<Session, Error> {
    let bearer = payload.bearer_token().ok_or(Error::MissingToken)?;

    let user = match payload.user() {
        Some(obj) => record_from_json(obj, role, login_email),
        None => {
            let claims = token::decode(&bearer)
                .map(|c| c.as_json().clone())
                .unwrap_or(JsonValue::Null);
            record_from_json(&claims, role, login_email)
        }
    };

    Ok(Session::new(Token(bearer), user))
}

/// Extract a user record from a JSON source (login `user` object or token
/// claims), applying the documented key fallbacks.
fn record_from_json(src: &JsonValue, role: Role, login_email: &str) -> UserRecord {
    let str_at = |keys: &[&str]| -> Option<String> {
        keys.iter()
            .find_map(|k| src.get(*k).and_then(JsonValue::as_str))
            .map(str::to_owned)
    };

    let id = str_at(&["userId", "id", "_id", "sub"]);
    let email = str_at(&["email"])
        .or_else(|| str_at(&["sub"]).filter(|s| s.contains('@')))
        .unwrap_or_else(|| login_email.to_owned());
    let display_name = str_at(&["name", "userName", "ownerName", "businessName", "username"])
        .or_else(|| login_email.split('@').next().map(str::to_owned));

    let mut user = UserRecord::new(role);
    user.id = id.map(Into::into);
    user.display_name = display_name;
    user.email = Some(email);
    user.profile_picture = str_at(&["profilePicture", "profilePic", "avatar"]);
    user.vendor_id = str_at(&["vendorId"]);
    user.partner_id = str_at(&["partnerId"]);
    user
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::token::encode_for_tests;

    fn payload(json: JsonValue) -> LoginPayload {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn resolve_role_declared_wins() {
        assert_eq!(resolve_role(Some("VENDOR"), Role::User), Role::Vendor);
        assert_eq!(resolve_role(Some("admin"), Role::User), Role::Admin);
    }

    #[test]
    fn resolve_role_policy_default() {
        assert_eq!(resolve_role(None, Role::User), Role::User);
        assert_eq!(resolve_role(Some("superuser"), Role::User), Role::User);
        assert_eq!(resolve_role(Some(""), Role::Vendor), Role::Vendor);
    }

    #[test]
    fn session_from_user_object() {
        let p = payload(json!({
            "accessToken": "abc",
            "user": {
                "id": "u-9",
                "businessName": "Momo Ghar",
                "email": "owner@momoghar.com",
                "vendorId": "v-9",
            },
        }));
        let session = session_from_payload(&p, Role::Vendor, "owner@momoghar.com").unwrap();
        assert_eq!(session.token.as_str(), "abc");
        assert_eq!(session.user.id.as_ref().map(|i| i.0.as_str()), Some("u-9"));
        assert_eq!(session.user.display_name.as_deref(), Some("Momo Ghar"));
        assert_eq!(session.user.vendor_id.as_deref(), Some("v-9"));
        assert_eq!(session.user.effective_vendor_id(), Some("v-9"));
    }

    #[test]
    fn session_synthesized_from_claims() {
        let token = encode_for_tests(&json!({
            "sub": "u-3",
            "name": "Asha",
            "email": "asha@example.com",
            "exp": 2_000_000_000,
        }));
        let p = payload(json!({ "token": token }));
        let session = session_from_payload(&p, Role::User, "asha@example.com").unwrap();
        assert_eq!(session.user.id.as_ref().map(|i| i.0.as_str()), Some("u-3"));
        assert_eq!(session.user.display_name.as_deref(), Some("Asha"));
        assert_eq!(session.user.email.as_deref(), Some("asha@example.com"));
    }

    #[test]
    fn session_from_opaque_token_uses_login_email() {
        let p = payload(json!({ "token": "opaque-not-a-jwt" }));
        let session = session_from_payload(&p, Role::User, "asha@example.com").unwrap();
        assert_eq!(session.token.as_str(), "opaque-not-a-jwt");
        assert_eq!(session.user.email.as_deref(), Some("asha@example.com"));
        // display name falls back to the email local part
        assert_eq!(session.user.display_name.as_deref(), Some("asha"));
    }

    #[test]
    fn session_requires_a_token() {
        let p = payload(json!({ "role": "ADMIN" }));
        assert!(matches!(
            session_from_payload(&p, Role::Admin, "a@b.c"),
            Err(Error::MissingToken)
        ));
    }

    #[test]
    fn email_like_sub_claim_used_as_email() {
        let token = encode_for_tests(&json!({"sub": "rider@example.com", "exp": 2_000_000_000}));
        let p = payload(json!({ "jwt": token }));
        let session = session_from_payload(&p, Role::Delivery, "other@example.com").unwrap();
        assert_eq!(session.user.email.as_deref(), Some("rider@example.com"));
    }
}
