use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Dashboard role attached to every session.
///
/// The canonical wire and storage form is UPPERCASE (`"ADMIN"`, `"VENDOR"`,
/// `"USER"`, `"DELIVERY"`). Parsing is case-insensitive; normalization happens
/// at the single point where a role string enters the system, never at check
/// time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "ADMIN")]
    Admin,
    #[serde(rename = "VENDOR")]
    Vendor,
    #[serde(rename = "USER")]
    User,
    #[serde(rename = "DELIVERY")]
    Delivery,
}

impl Role {
    /// Canonical uppercase form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Vendor => "VENDOR",
            Self::User => "USER",
            Self::Delivery => "DELIVERY",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        if t.eq_ignore_ascii_case("admin") {
            Ok(Self::Admin)
        } else if t.eq_ignore_ascii_case("vendor") {
            Ok(Self::Vendor)
        } else if t.eq_ignore_ascii_case("user") {
            Ok(Self::User)
        } else if t.eq_ignore_ascii_case("delivery") {
            Ok(Self::Delivery)
        } else {
            Err(Error::UnknownRole(t.to_owned()))
        }
    }
}

/// Opaque bearer token string issued by the API.
///
/// The client never verifies token signatures; it only reads the payload
/// claims (see [`crate::token`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into)]
#[serde(transparent)]
pub struct Token(pub String);

impl Token {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// API user identifier (opaque string).
///
/// The API chooses the format (Mongo ObjectId, UUID, etc.).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into)]
#[serde(transparent)]
pub struct UserId(pub String);

/// Profile record stored next to the bearer token.
///
/// Everything except `role` is optional — login responses vary in how much
/// they return, and a record synthesized from token claims may carry only
/// the role and an email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner_id: Option<String>,
}

impl UserRecord {
    /// Create a record with only the required `role` field.
    #[must_use]
    pub fn new(role: Role) -> Self {
        Self {
            id: None,
            display_name: None,
            email: None,
            role,
            profile_picture: None,
            vendor_id: None,
            partner_id: None,
        }
    }

    /// Set the user ID.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<UserId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the display name.
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Set the email.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Set the vendor ID.
    #[must_use]
    pub fn with_vendor_id(mut self, id: impl Into<String>) -> Self {
        self.vendor_id = Some(id.into());
        self
    }

    /// The identifier vendor-scoped API calls should use.
    ///
    /// Only meaningful for vendor sessions: `vendor_id`, falling back to
    /// `partner_id`, falling back to the user ID. `None` for every other role.
    #[must_use]
    pub fn effective_vendor_id(&self) -> Option<&str> {
        if self.role != Role::Vendor {
            return None;
        }
        self.vendor_id
            .as_deref()
            .or(self.partner_id.as_deref())
            .or(self.id.as_ref().map(|id| id.0.as_str()))
    }
}

/// An authenticated session: one token, one user record.
///
/// The two are a single value so they are saved and cleared together —
/// there is no representable state with a token and no user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: Token,
    pub user: UserRecord,
}

impl Session {
    #[must_use]
    pub fn new(token: Token, user: UserRecord) -> Self {
        Self { token, user }
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.user.role
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parse_case_insensitive() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("VENDOR".parse::<Role>().unwrap(), Role::Vendor);
        assert_eq!("Delivery".parse::<Role>().unwrap(), Role::Delivery);
        assert_eq!(" user ".parse::<Role>().unwrap(), Role::User);
    }

    #[test]
    fn role_parse_unknown() {
        assert!("superadmin".parse::<Role>().is_err());
        assert!("".parse::<Role>().is_err());
    }

    #[test]
    fn role_serde_canonical_uppercase() {
        let json = serde_json::to_string(&Role::Vendor).unwrap();
        assert_eq!(json, "\"VENDOR\"");
        let parsed: Role = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Role::Vendor);
    }

    #[test]
    fn user_record_camel_case() {
        let record = UserRecord::new(Role::Vendor)
            .with_id("u-1".to_string())
            .with_display_name("Momo Ghar");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["role"], "VENDOR");
        assert_eq!(json["displayName"], "Momo Ghar");
        assert_eq!(json["id"], "u-1");
    }

    #[test]
    fn effective_vendor_id_fallback_chain() {
        let mut record = UserRecord::new(Role::Vendor).with_id("u-1".to_string());
        assert_eq!(record.effective_vendor_id(), Some("u-1"));
        record.partner_id = Some("p-1".into());
        assert_eq!(record.effective_vendor_id(), Some("p-1"));
        record.vendor_id = Some("v-1".into());
        assert_eq!(record.effective_vendor_id(), Some("v-1"));
    }

    #[test]
    fn effective_vendor_id_non_vendor_is_none() {
        let record = UserRecord::new(Role::Admin)
            .with_id("u-1".to_string())
            .with_vendor_id("v-1");
        assert_eq!(record.effective_vendor_id(), None);
    }

    #[test]
    fn newtypes_prevent_mixing() {
        fn takes_token(_: &Token) {}
        fn takes_user_id(_: &UserId) {}

        let token = Token::from("abc".to_string());
        let user = UserId::from("abc".to_string());

        takes_token(&token);
        takes_user_id(&user);
        // takes_token(&user);  // Compile error!
        // takes_user_id(&token);  // Compile error!
    }
}
