use crate::types::Role;

/// Authentication errors for the session layer.
///
/// The first four variants are the guard/monitor taxonomy; every one of them
/// resolves to a redirect at that boundary and never reaches view code. The
/// rest are infrastructure failures surfaced only from view-initiated
/// operations (`save`, `login`) that can legitimately fail.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AuthError {
    /// No token or no readable user record present.
    #[error("No session present")]
    MissingSession,

    /// Token decodes but its expiry has passed.
    #[error("Token has expired")]
    ExpiredToken,

    /// Token is malformed or undecodable. Treated exactly like expiry.
    #[error("Token is invalid")]
    InvalidToken,

    /// Authenticated, but the session's role is not permitted here.
    #[error("Role {actual} is not permitted for this route")]
    RoleMismatch { actual: Role },

    /// Storage tier operation failed.
    #[error("Session store error: {0}")]
    Store(String),

    /// Missing or invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// API call failed (login, profile fetch).
    #[error("API error: {0}")]
    Api(String),
}

impl From<crate::error::Error> for AuthError {
    fn from(e: crate::error::Error) -> Self {
        match e {
            crate::error::Error::Config(msg) => Self::Config(msg),
            other => Self::Api(other.to_string()),
        }
    }
}
