use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::Value as JsonValue;
use time::OffsetDateTime;

/// Decoded payload claims of a bearer token.
///
/// Derived on demand from the token string, never persisted. The signature is
/// NOT verified — the client is not the trust boundary; the API re-checks the
/// token on every request.
#[derive(Debug, Clone)]
pub struct DecodedClaims {
    inner: JsonValue,
}

impl DecodedClaims {
    /// Gets a claim value by key.
    #[must_use]
    pub fn get_claim(&self, key: &str) -> Option<&JsonValue> {
        self.inner.get(key)
    }

    /// Gets the inner JSON value.
    #[must_use]
    pub fn as_json(&self) -> &JsonValue {
        &self.inner
    }

    /// The `exp` claim as epoch seconds, if declared.
    #[must_use]
    pub fn expiry_epoch_seconds(&self) -> Option<i64> {
        let exp = self.inner.get("exp")?;
        exp.as_i64().or_else(|| exp.as_f64().map(|f| f as i64))
    }

    /// The `role` claim, raw.
    #[must_use]
    pub fn role(&self) -> Option<&str> {
        self.inner.get("role").and_then(JsonValue::as_str)
    }

    /// The `sub` claim.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.inner.get("sub").and_then(JsonValue::as_str)
    }

    /// The `email` claim.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.inner.get("email").and_then(JsonValue::as_str)
    }
}

/// Decodes the payload of a compact JWT (`header.payload.signature`).
///
/// Total: any malformed input — wrong segment count, bad base64url, payload
/// that is not a JSON object — yields `None`. Never panics.
#[must_use]
pub fn decode(token: &str) -> Option<DecodedClaims> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        tracing::debug!(segments = parts.len(), "rejected token: wrong segment count");
        return None;
    }

    // Tolerate padded encoders; the canonical form carries no '='.
    let payload_b64 = parts[1].trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD.decode(payload_b64).ok()?;
    let inner: JsonValue = serde_json::from_slice(&bytes).ok()?;
    if !inner.is_object() {
        return None;
    }
    Some(DecodedClaims { inner })
}

/// Whether a token should be treated as expired.
///
/// Malformed tokens are expired (fail-closed). A decodable token with
/// `exp <= now` is expired. A decodable token that declares no `exp` never
/// expires — this matches the API's issuance behavior, where tokens without
/// an expiry are long-lived service tokens. Note the asymmetry with
/// [`remaining_lifetime`], which reports zero for such tokens.
#[must_use]
pub fn is_expired(token: &str) -> bool {
    is_expired_at(token, now_epoch())
}

pub(crate) fn is_expired_at(token: &str, now: i64) -> bool {
    match decode(token) {
        None => true,
        Some(claims) => match claims.expiry_epoch_seconds() {
            Some(exp) => exp <= now,
            None => false,
        },
    }
}

/// Time until expiry: `max(0, exp - now)`.
///
/// Zero for malformed tokens and for tokens without an `exp` claim.
#[must_use]
pub fn remaining_lifetime(token: &str) -> Duration {
    remaining_lifetime_at(token, now_epoch())
}

pub(crate) fn remaining_lifetime_at(token: &str, now: i64) -> Duration {
    let exp = decode(token).and_then(|c| c.expiry_epoch_seconds());
    match exp {
        Some(exp) if exp > now => Duration::from_secs((exp - now) as u64),
        _ => Duration::ZERO,
    }
}

/// Whether a still-valid token expires within `window`.
///
/// False for already-expired or malformed tokens (nothing left to refresh)
/// and for tokens with no declared expiry.
#[must_use]
pub fn expires_within(token: &str, window: Duration) -> bool {
    let remaining = remaining_lifetime(token);
    !remaining.is_zero() && remaining < window
}

pub(crate) fn now_epoch() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

/// Builds an unsigned compact token around the given claims object.
#[cfg(test)]
pub(crate) fn encode_for_tests(claims: &JsonValue) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string().as_bytes());
    format!("{header}.{payload}.sig")
}
