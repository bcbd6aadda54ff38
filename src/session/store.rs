use serde::{Deserialize, Serialize};

use super::error::AuthError;
use super::storage::{StorageTier, keys};
use crate::token;
use crate::types::{Role, Session, Token, UserRecord};

/// Which tier a session is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Durability {
    /// Session-scoped storage; gone when the shell/tab ends.
    Ephemeral,
    /// Durable storage; survives restarts ("remember me").
    Persistent,
}

/// Named tier read-order policy.
///
/// Reads consult the first tier, then fall back to the other. The order is an
/// explicit policy rather than an implementation accident so tests can assert
/// it deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TierPrecedence {
    #[default]
    EphemeralFirst,
    PersistentFirst,
}

/// Two-tier persistence for the `{token, user}` pair.
///
/// Invariants:
/// - token and user live in exactly one tier at a time (tier exclusivity);
/// - they are set and cleared together — a write failure rolls the store
///   back to empty rather than leaving half a session;
/// - [`clear`](Self::clear) is total and idempotent, sweeping both tiers and
///   every legacy key;
/// - [`is_authenticated`](Self::is_authenticated) self-heals: it never leaves
///   an expired-but-present token in storage.
pub struct SessionStore {
    ephemeral: Box<dyn StorageTier>,
    persistent: Box<dyn StorageTier>,
    precedence: TierPrecedence,
}

impl SessionStore {
    /// Create a store over the two tiers with the default
    /// [`TierPrecedence::EphemeralFirst`] read order.
    #[must_use]
    pub fn new(
        ephemeral: impl StorageTier + 'static,
        persistent: impl StorageTier + 'static,
    ) -> Self {
        Self {
            ephemeral: Box::new(ephemeral),
            persistent: Box::new(persistent),
            precedence: TierPrecedence::default(),
        }
    }

    /// A store over two in-memory tiers. Handy in tests and headless tools.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(super::storage::MemoryTier::new(), super::storage::MemoryTier::new())
    }

    /// Override the read-order policy.
    #[must_use]
    pub fn with_precedence(mut self, precedence: TierPrecedence) -> Self {
        self.precedence = precedence;
        self
    }

    fn tiers_for(&self, durability: Durability) -> (&dyn StorageTier, &dyn StorageTier) {
        match durability {
            Durability::Ephemeral => (self.ephemeral.as_ref(), self.persistent.as_ref()),
            Durability::Persistent => (self.persistent.as_ref(), self.ephemeral.as_ref()),
        }
    }

    fn read_order(&self) -> (&dyn StorageTier, &dyn StorageTier) {
        match self.precedence {
            TierPrecedence::EphemeralFirst => (self.ephemeral.as_ref(), self.persistent.as_ref()),
            TierPrecedence::PersistentFirst => (self.persistent.as_ref(), self.ephemeral.as_ref()),
        }
    }

    /// Persist a session under the chosen durability tier.
    ///
    /// The other tier's token/user keys are removed first so the pair never
    /// exists in both tiers. Any failure mid-write triggers a full
    /// [`clear`](Self::clear) before the error propagates — no partial
    /// session survives.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Store`] if a tier write fails.
    pub fn save(&self, session: &Session, durability: Durability) -> Result<(), AuthError> {
        let user_json = serde_json::to_string(&session.user)
            .map_err(|e| AuthError::Store(e.to_string()))?;

        let (target, other) = self.tiers_for(durability);
        let result = other
            .remove(keys::TOKEN)
            .and_then(|()| other.remove(keys::USER))
            .and_then(|()| target.set(keys::USER, &user_json))
            .and_then(|()| target.set(keys::TOKEN, session.token.as_str()));

        if let Err(e) = result {
            tracing::warn!(error = %e, "session write failed, rolling back to empty");
            self.clear();
            return Err(AuthError::Store(e.to_string()));
        }
        Ok(())
    }

    /// The stored token, if any, in precedence order.
    #[must_use]
    pub fn load_token(&self) -> Option<Token> {
        let (first, second) = self.read_order();
        first
            .get(keys::TOKEN)
            .or_else(|| second.get(keys::TOKEN))
            .map(Token)
    }

    /// The stored user record, if any, in the same precedence order as
    /// [`load_token`](Self::load_token). A record that fails to deserialize
    /// reads as absent.
    #[must_use]
    pub fn load_user(&self) -> Option<UserRecord> {
        let (first, second) = self.read_order();
        let raw = first.get(keys::USER).or_else(|| second.get(keys::USER))?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!(error = %e, "stored user record is unreadable");
                None
            }
        }
    }

    /// The stored user's role, if any.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.load_user().map(|u| u.role)
    }

    /// Remove token, user and every legacy key from both tiers.
    ///
    /// Total and idempotent: tier errors are logged and do not stop the
    /// sweep, so one failing key never shields the rest.
    pub fn clear(&self) {
        for tier in [self.ephemeral.as_ref(), self.persistent.as_ref()] {
            for key in [keys::TOKEN, keys::USER].iter().chain(keys::LEGACY) {
                if let Err(e) = tier.remove(key) {
                    tracing::warn!(error = %e, key, "storage remove failed during clear");
                }
            }
        }
    }

    /// Whether a live session exists: a token is stored and not expired.
    ///
    /// Self-healing: finding an expired or undecodable token clears both
    /// tiers before returning `false`, so an authenticated-check never
    /// leaves a dead token behind.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        let Some(stored) = self.load_token() else {
            return false;
        };
        if token::is_expired(stored.as_str()) {
            tracing::debug!("stored token expired, clearing session");
            self.clear();
            return false;
        }
        true
    }

    /// Record the remember-me email prefill (persistent tier, wiped by
    /// [`clear`](Self::clear)).
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Store`] if the persistent tier write fails.
    pub fn remember_email(&self, email: &str) -> Result<(), AuthError> {
        self.persistent
            .set(keys::REMEMBERED_EMAIL, email)
            .map_err(|e| AuthError::Store(e.to_string()))
    }

    /// The remembered email prefill, if any.
    #[must_use]
    pub fn remembered_email(&self) -> Option<String> {
        self.persistent.get(keys::REMEMBERED_EMAIL)
    }

    #[cfg(test)]
    pub(crate) fn ephemeral_tier(&self) -> &dyn StorageTier {
        self.ephemeral.as_ref()
    }
}
