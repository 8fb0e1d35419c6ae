//! The `Credential` record and the expiring-credential contract.

use chrono::{DateTime, Duration, Utc};
use zeroize::Zeroize;

/// `{access_key_id, secret_access_key, session_token?}`, optionally
/// carrying an expiration. Once observed, a value is immutable — rotation
/// produces a new [`Credential`], never a mutation of an existing one.
#[derive(Clone)]
pub struct Credential {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
    pub expiration: Option<DateTime<Utc>>,
}

impl Drop for Credential {
    fn drop(&mut self) {
        self.secret_access_key.zeroize();
        if let Some(token) = &mut self.session_token {
            token.zeroize();
        }
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"***")
            .field("session_token", &self.session_token.as_ref().map(|_| "***"))
            .field("expiration", &self.expiration)
            .finish()
    }
}

impl Credential {
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
            expiration: None,
        }
    }

    pub fn with_session_token(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: impl Into<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: Some(session_token.into()),
            expiration: None,
        }
    }

    pub fn expiring(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: Option<String>,
        expiration: DateTime<Utc>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token,
            expiration: Some(expiration),
        }
    }

    /// I1: a credential with `expiration <= now` must never be used to sign.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expiration, Some(exp) if exp <= now)
    }

    /// True when the credential will expire within `window` of `now`, used
    /// by the rotating wrapper to decide whether to kick off a background
    /// refresh ahead of hard expiration.
    pub fn near_expiration(&self, now: DateTime<Utc>, window: Duration) -> bool {
        match self.expiration {
            Some(exp) => exp - now <= window,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_credential_never_expires() {
        let c = Credential::new("AKID", "SECRET");
        assert!(!c.is_expired(Utc::now()));
        assert!(!c.near_expiration(Utc::now(), Duration::hours(1)));
    }

    #[test]
    fn expiring_credential_detects_expiry() {
        let now = Utc::now();
        let c = Credential::expiring("AKID", "SECRET", None, now - Duration::seconds(1));
        assert!(c.is_expired(now));
    }

    #[test]
    fn near_expiration_window() {
        let now = Utc::now();
        let c = Credential::expiring("AKID", "SECRET", None, now + Duration::minutes(5));
        assert!(c.near_expiration(now, Duration::minutes(15)));
        assert!(!c.near_expiration(now, Duration::minutes(1)));
    }
}
