//! In-memory bearer token with absolute expiry

use std::time::{Duration, Instant};

/// Seconds subtracted from `expires_in` so we refresh before the server does
pub const EXPIRY_SAFETY_MARGIN: Duration = Duration::from_secs(30);

/// Lifetime assumed when the token response omits `expires_in`
pub const DEFAULT_LIFETIME: Duration = Duration::from_secs(3600);

/// Longest lifetime we trust from the token endpoint
pub const MAX_LIFETIME: Duration = Duration::from_secs(24 * 3600);

/// Cached access token
#[derive(Debug, Clone)]
pub struct CachedToken {
    /// Access token
    pub access_token: String,
    /// Instant after which the token must not be used
    pub expires_at: Instant,
}

impl CachedToken {
    /// Create a cached token from a token response
    #[must_use]
    pub fn from_response(access_token: String, expires_in: Option<u64>) -> Self {
        let lifetime = expires_in
            .map_or(DEFAULT_LIFETIME, Duration::from_secs)
            .min(MAX_LIFETIME)
            .saturating_sub(EXPIRY_SAFETY_MARGIN);
        let now = Instant::now();
        Self {
            access_token,
            expires_at: now.checked_add(lifetime).unwrap_or(now),
        }
    }

    /// Check if the token can still be handed out
    #[must_use]
    pub fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }

    /// Time until the token stops being handed out
    #[must_use]
    pub fn time_until_expiry(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifetime_is_shortened_by_safety_margin() {
        let token = CachedToken::from_response("t".to_string(), Some(600));
        let remaining = token.time_until_expiry();
        assert!(remaining <= Duration::from_secs(570));
        assert!(remaining > Duration::from_secs(560));
        assert!(token.is_valid());
    }

    #[test]
    fn missing_expires_in_defaults_to_one_hour() {
        let token = CachedToken::from_response("t".to_string(), None);
        let remaining = token.time_until_expiry();
        assert!(remaining <= Duration::from_secs(3570));
        assert!(remaining > Duration::from_secs(3560));
    }

    #[test]
    fn huge_expires_in_is_capped() {
        let token = CachedToken::from_response("t".to_string(), Some(u64::MAX));
        assert!(token.is_valid());
        assert!(token.time_until_expiry() <= MAX_LIFETIME - EXPIRY_SAFETY_MARGIN);
    }

    #[test]
    fn lifetime_shorter_than_margin_is_immediately_stale() {
        let token = CachedToken::from_response("t".to_string(), Some(10));
        assert!(!token.is_valid());
        assert_eq!(token.time_until_expiry(), Duration::ZERO);
    }
}
