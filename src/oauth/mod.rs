//! OAuth2 client-credentials support
//!
//! The gateway authenticates to the tenant with a single API client. Tokens
//! are cached in memory only and refreshed when they expire or the API
//! rejects them.

mod client;
mod token;

pub use client::ClientCredentials;
pub use token::CachedToken;

use async_trait::async_trait;

use crate::Result;

/// Source of bearer tokens for outgoing API calls
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Return a currently valid bearer token, acquiring one if needed
    async fn token(&self) -> Result<String>;

    /// Drop the cached token so the next [`TokenSource::token`] call reacquires
    fn invalidate(&self);
}
