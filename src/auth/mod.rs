//! Access token sources for the Vision API
//!
//! - Service account credentials, minting a JWT-bearer assertion and
//!   exchanging it at the token endpoint
//! - Static tokens (for testing or pre-minted tokens)

pub mod assertion;
pub mod exchange;
pub mod pem;
pub mod service_account;
pub mod static_token;

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::error::Result;

pub use assertion::{sign_assertion, SignedAssertion, CLOUD_VISION_SCOPE};
pub use exchange::exchange_assertion;
pub use pem::pem_to_der;
pub use service_account::{ServiceAccountProvider, ServiceAccountProviderConfig};
pub use static_token::StaticTokenProvider;

/// A bearer token and the instant it stops being valid.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    token: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(token: String, expires_at: DateTime<Utc>) -> Self {
        Self { token, expires_at }
    }

    /// The raw bearer token. Never log this.
    pub fn secret(&self) -> &str {
        &self.token
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// True once `now` has reached the expiry instant.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// True if the token expires within `buffer` of `now`.
    pub fn expires_within(&self, now: DateTime<Utc>, buffer: Duration) -> bool {
        now + buffer >= self.expires_at
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Trait for access token providers.
///
/// Implementations must be shareable across concurrent requests.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Return a token that is valid at the time of the call.
    async fn access_token(&self) -> Result<AccessToken>;
}
