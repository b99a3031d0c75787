//! Service account token provider.
//!
//! Mints a signed assertion from the service account's private key and
//! redeems it at the credential's token endpoint. Tokens are optionally
//! cached and refreshed shortly before expiry.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use parking_lot::RwLock;
use tracing::{debug, info};

use super::assertion::{sign_assertion, CLOUD_VISION_SCOPE};
use super::exchange::exchange_assertion;
use super::{AccessToken, TokenProvider};
use crate::credentials::ServiceAccountCredential;
use crate::error::Result;

/// Buffer time before token expiry to trigger refresh (60 seconds).
const EXPIRY_BUFFER_SECS: i64 = 60;

/// Configuration for the service account provider.
#[derive(Debug, Clone)]
pub struct ServiceAccountProviderConfig {
    /// OAuth scope requested in the assertion.
    pub scope: String,
    /// Reuse tokens until shortly before they expire.
    pub cache_tokens: bool,
}

impl Default for ServiceAccountProviderConfig {
    fn default() -> Self {
        Self {
            scope: CLOUD_VISION_SCOPE.to_string(),
            cache_tokens: true,
        }
    }
}

/// A token provider using Google Cloud service account credentials.
///
/// One provider serves one service account, so the cache needs no key.
pub struct ServiceAccountProvider {
    credential: ServiceAccountCredential,
    config: ServiceAccountProviderConfig,
    client: reqwest::Client,
    cached_token: RwLock<Option<AccessToken>>,
}

impl ServiceAccountProvider {
    /// Create a new service account provider.
    pub fn new(
        credential: ServiceAccountCredential,
        client: reqwest::Client,
        config: ServiceAccountProviderConfig,
    ) -> Self {
        Self {
            credential,
            config,
            client,
            cached_token: RwLock::new(None),
        }
    }

    /// Sign a fresh assertion and exchange it.
    async fn fetch_token(&self) -> Result<AccessToken> {
        info!(
            "Requesting access token for {}",
            self.credential.client_email
        );

        let assertion = sign_assertion(&self.credential, &self.config.scope, Utc::now())?;
        let token =
            exchange_assertion(&self.client, &self.credential.token_uri, &assertion).await?;

        info!("Obtained access token for {}", self.credential.client_email);
        Ok(token)
    }

    fn cached(&self) -> Option<AccessToken> {
        let cache = self.cached_token.read();
        let token = cache.as_ref()?;
        if token.expires_within(Utc::now(), Duration::seconds(EXPIRY_BUFFER_SECS)) {
            return None;
        }
        Some(token.clone())
    }
}

#[async_trait]
impl TokenProvider for ServiceAccountProvider {
    async fn access_token(&self) -> Result<AccessToken> {
        if !self.config.cache_tokens {
            return self.fetch_token().await;
        }

        if let Some(token) = self.cached() {
            debug!("Using cached access token");
            return Ok(token);
        }

        let token = self.fetch_token().await?;
        *self.cached_token.write() = Some(token.clone());

        Ok(token)
    }
}
