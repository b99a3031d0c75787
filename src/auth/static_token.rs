//! Static token provider for testing and pre-minted tokens.
//!
//! Returns a fixed token without refresh. Once the token's expiry passes
//! the provider reports an error instead of handing out a dead token.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{AccessToken, TokenProvider};
use crate::error::{PinVisionError, Result};

/// A token provider that returns a static token.
pub struct StaticTokenProvider {
    token: AccessToken,
}

impl StaticTokenProvider {
    /// Create a provider for a token valid until `expires_at`.
    pub fn new(token: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: AccessToken::new(token, expires_at),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<AccessToken> {
        if self.token.is_expired_at(Utc::now()) {
            return Err(PinVisionError::AuthExchange {
                status: None,
                body: "static access token has expired".to_string(),
            });
        }
        Ok(self.token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_static_token_provider() {
        let provider = StaticTokenProvider::new(
            "test_token_123".to_string(),
            Utc::now() + Duration::hours(1),
        );
        let token = provider.access_token().await.unwrap();
        assert_eq!(token.secret(), "test_token_123");
    }

    #[tokio::test]
    async fn test_static_token_is_stable() {
        let provider =
            StaticTokenProvider::new("my_token".to_string(), Utc::now() + Duration::hours(1));

        let token1 = provider.access_token().await.unwrap();
        let token2 = provider.access_token().await.unwrap();

        assert_eq!(token1, token2);
    }

    #[tokio::test]
    async fn test_expired_static_token_is_refused() {
        let provider =
            StaticTokenProvider::new("old".to_string(), Utc::now() - Duration::seconds(1));
        assert!(provider.access_token().await.is_err());
    }
}
