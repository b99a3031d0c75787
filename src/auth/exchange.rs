//! JWT-bearer grant exchange against the OAuth2 token endpoint.

use chrono::{TimeZone, Utc};
use serde::Deserialize;
use tracing::{debug, error};

use super::assertion::SignedAssertion;
use super::AccessToken;
use crate::error::{PinVisionError, Result};

/// Grant type for exchanging a signed assertion (RFC 7523)
pub const JWT_BEARER_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Response structure from the token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    /// Token lifetime in seconds from issue
    expires_in: Option<i64>,
}

/// Redeem `assertion` at `token_uri` for an access token.
///
/// A single attempt is made. Any non-success status is returned as
/// [`PinVisionError::AuthExchange`] with the status and body untouched.
pub async fn exchange_assertion(
    client: &reqwest::Client,
    token_uri: &str,
    assertion: &SignedAssertion,
) -> Result<AccessToken> {
    let params = [
        ("grant_type", JWT_BEARER_GRANT_TYPE),
        ("assertion", assertion.jwt.as_str()),
    ];

    let response = client
        .post(token_uri)
        .form(&params)
        .send()
        .await
        .map_err(|e| PinVisionError::AuthExchange {
            status: None,
            body: e.to_string(),
        })?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| PinVisionError::AuthExchange {
            status: Some(status.as_u16()),
            body: format!("failed to read response body: {}", e),
        })?;

    if !status.is_success() {
        error!("Token endpoint returned error {}: {}", status, body);
        return Err(PinVisionError::AuthExchange {
            status: Some(status.as_u16()),
            body,
        });
    }

    let parsed: TokenResponse =
        serde_json::from_str(&body).map_err(|_| PinVisionError::AuthExchange {
            status: Some(status.as_u16()),
            body: body.clone(),
        })?;

    let token = match parsed.access_token {
        Some(token) if !token.is_empty() => token,
        _ => {
            error!("Access token not found in token endpoint response");
            return Err(PinVisionError::AuthExchange {
                status: Some(status.as_u16()),
                body,
            });
        }
    };

    let expires_at = match parsed.expires_in {
        Some(secs) if secs > 0 => assertion.issued_at.checked_add(secs),
        Some(_) => None,
        None => Some(assertion.expires_at),
    }
    .and_then(|ts| Utc.timestamp_opt(ts, 0).single());

    let Some(expires_at) = expires_at else {
        error!(
            "Token endpoint returned unusable expires_in {:?}",
            parsed.expires_in
        );
        return Err(PinVisionError::AuthExchange {
            status: Some(status.as_u16()),
            body,
        });
    };
    debug!(%expires_at, "Exchanged assertion for access token");

    Ok(AccessToken::new(token, expires_at))
}
