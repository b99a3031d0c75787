//! Signed JWT assertions for the OAuth2 JWT-bearer grant.
//!
//! The assertion is a compact RS256 JWT whose issuer is the service account
//! and whose audience is the token endpoint that will redeem it.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::sha2::Sha256;
use rsa::signature::{SignatureEncoding, Signer};
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use serde::{Deserialize, Serialize};

use super::pem::pem_to_der;
use crate::credentials::ServiceAccountCredential;
use crate::error::{PinVisionError, Result};

/// OAuth scope for the Cloud Vision API
pub const CLOUD_VISION_SCOPE: &str = "https://www.googleapis.com/auth/cloud-vision";

/// Assertion lifetime; the grant rejects anything at or over one hour.
pub const ASSERTION_LIFETIME_SECS: i64 = 3599;

const MIN_KEY_BITS: usize = 2048;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Header {
    pub alg: String,
    pub typ: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
}

/// Claim set of a JWT-bearer assertion
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(credential: &ServiceAccountCredential, scope: &str, now: DateTime<Utc>) -> Self {
        let iat = now.timestamp();
        Self {
            iss: credential.client_email.clone(),
            scope: scope.to_string(),
            aud: credential.token_uri.clone(),
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        }
    }
}

/// A signed, compact-serialized assertion together with its time bounds
#[derive(Clone)]
pub struct SignedAssertion {
    pub jwt: String,
    pub issued_at: i64,
    pub expires_at: i64,
}

impl std::fmt::Debug for SignedAssertion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignedAssertion")
            .field("jwt", &"<redacted>")
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Build and sign an assertion for `credential` at time `now`.
pub fn sign_assertion(
    credential: &ServiceAccountCredential,
    scope: &str,
    now: DateTime<Utc>,
) -> Result<SignedAssertion> {
    let der = pem_to_der(&credential.private_key)?;

    let header = Header {
        alg: "RS256".to_string(),
        typ: "JWT".to_string(),
        kid: credential.private_key_id.clone(),
    };
    let claims = Claims::new(credential, scope, now);

    let signing_input = format!("{}.{}", encode_segment(&header)?, encode_segment(&claims)?);
    let signature = sign_rs256(&der, signing_input.as_bytes())?;

    Ok(SignedAssertion {
        jwt: format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(signature)),
        issued_at: claims.iat,
        expires_at: claims.exp,
    })
}

fn encode_segment<T: Serialize>(value: &T) -> Result<String> {
    let json = serde_json::to_vec(value)
        .map_err(|e| PinVisionError::Signing(format!("failed to encode JWT segment: {}", e)))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// RSASSA-PKCS1-v1_5 with SHA-256 over `message`. The key lives only for
/// the duration of this call.
fn sign_rs256(pkcs8_der: &[u8], message: &[u8]) -> Result<Vec<u8>> {
    let private_key = RsaPrivateKey::from_pkcs8_der(pkcs8_der)
        .map_err(|e| PinVisionError::Signing(format!("invalid RSA private key: {}", e)))?;

    let bits = private_key.size() * 8;
    if bits < MIN_KEY_BITS {
        return Err(PinVisionError::Signing(format!(
            "unsupported RSA key size: {} bits",
            bits
        )));
    }

    let signing_key = SigningKey::<Sha256>::new(private_key);
    let signature = signing_key
        .try_sign(message)
        .map_err(|e| PinVisionError::Signing(e.to_string()))?;

    Ok(signature.to_bytes().as_ref().to_vec())
}
