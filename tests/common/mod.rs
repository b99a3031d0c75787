//! Common test utilities and fixtures
//!
//! Spins up mock token and Vision endpoints and writes the config and
//! credential files a `PinIdentifier` is built from.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// PKCS#8 RSA-2048 key used for every signed assertion in tests
pub const TEST_KEY: &str = include_str!("../fixtures/test_key.pem");

pub const CLIENT_EMAIL: &str = "vision-test@pins-dev.iam.gserviceaccount.com";
pub const ACCESS_TOKEN: &str = "ya29.integration-token";

/// Mock Google endpoints plus a scratch directory for config files
pub struct Fixture {
    pub server: MockServer,
    pub dir: TempDir,
}

impl Fixture {
    pub async fn new() -> anyhow::Result<Self> {
        Ok(Self {
            server: MockServer::start().await,
            dir: tempfile::tempdir()?,
        })
    }

    pub fn token_uri(&self) -> String {
        format!("{}/token", self.server.uri())
    }

    pub fn vision_endpoint(&self) -> String {
        format!("{}/v1/images:annotate", self.server.uri())
    }

    /// Service account document pointing at the mock token endpoint
    pub fn credentials_json(&self) -> Value {
        json!({
            "type": "service_account",
            "project_id": "pins-dev",
            "private_key_id": "test-key-1",
            "private_key": TEST_KEY,
            "client_email": CLIENT_EMAIL,
            "token_uri": self.token_uri()
        })
    }

    pub fn write_credentials(&self) -> anyhow::Result<PathBuf> {
        let path = self.dir.path().join("service-account.json");
        std::fs::write(&path, serde_json::to_string_pretty(&self.credentials_json())?)?;
        Ok(path)
    }

    /// Write a config file using `credentials_path` and the mock endpoint
    pub fn write_config(
        &self,
        credentials_path: &Path,
        cache_tokens: bool,
    ) -> anyhow::Result<PathBuf> {
        let yaml = format!(
            r#"
logging:
  level: debug
credentials:
  path: {}
vision:
  endpoint: "{}"
auth:
  cache_tokens: {}
http:
  timeout: 10s
"#,
            credentials_path.display(),
            self.vision_endpoint(),
            cache_tokens
        );
        let path = self.dir.path().join("config.yaml");
        std::fs::write(&path, yaml)?;
        Ok(path)
    }

    /// Token endpoint accepting a JWT-bearer grant `expected` times
    pub async fn mount_token_endpoint(&self, expected: u64) {
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains(
                "grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer",
            ))
            .and(body_string_contains("assertion="))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": ACCESS_TOKEN,
                "expires_in": 3599,
                "token_type": "Bearer"
            })))
            .expect(expected)
            .mount(&self.server)
            .await;
    }

    /// Vision endpoint returning `response` as the single image result
    pub async fn mount_vision_endpoint(&self, response: Value, expected: u64) {
        Mock::given(method("POST"))
            .and(path("/v1/images:annotate"))
            .and(header("authorization", format!("Bearer {}", ACCESS_TOKEN)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "responses": [response]
            })))
            .expect(expected)
            .mount(&self.server)
            .await;
    }
}

/// A typical web + label detection result for an enamel pin photo
pub fn pin_annotation() -> Value {
    json!({
        "webDetection": {
            "webEntities": [
                { "entityId": "/m/0abc", "score": 0.92, "description": "Hidden Mickey" },
                { "entityId": "/m/0def", "score": 0.71 },
                { "entityId": "/m/0ghi", "score": 0.55, "description": "Pin trading" }
            ],
            "visuallySimilarImages": [
                { "url": "https://example.com/1.jpg" },
                { "url": "https://example.com/2.jpg" },
                { "url": "https://example.com/3.jpg" },
                { "url": "https://example.com/4.jpg" },
                { "url": "https://example.com/5.jpg" },
                { "url": "https://example.com/6.jpg" },
                { "url": "https://example.com/7.jpg" }
            ]
        },
        "labelAnnotations": [
            { "mid": "/m/01", "description": "Badge", "score": 0.9 },
            { "mid": "/m/02", "description": "Emblem", "score": 0.8 }
        ]
    })
}
