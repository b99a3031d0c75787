//! Image identification pipeline
//!
//! Wires a token provider, the Vision client and the normalizer together.
//! Each call to [`PinIdentifier::identify`] is independent: fetch a token,
//! annotate the image, normalize the response.

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, instrument};

use crate::auth::{ServiceAccountProvider, TokenProvider};
use crate::config::{Config, ConfigError};
use crate::error::{PinVisionError, Result};
use crate::vision::{normalize, AnnotationClient, AnnotationRequest, NormalizedResult};

/// Request body field holding the base64 image
pub const IMAGE_FIELD: &str = "imageData";

/// Result caps sent with each annotation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureLimits {
    pub web_max_results: u32,
    pub label_max_results: u32,
}

impl Default for FeatureLimits {
    fn default() -> Self {
        Self {
            web_max_results: crate::vision::DEFAULT_WEB_MAX_RESULTS,
            label_max_results: crate::vision::DEFAULT_LABEL_MAX_RESULTS,
        }
    }
}

/// Identifies pins in images
pub struct PinIdentifier {
    tokens: Arc<dyn TokenProvider>,
    client: AnnotationClient,
    limits: FeatureLimits,
}

impl PinIdentifier {
    pub fn new(
        tokens: Arc<dyn TokenProvider>,
        client: AnnotationClient,
        limits: FeatureLimits,
    ) -> Self {
        Self {
            tokens,
            client,
            limits,
        }
    }

    /// Build the pipeline from configuration, loading the service account
    /// credentials it names.
    pub fn from_config(config: &Config) -> std::result::Result<Self, SetupError> {
        let credential = config.credentials.load()?;
        let http = config.http.build_client()?;

        info!(
            "Using service account {} against {}",
            credential.client_email, config.vision.endpoint
        );

        let provider =
            ServiceAccountProvider::new(credential, http.clone(), (&config.auth).into());
        let client = AnnotationClient::new(http, config.vision.endpoint.clone());

        Ok(Self::new(
            Arc::new(provider),
            client,
            FeatureLimits {
                web_max_results: config.vision.web_max_results,
                label_max_results: config.vision.label_max_results,
            },
        ))
    }

    /// Identify the pin in a base64-encoded image.
    #[instrument(skip_all, fields(image_len = image_base64.len()))]
    pub async fn identify(&self, image_base64: &str) -> Result<NormalizedResult> {
        if image_base64.trim().is_empty() {
            return Err(PinVisionError::InvalidInput(
                "image payload must be a non-empty base64 string".to_string(),
            ));
        }

        let token = self.tokens.access_token().await?;

        let request = AnnotationRequest::new(
            image_base64.to_string(),
            self.limits.web_max_results,
            self.limits.label_max_results,
        );
        let raw = self.client.annotate(&token, &request).await?;

        let result = normalize(&raw);
        info!(
            "Identified {:?} with {} suggestion(s)",
            result.identified_name,
            result.suggested_urls.len()
        );
        Ok(result)
    }

    /// Identify the pin in a JSON request body of the form
    /// `{"imageData": "<base64>"}`.
    pub async fn identify_request(&self, body: &Value) -> Result<NormalizedResult> {
        let image = image_from_request(body)?;
        self.identify(image).await
    }
}

/// Extract the base64 image from a request body.
pub fn image_from_request(body: &Value) -> Result<&str> {
    match body.get(IMAGE_FIELD) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.as_str()),
        Some(Value::String(_)) | None | Some(Value::Null) => Err(PinVisionError::InvalidInput(
            format!("Missing {} in request body", IMAGE_FIELD),
        )),
        Some(_) => Err(PinVisionError::InvalidInput(format!(
            "{} must be a base64 string",
            IMAGE_FIELD
        ))),
    }
}

/// Failure while assembling the pipeline from configuration
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Core(#[from] PinVisionError),
}
