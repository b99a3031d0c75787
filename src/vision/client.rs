//! Authenticated calls to the Vision batch-annotate endpoint.

use tracing::{debug, error, info};

use super::{
    AnnotateImageResponse, AnnotationRequest, BatchAnnotateRequest, BatchAnnotateResponse,
};
use crate::auth::AccessToken;
use crate::error::{PinVisionError, Result};

/// Production batch-annotate endpoint
pub const DEFAULT_VISION_ENDPOINT: &str = "https://vision.googleapis.com/v1/images:annotate";

/// Maximum number of response bytes echoed into debug logs
const LOG_SNIPPET_LEN: usize = 500;

/// Vision API client
#[derive(Debug, Clone)]
pub struct AnnotationClient {
    client: reqwest::Client,
    endpoint: String,
}

impl AnnotationClient {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Annotate a single image and return its raw response entry.
    pub async fn annotate(
        &self,
        token: &AccessToken,
        request: &AnnotationRequest,
    ) -> Result<AnnotateImageResponse> {
        info!("Calling Vision API at {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(token.secret())
            .json(&BatchAnnotateRequest {
                requests: [request],
            })
            .send()
            .await
            .map_err(|e| PinVisionError::AnnotationCall {
                status: None,
                body: e.to_string(),
            })?;

        let status = response.status();
        info!("Vision API response status: {}", status);

        let body = response
            .text()
            .await
            .map_err(|e| PinVisionError::AnnotationCall {
                status: Some(status.as_u16()),
                body: format!("failed to read response body: {}", e),
            })?;

        if !status.is_success() {
            error!("Vision API error response body: {}", body);
            return Err(PinVisionError::AnnotationCall {
                status: Some(status.as_u16()),
                body,
            });
        }

        debug!("Vision API raw response: {}...", snippet(&body));

        let batch: BatchAnnotateResponse =
            serde_json::from_str(&body).map_err(|e| PinVisionError::AnnotationCall {
                status: Some(status.as_u16()),
                body: format!("invalid response JSON: {}", e),
            })?;

        let first = batch
            .responses
            .into_iter()
            .next()
            .ok_or_else(|| PinVisionError::AnnotationCall {
                status: Some(status.as_u16()),
                body: "No response found in Vision API output.".to_string(),
            })?;

        if let Some(err) = &first.error {
            let message = err.message.clone().unwrap_or_default();
            error!("Vision API reported image error {:?}: {}", err.code, message);
            return Err(PinVisionError::AnnotationCall {
                status: Some(status.as_u16()),
                body: message,
            });
        }

        Ok(first)
    }
}

fn snippet(body: &str) -> &str {
    match body.char_indices().nth(LOG_SNIPPET_LEN) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
