//! Cloud Vision `images:annotate` wire types
//!
//! Only the web detection and label detection parts of the API are modelled.
//! Every list in a response may be absent, null, or contain null entries;
//! those all deserialize to the entries that are actually present.

pub mod client;
pub mod normalize;

use serde::{Deserialize, Deserializer, Serialize};

pub use client::{AnnotationClient, DEFAULT_VISION_ENDPOINT};
pub use normalize::{normalize, NormalizedResult, UNKNOWN_NAME};

/// Default cap on web detection results
pub const DEFAULT_WEB_MAX_RESULTS: u32 = 10;

/// Default cap on label detection results
pub const DEFAULT_LABEL_MAX_RESULTS: u32 = 5;

// =============================================================================
// Request
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeatureType {
    WebDetection,
    LabelDetection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: FeatureType,
    pub max_results: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Image {
    /// Base64-encoded image bytes
    pub content: String,
}

/// One image and the features requested for it
#[derive(Debug, Clone, Serialize)]
pub struct AnnotationRequest {
    pub image: Image,
    pub features: Vec<Feature>,
}

impl AnnotationRequest {
    /// Request web detection and label detection for a base64 image.
    pub fn new(image_base64: String, web_max_results: u32, label_max_results: u32) -> Self {
        Self {
            image: Image {
                content: image_base64,
            },
            features: vec![
                Feature {
                    kind: FeatureType::WebDetection,
                    max_results: web_max_results,
                },
                Feature {
                    kind: FeatureType::LabelDetection,
                    max_results: label_max_results,
                },
            ],
        }
    }
}

/// Top-level batch request body
#[derive(Debug, Serialize)]
pub struct BatchAnnotateRequest<'a> {
    pub requests: [&'a AnnotationRequest; 1],
}

// =============================================================================
// Response
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchAnnotateResponse {
    #[serde(default, deserialize_with = "nullable_list")]
    pub responses: Vec<AnnotateImageResponse>,
}

/// Raw annotation result for a single image
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotateImageResponse {
    #[serde(default)]
    pub web_detection: Option<WebDetection>,

    #[serde(default, deserialize_with = "nullable_list")]
    pub label_annotations: Vec<EntityAnnotation>,

    /// Per-image failure, reported with HTTP 200
    #[serde(default)]
    pub error: Option<Status>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebDetection {
    #[serde(default, deserialize_with = "nullable_list")]
    pub web_entities: Vec<WebEntity>,

    #[serde(default, deserialize_with = "nullable_list")]
    pub visually_similar_images: Vec<WebImage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebEntity {
    #[serde(default)]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub score: Option<f32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebImage {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub score: Option<f32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntityAnnotation {
    #[serde(default)]
    pub mid: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub score: Option<f32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Status {
    #[serde(default)]
    pub code: Option<i32>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Deserialize a list that may be null or hold null entries.
fn nullable_list<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let items: Option<Vec<Option<T>>> = Option::deserialize(deserializer)?;
    Ok(items.unwrap_or_default().into_iter().flatten().collect())
}
