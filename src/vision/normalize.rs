//! Reduction of a raw annotation response into the stable result shape.

use serde::Serialize;

use super::AnnotateImageResponse;

/// Name reported when neither web entities nor labels are available
pub const UNKNOWN_NAME: &str = "Unknown Pin";

/// Entries kept per output list
const MAX_ITEMS: usize = 5;

/// Normalized identification result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedResult {
    pub suggested_urls: Vec<String>,
    pub identified_name: String,
    pub labels: Vec<String>,
    pub web_entities: Vec<String>,
}

/// Normalize a raw response. Deterministic and side-effect free.
pub fn normalize(raw: &AnnotateImageResponse) -> NormalizedResult {
    let (web_entities, similar_urls): (Vec<String>, Vec<String>) = match &raw.web_detection {
        Some(web) => (
            web.web_entities
                .iter()
                .filter_map(|e| e.description.clone())
                .collect(),
            web.visually_similar_images
                .iter()
                .filter_map(|img| img.url.clone())
                .collect(),
        ),
        None => (Vec::new(), Vec::new()),
    };

    let labels: Vec<String> = raw
        .label_annotations
        .iter()
        .filter_map(|l| l.description.clone())
        .collect();

    // Web entities tend to be more specific than labels
    let identified_name = first_non_empty(&web_entities)
        .or_else(|| labels.first().map(String::as_str))
        .unwrap_or(UNKNOWN_NAME)
        .to_string();

    NormalizedResult {
        suggested_urls: head(similar_urls),
        identified_name,
        labels: head(labels),
        web_entities: head(web_entities),
    }
}

fn first_non_empty(items: &[String]) -> Option<&str> {
    items.iter().map(String::as_str).find(|s| !s.is_empty())
}

fn head(mut items: Vec<String>) -> Vec<String> {
    items.truncate(MAX_ITEMS);
    items
}
