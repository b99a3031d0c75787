use serde::Serialize;
use thiserror::Error;

/// Main error type for pin-vision operations
#[derive(Error, Debug)]
pub enum PinVisionError {
    #[error("Malformed private key: {0}")]
    MalformedKey(String),

    #[error("Failed to sign assertion: {0}")]
    Signing(String),

    #[error("Google Auth Error: {}", status_and_body(.status, .body))]
    AuthExchange { status: Option<u16>, body: String },

    #[error("Vision API call failed: {}", status_and_body(.status, .body))]
    AnnotationCall { status: Option<u16>, body: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid credentials: {0}")]
    Credentials(String),
}

fn status_and_body(status: &Option<u16>, body: &str) -> String {
    match status {
        Some(code) => format!("{} {}", code, body),
        None => body.to_string(),
    }
}

/// Coarse failure class used by hosts to pick a response status or exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    /// The caller sent something unusable
    InvalidInput,
    /// Credentials or key material are broken
    Configuration,
    /// The token endpoint or the Vision API failed
    Upstream,
}

impl PinVisionError {
    /// Classify the error
    pub fn category(&self) -> FailureCategory {
        match self {
            PinVisionError::InvalidInput(_) => FailureCategory::InvalidInput,
            PinVisionError::MalformedKey(_)
            | PinVisionError::Signing(_)
            | PinVisionError::Credentials(_) => FailureCategory::Configuration,
            PinVisionError::AuthExchange { .. } | PinVisionError::AnnotationCall { .. } => {
                FailureCategory::Upstream
            }
        }
    }

    /// Convert error to an HTTP status for transport hosts
    pub fn http_status(&self) -> u16 {
        match self.category() {
            FailureCategory::InvalidInput => 400,
            FailureCategory::Configuration => 500,
            FailureCategory::Upstream => 502,
        }
    }

    /// Upstream HTTP status, if the failure came from a response
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            PinVisionError::AuthExchange { status, .. }
            | PinVisionError::AnnotationCall { status, .. } => *status,
            _ => None,
        }
    }
}

/// JSON error object surfaced to callers: `{"error": "..."}`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

impl From<&PinVisionError> for ErrorBody {
    fn from(err: &PinVisionError) -> Self {
        Self {
            error: err.to_string(),
        }
    }
}

/// Result type alias for pin-vision operations
pub type Result<T> = std::result::Result<T, PinVisionError>;
