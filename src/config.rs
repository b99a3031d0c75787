//! Configuration parsing and structures

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::auth::{ServiceAccountProviderConfig, CLOUD_VISION_SCOPE};
use crate::credentials::ServiceAccountCredential;
use crate::env::substitute_env_vars;
use crate::error::PinVisionError;
use crate::vision::{DEFAULT_LABEL_MAX_RESULTS, DEFAULT_VISION_ENDPOINT, DEFAULT_WEB_MAX_RESULTS};

/// Environment variable the credential document is read from by default
pub const DEFAULT_CREDENTIALS_ENV: &str = "GOOGLE_VISION_API_CREDENTIALS";

// =============================================================================
// Raw Config (Deserialized from YAML)
// =============================================================================

/// Raw configuration as deserialized from YAML.
/// This is converted to `Config` via `resolve()`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfig {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Credential source; at most one key may be set
    #[serde(default)]
    pub credentials: RawCredentialsConfig,

    /// Vision API settings
    #[serde(default)]
    pub vision: VisionConfig,

    /// Token minting settings
    #[serde(default)]
    pub auth: AuthConfig,

    /// Outbound HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,
}

/// Credential source section before resolution
#[derive(Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawCredentialsConfig {
    /// Path to a JSON key file
    pub path: Option<PathBuf>,
    /// Name of an environment variable holding the JSON document
    pub env: Option<String>,
    /// The JSON document itself
    pub inline: Option<String>,
}

impl std::fmt::Debug for RawCredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawCredentialsConfig")
            .field("path", &self.path)
            .field("env", &self.env)
            .field("inline", &self.inline.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

// =============================================================================
// Resolved Config (Ready for use)
// =============================================================================

/// Top-level configuration (resolved from RawConfig)
#[derive(Debug, Clone)]
pub struct Config {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// Where the service account document comes from
    pub credentials: CredentialsSource,

    /// Vision API settings
    pub vision: VisionConfig,

    /// Token minting settings
    pub auth: AuthConfig,

    /// Outbound HTTP client settings
    pub http: HttpConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Source of the service account credential document
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialsSource {
    /// Path to a JSON key file
    Path(PathBuf),
    /// Name of an environment variable holding the JSON document
    Env(String),
    /// The JSON document itself
    Inline(String),
}

impl Default for CredentialsSource {
    fn default() -> Self {
        CredentialsSource::Env(DEFAULT_CREDENTIALS_ENV.to_string())
    }
}

impl std::fmt::Debug for CredentialsSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialsSource::Path(path) => f.debug_tuple("Path").field(path).finish(),
            CredentialsSource::Env(var) => f.debug_tuple("Env").field(var).finish(),
            CredentialsSource::Inline(_) => f.debug_tuple("Inline").field(&"<redacted>").finish(),
        }
    }
}

impl CredentialsSource {
    /// Load and parse the credential document.
    pub fn load(&self) -> Result<ServiceAccountCredential, PinVisionError> {
        match self {
            CredentialsSource::Path(path) => ServiceAccountCredential::from_file(path),
            CredentialsSource::Env(var) => {
                let json = std::env::var(var).map_err(|_| {
                    PinVisionError::Credentials(format!(
                        "credentials secret not found in environment variable {}",
                        var
                    ))
                })?;
                ServiceAccountCredential::from_json(&json)
            }
            CredentialsSource::Inline(json) => ServiceAccountCredential::from_json(json),
        }
    }
}

/// Vision API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct VisionConfig {
    /// Batch-annotate endpoint
    #[serde(default = "default_vision_endpoint")]
    pub endpoint: String,

    /// Cap on web detection results
    #[serde(default = "default_web_max_results")]
    pub web_max_results: u32,

    /// Cap on label detection results
    #[serde(default = "default_label_max_results")]
    pub label_max_results: u32,
}

fn default_vision_endpoint() -> String {
    DEFAULT_VISION_ENDPOINT.to_string()
}

fn default_web_max_results() -> u32 {
    DEFAULT_WEB_MAX_RESULTS
}

fn default_label_max_results() -> u32 {
    DEFAULT_LABEL_MAX_RESULTS
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            endpoint: default_vision_endpoint(),
            web_max_results: default_web_max_results(),
            label_max_results: default_label_max_results(),
        }
    }
}

/// Token minting configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// OAuth scope requested in assertions
    #[serde(default = "default_scope")]
    pub scope: String,

    /// Reuse access tokens until shortly before expiry
    #[serde(default = "default_cache_tokens")]
    pub cache_tokens: bool,
}

fn default_scope() -> String {
    CLOUD_VISION_SCOPE.to_string()
}

fn default_cache_tokens() -> bool {
    true
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            scope: default_scope(),
            cache_tokens: default_cache_tokens(),
        }
    }
}

impl From<&AuthConfig> for ServiceAccountProviderConfig {
    fn from(auth: &AuthConfig) -> Self {
        Self {
            scope: auth.scope.clone(),
            cache_tokens: auth.cache_tokens,
        }
    }
}

/// Outbound HTTP configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HttpConfig {
    /// Whole-request timeout (e.g., "30s"); none by default
    #[serde(default)]
    #[serde(with = "humantime_serde")]
    pub timeout: Option<Duration>,
}

impl HttpConfig {
    /// Build the shared HTTP client
    pub fn build_client(&self) -> Result<reqwest::Client, ConfigError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        builder.build().map_err(|e| {
            ConfigError::ValidationError(format!("Failed to build HTTP client: {}", e))
        })
    }
}

// =============================================================================
// Resolution Logic
// =============================================================================

impl RawConfig {
    /// Resolve raw config into final config
    pub fn resolve(self) -> Result<Config, ConfigError> {
        let RawConfig {
            logging,
            credentials,
            vision,
            auth,
            http,
        } = self;

        Ok(Config {
            logging,
            credentials: Self::resolve_credentials(credentials)?,
            vision,
            auth,
            http,
        })
    }

    fn resolve_credentials(raw: RawCredentialsConfig) -> Result<CredentialsSource, ConfigError> {
        match (raw.path, raw.env, raw.inline) {
            (None, None, None) => Ok(CredentialsSource::default()),
            (Some(path), None, None) => Ok(CredentialsSource::Path(path)),
            (None, Some(var), None) => Ok(CredentialsSource::Env(var)),
            (None, None, Some(json)) => Ok(CredentialsSource::Inline(json)),
            _ => Err(ConfigError::ValidationError(
                "credentials: specify only one of path, env or inline".to_string(),
            )),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            credentials: CredentialsSource::default(),
            vision: VisionConfig::default(),
            auth: AuthConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.clone(), e.to_string()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a YAML string, substituting `${VAR}` references
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let content = substitute_env_vars(content)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let raw: RawConfig =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        raw.resolve()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoint = &self.vision.endpoint;
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ConfigError::ValidationError(format!(
                "vision.endpoint must be an http(s) URL, got {:?}",
                endpoint
            )));
        }

        if self.vision.web_max_results == 0 || self.vision.label_max_results == 0 {
            return Err(ConfigError::ValidationError(
                "vision max results must be at least 1".to_string(),
            ));
        }

        if self.auth.scope.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "auth.scope cannot be empty".to_string(),
            ));
        }

        match &self.credentials {
            CredentialsSource::Path(path) if path.as_os_str().is_empty() => {
                Err(ConfigError::ValidationError(
                    "credentials.path cannot be empty".to_string(),
                ))
            }
            CredentialsSource::Env(var) if var.is_empty() => Err(ConfigError::ValidationError(
                "credentials.env cannot be empty".to_string(),
            )),
            CredentialsSource::Inline(json) if json.trim().is_empty() => Err(
                ConfigError::ValidationError("credentials.inline cannot be empty".to_string()),
            ),
            _ => Ok(()),
        }
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    ReadError(PathBuf, String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Configuration validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
logging:
  level: debug

credentials:
  path: /etc/pin-vision/sa.json

vision:
  endpoint: "http://localhost:8080/v1/images:annotate"
  web_max_results: 20
  label_max_results: 3

auth:
  scope: https://www.googleapis.com/auth/cloud-platform
  cache_tokens: false

http:
  timeout: 30s
"#;

        let config = Config::from_str(yaml).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(
            config.credentials,
            CredentialsSource::Path(PathBuf::from("/etc/pin-vision/sa.json"))
        );
        assert_eq!(config.vision.endpoint, "http://localhost:8080/v1/images:annotate");
        assert_eq!(config.vision.web_max_results, 20);
        assert_eq!(config.vision.label_max_results, 3);
        assert_eq!(config.auth.scope, "https://www.googleapis.com/auth/cloud-platform");
        assert!(!config.auth.cache_tokens);
        assert_eq!(config.http.timeout, Some(Duration::from_secs(30)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_str("logging:\n  level: warn\n").unwrap();
        assert_eq!(
            config.credentials,
            CredentialsSource::Env(DEFAULT_CREDENTIALS_ENV.to_string())
        );
        assert_eq!(config.vision.endpoint, DEFAULT_VISION_ENDPOINT);
        assert_eq!(config.vision.web_max_results, 10);
        assert_eq!(config.vision.label_max_results, 5);
        assert_eq!(config.auth.scope, CLOUD_VISION_SCOPE);
        assert!(config.auth.cache_tokens);
        assert!(config.http.timeout.is_none());
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_substitution() {
        std::env::set_var("PIN_VISION_TEST_ENDPOINT", "http://mock:9000/annotate");
        let yaml = "vision:\n  endpoint: ${PIN_VISION_TEST_ENDPOINT}\n";
        let config = Config::from_str(yaml).unwrap();
        assert_eq!(config.vision.endpoint, "http://mock:9000/annotate");
        std::env::remove_var("PIN_VISION_TEST_ENDPOINT");
    }

    #[test]
    fn test_missing_env_var_fails() {
        let err = Config::from_str("vision:\n  endpoint: ${PIN_VISION_MISSING_12345}\n")
            .unwrap_err();
        assert!(err.to_string().contains("PIN_VISION_MISSING_12345"));
    }

    #[test]
    fn test_credentials_env_source() {
        let config = Config::from_str("credentials:\n  env: MY_SA_JSON\n").unwrap();
        assert_eq!(
            config.credentials,
            CredentialsSource::Env("MY_SA_JSON".to_string())
        );
    }

    #[test]
    fn test_conflicting_credentials_sources_fail() {
        let yaml = "credentials:\n  env: MY_SA_JSON\n  path: /tmp/sa.json\n";
        let err = Config::from_str(yaml).unwrap_err();
        assert!(err.to_string().contains("only one of"));
    }

    #[test]
    fn test_unknown_credentials_source_fails() {
        assert!(Config::from_str("credentials:\n  vault: secret/sa\n").is_err());
    }

    #[test]
    fn test_validate_rejects_bad_endpoint() {
        let mut config = Config::default();
        config.vision.endpoint = "vision.googleapis.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_max_results() {
        let mut config = Config::default();
        config.vision.label_max_results = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_scope() {
        let mut config = Config::default();
        config.auth.scope = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_env_credentials() {
        let source = CredentialsSource::Env("PIN_VISION_NO_SUCH_CREDS_12345".to_string());
        let err = source.load().unwrap_err();
        assert!(matches!(err, PinVisionError::Credentials(_)));
        assert!(err.to_string().contains("PIN_VISION_NO_SUCH_CREDS_12345"));
    }

    #[test]
    fn test_inline_credentials_redacted_in_debug() {
        let source = CredentialsSource::Inline(r#"{"private_key": "secret"}"#.to_string());
        assert!(!format!("{:?}", source).contains("secret"));
    }

    #[test]
    fn test_raw_inline_credentials_redacted_in_debug() {
        let yaml = r#"
credentials:
  inline: '{"client_email": "a@b.c", "private_key": "secret-key-body"}'
"#;
        let raw: RawConfig = serde_yaml::from_str(yaml).unwrap();
        let debug = format!("{:?}", raw);
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("secret-key-body"));
    }

    #[test]
    fn test_load_inline_credentials() {
        let source = CredentialsSource::Inline(
            r#"{"client_email": "a@b.c", "private_key": "k"}"#.to_string(),
        );
        assert_eq!(source.load().unwrap().client_email, "a@b.c");
    }
}
