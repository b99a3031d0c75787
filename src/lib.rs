//! pin-vision: identify pin images with the Google Cloud Vision API
//!
//! Authenticates as a Google service account through the OAuth2 JWT-bearer
//! grant, calls Vision's web and label detection, and reduces the response
//! to a small, stable result.
//!
//! # Architecture
//!
//! - **Credentials**: the service account JSON document.
//! - **Auth**: PEM decoding, RS256 assertion signing, the token exchange and
//!   token providers behind the `TokenProvider` trait.
//! - **Vision**: wire types, the annotation client and the normalizer.
//! - **Pipeline**: `PinIdentifier`, which runs one request end to end.
//!
//! # Example
//!
//! ```no_run
//! use pin_vision::config::Config;
//! use pin_vision::pipeline::PinIdentifier;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::from_file(&"config.yaml".into())?;
//! let identifier = PinIdentifier::from_config(&config)?;
//!
//! let result = identifier.identify("iVBORw0KGgo...").await?;
//! println!("{}", result.identified_name);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod credentials;
pub mod env;
pub mod error;
pub mod pipeline;
pub mod vision;

pub use error::{ErrorBody, FailureCategory, PinVisionError, Result};
