//! pin-vision command line entry point

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use pin_vision::config::Config;
use pin_vision::pipeline::PinIdentifier;
use pin_vision::{ErrorBody, FailureCategory, PinVisionError};

/// Print usage information
fn print_usage() {
    eprintln!("Usage: pin-vision <config.yaml> <image>");
    eprintln!();
    eprintln!("pin-vision - Identify a pin image with Google Cloud Vision");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  config.yaml    Path to configuration file");
    eprintln!("  image          Image file, or - to read a base64 payload from stdin");
    eprintln!();
    eprintln!("Example:");
    eprintln!("  pin-vision /etc/pin-vision/config.yaml pin.jpg");
}

fn exit_code(err: &PinVisionError) -> ExitCode {
    match err.category() {
        FailureCategory::InvalidInput => ExitCode::from(2),
        FailureCategory::Configuration => ExitCode::from(3),
        FailureCategory::Upstream => ExitCode::from(4),
    }
}

/// Print the JSON error object on stdout, where a caller expects the result
fn report(err: &PinVisionError) -> ExitCode {
    error!("Identification failed: {}", err);
    match serde_json::to_string(&ErrorBody::from(err)) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to encode error: {}", e),
    }
    exit_code(err)
}

/// Read the image argument as a base64 payload
fn read_image(arg: &str) -> Result<String, PinVisionError> {
    if arg == "-" {
        let mut payload = String::new();
        std::io::stdin()
            .read_to_string(&mut payload)
            .map_err(|e| PinVisionError::InvalidInput(format!("failed to read stdin: {}", e)))?;
        return Ok(payload.trim().to_string());
    }

    let bytes = std::fs::read(arg)
        .map_err(|e| PinVisionError::InvalidInput(format!("failed to read {}: {}", arg, e)))?;
    Ok(STANDARD.encode(bytes))
}

#[tokio::main]
async fn main() -> ExitCode {
    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 {
        print_usage();
        return ExitCode::from(1);
    }

    let config_path = PathBuf::from(&args[1]);

    // Load configuration
    let config = match Config::from_file(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            return ExitCode::from(1);
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration error: {}", e);
        return ExitCode::from(1);
    }

    // Initialize logging on stderr; stdout carries the JSON result
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("Loaded configuration from {:?}", config_path);

    let identifier = match PinIdentifier::from_config(&config) {
        Ok(identifier) => identifier,
        Err(e) => {
            error!("Failed to set up Vision client: {}", e);
            let body = ErrorBody {
                error: format!("Server configuration error: {}", e),
            };
            if let Ok(json) = serde_json::to_string(&body) {
                println!("{}", json);
            }
            return ExitCode::from(3);
        }
    };

    let image = match read_image(&args[2]) {
        Ok(image) => image,
        Err(e) => return report(&e),
    };

    match identifier.identify(&image).await {
        Ok(result) => match serde_json::to_string(&result) {
            Ok(json) => {
                println!("{}", json);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Failed to encode result: {}", e);
                ExitCode::FAILURE
            }
        },
        Err(e) => report(&e),
    }
}
