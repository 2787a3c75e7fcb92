//! Configuration validation
//!
//! Validates configuration values at startup to catch misconfigurations early.

use anyhow::Result;
use axum::http::HeaderValue;
use photodrop_core::Config;

/// Validate configuration before anything is bound or created.
///
/// Runs the field checks from `Config::validate`, then the checks that need
/// HTTP types: every non-wildcard CORS origin must be a valid header value.
pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    let origins = config.cors_origins();
    if origins.iter().any(|o| o == "*") {
        if origins.len() > 1 {
            tracing::warn!("CORS_ORIGINS contains '*' alongside explicit origins; all origins are allowed");
        }
    } else {
        for origin in origins {
            HeaderValue::from_str(origin)
                .map_err(|_| anyhow::anyhow!("Invalid CORS origin: {:?}", origin))?;
        }
    }

    Ok(())
}
