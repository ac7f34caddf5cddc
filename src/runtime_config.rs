//! # Runtime Configuration Module
//!
//! Environment-driven settings that change how the dispatcher behaves at
//! runtime, as opposed to what the contract declares.
//!
//! ## Environment Variables
//!
//! ### `STRUT_ENV`
//!
//! Deployment environment name. Default: `development`.
//!
//! In `production`, validation failures are answered with a bare `400`;
//! anywhere else the response body also lists each failed check.
//!
//! ### `STRUT_EXPOSE_VALIDATION_ERRORS`
//!
//! `true`/`false` override for the above, regardless of `STRUT_ENV`.
//!
//! ## Usage
//!
//! ```rust
//! use strutrouter::runtime_config::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_env();
//! println!("Environment: {}", config.environment);
//! ```

use std::env;

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub environment: String,
    /// Whether 400 responses carry the individual validation failures.
    pub expose_validation_errors: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            expose_validation_errors: true,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_vars(
            env::var("STRUT_ENV").ok(),
            env::var("STRUT_EXPOSE_VALIDATION_ERRORS").ok(),
        )
    }

    fn from_vars(environment: Option<String>, expose: Option<String>) -> Self {
        let environment = environment
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| "development".to_string());
        let expose_validation_errors = match expose.as_deref().map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("true") || v == "1" => true,
            Some(v) if v.eq_ignore_ascii_case("false") || v == "0" => false,
            _ => environment != "production",
        };
        RuntimeConfig {
            environment,
            expose_validation_errors,
        }
    }

    #[must_use]
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
