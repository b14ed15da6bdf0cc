//! Core configuration
//!
//! # Environment variables
//!
//! All settings can be overridden through environment variables:
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | BAAS_URL | http://localhost:54321/rest/v1 | Hosted database REST endpoint |
//! | BAAS_API_KEY | (empty) | API key sent with every request |
//! | REQUEST_TIMEOUT_MS | 30000 | HTTP request timeout (milliseconds) |
//! | TAX_RATE | 0.085 | Sales tax rate applied to order subtotals |

/// Runtime configuration for the ordering core
#[derive(Debug, Clone)]
pub struct Config {
    /// Hosted database REST endpoint (PostgREST-style)
    pub baas_url: String,
    /// API key for the hosted database
    pub api_key: String,
    /// HTTP request timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Sales tax rate applied to order subtotals
    pub tax_rate: f64,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Unset variables fall back to defaults. A `.env` file is honored when
    /// present.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self {
            baas_url: std::env::var("BAAS_URL")
                .unwrap_or_else(|_| "http://localhost:54321/rest/v1".into()),
            api_key: std::env::var("BAAS_API_KEY").unwrap_or_default(),
            request_timeout_ms: std::env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30000),
            tax_rate: std::env::var("TAX_RATE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0.085),
        }
    }

    /// Override endpoint and key, keeping everything else from the
    /// environment
    ///
    /// Commonly used in tests.
    pub fn with_overrides(baas_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let mut config = Self::from_env();
        config.baas_url = baas_url.into();
        config.api_key = api_key.into();
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::with_overrides("http://test:1234/rest/v1", "key");
        assert_eq!(config.baas_url, "http://test:1234/rest/v1");
        assert_eq!(config.api_key, "key");
        assert!(config.tax_rate > 0.0);
        assert!(config.request_timeout_ms > 0);
    }
}
