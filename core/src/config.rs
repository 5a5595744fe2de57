//! Platform endpoint configuration.
//!
//! The hosted platform is addressed by a project URL and a publishable
//! (anonymous) API key; both travel with every request. Values come either
//! from the embedding application or from the environment.

use std::env;

use crate::error::AccessError;

/// Environment variable holding the platform project URL.
pub const ENV_PLATFORM_URL: &str = "TODO_PLATFORM_URL";
/// Environment variable holding the publishable API key.
pub const ENV_PLATFORM_KEY: &str = "TODO_PLATFORM_KEY";

/// Connection settings for the hosted platform.
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    pub base_url: String,
    pub anon_key: String,
}

impl PlatformConfig {
    pub fn new(base_url: &str, anon_key: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        }
    }

    /// Read the configuration from `TODO_PLATFORM_URL` and
    /// `TODO_PLATFORM_KEY`.
    pub fn from_env() -> Result<Self, AccessError> {
        let base_url = env::var(ENV_PLATFORM_URL)
            .map_err(|_| AccessError::Config(ENV_PLATFORM_URL.to_string()))?;
        let anon_key = env::var(ENV_PLATFORM_KEY)
            .map_err(|_| AccessError::Config(ENV_PLATFORM_KEY.to_string()))?;
        Ok(Self::new(&base_url, &anon_key))
    }
}
