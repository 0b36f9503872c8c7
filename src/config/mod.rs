//! Configuration loading and types for lightsites.
//!
//! This module handles all aspects of configuration:
//! - Type definitions for config structures (`types`)
//! - Loading configs from files and the environment (`load`)

mod load;
mod types;

pub use types::{MarkdownConfig, RoutingConfig, SiteConfig, WatchConfig};

#[cfg(test)]
pub use types::TagRules;

/// Default config file name, looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "lightsites.yaml";

// =============================================================================
// Errors
// =============================================================================

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to encode config file path as a unicode string: {0}")]
    EncodePath(std::path::PathBuf),

    #[error("failed to deserialize config: {0}")]
    Deserialize(#[from] config::ConfigError),

    #[error("failed to get current working directory: {0}")]
    CwdFailure(std::io::Error),

    #[error("invalid config: {0}")]
    Validation(String),
}

// =============================================================================
// Validation
// =============================================================================

impl SiteConfig {
    /// Check the invariants the server and the transformation rely on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, prefix) in [
            ("routing.route_prefix", &self.routing.route_prefix),
            ("routing.assets_prefix", &self.routing.assets_prefix),
        ] {
            if !prefix.starts_with('/') || !prefix.ends_with('/') {
                return Err(ConfigError::Validation(format!(
                    "'{field}' must start and end with '/', got '{prefix}'"
                )));
            }
        }

        // Assets are mounted as a nested service, which cannot sit at the root
        if self.routing.assets_prefix == "/" {
            return Err(ConfigError::Validation(
                "'routing.assets_prefix' must not be '/'".to_string(),
            ));
        }

        if self.routing.route_prefix == self.routing.assets_prefix {
            return Err(ConfigError::Validation(
                "'routing.route_prefix' and 'routing.assets_prefix' must differ".to_string(),
            ));
        }

        if self.refresh_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "'refresh_interval_secs' must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
