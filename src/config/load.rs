//! Configuration loading from files.
//!
//! The YAML file is layered with `LIGHTSITES__*` environment variables, so
//! `LIGHTSITES__LISTEN_ADDR=127.0.0.1:9000` overrides `listen_addr`.

use std::path::{Path, PathBuf};

use super::{ConfigError, DEFAULT_CONFIG_FILE, SiteConfig};

const ENV_PREFIX: &str = "LIGHTSITES";

impl SiteConfig {
    /// Load the config from the command line argument, defaulting to `lightsites.yaml`
    pub fn load_from_arg(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let config_file = resolve_config_path(config_file)?;
        Self::load_from_file(&config_file)
    }

    /// Load and validate the config from a file path
    pub(crate) fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let path_str = path
            .as_os_str()
            .to_str()
            .ok_or_else(|| ConfigError::EncodePath(path.to_path_buf()))?;

        let config = config::Config::builder()
            .add_source(config::File::new(path_str, config::FileFormat::Yaml))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize::<SiteConfig>()?;

        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }
}

/// Make a config path absolute, defaulting to `lightsites.yaml` in the cwd.
pub fn resolve_config_path(config_file: Option<&Path>) -> Result<PathBuf, ConfigError> {
    let config_file = config_file.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));
    if config_file.is_relative() {
        Ok(std::env::current_dir()
            .map_err(ConfigError::CwdFailure)?
            .join(config_file))
    } else {
        Ok(config_file.to_path_buf())
    }
}
