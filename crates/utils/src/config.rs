use libsonar_core::error::SonarError;
pub use serde::{de::DeserializeOwned, Deserialize, Serialize};

pub static CONFIG_FILE_ENV_VAR: &str = "SONAR_CONFIG";
pub static CONFIG_ENV_PREFIX: &str = "SONAR";
pub static CONFIG_ENV_SEPARATOR: &str = "__";
pub static DEFAULT_CONFIG_FILE: &str = "config.toml";

/// A configuration section.
///
/// Implementors should carry `#[serde(default)]` so that a partially
/// specified section falls back to the defaults field by field.
pub trait Config: DeserializeOwned + Serialize + Default {
    fn section_name() -> &'static str;

    fn load() -> Result<Self, SonarError> {
        ConfigLoader::load_cfg(Self::section_name())
    }

    fn load_or_default() -> Result<Self, SonarError> {
        ConfigLoader::load_cfg_or_default(Self::section_name(), Self::default())
    }

    fn must_load_or_default() -> Self {
        Self::load_or_default().unwrap_or_else(|e| {
            panic!("failed to load config section {}: {}", Self::section_name(), e)
        })
    }
}

pub struct ConfigLoader {}

impl ConfigLoader {
    fn config_file() -> String {
        std::env::var(CONFIG_FILE_ENV_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string())
    }

    fn build(config_file: &str) -> Result<config::Config, SonarError> {
        config::Config::builder()
            .add_source(config::File::new(config_file, config::FileFormat::Toml).required(false))
            .add_source(
                config::Environment::with_prefix(CONFIG_ENV_PREFIX).separator(CONFIG_ENV_SEPARATOR),
            )
            .build()
            .map_err(|e| SonarError::Config(format!("failed to build config: {}", e)))
    }

    pub fn load_cfg_or_default<T: DeserializeOwned>(
        section: &str,
        default: T,
    ) -> Result<T, SonarError> {
        Self::load_from_file_or_default(&Self::config_file(), section, default)
    }

    pub fn load_cfg<T: DeserializeOwned>(section: &str) -> Result<T, SonarError> {
        let cfg = Self::build(&Self::config_file())?;
        cfg.get(section)
            .map_err(|e| SonarError::Config(format!("{}", e)))
    }

    pub fn load_from_file_or_default<T: DeserializeOwned>(
        config_file: &str,
        section: &str,
        default: T,
    ) -> Result<T, SonarError> {
        let cfg = Self::build(config_file)?;
        cfg.get(section).or_else(|e| match e {
            config::ConfigError::NotFound(_) => Ok(default),
            _ => Err(SonarError::Config(format!("{}", e))),
        })
    }
}
