use std::str::FromStr;

use libsonar_core::error::SonarError;
use libsonar_utils::config::Config;
use sea_orm::ConnectOptions;

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct StoreConfig {
    pub database_url: String,
    pub database_log_level: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://sonar.db?mode=rwc".to_string(),
            database_log_level: "info".to_string(),
        }
    }
}

impl Config for StoreConfig {
    fn section_name() -> &'static str {
        "store"
    }
}

impl StoreConfig {
    pub async fn get_database_connection(
        &self,
    ) -> Result<sea_orm::DatabaseConnection, SonarError> {
        let level = log::LevelFilter::from_str(&self.database_log_level).map_err(|e| {
            SonarError::Config(format!(
                "invalid database log level {}: {}",
                self.database_log_level, e
            ))
        })?;
        let mut opt = ConnectOptions::new(self.database_url.to_owned());
        opt.sqlx_logging(false) // Disable SQLx log
            .sqlx_logging_level(level); // Set SQLx log level

        sea_orm::Database::connect(opt)
            .await
            .map_err(|e| SonarError::Persistence(format!("{}", e)))
    }
}
