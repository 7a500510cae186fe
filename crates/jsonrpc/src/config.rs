use libsonar_core::error::SonarError;
use libsonar_utils::config::Config;

use crate::provider::JsonRpcProvider;

#[derive(Debug, Clone, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct JsonRpcConfig {
    pub url: String,
}

impl Default for JsonRpcConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8545".to_string(),
        }
    }
}

impl Config for JsonRpcConfig {
    fn section_name() -> &'static str {
        "jsonrpc"
    }
}

impl JsonRpcConfig {
    pub fn chain_reader(&self) -> Result<JsonRpcProvider, SonarError> {
        JsonRpcProvider::new(self.url.clone())
    }
}
