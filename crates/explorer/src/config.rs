use libsonar_utils::{config::Config, rate_limit::RateLimit};

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct ExplorerConfig {
    /// Etherscan-compatible API endpoint
    pub api_url: String,
    pub chain_id: u64,
    pub api_keys: Vec<String>,
    pub requests_per_second: Option<f32>,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.etherscan.io/v2/api".to_string(),
            chain_id: 1,
            api_keys: vec![],
            requests_per_second: Some(5.0),
        }
    }
}

impl Config for ExplorerConfig {
    fn section_name() -> &'static str {
        "explorer"
    }
}

impl ExplorerConfig {
    pub fn get_rate_limit(&self) -> RateLimit {
        RateLimit::from_requests_per_second(self.requests_per_second)
    }
}
