use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use libsonar_core::error::SonarError;
use libsonar_utils::rate_limit::RateLimit;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::config::ExplorerConfig;

/// The envelope every Etherscan-style endpoint answers with.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub result: Value,
}

impl Envelope {
    pub fn is_ok(&self) -> bool {
        self.status == "1"
    }

    /// The `result` as text when the explorer answered with a message instead
    /// of data, e.g. `"Contract source code not verified"`.
    pub fn result_text(&self) -> &str {
        self.result.as_str().unwrap_or_default()
    }

    pub fn describe(&self) -> String {
        format!("{} ({})", self.message, self.result_text())
    }
}

/// Fetch data from the block explorer (e.g., Etherscan).
/// Fetcher is cloneable, but the rate limit and key rotation are shared among clones.
#[derive(Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    api_url: String,
    chain_id: u64,
    api_keys: Arc<Vec<String>>,
    next_key: Arc<AtomicUsize>,
    pub rate_limit: Arc<RwLock<RateLimit>>,
}

impl Fetcher {
    pub fn new(cfg: &ExplorerConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: cfg.api_url.clone(),
            chain_id: cfg.chain_id,
            api_keys: Arc::new(cfg.api_keys.clone()),
            next_key: Arc::new(AtomicUsize::new(0)),
            rate_limit: Arc::new(RwLock::new(cfg.get_rate_limit())),
        }
    }

    fn api_key(&self) -> Option<&str> {
        if self.api_keys.is_empty() {
            return None;
        }
        let idx = self.next_key.fetch_add(1, Ordering::Relaxed) % self.api_keys.len();
        Some(self.api_keys[idx].as_str())
    }

    pub async fn get(&self, params: &[(&str, String)]) -> Result<Envelope, SonarError> {
        self.rate_limit
            .write()
            .await
            .wait_and_increment_async()
            .await;

        let mut query: Vec<(&str, String)> = vec![("chainid", self.chain_id.to_string())];
        query.extend(params.iter().cloned());
        if let Some(key) = self.api_key() {
            query.push(("apikey", key.to_string()));
        }

        let resp = self
            .client
            .get(&self.api_url)
            .query(&query)
            .send()
            .await
            .map_err(|e| SonarError::Explorer(format!("request failed: {}", e)))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SonarError::Explorer(format!("http status {}", status)));
        }
        resp.json::<Envelope>()
            .await
            .map_err(|e| SonarError::Explorer(format!("malformed response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_keys_rotate() {
        let cfg = ExplorerConfig {
            api_keys: vec!["a".to_string(), "b".to_string()],
            ..Default::default()
        };
        let fetcher = Fetcher::new(&cfg);
        let clone = fetcher.clone();
        assert_eq!(fetcher.api_key(), Some("a"));
        assert_eq!(clone.api_key(), Some("b"));
        assert_eq!(fetcher.api_key(), Some("a"));
    }

    #[test]
    fn test_no_api_key() {
        let fetcher = Fetcher::new(&ExplorerConfig::default());
        assert_eq!(fetcher.api_key(), None);
    }
}
