use libsonar_utils::config::Config;

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// hard cap on visited + pending addresses
    pub max_contracts: usize,
    pub max_addresses_per_file: usize,
    pub max_declared_impls_per_file: usize,
    pub internal_tx_page_size: u64,
    pub max_created_contracts: usize,
    pub max_runtime_callees: usize,
    pub bytecode_cache_size: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_contracts: 100,
            max_addresses_per_file: 50,
            max_declared_impls_per_file: 20,
            internal_tx_page_size: 100,
            max_created_contracts: 50,
            max_runtime_callees: 50,
            bytecode_cache_size: 1000,
        }
    }
}

impl Config for CrawlerConfig {
    fn section_name() -> &'static str {
        "crawler"
    }
}
