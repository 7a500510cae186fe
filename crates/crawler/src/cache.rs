use std::sync::Arc;

use libsonar_core::{
    adapters::ChainReader,
    error::SonarError,
    types::{canonical, Address, Bytes},
};
use libsonar_utils::log::warn;
use moka::sync::Cache;

/// Run-scoped address -> bytecode cache in front of a [`ChainReader`].
///
/// Only successful reads are cached; a failed read is retried the next time
/// the address is asked for.
#[derive(Clone)]
pub struct CodeCache {
    chain: Arc<dyn ChainReader>,
    cache: Cache<Address, Bytes>,
}

impl CodeCache {
    pub fn new(chain: Arc<dyn ChainReader>, capacity: u64) -> Self {
        Self {
            chain,
            cache: Cache::new(capacity),
        }
    }

    pub fn chain(&self) -> &Arc<dyn ChainReader> {
        &self.chain
    }

    pub async fn get_code(&self, address: Address) -> Result<Bytes, SonarError> {
        // check cache first
        if let Some(code) = self.cache.get(&address) {
            return Ok(code);
        }
        let code = self.chain.get_bytecode(address).await?;
        self.cache.insert(address, code.clone());
        Ok(code)
    }

    /// Whether `address` has deployed code. A failed read counts as no code.
    pub async fn is_contract(&self, address: Address) -> bool {
        match self.get_code(address).await {
            Ok(code) => !code.is_empty(),
            Err(err) => {
                warn!(address = canonical(&address), err = ?err, "bytecode lookup failed");
                false
            }
        }
    }
}
