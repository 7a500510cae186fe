use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::error::SonarError;
use crate::types::{Address, CompilerMetadata};

/// Verified source as reported by a block explorer.
///
/// `raw_source` is the payload exactly as the explorer returned it; it may be
/// a single file, a flat JSON map of files or a standard JSON input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedSource {
    pub has_source: bool,
    pub raw_source: String,
    pub abi_raw: Option<String>,
    pub contract_name: Option<String>,
    pub compiler: CompilerMetadata,
    pub proxy: bool,
    pub implementation: Option<Address>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiOnly {
    pub has_abi: bool,
    pub abi_raw: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatorInfo {
    pub creator: Address,
    pub creation_tx: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternalTransaction {
    pub from: Address,
    pub to: Option<Address>,
    /// trace type, e.g. `call`, `delegatecall`, `create`, `create2`
    pub kind: String,
    pub contract_address: Option<Address>,
}

impl InternalTransaction {
    pub fn is_create(&self) -> bool {
        self.kind.to_lowercase().starts_with("create")
    }
}

#[automock]
#[async_trait]
pub trait ExplorerClient: Send + Sync {
    async fn get_verified_source(
        &self,
        address: Address,
    ) -> Result<VerifiedSource, SonarError>;

    async fn get_abi_only(&self, address: Address) -> Result<AbiOnly, SonarError>;

    async fn get_creator(
        &self,
        address: Address,
    ) -> Result<Option<CreatorInfo>, SonarError>;

    async fn get_internal_transactions(
        &self,
        address: Address,
        page: u64,
        page_size: u64,
    ) -> Result<Vec<InternalTransaction>, SonarError>;
}
