use async_trait::async_trait;
use mockall::automock;

use crate::error::SonarError;
use crate::types::{Address, Bytes, B256};

/// Read-only view of chain state.
///
/// Both methods must tolerate accounts that do not exist: such accounts
/// have empty code and all-zero storage.
#[automock]
#[async_trait]
pub trait ChainReader: Send + Sync {
    async fn get_bytecode(&self, address: Address) -> Result<Bytes, SonarError>;

    async fn read_storage_slot(
        &self,
        address: Address,
        slot: B256,
    ) -> Result<B256, SonarError>;
}
