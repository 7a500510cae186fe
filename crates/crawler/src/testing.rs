//! In-memory chain and explorer used by crawl-level tests.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;
use libsonar_core::{
    adapters::{
        AbiOnly, ChainReader, CreatorInfo, ExplorerClient, InternalTransaction, VerifiedSource,
    },
    error::SonarError,
    types::{Address, Bytes, B256},
};

use crate::proxy::EIP1967_IMPLEMENTATION_SLOT;

pub const CONTRACT_CODE: [u8; 4] = [0x60, 0x80, 0x60, 0x40];

#[derive(Default)]
pub struct FakeChain {
    code: HashMap<Address, Bytes>,
    storage: HashMap<(Address, B256), B256>,
    broken: Vec<Address>,
    pub bytecode_calls: AtomicUsize,
}

impl FakeChain {
    pub fn contract(mut self, address: Address) -> Self {
        self.code.insert(address, Bytes::from_static(&CONTRACT_CODE));
        self
    }

    pub fn eip1967_proxy(mut self, proxy: Address, implementation: Address) -> Self {
        self.code.insert(proxy, Bytes::from_static(&CONTRACT_CODE));
        self.storage.insert(
            (proxy, EIP1967_IMPLEMENTATION_SLOT),
            implementation.into_word(),
        );
        self
    }

    /// Bytecode reads for `address` fail.
    pub fn broken(mut self, address: Address) -> Self {
        self.broken.push(address);
        self
    }
}

#[async_trait]
impl ChainReader for FakeChain {
    async fn get_bytecode(&self, address: Address) -> Result<Bytes, SonarError> {
        self.bytecode_calls.fetch_add(1, Ordering::SeqCst);
        if self.broken.contains(&address) {
            return Err(SonarError::Provider("connection reset".to_string()));
        }
        Ok(self.code.get(&address).cloned().unwrap_or_default())
    }

    async fn read_storage_slot(&self, address: Address, slot: B256) -> Result<B256, SonarError> {
        Ok(self
            .storage
            .get(&(address, slot))
            .copied()
            .unwrap_or_default())
    }
}

#[derive(Default)]
pub struct FakeExplorer {
    sources: HashMap<Address, VerifiedSource>,
    creators: HashMap<Address, CreatorInfo>,
    internal: HashMap<Address, Vec<InternalTransaction>>,
    pub calls: Mutex<Vec<(&'static str, Address)>>,
}

impl FakeExplorer {
    pub fn verified(mut self, address: Address, name: &str, source: &str) -> Self {
        self.sources.insert(
            address,
            VerifiedSource {
                has_source: true,
                raw_source: source.to_string(),
                abi_raw: Some("[]".to_string()),
                contract_name: Some(name.to_string()),
                ..Default::default()
            },
        );
        self
    }

    pub fn creator(mut self, address: Address, creator: Address) -> Self {
        self.creators.insert(
            address,
            CreatorInfo {
                creator,
                creation_tx: format!("0x{:064x}", self.creators.len() + 1),
            },
        );
        self
    }

    pub fn calls_to(mut self, caller: Address, callees: &[Address]) -> Self {
        self.internal.entry(caller).or_default().extend(callees.iter().map(|to| {
            InternalTransaction {
                from: caller,
                to: Some(*to),
                kind: "call".to_string(),
                contract_address: None,
            }
        }));
        self
    }

    pub fn count(&self, method: &str, address: Address) -> usize {
        self.calls
            .lock()
            .map(|calls| calls.iter().filter(|c| c.0 == method && c.1 == address).count())
            .unwrap_or_default()
    }

    fn record(&self, method: &'static str, address: Address) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((method, address));
        }
    }
}

#[async_trait]
impl ExplorerClient for FakeExplorer {
    async fn get_verified_source(&self, address: Address) -> Result<VerifiedSource, SonarError> {
        self.record("source", address);
        Ok(self.sources.get(&address).cloned().unwrap_or_default())
    }

    async fn get_abi_only(&self, address: Address) -> Result<AbiOnly, SonarError> {
        self.record("abi", address);
        Ok(AbiOnly::default())
    }

    async fn get_creator(&self, address: Address) -> Result<Option<CreatorInfo>, SonarError> {
        self.record("creator", address);
        Ok(self.creators.get(&address).cloned())
    }

    async fn get_internal_transactions(
        &self,
        address: Address,
        _page: u64,
        page_size: u64,
    ) -> Result<Vec<InternalTransaction>, SonarError> {
        self.record("internal", address);
        let txs = self.internal.get(&address).cloned().unwrap_or_default();
        Ok(txs.into_iter().take(page_size as usize).collect())
    }
}
