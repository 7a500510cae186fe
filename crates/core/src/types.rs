use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use alloy_primitives::{address, b256, hex, Address, Bytes, B256};

/// Render an address in its canonical, lowercase `0x`-prefixed form.
/// Every identifier derived from an address goes through here.
pub fn canonical(address: &Address) -> String {
    format!("0x{}", hex::encode(address.as_slice()))
}

/// Why an address was put on the frontier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscoveryReason {
    Root,
    ProxyImplementation,
    CreatorContract,
    FactoryCreated,
    RuntimeCallee,
    HardcodedAddress,
    SourceDeclaredImpl,
}

impl DiscoveryReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Root => "ROOT",
            Self::ProxyImplementation => "PROXY_IMPLEMENTATION",
            Self::CreatorContract => "CREATOR_CONTRACT",
            Self::FactoryCreated => "FACTORY_CREATED",
            Self::RuntimeCallee => "RUNTIME_CALLEE",
            Self::HardcodedAddress => "HARDCODED_ADDRESS",
            Self::SourceDeclaredImpl => "SOURCE_DECLARED_IMPL",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueItem {
    pub address: Address,
    pub reason: DiscoveryReason,
    pub source_address: Option<Address>,
}

impl QueueItem {
    pub fn root(address: Address) -> Self {
        Self {
            address,
            reason: DiscoveryReason::Root,
            source_address: None,
        }
    }

    pub fn discovered(
        address: Address,
        reason: DiscoveryReason,
        source_address: Address,
    ) -> Self {
        Self {
            address,
            reason,
            source_address: Some(source_address),
        }
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KindOnChain {
    #[default]
    Eoa,
    ContractSimple,
    Proxy,
}

impl KindOnChain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eoa => "EOA",
            Self::ContractSimple => "CONTRACT_SIMPLE",
            Self::Proxy => "PROXY",
        }
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum SourceType {
    Verified,
    Decompiled,
    /// Only an ABI could be found; no source text.
    AbiOnly,
    #[default]
    None,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Verified => "verified",
            Self::Decompiled => "decompiled",
            Self::AbiOnly => "abiOnly",
            Self::None => "none",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: String,
    pub content: String,
    pub source_type: SourceType,
}

/// Compiler metadata reported by the block explorer alongside verified source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerMetadata {
    pub compiler_version: Option<String>,
    pub optimization: Option<bool>,
    pub runs: Option<u64>,
    pub evm_version: Option<String>,
    pub license: Option<String>,
    pub constructor_args: Option<String>,
    pub swarm_source: Option<String>,
}

/// One record per distinct address visited during a crawl.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzedContract {
    pub address: Address,
    pub kind: KindOnChain,
    pub verified: bool,
    pub source_type: SourceType,
    pub name: Option<String>,
    pub abi: Option<String>,
    pub bytecode: Option<Bytes>,
    pub compiler: CompilerMetadata,

    pub creator: Option<Address>,
    pub creation_tx: Option<String>,

    pub implementation: Option<Address>,
    pub implementations: Vec<Address>,
    pub created_contracts: Vec<Address>,
    pub runtime_callees: Vec<Address>,

    /// free-form evidence, e.g. proxy slot values
    pub tags: BTreeMap<String, String>,

    pub source_files: Vec<SourceFile>,
    pub resolution_error: Option<String>,
    /// decompiler output that was flagged unusable as source
    pub decompiled_payload: Option<String>,
}

impl AnalyzedContract {
    pub fn new(address: Address, kind: KindOnChain) -> Self {
        Self {
            address,
            kind,
            ..Default::default()
        }
    }

    pub fn is_contract(&self) -> bool {
        self.kind != KindOnChain::Eoa
    }

    pub fn tag(&mut self, key: &str, value: impl Into<String>) {
        self.tags.insert(key.to_string(), value.into());
    }

    /// Record an implementation address, keeping `implementations` free of
    /// duplicates. The first one recorded becomes `implementation`.
    pub fn add_implementation(&mut self, implementation: Address) {
        if self.implementation.is_none() {
            self.implementation = Some(implementation);
        }
        if !self.implementations.contains(&implementation) {
            self.implementations.push(implementation);
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TypeKind {
    Interface,
    AbstractContract,
    ContractImpl,
    Library,
}

impl TypeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Interface => "INTERFACE",
            Self::AbstractContract => "ABSTRACT_CONTRACT",
            Self::ContractImpl => "CONTRACT_IMPL",
            Self::Library => "LIBRARY",
        }
    }
}

/// A type definition found in one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedType {
    pub name: String,
    pub kind: TypeKind,
    pub instanciable: bool,
    pub is_root_contract_type: bool,
    pub parents: Vec<String>,
    pub interfaces: Vec<String>,
    pub libraries: Vec<String>,
    pub source_path: String,
}

/// Everything the pattern extractor derived from one contract's source files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzedSource {
    pub files: Vec<SourceFile>,
    pub types: Vec<DetectedType>,
    pub hardcoded_addresses: Vec<Address>,
    pub declared_implementations: Vec<Address>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_is_lowercase() {
        let a = address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");
        assert_eq!(canonical(&a), "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2");
    }

    #[test]
    fn test_address_parsing_ignores_case() {
        let upper: Address =
            "0xC02AAA39B223FE8D0A0E5C4F27EAD9083C756CC2".parse().unwrap();
        let lower: Address =
            "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2".parse().unwrap();
        assert_eq!(upper, lower);
    }

    #[test]
    fn test_add_implementation_dedups() {
        let mut c = AnalyzedContract::new(Address::ZERO, KindOnChain::Proxy);
        let a = Address::repeat_byte(1);
        let b = Address::repeat_byte(2);
        c.add_implementation(a);
        c.add_implementation(b);
        c.add_implementation(a);
        assert_eq!(c.implementation, Some(a));
        assert_eq!(c.implementations, vec![a, b]);
    }
}
