use std::sync::Arc;

use libsonar_core::{
    adapters::{Decompiler, ExplorerClient, VerifiedSource},
    types::{
        canonical, Address, AnalyzedContract, DiscoveryReason, KindOnChain, QueueItem,
        SourceFile, SourceType,
    },
};
use libsonar_utils::log::{debug, warn};

use crate::payload::normalize_sources;

/// Resolves source for a probed contract through an ordered fallback chain:
/// own verified source, the implementation's verified source (proxies only),
/// ABI only, decompilation. The first stage that yields something wins.
pub struct SourceResolver {
    explorer: Arc<dyn ExplorerClient>,
    decompiler: Arc<dyn Decompiler>,
}

impl SourceResolver {
    pub fn new(explorer: Arc<dyn ExplorerClient>, decompiler: Arc<dyn Decompiler>) -> Self {
        Self {
            explorer,
            decompiler,
        }
    }

    /// Fill in source, ABI and compiler metadata on `contract`.
    ///
    /// Returns the implementation addresses the explorer reported that the
    /// on-chain probe did not already know about.
    pub async fn resolve(&self, contract: &mut AnalyzedContract) -> Vec<QueueItem> {
        let mut discoveries = Vec::new();
        if !contract.is_contract() {
            return discoveries;
        }
        let address = contract.address;

        match self.explorer.get_verified_source(address).await {
            Ok(source) => {
                self.absorb_explorer_proxy(contract, &source, &mut discoveries);
                if source.has_source {
                    apply_verified(contract, source, "self");
                    contract.verified = true;
                    return discoveries;
                }
            }
            Err(err) => {
                warn!(address = canonical(&address), err = ?err, "verified source lookup failed");
            }
        }

        // a beacon's own source says nothing about the proxied logic
        let beacon_only =
            contract.tags.get("proxyPattern").map(String::as_str) == Some("eip1967-beacon");
        if contract.kind == KindOnChain::Proxy && !beacon_only {
            if let Some(implementation) = contract.implementation {
                if self.resolve_from_implementation(contract, implementation).await {
                    return discoveries;
                }
            }
        }

        debug!(address = canonical(&address), "falling back to abi");
        match self.explorer.get_abi_only(address).await {
            Ok(abi) if abi.has_abi => {
                contract.abi = abi.abi_raw;
                contract.source_type = SourceType::AbiOnly;
                contract.tag("sourceOrigin", "abi");
                return discoveries;
            }
            Ok(_) => {}
            Err(err) => {
                warn!(address = canonical(&address), err = ?err, "abi lookup failed");
            }
        }

        self.decompile(contract).await;
        discoveries
    }

    /// The explorer may know a contract is a proxy even when the on-chain probe
    /// found no standard pattern.
    fn absorb_explorer_proxy(
        &self,
        contract: &mut AnalyzedContract,
        source: &VerifiedSource,
        discoveries: &mut Vec<QueueItem>,
    ) {
        let address = contract.address;
        let implementation = match source.implementation {
            Some(implementation) if source.proxy && implementation != address => implementation,
            _ => return,
        };
        if contract.kind != KindOnChain::Proxy {
            debug!(address = canonical(&address), "promoted to proxy by explorer");
            contract.kind = KindOnChain::Proxy;
            contract.tag("proxyPattern", "explorer");
        }
        if !contract.implementations.contains(&implementation) {
            contract.add_implementation(implementation);
            discoveries.push(QueueItem::discovered(
                implementation,
                DiscoveryReason::ProxyImplementation,
                address,
            ));
        }
    }

    async fn resolve_from_implementation(
        &self,
        contract: &mut AnalyzedContract,
        implementation: Address,
    ) -> bool {
        debug!(
            address = canonical(&contract.address),
            implementation = canonical(&implementation),
            "falling back to implementation source"
        );
        match self.explorer.get_verified_source(implementation).await {
            Ok(source) if source.has_source => {
                apply_verified(contract, source, "implementation");
                true
            }
            Ok(_) => false,
            Err(err) => {
                warn!(
                    address = canonical(&implementation),
                    err = ?err,
                    "implementation source lookup failed"
                );
                false
            }
        }
    }

    async fn decompile(&self, contract: &mut AnalyzedContract) {
        let address = contract.address;
        let code = match contract.bytecode.clone() {
            Some(code) if !code.is_empty() => code,
            _ => {
                contract.resolution_error = Some("no source, abi or bytecode available".to_string());
                return;
            }
        };

        debug!(address = canonical(&address), "falling back to decompiler");
        let result = match self.decompiler.decompile(address, code).await {
            Ok(result) => result,
            Err(err) => {
                warn!(address = canonical(&address), err = ?err, "decompiler failed");
                contract.source_type = SourceType::None;
                contract.resolution_error = Some(err.to_string());
                return;
            }
        };
        if let Some(method) = &result.method {
            contract.tag("decompileMethod", method.clone());
        }

        match result.decompiled_text {
            Some(text) if result.no_source => {
                // unusable as source, kept as context
                contract.source_type = SourceType::None;
                contract.tag("noSource", "true");
                contract.decompiled_payload = Some(text);
            }
            Some(text) if result.success => {
                contract.source_type = SourceType::Decompiled;
                contract.tag("sourceOrigin", "decompiler");
                contract.source_files = vec![SourceFile {
                    path: format!("{}.decompiled.sol", canonical(&address)),
                    content: text,
                    source_type: SourceType::Decompiled,
                }];
            }
            _ => {
                contract.source_type = SourceType::None;
                contract.resolution_error = Some(
                    result
                        .error
                        .unwrap_or_else(|| "decompiler returned no output".to_string()),
                );
            }
        }
    }
}

fn apply_verified(contract: &mut AnalyzedContract, source: VerifiedSource, origin: &str) {
    contract.source_files = normalize_sources(
        &source.raw_source,
        source.contract_name.as_deref(),
        SourceType::Verified,
    );
    contract.source_type = SourceType::Verified;
    contract.name = source.contract_name;
    contract.abi = source.abi_raw;
    contract.compiler = source.compiler;
    contract.resolution_error = None;
    contract.tag("sourceOrigin", origin);
}
