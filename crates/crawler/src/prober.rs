use std::sync::Arc;

use libsonar_core::{
    adapters::ExplorerClient,
    error::SonarError,
    types::{canonical, Address, AnalyzedContract, DiscoveryReason, KindOnChain, QueueItem},
};
use libsonar_utils::log::{debug, warn};

use crate::{
    cache::CodeCache,
    config::CrawlerConfig,
    proxy::{detect_eip1167, detect_eip1967},
};

/// What probing one address produced: its record and the addresses it points
/// at, to be handed to the frontier by the caller.
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    pub contract: AnalyzedContract,
    pub discoveries: Vec<QueueItem>,
}

pub struct Prober {
    code: CodeCache,
    explorer: Arc<dyn ExplorerClient>,
    internal_tx_page_size: u64,
    max_created_contracts: usize,
    max_runtime_callees: usize,
}

impl Prober {
    pub fn new(code: CodeCache, explorer: Arc<dyn ExplorerClient>, cfg: &CrawlerConfig) -> Self {
        Self {
            code,
            explorer,
            internal_tx_page_size: cfg.internal_tx_page_size,
            max_created_contracts: cfg.max_created_contracts,
            max_runtime_callees: cfg.max_runtime_callees,
        }
    }

    /// Classify `address` and collect its on-chain links.
    ///
    /// Only a failed bytecode fetch is an error. Every later lookup degrades
    /// to an empty result.
    pub async fn probe(&self, address: Address) -> Result<ProbeOutcome, SonarError> {
        let code = self.code.get_code(address).await?;
        if code.is_empty() {
            return Ok(ProbeOutcome {
                contract: AnalyzedContract::new(address, KindOnChain::Eoa),
                discoveries: vec![],
            });
        }

        let mut contract = AnalyzedContract::new(address, KindOnChain::ContractSimple);
        contract.bytecode = Some(code.clone());
        let mut discoveries = Vec::new();

        self.detect_proxy(&mut contract, &mut discoveries).await;
        self.lookup_creator(&mut contract, &mut discoveries).await;
        self.lookup_internal_transactions(&mut contract, &mut discoveries)
            .await;

        Ok(ProbeOutcome {
            contract,
            discoveries,
        })
    }

    async fn detect_proxy(&self, contract: &mut AnalyzedContract, discoveries: &mut Vec<QueueItem>) {
        let address = contract.address;
        let code = contract.bytecode.clone().unwrap_or_default();
        let (eip1967, eip1167) = futures::join!(
            detect_eip1967(self.code.chain().as_ref(), address),
            async { detect_eip1167(&code) },
        );

        if let Some(admin) = eip1967.admin {
            contract.tag("eip1967.admin", canonical(&admin));
        }
        if let Some(beacon) = eip1967.beacon {
            contract.tag("eip1967.beacon", canonical(&beacon));
        }
        if let Some(implementation) = eip1967.implementation {
            contract.tag("eip1967.implementation", canonical(&implementation));
        }

        let (pattern, target) = match (eip1967.target(), eip1167) {
            (Some(target), _) => {
                let pattern = if eip1967.implementation.is_some() {
                    "eip1967"
                } else {
                    "eip1967-beacon"
                };
                (pattern, target)
            }
            (None, Some(target)) => {
                contract.tag("eip1167.implementation", canonical(&target));
                ("eip1167", target)
            }
            (None, None) => return,
        };
        debug!(address = canonical(&address), pattern, "proxy detected");
        contract.kind = KindOnChain::Proxy;
        contract.tag("proxyPattern", pattern);
        if target != address {
            contract.add_implementation(target);
            discoveries.push(QueueItem::discovered(
                target,
                DiscoveryReason::ProxyImplementation,
                address,
            ));
        }
    }

    async fn lookup_creator(&self, contract: &mut AnalyzedContract, discoveries: &mut Vec<QueueItem>) {
        let address = contract.address;
        let info = match self.explorer.get_creator(address).await {
            Ok(Some(info)) => info,
            Ok(None) => return,
            Err(err) => {
                warn!(address = canonical(&address), err = ?err, "creator lookup failed");
                return;
            }
        };
        contract.creator = Some(info.creator);
        if !info.creation_tx.is_empty() {
            contract.creation_tx = Some(info.creation_tx);
        }
        if info.creator != address && self.code.is_contract(info.creator).await {
            contract.tag("creatorIsContract", "true");
            discoveries.push(QueueItem::discovered(
                info.creator,
                DiscoveryReason::CreatorContract,
                address,
            ));
        }
    }

    async fn lookup_internal_transactions(
        &self,
        contract: &mut AnalyzedContract,
        discoveries: &mut Vec<QueueItem>,
    ) {
        let address = contract.address;
        let txs = match self
            .explorer
            .get_internal_transactions(address, 1, self.internal_tx_page_size)
            .await
        {
            Ok(txs) => txs,
            Err(err) => {
                warn!(address = canonical(&address), err = ?err, "internal transaction lookup failed");
                return;
            }
        };

        let mut created = Vec::new();
        let mut callees = Vec::new();
        for tx in txs.iter().filter(|tx| tx.from == address) {
            if tx.is_create() {
                if let Some(child) = tx.contract_address.or(tx.to) {
                    if child != address && !created.contains(&child) {
                        created.push(child);
                    }
                }
            } else if let Some(callee) = tx.to {
                if callee != address && !callees.contains(&callee) {
                    callees.push(callee);
                }
            }
        }

        for child in created {
            if contract.created_contracts.len() >= self.max_created_contracts {
                break;
            }
            if self.code.is_contract(child).await {
                contract.created_contracts.push(child);
                discoveries.push(QueueItem::discovered(
                    child,
                    DiscoveryReason::FactoryCreated,
                    address,
                ));
            }
        }
        for callee in callees {
            if contract.runtime_callees.len() >= self.max_runtime_callees {
                break;
            }
            if self.code.is_contract(callee).await {
                contract.runtime_callees.push(callee);
                discoveries.push(QueueItem::discovered(
                    callee,
                    DiscoveryReason::RuntimeCallee,
                    address,
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use libsonar_core::{
        adapters::{CreatorInfo, InternalTransaction, MockChainReader, MockExplorerClient},
        types::{Bytes, B256},
    };

    use super::*;
    use crate::proxy::{minimal_proxy_code, EIP1967_IMPLEMENTATION_SLOT};

    const ROOT: Address = Address::repeat_byte(0x01);
    const IMPL_1967: Address = Address::repeat_byte(0x02);
    const IMPL_1167: Address = Address::repeat_byte(0x03);
    const FACTORY: Address = Address::repeat_byte(0x04);
    const CHILD: Address = Address::repeat_byte(0x05);
    const CALLEE: Address = Address::repeat_byte(0x06);
    const WALLET: Address = Address::repeat_byte(0x07);

    fn prober(chain: MockChainReader, explorer: MockExplorerClient) -> Prober {
        Prober::new(
            CodeCache::new(Arc::new(chain), 64),
            Arc::new(explorer),
            &CrawlerConfig::default(),
        )
    }

    fn quiet_explorer() -> MockExplorerClient {
        let mut explorer = MockExplorerClient::new();
        explorer.expect_get_creator().returning(|_| Ok(None));
        explorer
            .expect_get_internal_transactions()
            .returning(|_, _, _| Ok(vec![]));
        explorer
    }

    #[tokio::test]
    async fn test_eoa_is_not_probed_further() {
        let mut chain = MockChainReader::new();
        chain
            .expect_get_bytecode()
            .times(1)
            .returning(|_| Ok(Bytes::new()));
        chain.expect_read_storage_slot().never();
        let mut explorer = MockExplorerClient::new();
        explorer.expect_get_creator().never();
        explorer.expect_get_internal_transactions().never();
        explorer.expect_get_verified_source().never();

        let outcome = prober(chain, explorer).probe(WALLET).await.unwrap();
        assert_eq!(outcome.contract.kind, KindOnChain::Eoa);
        assert!(outcome.contract.bytecode.is_none());
        assert!(outcome.discoveries.is_empty());
    }

    #[tokio::test]
    async fn test_bytecode_failure_aborts() {
        let mut chain = MockChainReader::new();
        chain
            .expect_get_bytecode()
            .returning(|_| Err(SonarError::Provider("down".to_string())));
        let mut explorer = MockExplorerClient::new();
        explorer.expect_get_creator().never();
        assert!(prober(chain, explorer).probe(ROOT).await.is_err());
    }

    #[tokio::test]
    async fn test_eip1967_wins_over_eip1167() {
        let mut chain = MockChainReader::new();
        chain
            .expect_get_bytecode()
            .returning(|_| Ok(Bytes::from(minimal_proxy_code(IMPL_1167))));
        chain.expect_read_storage_slot().returning(|_, slot| {
            if slot == EIP1967_IMPLEMENTATION_SLOT {
                Ok(IMPL_1967.into_word())
            } else {
                Ok(B256::ZERO)
            }
        });

        let outcome = prober(chain, quiet_explorer()).probe(ROOT).await.unwrap();
        let c = &outcome.contract;
        assert_eq!(c.kind, KindOnChain::Proxy);
        assert_eq!(c.implementation, Some(IMPL_1967));
        assert_eq!(c.implementations, vec![IMPL_1967]);
        assert_eq!(c.tags["proxyPattern"], "eip1967");
        assert_eq!(
            outcome.discoveries,
            vec![QueueItem::discovered(
                IMPL_1967,
                DiscoveryReason::ProxyImplementation,
                ROOT
            )]
        );
    }

    #[tokio::test]
    async fn test_eip1167_minimal_proxy() {
        let mut chain = MockChainReader::new();
        chain
            .expect_get_bytecode()
            .returning(|_| Ok(Bytes::from(minimal_proxy_code(IMPL_1167))));
        chain
            .expect_read_storage_slot()
            .returning(|_, _| Ok(B256::ZERO));

        let outcome = prober(chain, quiet_explorer()).probe(ROOT).await.unwrap();
        assert_eq!(outcome.contract.kind, KindOnChain::Proxy);
        assert_eq!(outcome.contract.implementation, Some(IMPL_1167));
        assert_eq!(outcome.contract.tags["proxyPattern"], "eip1167");
    }

    #[tokio::test]
    async fn test_links_are_code_checked() {
        let mut chain = MockChainReader::new();
        chain.expect_get_bytecode().returning(|address| {
            if address == WALLET {
                Ok(Bytes::new())
            } else {
                Ok(Bytes::from_static(&[0x60, 0x80]))
            }
        });
        chain
            .expect_read_storage_slot()
            .returning(|_, _| Ok(B256::ZERO));

        let mut explorer = MockExplorerClient::new();
        explorer.expect_get_creator().returning(|_| {
            Ok(Some(CreatorInfo {
                creator: FACTORY,
                creation_tx: "0xabc".to_string(),
            }))
        });
        explorer
            .expect_get_internal_transactions()
            .returning(|_, _, _| {
                Ok(vec![
                    InternalTransaction {
                        from: ROOT,
                        to: None,
                        kind: "create2".to_string(),
                        contract_address: Some(CHILD),
                    },
                    InternalTransaction {
                        from: ROOT,
                        to: Some(CALLEE),
                        kind: "call".to_string(),
                        contract_address: None,
                    },
                    InternalTransaction {
                        from: ROOT,
                        to: Some(WALLET),
                        kind: "call".to_string(),
                        contract_address: None,
                    },
                    // not initiated by the probed address
                    InternalTransaction {
                        from: FACTORY,
                        to: Some(CALLEE),
                        kind: "call".to_string(),
                        contract_address: None,
                    },
                ])
            });

        let outcome = prober(chain, explorer).probe(ROOT).await.unwrap();
        let c = &outcome.contract;
        assert_eq!(c.kind, KindOnChain::ContractSimple);
        assert_eq!(c.creator, Some(FACTORY));
        assert_eq!(c.creation_tx.as_deref(), Some("0xabc"));
        assert_eq!(c.tags["creatorIsContract"], "true");
        assert_eq!(c.created_contracts, vec![CHILD]);
        assert_eq!(c.runtime_callees, vec![CALLEE]);
        let reasons: Vec<_> = outcome.discoveries.iter().map(|d| d.reason).collect();
        assert_eq!(
            reasons,
            vec![
                DiscoveryReason::CreatorContract,
                DiscoveryReason::FactoryCreated,
                DiscoveryReason::RuntimeCallee,
            ]
        );
    }

    #[tokio::test]
    async fn test_explorer_failures_degrade() {
        let mut chain = MockChainReader::new();
        chain
            .expect_get_bytecode()
            .returning(|_| Ok(Bytes::from_static(&[0x60, 0x80])));
        chain
            .expect_read_storage_slot()
            .returning(|_, _| Err(SonarError::Provider("down".to_string())));
        let mut explorer = MockExplorerClient::new();
        explorer
            .expect_get_creator()
            .returning(|_| Err(SonarError::Explorer("rate limited".to_string())));
        explorer
            .expect_get_internal_transactions()
            .returning(|_, _, _| Err(SonarError::Explorer("rate limited".to_string())));

        let outcome = prober(chain, explorer).probe(ROOT).await.unwrap();
        assert_eq!(outcome.contract.kind, KindOnChain::ContractSimple);
        assert!(outcome.contract.creator.is_none());
        assert!(outcome.discoveries.is_empty());
    }
}
