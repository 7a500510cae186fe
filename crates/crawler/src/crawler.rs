use std::{collections::BTreeMap, sync::Arc};

use libsonar_core::{
    adapters::{ChainReader, Decompiler, ExplorerClient, Repository},
    graph::Graph,
    types::{
        canonical, Address, AnalyzedContract, AnalyzedSource, DiscoveryReason, QueueItem,
    },
};
use libsonar_utils::log::{debug, error, info, warn};
use serde::Serialize;

use crate::{
    cache::CodeCache,
    config::CrawlerConfig,
    extract::{analyze_source, ExtractLimits},
    frontier::Frontier,
    graph::assemble_graph,
    prober::Prober,
    resolver::SourceResolver,
};

/// Result of one crawl. Partial coverage shows up in the counters, never as
/// an error.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    pub scope: String,
    pub root: Address,
    pub contracts: BTreeMap<Address, AnalyzedContract>,
    pub sources: BTreeMap<Address, AnalyzedSource>,
    /// every accepted queue item, in processing order
    pub provenance: Vec<QueueItem>,
    pub graph: Graph,

    pub visited: usize,
    /// items still queued when the crawl stopped
    pub remaining: usize,
    /// discoveries refused by the frontier, duplicates included
    pub skipped: usize,
    /// discoveries refused because the contract cap was reached
    pub dropped: usize,
    /// addresses whose bytecode could not be read
    pub failed: Vec<Address>,
}

impl CrawlReport {
    pub fn is_partial(&self) -> bool {
        self.remaining > 0 || self.dropped > 0
    }
}

pub struct Crawler {
    cfg: CrawlerConfig,
    chain: Arc<dyn ChainReader>,
    explorer: Arc<dyn ExplorerClient>,
    resolver: SourceResolver,
    repository: Arc<dyn Repository>,
}

impl Crawler {
    pub fn new(
        cfg: CrawlerConfig,
        chain: Arc<dyn ChainReader>,
        explorer: Arc<dyn ExplorerClient>,
        decompiler: Arc<dyn Decompiler>,
        repository: Arc<dyn Repository>,
    ) -> Self {
        let resolver = SourceResolver::new(explorer.clone(), decompiler);
        Self {
            cfg,
            chain,
            explorer,
            resolver,
            repository,
        }
    }

    /// Breadth-first crawl from `root`, one address at a time.
    ///
    /// Every contract record is upserted under `scope` as soon as it is
    /// processed; the graph is assembled and appended once the frontier drains.
    /// Bytecode is cached for this run only.
    pub async fn crawl(&self, scope: &str, root: Address) -> CrawlReport {
        let code = CodeCache::new(self.chain.clone(), self.cfg.bytecode_cache_size);
        let prober = Prober::new(code.clone(), self.explorer.clone(), &self.cfg);
        let limits = ExtractLimits::from(&self.cfg);
        let mut frontier = Frontier::new(self.cfg.max_contracts);
        let mut contracts = BTreeMap::new();
        let mut failed = Vec::new();

        frontier.enqueue(QueueItem::root(root));
        while let Some(item) = frontier.dequeue() {
            let address = item.address;
            info!(
                address = canonical(&address),
                reason = item.reason.as_str(),
                visited = frontier.visited_len(),
                pending = frontier.pending_len(),
                "processing"
            );

            let outcome = match prober.probe(address).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    error!(address = canonical(&address), err = ?err, "failed to read bytecode");
                    failed.push(address);
                    continue;
                }
            };
            let mut contract = outcome.contract;
            let mut discoveries = outcome.discoveries;
            discoveries.extend(self.resolver.resolve(&mut contract).await);
            if !contract.source_files.is_empty() {
                let source = analyze_source(&contract, limits);
                discoveries.extend(Self::source_discoveries(&code, &frontier, address, &source).await);
            }

            for discovery in discoveries {
                let target = discovery.address;
                let reason = discovery.reason;
                if !frontier.enqueue(discovery) {
                    debug!(
                        address = canonical(&target),
                        reason = reason.as_str(),
                        "skipped discovery"
                    );
                }
            }

            if let Err(err) = self.repository.upsert_contract(scope, &contract).await {
                warn!(address = canonical(&address), err = ?err, "failed to persist contract");
            }
            contracts.insert(address, contract);
        }

        if frontier.dropped() > 0 {
            warn!(
                max_contracts = self.cfg.max_contracts,
                dropped = frontier.dropped(),
                "contract cap reached, coverage is partial"
            );
        }

        let sources: BTreeMap<Address, AnalyzedSource> = contracts
            .iter()
            .filter(|(_, c)| !c.source_files.is_empty())
            .map(|(address, c)| (*address, analyze_source(c, limits)))
            .collect();
        let graph = assemble_graph(&contracts, &sources);
        self.persist_graph(scope, &sources, &graph).await;
        info!(
            scope,
            visited = frontier.visited_len(),
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            failed = failed.len(),
            "crawl finished"
        );

        CrawlReport {
            scope: scope.to_string(),
            root,
            contracts,
            sources,
            provenance: frontier.provenance().to_vec(),
            graph,
            visited: frontier.visited_len(),
            remaining: frontier.pending_len(),
            skipped: frontier.rejected(),
            dropped: frontier.dropped(),
            failed,
        }
    }

    /// Declared implementations are queued as is; hardcoded addresses only
    /// when they hold code.
    async fn source_discoveries(
        code: &CodeCache,
        frontier: &Frontier,
        address: Address,
        source: &AnalyzedSource,
    ) -> Vec<QueueItem> {
        let mut discoveries: Vec<QueueItem> = source
            .declared_implementations
            .iter()
            .map(|i| QueueItem::discovered(*i, DiscoveryReason::SourceDeclaredImpl, address))
            .collect();
        for referenced in &source.hardcoded_addresses {
            let item = QueueItem::discovered(*referenced, DiscoveryReason::HardcodedAddress, address);
            // refused anyway, no need to look up code
            if frontier.is_known(referenced) || frontier.is_full() {
                discoveries.push(item);
            } else if code.is_contract(*referenced).await {
                discoveries.push(item);
            }
        }
        discoveries
    }

    async fn persist_graph(
        &self,
        scope: &str,
        sources: &BTreeMap<Address, AnalyzedSource>,
        graph: &Graph,
    ) {
        for (address, source) in sources {
            for file in &source.files {
                if let Err(err) = self.repository.append_source_file(scope, *address, file).await {
                    warn!(address = canonical(address), path = file.path, err = ?err, "failed to persist source file");
                }
            }
            for type_def in &source.types {
                if let Err(err) = self.repository.append_type_def(scope, *address, type_def).await {
                    warn!(address = canonical(address), name = type_def.name, err = ?err, "failed to persist type");
                }
            }
        }
        for edge in &graph.edges {
            if let Err(err) = self.repository.append_edge(scope, edge).await {
                warn!(edge = edge.id, err = ?err, "failed to persist edge");
            }
        }
    }
}
