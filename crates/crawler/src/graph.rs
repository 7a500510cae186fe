use std::collections::{BTreeMap, BTreeSet};

use libsonar_core::{
    graph::{
        address_node_id, contract_node_id, source_node_id, typedef_node_id, EdgeKind, Graph,
        GraphEdge, GraphNode, NodeKind,
    },
    types::{canonical, Address, AnalyzedContract, AnalyzedSource, DetectedType},
};

/// Accumulates nodes and edges keyed by id, so output order only depends on
/// the ids and repeated insertions are no-ops.
struct Builder<'a> {
    visited: &'a BTreeMap<Address, AnalyzedContract>,
    nodes: BTreeMap<String, GraphNode>,
    edges: BTreeMap<String, GraphEdge>,
}

impl<'a> Builder<'a> {
    fn node(&mut self, id: String, kind: NodeKind, label: String, address: Address) {
        self.nodes.entry(id.clone()).or_insert(GraphNode {
            id,
            kind,
            label,
            address,
        });
    }

    /// A contract node when the address was crawled, a bare address node otherwise.
    fn reference(&mut self, address: Address) -> String {
        if self.visited.contains_key(&address) {
            return contract_node_id(&address);
        }
        let id = address_node_id(&address);
        self.node(id.clone(), NodeKind::Address, canonical(&address), address);
        id
    }

    fn edge(&mut self, kind: EdgeKind, from: &str, to: &str) {
        if from == to {
            return;
        }
        let edge = GraphEdge::new(kind, from, to);
        self.edges.entry(edge.id.clone()).or_insert(edge);
    }

    fn link_all(&mut self, kind: EdgeKind, from: &str, targets: &[Address]) {
        for target in targets {
            let to = self.reference(*target);
            self.edge(kind, from, &to);
        }
    }

    fn contract(&mut self, contract: &AnalyzedContract) {
        let id = contract_node_id(&contract.address);
        let label = contract
            .name
            .clone()
            .unwrap_or_else(|| canonical(&contract.address));
        self.node(id.clone(), NodeKind::Contract, label, contract.address);

        self.link_all(EdgeKind::IsProxyOf, &id, &contract.implementations);
        if let Some(creator) = contract.creator {
            let to = self.reference(creator);
            self.edge(EdgeKind::CreatedBy, &id, &to);
        }
        self.link_all(EdgeKind::Created, &id, &contract.created_contracts);
        self.link_all(EdgeKind::CallsRuntime, &id, &contract.runtime_callees);
    }

    fn source(&mut self, address: Address, source: &AnalyzedSource) {
        let contract_id = contract_node_id(&address);
        for file in &source.files {
            let id = source_node_id(&address, &file.path);
            self.node(id.clone(), NodeKind::SourceFile, file.path.clone(), address);
            self.edge(EdgeKind::HasSourceFile, &contract_id, &id);
        }

        // first declaration of a name wins the node
        let mut declared = BTreeSet::new();
        for t in &source.types {
            let id = typedef_node_id(&address, &t.name);
            if declared.insert(t.name.as_str()) {
                self.node(id.clone(), NodeKind::TypeDef, t.name.clone(), address);
            }
            let file_id = source_node_id(&address, &t.source_path);
            self.edge(EdgeKind::DeclaresType, &file_id, &id);
        }
        for t in &source.types {
            self.type_relations(address, t);
        }

        self.link_all(
            EdgeKind::SourceDeclaredImpl,
            &contract_id,
            &source.declared_implementations,
        );
        self.link_all(
            EdgeKind::ReferencesAddress,
            &contract_id,
            &source.hardcoded_addresses,
        );
    }

    /// Type-to-type edges stay within one contract's declarations; names that
    /// were never declared there are dropped with the endpoint filter.
    fn type_relations(&mut self, address: Address, t: &DetectedType) {
        let from = typedef_node_id(&address, &t.name);
        let relations = [
            (EdgeKind::ExtendsContract, &t.parents),
            (EdgeKind::ImplementsInterface, &t.interfaces),
            (EdgeKind::UsesLibrary, &t.libraries),
        ];
        for (kind, names) in relations {
            for name in names {
                self.edge(kind, &from, &typedef_node_id(&address, name));
            }
        }
    }

    fn finish(self) -> Graph {
        let nodes = self.nodes;
        let edges = self
            .edges
            .into_values()
            .filter(|e| nodes.contains_key(&e.from) && nodes.contains_key(&e.to))
            .collect();
        Graph {
            nodes: nodes.into_values().collect(),
            edges,
        }
    }
}

/// Project crawl results onto a node/edge graph.
///
/// Output is sorted by id and every edge endpoint is a node of the result.
/// Whether a referenced address becomes a `contract:` or an `address:` node
/// is decided here, against the final set of crawled contracts.
pub fn assemble_graph(
    contracts: &BTreeMap<Address, AnalyzedContract>,
    sources: &BTreeMap<Address, AnalyzedSource>,
) -> Graph {
    let mut builder = Builder {
        visited: contracts,
        nodes: BTreeMap::new(),
        edges: BTreeMap::new(),
    };
    for contract in contracts.values() {
        builder.contract(contract);
    }
    for (address, source) in sources {
        if contracts.contains_key(address) {
            builder.source(*address, source);
        }
    }
    builder.finish()
}

#[cfg(test)]
mod tests {
    use libsonar_core::types::{KindOnChain, SourceFile, SourceType, TypeKind};

    use super::*;

    const PROXY: Address = Address::repeat_byte(0x01);
    const IMPL: Address = Address::repeat_byte(0x02);
    const DEPLOYER: Address = Address::repeat_byte(0x03);
    const ORACLE: Address = Address::repeat_byte(0x04);

    fn detected(name: &str, kind: TypeKind, path: &str, parents: &[&str], interfaces: &[&str]) -> DetectedType {
        DetectedType {
            name: name.to_string(),
            kind,
            instanciable: kind == TypeKind::ContractImpl,
            is_root_contract_type: false,
            parents: parents.iter().map(|s| s.to_string()).collect(),
            interfaces: interfaces.iter().map(|s| s.to_string()).collect(),
            libraries: vec![],
            source_path: path.to_string(),
        }
    }

    fn file(path: &str) -> SourceFile {
        SourceFile {
            path: path.to_string(),
            content: String::new(),
            source_type: SourceType::Verified,
        }
    }

    fn fixture() -> (BTreeMap<Address, AnalyzedContract>, BTreeMap<Address, AnalyzedSource>) {
        let mut proxy = AnalyzedContract::new(PROXY, KindOnChain::Proxy);
        proxy.add_implementation(IMPL);
        proxy.creator = Some(DEPLOYER);
        proxy.runtime_callees = vec![IMPL];
        let implementation = AnalyzedContract::new(IMPL, KindOnChain::ContractSimple);

        let source = AnalyzedSource {
            files: vec![file("Token.sol"), file("lib/Base.sol")],
            types: vec![
                detected("Token", TypeKind::ContractImpl, "Token.sol", &["Base", "Missing"], &["IToken"]),
                detected("Base", TypeKind::AbstractContract, "lib/Base.sol", &[], &[]),
                // declared again in another file
                detected("Base", TypeKind::AbstractContract, "Token.sol", &[], &[]),
            ],
            hardcoded_addresses: vec![ORACLE, IMPL],
            declared_implementations: vec![IMPL, ORACLE],
        };

        let contracts = BTreeMap::from([(PROXY, proxy), (IMPL, implementation)]);
        let sources = BTreeMap::from([(IMPL, source)]);
        (contracts, sources)
    }

    #[test]
    fn test_every_edge_endpoint_is_a_node() {
        let (contracts, sources) = fixture();
        let graph = assemble_graph(&contracts, &sources);
        let ids: BTreeSet<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        assert!(!graph.edges.is_empty());
        for edge in &graph.edges {
            assert!(ids.contains(edge.from.as_str()), "dangling from {}", edge.id);
            assert!(ids.contains(edge.to.as_str()), "dangling to {}", edge.id);
        }
        // undeclared parent and interface are filtered out
        assert!(!graph.edges.iter().any(|e| e.to.ends_with(":Missing")));
        assert!(!graph.edges.iter().any(|e| e.kind == EdgeKind::ImplementsInterface));
    }

    #[test]
    fn test_assembly_is_deterministic() {
        let (contracts, sources) = fixture();
        let first = assemble_graph(&contracts, &sources);
        let second = assemble_graph(&contracts, &sources);
        assert_eq!(first, second);
    }

    #[test]
    fn test_typedef_dedup_and_declaring_files() {
        let (contracts, sources) = fixture();
        let graph = assemble_graph(&contracts, &sources);
        let base = typedef_node_id(&IMPL, "Base");
        assert_eq!(graph.nodes.iter().filter(|n| n.id == base).count(), 1);
        let mut declaring: Vec<&str> = graph
            .edges
            .iter()
            .filter(|e| e.kind == EdgeKind::DeclaresType && e.to == base)
            .map(|e| e.from.as_str())
            .collect();
        declaring.sort();
        assert_eq!(
            declaring,
            vec![
                source_node_id(&IMPL, "Token.sol"),
                source_node_id(&IMPL, "lib/Base.sol"),
            ]
        );
        assert!(graph.edges.iter().any(|e| e.kind == EdgeKind::ExtendsContract
            && e.from == typedef_node_id(&IMPL, "Token")
            && e.to == base));
    }

    #[test]
    fn test_crawled_addresses_are_contract_nodes() {
        let (contracts, sources) = fixture();
        let graph = assemble_graph(&contracts, &sources);
        let kind_of = |id: String| graph.nodes.iter().find(|n| n.id == id).map(|n| n.kind);

        assert_eq!(kind_of(contract_node_id(&IMPL)), Some(NodeKind::Contract));
        assert_eq!(kind_of(address_node_id(&IMPL)), None);
        assert_eq!(kind_of(address_node_id(&DEPLOYER)), Some(NodeKind::Address));
        assert_eq!(kind_of(address_node_id(&ORACLE)), Some(NodeKind::Address));

        let proxy_of = GraphEdge::new(
            EdgeKind::IsProxyOf,
            &contract_node_id(&PROXY),
            &contract_node_id(&IMPL),
        );
        assert!(graph.edges.contains(&proxy_of));
        let created_by = GraphEdge::new(
            EdgeKind::CreatedBy,
            &contract_node_id(&PROXY),
            &address_node_id(&DEPLOYER),
        );
        assert!(graph.edges.contains(&created_by));
        // the implementation's own address in its source is not an edge
        assert!(!graph
            .edges
            .iter()
            .any(|e| e.kind == EdgeKind::ReferencesAddress && e.to == contract_node_id(&IMPL)));
    }

    #[test]
    fn test_declared_implementation_edges() {
        let (contracts, sources) = fixture();
        let graph = assemble_graph(&contracts, &sources);
        let declared: Vec<(String, String)> = graph
            .edges
            .iter()
            .filter(|e| e.kind == EdgeKind::SourceDeclaredImpl)
            .map(|e| (e.from.clone(), e.to.clone()))
            .collect();
        // the self-declaration is dropped, the uncrawled one is an address node
        assert_eq!(declared, vec![(contract_node_id(&IMPL), address_node_id(&ORACLE))]);
    }
}
