use serde::{Deserialize, Serialize};

use crate::types::{canonical, Address};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    Contract,
    SourceFile,
    TypeDef,
    Address,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeKind {
    IsProxyOf,
    SourceDeclaredImpl,
    CreatedBy,
    Created,
    HasSourceFile,
    DeclaresType,
    ExtendsContract,
    ImplementsInterface,
    UsesLibrary,
    ReferencesAddress,
    CallsRuntime,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IsProxyOf => "IS_PROXY_OF",
            Self::SourceDeclaredImpl => "SOURCE_DECLARED_IMPL",
            Self::CreatedBy => "CREATED_BY",
            Self::Created => "CREATED",
            Self::HasSourceFile => "HAS_SOURCE_FILE",
            Self::DeclaresType => "DECLARES_TYPE",
            Self::ExtendsContract => "EXTENDS_CONTRACT",
            Self::ImplementsInterface => "IMPLEMENTS_INTERFACE",
            Self::UsesLibrary => "USES_LIBRARY",
            Self::ReferencesAddress => "REFERENCES_ADDRESS",
            Self::CallsRuntime => "CALLS_RUNTIME",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub kind: NodeKind,
    pub label: String,
    /// the contract (or bare address) this node belongs to
    pub address: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub id: String,
    pub kind: EdgeKind,
    pub from: String,
    pub to: String,
}

impl GraphEdge {
    pub fn new(kind: EdgeKind, from: &str, to: &str) -> Self {
        Self {
            id: format!("{}:{}->{}", kind.as_str(), from, to),
            kind,
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

pub fn contract_node_id(address: &Address) -> String {
    format!("contract:{}", canonical(address))
}

pub fn source_node_id(address: &Address, path: &str) -> String {
    format!("source:{}:{}", canonical(address), path)
}

pub fn typedef_node_id(address: &Address, name: &str) -> String {
    format!("typedef:{}:{}", canonical(address), name)
}

pub fn address_node_id(address: &Address) -> String {
    format!("address:{}", canonical(address))
}
