use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::SonarError;
use crate::graph::GraphEdge;
use crate::types::{Address, AnalyzedContract, DetectedType, SourceFile};

/// Durable storage for the results of one analysis run.
///
/// Every write is scoped by an opaque analysis identifier. Contract records
/// are upserted by `(scope, address)`; source files, type definitions and
/// edges are append-only.
#[async_trait]
pub trait Repository: Send + Sync {
    async fn upsert_contract(
        &self,
        scope: &str,
        contract: &AnalyzedContract,
    ) -> Result<(), SonarError>;

    async fn append_source_file(
        &self,
        scope: &str,
        contract: Address,
        file: &SourceFile,
    ) -> Result<(), SonarError>;

    async fn append_type_def(
        &self,
        scope: &str,
        contract: Address,
        type_def: &DetectedType,
    ) -> Result<(), SonarError>;

    async fn append_edge(
        &self,
        scope: &str,
        edge: &GraphEdge,
    ) -> Result<(), SonarError>;
}

#[derive(Debug, Default)]
struct MemoryTables {
    contracts: BTreeMap<(String, Address), AnalyzedContract>,
    source_files: Vec<(String, Address, SourceFile)>,
    type_defs: Vec<(String, Address, DetectedType)>,
    edges: Vec<(String, GraphEdge)>,
}

/// Repository that keeps everything in process memory. Used for dry runs
/// and tests.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    tables: Mutex<MemoryTables>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Default::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryTables>, SonarError> {
        self.tables
            .lock()
            .map_err(|e| SonarError::Persistence(format!("poisoned lock: {}", e)))
    }

    pub fn contract(&self, scope: &str, address: Address) -> Option<AnalyzedContract> {
        self.lock()
            .ok()?
            .contracts
            .get(&(scope.to_string(), address))
            .cloned()
    }

    pub fn contract_count(&self, scope: &str) -> usize {
        self.lock()
            .map(|t| t.contracts.keys().filter(|(s, _)| s == scope).count())
            .unwrap_or_default()
    }

    pub fn source_file_count(&self, scope: &str) -> usize {
        self.lock()
            .map(|t| t.source_files.iter().filter(|(s, _, _)| s == scope).count())
            .unwrap_or_default()
    }

    pub fn type_def_count(&self, scope: &str) -> usize {
        self.lock()
            .map(|t| t.type_defs.iter().filter(|(s, _, _)| s == scope).count())
            .unwrap_or_default()
    }

    pub fn edges(&self, scope: &str) -> Vec<GraphEdge> {
        self.lock()
            .map(|t| {
                t.edges
                    .iter()
                    .filter(|(s, _)| s == scope)
                    .map(|(_, e)| e.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn upsert_contract(
        &self,
        scope: &str,
        contract: &AnalyzedContract,
    ) -> Result<(), SonarError> {
        self.lock()?
            .contracts
            .insert((scope.to_string(), contract.address), contract.clone());
        Ok(())
    }

    async fn append_source_file(
        &self,
        scope: &str,
        contract: Address,
        file: &SourceFile,
    ) -> Result<(), SonarError> {
        self.lock()?
            .source_files
            .push((scope.to_string(), contract, file.clone()));
        Ok(())
    }

    async fn append_type_def(
        &self,
        scope: &str,
        contract: Address,
        type_def: &DetectedType,
    ) -> Result<(), SonarError> {
        self.lock()?
            .type_defs
            .push((scope.to_string(), contract, type_def.clone()));
        Ok(())
    }

    async fn append_edge(
        &self,
        scope: &str,
        edge: &GraphEdge,
    ) -> Result<(), SonarError> {
        self.lock()?.edges.push((scope.to_string(), edge.clone()));
        Ok(())
    }
}
