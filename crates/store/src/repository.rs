use async_trait::async_trait;
use libsonar_core::{
    adapters::Repository,
    error::SonarError,
    graph::GraphEdge,
    types::{canonical, hex, Address, AnalyzedContract, DetectedType, SourceFile},
};
use sea_orm::{
    sea_query::OnConflict, ActiveValue::NotSet, ActiveValue::Set, ColumnTrait,
    DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
};

use crate::entities;

fn db_err(e: sea_orm::DbErr) -> SonarError {
    SonarError::Persistence(format!("{}", e))
}

fn address_list(addresses: &[Address]) -> serde_json::Value {
    serde_json::Value::Array(
        addresses
            .iter()
            .map(|a| serde_json::Value::String(canonical(a)))
            .collect(),
    )
}

fn contract_model(scope: &str, c: &AnalyzedContract) -> entities::contract::ActiveModel {
    entities::contract::ActiveModel {
        analysis: Set(scope.to_string()),
        address: Set(canonical(&c.address)),
        kind: Set(c.kind.as_str().to_string()),
        verified: Set(c.verified),
        source_type: Set(c.source_type.as_str().to_string()),
        name: Set(c.name.clone()),
        abi: Set(c.abi.clone()),
        bytecode: Set(c
            .bytecode
            .as_ref()
            .map(|b| format!("0x{}", hex::encode(b)))),
        compiler: Set(serde_json::to_value(&c.compiler).unwrap_or_default()),
        creator: Set(c.creator.as_ref().map(canonical)),
        creation_tx: Set(c.creation_tx.clone()),
        implementation: Set(c.implementation.as_ref().map(canonical)),
        implementations: Set(address_list(&c.implementations)),
        created_contracts: Set(address_list(&c.created_contracts)),
        runtime_callees: Set(address_list(&c.runtime_callees)),
        tags: Set(serde_json::to_value(&c.tags).unwrap_or_default()),
        resolution_error: Set(c.resolution_error.clone()),
        decompiled_payload: Set(c.decompiled_payload.clone()),
    }
}

/// [`Repository`] backed by a sea-orm database connection.
pub struct SeaOrmRepository {
    db: DatabaseConnection,
}

impl SeaOrmRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find_contract(
        &self,
        scope: &str,
        address: Address,
    ) -> Result<Option<entities::contract::Model>, SonarError> {
        entities::contract::Entity::find_by_id((scope.to_string(), canonical(&address)))
            .one(&self.db)
            .await
            .map_err(db_err)
    }

    pub async fn count_contracts(&self, scope: &str) -> Result<u64, SonarError> {
        entities::contract::Entity::find()
            .filter(entities::contract::Column::Analysis.eq(scope))
            .count(&self.db)
            .await
            .map_err(db_err)
    }

    pub async fn find_edges(
        &self,
        scope: &str,
    ) -> Result<Vec<entities::edge::Model>, SonarError> {
        entities::edge::Entity::find()
            .filter(entities::edge::Column::Analysis.eq(scope))
            .all(&self.db)
            .await
            .map_err(db_err)
    }

    pub async fn find_type_defs(
        &self,
        scope: &str,
        contract: Address,
    ) -> Result<Vec<entities::type_def::Model>, SonarError> {
        entities::type_def::Entity::find()
            .filter(entities::type_def::Column::Analysis.eq(scope))
            .filter(entities::type_def::Column::Contract.eq(canonical(&contract)))
            .all(&self.db)
            .await
            .map_err(db_err)
    }
}

#[async_trait]
impl Repository for SeaOrmRepository {
    async fn upsert_contract(
        &self,
        scope: &str,
        contract: &AnalyzedContract,
    ) -> Result<(), SonarError> {
        use entities::contract::Column;
        let model = contract_model(scope, contract);
        match entities::contract::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([Column::Analysis, Column::Address])
                    .update_columns([
                        Column::Kind,
                        Column::Verified,
                        Column::SourceType,
                        Column::Name,
                        Column::Abi,
                        Column::Bytecode,
                        Column::Compiler,
                        Column::Creator,
                        Column::CreationTx,
                        Column::Implementation,
                        Column::Implementations,
                        Column::CreatedContracts,
                        Column::RuntimeCallees,
                        Column::Tags,
                        Column::ResolutionError,
                        Column::DecompiledPayload,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await
        {
            Ok(_) => Ok(()),
            // nothing changed
            Err(sea_orm::DbErr::RecordNotInserted) => Ok(()),
            Err(e) => Err(db_err(e)),
        }
    }

    async fn append_source_file(
        &self,
        scope: &str,
        contract: Address,
        file: &SourceFile,
    ) -> Result<(), SonarError> {
        let model = entities::source_file::ActiveModel {
            id: NotSet,
            analysis: Set(scope.to_string()),
            contract: Set(canonical(&contract)),
            path: Set(file.path.clone()),
            content: Set(file.content.clone()),
            source_type: Set(file.source_type.as_str().to_string()),
        };
        entities::source_file::Entity::insert(model)
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn append_type_def(
        &self,
        scope: &str,
        contract: Address,
        type_def: &DetectedType,
    ) -> Result<(), SonarError> {
        let model = entities::type_def::ActiveModel {
            id: NotSet,
            analysis: Set(scope.to_string()),
            contract: Set(canonical(&contract)),
            name: Set(type_def.name.clone()),
            kind: Set(type_def.kind.as_str().to_string()),
            instanciable: Set(type_def.instanciable),
            is_root_contract_type: Set(type_def.is_root_contract_type),
            parents: Set(serde_json::to_value(&type_def.parents).unwrap_or_default()),
            interfaces: Set(serde_json::to_value(&type_def.interfaces).unwrap_or_default()),
            libraries: Set(serde_json::to_value(&type_def.libraries).unwrap_or_default()),
            source_path: Set(type_def.source_path.clone()),
        };
        entities::type_def::Entity::insert(model)
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn append_edge(&self, scope: &str, edge: &GraphEdge) -> Result<(), SonarError> {
        let model = entities::edge::ActiveModel {
            id: NotSet,
            analysis: Set(scope.to_string()),
            edge_id: Set(edge.id.clone()),
            kind: Set(edge.kind.as_str().to_string()),
            source: Set(edge.from.clone()),
            target: Set(edge.to.clone()),
        };
        entities::edge::Entity::insert(model)
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}
