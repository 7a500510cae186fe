use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "contract")]
pub struct Model {
    /// analysis run the record belongs to
    #[sea_orm(primary_key, auto_increment = false)]
    pub analysis: String,
    /// lowercase address
    #[sea_orm(primary_key, auto_increment = false)]
    pub address: String,

    pub kind: String,
    pub verified: bool,
    pub source_type: String,
    pub name: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub abi: Option<String>,
    /// hex encoded runtime code
    #[sea_orm(column_type = "Text", nullable)]
    pub bytecode: Option<String>,
    /// compiler metadata reported by the block explorer
    pub compiler: serde_json::Value,

    pub creator: Option<String>,
    pub creation_tx: Option<String>,
    pub implementation: Option<String>,
    pub implementations: serde_json::Value,
    pub created_contracts: serde_json::Value,
    pub runtime_callees: serde_json::Value,
    pub tags: serde_json::Value,

    #[sea_orm(column_type = "Text", nullable)]
    pub resolution_error: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub decompiled_payload: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {}
