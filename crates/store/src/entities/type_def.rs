use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "type_def")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub analysis: String,
    pub contract: String,
    pub name: String,
    pub kind: String,
    pub instanciable: bool,
    pub is_root_contract_type: bool,
    pub parents: serde_json::Value,
    pub interfaces: serde_json::Value,
    pub libraries: serde_json::Value,
    /// the file that declares the type
    pub source_path: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {}
