use libsonar_core::error::SonarError;
use sea_orm::{ConnectionTrait, DatabaseConnection, EntityTrait, Schema};

use crate::entities;

async fn create_table<E: EntityTrait>(
    db: &DatabaseConnection,
    schema: &Schema,
    entity: E,
) -> Result<(), SonarError> {
    let mut stmt = schema.create_table_from_entity(entity);
    stmt.if_not_exists();
    db.execute(db.get_database_backend().build(&stmt))
        .await
        .map_err(|e| SonarError::Persistence(format!("{}", e)))?;
    Ok(())
}

/// Create every table the repository writes to, if missing.
pub async fn ensure_schema(db: &DatabaseConnection) -> Result<(), SonarError> {
    let schema = Schema::new(db.get_database_backend());
    create_table(db, &schema, entities::contract::Entity).await?;
    create_table(db, &schema, entities::source_file::Entity).await?;
    create_table(db, &schema, entities::type_def::Entity).await?;
    create_table(db, &schema, entities::edge::Entity).await?;
    Ok(())
}

#[cfg(test)]
pub(crate) async fn setup_test_db() -> DatabaseConnection {
    // Connecting SQLite
    let db = sea_orm::Database::connect("sqlite::memory:").await.unwrap();
    ensure_schema(&db).await.unwrap();
    db
}
