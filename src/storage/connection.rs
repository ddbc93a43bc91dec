use crate::storage::entity::{area, department, technician, ticket};
use log::info;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, Schema,
    Statement,
};
use std::time::Duration;

pub async fn establish_connection(
    db_url: &str,
    max_connections: u32,
    min_connections: u32,
) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(db_url.to_owned());
    opt.max_connections(max_connections.max(1))
        .min_connections(min_connections.min(max_connections.max(1)))
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(60))
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Info);

    let db = Database::connect(opt).await?;

    if db.get_database_backend() == sea_orm::DatabaseBackend::Sqlite {
        db.execute(Statement::from_string(
            sea_orm::DatabaseBackend::Sqlite,
            "PRAGMA journal_mode=WAL;".to_string(),
        ))
        .await?;
    }

    create_table(&db, department::Entity).await?;
    create_table(&db, area::Entity).await?;
    create_table(&db, technician::Entity).await?;
    create_table(&db, ticket::Entity).await?;

    for sql in [
        "CREATE INDEX IF NOT EXISTS idx_tickets_created_at ON tickets(created_at);",
        "CREATE INDEX IF NOT EXISTS idx_tickets_status ON tickets(status);",
        "CREATE INDEX IF NOT EXISTS idx_areas_department ON areas(department_id);",
    ] {
        db.execute(Statement::from_string(
            db.get_database_backend(),
            sql.to_string(),
        ))
        .await?;
    }

    info!("Database connection established, tables ready.");

    Ok(db)
}

async fn create_table<E: EntityTrait>(db: &DatabaseConnection, entity: E) -> Result<(), DbErr> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);
    let stmt = builder.build(schema.create_table_from_entity(entity).if_not_exists());
    db.execute(stmt).await?;
    Ok(())
}

#[cfg(test)]
pub(crate) async fn test_connection() -> (tempfile::TempDir, DatabaseConnection) {
    let dir = tempfile::tempdir().expect("temp dir");
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());
    let db = establish_connection(&url, 1, 1).await.expect("test database");
    (dir, db)
}
