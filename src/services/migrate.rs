use sqlx::SqlitePool;
use tracing::info;

use crate::error::{Error, Result};

const CREATE_CLUSTERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS clusters (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    create_date TEXT NOT NULL,
    expiration_date TEXT NOT NULL,
    ignored BOOLEAN NOT NULL DEFAULT 0
)
"#;

/// Create the cluster table if it is missing. Must finish before the
/// reconciler or the HTTP server touch the store.
pub async fn run(pool: &SqlitePool) -> Result<()> {
    sqlx::query(CREATE_CLUSTERS_TABLE)
        .execute(pool)
        .await
        .map_err(Error::store("create clusters table"))?;

    info!("Migrated database");
    Ok(())
}
