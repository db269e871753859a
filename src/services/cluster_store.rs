use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

#[cfg(test)]
use mockall::automock;

use crate::error::{Error, Result};
use crate::models::ClusterRecord;

/// Persistence for expiration-tracking records, keyed by cluster name.
///
/// Every method is a single statement; nothing here spans a transaction.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ClusterStore: Send + Sync {
    /// All known records, ordered by name
    async fn list(&self) -> Result<Vec<ClusterRecord>>;

    /// Records with `expiration_date < now`, ignored ones included
    async fn list_expired(&self, now: DateTime<Utc>) -> Result<Vec<ClusterRecord>>;

    async fn insert(
        &self,
        name: &str,
        create_date: DateTime<Utc>,
        expiration_date: DateTime<Utc>,
        ignore: bool,
    ) -> Result<()>;

    async fn update_create_and_expiration_date(
        &self,
        name: &str,
        create_date: DateTime<Utc>,
        expiration_date: DateTime<Utc>,
    ) -> Result<()>;

    /// Returns `false` when no record has this name
    async fn update_expiration_date(&self, name: &str, expiration_date: DateTime<Utc>) -> Result<bool>;

    /// Returns `false` when no record has this name
    async fn update_ignore(&self, name: &str, ignore: bool) -> Result<bool>;

    async fn delete(&self, name: &str) -> Result<()>;
}

#[derive(Clone)]
pub struct SqliteClusterStore {
    pool: SqlitePool,
}

impl SqliteClusterStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

const SELECT_CLUSTERS: &str =
    "SELECT id, name, create_date, expiration_date, ignored FROM clusters";

#[async_trait]
impl ClusterStore for SqliteClusterStore {
    async fn list(&self) -> Result<Vec<ClusterRecord>> {
        sqlx::query_as::<_, ClusterRecord>(&format!("{} ORDER BY name", SELECT_CLUSTERS))
            .fetch_all(&self.pool)
            .await
            .map_err(Error::store("list clusters"))
    }

    async fn list_expired(&self, now: DateTime<Utc>) -> Result<Vec<ClusterRecord>> {
        // Timestamps are RFC 3339 text; julianday() compares them as instants.
        sqlx::query_as::<_, ClusterRecord>(&format!(
            "{} WHERE julianday(expiration_date) < julianday(?) ORDER BY name",
            SELECT_CLUSTERS
        ))
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::store("list expired clusters"))
    }

    async fn insert(
        &self,
        name: &str,
        create_date: DateTime<Utc>,
        expiration_date: DateTime<Utc>,
        ignore: bool,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO clusters (name, create_date, expiration_date, ignored) VALUES (?, ?, ?, ?)",
        )
        .bind(name)
        .bind(create_date)
        .bind(expiration_date)
        .bind(ignore)
        .execute(&self.pool)
        .await
        .map_err(Error::store("insert cluster"))?;

        Ok(())
    }

    async fn update_create_and_expiration_date(
        &self,
        name: &str,
        create_date: DateTime<Utc>,
        expiration_date: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query("UPDATE clusters SET create_date = ?, expiration_date = ? WHERE name = ?")
            .bind(create_date)
            .bind(expiration_date)
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(Error::store("update cluster create and expiration date"))?;

        Ok(())
    }

    async fn update_expiration_date(&self, name: &str, expiration_date: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query("UPDATE clusters SET expiration_date = ? WHERE name = ?")
            .bind(expiration_date)
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(Error::store("update cluster expiration date"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_ignore(&self, name: &str, ignore: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE clusters SET ignored = ? WHERE name = ?")
            .bind(ignore)
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(Error::store("update cluster ignore flag"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, name: &str) -> Result<()> {
        sqlx::query("DELETE FROM clusters WHERE name = ?")
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(Error::store("delete cluster"))?;

        Ok(())
    }
}
