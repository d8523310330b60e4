//! SQLite-backed replicated map, so bucket and domain records outlive the
//! process. Blobs live in the iroh-blobs store next to it.

use std::path::Path;

use async_trait::async_trait;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions},
    Row,
};
use time::OffsetDateTime;

use common::source::{MapError, ReplicatedMap};

#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

#[derive(Debug, thiserror::Error)]
pub enum DatabaseSetupError {
    #[error("unable to create database directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("unable to open the database: {0}")]
    Unavailable(#[from] sqlx::Error),
    #[error("database migration failed: {0}")]
    MigrationFailed(#[from] sqlx::migrate::MigrateError),
}

fn map_error(err: sqlx::Error) -> MapError {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            MapError::Unavailable(err.to_string())
        }
        other => MapError::Internal(other.to_string()),
    }
}

impl Database {
    /// Open (creating if missing) the database file at `path`.
    pub async fn open(path: &Path) -> Result<Self, DatabaseSetupError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tracing::debug!(?path, "opening replicated map");

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Self::migrate(pool).await
    }

    pub async fn in_memory() -> Result<Self, DatabaseSetupError> {
        let options = SqliteConnectOptions::new().filename(":memory:");
        // every connection to :memory: is its own database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        Self::migrate(pool).await
    }

    async fn migrate(pool: SqlitePool) -> Result<Self, DatabaseSetupError> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl ReplicatedMap for Database {
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), MapError> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        sqlx::query(
            r#"
            INSERT INTO replicated_map (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_error)?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, MapError> {
        let row = sqlx::query("SELECT value FROM replicated_map WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_error)?;
        Ok(row.map(|r| r.get("value")))
    }

    async fn has(&self, key: &str) -> Result<bool, MapError> {
        let row = sqlx::query("SELECT 1 FROM replicated_map WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_error)?;
        Ok(row.is_some())
    }

    async fn query(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, MapError> {
        let rows = sqlx::query(
            r#"
            SELECT key, value FROM replicated_map
            WHERE substr(key, 1, length(?)) = ?
            ORDER BY key
            "#,
        )
        .bind(prefix)
        .bind(prefix)
        .fetch_all(&self.pool)
        .await
        .map_err(map_error)?;

        Ok(rows
            .iter()
            .map(|r| (r.get("key"), r.get("value")))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use common::crypto::SecretKey;
    use common::p2p::{new_p2p_controller, BlockStore, P2PConfig};
    use common::peer::BlobsStore;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_put_get_has() {
        let db = Database::in_memory().await.unwrap();
        assert!(!db.has("a").await.unwrap());
        assert_eq!(db.get("a").await.unwrap(), None);

        db.put("a", b"one".to_vec()).await.unwrap();
        db.put("a", b"two".to_vec()).await.unwrap();
        assert!(db.has("a").await.unwrap());
        assert_eq!(db.get("a").await.unwrap(), Some(b"two".to_vec()));
    }

    #[tokio::test]
    async fn test_query_by_prefix_in_key_order() {
        let db = Database::in_memory().await.unwrap();
        for key in ["/domain/b.example", "/bucket/ff01", "/domain/a.example", "/bucket/00aa"] {
            db.put(key, key.as_bytes().to_vec()).await.unwrap();
        }

        let keys: Vec<String> = db
            .query("/domain/")
            .await
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec!["/domain/a.example", "/domain/b.example"]);

        let all = db.query("").await.unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(all[0].0, "/bucket/00aa");
        assert_eq!(all[0].1, b"/bucket/00aa".to_vec());
    }

    #[tokio::test]
    async fn test_buckets_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("buckets.db");
        let blobs_path = dir.path().join("blobs");
        let key = SecretKey::generate();

        let hash = {
            let map = Arc::new(Database::open(&db_path).await.unwrap());
            let blobs = BlobsStore::fs(&blobs_path).await.unwrap();
            let controller = new_p2p_controller(
                key.clone(),
                map,
                BlockStore::local(blobs),
                P2PConfig::default(),
            );
            controller.create_bucket("kept", None).await.unwrap().hash()
        };

        let map = Arc::new(Database::open(&db_path).await.unwrap());
        assert!(map.has(&format!("/bucket/{}", hash)).await.unwrap());
        let blobs = BlobsStore::fs(&blobs_path).await.unwrap();
        let controller =
            new_p2p_controller(key, map, BlockStore::local(blobs), P2PConfig::default());
        let bucket = controller.load_bucket(&hash).await.unwrap();
        assert_eq!(bucket.name(), "kept");
    }
}
