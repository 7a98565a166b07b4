use async_trait::async_trait;
use ss_core::{Chunk, Error, Result, ScoredChunk, VectorStorage};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use sqlx::Row;
use std::path::{Path, PathBuf};
use tracing::debug;
use crate::{check_lengths, validate_collection};
use super::rank_chunks;

pub const DATABASE_FILE: &str = "chunks.db";

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS chunks (
        collection TEXT NOT NULL,
        chunk_id TEXT NOT NULL,
        text TEXT NOT NULL,
        position INTEGER NOT NULL,
        embedding TEXT NOT NULL,
        PRIMARY KEY (collection, chunk_id)
    )
    "#,
];

fn storage_error(context: &str, e: sqlx::Error) -> Error {
    Error::Storage(format!("{}: {}", context, e))
}

/// SQLite-backed store; `root` is a directory holding `chunks.db`.
pub struct DiskStorage {
    pool: SqlitePool,
    root: PathBuf,
}

impl DiskStorage {
    pub async fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root).await?;

        let options = SqliteConnectOptions::new()
            .filename(root.join(DATABASE_FILE))
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| storage_error("Failed to open database", e))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| storage_error(&format!("Failed to run migration {}", i), e))?;
        }

        debug!("Opened disk vector store at {}", root.display());
        Ok(Self { pool, root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn collection_len(&self, collection: &str) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunks WHERE collection = ?")
            .bind(collection)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to count chunks", e))?;
        Ok(count as usize)
    }
}

#[async_trait]
impl VectorStorage for DiskStorage {
    async fn store_chunks(&self, collection: &str, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<()> {
        validate_collection(collection)?;
        check_lengths(chunks.len(), embeddings.len())?;

        // One transaction per call: a failed batch leaves the collection untouched.
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| storage_error("Failed to start transaction", e))?;
        for (chunk, embedding) in chunks.iter().zip(embeddings) {
            sqlx::query(
                r#"
                INSERT OR REPLACE INTO chunks
                (collection, chunk_id, text, position, embedding)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(collection)
            .bind(&chunk.id)
            .bind(&chunk.text)
            .bind(chunk.position as i64)
            .bind(serde_json::to_string(embedding)?)
            .execute(&mut *tx)
            .await
            .map_err(|e| storage_error("Failed to store chunk", e))?;
        }
        tx.commit()
            .await
            .map_err(|e| storage_error("Failed to commit chunks", e))?;

        debug!("Stored {} chunks in {}", chunks.len(), collection);
        Ok(())
    }

    async fn find_similar(&self, collection: &str, embedding: &[f32], limit: usize) -> Result<Vec<ScoredChunk>> {
        validate_collection(collection)?;
        let rows = sqlx::query("SELECT chunk_id, text, position, embedding FROM chunks WHERE collection = ?")
            .bind(collection)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to load chunks", e))?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let read = |e| storage_error("Malformed chunk row", e);
            let position: i64 = row.try_get("position").map_err(read)?;
            let stored: String = row.try_get("embedding").map_err(read)?;
            let chunk = Chunk {
                id: row.try_get("chunk_id").map_err(read)?,
                text: row.try_get("text").map_err(read)?,
                position: position as usize,
            };
            let stored: Vec<f32> = serde_json::from_str(&stored)?;
            entries.push((chunk, stored));
        }

        Ok(rank_chunks(entries.iter().map(|(c, e)| (c, e)), embedding, limit))
    }

    async fn drop_collection(&self, collection: &str) -> Result<()> {
        validate_collection(collection)?;
        sqlx::query("DELETE FROM chunks WHERE collection = ?")
            .bind(collection)
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to drop collection", e))?;
        Ok(())
    }

    fn name(&self) -> &str {
        "disk"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn chunk(id: &str, text: &str, position: usize) -> Chunk {
        Chunk {
            id: id.to_string(),
            text: text.to_string(),
            position,
        }
    }

    #[tokio::test]
    async fn test_disk_storage_persists_between_instances() {
        let dir = tempdir().unwrap();
        {
            let storage = DiskStorage::open(dir.path()).await.unwrap();
            storage
                .store_chunks(
                    "articles",
                    &[chunk("a", "Typhoon Carina", 0), chunk("b", "Gilas lineup", 1)],
                    &[vec![1.0, 0.0], vec![0.0, 1.0]],
                )
                .await
                .unwrap();
        }

        let reopened = DiskStorage::open(dir.path()).await.unwrap();
        let hits = reopened.find_similar("articles", &[1.0, 0.1], 1).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk.text, "Typhoon Carina");
        assert_eq!(hits[0].chunk.position, 0);
    }

    #[tokio::test]
    async fn test_restoring_a_chunk_replaces_it() {
        let dir = tempdir().unwrap();
        let storage = DiskStorage::open(dir.path()).await.unwrap();
        storage.store_chunks("articles", &[chunk("a", "old", 0)], &[vec![1.0]]).await.unwrap();
        storage.store_chunks("articles", &[chunk("a", "new", 0)], &[vec![1.0]]).await.unwrap();

        assert_eq!(storage.collection_len("articles").await.unwrap(), 1);
        let hits = storage.find_similar("articles", &[1.0], 5).await.unwrap();
        assert_eq!(hits[0].chunk.text, "new");
    }

    #[tokio::test]
    async fn test_drop_collection_removes_rows() {
        let dir = tempdir().unwrap();
        let storage = DiskStorage::open(dir.path().join("nested/store")).await.unwrap();
        storage.store_chunks("tmp", &[chunk("a", "x", 0)], &[vec![1.0]]).await.unwrap();
        storage.store_chunks("keep", &[chunk("a", "y", 0)], &[vec![1.0]]).await.unwrap();
        assert!(storage.root().join(DATABASE_FILE).exists());

        storage.drop_collection("tmp").await.unwrap();
        assert_eq!(storage.collection_len("tmp").await.unwrap(), 0);
        assert_eq!(storage.collection_len("keep").await.unwrap(), 1);
        // Dropping twice is fine
        storage.drop_collection("tmp").await.unwrap();
        assert!(storage.find_similar("tmp", &[1.0], 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mismatched_batch_stores_nothing() {
        let dir = tempdir().unwrap();
        let storage = DiskStorage::open(dir.path()).await.unwrap();
        let result = storage
            .store_chunks("articles", &[chunk("a", "x", 0), chunk("b", "y", 1)], &[vec![1.0]])
            .await;
        assert!(result.is_err());
        assert_eq!(storage.collection_len("articles").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_rejects_path_like_collections() {
        let dir = tempdir().unwrap();
        let storage = DiskStorage::open(dir.path()).await.unwrap();
        assert!(storage.store_chunks("../escape", &[], &[]).await.is_err());
    }
}
