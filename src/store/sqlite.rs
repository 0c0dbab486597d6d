use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

use super::{GenerationJob, JobStore, JobUpdate, TryOnRecord, TryOnStore};

/// Durable layer backed by sqlite. Records are stored as JSON rows keyed by
/// id; every call opens its own connection inside `spawn_blocking`.
pub struct SqliteStore {
    db_path: PathBuf,
}

impl SqliteStore {
    pub fn open(db_path: PathBuf) -> Result<Self> {
        init_db(&db_path)?;
        Ok(Self { db_path })
    }
}

fn init_db(db_path: &Path) -> Result<()> {
    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open sqlite db at {}", db_path.display()))?;

    conn.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS generation_jobs (
  id TEXT PRIMARY KEY,
  record TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tryon_results (
  id TEXT PRIMARY KEY,
  record TEXT NOT NULL,
  created_at_ms INTEGER NOT NULL
);
        "#,
    )
    .context("Failed to init sqlite schema")?;

    Ok(())
}

#[async_trait]
impl JobStore for SqliteStore {
    async fn create(&self, job: GenerationJob) -> Result<()> {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let conn = Connection::open(&db_path)?;
            let record = serde_json::to_string(&job).context("Failed to serialize job record")?;
            conn.execute(
                "INSERT OR REPLACE INTO generation_jobs (id, record) VALUES (?1, ?2)",
                params![&job.id, &record],
            )?;
            Ok(())
        })
        .await
        .context("sqlite create task failed")?
    }

    async fn get(&self, id: &str) -> Result<Option<GenerationJob>> {
        let db_path = self.db_path.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || -> Result<Option<GenerationJob>> {
            let conn = Connection::open(&db_path)?;
            let record: Option<String> = conn
                .query_row(
                    "SELECT record FROM generation_jobs WHERE id = ?1",
                    [&id],
                    |row| row.get(0),
                )
                .optional()?;
            match record {
                Some(record) => {
                    let job = serde_json::from_str(&record)
                        .context("Failed to deserialize job record")?;
                    Ok(Some(job))
                }
                None => Ok(None),
            }
        })
        .await
        .context("sqlite get task failed")?
    }

    async fn update(&self, id: &str, update: JobUpdate) -> Result<()> {
        let db_path = self.db_path.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let conn = Connection::open(&db_path)?;
            let record: Option<String> = conn
                .query_row(
                    "SELECT record FROM generation_jobs WHERE id = ?1",
                    [&id],
                    |row| row.get(0),
                )
                .optional()?;
            let Some(record) = record else {
                bail!("Unknown generation id: {}", id);
            };

            let mut job: GenerationJob =
                serde_json::from_str(&record).context("Failed to deserialize job record")?;
            job.apply(&update);
            let record = serde_json::to_string(&job).context("Failed to serialize job record")?;
            conn.execute(
                "UPDATE generation_jobs SET record = ?1 WHERE id = ?2",
                params![&record, &id],
            )?;
            Ok(())
        })
        .await
        .context("sqlite update task failed")?
    }
}

#[async_trait]
impl TryOnStore for SqliteStore {
    async fn insert(&self, record: TryOnRecord) -> Result<()> {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let conn = Connection::open(&db_path)?;
            let json =
                serde_json::to_string(&record).context("Failed to serialize try-on record")?;
            conn.execute(
                "INSERT OR REPLACE INTO tryon_results (id, record, created_at_ms) VALUES (?1, ?2, ?3)",
                params![&record.id, &json, record.created_at.timestamp_millis()],
            )?;
            Ok(())
        })
        .await
        .context("sqlite insert task failed")?
    }

    async fn history(&self) -> Result<Vec<TryOnRecord>> {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<TryOnRecord>> {
            let conn = Connection::open(&db_path)?;
            let mut stmt = conn.prepare(
                "SELECT record FROM tryon_results ORDER BY created_at_ms DESC LIMIT 200",
            )?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

            let mut records = Vec::new();
            for row in rows {
                let json = row?;
                let record = serde_json::from_str(&json)
                    .context("Failed to deserialize try-on record")?;
                records.push(record);
            }
            Ok(records)
        })
        .await
        .context("sqlite history task failed")?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::JobStatus;

    fn temp_store() -> (tempfile::TempDir, SqliteStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("test.sqlite3")).unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn jobs_survive_a_create_update_get_cycle() {
        let (_dir, store) = temp_store();
        let job = GenerationJob::new("chat app".to_string(), "claude-3-opus".to_string());
        let id = job.id.clone();

        store.create(job).await.unwrap();
        store
            .update(
                &id,
                JobUpdate {
                    status: Some(JobStatus::Completed),
                    zip_url: Some(format!("/api/download/{id}")),
                    logs: vec!["Created ZIP archive of generated code.".to_string()],
                    ..JobUpdate::default()
                },
            )
            .await
            .unwrap();

        let found = store.get(&id).await.unwrap().unwrap();
        assert_eq!(found.status, JobStatus::Completed);
        assert_eq!(found.zip_url, Some(format!("/api/download/{id}")));
        assert_eq!(found.logs.len(), 1);
    }

    #[tokio::test]
    async fn get_of_unknown_id_is_none() {
        let (_dir, store) = temp_store();
        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_of_unknown_id_fails() {
        let (_dir, store) = temp_store();
        assert!(store.update("missing", JobUpdate::default()).await.is_err());
    }
}
