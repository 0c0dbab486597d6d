use anyhow::Result;
use async_trait::async_trait;
use log::warn;
use std::sync::Arc;

use super::{
    GenerationJob, JobStore, JobUpdate, MemoryStore, RecordStore, TryOnRecord, TryOnStore,
};

/// Two cooperating backing layers: the in-memory store is authoritative and
/// always written; the durable layer is advisory. Durable write failures are
/// logged and swallowed, and reads prefer the durable layer but fall back to
/// memory on a miss or an error.
pub struct LayeredStore {
    memory: MemoryStore,
    durable: Option<Arc<dyn RecordStore>>,
}

impl LayeredStore {
    pub fn new(durable: Option<Arc<dyn RecordStore>>) -> Self {
        Self {
            memory: MemoryStore::new(),
            durable,
        }
    }

    pub fn memory_only() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl JobStore for LayeredStore {
    async fn create(&self, job: GenerationJob) -> Result<()> {
        self.memory.create(job.clone()).await?;
        if let Some(durable) = &self.durable {
            if let Err(err) = durable.create(job).await {
                warn!("Failed to store generation status in durable store: {err:#}");
            }
        }
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<GenerationJob>> {
        if let Some(durable) = &self.durable {
            match durable.get(id).await {
                Ok(Some(job)) => return Ok(Some(job)),
                Ok(None) => {}
                Err(err) => warn!("Failed to read generation status from durable store: {err:#}"),
            }
        }
        self.memory.get(id).await
    }

    async fn update(&self, id: &str, update: JobUpdate) -> Result<()> {
        self.memory.update(id, update.clone()).await?;
        if let Some(durable) = &self.durable {
            if let Err(err) = durable.update(id, update).await {
                warn!("Failed to update generation status in durable store: {err:#}");
            }
        }
        Ok(())
    }
}

#[async_trait]
impl TryOnStore for LayeredStore {
    async fn insert(&self, record: TryOnRecord) -> Result<()> {
        self.memory.insert(record.clone()).await?;
        if let Some(durable) = &self.durable {
            if let Err(err) = durable.insert(record).await {
                warn!("Failed to store try-on result in durable store: {err:#}");
            }
        }
        Ok(())
    }

    async fn history(&self) -> Result<Vec<TryOnRecord>> {
        if let Some(durable) = &self.durable {
            match durable.history().await {
                Ok(records) => return Ok(records),
                Err(err) => warn!("Failed to read try-on history from durable store: {err:#}"),
            }
        }
        self.memory.history().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::JobStatus;
    use anyhow::bail;

    /// Durable layer that rejects every call, for exercising the
    /// swallow-and-fall-back contract.
    struct BrokenStore;

    #[async_trait]
    impl JobStore for BrokenStore {
        async fn create(&self, _job: GenerationJob) -> Result<()> {
            bail!("disk on fire")
        }
        async fn get(&self, _id: &str) -> Result<Option<GenerationJob>> {
            bail!("disk on fire")
        }
        async fn update(&self, _id: &str, _update: JobUpdate) -> Result<()> {
            bail!("disk on fire")
        }
    }

    #[async_trait]
    impl TryOnStore for BrokenStore {
        async fn insert(&self, _record: TryOnRecord) -> Result<()> {
            bail!("disk on fire")
        }
        async fn history(&self) -> Result<Vec<TryOnRecord>> {
            bail!("disk on fire")
        }
    }

    #[tokio::test]
    async fn durable_failures_never_surface_to_the_caller() {
        let store = LayeredStore::new(Some(Arc::new(BrokenStore)));
        let job = GenerationJob::new("todo app".to_string(), "gpt-4".to_string());
        let id = job.id.clone();

        store.create(job).await.unwrap();
        store
            .update(
                &id,
                JobUpdate {
                    status: Some(JobStatus::InProgress),
                    logs: vec!["Starting code generation...".to_string()],
                    ..JobUpdate::default()
                },
            )
            .await
            .unwrap();

        // Read falls back to the in-memory layer.
        let found = store.get(&id).await.unwrap().unwrap();
        assert_eq!(found.status, JobStatus::InProgress);
        assert_eq!(found.logs, vec!["Starting code generation...".to_string()]);
    }

    #[tokio::test]
    async fn reads_prefer_the_durable_layer() {
        let durable = Arc::new(MemoryStore::new());
        let mut job = GenerationJob::new("todo app".to_string(), "gpt-4".to_string());
        let id = job.id.clone();
        job.status = JobStatus::Completed;
        durable.create(job).await.unwrap();

        // Nothing was ever written through the layered store's memory layer,
        // so a hit can only come from the durable side.
        let store = LayeredStore::new(Some(durable));
        let found = store.get(&id).await.unwrap().unwrap();
        assert_eq!(found.status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn try_on_history_falls_back_on_durable_errors() {
        let store = LayeredStore::new(Some(Arc::new(BrokenStore)));
        store
            .insert(TryOnRecord {
                id: "r1".to_string(),
                result_image: "data:image/png;base64,AAAA".to_string(),
                created_at: chrono::Utc::now(),
            })
            .await
            .unwrap();

        let history = store.history().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, "r1");
    }
}
