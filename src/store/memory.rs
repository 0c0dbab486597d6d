use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use super::{GenerationJob, JobStore, JobUpdate, TryOnRecord, TryOnStore};

/// Authoritative process-local store. Updates are atomic per record; a job
/// is only ever written by its one pipeline task, so no finer locking is
/// needed.
#[derive(Default)]
pub struct MemoryStore {
    jobs: RwLock<HashMap<String, GenerationJob>>,
    tryons: RwLock<Vec<TryOnRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn create(&self, job: GenerationJob) -> Result<()> {
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        jobs.insert(job.id.clone(), job);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<GenerationJob>> {
        let jobs = self.jobs.read().unwrap_or_else(PoisonError::into_inner);
        Ok(jobs.get(id).cloned())
    }

    async fn update(&self, id: &str, update: JobUpdate) -> Result<()> {
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        match jobs.get_mut(id) {
            Some(job) => {
                job.apply(&update);
                Ok(())
            }
            None => bail!("Unknown generation id: {}", id),
        }
    }
}

#[async_trait]
impl TryOnStore for MemoryStore {
    async fn insert(&self, record: TryOnRecord) -> Result<()> {
        let mut tryons = self.tryons.write().unwrap_or_else(PoisonError::into_inner);
        tryons.push(record);
        Ok(())
    }

    async fn history(&self) -> Result<Vec<TryOnRecord>> {
        let tryons = self.tryons.read().unwrap_or_else(PoisonError::into_inner);
        Ok(tryons.iter().rev().cloned().collect())
    }
}
