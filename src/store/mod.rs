use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod layered;
pub mod memory;
pub mod sqlite;

pub use layered::LayeredStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

/// One app-generation request and its lifecycle record. The pipeline is the
/// only writer after creation; status advances pending -> in_progress ->
/// completed | failed and never reverts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationJob {
    pub id: String,
    pub status: JobStatus,
    pub logs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub app_description: String,
    pub model: String,
    pub created_at: DateTime<Utc>,
}

impl GenerationJob {
    pub fn new(app_description: String, model: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            status: JobStatus::Pending,
            logs: Vec::new(),
            zip_url: None,
            error: None,
            app_description,
            model,
            created_at: Utc::now(),
        }
    }

    pub fn apply(&mut self, update: &JobUpdate) {
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(zip_url) = &update.zip_url {
            self.zip_url = Some(zip_url.clone());
        }
        if let Some(error) = &update.error {
            self.error = Some(error.clone());
        }
        self.logs.extend(update.logs.iter().cloned());
    }
}

/// A single logical change to a job record: scalar field assignments plus
/// log lines appended in the same call.
#[derive(Debug, Clone, Default)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub zip_url: Option<String>,
    pub error: Option<String>,
    pub logs: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TryOnRecord {
    pub id: String,
    pub result_image: String,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait JobStore: Send + Sync {
    async fn create(&self, job: GenerationJob) -> Result<()>;
    async fn get(&self, id: &str) -> Result<Option<GenerationJob>>;
    async fn update(&self, id: &str, update: JobUpdate) -> Result<()>;
}

#[async_trait]
pub trait TryOnStore: Send + Sync {
    async fn insert(&self, record: TryOnRecord) -> Result<()>;
    /// Stored try-on results, newest first.
    async fn history(&self) -> Result<Vec<TryOnRecord>>;
}

pub trait RecordStore: JobStore + TryOnStore {}

impl<T: JobStore + TryOnStore> RecordStore for T {}
