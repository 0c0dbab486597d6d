use anyhow::{Context, Result};
use log::{error, info};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use super::archive::write_archive;
use super::extract::extract_code_files;
use super::prompt::{build_prompt, SYSTEM_PROMPT};
use crate::adapters::llm::ProviderSelector;
use crate::store::{JobStatus, JobStore, JobUpdate};

/// Runs one generation job to a terminal status. Spawned as a detached task
/// after the HTTP layer has created the job record; the status store is the
/// only channel back to the client.
#[derive(Clone)]
pub struct Pipeline {
    store: Arc<dyn JobStore>,
    selector: Arc<dyn ProviderSelector>,
    generated_root: PathBuf,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn JobStore>,
        selector: Arc<dyn ProviderSelector>,
        generated_root: PathBuf,
    ) -> Self {
        Self {
            store,
            selector,
            generated_root,
        }
    }

    pub async fn run(&self, job_id: &str, app_description: &str, model: &str) {
        if let Err(err) = self.execute(job_id, app_description, model).await {
            error!("Generation {} failed: {:#}", job_id, err);
            let failure = JobUpdate {
                status: Some(JobStatus::Failed),
                error: Some(err.to_string()),
                logs: vec![format!("Error: {err}")],
                ..JobUpdate::default()
            };
            if let Err(store_err) = self.store.update(job_id, failure).await {
                error!("Failed to record failure for {}: {:#}", job_id, store_err);
            }
            // The failed job's working directory is removed; the record stays
            // around for polling.
            let workdir = self.generated_root.join(job_id);
            if workdir.exists() {
                if let Err(fs_err) = fs::remove_dir_all(&workdir) {
                    error!("Failed to clean up {}: {}", workdir.display(), fs_err);
                }
            }
        }
    }

    async fn execute(&self, job_id: &str, app_description: &str, model: &str) -> Result<()> {
        self.store
            .update(
                job_id,
                JobUpdate {
                    status: Some(JobStatus::InProgress),
                    logs: vec!["Starting code generation...".to_string()],
                    ..JobUpdate::default()
                },
            )
            .await?;

        let prompt = build_prompt(app_description);
        self.log(job_id, format!("Sending request to AI model: {model}..."))
            .await?;

        let provider = self.selector.select(model)?;
        let response_text = provider.complete(SYSTEM_PROMPT, &prompt).await?;

        self.log(job_id, "AI response received. Parsing generated code...")
            .await?;

        let files = extract_code_files(&response_text);
        if files.is_empty() {
            anyhow::bail!("No valid code files found in the AI response");
        }
        self.log(
            job_id,
            format!(
                "Found {} files in AI response. Creating file structure...",
                files.len()
            ),
        )
        .await?;

        let workdir = self.generated_root.join(job_id);
        fs::create_dir_all(&workdir)
            .with_context(|| format!("Failed to create working directory for {job_id}"))?;

        for file in &files {
            let file_path = workdir.join(&file.path);
            if let Some(parent) = file_path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directories for {}", file.path))?;
            }
            fs::write(&file_path, &file.content)
                .with_context(|| format!("Failed to write {}", file.path))?;
            self.log(job_id, format!("Created file: {}", file.path))
                .await?;
        }

        let archive_path = self.generated_root.join(format!("{job_id}.zip"));
        write_archive(&workdir, &archive_path)?;
        self.log(job_id, "Created ZIP archive of generated code.")
            .await?;

        self.store
            .update(
                job_id,
                JobUpdate {
                    status: Some(JobStatus::Completed),
                    zip_url: Some(format!("/api/download/{job_id}")),
                    ..JobUpdate::default()
                },
            )
            .await?;
        info!("Generation {} completed with {} files", job_id, files.len());
        Ok(())
    }

    async fn log(&self, job_id: &str, line: impl Into<String>) -> Result<()> {
        self.store
            .update(
                job_id,
                JobUpdate {
                    logs: vec![line.into()],
                    ..JobUpdate::default()
                },
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::llm::{MockTextProvider, TextProvider};
    use crate::store::{GenerationJob, MemoryStore};
    use std::io::Read;

    /// Selector that hands out a mocked provider with a canned completion.
    struct CannedSelector {
        response: String,
    }

    impl ProviderSelector for CannedSelector {
        fn select(&self, _model: &str) -> Result<Box<dyn TextProvider>> {
            let response = self.response.clone();
            let mut provider = MockTextProvider::new();
            provider
                .expect_complete()
                .returning(move |_, _| Ok(response.clone()));
            Ok(Box::new(provider))
        }
    }

    async fn run_pipeline(
        response: &str,
        root: &std::path::Path,
    ) -> (Arc<MemoryStore>, GenerationJob) {
        let store = Arc::new(MemoryStore::new());
        let job = GenerationJob::new("todo app".to_string(), "gpt-4".to_string());
        let id = job.id.clone();
        store.create(job).await.unwrap();

        let pipeline = Pipeline::new(
            store.clone(),
            Arc::new(CannedSelector {
                response: response.to_string(),
            }),
            root.to_path_buf(),
        );
        pipeline.run(&id, "todo app", "gpt-4").await;

        let job = store.get(&id).await.unwrap().unwrap();
        (store, job)
    }

    #[tokio::test]
    async fn two_fenced_blocks_complete_with_a_matching_archive() {
        let dir = tempfile::tempdir().unwrap();
        let response = "```filename: index.html\n<h1>Todo</h1>\n```\n\
```filename: app.js\nconsole.log(\"todo\");\n```\n";
        let (_store, job) = run_pipeline(response, dir.path()).await;

        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.zip_url, Some(format!("/api/download/{}", job.id)));
        assert!(job.error.is_none());
        assert!(job
            .logs
            .iter()
            .any(|line| line == "Created file: index.html"));

        let archive_path = dir.path().join(format!("{}.zip", job.id));
        let mut archive =
            zip::ZipArchive::new(std::fs::File::open(&archive_path).unwrap()).unwrap();
        let mut content = String::new();
        archive
            .by_name("index.html")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "<h1>Todo</h1>");
        assert_eq!(archive.len(), 2);
    }

    #[tokio::test]
    async fn response_without_delimiters_fails_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let (_store, job) = run_pipeline("I cannot produce files right now.", dir.path()).await;

        assert_eq!(job.status, JobStatus::Failed);
        let error = job.error.unwrap();
        assert!(error.contains("No valid code files found"));
        assert!(job.logs.iter().any(|line| line.starts_with("Error:")));
        assert!(!dir.path().join(&job.id).exists());
        assert!(!dir.path().join(format!("{}.zip", job.id)).exists());
    }

    #[tokio::test]
    async fn unsupported_model_is_a_terminal_failure() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::new());
        let job = GenerationJob::new("todo app".to_string(), "mistral-7b".to_string());
        let id = job.id.clone();
        store.create(job).await.unwrap();

        let config = crate::config::SharedConfig::new(crate::config::ApiKeys::default());
        let pipeline = Pipeline::new(
            store.clone(),
            Arc::new(crate::adapters::llm::RuntimeSelector::new(config)),
            dir.path().to_path_buf(),
        );
        pipeline.run(&id, "todo app", "mistral-7b").await;

        let job = store.get(&id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error.as_deref(), Some("Unsupported model: mistral-7b"));
    }

    #[tokio::test]
    async fn log_lines_appear_in_phase_order() {
        let dir = tempfile::tempdir().unwrap();
        let response = "```filename: index.html\n<h1>Todo</h1>\n```\n";
        let (_store, job) = run_pipeline(response, dir.path()).await;

        let expected = [
            "Starting code generation...",
            "Sending request to AI model: gpt-4...",
            "AI response received. Parsing generated code...",
            "Found 1 files in AI response. Creating file structure...",
            "Created file: index.html",
            "Created ZIP archive of generated code.",
        ];
        assert_eq!(job.logs, expected);
    }
}
