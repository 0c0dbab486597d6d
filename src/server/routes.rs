use anyhow::Context;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use super::error::{AppError, AppResult};
use super::AppState;
use crate::config::KeyUpdate;
use crate::core::pipeline::Pipeline;
use crate::core::tryon::run_try_on;
use crate::store::{GenerationJob, JobStatus, JobStore, TryOnRecord, TryOnStore};

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Hello World", "status": "API is operational" }))
}

#[derive(Debug, Deserialize)]
pub struct AppGenerationRequest {
    #[serde(rename = "appDescription")]
    pub app_description: String,
    #[serde(default = "default_model")]
    pub model: String,
}

fn default_model() -> String {
    "gpt-4".to_string()
}

#[derive(Debug, Serialize)]
pub struct AppGenerationResponse {
    #[serde(rename = "generationId")]
    pub generation_id: String,
}

pub async fn generate_app(
    State(state): State<AppState>,
    Json(request): Json<AppGenerationRequest>,
) -> AppResult<Json<AppGenerationResponse>> {
    let keys = state.config.snapshot();
    if request.model.starts_with("gpt") && keys.openai.is_none() {
        return Err(AppError::BadRequest(
            "OpenAI API key not configured".to_string(),
        ));
    }
    if request.model.starts_with("claude") && keys.anthropic.is_none() {
        return Err(AppError::BadRequest(
            "Anthropic API key not configured".to_string(),
        ));
    }
    if request.app_description.trim().is_empty() {
        return Err(AppError::BadRequest(
            "App description cannot be empty".to_string(),
        ));
    }

    let job = GenerationJob::new(request.app_description.clone(), request.model.clone());
    let generation_id = job.id.clone();
    state.store.create(job).await?;

    let pipeline = Pipeline::new(
        state.store.clone() as Arc<dyn JobStore>,
        state.selector.clone(),
        state.generated_root.clone(),
    );
    let job_id = generation_id.clone();
    info!("Accepted generation {} for model {}", job_id, request.model);
    tokio::spawn(async move {
        pipeline
            .run(&job_id, &request.app_description, &request.model)
            .await;
    });

    Ok(Json(AppGenerationResponse { generation_id }))
}

pub async fn generation_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<GenerationJob>> {
    match state.store.get(&id).await? {
        Some(job) => Ok(Json(job)),
        None => Err(AppError::NotFound("Generation ID not found".to_string())),
    }
}

pub async fn download(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let completed = matches!(
        state.store.get(&id).await?,
        Some(job) if job.status == JobStatus::Completed
    );
    if !completed {
        return Err(AppError::NotFound("Generated ZIP not found".to_string()));
    }

    let zip_path = state.generated_root.join(format!("{id}.zip"));
    if !zip_path.exists() {
        return Err(AppError::NotFound("ZIP file not found".to_string()));
    }
    let bytes = tokio::fs::read(&zip_path)
        .await
        .context("Failed to read ZIP archive")?;

    let headers = [
        (header::CONTENT_TYPE, "application/zip".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"generated_app_{id}.zip\""),
        ),
    ];
    Ok((headers, bytes).into_response())
}

pub async fn setup_api_keys(
    State(state): State<AppState>,
    Json(update): Json<KeyUpdate>,
) -> Json<Value> {
    state.config.apply(update);
    Json(json!({ "message": "API keys updated successfully" }))
}

#[derive(Debug, Deserialize)]
pub struct TryOnRequest {
    pub person_image: String,
    pub clothing_image: String,
}

#[derive(Debug, Serialize)]
pub struct TryOnResponse {
    pub id: String,
    pub result_image: String,
}

pub async fn try_on(
    State(state): State<AppState>,
    Json(request): Json<TryOnRequest>,
) -> AppResult<Json<TryOnResponse>> {
    if request.person_image.trim().is_empty() || request.clothing_image.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Both a person image and a clothing image are required".to_string(),
        ));
    }

    let record = run_try_on(
        state.tryon.as_ref(),
        &*state.store,
        &request.person_image,
        &request.clothing_image,
    )
    .await?;

    Ok(Json(TryOnResponse {
        id: record.id,
        result_image: record.result_image,
    }))
}

pub async fn try_on_history(State(state): State<AppState>) -> AppResult<Json<Vec<TryOnRecord>>> {
    let history = state.store.history().await?;
    Ok(Json(history))
}
