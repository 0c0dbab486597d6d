use anyhow::{Context, Result};
use chrono::Utc;
use uuid::Uuid;

use crate::adapters::tryon::TryOnProvider;
use crate::store::{TryOnRecord, TryOnStore};

/// One synchronous try-on transform: call the provider, persist the result,
/// hand the record back to the caller.
pub async fn run_try_on(
    provider: &dyn TryOnProvider,
    store: &dyn TryOnStore,
    person_image: &str,
    clothing_image: &str,
) -> Result<TryOnRecord> {
    let result_image = provider
        .transform(person_image, clothing_image)
        .await
        .context("Try-on generation failed")?;

    let record = TryOnRecord {
        id: Uuid::new_v4().to_string(),
        result_image,
        created_at: Utc::now(),
    };
    store
        .insert(record.clone())
        .await
        .context("Failed to store try-on result")?;
    Ok(record)
}
