use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, error, info};
use serde_json::{json, Value};

/// External image-generation service that composites a clothing item onto a
/// person photo. One synchronous call, base64 images in, base64 image out.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TryOnProvider: Send + Sync {
    async fn transform(&self, person_image: &str, clothing_image: &str) -> Result<String>;
}

pub struct HttpTryOnProvider {
    endpoint: Option<String>,
}

impl HttpTryOnProvider {
    pub fn new(endpoint: Option<String>) -> Self {
        Self { endpoint }
    }
}

#[async_trait]
impl TryOnProvider for HttpTryOnProvider {
    async fn transform(&self, person_image: &str, clothing_image: &str) -> Result<String> {
        let endpoint = self
            .endpoint
            .as_deref()
            .context("Try-on API endpoint not configured")?;

        let client = reqwest::Client::new();
        let body = json!({
            "person_image": person_image,
            "clothing_image": clothing_image,
        });
        let response = client
            .post(endpoint)
            .json(&body)
            .send()
            .await
            .context("Failed to send request to try-on API")?;

        if response.status().is_success() {
            let response_value = response
                .json::<Value>()
                .await
                .context("Failed to parse try-on API response as JSON")?;
            let result_image = response_value["result_image"]
                .as_str()
                .context("Failed to extract result image from try-on API response")?
                .to_string();
            info!("Try-on API request successful");
            debug!("Response: {:?}", response_value);
            Ok(result_image)
        } else {
            let error_text = response
                .text()
                .await
                .context("Failed to get error text from try-on API")?;
            error!("Try-on API request failed: {}", error_text);
            anyhow::bail!("Try-on API request failed: {}", error_text)
        }
    }
}
