use super::llm::TextProvider;
use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, error, info};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde_json::{json, Value};

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct Anthropic {
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl Anthropic {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            temperature: 0.7,
            max_tokens: 4000,
        }
    }

    fn generate_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&self.api_key).context("Failed to create x-api-key header")?,
        );
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    fn generate_request_body(&self, sys_prompt: &str, user_prompt: &str) -> Value {
        // The messages API takes the system prompt as a top-level field.
        json!({
            "model": self.model,
            "system": sys_prompt,
            "messages": [
                {"role": "user", "content": user_prompt},
            ],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        })
    }
}

#[async_trait]
impl TextProvider for Anthropic {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let client = reqwest::Client::new();
        let headers = self.generate_headers()?;
        let body = self.generate_request_body(system_prompt, user_prompt);
        let response = client
            .post(MESSAGES_URL)
            .headers(headers)
            .json(&body)
            .send()
            .await
            .context("Failed to send request to Anthropic API")?;

        if response.status().is_success() {
            let response_value = response
                .json::<Value>()
                .await
                .context("Failed to parse Anthropic API response as JSON")?;
            let content = response_value["content"][0]["text"]
                .as_str()
                .context("Failed to extract content from Anthropic API response")?
                .to_string();
            info!("Anthropic API request successful");
            debug!("Response: {:?}", response_value);
            Ok(content)
        } else {
            let error_text = response
                .text()
                .await
                .context("Failed to get error text from Anthropic API")?;
            error!("Anthropic API request failed: {}", error_text);
            anyhow::bail!("Anthropic API request failed: {}", error_text)
        }
    }
}
