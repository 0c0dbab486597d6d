use super::llm::TextProvider;
use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, error, info};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::{json, Value};

const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

pub struct OpenAi {
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAi {
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
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .context("Failed to create Authorization header")?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    fn generate_request_body(&self, sys_prompt: &str, user_prompt: &str) -> Value {
        json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": sys_prompt},
                {"role": "user", "content": user_prompt},
            ],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        })
    }
}

#[async_trait]
impl TextProvider for OpenAi {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let client = reqwest::Client::new();
        let headers = self.generate_headers()?;
        let body = self.generate_request_body(system_prompt, user_prompt);
        let response = client
            .post(CHAT_COMPLETIONS_URL)
            .headers(headers)
            .json(&body)
            .send()
            .await
            .context("Failed to send request to OpenAI API")?;

        if response.status().is_success() {
            let response_value = response
                .json::<Value>()
                .await
                .context("Failed to parse OpenAI API response as JSON")?;
            let content = response_value["choices"][0]["message"]["content"]
                .as_str()
                .context("Failed to extract content from OpenAI API response")?
                .to_string();
            info!("OpenAI API request successful");
            debug!("Response: {:?}", response_value);
            Ok(content)
        } else {
            let error_text = response
                .text()
                .await
                .context("Failed to get error text from OpenAI API")?;
            error!("OpenAI API request failed: {}", error_text);
            anyhow::bail!("OpenAI API request failed: {}", error_text)
        }
    }
}
