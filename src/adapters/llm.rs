use anyhow::{Context, Result};
use async_trait::async_trait;

use super::anthropic::Anthropic;
use super::openai::OpenAi;
use crate::config::SharedConfig;

/// A text-generation provider reached by a single synchronous call. The
/// pipeline never retries; the provider either returns the completion text
/// or an error that becomes the job's terminal failure.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextProvider: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}

impl std::fmt::Debug for dyn TextProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TextProvider")
    }
}

/// Resolves a client-supplied model identifier to a provider. An unknown
/// prefix is an error, not a silent default.
pub trait ProviderSelector: Send + Sync {
    fn select(&self, model: &str) -> Result<Box<dyn TextProvider>>;
}

pub struct RuntimeSelector {
    config: SharedConfig,
}

impl RuntimeSelector {
    pub fn new(config: SharedConfig) -> Self {
        Self { config }
    }
}

impl ProviderSelector for RuntimeSelector {
    fn select(&self, model: &str) -> Result<Box<dyn TextProvider>> {
        let keys = self.config.snapshot();
        if model.starts_with("gpt") {
            let api_key = keys
                .openai
                .clone()
                .context("OpenAI API key not provided")?;
            Ok(Box::new(OpenAi::new(api_key, model.to_string())))
        } else if model.starts_with("claude") {
            let api_key = keys
                .anthropic
                .clone()
                .context("Anthropic API key not provided")?;
            Ok(Box::new(Anthropic::new(api_key, model.to_string())))
        } else {
            anyhow::bail!("Unsupported model: {}", model)
        }
    }
}
