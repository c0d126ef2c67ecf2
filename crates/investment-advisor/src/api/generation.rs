//! Text generation through an `advisor-llm` provider

use super::TextGenerator;
use crate::config::AdvisorConfig;
use crate::error::{AdvisorError, Result};
use crate::retry::RetryPolicy;
use advisor_llm::providers::{OpenAIConfig, OpenAIProvider};
use advisor_llm::{CompletionRequest, LLMError, LLMProvider, Message};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// [`TextGenerator`] backed by any chat-completion provider
pub struct LlmTextGenerator {
    provider: Arc<dyn LLMProvider>,
    model: String,
    temperature: f32,
    max_tokens: usize,
    retry: RetryPolicy,
}

impl LlmTextGenerator {
    pub fn new(provider: Arc<dyn LLMProvider>, model: impl Into<String>) -> Self {
        let defaults = AdvisorConfig::default();
        Self {
            provider,
            model: model.into(),
            temperature: defaults.temperature,
            max_tokens: defaults.max_tokens,
            retry: RetryPolicy::default(),
        }
    }

    /// Groq-compatible provider configured from `config`
    pub fn from_config(config: &AdvisorConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| AdvisorError::Config("GROQ_API_KEY is not set".to_string()))?;

        let provider_config = OpenAIConfig::new(api_key)
            .with_api_base(config.api_base.clone())
            .with_timeout(config.request_timeout.as_secs().max(1));
        let provider = OpenAIProvider::with_config(provider_config)?;

        Ok(Self::new(Arc::new(provider), config.model.clone())
            .with_temperature(config.temperature)
            .with_max_tokens(config.max_tokens)
            .with_retry(config.retry_policy()))
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn complete_once(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let request = CompletionRequest::builder(&self.model)
            .system(system_prompt)
            .add_message(Message::user(user_prompt))
            .max_tokens(self.max_tokens)
            .temperature(self.temperature)
            .build();

        let response = self.provider.complete(request).await?;
        debug!(
            "{} completion: {:?}, {} tokens",
            self.provider.name(),
            response.stop_reason,
            response.usage.total()
        );

        let text = response.text().trim();
        if text.is_empty() {
            return Err(LLMError::UnexpectedResponse("empty completion".to_string()).into());
        }
        Ok(text.to_string())
    }
}

#[async_trait]
impl TextGenerator for LlmTextGenerator {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        self.retry
            .execute("generate", || self.complete_once(system_prompt, user_prompt))
            .await
    }
}
