//! `KnowledgeGenerator` backed by a chat-completion `Provider`.

use async_trait::async_trait;
use medplan_core::error::KnowledgeError;
use medplan_core::knowledge::*;
use medplan_core::message::Message;
use medplan_core::provider::{Provider, ProviderRequest};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::extract::extract_json;
use crate::prompts;

/// Generates plan knowledge by prompting an LLM once per task.
///
/// Holds no per-request state, so one instance can serve concurrent tasks.
pub struct LlmKnowledgeGenerator {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    timeout: Duration,
}

impl LlmKnowledgeGenerator {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.0,
            max_tokens: None,
            timeout: Duration::from_secs(120),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send one prompt and parse the JSON in the reply.
    async fn ask(
        &self,
        task: KnowledgeTask,
        prompt: String,
    ) -> Result<serde_json::Value, KnowledgeError> {
        let request = ProviderRequest {
            model: self.model.clone(),
            messages: vec![Message::system(prompts::SYSTEM_PROMPT), Message::user(prompt)],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        debug!(task = %task, provider = %self.provider.name(), model = %self.model, "Requesting knowledge");

        let response = tokio::time::timeout(self.timeout, self.provider.complete(request))
            .await
            .map_err(|_| {
                warn!(task = %task, timeout_secs = self.timeout.as_secs(), "Knowledge request timed out");
                KnowledgeError::Timeout {
                    timeout_secs: self.timeout.as_secs(),
                }
            })??;

        if let Some(usage) = &response.usage {
            debug!(task = %task, tokens = usage.total_tokens, "Knowledge response received");
        }

        extract_json(&response.message.content)
    }
}

fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String, KnowledgeError> {
    serde_json::to_string(value).map_err(|e| KnowledgeError::Encode(e.to_string()))
}

#[async_trait]
impl KnowledgeGenerator for LlmKnowledgeGenerator {
    fn name(&self) -> &str {
        self.provider.name()
    }

    async fn rewrite_interactions(
        &self,
        interactions: &[InteractionContext],
    ) -> Result<serde_json::Value, KnowledgeError> {
        let prompt = prompts::interactions_prompt(&encode(interactions)?);
        self.ask(KnowledgeTask::Interactions, prompt).await
    }

    async fn generate_side_effects(
        &self,
        contexts: &SideEffectContexts,
    ) -> Result<serde_json::Value, KnowledgeError> {
        let prompt = prompts::side_effects_prompt(&encode(contexts)?);
        self.ask(KnowledgeTask::SideEffects, prompt).await
    }

    async fn generate_food_interactions(
        &self,
        contexts: &FoodInteractionContexts,
    ) -> Result<serde_json::Value, KnowledgeError> {
        let prompt = prompts::food_interactions_prompt(&encode(contexts)?);
        self.ask(KnowledgeTask::FoodInteractions, prompt).await
    }

    async fn generate_timing(
        &self,
        contexts: &TimingContexts,
    ) -> Result<serde_json::Value, KnowledgeError> {
        let prompt = prompts::timing_prompt(&encode(contexts)?);
        self.ask(KnowledgeTask::Timing, prompt).await
    }

    async fn extract_label(
        &self,
        label_lines: &[String],
    ) -> Result<serde_json::Value, KnowledgeError> {
        let prompt = prompts::label_prompt(&encode(label_lines)?);
        self.ask(KnowledgeTask::Label, prompt).await
    }
}
