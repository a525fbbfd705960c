use std::time::Duration;

use async_trait::async_trait;

use super::{PromptError, PromptGenerator};
use crate::config::Config;
use crate::models::mood::Mood;

/// Journal prompts from the hosted messages API.
#[derive(Clone)]
pub struct ClaudePromptGenerator {
    client: reqwest::Client,
    api_key: String,
    model: String,
    api_url: String,
}

impl ClaudePromptGenerator {
    pub fn new(config: &Config) -> Result<Self, PromptError> {
        // The caller enforces the overall deadline; this only guards the socket.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.prompt_timeout_secs.max(1)))
            .build()?;

        Ok(Self {
            client,
            api_key: config.claude_api_key.clone(),
            model: config.claude_model.clone(),
            api_url: config.claude_api_url.clone(),
        })
    }

    fn instruction(mood: Mood) -> String {
        format!(
            "Write one short, gentle journaling prompt for someone who is feeling {mood} today. \
             Reply with the prompt only, no preamble, at most two sentences."
        )
    }
}

#[async_trait]
impl PromptGenerator for ClaudePromptGenerator {
    async fn generate(&self, mood: Mood) -> Result<String, PromptError> {
        if self.api_key.is_empty() {
            return Err(PromptError::Disabled);
        }

        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&serde_json::json!({
                "model": self.model,
                "max_tokens": 200,
                "messages": [{
                    "role": "user",
                    "content": Self::instruction(mood)
                }]
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(PromptError::Api { status, body });
        }

        let completion: serde_json::Value = response.json().await?;
        let text = completion["content"][0]["text"]
            .as_str()
            .map(str::trim)
            .unwrap_or_default();

        if text.is_empty() {
            return Err(PromptError::EmptyCompletion);
        }
        Ok(text.to_string())
    }

    fn source(&self) -> &'static str {
        "claude"
    }
}
