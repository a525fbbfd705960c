//! Journal prompt generation. The hosted LLM is optional: every failure
//! path, including the deadline, degrades to the built-in templates.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::models::mood::Mood;

pub mod claude;
pub mod templates;

pub use claude::ClaudePromptGenerator;
pub use templates::TemplatePromptGenerator;

#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("prompt generation is not configured")]
    Disabled,

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("completion API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("completion API returned no text")]
    EmptyCompletion,

    #[error("prompt generation timed out after {0:?}")]
    Timeout(Duration),
}

#[async_trait]
pub trait PromptGenerator: Send + Sync {
    async fn generate(&self, mood: Mood) -> Result<String, PromptError>;

    /// Label reported to clients ("claude", "template").
    fn source(&self) -> &'static str;
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GeneratedPrompt {
    pub mood: Mood,
    pub prompt: String,
    pub source: String,
}

/// Never fails and never waits longer than `timeout` on `generator`.
pub async fn prompt_with_fallback(
    generator: &dyn PromptGenerator,
    fallback: &dyn PromptGenerator,
    mood: Mood,
    timeout: Duration,
) -> GeneratedPrompt {
    let attempt = match tokio::time::timeout(timeout, generator.generate(mood)).await {
        Ok(result) => result,
        Err(_) => Err(PromptError::Timeout(timeout)),
    };

    match attempt {
        Ok(prompt) => GeneratedPrompt {
            mood,
            prompt,
            source: generator.source().to_string(),
        },
        Err(e) => {
            match e {
                PromptError::Disabled => tracing::debug!("Prompt generation disabled, using fallback"),
                e => tracing::warn!(error = %e, mood = %mood, "Prompt generation failed, using fallback"),
            }
            template_prompt(fallback, mood).await
        }
    }
}

/// Fallback path; a fallback that itself errors yields the first built-in template.
pub async fn template_prompt(fallback: &dyn PromptGenerator, mood: Mood) -> GeneratedPrompt {
    let prompt = match fallback.generate(mood).await {
        Ok(p) => p,
        Err(_) => templates::templates(mood)[0].to_string(),
    };
    GeneratedPrompt {
        mood,
        prompt,
        source: "template".to_string(),
    }
}
