use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};

use super::{PromptError, PromptGenerator};
use crate::models::mood::Mood;

/// Built-in journal prompts per mood.
pub fn templates(mood: Mood) -> &'static [&'static str] {
    match mood {
        Mood::Happy => &[
            "What made today feel good? Write down the moment you want to remember.",
            "Who would you like to share today's good mood with, and why?",
            "What small choice helped you feel this way that you could repeat tomorrow?",
        ],
        Mood::Sad => &[
            "What is weighing on you right now? Let it out without judging it.",
            "Describe one thing, however small, that brought you comfort today.",
            "If a close friend felt this way, what would you tell them?",
        ],
        Mood::Angry => &[
            "What triggered this feeling? Describe it as plainly as you can.",
            "What need of yours feels unmet right now?",
            "What would help you release some of this tension in the next hour?",
        ],
        Mood::Surprised => &[
            "What caught you off guard today, and how did you react?",
            "Did the surprise change how you see something? Write about it.",
            "What did this unexpected moment teach you about yourself?",
        ],
        Mood::Fearful => &[
            "What are you afraid might happen? Write the worst case and the most likely case.",
            "Which parts of this situation are within your control?",
            "Recall a time you got through something scary. What helped?",
        ],
        Mood::Disgusted => &[
            "What crossed a line for you today? Describe what felt wrong.",
            "Which of your values did this situation bump against?",
            "How would you like to respond, now that you have had a moment?",
        ],
        Mood::Neutral => &[
            "Describe your day in three words, then explain each one.",
            "What is one thing you are looking forward to this week?",
            "What would turn an ordinary day into a good one?",
        ],
    }
}

/// Deterministic generator: rotates through a mood's templates by calendar day.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplatePromptGenerator;

impl TemplatePromptGenerator {
    pub fn prompt_for(&self, mood: Mood, date: NaiveDate) -> &'static str {
        let set = templates(mood);
        set[date.ordinal0() as usize % set.len()]
    }
}

#[async_trait]
impl PromptGenerator for TemplatePromptGenerator {
    async fn generate(&self, mood: Mood) -> Result<String, PromptError> {
        Ok(self.prompt_for(mood, Utc::now().date_naive()).to_string())
    }

    fn source(&self) -> &'static str {
        "template"
    }
}
