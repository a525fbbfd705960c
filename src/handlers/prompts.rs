use std::time::Duration;

use axum::{
    extract::{Path, State},
    Extension, Json,
};

use crate::auth::middleware::AuthUser;
use crate::error::AppResult;
use crate::models::mood::Mood;
use crate::models::preferences::UserEntitlements;
use crate::prompts::{prompt_with_fallback, template_prompt, GeneratedPrompt, TemplatePromptGenerator};
use crate::AppState;

/// Journal prompt for a mood. LLM generation is a premium entitlement; the
/// response never fails because of the completion API.
pub async fn get_prompt(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(mood): Path<String>,
) -> AppResult<Json<GeneratedPrompt>> {
    let mood: Mood = mood.parse()?;
    let prefs = state.store.load_preferences(auth_user.id).await?;

    let prompt = if UserEntitlements::for_tier(prefs.subscription_tier).ai_prompts {
        prompt_with_fallback(
            state.prompts.as_ref(),
            &TemplatePromptGenerator,
            mood,
            Duration::from_secs(state.config.prompt_timeout_secs),
        )
        .await
    } else {
        template_prompt(&TemplatePromptGenerator, mood).await
    };

    Ok(Json(prompt))
}
