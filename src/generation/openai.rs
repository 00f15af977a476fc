//! OpenAI chat-completion implementation of [`ContentGenerator`].

use super::ContentGenerator;
use crate::config::{GenerationSettings, PromptPair, Prompts, ScriptSettings};
use crate::error::{Result, StudycastError};
use crate::outline::{MainIdea, Outline};
use crate::script::pronunciation::{check_single_word, sanitize_ipa};
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs, ResponseFormat,
};
use async_openai::Client;
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Segment count assumed when the content tree cannot be read.
const DEFAULT_SEGMENT_COUNT: usize = 5;

/// Generator backed by OpenAI chat completions.
pub struct OpenAIGenerator {
    client: Client<OpenAIConfig>,
    models: GenerationSettings,
    script: ScriptSettings,
    prompts: Prompts,
}

impl OpenAIGenerator {
    pub fn new(
        client: Client<OpenAIConfig>,
        models: &GenerationSettings,
        script: &ScriptSettings,
    ) -> Self {
        Self {
            client,
            models: models.clone(),
            script: script.clone(),
            prompts: Prompts::default(),
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    async fn complete(
        &self,
        model: &str,
        pair: &PromptPair,
        vars: &HashMap<String, String>,
        json: bool,
    ) -> Result<String> {
        let system = self.prompts.render_with_custom(&pair.system, vars);
        let user = self.prompts.render_with_custom(&pair.user, vars);

        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system)
                .build()
                .map_err(|e| StudycastError::Generation(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user)
                .build()
                .map_err(|e| StudycastError::Generation(e.to_string()))?
                .into(),
        ];

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder
            .model(model)
            .messages(messages)
            .temperature(self.models.temperature);
        if json {
            builder.response_format(ResponseFormat::JsonObject);
        }
        let request = builder
            .build()
            .map_err(|e| StudycastError::Generation(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| StudycastError::OpenAI(format!("Failed to generate response: {}", e)))?;

        let text = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| StudycastError::Generation("Empty response from LLM".to_string()))?
            .clone();

        debug!(model, chars = text.len(), "Received completion");
        Ok(text)
    }

    fn script_vars(&self, final_content_json: &str) -> HashMap<String, String> {
        let segment_count = Outline::from_json(final_content_json)
            .map(|o| o.ideas.len())
            .unwrap_or(DEFAULT_SEGMENT_COUNT);

        let mut vars = HashMap::new();
        vars.insert("first_speaker".to_string(), self.script.first_speaker.clone());
        vars.insert("second_speaker".to_string(), self.script.second_speaker.clone());
        vars.insert("separator".to_string(), self.script.separator.clone());
        vars.insert("segment_count".to_string(), segment_count.to_string());
        vars.insert("content".to_string(), final_content_json.to_string());
        vars
    }
}

/// Cut a JSON object out of a response that may be wrapped in prose or code fences.
fn extract_json_object(response: &str) -> &str {
    match (response.find('{'), response.rfind('}')) {
        (Some(start), Some(end)) if end > start => &response[start..=end],
        _ => response,
    }
}

fn previous_context(previous_summary: Option<&str>) -> String {
    match previous_summary {
        Some(prev) => format!(
            "\nPrevious context (summary of the preceding idea):\n---\n{}\n---\nMake the new summary connect naturally to the previous context.\n",
            prev
        ),
        None => String::new(),
    }
}

#[async_trait]
impl ContentGenerator for OpenAIGenerator {
    #[instrument(skip(self, combined_text), fields(chars = combined_text.len()))]
    async fn generate_outline(&self, combined_text: &str) -> Result<String> {
        let mut vars = HashMap::new();
        vars.insert("text".to_string(), combined_text.to_string());

        let response = self
            .complete(&self.models.outline_model, &self.prompts.outline, &vars, true)
            .await?;
        let json = extract_json_object(&response);

        serde_json::from_str::<serde_json::Value>(json).map_err(|e| {
            StudycastError::MalformedResponse(format!(
                "outline is not valid JSON: {}. Response was: {}",
                e,
                response.chars().take(500).collect::<String>()
            ))
        })?;
        Ok(json.to_string())
    }

    #[instrument(skip(self, idea, original_text, previous_summary), fields(id = %idea.id))]
    async fn generate_summary(
        &self,
        idea: &MainIdea,
        original_text: &str,
        previous_summary: Option<&str>,
    ) -> Result<String> {
        let mut vars = HashMap::new();
        vars.insert("idea".to_string(), serde_json::to_string_pretty(idea)?);
        vars.insert("previous_context".to_string(), previous_context(previous_summary));
        vars.insert("original_text".to_string(), original_text.to_string());

        self.complete(&self.models.summary_model, &self.prompts.summary, &vars, false)
            .await
    }

    #[instrument(skip(self, final_content_json))]
    async fn generate_script(&self, final_content_json: &str) -> Result<String> {
        let vars = self.script_vars(final_content_json);
        self.complete(&self.models.script_model, &self.prompts.script, &vars, false)
            .await
    }

    #[instrument(skip(self, final_content_json))]
    async fn generate_timeline(&self, final_content_json: &str) -> Result<String> {
        let mut vars = HashMap::new();
        vars.insert("content".to_string(), final_content_json.to_string());

        let response = self
            .complete(&self.models.timeline_model, &self.prompts.timeline, &vars, true)
            .await?;
        Ok(extract_json_object(&response).to_string())
    }

    #[instrument(skip(self, material))]
    async fn generate_study_aids(&self, title: &str, material: &str) -> Result<String> {
        let mut vars = HashMap::new();
        vars.insert("title".to_string(), title.to_string());
        vars.insert("content".to_string(), material.to_string());

        let response = self
            .complete(
                &self.models.study_aids_model,
                &self.prompts.study_aids,
                &vars,
                true,
            )
            .await?;
        Ok(extract_json_object(&response).to_string())
    }

    #[instrument(skip(self))]
    async fn phoneme_for_word(&self, word: &str) -> Result<String> {
        let word = check_single_word(word)?;
        let mut vars = HashMap::new();
        vars.insert("word".to_string(), word.to_string());

        let response = self
            .complete(&self.models.phoneme_model, &self.prompts.phoneme, &vars, false)
            .await?;
        let ipa = sanitize_ipa(&response);
        if ipa.is_empty() {
            return Err(StudycastError::MalformedResponse(format!(
                "no transcription returned for '{}'",
                word
            )));
        }
        Ok(ipa)
    }
}
