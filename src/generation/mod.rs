//! Calls to the external generation service.
//!
//! The pipeline only sees the [`ContentGenerator`] and [`SpeechSynthesizer`]
//! traits; the OpenAI implementations live in submodules.

mod openai;
mod speech;

pub use openai::OpenAIGenerator;
pub use speech::{
    clean_for_speech, synthesize_segment, OpenAISpeech, RetryPolicy, SILENT_PAYLOAD,
};

use crate::error::Result;
use crate::outline::MainIdea;
use crate::script::Speakers;
use async_trait::async_trait;

/// Text generation requests issued by the pipeline.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Build an outline from the combined source text. Returns outline JSON.
    async fn generate_outline(&self, combined_text: &str) -> Result<String>;

    /// Write the markdown summary of one top-level idea.
    ///
    /// `previous_summary` is the summary of the idea just before this one, if any.
    async fn generate_summary(
        &self,
        idea: &MainIdea,
        original_text: &str,
        previous_summary: Option<&str>,
    ) -> Result<String>;

    /// Write the raw podcast script for a content tree.
    async fn generate_script(&self, final_content_json: &str) -> Result<String>;

    /// Extract dated events from a content tree. Returns `{"events": [...]}` JSON.
    async fn generate_timeline(&self, final_content_json: &str) -> Result<String>;

    /// Write quiz questions for one node. Returns `{"quizQuestions": [...]}` JSON.
    async fn generate_study_aids(&self, title: &str, material: &str) -> Result<String>;

    /// IPA transcription of a single word, without surrounding slashes.
    async fn phoneme_for_word(&self, word: &str) -> Result<String>;
}

/// Text-to-speech for one cleaned script segment.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize a two-voice dialogue. Returns the base64 audio payload.
    async fn synthesize(&self, segment: &str, speakers: &Speakers) -> Result<String>;
}
