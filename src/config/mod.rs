//! Configuration module for Studycast.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{PromptPair, Prompts};
pub use settings::{
    GeneralSettings, GenerationSettings, PipelineSettings, PromptSettings, ScriptSettings,
    Settings, SpeechSettings, StoreSettings,
};
