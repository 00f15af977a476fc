//! Configuration settings for Studycast.

use crate::error::StudycastError;
use crate::generation::RetryPolicy;
use crate::script::Speakers;
use async_openai::types::Voice;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub generation: GenerationSettings,
    pub speech: SpeechSettings,
    pub script: ScriptSettings,
    pub pipeline: PipelineSettings,
    pub store: StoreSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.studycast".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// Chat model selection for each generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Model used to build the outline from source documents.
    pub outline_model: String,
    /// Model used for per-idea summaries.
    pub summary_model: String,
    /// Model used for the podcast script.
    pub script_model: String,
    /// Model used for timeline extraction.
    pub timeline_model: String,
    /// Model used for quiz questions.
    pub study_aids_model: String,
    /// Model used for IPA transcriptions of single words.
    pub phoneme_model: String,
    /// Sampling temperature for free-text requests.
    pub temperature: f32,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            outline_model: "gpt-4.1".to_string(),
            summary_model: "gpt-4.1".to_string(),
            script_model: "gpt-4.1".to_string(),
            timeline_model: "gpt-4o-mini".to_string(),
            study_aids_model: "gpt-4o-mini".to_string(),
            phoneme_model: "gpt-4.1".to_string(),
            temperature: 0.7,
            timeout_seconds: 300,
        }
    }
}

/// Text-to-speech settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechSettings {
    /// TTS model.
    pub model: String,
    /// Voice for the first speaker.
    pub first_voice: String,
    /// Voice for the second speaker.
    pub second_voice: String,
    /// Sample rate of the raw PCM returned by the TTS endpoint.
    pub sample_rate: u32,
    /// Attempts per segment before giving up.
    pub max_attempts: u32,
    /// Base delay for linear backoff between attempts, in milliseconds.
    pub retry_base_delay_ms: u64,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            model: "tts-1".to_string(),
            first_voice: "nova".to_string(),
            second_voice: "onyx".to_string(),
            sample_rate: 24_000,
            max_attempts: 3,
            retry_base_delay_ms: 1000,
        }
    }
}

impl SpeechSettings {
    /// Retry policy for segment synthesis.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
        }
    }
}

/// Script format settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptSettings {
    /// Label of the first speaker (as written before the colon).
    pub first_speaker: String,
    /// Label of the second speaker.
    pub second_speaker: String,
    /// Line that separates script segments.
    pub separator: String,
}

impl Default for ScriptSettings {
    fn default() -> Self {
        Self {
            first_speaker: "Voce 1".to_string(),
            second_speaker: "Voce 2".to_string(),
            separator: "--- SEGMENT ---".to_string(),
        }
    }
}

impl ScriptSettings {
    /// The configured speaker pair.
    pub fn speakers(&self) -> Speakers {
        Speakers::new(&self.first_speaker, &self.second_speaker)
    }
}

/// Pipeline behaviour settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PipelineSettings {
    /// Generate flashcards and quiz questions for every node.
    /// When false the study materials are the final content outline as-is.
    pub study_aids: bool,
}

/// Project store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Path to the SQLite database.
    pub sqlite_path: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            sqlite_path: "~/.studycast/projects.db".to_string(),
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::StudycastError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("studycast")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded SQLite database path.
    pub fn sqlite_path(&self) -> PathBuf {
        Self::expand_path(&self.store.sqlite_path)
    }

    /// Every value that would make generation fail, one message each.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        let first = self.script.first_speaker.trim();
        let second = self.script.second_speaker.trim();
        if first.is_empty() || second.is_empty() {
            problems.push("script.first_speaker and script.second_speaker must not be empty".to_string());
        } else if first == second {
            problems.push(format!("both speakers are labelled '{}'", first));
        }
        if self.script.separator.trim().is_empty() {
            problems.push("script.separator must not be empty".to_string());
        }

        let models = [
            ("outline_model", &self.generation.outline_model),
            ("summary_model", &self.generation.summary_model),
            ("script_model", &self.generation.script_model),
            ("timeline_model", &self.generation.timeline_model),
            ("study_aids_model", &self.generation.study_aids_model),
            ("phoneme_model", &self.generation.phoneme_model),
        ];
        for (key, model) in models {
            if model.trim().is_empty() {
                problems.push(format!("generation.{} must not be empty", key));
            }
        }
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            problems.push(format!(
                "generation.temperature must be between 0 and 2, got {}",
                self.generation.temperature
            ));
        }

        if self.speech.model.trim().is_empty() {
            problems.push("speech.model must not be empty".to_string());
        }
        for (key, voice) in [
            ("first_voice", &self.speech.first_voice),
            ("second_voice", &self.speech.second_voice),
        ] {
            if !is_known::<Voice>(voice) {
                problems.push(format!("speech.{} '{}' is not a known voice", key, voice));
            }
        }
        if self.speech.sample_rate == 0 {
            problems.push("speech.sample_rate must be positive".to_string());
        }

        problems
    }

    /// Fail with every problem found, if any.
    pub fn validate(&self) -> crate::error::Result<()> {
        let problems = self.problems();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(StudycastError::Config(problems.join("; ")))
        }
    }
}

/// Whether `name` deserializes into one of the variants of `T`.
fn is_known<T: serde::de::DeserializeOwned>(name: &str) -> bool {
    serde_json::from_value::<T>(serde_json::Value::String(name.to_string())).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [script]
            separator = "=== NEXT ==="

            [speech]
            max_attempts = 5
            "#,
        )
        .unwrap();

        assert_eq!(settings.script.separator, "=== NEXT ===");
        assert_eq!(settings.script.first_speaker, "Voce 1");
        assert_eq!(settings.speech.max_attempts, 5);
        assert_eq!(settings.speech.retry_base_delay_ms, 1000);
        assert!(!settings.pipeline.study_aids);
    }

    #[test]
    fn test_retry_policy_never_zero_attempts() {
        let speech = SpeechSettings {
            max_attempts: 0,
            ..Default::default()
        };
        assert_eq!(speech.retry_policy().max_attempts, 1);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut settings = Settings::default();
        settings.generation.script_model = "gpt-4o".to_string();
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.generation.script_model, "gpt-4o");
    }

    #[test]
    fn test_default_settings_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_problems_are_all_reported() {
        let mut settings = Settings::default();
        settings.script.second_speaker = "Voce 1".to_string();
        settings.speech.first_voice = "robot".to_string();
        settings.generation.summary_model = " ".to_string();

        let problems = settings.problems();
        assert_eq!(problems.len(), 3);
        assert!(problems[0].contains("'Voce 1'"));
        assert!(problems.iter().any(|p| p.contains("summary_model")));
        assert!(problems.iter().any(|p| p.contains("'robot'")));

        let err = settings.validate().unwrap_err().to_string();
        assert!(err.contains("; "));
    }
}
