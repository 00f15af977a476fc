//! Error types for Studycast.

use crate::pipeline::Stage;
use thiserror::Error;

/// Library-level error type for Studycast operations.
#[derive(Error, Debug)]
pub enum StudycastError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Audio synthesis failed: {0}")]
    AudioSynthesis(String),

    #[error("Invalid tree path: {0}")]
    InvalidPath(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Project not found: {0}")]
    ProjectNotFound(i64),

    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("Text extraction failed: {0}")]
    Extraction(String),

    #[error("Operation not allowed in state {state}: {reason}")]
    InvalidState { state: String, reason: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{stage} Failed: {source}")]
    StageFailed {
        stage: Stage,
        #[source]
        source: Box<StudycastError>,
    },

    #[error("{stage} finished but could not be saved (generated content is kept in memory): {source}")]
    Unsaved {
        stage: Stage,
        #[source]
        source: Box<StudycastError>,
    },

    #[error("Failed to regenerate audio for segment {segment}: {source}")]
    SegmentFailed {
        /// 1-based, as shown to the user.
        segment: usize,
        #[source]
        source: Box<StudycastError>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Audio decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),
}

impl StudycastError {
    /// Wrap an error as the failure of a pipeline stage.
    pub fn in_stage(self, stage: Stage) -> Self {
        StudycastError::StageFailed {
            stage,
            source: Box::new(self),
        }
    }

    /// True if this error means generated content exists but was not persisted.
    pub fn is_unsaved(&self) -> bool {
        matches!(self, StudycastError::Unsaved { .. })
    }
}

/// Result type alias for Studycast operations.
pub type Result<T> = std::result::Result<T, StudycastError>;
