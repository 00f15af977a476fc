//! Studycast - turn study material into a two-voice podcast
//!
//! A local-first CLI tool that takes source documents through a staged
//! generation pipeline and keeps every stage's output in a resumable project.
//!
//! # Overview
//!
//! Studycast:
//! - Builds a hierarchical outline of ideas from your documents
//! - Summarizes each main idea in order, each summary aware of the previous one
//! - Re-parses the summaries into a content tree that keeps the outline's ids
//! - Writes a two-speaker dialogue script and a timeline of dated events
//! - Synthesizes the script segment by segment, with targeted re-synthesis
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `extract` - Source documents and their text
//! - `outline` - The idea tree, structural paths and the markdown re-parser
//! - `script` - Speaker labels, segments and alternation correction
//! - `timeline` - Dated events and deduplication
//! - `generation` - Text generation and speech synthesis collaborators
//! - `study_aids` - Per-node quiz questions and flashcards
//! - `store` - Project persistence
//! - `pipeline` - The stage state machine
//! - `audio` - WAV export
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use studycast::config::Settings;
//! use studycast::extract::UploadedFile;
//! use studycast::generation::{OpenAIGenerator, OpenAISpeech};
//! use studycast::openai::create_client_with_timeout;
//! use studycast::pipeline::{Pipeline, PipelineOptions};
//! use studycast::store::SqliteProjectStore;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let client = create_client_with_timeout(Duration::from_secs(300))?;
//!
//!     let mut pipeline = Pipeline::new(
//!         Arc::new(OpenAIGenerator::new(client.clone(), &settings.generation, &settings.script)),
//!         Arc::new(OpenAISpeech::new(client, &settings.speech)?),
//!         Arc::new(SqliteProjectStore::new(&settings.sqlite_path())?),
//!         PipelineOptions::from_settings(&settings),
//!     );
//!
//!     let id = pipeline
//!         .start(vec![UploadedFile::new("notes.txt", "The French Revolution began in 1789...")])
//!         .await?;
//!     let outline = pipeline.session().outline_json.clone().unwrap_or_default();
//!     pipeline.run_full(&outline).await?;
//!     println!("Project {} has {} audio segments", id, pipeline.session().audio_segments.len());
//!
//!     Ok(())
//! }
//! ```

pub mod audio;
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod generation;
pub mod openai;
pub mod outline;
pub mod pipeline;
pub mod script;
pub mod store;
pub mod study_aids;
pub mod timeline;

pub use error::{Result, StudycastError};
