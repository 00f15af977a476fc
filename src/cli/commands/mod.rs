//! CLI command implementations.

mod advance;
mod config;
mod delete;
mod edit;
mod export;
mod list;
mod new_project;
mod regenerate;
mod show;

pub use advance::{run_advance, run_approve, run_full};
pub use config::run_config;
pub use delete::run_delete;
pub use edit::{run_edit, run_script};
pub use export::run_export;
pub use list::run_list;
pub use new_project::run_new;
pub use regenerate::{run_regenerate, PronunciationFixes};
pub use show::run_show;

use crate::cli::Output;
use crate::config::{Prompts, Settings};
use crate::error::StudycastError;
use crate::generation::{OpenAIGenerator, OpenAISpeech};
use crate::openai::create_client_with_timeout;
use crate::pipeline::{Pipeline, PipelineOptions, ProgressSink};
use crate::store::{Project, ProjectStore, SqliteProjectStore};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

/// Open the configured project database.
fn open_store(settings: &Settings) -> Result<Arc<SqliteProjectStore>> {
    Ok(Arc::new(SqliteProjectStore::new(&settings.sqlite_path())?))
}

/// Load a project or fail with a hint.
async fn load_project(store: &dyn ProjectStore, id: i64) -> Result<Project> {
    match store.get(id).await? {
        Some(project) => Ok(project),
        None => {
            Output::info("Use 'studycast list' to see your projects.");
            Err(StudycastError::ProjectNotFound(id).into())
        }
    }
}

/// Build a pipeline backed by OpenAI and the local project database.
fn build_pipeline(settings: &Settings, progress: Arc<dyn ProgressSink>) -> Result<Pipeline> {
    let client =
        create_client_with_timeout(Duration::from_secs(settings.generation.timeout_seconds))?;
    let prompts = Prompts::load(
        settings.prompts.custom_dir.as_deref(),
        Some(&settings.prompts.variables),
    )?;

    let generator = OpenAIGenerator::new(client.clone(), &settings.generation, &settings.script)
        .with_prompts(prompts);
    let speech = OpenAISpeech::new(client, &settings.speech)?;

    Ok(Pipeline::new(
        Arc::new(generator),
        Arc::new(speech),
        open_store(settings)?,
        PipelineOptions::from_settings(settings),
    )
    .with_progress(progress))
}

/// Report a failed operation.
///
/// When the work was done but not stored, one more save is attempted; if it
/// goes through the operation counts as successful.
async fn recover(pipeline: &mut Pipeline, err: StudycastError) -> Result<()> {
    if err.is_unsaved() {
        Output::warning(&err.to_string());
        match pipeline.save().await {
            Ok(()) => {
                Output::success("Project saved on retry.");
                return Ok(());
            }
            Err(e) => Output::error(&format!("Retry failed: {}", e)),
        }
    } else {
        Output::error(&err.to_string());
    }
    Err(err.into())
}
