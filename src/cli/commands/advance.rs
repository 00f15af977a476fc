//! Advance, run and approve command implementations.

use super::{build_pipeline, recover};
use crate::cli::preflight::{self, Operation};
use crate::cli::{Output, SpinnerProgress};
use crate::config::Settings;
use crate::pipeline::{Pipeline, PipelineState};
use anyhow::Result;
use std::sync::Arc;

/// Print what a project looks like after a stage.
fn summarize(pipeline: &Pipeline, id: i64) {
    let session = pipeline.session();
    Output::kv("State", &session.state.to_string());
    if !session.script_segments.is_empty() {
        Output::kv("Script segments", &session.script_segments.len().to_string());
    }
    if !session.audio_segments.is_empty() {
        Output::kv("Audio segments", &session.audio_segments.len().to_string());
    }
    Output::info(&format!(
        "Next: {} ('studycast show {}' to review).",
        session.state.next_action(),
        id
    ));
}

/// Run the advance command: one step-by-step stage.
pub async fn run_advance(id: i64, settings: Settings) -> Result<()> {
    let progress = Arc::new(SpinnerProgress::new("Loading project..."));
    let mut pipeline = build_pipeline(&settings, progress.clone())?;
    let state = pipeline.resume(id).await?;

    if state < PipelineState::AudioReady {
        if let Err(e) = preflight::check(Operation::Generate, &settings) {
            progress.finish();
            return Err(e.into());
        }
    }

    let result = pipeline.advance().await;
    progress.finish();

    match result {
        Ok(state) => Output::success(&format!("Project #{} is now: {}", id, state)),
        Err(e) => recover(&mut pipeline, e).await?,
    }
    summarize(&pipeline, id);
    Ok(())
}

/// Run the run command: every stage from the outline without pausing.
pub async fn run_full(id: i64, settings: Settings) -> Result<()> {
    preflight::check(Operation::Generate, &settings)?;

    let progress = Arc::new(SpinnerProgress::new("Loading project..."));
    let mut pipeline = build_pipeline(&settings, progress.clone())?;
    pipeline.resume(id).await?;

    let Some(outline) = pipeline.session().outline_json.clone() else {
        progress.finish();
        Output::error("This project has no outline yet.");
        return Err(anyhow::anyhow!("project #{} has no outline", id));
    };

    let result = pipeline.run_full(&outline).await;
    progress.finish();

    match result {
        Ok(()) => Output::success(&format!(
            "Generated '{}' ({} segments)",
            pipeline.session().subject,
            pipeline.session().audio_segments.len()
        )),
        Err(e) => recover(&mut pipeline, e).await?,
    }
    summarize(&pipeline, id);
    Ok(())
}

/// Run the approve command.
pub async fn run_approve(id: i64, settings: Settings) -> Result<()> {
    let progress = Arc::new(SpinnerProgress::new("Loading project..."));
    let mut pipeline = build_pipeline(&settings, progress.clone())?;
    let state = pipeline.resume(id).await;
    progress.finish();

    if state? < PipelineState::AudioReady {
        Output::error("This project has no audio yet. Run 'studycast advance' until it does.");
        return Err(anyhow::anyhow!("project #{} has no audio", id));
    }

    pipeline.approve_audio()?;
    pipeline.complete()?;
    Output::success(&format!("Project #{} is complete", id));
    Output::info(&format!("Export it with 'studycast export {}'.", id));
    Ok(())
}
