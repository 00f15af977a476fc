//! New command implementation.

use super::{build_pipeline, recover};
use crate::cli::preflight::{self, Operation};
use crate::cli::{Output, SpinnerProgress};
use crate::config::Settings;
use crate::extract::{load_files, PlainTextExtractor};
use crate::outline::Outline;
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;

/// Run the new command.
pub async fn run_new(files: &[PathBuf], deselect: &[String], settings: Settings) -> Result<()> {
    preflight::check(Operation::Generate, &settings)?;

    let uploaded = load_files(&PlainTextExtractor, files, deselect).await?;
    for name in deselect {
        if !uploaded.iter().any(|f| &f.name == name) {
            Output::warning(&format!("--deselect {} does not match any file", name));
        }
    }
    let selected = uploaded.iter().filter(|f| f.selected).count();
    Output::info(&format!(
        "Loaded {} file(s), {} selected for generation",
        uploaded.len(),
        selected
    ));

    let progress = Arc::new(SpinnerProgress::new("Starting..."));
    let mut pipeline = build_pipeline(&settings, progress.clone())?;
    let result = pipeline.start(uploaded).await;
    progress.finish();

    if let Err(e) = result {
        recover(&mut pipeline, e).await?;
    }

    let session = pipeline.session();
    let Some(id) = session.project_id else {
        return Ok(());
    };

    Output::success(&format!("Created project #{} '{}'", id, session.subject));
    if let Some(outline) = session.outline_json.as_deref() {
        let outline = Outline::from_json(outline)?;
        Output::header(&format!("Outline ({} ideas)", outline.ideas.len()));
        for idea in &outline.ideas {
            Output::list_item(&format!("{} {}", idea.id, idea.title));
        }
        println!();
    }
    Output::info(&format!(
        "Edit with 'studycast edit {id} <path> <value>', then run 'studycast advance {id}'."
    ));

    Ok(())
}
