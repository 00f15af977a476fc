//! Edit command implementation.

use super::{build_pipeline, recover};
use crate::cli::Output;
use crate::config::Settings;
use crate::outline::{Outline, TreePath};
use crate::pipeline::{EditTarget, LogProgress};
use anyhow::Result;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

/// Interpret a command-line value: JSON if it parses, otherwise a plain string.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Run the edit command.
pub async fn run_edit(
    id: i64,
    target: EditTarget,
    path: &str,
    value: &str,
    settings: Settings,
) -> Result<()> {
    let path: TreePath = path.parse()?;
    let value = parse_value(value);

    let mut pipeline = build_pipeline(&settings, Arc::new(LogProgress))?;
    pipeline.resume(id).await?;

    if let Err(e) = pipeline.edit(target, &path, value).await {
        return recover(&mut pipeline, e).await;
    }

    let session = pipeline.session();
    let edited = match target {
        EditTarget::Outline => &session.outline_json,
        EditTarget::Content => &session.final_content_json,
        EditTarget::StudyMaterials => &session.study_materials_json,
    };
    if let Some(json) = edited.as_deref() {
        let stored = Outline::from_json(json)?.value_at(&path)?;
        let shown = stored.map(|v| v.to_string()).unwrap_or_else(|| "null".to_string());
        Output::success(&format!("{} {} = {}", target, path, shown));
    }
    Ok(())
}

/// Run the script command: replace the whole script with the file's text.
pub async fn run_script(id: i64, file: &Path, settings: Settings) -> Result<()> {
    let script = tokio::fs::read_to_string(file).await?;

    let mut pipeline = build_pipeline(&settings, Arc::new(LogProgress))?;
    pipeline.resume(id).await?;

    if let Err(e) = pipeline.edit_script(&script).await {
        return recover(&mut pipeline, e).await;
    }

    Output::success(&format!(
        "Script of project #{} replaced ({} segments)",
        id,
        pipeline.session().script_segments.len()
    ));
    Output::info(&format!("Use 'studycast advance {}' to generate the audio.", id));
    Ok(())
}
