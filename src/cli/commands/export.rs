//! Export command implementation.

use super::{load_project, open_store};
use crate::audio::{pcm_duration_secs, sanitize_file_stem, stitch_wav};
use crate::cli::output::format_duration;
use crate::cli::Output;
use crate::config::Settings;
use crate::timeline::Timeline;
use anyhow::Result;
use std::path::PathBuf;

/// Run the export command.
pub async fn run_export(id: i64, output: Option<PathBuf>, settings: Settings) -> Result<()> {
    let store = open_store(&settings)?;
    let project = load_project(store.as_ref(), id).await?;

    if project.audio_segments.is_empty() {
        Output::error(&format!("Project #{} has no audio yet.", id));
        Output::info(&format!("Use 'studycast advance {}' to generate it.", id));
        return Err(anyhow::anyhow!("project #{} has no audio", id));
    }

    let dir = output.unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&dir)?;
    let stem = sanitize_file_stem(&project.subject);

    let audio_path = dir.join(format!("{}.wav", stem));
    let samples = stitch_wav(&project.audio_segments, settings.speech.sample_rate, &audio_path)?;
    let seconds = pcm_duration_secs(samples as usize * 2, settings.speech.sample_rate);
    Output::success(&format!(
        "Wrote {} ({})",
        audio_path.display(),
        format_duration(seconds)
    ));

    if let Some(script) = project.full_script.as_deref() {
        let script_path = dir.join(format!("{}-script.txt", stem));
        std::fs::write(&script_path, script)?;
        Output::success(&format!("Wrote {}", script_path.display()));
    }

    if let Some(timeline) = project.timeline_json.as_deref() {
        let timeline = Timeline::parse_or_empty(timeline).dedup();
        let timeline_path = dir.join(format!("{}-timeline.json", stem));
        std::fs::write(&timeline_path, timeline.to_pretty_json()?)?;
        Output::success(&format!(
            "Wrote {} ({} events)",
            timeline_path.display(),
            timeline.events.len()
        ));
    }

    Ok(())
}
