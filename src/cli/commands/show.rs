//! Show command implementation.

use super::{load_project, open_store};
use crate::audio::{decode_segment, pcm_duration_secs};
use crate::cli::output::{content_preview, format_duration};
use crate::cli::Output;
use crate::config::Settings;
use crate::outline::Outline;
use crate::pipeline::classify;
use crate::script::split_segments;
use crate::timeline::Timeline;
use anyhow::Result;

/// Run the show command.
pub async fn run_show(id: i64, script: bool, timeline: bool, settings: Settings) -> Result<()> {
    let store = open_store(&settings)?;
    let project = load_project(store.as_ref(), id).await?;
    let state = classify(&project);

    Output::header(&format!("#{} {}", project.id, project.subject));
    Output::kv("State", &state.to_string());
    Output::kv("Created", &project.created_at.format("%Y-%m-%d %H:%M").to_string());

    let selected = project.uploaded_files.iter().filter(|f| f.selected).count();
    Output::kv(
        "Sources",
        &format!("{} file(s), {} selected", project.uploaded_files.len(), selected),
    );
    for file in &project.uploaded_files {
        let mark = if file.selected { "" } else { " (not selected)" };
        Output::list_item(&format!("{}{}", file.name, mark));
    }

    let tree = project
        .final_content_json
        .as_deref()
        .or(project.outline_json.as_deref())
        .map(Outline::from_json)
        .transpose()?;
    if let Some(tree) = &tree {
        Output::kv(
            "Ideas",
            &format!("{} ({} nodes)", tree.ideas.len(), tree.node_count()),
        );
        for idea in &tree.ideas {
            Output::list_item(&format!("{} {}", idea.id, idea.title));
        }
    }

    let segments = project
        .full_script
        .as_deref()
        .map(|s| split_segments(s, &settings.script.separator))
        .unwrap_or_default();
    if !segments.is_empty() {
        Output::kv("Script segments", &segments.len().to_string());
    }

    if !project.audio_segments.is_empty() {
        let mut seconds = 0.0;
        for payload in &project.audio_segments {
            seconds += pcm_duration_secs(decode_segment(payload)?.len(), settings.speech.sample_rate);
        }
        Output::kv(
            "Audio",
            &format!(
                "{} segment(s), {}",
                project.audio_segments.len(),
                format_duration(seconds)
            ),
        );
    }

    let events = project
        .timeline_json
        .as_deref()
        .map(Timeline::parse_or_empty)
        .unwrap_or_default()
        .events;
    if !events.is_empty() {
        Output::kv("Timeline events", &events.len().to_string());
    }

    Output::info(&format!("Next: {}", state.next_action()));

    if script {
        Output::header("Script");
        for (i, segment) in segments.iter().enumerate() {
            println!("\n[{}] {}", i + 1, content_preview(segment, 60));
            println!("{}", segment);
        }
    }

    if timeline {
        Output::header("Timeline");
        for event in &events {
            Output::list_item(&format!("{} - {} ({})", event.date, event.event, event.node_id));
        }
    }

    Ok(())
}
