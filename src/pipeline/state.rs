//! Pipeline states, stage names and resume classification.

use crate::store::Project;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a project is in the pipeline. Ordered from first to last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PipelineState {
    Collecting,
    OutlineReady,
    SummariesReady,
    ContentReady,
    ScriptReady,
    AudioReady,
    AudioReviewed,
    Complete,
}

impl PipelineState {
    /// Short human description of what the user can do next.
    pub fn next_action(&self) -> &'static str {
        match self {
            PipelineState::Collecting => "add source documents",
            PipelineState::OutlineReady => "review the outline, then generate summaries",
            PipelineState::SummariesReady => "structure the summaries into content",
            PipelineState::ContentReady => "review the content, then generate the script",
            PipelineState::ScriptReady => "review the script, then generate audio",
            PipelineState::AudioReady => "listen to the audio and approve it",
            PipelineState::AudioReviewed => "finish the project",
            PipelineState::Complete => "export the podcast",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Collecting => "Collecting",
            PipelineState::OutlineReady => "Outline ready",
            PipelineState::SummariesReady => "Summaries ready",
            PipelineState::ContentReady => "Content ready",
            PipelineState::ScriptReady => "Script ready",
            PipelineState::AudioReady => "Audio ready",
            PipelineState::AudioReviewed => "Audio reviewed",
            PipelineState::Complete => "Complete",
        };
        write!(f, "{}", name)
    }
}

/// A tree-shaped artifact that can be edited by path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTarget {
    /// The outline, before summaries exist.
    Outline,
    /// The structured content tree, before audio exists.
    Content,
    /// The study materials, before audio exists.
    StudyMaterials,
}

impl EditTarget {
    /// Whether this artifact may still be edited in `state`.
    pub fn editable_in(self, state: PipelineState) -> bool {
        match self {
            EditTarget::Outline => state == PipelineState::OutlineReady,
            EditTarget::Content | EditTarget::StudyMaterials => matches!(
                state,
                PipelineState::ContentReady | PipelineState::ScriptReady
            ),
        }
    }
}

impl fmt::Display for EditTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EditTarget::Outline => "outline",
            EditTarget::Content => "content",
            EditTarget::StudyMaterials => "study materials",
        };
        write!(f, "{}", name)
    }
}

/// A unit of work whose failure is reported by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Outline,
    Summary,
    Structuring,
    Content,
    Audio,
    SegmentRegeneration,
    Automatic,
    Editing,
    Pronunciation,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Outline => "Outline Generation",
            Stage::Summary => "Summary Generation",
            Stage::Structuring => "Content Structuring",
            Stage::Content => "Content Generation",
            Stage::Audio => "Audio Generation",
            Stage::SegmentRegeneration => "Segment Regeneration",
            Stage::Automatic => "Automatic Generation",
            Stage::Editing => "Editing",
            Stage::Pronunciation => "Pronunciation Lookup",
        };
        write!(f, "{}", label)
    }
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

/// Pick the state a persisted project resumes in, from which artifacts are present.
///
/// Presence only; the artifacts themselves are not validated.
pub fn classify(project: &Project) -> PipelineState {
    if !project.audio_segments.is_empty() {
        PipelineState::AudioReviewed
    } else if present(&project.full_script) && present(&project.study_materials_json) {
        PipelineState::ScriptReady
    } else if present(&project.final_content_json) {
        PipelineState::ContentReady
    } else if present(&project.outline_json) {
        PipelineState::OutlineReady
    } else {
        PipelineState::Collecting
    }
}
