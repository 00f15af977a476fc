//! In-memory state of the project being worked on.

use super::state::{classify, PipelineState};
use crate::script::split_segments;
use crate::store::{NewProject, Project, ProjectUpdate, UploadedFile};

/// Everything the pipeline has produced so far for one project.
///
/// Snapshots are kept exactly as the user last saw or edited them.
#[derive(Debug, Clone)]
pub struct Session {
    pub state: PipelineState,
    pub project_id: Option<i64>,
    pub subject: String,
    pub uploaded_files: Vec<UploadedFile>,
    pub outline_json: Option<String>,
    pub outline_with_summaries_json: Option<String>,
    pub final_content_json: Option<String>,
    pub study_materials_json: Option<String>,
    pub timeline_json: Option<String>,
    pub full_script: Option<String>,
    pub script_segments: Vec<String>,
    pub audio_segments: Vec<String>,
    pub last_error: Option<String>,
    pub progress_message: String,
    /// In-memory state is ahead of the store.
    pub dirty: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            state: PipelineState::Collecting,
            project_id: None,
            subject: String::new(),
            uploaded_files: Vec::new(),
            outline_json: None,
            outline_with_summaries_json: None,
            final_content_json: None,
            study_materials_json: None,
            timeline_json: None,
            full_script: None,
            script_segments: Vec::new(),
            audio_segments: Vec::new(),
            last_error: None,
            progress_message: String::new(),
            dirty: false,
        }
    }
}

impl Session {
    /// Rebuild a session from a persisted project.
    pub fn from_project(project: Project, separator: &str) -> Self {
        let state = classify(&project);
        let script_segments = project
            .full_script
            .as_deref()
            .map(|s| split_segments(s, separator))
            .unwrap_or_default();

        Self {
            state,
            project_id: Some(project.id),
            subject: project.subject,
            uploaded_files: project.uploaded_files,
            outline_json: project.outline_json,
            outline_with_summaries_json: project.outline_with_summaries_json,
            final_content_json: project.final_content_json,
            study_materials_json: project.study_materials_json,
            timeline_json: project.timeline_json,
            full_script: project.full_script,
            script_segments,
            audio_segments: project.audio_segments,
            ..Default::default()
        }
    }

    /// Drop every artifact produced from the summaries onwards.
    pub(crate) fn clear_after_summaries(&mut self) {
        self.final_content_json = None;
        self.clear_after_content();
    }

    pub(crate) fn clear_after_content(&mut self) {
        self.study_materials_json = None;
        self.timeline_json = None;
        self.full_script = None;
        self.script_segments.clear();
        self.audio_segments.clear();
    }

    /// Fields for creating the project row, once an outline exists.
    pub fn new_project(&self) -> Option<NewProject> {
        self.outline_json.as_ref().map(|outline| NewProject {
            subject: self.subject.clone(),
            uploaded_files: self.uploaded_files.clone(),
            outline_json: outline.clone(),
        })
    }

    /// Update that overwrites every persisted field with this session's values.
    pub fn full_update(&self) -> ProjectUpdate {
        ProjectUpdate {
            subject: Some(self.subject.clone()),
            uploaded_files: Some(self.uploaded_files.clone()),
            outline_json: Some(self.outline_json.clone()),
            outline_with_summaries_json: Some(self.outline_with_summaries_json.clone()),
            final_content_json: Some(self.final_content_json.clone()),
            study_materials_json: Some(self.study_materials_json.clone()),
            timeline_json: Some(self.timeline_json.clone()),
            full_script: Some(self.full_script.clone()),
            audio_segments: Some(self.audio_segments.clone()),
        }
    }
}
