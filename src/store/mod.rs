//! Project persistence.
//!
//! A project holds the uploaded sources and the JSON snapshot of every
//! pipeline stage. Stores keep snapshots byte-for-byte and never interpret them.

mod memory;
mod sqlite;

pub use memory::MemoryProjectStore;
pub use sqlite::SqliteProjectStore;

pub use crate::extract::UploadedFile;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted, resumable project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: i64,
    pub subject: String,
    pub created_at: DateTime<Utc>,
    pub uploaded_files: Vec<UploadedFile>,
    pub outline_json: Option<String>,
    pub outline_with_summaries_json: Option<String>,
    pub final_content_json: Option<String>,
    pub study_materials_json: Option<String>,
    pub timeline_json: Option<String>,
    pub full_script: Option<String>,
    pub audio_segments: Vec<String>,
}

/// Fields of a project at creation time (after the outline stage).
#[derive(Debug, Clone)]
pub struct NewProject {
    pub subject: String,
    pub uploaded_files: Vec<UploadedFile>,
    pub outline_json: String,
}

/// A partial update. `None` leaves a field alone; for optional snapshots
/// `Some(None)` clears the field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectUpdate {
    pub subject: Option<String>,
    pub uploaded_files: Option<Vec<UploadedFile>>,
    pub outline_json: Option<Option<String>>,
    pub outline_with_summaries_json: Option<Option<String>>,
    pub final_content_json: Option<Option<String>>,
    pub study_materials_json: Option<Option<String>>,
    pub timeline_json: Option<Option<String>>,
    pub full_script: Option<Option<String>>,
    pub audio_segments: Option<Vec<String>>,
}

impl ProjectUpdate {
    pub fn is_empty(&self) -> bool {
        *self == ProjectUpdate::default()
    }

    /// Apply this update to a loaded project.
    pub fn apply_to(&self, project: &mut Project) {
        fn set<T: Clone>(target: &mut T, value: &Option<T>) {
            if let Some(v) = value {
                *target = v.clone();
            }
        }

        set(&mut project.subject, &self.subject);
        set(&mut project.uploaded_files, &self.uploaded_files);
        set(&mut project.outline_json, &self.outline_json);
        set(
            &mut project.outline_with_summaries_json,
            &self.outline_with_summaries_json,
        );
        set(&mut project.final_content_json, &self.final_content_json);
        set(&mut project.study_materials_json, &self.study_materials_json);
        set(&mut project.timeline_json, &self.timeline_json);
        set(&mut project.full_script, &self.full_script);
        set(&mut project.audio_segments, &self.audio_segments);
    }
}

impl NewProject {
    /// The project as it looks right after creation.
    pub fn into_project(self, id: i64, created_at: DateTime<Utc>) -> Project {
        Project {
            id,
            subject: self.subject,
            created_at,
            uploaded_files: self.uploaded_files,
            outline_json: Some(self.outline_json),
            outline_with_summaries_json: None,
            final_content_json: None,
            study_materials_json: None,
            timeline_json: None,
            full_script: None,
            audio_segments: Vec::new(),
        }
    }
}

/// Storage backend for projects.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Persist a new project and return its id.
    async fn create(&self, project: NewProject) -> Result<i64>;

    /// Apply a partial update. Fails with `ProjectNotFound` for an unknown id.
    async fn update(&self, id: i64, update: ProjectUpdate) -> Result<()>;

    async fn get(&self, id: i64) -> Result<Option<Project>>;

    /// All projects, newest first.
    async fn list(&self) -> Result<Vec<Project>>;

    /// Delete a project. Returns false if it did not exist.
    async fn delete(&self, id: i64) -> Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_sets_and_clears() {
        let mut project = NewProject {
            subject: "Plato".to_string(),
            uploaded_files: vec![],
            outline_json: "{}".to_string(),
        }
        .into_project(1, Utc::now());
        project.full_script = Some("Voce 1: hi".to_string());

        let update = ProjectUpdate {
            final_content_json: Some(Some("{\"ideas\":[]}".to_string())),
            full_script: Some(None),
            audio_segments: Some(vec!["AAA=".to_string()]),
            ..Default::default()
        };
        update.apply_to(&mut project);

        assert_eq!(project.outline_json.as_deref(), Some("{}"));
        assert_eq!(project.final_content_json.as_deref(), Some("{\"ideas\":[]}"));
        assert!(project.full_script.is_none());
        assert_eq!(project.audio_segments, vec!["AAA="]);
        assert!(ProjectUpdate::default().is_empty());
        assert!(!update.is_empty());
    }

    #[test]
    fn test_project_json_uses_camel_case() {
        let project = NewProject {
            subject: "Plato".to_string(),
            uploaded_files: vec![UploadedFile::new("a.txt", "text")],
            outline_json: "{}".to_string(),
        }
        .into_project(7, Utc::now());

        let json = serde_json::to_value(&project).unwrap();
        assert!(json.get("outlineJson").is_some());
        assert!(json.get("audioSegments").is_some());
        assert_eq!(json["uploadedFiles"][0]["selected"], true);
    }
}
