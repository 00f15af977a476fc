//! SQLite-based project store.

use super::{NewProject, Project, ProjectStore, ProjectUpdate, UploadedFile};
use crate::error::{Result, StudycastError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS projects (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        subject TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        uploaded_files TEXT NOT NULL,
        outline_json TEXT,
        outline_with_summaries_json TEXT,
        final_content_json TEXT,
        study_materials_json TEXT,
        timeline_json TEXT,
        full_script TEXT,
        audio_segments TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_projects_created_at ON projects(created_at);
"#;

const SELECT_COLUMNS: &str = r#"
    SELECT id, subject, created_at, uploaded_files, outline_json,
           outline_with_summaries_json, final_content_json, study_materials_json,
           timeline_json, full_script, audio_segments
    FROM projects
"#;

/// SQLite-based project store.
pub struct SqliteProjectStore {
    conn: Mutex<Connection>,
}

impl SqliteProjectStore {
    /// Open (or create) the database at `path`.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite project store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StudycastError::Persistence(format!("Failed to acquire lock: {}", e)))
    }

    fn read_project(row: &Row<'_>) -> rusqlite::Result<RawProject> {
        Ok(RawProject {
            id: row.get(0)?,
            subject: row.get(1)?,
            created_at: row.get(2)?,
            uploaded_files: row.get(3)?,
            outline_json: row.get(4)?,
            outline_with_summaries_json: row.get(5)?,
            final_content_json: row.get(6)?,
            study_materials_json: row.get(7)?,
            timeline_json: row.get(8)?,
            full_script: row.get(9)?,
            audio_segments: row.get(10)?,
        })
    }

    fn get_locked(conn: &Connection, id: i64) -> Result<Option<Project>> {
        let raw = conn
            .query_row(
                &format!("{} WHERE id = ?1", SELECT_COLUMNS),
                params![id],
                Self::read_project,
            )
            .optional()?;
        raw.map(RawProject::into_project).transpose()
    }
}

/// A row as stored, before the JSON columns are decoded.
struct RawProject {
    id: i64,
    subject: String,
    created_at: String,
    uploaded_files: String,
    outline_json: Option<String>,
    outline_with_summaries_json: Option<String>,
    final_content_json: Option<String>,
    study_materials_json: Option<String>,
    timeline_json: Option<String>,
    full_script: Option<String>,
    audio_segments: String,
}

impl RawProject {
    fn into_project(self) -> Result<Project> {
        let uploaded_files: Vec<UploadedFile> = serde_json::from_str(&self.uploaded_files)
            .map_err(|e| {
                StudycastError::Persistence(format!(
                    "Project {} has unreadable uploaded files: {}",
                    self.id, e
                ))
            })?;
        let audio_segments: Vec<String> =
            serde_json::from_str(&self.audio_segments).map_err(|e| {
                StudycastError::Persistence(format!(
                    "Project {} has unreadable audio segments: {}",
                    self.id, e
                ))
            })?;

        Ok(Project {
            id: self.id,
            subject: self.subject,
            created_at: DateTime::parse_from_rfc3339(&self.created_at)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
            uploaded_files,
            outline_json: self.outline_json,
            outline_with_summaries_json: self.outline_with_summaries_json,
            final_content_json: self.final_content_json,
            study_materials_json: self.study_materials_json,
            timeline_json: self.timeline_json,
            full_script: self.full_script,
            audio_segments,
        })
    }
}

#[async_trait]
impl ProjectStore for SqliteProjectStore {
    #[instrument(skip(self, project), fields(subject = %project.subject))]
    async fn create(&self, project: NewProject) -> Result<i64> {
        let conn = self.lock()?;
        let now = Utc::now().to_rfc3339();

        conn.execute(
            r#"
            INSERT INTO projects
            (subject, created_at, updated_at, uploaded_files, outline_json, audio_segments)
            VALUES (?1, ?2, ?3, ?4, ?5, '[]')
            "#,
            params![
                project.subject,
                now,
                now,
                serde_json::to_string(&project.uploaded_files)?,
                project.outline_json,
            ],
        )?;

        let id = conn.last_insert_rowid();
        info!("Created project {}", id);
        Ok(id)
    }

    #[instrument(skip(self, update))]
    async fn update(&self, id: i64, update: ProjectUpdate) -> Result<()> {
        let conn = self.lock()?;
        let mut project =
            Self::get_locked(&conn, id)?.ok_or(StudycastError::ProjectNotFound(id))?;
        update.apply_to(&mut project);

        conn.execute(
            r#"
            UPDATE projects SET
                subject = ?2, updated_at = ?3, uploaded_files = ?4, outline_json = ?5,
                outline_with_summaries_json = ?6, final_content_json = ?7,
                study_materials_json = ?8, timeline_json = ?9, full_script = ?10,
                audio_segments = ?11
            WHERE id = ?1
            "#,
            params![
                id,
                project.subject,
                Utc::now().to_rfc3339(),
                serde_json::to_string(&project.uploaded_files)?,
                project.outline_json,
                project.outline_with_summaries_json,
                project.final_content_json,
                project.study_materials_json,
                project.timeline_json,
                project.full_script,
                serde_json::to_string(&project.audio_segments)?,
            ],
        )?;

        debug!("Updated project {}", id);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get(&self, id: i64) -> Result<Option<Project>> {
        let conn = self.lock()?;
        Self::get_locked(&conn, id)
    }

    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<Project>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "{} ORDER BY created_at DESC, id DESC",
            SELECT_COLUMNS
        ))?;

        let rows = stmt.query_map([], Self::read_project)?;
        let mut projects = Vec::new();
        for row in rows {
            projects.push(row?.into_project()?);
        }
        Ok(projects)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i64) -> Result<bool> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM projects WHERE id = ?1", params![id])?;
        info!("Deleted {} project(s) with id {}", deleted, id);
        Ok(deleted > 0)
    }
}
