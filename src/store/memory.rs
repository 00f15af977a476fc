//! In-memory project store.
//!
//! Useful for testing.

use super::{NewProject, Project, ProjectStore, ProjectUpdate};
use crate::error::{Result, StudycastError};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Default)]
struct Inner {
    projects: HashMap<i64, Project>,
    next_id: i64,
}

/// In-memory project store.
#[derive(Default)]
pub struct MemoryProjectStore {
    inner: RwLock<Inner>,
}

impl MemoryProjectStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(e: std::sync::PoisonError<T>) -> StudycastError {
    StudycastError::Persistence(format!("Failed to acquire lock: {}", e))
}

#[async_trait]
impl ProjectStore for MemoryProjectStore {
    async fn create(&self, project: NewProject) -> Result<i64> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        inner.next_id += 1;
        let id = inner.next_id;
        inner.projects.insert(id, project.into_project(id, Utc::now()));
        Ok(id)
    }

    async fn update(&self, id: i64, update: ProjectUpdate) -> Result<()> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        let project = inner
            .projects
            .get_mut(&id)
            .ok_or(StudycastError::ProjectNotFound(id))?;
        update.apply_to(project);
        Ok(())
    }

    async fn get(&self, id: i64) -> Result<Option<Project>> {
        let inner = self.inner.read().map_err(poisoned)?;
        Ok(inner.projects.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Project>> {
        let inner = self.inner.read().map_err(poisoned)?;
        let mut projects: Vec<Project> = inner.projects.values().cloned().collect();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(projects)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        Ok(inner.projects.remove(&id).is_some())
    }
}
