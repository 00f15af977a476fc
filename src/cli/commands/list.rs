//! List command implementation.

use super::open_store;
use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::classify;
use crate::store::ProjectStore;
use anyhow::Result;

/// Run the list command.
pub async fn run_list(settings: Settings) -> Result<()> {
    let store = open_store(&settings)?;

    match store.list().await {
        Ok(projects) => {
            if projects.is_empty() {
                Output::info("No projects yet. Use 'studycast new <files...>' to start one.");
            } else {
                Output::header(&format!("Projects ({})", projects.len()));
                println!();

                for project in &projects {
                    Output::project_info(project, classify(project));
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to list projects: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
