//! Delete command implementation.

use super::open_store;
use crate::cli::Output;
use crate::config::Settings;
use crate::store::ProjectStore;
use anyhow::Result;

/// Run the delete command.
pub async fn run_delete(id: i64, settings: Settings) -> Result<()> {
    let store = open_store(&settings)?;

    if store.delete(id).await? {
        Output::success(&format!("Deleted project #{}", id));
    } else {
        Output::warning(&format!("No project with id {}", id));
    }
    Ok(())
}
