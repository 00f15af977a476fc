//! Studycast CLI entry point.

use anyhow::Result;
use clap::Parser;
use studycast::cli::{commands, Cli, Commands};
use studycast::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_path = match &cli.config {
        Some(path) => Settings::expand_path(path),
        None => Settings::default_config_path(),
    };
    let settings = Settings::load_from(Some(&config_path))?;

    // Initialize logging
    let log_level = match cli.verbose {
        0 => settings.general.log_level.clone(),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("studycast={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Ensure data directory exists
    std::fs::create_dir_all(settings.data_dir())?;

    // Execute command
    match &cli.command {
        Commands::New { files, deselect } => {
            commands::run_new(files, deselect, settings).await?;
        }

        Commands::Advance { id } => {
            commands::run_advance(*id, settings).await?;
        }

        Commands::Run { id } => {
            commands::run_full(*id, settings).await?;
        }

        Commands::Approve { id } => {
            commands::run_approve(*id, settings).await?;
        }

        Commands::Regenerate {
            id,
            segment,
            file,
            stress,
            phoneme,
        } => {
            let fixes = commands::PronunciationFixes { stress, phoneme };
            commands::run_regenerate(*id, *segment, file.as_deref(), fixes, settings).await?;
        }

        Commands::Edit {
            id,
            path,
            value,
            target,
        } => {
            commands::run_edit(*id, (*target).into(), path, value, settings).await?;
        }

        Commands::Script { id, file } => {
            commands::run_script(*id, file, settings).await?;
        }

        Commands::Show { id, script, timeline } => {
            commands::run_show(*id, *script, *timeline, settings).await?;
        }

        Commands::List => {
            commands::run_list(settings).await?;
        }

        Commands::Delete { id } => {
            commands::run_delete(*id, settings).await?;
        }

        Commands::Export { id, output } => {
            commands::run_export(*id, output.clone(), settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings, &config_path)?;
        }
    }

    Ok(())
}
