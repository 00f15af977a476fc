//! CLI module for Studycast.

pub mod commands;
mod output;
pub mod preflight;

pub use output::{Output, SpinnerProgress};

use crate::pipeline::EditTarget;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Studycast - turn study material into a two-voice podcast
///
/// Builds an outline from your documents, summarizes and structures it,
/// writes a dialogue script with a timeline, and synthesizes the audio.
#[derive(Parser, Debug)]
#[command(name = "studycast")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "STUDYCAST_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a project from source documents and generate its outline
    New {
        /// Text files to use as source material
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// File name to load but leave out of generation (repeatable)
        #[arg(long = "deselect")]
        deselect: Vec<String>,
    },

    /// Run the next stage of a project
    Advance {
        /// Project id
        id: i64,
    },

    /// Generate everything from the outline to finished audio without pausing
    Run {
        /// Project id
        id: i64,
    },

    /// Approve the generated audio and finish the project
    Approve {
        /// Project id
        id: i64,
    },

    /// Re-synthesize one segment, optionally fixing pronunciations first
    Regenerate {
        /// Project id
        id: i64,

        /// Segment number, starting at 1
        segment: usize,

        /// File holding the new text of the segment (current text if omitted)
        file: Option<PathBuf>,

        /// Put a grave accent on the Nth vowel of WORD (repeatable)
        #[arg(long, value_name = "WORD:N", value_parser = parse_stress)]
        stress: Vec<(String, usize)>,

        /// Wrap WORD in an IPA phoneme tag looked up by the model (repeatable)
        #[arg(long, value_name = "WORD")]
        phoneme: Vec<String>,
    },

    /// Change one value of the outline, the content tree or the study materials
    Edit {
        /// Project id
        id: i64,

        /// Dotted path, e.g. ideas.0.sub_ideas.1.title
        path: String,

        /// New value; parsed as JSON, or used as a plain string
        value: String,

        /// Which artifact to edit
        #[arg(long, value_enum, default_value = "outline")]
        target: EditScope,
    },

    /// Replace a project's script before its audio is generated
    Script {
        /// Project id
        id: i64,

        /// File holding the full edited script
        file: PathBuf,
    },

    /// Show a project's state and artifacts
    Show {
        /// Project id
        id: i64,

        /// Print the full script
        #[arg(long)]
        script: bool,

        /// Print the timeline
        #[arg(long)]
        timeline: bool,
    },

    /// List projects
    List,

    /// Delete a project
    Delete {
        /// Project id
        id: i64,
    },

    /// Write the podcast audio, script and timeline to files
    Export {
        /// Project id
        id: i64,

        /// Output directory (current directory if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Report invalid speakers, voices and models
    Check,

    /// Show configuration file path
    Path,
}

/// Artifact names accepted by `edit --target`.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditScope {
    Outline,
    Content,
    Study,
}

impl From<EditScope> for EditTarget {
    fn from(scope: EditScope) -> Self {
        match scope {
            EditScope::Outline => EditTarget::Outline,
            EditScope::Content => EditTarget::Content,
            EditScope::Study => EditTarget::StudyMaterials,
        }
    }
}

/// Parse `WORD:N` for `--stress`.
fn parse_stress(raw: &str) -> Result<(String, usize), String> {
    let (word, nth) = raw
        .rsplit_once(':')
        .ok_or_else(|| format!("expected WORD:N, got '{}'", raw))?;
    let nth = nth
        .parse::<usize>()
        .map_err(|_| format!("'{}' is not a vowel number", nth))?;
    if word.trim().is_empty() || nth == 0 {
        return Err(format!("expected WORD:N with N >= 1, got '{}'", raw));
    }
    Ok((word.trim().to_string(), nth))
}
