//! Regenerate command implementation.

use super::{build_pipeline, recover};
use crate::cli::preflight::{self, Operation};
use crate::cli::{Output, SpinnerProgress};
use crate::config::Settings;
use crate::script::pronunciation::{replace_word, stress_vowel};
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

/// Pronunciation fixes requested on the command line.
#[derive(Debug, Default)]
pub struct PronunciationFixes<'a> {
    /// Word and 1-based vowel to accent.
    pub stress: &'a [(String, usize)],
    /// Words to wrap in phoneme tags.
    pub phoneme: &'a [String],
}

impl PronunciationFixes<'_> {
    fn is_empty(&self) -> bool {
        self.stress.is_empty() && self.phoneme.is_empty()
    }
}

/// Apply every stress accent to `text`.
fn apply_stress(text: &str, stress: &[(String, usize)]) -> Result<String> {
    let mut text = text.to_string();
    for (word, nth) in stress {
        let accented = stress_vowel(word, *nth)?;
        text = replace_word(&text, word, &accented)?;
    }
    Ok(text)
}

/// Run the regenerate command. `segment` is 1-based.
pub async fn run_regenerate(
    id: i64,
    segment: usize,
    file: Option<&Path>,
    fixes: PronunciationFixes<'_>,
    settings: Settings,
) -> Result<()> {
    preflight::check(Operation::Generate, &settings)?;

    if segment == 0 {
        return Err(anyhow::anyhow!("segment numbers start at 1"));
    }
    let index = segment - 1;
    let edited = match file {
        Some(file) => {
            let text = tokio::fs::read_to_string(file).await?;
            if text.trim().is_empty() {
                return Err(anyhow::anyhow!("{} is empty", file.display()));
            }
            Some(text)
        }
        None => None,
    };

    let progress = Arc::new(SpinnerProgress::new("Loading project..."));
    let mut pipeline = build_pipeline(&settings, progress.clone())?;
    pipeline.resume(id).await?;

    let mut fragment = match edited {
        Some(text) => text,
        None => pipeline.segment_text(index)?.to_string(),
    };

    fragment = apply_stress(&fragment, fixes.stress)?;
    for word in fixes.phoneme {
        match pipeline.mark_phoneme(&fragment, word).await {
            Ok(marked) => fragment = marked,
            Err(e) => {
                progress.finish();
                Output::error(&e.to_string());
                return Err(e.into());
            }
        }
    }
    if !fixes.is_empty() {
        progress.finish();
        Output::header(&format!("Segment {} after pronunciation fixes", segment));
        println!("{}", fragment.trim());
    }

    let result = pipeline.regenerate_segment(index, &fragment).await;
    progress.finish();

    match result {
        Ok(()) => Output::success(&format!(
            "Regenerated segment {} of {}",
            segment,
            pipeline.session().audio_segments.len()
        )),
        Err(e) => recover(&mut pipeline, e).await?,
    }
    Ok(())
}
