//! The generation pipeline.
//!
//! Drives a project from source documents to a finished podcast:
//! outline, per-idea summaries, structured content, script and timeline,
//! then audio. Each stage either commits its artifacts and moves the
//! session forward, or leaves the session at the last state it reached
//! and reports which stage failed.

mod progress;
mod session;
mod state;

pub use progress::{LogProgress, ProgressSink};
pub use session::Session;
pub use state::{classify, EditTarget, PipelineState, Stage};

use crate::config::Settings;
use crate::error::{Result, StudycastError};
use crate::extract::combine_sources;
use crate::generation::{synthesize_segment, ContentGenerator, RetryPolicy, SpeechSynthesizer};
use crate::outline::{generate_final_content, Outline, TreePath};
use crate::script::pronunciation::{check_single_word, phoneme_tag, replace_word};
use crate::script::{correct_alternation, join_segments, split_segments, Speakers};
use crate::store::{NewProject, ProjectStore, ProjectUpdate, UploadedFile};
use crate::study_aids::generate_study_aids;
use crate::timeline::Timeline;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Subject used when the outline does not name one.
const UNTITLED: &str = "Untitled Project";

/// Knobs the pipeline needs from the configuration.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub speakers: Speakers,
    pub separator: String,
    pub retry: RetryPolicy,
    pub study_aids: bool,
}

impl PipelineOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            speakers: settings.script.speakers(),
            separator: settings.script.separator.clone(),
            retry: settings.speech.retry_policy(),
            study_aids: settings.pipeline.study_aids,
        }
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

/// Update that clears everything produced from the content tree onwards.
fn content_cleared() -> ProjectUpdate {
    ProjectUpdate {
        study_materials_json: Some(None),
        timeline_json: Some(None),
        full_script: Some(None),
        audio_segments: Some(Vec::new()),
        ..Default::default()
    }
}

/// Step-by-step and fully automatic podcast generation for one project at a time.
pub struct Pipeline {
    generator: Arc<dyn ContentGenerator>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    store: Arc<dyn ProjectStore>,
    progress: Arc<dyn ProgressSink>,
    options: PipelineOptions,
    session: Session,
}

impl Pipeline {
    pub fn new(
        generator: Arc<dyn ContentGenerator>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        store: Arc<dyn ProjectStore>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            generator,
            synthesizer,
            store,
            progress: Arc::new(LogProgress),
            options,
            session: Session::default(),
        }
    }

    /// Send progress messages somewhere other than the log.
    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> PipelineState {
        self.session.state
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    // ---- public stage operations ----

    /// Build the outline from the selected files and create the project.
    ///
    /// Any project already loaded is replaced on success.
    #[instrument(skip_all, fields(files = files.len()))]
    pub async fn start(&mut self, files: Vec<UploadedFile>) -> Result<i64> {
        match self.outline_step(files).await {
            Ok(id) => Ok(id),
            Err(e) => Err(self.fail(Stage::Outline, e)),
        }
    }

    /// Summarize every top-level idea of the (possibly edited) outline, in order.
    pub async fn generate_summaries(&mut self, outline_json: &str) -> Result<()> {
        match self.summaries_step(outline_json).await {
            Ok(()) => Ok(()),
            Err(e) => Err(self.fail(Stage::Summary, e)),
        }
    }

    /// Turn the summaries into the content tree.
    pub async fn structure_content(&mut self) -> Result<()> {
        match self.structure_step().await {
            Ok(()) => Ok(()),
            Err(e) => Err(self.fail(Stage::Structuring, e)),
        }
    }

    /// Write the script and the timeline (and study aids when enabled).
    pub async fn generate_content(&mut self, final_content_json: &str) -> Result<()> {
        match self.content_step(final_content_json).await {
            Ok(()) => Ok(()),
            Err(e) => Err(self.fail(Stage::Content, e)),
        }
    }

    /// Synthesize every segment of the (possibly edited) script, in order.
    pub async fn synthesize_audio(&mut self, script: &str, study_materials_json: &str) -> Result<()> {
        match self.audio_step(script, study_materials_json).await {
            Ok(()) => Ok(()),
            Err(e) => Err(self.fail(Stage::Audio, e)),
        }
    }

    /// Accept the generated audio.
    pub fn approve_audio(&mut self) -> Result<()> {
        self.require(PipelineState::AudioReady, "approve audio")?;
        if self.session.state < PipelineState::AudioReviewed {
            self.session.state = PipelineState::AudioReviewed;
        }
        Ok(())
    }

    pub fn complete(&mut self) -> Result<()> {
        self.require(PipelineState::AudioReviewed, "complete the project")?;
        self.session.state = PipelineState::Complete;
        Ok(())
    }

    /// Run the next step-by-step stage using the artifacts currently held.
    pub async fn advance(&mut self) -> Result<PipelineState> {
        match self.session.state {
            PipelineState::Collecting => {
                return Err(self.invalid_state("start a project from source documents first"))
            }
            PipelineState::OutlineReady => {
                let outline = self.artifact(&self.session.outline_json, "outline")?;
                self.generate_summaries(&outline).await?;
                self.structure_content().await?;
            }
            PipelineState::SummariesReady => self.structure_content().await?,
            PipelineState::ContentReady => {
                let content = self.artifact(&self.session.final_content_json, "content")?;
                self.generate_content(&content).await?;
            }
            PipelineState::ScriptReady => {
                let script = self.artifact(&self.session.full_script, "script")?;
                let study = self.artifact(&self.session.study_materials_json, "study materials")?;
                self.synthesize_audio(&script, &study).await?;
            }
            PipelineState::AudioReady => self.approve_audio()?,
            PipelineState::AudioReviewed => self.complete()?,
            PipelineState::Complete => {
                return Err(self.invalid_state("the project is already complete"))
            }
        }
        Ok(self.session.state)
    }

    /// Run every stage from the outline to finished audio without pausing.
    pub async fn run_full(&mut self, outline_json: &str) -> Result<()> {
        match self.run_full_inner(outline_json).await {
            Ok(()) => {
                self.session.state = PipelineState::Complete;
                info!("Automatic generation complete");
                Ok(())
            }
            Err(e) => Err(self.fail(Stage::Automatic, e)),
        }
    }

    /// Re-synthesize one segment from an edited fragment.
    ///
    /// Every other segment and its audio is left untouched. Calls are
    /// serialized by the exclusive borrow; a cancelled call changes no
    /// segment and does not block the next one.
    #[instrument(skip(self, fragment))]
    pub async fn regenerate_segment(&mut self, index: usize, fragment: &str) -> Result<()> {
        match self.regenerate_step(index, fragment).await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(error = %e, "Segment regeneration did not complete");
                self.session.last_error = Some(e.to_string());
                self.session.progress_message.clear();
                Err(e)
            }
        }
    }

    /// Current text of one script segment.
    pub fn segment_text(&self, index: usize) -> Result<&str> {
        self.session
            .script_segments
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| {
                StudycastError::InvalidInput(format!(
                    "segment {} does not exist (the script has {} segments)",
                    index + 1,
                    self.session.script_segments.len()
                ))
            })
    }

    /// Wrap every occurrence of `word` in `fragment` with its IPA pronunciation.
    ///
    /// Only the returned text changes; pass it to [`Pipeline::regenerate_segment`].
    pub async fn mark_phoneme(&mut self, fragment: &str, word: &str) -> Result<String> {
        let result = async {
            let word = check_single_word(word)?;
            let ipa = self.generator.phoneme_for_word(word).await?;
            replace_word(fragment, word, &phoneme_tag(word, &ipa))
        }
        .await;
        result.map_err(|e| self.fail(Stage::Pronunciation, e))
    }

    /// Copy-on-write edit of one tree-shaped artifact.
    ///
    /// The outline can be edited until summaries exist; the content tree and
    /// the study materials until audio exists.
    pub async fn edit(
        &mut self,
        target: EditTarget,
        path: &TreePath,
        value: serde_json::Value,
    ) -> Result<()> {
        match self.edit_step(target, path, value).await {
            Ok(()) => Ok(()),
            Err(e) => Err(self.fail(Stage::Editing, e)),
        }
    }

    /// Replace the whole script before audio is generated.
    ///
    /// The text is split into segments as given; speaker tags are not corrected.
    pub async fn edit_script(&mut self, script: &str) -> Result<()> {
        match self.script_edit_step(script).await {
            Ok(()) => Ok(()),
            Err(e) => Err(self.fail(Stage::Editing, e)),
        }
    }

    /// Load a persisted project and pick up where it left off.
    #[instrument(skip(self))]
    pub async fn resume(&mut self, project_id: i64) -> Result<PipelineState> {
        let project = self
            .store
            .get(project_id)
            .await?
            .ok_or(StudycastError::ProjectNotFound(project_id))?;

        self.session = Session::from_project(project, &self.options.separator);
        info!(
            "Resumed project {} '{}' at {}",
            project_id, self.session.subject, self.session.state
        );
        Ok(self.session.state)
    }

    /// Forget the loaded project. Nothing persisted is deleted.
    pub fn reset(&mut self) {
        self.session = Session::default();
    }

    /// Write the whole session to the store after an earlier save failed.
    pub async fn save(&mut self) -> Result<()> {
        if !self.session.dirty {
            return Ok(());
        }

        let id = match self.session.project_id {
            Some(id) => id,
            None => {
                let project = self
                    .session
                    .new_project()
                    .ok_or_else(|| self.invalid_state("there is nothing to save yet"))?;
                let id = self.store.create(project).await?;
                self.session.project_id = Some(id);
                id
            }
        };

        self.store.update(id, self.session.full_update()).await?;
        self.session.dirty = false;
        self.session.last_error = None;
        info!("Saved project {}", id);
        Ok(())
    }

    pub fn dismiss_error(&mut self) {
        self.session.last_error = None;
    }

    // ---- stage bodies ----

    async fn outline_step(&mut self, files: Vec<UploadedFile>) -> Result<i64> {
        self.session.last_error = None;
        if !files.iter().any(|f| f.selected) {
            return Err(StudycastError::InvalidInput(
                "no source documents are selected".to_string(),
            ));
        }

        self.report("Generating outline from content...");
        let combined = combine_sources(&files);
        let response = self.generator.generate_outline(&combined).await?;
        let outline = Outline::from_json(&response)?;

        let subject = match outline.subject.trim() {
            "" => UNTITLED.to_string(),
            s => s.to_string(),
        };
        let outline_json = outline.to_pretty_json()?;
        info!(
            "Outline for '{}' has {} ideas ({} nodes)",
            subject,
            outline.ideas.len(),
            outline.node_count()
        );

        self.session = Session {
            state: PipelineState::OutlineReady,
            subject: subject.clone(),
            uploaded_files: files.clone(),
            outline_json: Some(outline_json.clone()),
            ..Default::default()
        };

        let project = NewProject {
            subject,
            uploaded_files: files,
            outline_json,
        };
        match self.store.create(project).await {
            Ok(id) => {
                self.session.project_id = Some(id);
                Ok(id)
            }
            Err(e) => {
                warn!(error = %e, "Could not create project");
                self.session.dirty = true;
                Err(StudycastError::Unsaved {
                    stage: Stage::Outline,
                    source: Box::new(e),
                })
            }
        }
    }

    async fn summaries_step(&mut self, outline_json: &str) -> Result<()> {
        self.require(PipelineState::OutlineReady, "generate summaries")?;
        self.session.last_error = None;
        self.session.outline_json = Some(outline_json.to_string());

        let mut outline = Outline::from_json(outline_json)?;
        if outline.ideas.is_empty() {
            return Err(StudycastError::InvalidInput(
                "the outline has no ideas".to_string(),
            ));
        }
        for idea in &outline.ideas {
            idea.validate()?;
        }

        let original_text = combine_sources(&self.session.uploaded_files);
        let total = outline.ideas.len();
        let mut previous: Option<String> = None;

        // Sequential: each summary is written knowing the one before it.
        for i in 0..total {
            self.report(format!("Generating summary for idea {} of {}...", i + 1, total));
            let summary = self
                .generator
                .generate_summary(&outline.ideas[i], &original_text, previous.as_deref())
                .await?;
            outline.ideas[i].summary = Some(summary.clone());
            previous = Some(summary);
        }

        let with_summaries = outline.to_pretty_json()?;
        self.session.outline_with_summaries_json = Some(with_summaries.clone());
        self.session.clear_after_summaries();
        self.session.state = PipelineState::SummariesReady;
        self.session.progress_message.clear();

        let update = ProjectUpdate {
            outline_json: Some(Some(outline_json.to_string())),
            outline_with_summaries_json: Some(Some(with_summaries)),
            final_content_json: Some(None),
            ..content_cleared()
        };
        self.persist(Stage::Summary, update).await
    }

    async fn structure_step(&mut self) -> Result<()> {
        self.require(PipelineState::SummariesReady, "structure content")?;
        self.session.last_error = None;
        let source = self.artifact(&self.session.outline_with_summaries_json, "summaries")?;

        self.report("Parsing and structuring summaries...");
        let outline = Outline::from_json(&source)?;
        let content = generate_final_content(&outline);
        if content.ideas.is_empty() {
            warn!("No summary produced any headings; the content tree is empty");
        }
        let content_json = content.to_pretty_json()?;

        self.session.final_content_json = Some(content_json.clone());
        self.session.clear_after_content();
        self.session.state = PipelineState::ContentReady;
        self.session.progress_message.clear();

        let update = ProjectUpdate {
            final_content_json: Some(Some(content_json)),
            ..content_cleared()
        };
        self.persist(Stage::Structuring, update).await
    }

    async fn content_step(&mut self, final_content_json: &str) -> Result<()> {
        self.require(PipelineState::ContentReady, "generate the script")?;
        self.session.last_error = None;
        self.session.final_content_json = Some(final_content_json.to_string());

        let content = Outline::from_json(final_content_json)?;
        self.report("Generating podcast script and timeline...");

        let (script, timeline) = tokio::join!(
            self.generator.generate_script(final_content_json),
            self.generator.generate_timeline(final_content_json),
        );

        let script = correct_alternation(&script?, &self.options.speakers, &self.options.separator);
        let segments = split_segments(&script, &self.options.separator);
        if segments.is_empty() {
            return Err(StudycastError::Generation(
                "the generated script is empty".to_string(),
            ));
        }

        let timeline = match timeline {
            Ok(response) => Timeline::parse_or_empty(&response),
            Err(e) => {
                warn!(error = %e, "Timeline generation failed, using an empty timeline");
                Timeline::default()
            }
        };
        let timeline = timeline.retain_known(&content.node_ids()).dedup();
        let timeline_json = timeline.to_pretty_json()?;

        let study_json = if self.options.study_aids {
            generate_study_aids(self.generator.as_ref(), &content, self.progress.as_ref())
                .await?
                .to_pretty_json()?
        } else {
            final_content_json.to_string()
        };

        info!(
            "Script has {} segments, timeline has {} events",
            segments.len(),
            timeline.events.len()
        );

        self.session.full_script = Some(script.clone());
        self.session.script_segments = segments;
        self.session.timeline_json = Some(timeline_json.clone());
        self.session.study_materials_json = Some(study_json.clone());
        self.session.audio_segments.clear();
        self.session.state = PipelineState::ScriptReady;
        self.session.progress_message.clear();

        let update = ProjectUpdate {
            final_content_json: Some(Some(final_content_json.to_string())),
            study_materials_json: Some(Some(study_json)),
            timeline_json: Some(Some(timeline_json)),
            full_script: Some(Some(script)),
            audio_segments: Some(Vec::new()),
            ..Default::default()
        };
        self.persist(Stage::Content, update).await
    }

    async fn audio_step(&mut self, script: &str, study_materials_json: &str) -> Result<()> {
        self.require(PipelineState::ScriptReady, "generate audio")?;
        self.session.last_error = None;

        let segments = split_segments(script, &self.options.separator);
        if segments.is_empty() {
            return Err(StudycastError::InvalidInput(
                "the script has no segments".to_string(),
            ));
        }
        self.session.full_script = Some(script.to_string());
        self.session.study_materials_json = Some(study_materials_json.to_string());

        let total = segments.len();
        let mut audio = Vec::with_capacity(total);
        for (i, segment) in segments.iter().enumerate() {
            self.report(format!("Generating audio for segment {} of {}...", i + 1, total));
            let payload = synthesize_segment(
                self.synthesizer.as_ref(),
                segment,
                &self.options.speakers,
                self.options.retry,
            )
            .await?;
            audio.push(payload);
        }

        self.session.script_segments = segments;
        self.session.audio_segments = audio;
        self.session.state = PipelineState::AudioReady;
        self.session.progress_message.clear();

        let update = ProjectUpdate {
            study_materials_json: Some(Some(study_materials_json.to_string())),
            full_script: Some(Some(script.to_string())),
            audio_segments: Some(self.session.audio_segments.clone()),
            ..Default::default()
        };
        self.persist(Stage::Audio, update).await
    }

    async fn run_full_inner(&mut self, outline_json: &str) -> Result<()> {
        self.summaries_step(outline_json).await?;
        self.structure_step().await?;

        let content = self.artifact(&self.session.final_content_json, "content")?;
        self.content_step(&content).await?;

        let script = self.artifact(&self.session.full_script, "script")?;
        let study = self.artifact(&self.session.study_materials_json, "study materials")?;
        self.audio_step(&script, &study).await
    }

    async fn regenerate_step(&mut self, index: usize, fragment: &str) -> Result<()> {
        let count = self.session.audio_segments.len();
        if count == 0 {
            return Err(self.invalid_state("there is no audio to regenerate"));
        }
        if index >= count || index >= self.session.script_segments.len() {
            return Err(StudycastError::InvalidInput(format!(
                "segment {} does not exist (the project has {} segments)",
                index + 1,
                count
            )));
        }
        let fragment = fragment.trim();
        if fragment.is_empty() {
            return Err(StudycastError::InvalidInput(format!(
                "the new text of segment {} is empty",
                index + 1
            )));
        }

        self.session.last_error = None;
        self.report(format!("Regenerating audio for segment {}...", index + 1));

        let payload = synthesize_segment(
            self.synthesizer.as_ref(),
            fragment,
            &self.options.speakers,
            self.options.retry,
        )
        .await
        .map_err(|e| StudycastError::SegmentFailed {
            segment: index + 1,
            source: Box::new(e),
        })?;

        self.session.audio_segments[index] = payload;
        self.session.script_segments[index] = fragment.to_string();
        let full_script = join_segments(&self.session.script_segments, &self.options.separator);
        self.session.full_script = Some(full_script.clone());
        self.session.progress_message.clear();

        let update = ProjectUpdate {
            full_script: Some(Some(full_script)),
            audio_segments: Some(self.session.audio_segments.clone()),
            ..Default::default()
        };
        self.persist(Stage::SegmentRegeneration, update).await
    }

    async fn edit_step(
        &mut self,
        target: EditTarget,
        path: &TreePath,
        value: serde_json::Value,
    ) -> Result<()> {
        if !target.editable_in(self.session.state) {
            return Err(self.invalid_state(&format!("the {} cannot be edited now", target)));
        }

        let current = match target {
            EditTarget::Outline => &self.session.outline_json,
            EditTarget::Content => &self.session.final_content_json,
            EditTarget::StudyMaterials => &self.session.study_materials_json,
        };
        let tree = Outline::from_json(&self.artifact(current, &target.to_string())?)?;
        let edited = tree.with_value_at(path, value)?;
        for idea in &edited.ideas {
            idea.validate()?;
        }
        let json = edited.to_pretty_json()?;

        let update = match target {
            EditTarget::Outline => {
                self.session.outline_json = Some(json.clone());
                ProjectUpdate {
                    outline_json: Some(Some(json)),
                    ..Default::default()
                }
            }
            EditTarget::Content => {
                self.session.final_content_json = Some(json.clone());
                ProjectUpdate {
                    final_content_json: Some(Some(json)),
                    ..Default::default()
                }
            }
            EditTarget::StudyMaterials => {
                self.session.study_materials_json = Some(json.clone());
                ProjectUpdate {
                    study_materials_json: Some(Some(json)),
                    ..Default::default()
                }
            }
        };
        info!("Edited {} at {}", target, path);
        self.persist(Stage::Editing, update).await
    }

    async fn script_edit_step(&mut self, script: &str) -> Result<()> {
        if self.session.state != PipelineState::ScriptReady {
            return Err(self.invalid_state("the script can only be replaced before audio exists"));
        }
        let segments = split_segments(script, &self.options.separator);
        if segments.is_empty() {
            return Err(StudycastError::InvalidInput(
                "the script has no segments".to_string(),
            ));
        }

        info!("Script replaced, {} segments", segments.len());
        self.session.full_script = Some(script.to_string());
        self.session.script_segments = segments;

        let update = ProjectUpdate {
            full_script: Some(Some(script.to_string())),
            ..Default::default()
        };
        self.persist(Stage::Editing, update).await
    }

    // ---- helpers ----

    fn report(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.progress.message(&message);
        self.session.progress_message = message;
    }

    /// Record a stage failure for display and return it.
    fn fail(&mut self, stage: Stage, err: StudycastError) -> StudycastError {
        let err = if err.is_unsaved() { err } else { err.in_stage(stage) };
        warn!(error = %err, "Stage did not complete");
        self.session.last_error = Some(err.to_string());
        self.session.progress_message.clear();
        err
    }

    fn invalid_state(&self, reason: &str) -> StudycastError {
        StudycastError::InvalidState {
            state: self.session.state.to_string(),
            reason: reason.to_string(),
        }
    }

    fn require(&self, min: PipelineState, action: &str) -> Result<()> {
        if self.session.state < min {
            return Err(self.invalid_state(&format!("cannot {} yet", action)));
        }
        Ok(())
    }

    fn artifact(&self, value: &Option<String>, name: &str) -> Result<String> {
        value
            .clone()
            .ok_or_else(|| self.invalid_state(&format!("the project has no {}", name)))
    }

    /// Write an update, or the whole session if an earlier write was lost.
    async fn persist(&mut self, stage: Stage, update: ProjectUpdate) -> Result<()> {
        let Some(id) = self.session.project_id else {
            self.session.dirty = true;
            return Err(StudycastError::Unsaved {
                stage,
                source: Box::new(StudycastError::Persistence(
                    "the project was never created".to_string(),
                )),
            });
        };

        let update = if self.session.dirty {
            self.session.full_update()
        } else {
            update
        };

        match self.store.update(id, update).await {
            Ok(()) => {
                self.session.dirty = false;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Could not save project {}", id);
                self.session.dirty = true;
                Err(StudycastError::Unsaved {
                    stage,
                    source: Box::new(e),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::MainIdea;
    use crate::store::{MemoryProjectStore, Project};
    use async_trait::async_trait;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::Notify;

    const OUTLINE: &str = r#"{
        "subject": "Rivoluzione Francese",
        "description": "Dal 1789 al 1799",
        "ideas": [
            {"id": "1", "level": 1, "title": "Origini",
             "sub_ideas": [{"id": "1.1", "level": 2, "title": "Cause"}]},
            {"id": "2", "level": 1, "title": "Sviluppi"}
        ]
    }"#;

    const SCRIPT: &str =
        "Voce 1: Ciao\nVoce 1: Benvenuti\n\n--- SEGMENT ---\n\nVoce 1: Parliamo\nVoce 1: Certo";

    const TIMELINE: &str = r#"{"events": [
        {"date": "1789", "event": "Presa della Bastiglia", "nodeId": "1"},
        {"date": "1789 ", "event": "presa della bastiglia", "nodeId": "2"},
        {"date": "1800", "event": "Evento fantasma", "nodeId": "99"}
    ]}"#;

    struct FakeGenerator {
        script: Option<String>,
        timeline: Option<String>,
        summary_calls: Mutex<Vec<(String, Option<String>)>>,
        /// 1-based summary call that fails.
        fail_summary_at: Option<usize>,
        /// Script and timeline each wait until the other has started.
        rendezvous: bool,
        script_started: Notify,
        timeline_started: Notify,
    }

    impl FakeGenerator {
        fn new() -> Self {
            Self {
                script: Some(SCRIPT.to_string()),
                timeline: Some(TIMELINE.to_string()),
                summary_calls: Mutex::new(Vec::new()),
                fail_summary_at: None,
                rendezvous: false,
                script_started: Notify::new(),
                timeline_started: Notify::new(),
            }
        }
    }

    #[async_trait]
    impl ContentGenerator for FakeGenerator {
        async fn generate_outline(&self, combined_text: &str) -> Result<String> {
            assert!(combined_text.contains("--- START OF storia.txt ---"));
            Ok(OUTLINE.to_string())
        }

        async fn generate_summary(
            &self,
            idea: &MainIdea,
            _original_text: &str,
            previous_summary: Option<&str>,
        ) -> Result<String> {
            let call = {
                let mut calls = self.summary_calls.lock().unwrap();
                calls.push((idea.id.clone(), previous_summary.map(str::to_string)));
                calls.len()
            };
            if self.fail_summary_at == Some(call) {
                return Err(StudycastError::Generation("quota exceeded".to_string()));
            }
            let mut summary = format!("# {}\nIntro di {}", idea.title, idea.id);
            for sub in idea.sub_ideas.iter().flatten() {
                summary.push_str(&format!("\n## {}\nDettagli di {}", sub.title, sub.id));
            }
            Ok(summary)
        }

        async fn generate_script(&self, _final_content_json: &str) -> Result<String> {
            if self.rendezvous {
                self.script_started.notify_one();
                self.timeline_started.notified().await;
            }
            self.script
                .clone()
                .ok_or_else(|| StudycastError::Generation("model unavailable".to_string()))
        }

        async fn generate_timeline(&self, _final_content_json: &str) -> Result<String> {
            if self.rendezvous {
                self.timeline_started.notify_one();
                self.script_started.notified().await;
            }
            self.timeline
                .clone()
                .ok_or_else(|| StudycastError::Generation("model unavailable".to_string()))
        }

        async fn generate_study_aids(&self, _title: &str, _material: &str) -> Result<String> {
            Ok(r#"{"quizQuestions": [{"question": "Quando?", "options": ["1789", "1799", "1804", "1815"], "correctAnswerIndex": 0}]}"#.to_string())
        }

        async fn phoneme_for_word(&self, word: &str) -> Result<String> {
            match word {
                "Robespierre" => Ok("ʁɔbɛspjɛʁ".to_string()),
                _ => Err(StudycastError::Generation("unknown word".to_string())),
            }
        }
    }

    #[derive(Default)]
    struct FakeSynth {
        failing: AtomicBool,
        /// Never answer, as a stalled connection would.
        hanging: AtomicBool,
        calls: AtomicUsize,
        /// Every call from this 1-based call number on fails; 0 disables.
        fail_from_call: AtomicUsize,
    }

    #[async_trait]
    impl SpeechSynthesizer for FakeSynth {
        async fn synthesize(&self, segment: &str, _speakers: &Speakers) -> Result<String> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.hanging.load(Ordering::SeqCst) {
                std::future::pending::<()>().await;
            }
            let fail_from = self.fail_from_call.load(Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) || (fail_from > 0 && call >= fail_from) {
                return Err(StudycastError::AudioSynthesis("service down".to_string()));
            }
            Ok(STANDARD.encode(segment))
        }
    }

    /// Memory store whose updates can be made to fail.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryProjectStore,
        failing: AtomicBool,
    }

    #[async_trait]
    impl ProjectStore for FlakyStore {
        async fn create(&self, project: NewProject) -> Result<i64> {
            self.inner.create(project).await
        }

        async fn update(&self, id: i64, update: ProjectUpdate) -> Result<()> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(StudycastError::Persistence("disk full".to_string()));
            }
            self.inner.update(id, update).await
        }

        async fn get(&self, id: i64) -> Result<Option<Project>> {
            self.inner.get(id).await
        }

        async fn list(&self) -> Result<Vec<Project>> {
            self.inner.list().await
        }

        async fn delete(&self, id: i64) -> Result<bool> {
            self.inner.delete(id).await
        }
    }

    fn options() -> PipelineOptions {
        PipelineOptions {
            retry: RetryPolicy {
                max_attempts: 2,
                base_delay: Duration::ZERO,
            },
            ..Default::default()
        }
    }

    fn pipeline_with(
        generator: FakeGenerator,
    ) -> (Pipeline, Arc<FakeGenerator>, Arc<FakeSynth>, Arc<FlakyStore>) {
        let generator = Arc::new(generator);
        let synth = Arc::new(FakeSynth::default());
        let store = Arc::new(FlakyStore::default());
        let pipeline = Pipeline::new(generator.clone(), synth.clone(), store.clone(), options());
        (pipeline, generator, synth, store)
    }

    fn files() -> Vec<UploadedFile> {
        vec![UploadedFile::new("storia.txt", "Nel 1789 il popolo di Parigi...")]
    }

    #[tokio::test]
    async fn test_step_by_step_to_complete() {
        let (mut pipeline, _, _, store) = pipeline_with(FakeGenerator::new());

        let id = pipeline.start(files()).await.unwrap();
        assert_eq!(pipeline.state(), PipelineState::OutlineReady);
        assert_eq!(pipeline.session().subject, "Rivoluzione Francese");

        assert_eq!(pipeline.advance().await.unwrap(), PipelineState::ContentReady);
        let content = Outline::from_json(pipeline.session().final_content_json.as_ref().unwrap()).unwrap();
        assert_eq!(content.node_ids(), vec!["1", "1.1", "2"]);

        assert_eq!(pipeline.advance().await.unwrap(), PipelineState::ScriptReady);
        let session = pipeline.session();
        assert_eq!(
            session.script_segments,
            vec!["Voce 1: Ciao\nVoce 2: Benvenuti", "Voce 1: Parliamo\nVoce 2: Certo"]
        );
        let timeline: Timeline = serde_json::from_str(session.timeline_json.as_ref().unwrap()).unwrap();
        assert_eq!(timeline.events.len(), 1);
        assert_eq!(timeline.events[0].node_id, "1");
        assert_eq!(session.study_materials_json, session.final_content_json);

        assert_eq!(pipeline.advance().await.unwrap(), PipelineState::AudioReady);
        assert_eq!(pipeline.session().audio_segments.len(), 2);
        assert_eq!(pipeline.advance().await.unwrap(), PipelineState::AudioReviewed);
        assert_eq!(pipeline.advance().await.unwrap(), PipelineState::Complete);
        assert!(pipeline.advance().await.is_err());

        let project = store.get(id).await.unwrap().unwrap();
        assert_eq!(project.audio_segments.len(), 2);
        assert_eq!(classify(&project), PipelineState::AudioReviewed);
    }

    #[tokio::test]
    async fn test_summaries_are_sequential_with_previous_context() {
        let (mut pipeline, generator, _, _) = pipeline_with(FakeGenerator::new());
        pipeline.start(files()).await.unwrap();
        pipeline.generate_summaries(OUTLINE).await.unwrap();
        assert_eq!(pipeline.state(), PipelineState::SummariesReady);

        let calls = generator.summary_calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], ("1".to_string(), None));
        assert_eq!(calls[1].0, "2");
        assert!(calls[1].1.as_deref().unwrap().starts_with("# Origini"));
    }

    #[tokio::test]
    async fn test_failure_names_stage_and_keeps_state() {
        let mut generator = FakeGenerator::new();
        generator.script = None;
        let (mut pipeline, _, _, _) = pipeline_with(generator);
        pipeline.start(files()).await.unwrap();
        pipeline.advance().await.unwrap();

        let err = pipeline.advance().await.unwrap_err();
        assert!(err.to_string().starts_with("Content Generation Failed:"));
        assert_eq!(pipeline.state(), PipelineState::ContentReady);
        assert!(pipeline.session().full_script.is_none());
        assert!(pipeline.session().last_error.is_some());

        pipeline.dismiss_error();
        assert!(pipeline.session().last_error.is_none());
    }

    #[tokio::test]
    async fn test_timeline_failure_is_not_fatal() {
        let mut generator = FakeGenerator::new();
        generator.timeline = None;
        let (mut pipeline, _, _, _) = pipeline_with(generator);
        pipeline.start(files()).await.unwrap();
        pipeline.advance().await.unwrap();
        pipeline.advance().await.unwrap();

        assert_eq!(pipeline.state(), PipelineState::ScriptReady);
        let timeline: Timeline =
            serde_json::from_str(pipeline.session().timeline_json.as_ref().unwrap()).unwrap();
        assert!(timeline.is_empty());
    }

    #[tokio::test]
    async fn test_study_aids_when_enabled() {
        let generator = Arc::new(FakeGenerator::new());
        let store = Arc::new(FlakyStore::default());
        let options = PipelineOptions {
            study_aids: true,
            ..options()
        };
        let mut pipeline =
            Pipeline::new(generator, Arc::new(FakeSynth::default()), store, options);
        pipeline.start(files()).await.unwrap();
        pipeline.advance().await.unwrap();
        pipeline.advance().await.unwrap();

        let study = Outline::from_json(pipeline.session().study_materials_json.as_ref().unwrap()).unwrap();
        let cards = study.ideas[0].flashcards.as_ref().unwrap();
        assert_eq!(cards[0].back, "1789");
    }

    #[tokio::test]
    async fn test_audio_failure_reverts_to_script() {
        let (mut pipeline, _, synth, _) = pipeline_with(FakeGenerator::new());
        pipeline.start(files()).await.unwrap();
        pipeline.advance().await.unwrap();
        pipeline.advance().await.unwrap();

        synth.failing.store(true, Ordering::SeqCst);
        let err = pipeline.advance().await.unwrap_err();
        assert!(err.to_string().starts_with("Audio Generation Failed:"));
        assert_eq!(pipeline.state(), PipelineState::ScriptReady);
        assert!(pipeline.session().audio_segments.is_empty());
    }

    #[tokio::test]
    async fn test_run_full_reaches_complete() {
        let (mut pipeline, _, _, _) = pipeline_with(FakeGenerator::new());
        pipeline.start(files()).await.unwrap();
        pipeline.run_full(OUTLINE).await.unwrap();
        assert_eq!(pipeline.state(), PipelineState::Complete);
        assert_eq!(pipeline.session().audio_segments.len(), 2);
    }

    #[tokio::test]
    async fn test_run_full_failure_is_automatic_and_keeps_progress() {
        let mut generator = FakeGenerator::new();
        generator.script = None;
        let (mut pipeline, _, _, _) = pipeline_with(generator);
        pipeline.start(files()).await.unwrap();

        let err = pipeline.run_full(OUTLINE).await.unwrap_err();
        assert!(err.to_string().starts_with("Automatic Generation Failed:"));
        assert_eq!(pipeline.state(), PipelineState::ContentReady);
    }

    #[tokio::test]
    async fn test_regeneration_touches_one_segment() {
        let (mut pipeline, _, _, store) = pipeline_with(FakeGenerator::new());
        let segments: Vec<String> = (1..=5).map(|i| format!("Voce 1: parte {}", i)).collect();
        let audio: Vec<String> = (1..=5).map(|i| format!("audio{}", i)).collect();

        let id = store
            .create(NewProject {
                subject: "Storia".to_string(),
                uploaded_files: files(),
                outline_json: OUTLINE.to_string(),
            })
            .await
            .unwrap();
        store
            .update(
                id,
                ProjectUpdate {
                    full_script: Some(Some(join_segments(&segments, "--- SEGMENT ---"))),
                    audio_segments: Some(audio.clone()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(pipeline.resume(id).await.unwrap(), PipelineState::AudioReviewed);
        pipeline
            .regenerate_segment(2, "Voce 2: parte nuova")
            .await
            .unwrap();

        let session = pipeline.session();
        for i in [0, 1, 3, 4] {
            assert_eq!(session.audio_segments[i], audio[i]);
            assert_eq!(session.script_segments[i], segments[i]);
        }
        assert_ne!(session.audio_segments[2], audio[2]);
        assert_eq!(session.script_segments[2], "Voce 2: parte nuova");

        let project = store.get(id).await.unwrap().unwrap();
        assert_eq!(project.audio_segments, session.audio_segments);
        assert!(project.full_script.unwrap().contains("Voce 2: parte nuova"));
    }

    #[tokio::test]
    async fn test_regeneration_failure_message() {
        let (mut pipeline, _, synth, _) = pipeline_with(FakeGenerator::new());
        pipeline.start(files()).await.unwrap();
        pipeline.run_full(OUTLINE).await.unwrap();
        let before = pipeline.session().audio_segments.clone();

        synth.failing.store(true, Ordering::SeqCst);
        let err = pipeline.regenerate_segment(1, "Voce 1: altro").await.unwrap_err();
        assert!(err
            .to_string()
            .starts_with("Failed to regenerate audio for segment 2:"));
        assert_eq!(pipeline.session().audio_segments, before);

        assert!(matches!(
            pipeline.regenerate_segment(7, "Voce 1: x").await,
            Err(StudycastError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_unsaved_keeps_generated_content() {
        let (mut pipeline, _, _, store) = pipeline_with(FakeGenerator::new());
        let id = pipeline.start(files()).await.unwrap();

        store.failing.store(true, Ordering::SeqCst);
        let err = pipeline.generate_summaries(OUTLINE).await.unwrap_err();
        assert!(err.is_unsaved());
        assert_eq!(pipeline.state(), PipelineState::SummariesReady);
        assert!(pipeline.session().dirty);

        store.failing.store(false, Ordering::SeqCst);
        pipeline.save().await.unwrap();
        assert!(!pipeline.session().dirty);
        let project = store.get(id).await.unwrap().unwrap();
        assert!(project.outline_with_summaries_json.is_some());
    }

    #[tokio::test]
    async fn test_resume_and_reset() {
        let (mut pipeline, _, _, store) = pipeline_with(FakeGenerator::new());
        let id = store
            .create(NewProject {
                subject: "Storia".to_string(),
                uploaded_files: files(),
                outline_json: OUTLINE.to_string(),
            })
            .await
            .unwrap();

        assert_eq!(pipeline.resume(id).await.unwrap(), PipelineState::OutlineReady);
        assert!(matches!(
            pipeline.resume(404).await,
            Err(StudycastError::ProjectNotFound(404))
        ));

        pipeline.reset();
        assert_eq!(pipeline.state(), PipelineState::Collecting);
        assert!(store.get(id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_edit_outline_only_before_summaries() {
        let (mut pipeline, _, _, store) = pipeline_with(FakeGenerator::new());
        let id = pipeline.start(files()).await.unwrap();

        let path: TreePath = "ideas.1.title".parse().unwrap();
        pipeline
            .edit(EditTarget::Outline, &path, serde_json::json!("Conseguenze"))
            .await
            .unwrap();
        let project = store.get(id).await.unwrap().unwrap();
        assert!(project.outline_json.unwrap().contains("Conseguenze"));

        pipeline.advance().await.unwrap();
        let err = pipeline
            .edit(EditTarget::Outline, &path, serde_json::json!("Troppo tardi"))
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Editing Failed:"));
    }

    #[tokio::test]
    async fn test_edit_content_and_study_materials_before_audio() {
        let (mut pipeline, _, _, store) = pipeline_with(FakeGenerator::new());
        let id = pipeline.start(files()).await.unwrap();
        pipeline.advance().await.unwrap();
        assert_eq!(pipeline.state(), PipelineState::ContentReady);

        let content_path: TreePath = "ideas.0.sub_ideas.0.content".parse().unwrap();
        pipeline
            .edit(EditTarget::Content, &content_path, serde_json::json!("Debito pubblico"))
            .await
            .unwrap();
        assert!(matches!(
            pipeline
                .edit(EditTarget::StudyMaterials, &content_path, serde_json::json!("x"))
                .await,
            Err(StudycastError::StageFailed { .. })
        ));

        // The edited content tree feeds the script stage.
        pipeline.advance().await.unwrap();
        let study = pipeline.session().study_materials_json.clone().unwrap();
        assert!(study.contains("Debito pubblico"));

        let cards_path: TreePath = "ideas.1.flashcards".parse().unwrap();
        pipeline
            .edit(
                EditTarget::StudyMaterials,
                &cards_path,
                serde_json::json!([{"front": "Anno?", "back": "1789"}]),
            )
            .await
            .unwrap();
        let project = store.get(id).await.unwrap().unwrap();
        let stored = Outline::from_json(&project.study_materials_json.unwrap()).unwrap();
        assert_eq!(stored.ideas[1].flashcards.as_ref().unwrap()[0].back, "1789");

        pipeline.advance().await.unwrap();
        let err = pipeline
            .edit(EditTarget::Content, &content_path, serde_json::json!("tardi"))
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Editing Failed:"));
    }

    #[tokio::test]
    async fn test_edited_script_is_resplit_and_used_for_audio() {
        let (mut pipeline, _, _, store) = pipeline_with(FakeGenerator::new());
        let id = pipeline.start(files()).await.unwrap();
        pipeline.advance().await.unwrap();
        pipeline.advance().await.unwrap();

        let edited = "Voce 1: Uno\n\n--- SEGMENT ---\n\nVoce 2: Due\n\n--- SEGMENT ---\n\nVoce 1: Tre";
        pipeline.edit_script(edited).await.unwrap();
        assert_eq!(pipeline.session().script_segments, vec!["Voce 1: Uno", "Voce 2: Due", "Voce 1: Tre"]);
        let project = store.get(id).await.unwrap().unwrap();
        assert_eq!(project.full_script.as_deref(), Some(edited));

        assert!(pipeline.edit_script("   ").await.is_err());
        assert_eq!(pipeline.session().script_segments.len(), 3);

        pipeline.advance().await.unwrap();
        assert_eq!(pipeline.session().audio_segments.len(), 3);
        assert!(pipeline.edit_script(edited).await.is_err());
    }

    #[tokio::test]
    async fn test_audio_aborts_on_first_failed_segment() {
        let mut generator = FakeGenerator::new();
        generator.script = Some(
            "Voce 1: Uno\n\n--- SEGMENT ---\n\nVoce 1: Due\n\n--- SEGMENT ---\n\nVoce 1: Tre"
                .to_string(),
        );
        let (mut pipeline, _, synth, store) = pipeline_with(generator);
        let id = pipeline.start(files()).await.unwrap();
        pipeline.advance().await.unwrap();
        pipeline.advance().await.unwrap();
        assert_eq!(pipeline.session().script_segments.len(), 3);

        synth.fail_from_call.store(2, Ordering::SeqCst);
        let err = pipeline.advance().await.unwrap_err();
        assert!(err.to_string().starts_with("Audio Generation Failed:"));
        assert_eq!(pipeline.state(), PipelineState::ScriptReady);
        assert!(pipeline.session().audio_segments.is_empty());
        // Segment 1 once, segment 2 for both attempts, segment 3 never.
        assert_eq!(synth.calls.load(Ordering::SeqCst), 3);

        let project = store.get(id).await.unwrap().unwrap();
        assert!(project.audio_segments.is_empty());
    }

    #[tokio::test]
    async fn test_summary_failure_discards_partial_summaries() {
        let mut generator = FakeGenerator::new();
        generator.fail_summary_at = Some(2);
        let (mut pipeline, generator, _, store) = pipeline_with(generator);
        let id = pipeline.start(files()).await.unwrap();

        let three_ideas = r#"{"subject": "Rivoluzione Francese", "description": "", "ideas": [
            {"id": "1", "level": 1, "title": "Origini"},
            {"id": "2", "level": 1, "title": "Sviluppi"},
            {"id": "3", "level": 1, "title": "Esiti"}
        ]}"#;
        let err = pipeline.generate_summaries(three_ideas).await.unwrap_err();
        assert!(err.to_string().starts_with("Summary Generation Failed:"));
        assert_eq!(pipeline.state(), PipelineState::OutlineReady);
        assert!(pipeline.session().outline_with_summaries_json.is_none());
        assert_eq!(generator.summary_calls.lock().unwrap().len(), 2);

        let project = store.get(id).await.unwrap().unwrap();
        assert!(project.outline_with_summaries_json.is_none());
    }

    #[tokio::test]
    async fn test_script_and_timeline_run_concurrently() {
        let mut generator = FakeGenerator::new();
        generator.rendezvous = true;
        let (mut pipeline, _, _, _) = pipeline_with(generator);
        pipeline.start(files()).await.unwrap();
        pipeline.advance().await.unwrap();

        // Run one after the other, each would wait for the other forever.
        tokio::time::timeout(Duration::from_secs(5), pipeline.advance())
            .await
            .expect("script and timeline waited on each other")
            .unwrap();
        assert_eq!(pipeline.state(), PipelineState::ScriptReady);
    }

    #[tokio::test]
    async fn test_regeneration_retry_after_cancelled_call() {
        let (mut pipeline, _, synth, _) = pipeline_with(FakeGenerator::new());
        pipeline.start(files()).await.unwrap();
        pipeline.run_full(OUTLINE).await.unwrap();
        let before = pipeline.session().audio_segments.clone();

        synth.hanging.store(true, Ordering::SeqCst);
        let cancelled = tokio::time::timeout(
            Duration::from_millis(50),
            pipeline.regenerate_segment(0, "Voce 1: Salve"),
        )
        .await;
        assert!(cancelled.is_err());
        assert_eq!(pipeline.session().audio_segments, before);

        synth.hanging.store(false, Ordering::SeqCst);
        pipeline.regenerate_segment(1, "Voce 2: Di nuovo").await.unwrap();
        assert_eq!(pipeline.session().script_segments[1], "Voce 2: Di nuovo");
        assert_eq!(pipeline.session().audio_segments[0], before[0]);
        assert!(pipeline.session().progress_message.is_empty());
    }

    #[tokio::test]
    async fn test_blank_fragment_is_rejected() {
        let (mut pipeline, _, synth, _) = pipeline_with(FakeGenerator::new());
        pipeline.start(files()).await.unwrap();
        pipeline.run_full(OUTLINE).await.unwrap();
        let segments = pipeline.session().script_segments.clone();
        let calls = synth.calls.load(Ordering::SeqCst);

        let err = pipeline.regenerate_segment(0, " \n\t ").await.unwrap_err();
        assert!(matches!(err, StudycastError::InvalidInput(_)));
        assert_eq!(pipeline.session().script_segments, segments);
        assert_eq!(synth.calls.load(Ordering::SeqCst), calls);
        assert!(pipeline.session().last_error.is_some());
    }

    #[tokio::test]
    async fn test_unsaved_regeneration_is_reported() {
        let (mut pipeline, _, _, store) = pipeline_with(FakeGenerator::new());
        pipeline.start(files()).await.unwrap();
        pipeline.run_full(OUTLINE).await.unwrap();

        store.failing.store(true, Ordering::SeqCst);
        let err = pipeline.regenerate_segment(0, "Voce 1: Salve").await.unwrap_err();
        assert!(err.is_unsaved());
        assert_eq!(pipeline.session().script_segments[0], "Voce 1: Salve");
        assert!(pipeline.session().last_error.is_some());
        assert!(pipeline.session().progress_message.is_empty());
        assert!(pipeline.session().dirty);
    }

    #[tokio::test]
    async fn test_mark_phoneme_wraps_word() {
        let (mut pipeline, _, _, _) = pipeline_with(FakeGenerator::new());
        let marked = pipeline
            .mark_phoneme("Voce 1: Robespierre parla.", "Robespierre")
            .await
            .unwrap();
        assert_eq!(
            marked,
            "Voce 1: <phoneme alphabet=\"ipa\" ph=\"ʁɔbɛspjɛʁ\">Robespierre</phoneme> parla."
        );

        let err = pipeline
            .mark_phoneme("Voce 1: Danton parla.", "Danton")
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Pronunciation Lookup Failed:"));
        assert!(pipeline
            .mark_phoneme("Voce 1: Danton parla.", "due parole")
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_start_needs_a_selected_file() {
        let (mut pipeline, _, _, _) = pipeline_with(FakeGenerator::new());
        let mut deselected = files();
        deselected[0].selected = false;

        let err = pipeline.start(deselected).await.unwrap_err();
        assert!(err.to_string().starts_with("Outline Generation Failed:"));
        assert_eq!(pipeline.state(), PipelineState::Collecting);
    }
}
