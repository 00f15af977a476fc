//! Prompt templates for Studycast.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory
//! (`outline.toml`, `summary.toml`, `script.toml`, `timeline.toml`, `study_aids.toml`,
//! `phoneme.toml`).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Prompts {
    pub outline: PromptPair,
    pub summary: PromptPair,
    pub script: PromptPair,
    pub timeline: PromptPair,
    pub study_aids: PromptPair,
    pub phoneme: PromptPair,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// A system/user prompt pair for one request kind.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

impl PromptPair {
    fn new(system: &str, user: &str) -> Self {
        Self {
            system: system.to_string(),
            user: user.to_string(),
        }
    }

    /// Default outline prompts.
    pub fn outline() -> Self {
        Self::new(
            r#"You are an expert teacher who turns study material into a concept map.

Rules:
- Produce exactly 5 main ideas ("ideas"), in the order they should be studied
- Every main idea may have sub ideas ("sub_ideas"), and every sub idea may have nested sub ideas ("nested_sub_ideas")
- Titles are at most 3 words and unique among their siblings
- Ids are hierarchical numerals: "1".."5" for main ideas, "1.1" for sub ideas, "1.1.1" for nested sub ideas
- "level" is 1, 2 or 3 matching the nesting depth
- Respond with a single JSON object and nothing else"#,
            r#"Build the concept map for the following material.

{{text}}

Respond with JSON of the form:
{"subject": "...", "description": "...", "ideas": [{"id": "1", "level": 1, "title": "...", "sub_ideas": [{"id": "1.1", "level": 2, "title": "...", "nested_sub_ideas": [{"id": "1.1.1", "level": 3, "title": "..."}]}]}]}"#,
        )
    }

    /// Default summary prompts.
    pub fn summary() -> Self {
        Self::new(
            r#"You are an excellent tutor preparing a high school student for an oral exam.

Rules:
- The summary for this single idea is at most 400 words
- Highlight key dates, proper names, precise definitions and cause-effect links found in the source
- Use markdown headings: "#" for the main idea, "##" for sub ideas, "###" for nested sub ideas
- Every heading text must match the "title" of the corresponding node exactly
- Start immediately with the "#" heading, no introduction
- Under every heading write one paragraph focused on that node only"#,
            r#"Idea structure to summarize:
```json
{{idea}}
```
{{previous_context}}
Source text:
---
{{original_text}}
---

Write only the markdown summary for the idea structure above, starting with a "#" heading."#,
        )
    }

    /// Default script prompts.
    pub fn script() -> Self {
        Self::new(
            r#"You write scripts for educational podcasts: a balanced conversation between two peers who both explain and both ask questions.

Rules:
- Every line starts with "{{first_speaker}}:" or "{{second_speaker}}:" and the two voices strictly alternate
- Use only the information in the "content" fields of the JSON; lose nothing important
- Before the line that starts discussing a node, put a line containing only <mark node="ID"> where ID is copied exactly from that node's "id"
- Never invent ids that are not in the JSON
- After the discussion of each of the {{segment_count}} main ideas, put the separator {{separator}} on its own line
- Keep the whole script under 2200 words"#,
            r#"Content structure (your only source of content and ids):
```json
{{content}}
```

Script:"#,
        )
    }

    /// Default timeline prompts.
    pub fn timeline() -> Self {
        Self::new(
            r#"You extract chronologies from academic text.

Rules:
- Read the "content" field of every node
- Extract every dated event; periods ("1914-1918") and centuries ("5th century BC") are valid dates
- Every event carries the "id" of the node it was found in as "nodeId"
- Order events from oldest to newest
- Describe each event in at most 15 words
- Respond with a JSON object {"events": [{"date": "...", "event": "...", "nodeId": "..."}]}; use an empty array when there are no events"#,
            r#"Content structure:
```json
{{content}}
```"#,
        )
    }

    /// Default study aid prompts.
    pub fn study_aids() -> Self {
        Self::new(
            r#"You create study material that tests real understanding rather than memorization.

Rules:
- Write exactly 3 multiple-choice questions with 4 options each
- Exactly one option is correct; the others are plausible but wrong
- Respond with a JSON object {"quizQuestions": [{"question": "...", "options": ["...", "...", "...", "..."], "correctAnswerIndex": 0}]}"#,
            r#"Chapter: {{title}}

Material:
{{content}}"#,
        )
    }

    /// Default pronunciation prompts.
    pub fn phoneme() -> Self {
        Self::new(
            r#"You are a phonetician helping a text-to-speech voice pronounce names and rare words.

Rules:
- Give the IPA transcription of the word as it is pronounced in the language it is written in
- Reply with the transcription only: no slashes, brackets, quotes or explanation"#,
            r#"Word: "{{word}}""#,
        )
    }
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            outline: PromptPair::outline(),
            summary: PromptPair::summary(),
            script: PromptPair::script(),
            timeline: PromptPair::timeline(),
            study_aids: PromptPair::study_aids(),
            phoneme: PromptPair::phoneme(),
            variables: HashMap::new(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            load_override(&custom_path, "outline.toml", &mut prompts.outline)?;
            load_override(&custom_path, "summary.toml", &mut prompts.summary)?;
            load_override(&custom_path, "script.toml", &mut prompts.script)?;
            load_override(&custom_path, "timeline.toml", &mut prompts.timeline)?;
            load_override(&custom_path, "study_aids.toml", &mut prompts.study_aids)?;
            load_override(&custom_path, "phoneme.toml", &mut prompts.phoneme)?;
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

fn load_override(dir: &Path, file: &str, target: &mut PromptPair) -> crate::error::Result<()> {
    let path = dir.join(file);
    if path.exists() {
        let content = std::fs::read_to_string(&path)?;
        *target = toml::from_str(&content)?;
    }
    Ok(())
}
