//! Podcast script text: speaker labels, segments and dialogue lines.

mod alternation;
pub mod pronunciation;

pub use alternation::correct_alternation;

/// Which of the two hosts speaks a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Speaker {
    First,
    Second,
}

impl Speaker {
    /// The other host.
    pub fn other(self) -> Self {
        match self {
            Speaker::First => Speaker::Second,
            Speaker::Second => Speaker::First,
        }
    }
}

/// The two speaker labels used in a script, e.g. `Voce 1` and `Voce 2`.
///
/// A line belongs to a speaker when, after trimming, it starts with the label
/// followed by a colon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Speakers {
    first: String,
    second: String,
}

impl Speakers {
    pub fn new(first: &str, second: &str) -> Self {
        Self {
            first: first.to_string(),
            second: second.to_string(),
        }
    }

    pub fn label(&self, speaker: Speaker) -> &str {
        match speaker {
            Speaker::First => &self.first,
            Speaker::Second => &self.second,
        }
    }

    /// The line prefix for a speaker, label plus colon.
    pub fn tag(&self, speaker: Speaker) -> String {
        format!("{}:", self.label(speaker))
    }

    /// The speaker of a line, if it carries a label.
    pub fn speaker_of(&self, line: &str) -> Option<Speaker> {
        let trimmed = line.trim();
        [Speaker::First, Speaker::Second]
            .into_iter()
            .find(|s| trimmed.starts_with(&self.tag(*s)))
    }

    /// Text of a labelled line after the tag, trimmed.
    pub fn strip_tag<'a>(&self, line: &'a str, speaker: Speaker) -> &'a str {
        let trimmed = line.trim();
        trimmed
            .strip_prefix(&self.tag(speaker))
            .unwrap_or(trimmed)
            .trim()
    }

    /// True if either tag appears anywhere in `text`.
    pub fn mentions_any(&self, text: &str) -> bool {
        text.contains(&self.tag(Speaker::First)) || text.contains(&self.tag(Speaker::Second))
    }
}

impl Default for Speakers {
    fn default() -> Self {
        Self::new("Voce 1", "Voce 2")
    }
}

/// Split a full script into segments: trimmed, empties dropped.
pub fn split_segments(script: &str, separator: &str) -> Vec<String> {
    script
        .split(separator)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Join segments back into a full script, separator on its own line.
pub fn join_segments<S: AsRef<str>>(segments: &[S], separator: &str) -> String {
    segments
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(&format!("\n\n{}\n\n", separator))
}

/// One spoken turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogueLine {
    pub speaker: Speaker,
    pub text: String,
}

/// Group a cleaned segment into turns.
///
/// Unlabelled lines continue the previous turn; unlabelled lines before the
/// first label are given to the first speaker.
pub fn dialogue_lines(segment: &str, speakers: &Speakers) -> Vec<DialogueLine> {
    let mut turns: Vec<DialogueLine> = Vec::new();

    for line in segment.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match speakers.speaker_of(line) {
            Some(speaker) => turns.push(DialogueLine {
                speaker,
                text: speakers.strip_tag(line, speaker).to_string(),
            }),
            None => match turns.last_mut() {
                Some(turn) => {
                    if !turn.text.is_empty() {
                        turn.text.push(' ');
                    }
                    turn.text.push_str(line);
                }
                None => turns.push(DialogueLine {
                    speaker: Speaker::First,
                    text: line.to_string(),
                }),
            },
        }
    }

    turns.retain(|t| !t.text.is_empty());
    turns
}
