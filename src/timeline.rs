//! Dated events extracted from the content tree.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::warn;

/// One dated event, tied to the node it was found in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub date: String,
    pub event: String,
    #[serde(rename = "nodeId")]
    pub node_id: String,
}

impl TimelineEvent {
    /// Deduplication key: trimmed, lowercased date and event text.
    fn key(&self) -> (String, String) {
        (
            self.date.trim().to_lowercase(),
            self.event.trim().to_lowercase(),
        )
    }
}

/// The timeline snapshot, `{"events": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Timeline {
    #[serde(default)]
    pub events: Vec<TimelineEvent>,
}

impl Timeline {
    /// Parse a timeline response, falling back to an empty timeline when the
    /// text is not a valid timeline object.
    pub fn parse_or_empty(json: &str) -> Self {
        match serde_json::from_str(json) {
            Ok(timeline) => timeline,
            Err(e) => {
                warn!(error = %e, "Timeline response is not valid, using an empty timeline");
                Timeline::default()
            }
        }
    }

    /// Drop later events whose normalized date and text repeat an earlier one.
    pub fn dedup(mut self) -> Self {
        let mut seen = HashSet::new();
        self.events.retain(|e| seen.insert(e.key()));
        self
    }

    /// Drop events that reference a node id not in `known_ids`.
    pub fn retain_known<S: AsRef<str>>(mut self, known_ids: &[S]) -> Self {
        let known: HashSet<&str> = known_ids.iter().map(AsRef::as_ref).collect();
        self.events.retain(|e| {
            let keep = known.contains(e.node_id.as_str());
            if !keep {
                warn!(node_id = %e.node_id, event = %e.event, "Dropping timeline event for unknown node");
            }
            keep
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn to_pretty_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
