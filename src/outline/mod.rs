//! The outline tree: three levels of idea nodes with stable hierarchical ids.
//!
//! A level-1 node carries its children in `sub_ideas`, a level-2 node in
//! `nested_sub_ideas`, and a level-3 node has none. A missing children key and
//! an empty list mean the same thing.

mod path;
mod reparse;
mod tree;

pub use path::{get_at_path, set_at_path, PathSegment, TreePath};
pub use reparse::{generate_final_content, parse_markdown_tree, ParsedNode};
pub use tree::{aggregate_content, children_of, count_nodes, has_content, visit_depth_first};

use crate::error::{Result, StudycastError};
use serde::{Deserialize, Serialize};

/// Deepest supported nesting level.
pub const MAX_LEVEL: u8 = 3;

/// A flashcard derived from a quiz question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flashcard {
    pub front: String,
    pub back: String,
}

/// A four-option multiple-choice question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    #[serde(rename = "correctAnswerIndex")]
    pub correct_answer_index: i64,
}

impl QuizQuestion {
    /// The correct option, if the index points inside `options`.
    pub fn correct_answer(&self) -> Option<&str> {
        usize::try_from(self.correct_answer_index)
            .ok()
            .and_then(|i| self.options.get(i))
            .map(String::as_str)
    }
}

/// One node of the outline tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdeaNode {
    /// Hierarchical dotted id ("1", "1.2", "1.2.1"). Never changes after outline creation.
    pub id: String,
    /// Nesting level, 1..=3.
    pub level: u8,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Raw markdown produced by the summary stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flashcards: Option<Vec<Flashcard>>,
    #[serde(
        rename = "quizQuestions",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub quiz_questions: Option<Vec<QuizQuestion>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_ideas: Option<Vec<IdeaNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nested_sub_ideas: Option<Vec<IdeaNode>>,
}

/// A level-1 node.
pub type MainIdea = IdeaNode;
/// A level-2 node.
pub type SubIdea = IdeaNode;
/// A level-3 node.
pub type NestedSubIdea = IdeaNode;

impl IdeaNode {
    /// Create a childless node.
    pub fn new(id: impl Into<String>, level: u8, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            level,
            title: title.into(),
            content: None,
            summary: None,
            flashcards: None,
            quiz_questions: None,
            sub_ideas: None,
            nested_sub_ideas: None,
        }
    }

    /// Attach children under the key that matches this node's level.
    ///
    /// Level-3 nodes cannot have children; the list is ignored for them.
    pub fn with_children(mut self, children: Vec<IdeaNode>) -> Self {
        match self.level {
            1 => self.sub_ideas = Some(children),
            2 => self.nested_sub_ideas = Some(children),
            _ => {}
        }
        self
    }

    /// Set the content text.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Mutable access to whichever children list is populated.
    pub fn children_mut(&mut self) -> Option<&mut Vec<IdeaNode>> {
        if self.sub_ideas.is_some() {
            self.sub_ideas.as_mut()
        } else {
            self.nested_sub_ideas.as_mut()
        }
    }

    /// Check the level/children-key invariant for this node and its descendants.
    pub fn validate(&self) -> Result<()> {
        if self.level == 0 || self.level > MAX_LEVEL {
            return Err(StudycastError::InvalidInput(format!(
                "node {} has level {}, expected 1..={}",
                self.id, self.level, MAX_LEVEL
            )));
        }

        let has_sub = self.sub_ideas.as_ref().is_some_and(|c| !c.is_empty());
        let has_nested = self.nested_sub_ideas.as_ref().is_some_and(|c| !c.is_empty());

        let misplaced = match self.level {
            1 => has_nested,
            2 => has_sub,
            _ => has_sub || has_nested,
        };
        if misplaced {
            return Err(StudycastError::InvalidInput(format!(
                "node {} (level {}) has children under the wrong key",
                self.id, self.level
            )));
        }

        for child in children_of(self) {
            child.validate()?;
        }
        Ok(())
    }
}

/// The structured breakdown of the source material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outline {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub ideas: Vec<MainIdea>,
}

impl Outline {
    /// Parse an outline snapshot.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            StudycastError::MalformedResponse(format!("outline is not valid JSON: {}", e))
        })
    }

    /// Serialize with 2-space indentation, the persisted snapshot format.
    pub fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Every node id in depth-first order.
    pub fn node_ids(&self) -> Vec<String> {
        let mut ids = Vec::with_capacity(count_nodes(&self.ideas));
        for idea in &self.ideas {
            visit_depth_first(idea, &mut |node, _| ids.push(node.id.clone()));
        }
        ids
    }

    /// Total number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        count_nodes(&self.ideas)
    }

    /// Read a value at a structural path.
    pub fn value_at(&self, path: &TreePath) -> Result<Option<serde_json::Value>> {
        let root = serde_json::to_value(self)?;
        Ok(get_at_path(&root, path.segments())?.cloned())
    }

    /// Copy-on-write edit: returns a new outline with `value` stored at `path`.
    /// `self` is never modified.
    pub fn with_value_at(&self, path: &TreePath, value: serde_json::Value) -> Result<Outline> {
        let root = serde_json::to_value(self)?;
        let updated = set_at_path(&root, path.segments(), value)?;
        serde_json::from_value(updated).map_err(|e| {
            StudycastError::InvalidInput(format!(
                "edit at {} does not produce a valid outline: {}",
                path, e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Outline {
        Outline {
            subject: "Plato".to_string(),
            description: "Theory of forms".to_string(),
            ideas: vec![IdeaNode::new("1", 1, "Forms").with_children(vec![
                IdeaNode::new("1.1", 2, "Hyperuranion")
                    .with_children(vec![IdeaNode::new("1.1.1", 3, "Copies")]),
            ])],
        }
    }

    #[test]
    fn test_json_keys_match_snapshot_format() {
        let mut node = IdeaNode::new("1.1.1", 3, "Copies");
        node.quiz_questions = Some(vec![QuizQuestion {
            question: "Q?".to_string(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_answer_index: 2,
        }]);

        let json = serde_json::to_value(&node).unwrap();
        assert!(json.get("quizQuestions").is_some());
        assert_eq!(json["quizQuestions"][0]["correctAnswerIndex"], 2);
        assert!(json.get("sub_ideas").is_none());
        assert!(json.get("content").is_none());
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        let err = Outline::from_json("not json").unwrap_err();
        assert!(matches!(err, StudycastError::MalformedResponse(_)));
    }

    #[test]
    fn test_pretty_json_uses_two_spaces() {
        let json = sample().to_pretty_json().unwrap();
        assert!(json.contains("\n  \"subject\": \"Plato\""));
    }

    #[test]
    fn test_node_ids_depth_first() {
        assert_eq!(sample().node_ids(), vec!["1", "1.1", "1.1.1"]);
    }

    #[test]
    fn test_validate_rejects_wrong_children_key() {
        let mut node = IdeaNode::new("1", 1, "Forms");
        node.nested_sub_ideas = Some(vec![IdeaNode::new("1.1", 2, "x")]);
        assert!(node.validate().is_err());

        let mut empty = IdeaNode::new("2", 1, "Other");
        empty.nested_sub_ideas = Some(vec![]);
        assert!(empty.validate().is_ok());

        assert!(sample().ideas[0].validate().is_ok());
    }

    #[test]
    fn test_with_value_at_leaves_original_untouched() {
        let outline = sample();
        let path: TreePath = "ideas.0.sub_ideas.0.title".parse().unwrap();

        let edited = outline
            .with_value_at(&path, serde_json::json!("World of Ideas"))
            .unwrap();

        assert_eq!(outline.ideas[0].sub_ideas.as_ref().unwrap()[0].title, "Hyperuranion");
        assert_eq!(edited.ideas[0].sub_ideas.as_ref().unwrap()[0].title, "World of Ideas");
        assert_eq!(edited.ideas[0].sub_ideas.as_ref().unwrap()[0].id, "1.1");
    }

    #[test]
    fn test_with_value_at_rejects_ill_typed_edit() {
        let path: TreePath = "ideas.0.level".parse().unwrap();
        let err = sample()
            .with_value_at(&path, serde_json::json!("one"))
            .unwrap_err();
        assert!(matches!(err, StudycastError::InvalidInput(_)));
    }

    #[test]
    fn test_quiz_correct_answer_bounds() {
        let mut q = QuizQuestion {
            question: "Q".to_string(),
            options: vec!["a".into(), "b".into()],
            correct_answer_index: 1,
        };
        assert_eq!(q.correct_answer(), Some("b"));
        q.correct_answer_index = 4;
        assert_eq!(q.correct_answer(), None);
        q.correct_answer_index = -1;
        assert_eq!(q.correct_answer(), None);
    }
}
