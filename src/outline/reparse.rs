//! Rebuild content trees from per-idea markdown summaries.
//!
//! A summary uses `#`, `##` and `###` headings for the idea, its sub ideas and
//! their nested sub ideas. Parsing produces a heading tree; mapping walks that
//! tree alongside the original idea and reuses the original ids positionally.

use super::{IdeaNode, Outline, MAX_LEVEL};
use chrono::Utc;
use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, warn};
use uuid::Uuid;

/// A heading and the text under it, before ids are assigned.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedNode {
    pub level: u8,
    pub title: String,
    pub content: String,
    pub children: Vec<ParsedNode>,
}

impl ParsedNode {
    fn new(level: u8, title: &str) -> Self {
        Self {
            level,
            title: title.to_string(),
            ..Default::default()
        }
    }

    fn append_line(&mut self, line: &str) {
        if !self.content.is_empty() {
            self.content.push('\n');
        }
        self.content.push_str(line);
    }
}

fn heading_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(#{1,3})\s(.+)").expect("heading regex is valid"))
}

/// Parse heading-delimited markdown into a forest of [`ParsedNode`]s.
///
/// Text before the first heading is discarded. Headings deeper than `###`
/// do not match and are kept as body text of the enclosing node.
pub fn parse_markdown_tree(markdown: &str) -> Vec<ParsedNode> {
    // Open headings, outermost first. A node is attached to its parent when popped.
    let mut stack: Vec<ParsedNode> = Vec::new();
    let mut roots: Vec<ParsedNode> = Vec::new();

    for line in markdown.split('\n') {
        match heading_regex().captures(line) {
            Some(caps) => {
                let level = caps[1].len() as u8;
                let title = caps[2].trim();

                while stack.last().is_some_and(|top| top.level >= level) {
                    close_top(&mut stack, &mut roots);
                }
                stack.push(ParsedNode::new(level, title));
            }
            None => {
                if let Some(current) = stack.last_mut() {
                    current.append_line(line);
                }
            }
        }
    }

    while !stack.is_empty() {
        close_top(&mut stack, &mut roots);
    }
    roots
}

fn close_top(stack: &mut Vec<ParsedNode>, roots: &mut Vec<ParsedNode>) {
    if let Some(node) = stack.pop() {
        match stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => roots.push(node),
        }
    }
}

/// Build the content tree: one main idea per idea that has a non-empty summary.
///
/// Subject and description are carried over; `summary` is replaced by `content`.
pub fn generate_final_content(outline: &Outline) -> Outline {
    let mut ideas = Vec::with_capacity(outline.ideas.len());

    for idea in &outline.ideas {
        let Some(summary) = idea.summary.as_deref().filter(|s| !s.is_empty()) else {
            debug!(id = %idea.id, "Skipping idea without summary");
            continue;
        };

        let parsed = parse_markdown_tree(summary);
        match parsed.first() {
            Some(top) => ideas.push(map_node(top, Some(idea), 1)),
            None => warn!(
                id = %idea.id,
                title = %idea.title,
                "Summary has no headings, idea omitted from content"
            ),
        }
    }

    Outline {
        subject: outline.subject.clone(),
        description: outline.description.clone(),
        ideas,
    }
}

/// Map a parsed heading onto the original node at the same position.
///
/// `level` is the tree depth, not the heading depth, so an H1 followed
/// directly by an H3 yields a level-2 child.
fn map_node(node: &ParsedNode, original: Option<&IdeaNode>, level: u8) -> IdeaNode {
    let id = original
        .map(|o| o.id.clone())
        .filter(|id| !id.is_empty())
        .unwrap_or_else(fresh_id);

    let mut mapped = IdeaNode::new(id, level, node.title.clone()).with_content(node.content.trim());

    if !node.children.is_empty() && level < MAX_LEVEL {
        let original_children = original.map(original_children_for(level)).unwrap_or(&[]);
        let children = node
            .children
            .iter()
            .enumerate()
            .map(|(i, child)| map_node(child, original_children.get(i), level + 1))
            .collect();
        mapped = mapped.with_children(children);
    }

    mapped
}

fn original_children_for(level: u8) -> fn(&IdeaNode) -> &[IdeaNode] {
    if level == 1 {
        |n| n.sub_ideas.as_deref().unwrap_or(&[])
    } else {
        |n| n.nested_sub_ideas.as_deref().unwrap_or(&[])
    }
}

/// An id for a node that has no positional counterpart in the original outline.
fn fresh_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", Utc::now().timestamp_millis(), &suffix[..8])
}
