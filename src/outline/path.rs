//! Structural paths into an outline and copy-on-write updates along them.
//!
//! A path mixes array indices and object keys, e.g.
//! `ideas.0.sub_ideas.1.title` or `ideas.2.flashcards`.

use crate::error::{Result, StudycastError};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// One step of a structural path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Index(usize),
    Key(String),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Index(i) => write!(f, "{}", i),
            PathSegment::Key(k) => write!(f, "{}", k),
        }
    }
}

/// An ordered list of path segments.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TreePath(Vec<PathSegment>);

impl TreePath {
    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Append a key segment.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.0.push(PathSegment::Key(key.into()));
        self
    }

    /// Append an index segment.
    pub fn index(mut self, index: usize) -> Self {
        self.0.push(PathSegment::Index(index));
        self
    }
}

impl FromStr for TreePath {
    type Err = StudycastError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(TreePath::default());
        }

        s.split('.')
            .map(|part| {
                let part = part.trim();
                if part.is_empty() {
                    return Err(StudycastError::InvalidPath(format!(
                        "empty segment in '{}'",
                        s
                    )));
                }
                Ok(match part.parse::<usize>() {
                    Ok(i) => PathSegment::Index(i),
                    Err(_) => PathSegment::Key(part.to_string()),
                })
            })
            .collect::<Result<Vec<_>>>()
            .map(TreePath)
    }
}

impl fmt::Display for TreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|s| s.to_string()).collect();
        write!(f, "{}", parts.join("."))
    }
}

/// Read the value at `path`.
///
/// Returns `Ok(None)` when only the final segment is missing, and
/// `InvalidPath` when an intermediate segment does not resolve to an object or array.
pub fn get_at_path<'a>(root: &'a Value, path: &[PathSegment]) -> Result<Option<&'a Value>> {
    let Some((last, parents)) = path.split_last() else {
        return Ok(Some(root));
    };

    let mut current = root;
    for (depth, segment) in parents.iter().enumerate() {
        current = step(current, segment)
            .ok_or_else(|| invalid(path, depth, "does not resolve to an object or array"))?;
    }

    match (current, last) {
        (Value::Object(map), PathSegment::Key(key)) => Ok(map.get(key)),
        (Value::Array(items), PathSegment::Index(i)) => Ok(items.get(*i)),
        _ => Err(invalid(path, parents.len(), "parent is not a matching container")),
    }
}

/// Return a copy of `root` with `value` stored at `path`. `root` is not modified.
///
/// A missing final key on an object is inserted; a final index must already exist.
pub fn set_at_path(root: &Value, path: &[PathSegment], value: Value) -> Result<Value> {
    let Some((last, parents)) = path.split_last() else {
        return Ok(value);
    };

    let mut updated = root.clone();
    let mut current = &mut updated;
    for (depth, segment) in parents.iter().enumerate() {
        current = step_mut(current, segment)
            .ok_or_else(|| invalid(path, depth, "does not resolve to an object or array"))?;
    }

    match (current, last) {
        (Value::Object(map), PathSegment::Key(key)) => {
            map.insert(key.clone(), value);
        }
        (Value::Array(items), PathSegment::Index(i)) => match items.get_mut(*i) {
            Some(slot) => *slot = value,
            None => return Err(invalid(path, parents.len(), "index out of range")),
        },
        _ => return Err(invalid(path, parents.len(), "parent is not a matching container")),
    }

    Ok(updated)
}

fn step<'a>(value: &'a Value, segment: &PathSegment) -> Option<&'a Value> {
    let next = match (value, segment) {
        (Value::Object(map), PathSegment::Key(key)) => map.get(key),
        (Value::Array(items), PathSegment::Index(i)) => items.get(*i),
        _ => None,
    }?;
    (next.is_object() || next.is_array()).then_some(next)
}

fn step_mut<'a>(value: &'a mut Value, segment: &PathSegment) -> Option<&'a mut Value> {
    let next = match (value, segment) {
        (Value::Object(map), PathSegment::Key(key)) => map.get_mut(key),
        (Value::Array(items), PathSegment::Index(i)) => items.get_mut(*i),
        _ => None,
    }?;
    if next.is_object() || next.is_array() {
        Some(next)
    } else {
        None
    }
}

fn invalid(path: &[PathSegment], depth: usize, reason: &str) -> StudycastError {
    let shown = TreePath(path.to_vec());
    StudycastError::InvalidPath(format!(
        "{} (segment {} '{}' {})",
        shown,
        depth,
        path.get(depth).map(|s| s.to_string()).unwrap_or_default(),
        reason
    ))
}
