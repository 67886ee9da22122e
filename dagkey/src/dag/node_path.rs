use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};

use super::error::NodePathError;

/// Separator between nested node names in the canonical string form
pub const PATH_SEPARATOR: char = '.';

/// Hierarchical identifier of a DAG node, reachable through nested sub-DAGs.
///
/// The canonical string joins the segments with `.`, outermost first
/// (`outer.inner.leaf`). Segments only use `[A-Za-z0-9_]`, so the string
/// never contains `[` or `]` and step keys can use a bracket suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodePath {
    segments: Vec<String>,
}

fn validate_segment(segment: &str, path: &str) -> Result<(), NodePathError> {
    if segment.is_empty() {
        return Err(NodePathError::EmptySegment { path: path.to_string() });
    }
    if let Some(ch) = segment
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && *c != '_')
    {
        return Err(NodePathError::InvalidCharacter {
            segment: segment.to_string(),
            ch,
        });
    }
    Ok(())
}

impl NodePath {
    /// Path of a top-level node
    pub fn new(name: impl Into<String>) -> Result<Self, NodePathError> {
        let name = name.into();
        if name.is_empty() {
            return Err(NodePathError::Empty);
        }
        validate_segment(&name, &name)?;
        Ok(Self { segments: vec![name] })
    }

    /// Path of `name` nested directly under `self`
    pub fn child(&self, name: impl Into<String>) -> Result<Self, NodePathError> {
        let name = name.into();
        validate_segment(&name, &format!("{}{}{}", self, PATH_SEPARATOR, name))?;
        let mut segments = self.segments.clone();
        segments.push(name);
        Ok(Self { segments })
    }

    /// Build a path from its segments, outermost first
    pub fn from_segments<I, S>(segments: I) -> Result<Self, NodePathError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(NodePathError::Empty);
        }
        let joined = segments.join(".");
        for segment in &segments {
            validate_segment(segment, &joined)?;
        }
        Ok(Self { segments })
    }

    /// Parse the canonical `a.b.c` form
    pub fn parse(s: &str) -> Result<Self, NodePathError> {
        if s.is_empty() {
            return Err(NodePathError::Empty);
        }
        for segment in s.split(PATH_SEPARATOR) {
            validate_segment(segment, s)?;
        }
        Ok(Self {
            segments: s.split(PATH_SEPARATOR).map(str::to_string).collect(),
        })
    }

    /// Name of the node itself (last segment)
    pub fn name(&self) -> &str {
        // segments is never empty
        &self.segments[self.segments.len() - 1]
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Nesting depth, 1 for a top-level node
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Path of the enclosing sub-DAG node, if any
    pub fn parent(&self) -> Option<NodePath> {
        if self.segments.len() == 1 {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// True if `ancestor` is this path or one of its enclosing paths
    pub fn is_or_descends_from(&self, ancestor: &NodePath) -> bool {
        self.segments.starts_with(&ancestor.segments)
    }

    /// Strip `ancestor` from the front of this path.
    ///
    /// Returns `None` unless `ancestor` is a strict prefix.
    pub fn pop(&self, ancestor: &NodePath) -> Option<NodePath> {
        if self.segments.len() <= ancestor.segments.len() || !self.is_or_descends_from(ancestor) {
            return None;
        }
        Some(Self {
            segments: self.segments[ancestor.segments.len()..].to_vec(),
        })
    }

    /// Re-root this path underneath `ancestor`
    pub fn with_ancestor(&self, ancestor: Option<&NodePath>) -> NodePath {
        match ancestor {
            Some(ancestor) => Self {
                segments: ancestor
                    .segments
                    .iter()
                    .chain(self.segments.iter())
                    .cloned()
                    .collect(),
            },
            None => self.clone(),
        }
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", PATH_SEPARATOR)?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

impl FromStr for NodePath {
    type Err = NodePathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodePath::parse(s)
    }
}

impl TryFrom<String> for NodePath {
    type Error = NodePathError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        NodePath::parse(&s)
    }
}

impl From<NodePath> for String {
    fn from(path: NodePath) -> Self {
        path.to_string()
    }
}
