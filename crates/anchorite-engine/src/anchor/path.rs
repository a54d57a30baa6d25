use std::fmt;
use std::str::FromStr;

use crate::dom::tree::{Document, NodeId, NodeKind};

/// One step of a structural path, applied to the node the previous step
/// produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathStep {
    /// The `index`-th child element with this tag, 1-based, counted among
    /// same-tag siblings only. `None` means the element was the only one of
    /// its tag when the path was built.
    Element { tag: String, index: Option<usize> },
    /// The `index`-th text child, 1-based. Always the last step.
    TextRun { index: usize },
}

/// A structural path expression naming one node.
///
/// Serialized in XPath-like syntax so captured descriptors read naturally:
///
/// ```text
/// //*[@id="main"]/div[2]/p/text()[1]
/// /html/body/p[3]
/// ```
///
/// An id anchor is used when an ancestor carries a document-unique `id`,
/// which keeps the path valid across structural drift above that element.
/// The empty path is the namer's answer for nodes it cannot address
/// (detached nodes, comments, anything inside a shadow root) and never
/// resolves.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodePath {
    pub id_anchor: Option<String>,
    pub steps: Vec<PathStep>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PathParseError {
    #[error("unterminated id selector")]
    UnterminatedId,
    #[error("empty step in path")]
    EmptyStep,
    #[error("malformed step `{0}`")]
    MalformedStep(String),
    #[error("path must start with `/` or an id selector, got `{0}`")]
    BadStart(String),
}

impl NodePath {
    /// The path that addresses nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.id_anchor.is_none() && self.steps.is_empty()
    }

    /// Builds the path that names `node` in the current tree.
    ///
    /// Rules, innermost first: a text run is addressed by its ordinal among
    /// the parent's text children and the path recurses on the parent; an
    /// element with a document-unique `id` becomes the id anchor and the
    /// climb stops; any other element contributes a tag step with its
    /// position among same-tag siblings. Nodes the namer cannot address
    /// yield the empty path.
    #[must_use]
    pub fn for_node(doc: &Document, node: NodeId) -> Self {
        let mut steps = Vec::new();
        let mut current = node;
        loop {
            match doc.kind(current) {
                NodeKind::Document => break,
                NodeKind::ShadowRoot | NodeKind::Comment(_) => return Self::empty(),
                NodeKind::Text(_) => {
                    let Some(parent) = doc.parent(current) else {
                        return Self::empty();
                    };
                    let ordinal = doc
                        .children(parent)
                        .iter()
                        .filter(|&&c| matches!(doc.kind(c), NodeKind::Text(_)))
                        .position(|&c| c == current);
                    let Some(ordinal) = ordinal else {
                        return Self::empty();
                    };
                    steps.push(PathStep::TextRun { index: ordinal + 1 });
                    current = parent;
                }
                NodeKind::Element(data) => {
                    if let Some(id) = data.attr("id")
                        && !id.is_empty()
                        && doc.id_is_unique(id)
                    {
                        steps.reverse();
                        return Self {
                            id_anchor: Some(id.to_string()),
                            steps,
                        };
                    }
                    let Some(parent) = doc.parent(current) else {
                        return Self::empty();
                    };
                    let tag = data.tag_name.clone();
                    let same_tag: Vec<NodeId> = doc
                        .children(parent)
                        .iter()
                        .copied()
                        .filter(|&c| doc.tag_name(c) == Some(tag.as_str()))
                        .collect();
                    let Some(position) = same_tag.iter().position(|&c| c == current) else {
                        return Self::empty();
                    };
                    let index = (same_tag.len() > 1).then_some(position + 1);
                    steps.push(PathStep::Element { tag, index });
                    current = parent;
                }
            }
        }
        steps.reverse();
        Self {
            id_anchor: None,
            steps,
        }
    }

    /// Walks the path against the current tree.
    ///
    /// `None` is the expected answer for drift: a missing id, a missing
    /// sibling, a text run that no longer exists. The empty path never
    /// resolves.
    #[must_use]
    pub fn resolve(&self, doc: &Document) -> Option<NodeId> {
        if self.is_empty() {
            return None;
        }
        let mut current = match &self.id_anchor {
            Some(id) => doc.by_id(id)?,
            None => doc.root(),
        };
        for step in &self.steps {
            current = match step {
                PathStep::Element { tag, index } => doc
                    .children(current)
                    .iter()
                    .copied()
                    .filter(|&c| doc.tag_name(c) == Some(tag.as_str()))
                    .nth(index.unwrap_or(1) - 1)?,
                PathStep::TextRun { index } => doc
                    .children(current)
                    .iter()
                    .copied()
                    .filter(|&c| matches!(doc.kind(c), NodeKind::Text(_)))
                    .nth(index - 1)?,
            };
        }
        Some(current)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(id) = &self.id_anchor {
            write!(f, "//*[@id=\"{id}\"]")?;
        }
        for step in &self.steps {
            match step {
                PathStep::Element { tag, index: None } => write!(f, "/{tag}")?,
                PathStep::Element {
                    tag,
                    index: Some(i),
                } => write!(f, "/{tag}[{i}]")?,
                PathStep::TextRun { index } => write!(f, "/text()[{index}]")?,
            }
        }
        Ok(())
    }
}

impl FromStr for NodePath {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::empty());
        }
        let (id_anchor, rest) = if let Some(after) = s.strip_prefix("//*[@id=\"") {
            let close = after.find("\"]").ok_or(PathParseError::UnterminatedId)?;
            (Some(after[..close].to_string()), &after[close + 2..])
        } else {
            (None, s)
        };
        if !rest.is_empty() && !rest.starts_with('/') {
            return Err(PathParseError::BadStart(rest.to_string()));
        }
        let mut steps = Vec::new();
        for raw in rest.split('/').skip(1) {
            if raw.is_empty() {
                return Err(PathParseError::EmptyStep);
            }
            steps.push(parse_step(raw)?);
        }
        Ok(Self { id_anchor, steps })
    }
}

fn parse_step(raw: &str) -> Result<PathStep, PathParseError> {
    let (name, index) = match raw.find('[') {
        Some(open) => {
            let inner = raw[open..]
                .strip_prefix('[')
                .and_then(|r| r.strip_suffix(']'))
                .ok_or_else(|| PathParseError::MalformedStep(raw.to_string()))?;
            let index: usize = inner
                .parse()
                .map_err(|_| PathParseError::MalformedStep(raw.to_string()))?;
            if index == 0 {
                return Err(PathParseError::MalformedStep(raw.to_string()));
            }
            (&raw[..open], Some(index))
        }
        None => (raw, None),
    };
    if name == "text()" {
        return Ok(PathStep::TextRun {
            index: index.unwrap_or(1),
        });
    }
    if name.is_empty()
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == ':')
    {
        return Err(PathParseError::MalformedStep(raw.to_string()));
    }
    Ok(PathStep::Element {
        tag: name.to_ascii_lowercase(),
        index,
    })
}
