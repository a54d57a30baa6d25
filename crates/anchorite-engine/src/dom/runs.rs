use std::sync::OnceLock;

use regex::Regex;

use crate::dom::tree::{Document, NodeId, NodeKind};

/// Inline styles that take an element out of the rendered page.
static HIDDEN_STYLE_RE: OnceLock<Regex> = OnceLock::new();

fn hidden_style_re() -> &'static Regex {
    HIDDEN_STYLE_RE.get_or_init(|| {
        Regex::new(r"(?i)display\s*:\s*none|visibility\s*:\s*hidden")
            .expect("hidden style regex is valid")
    })
}

/// Tags whose text is never rendered.
const NON_RENDERED_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// A tree a context search runs over. The main document tree and every
/// attached shadow root are searched the same way; nothing downstream needs
/// to know which kind of root a run came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchRoot {
    Main,
    Shadow(NodeId),
}

impl SearchRoot {
    /// The node the search starts from.
    #[must_use]
    pub fn node(self, doc: &Document) -> NodeId {
        match self {
            SearchRoot::Main => doc.root(),
            SearchRoot::Shadow(id) => id,
        }
    }
}

/// All search roots of a document: the main tree first, then every attached
/// shadow root in document order, including shadow roots nested inside
/// other shadow roots.
#[must_use]
pub fn search_roots(doc: &Document) -> Vec<SearchRoot> {
    let mut roots = vec![SearchRoot::Main];
    let mut index = 0;
    while index < roots.len() {
        let start = roots[index].node(doc);
        collect_shadow_roots(doc, start, &mut roots);
        index += 1;
    }
    roots
}

fn collect_shadow_roots(doc: &Document, node: NodeId, roots: &mut Vec<SearchRoot>) {
    for &child in doc.children(node) {
        if let Some(shadow) = doc.shadow_root(child) {
            roots.push(SearchRoot::Shadow(shadow));
        }
        collect_shadow_roots(doc, child, roots);
    }
}

/// Every text run under `node` in document order, hidden or not.
///
/// This is the enumeration behind `text_content`: script bodies and hidden
/// sub-trees count, shadow content does not.
#[must_use]
pub fn text_runs(doc: &Document, node: NodeId) -> Vec<NodeId> {
    let mut runs = Vec::new();
    collect_runs(doc, node, false, &mut runs);
    runs
}

/// Text runs under `root` that a reader of the rendered page could see.
///
/// Skips script/style/noscript/template sub-trees, elements carrying the
/// `hidden` attribute, and elements whose inline style declares
/// `display: none` or `visibility: hidden`. Context matching works on these
/// runs; offset arithmetic against a stored descriptor never does.
#[must_use]
pub fn eligible_runs(doc: &Document, root: SearchRoot) -> Vec<NodeId> {
    let mut runs = Vec::new();
    collect_runs(doc, root.node(doc), true, &mut runs);
    runs
}

fn collect_runs(doc: &Document, node: NodeId, visible_only: bool, runs: &mut Vec<NodeId>) {
    match doc.kind(node) {
        NodeKind::Text(_) => runs.push(node),
        NodeKind::Element(data) => {
            if visible_only
                && element_is_hidden(&data.tag_name, data.attr("hidden"), data.attr("style"))
            {
                return;
            }
            for &child in doc.children(node) {
                collect_runs(doc, child, visible_only, runs);
            }
        }
        NodeKind::Document | NodeKind::ShadowRoot => {
            for &child in doc.children(node) {
                collect_runs(doc, child, visible_only, runs);
            }
        }
        NodeKind::Comment(_) => {}
    }
}

fn element_is_hidden(tag: &str, hidden_attr: Option<&str>, style_attr: Option<&str>) -> bool {
    if NON_RENDERED_TAGS.contains(&tag) {
        return true;
    }
    if hidden_attr.is_some() {
        return true;
    }
    match style_attr {
        Some(style) => hidden_style_re().is_match(style),
        None => false,
    }
}

/// Concatenated text of every run under `node`, in document order.
#[must_use]
pub fn text_content(doc: &Document, node: NodeId) -> String {
    let mut out = String::new();
    for run in text_runs(doc, node) {
        if let Some(text) = doc.text(run) {
            out.push_str(text);
        }
    }
    out
}
