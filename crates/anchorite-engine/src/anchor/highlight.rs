use uuid::Uuid;

use crate::dom::runs::search_roots;
use crate::dom::span::{TextSpan, covered_runs};
use crate::dom::tree::{Document, NodeId};

/// Tag used for highlight wrapper elements.
pub const MARKER_TAG: &str = "mark";
/// Class carried by every live highlight wrapper.
pub const MARKER_CLASS: &str = "anchorite-highlight";
/// Classes carried by a wrapper once its fade has started.
const MARKER_FADING_CLASSES: &str = "anchorite-highlight anchorite-fading";

/// Where highlights become visible. The engine decides what to mark; the
/// environment decides how to bring it on screen.
pub trait Viewport: Send {
    /// Brings `node` into view. Returns false when the environment cannot
    /// scroll, for example in headless runs.
    fn scroll_into_view(&mut self, doc: &Document, node: NodeId) -> bool;
}

/// A viewport that never scrolls.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullViewport;

impl Viewport for NullViewport {
    fn scroll_into_view(&mut self, _doc: &Document, _node: NodeId) -> bool {
        false
    }
}

/// What [`Highlighter::apply`] achieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// At least one wrapper was placed.
    pub applied: bool,
    /// The viewport moved to the first wrapper.
    pub scrolled: bool,
}

impl ApplyOutcome {
    fn nothing() -> Self {
        Self {
            applied: false,
            scrolled: false,
        }
    }
}

/// The wrappers of one live highlight.
#[derive(Debug)]
struct HighlightSession {
    id: Uuid,
    wrappers: Vec<NodeId>,
}

/// Wraps resolved spans in marker elements and restores the document when
/// they are cleared. At most one session is live at a time; applying a new
/// span tears the previous session down first.
pub struct Highlighter<V> {
    viewport: V,
    session: Option<HighlightSession>,
}

impl<V: Viewport> Highlighter<V> {
    #[must_use]
    pub fn new(viewport: V) -> Self {
        Self {
            viewport,
            session: None,
        }
    }

    #[must_use]
    pub fn viewport(&self) -> &V {
        &self.viewport
    }

    /// Id of the live session, if one exists.
    #[must_use]
    pub fn session_id(&self) -> Option<Uuid> {
        self.session.as_ref().map(|session| session.id)
    }

    /// Wraps `span` in visual markers and scrolls the first into view.
    ///
    /// The span is wrapped one run at a time, splitting only the runs whose
    /// edges the span crosses, so restoration can put every boundary back.
    /// A sub-span that cannot be wrapped (its run vanished or shrank since
    /// the span was built) is skipped; when nothing could be wrapped the
    /// document is left untouched and `applied` is false.
    pub fn apply(&mut self, doc: &mut Document, span: &TextSpan) -> ApplyOutcome {
        self.clear(doc);
        let Some(covered) = covered_runs(doc, span) else {
            return ApplyOutcome::nothing();
        };
        let mut wrappers = Vec::new();
        for (run, from, to) in covered {
            if let Some(marker) = wrap_run(doc, run, from, to) {
                wrappers.push(marker);
            }
        }
        let Some(&first) = wrappers.first() else {
            return ApplyOutcome::nothing();
        };
        let scrolled = self.viewport.scroll_into_view(doc, first);
        self.session = Some(HighlightSession {
            id: Uuid::new_v4(),
            wrappers,
        });
        ApplyOutcome {
            applied: true,
            scrolled,
        }
    }

    /// Marks every wrapper of `session` as fading. Returns false when that
    /// session is no longer the live one.
    pub fn begin_fade(&mut self, doc: &mut Document, session: Uuid) -> bool {
        let Some(active) = &self.session else {
            return false;
        };
        if active.id != session {
            return false;
        }
        for &marker in &active.wrappers {
            let _ = doc.set_attr(marker, "class", MARKER_FADING_CLASSES);
        }
        true
    }

    /// [`Highlighter::clear`], but only when `session` is still live. Lets
    /// a stale fade timer expire without touching a newer highlight.
    pub fn clear_if_current(&mut self, doc: &mut Document, session: Uuid) {
        if self.session_id() == Some(session) {
            self.clear(doc);
        }
    }

    /// Unwraps the live session, then sweeps every search root for stray
    /// markers from sessions this highlighter never knew about.
    pub fn clear(&mut self, doc: &mut Document) {
        if let Some(session) = self.session.take() {
            for marker in session.wrappers {
                unwrap_marker(doc, marker);
            }
        }
        sweep_strays(doc);
    }
}

/// Wraps characters `[from, to)` of `run` in a fresh marker element placed
/// exactly where the covered text was.
fn wrap_run(doc: &mut Document, run: NodeId, from: usize, to: usize) -> Option<NodeId> {
    if from >= to {
        return None;
    }
    let len = doc.text(run)?.chars().count();
    if to > len {
        return None;
    }
    if to < len {
        doc.split_text(run, to).ok()?;
    }
    let target = if from > 0 {
        doc.split_text(run, from).ok()?
    } else {
        run
    };
    let parent = doc.parent(target)?;
    let marker = doc.create_element_with_attrs(MARKER_TAG, &[("class", MARKER_CLASS)]);
    doc.insert_before(parent, marker, Some(target)).ok()?;
    doc.append_child(marker, target).ok()?;
    Some(marker)
}

/// Moves a marker's children back into its parent at the marker's position,
/// removes the marker, and re-merges the surrounding text runs so the tree
/// is indistinguishable from its pre-highlight state.
fn unwrap_marker(doc: &mut Document, marker: NodeId) {
    let Some(parent) = doc.parent(marker) else {
        return;
    };
    let children: Vec<NodeId> = doc.children(marker).to_vec();
    for child in children {
        let _ = doc.insert_before(parent, child, Some(marker));
    }
    let _ = doc.detach(marker);
    doc.normalize(parent);
}

fn sweep_strays(doc: &mut Document) {
    let mut strays = Vec::new();
    for root in search_roots(doc) {
        collect_markers(doc, root.node(doc), &mut strays);
    }
    for marker in strays {
        unwrap_marker(doc, marker);
    }
}

fn collect_markers(doc: &Document, node: NodeId, out: &mut Vec<NodeId>) {
    for &child in doc.children(node) {
        if is_marker(doc, child) {
            out.push(child);
        } else {
            collect_markers(doc, child, out);
        }
    }
}

fn is_marker(doc: &Document, node: NodeId) -> bool {
    doc.tag_name(node) == Some(MARKER_TAG)
        && doc
            .attr(node, "class")
            .is_some_and(|class| class.split_whitespace().any(|part| part == MARKER_CLASS))
}
