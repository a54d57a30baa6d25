use crate::anchor::descriptor::LocationDescriptor;
use crate::anchor::path::NodePath;
use crate::anchor::tuning::{BLOCK_TAGS, Tuning};
use crate::dom::runs::text_runs;
use crate::dom::span::{SpanPoint, TextSpan, char_slice, span_text};
use crate::dom::tree::{Document, NodeId, NodeKind};

/// Converts a live selection into a portable [`LocationDescriptor`].
///
/// Returns `None` for collapsed or stale selections and for selections that
/// are empty once surrounding whitespace is trimmed. The stored offset and
/// length describe the trimmed text relative to the container's full text
/// content, so the descriptor survives churn among the container's other
/// children; the context windows bracket the trimmed text within the
/// nearest block-level ancestor.
#[must_use]
pub fn capture(doc: &Document, selection: TextSpan, tuning: &Tuning) -> Option<LocationDescriptor> {
    if selection.is_collapsed() {
        return None;
    }
    let raw = span_text(doc, &selection)?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lead = raw.chars().count() - raw.trim_start().chars().count();
    let text_length = trimmed.chars().count();

    let container = container_of(doc, &selection)?;
    let text_offset = offset_within(doc, container, selection.start)? + lead;

    let scope = context_scope(doc, container, tuning.context_climb_limit);
    let scope_text = doc.text_content(scope);
    let scope_len = scope_text.chars().count();
    let sel_start = offset_within(doc, scope, selection.start)? + lead;
    let sel_end = sel_start + text_length;
    let context_before = tail_chars(
        char_slice(&scope_text, 0, sel_start)?,
        tuning.context_window_chars,
    );
    let context_after = head_chars(
        char_slice(&scope_text, sel_end, scope_len)?,
        tuning.context_window_chars,
    );

    Some(LocationDescriptor {
        path: NodePath::for_node(doc, container).to_string(),
        text_offset,
        text_length,
        context_before,
        context_after,
        original_text: trimmed.to_string(),
        source_url: doc.source_url.clone(),
        source_title: doc.title.clone(),
    })
}

/// The node whose text content the stored offset is measured in: the parent
/// for a selection inside one run, otherwise the endpoints' common ancestor.
fn container_of(doc: &Document, selection: &TextSpan) -> Option<NodeId> {
    if selection.start.run == selection.end.run {
        doc.parent(selection.start.run)
    } else {
        doc.common_ancestor(selection.start.run, selection.end.run)
    }
}

/// Character position of `point` within the concatenated text of `scope`.
fn offset_within(doc: &Document, scope: NodeId, point: SpanPoint) -> Option<usize> {
    let mut total = 0;
    for run in text_runs(doc, scope) {
        if run == point.run {
            return Some(total + point.offset);
        }
        total += doc.text(run)?.chars().count();
    }
    None
}

/// Nearest block-level ancestor of `container`, within the climb limit.
///
/// The climb never crosses the root of the tree the container lives in:
/// host-side text does not contain shadow text, so offsets measured against
/// a scope beyond the boundary would not line up.
fn context_scope(doc: &Document, container: NodeId, climb_limit: usize) -> NodeId {
    let mut current = container;
    for _ in 0..=climb_limit {
        match doc.kind(current) {
            NodeKind::Element(data) if BLOCK_TAGS.contains(&data.tag_name.as_str()) => {
                return current;
            }
            NodeKind::Document | NodeKind::ShadowRoot => return container,
            _ => {}
        }
        match doc.parent(current) {
            Some(parent) => current = parent,
            None => return container,
        }
    }
    container
}

fn tail_chars(s: &str, window: usize) -> String {
    let total = s.chars().count();
    char_slice(s, total.saturating_sub(window), total)
        .unwrap_or_default()
        .to_string()
}

fn head_chars(s: &str, window: usize) -> String {
    let total = s.chars().count();
    char_slice(s, 0, total.min(window))
        .unwrap_or_default()
        .to_string()
}
