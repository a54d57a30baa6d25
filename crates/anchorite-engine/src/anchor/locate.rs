use crate::anchor::descriptor::LocationDescriptor;
use crate::anchor::path::NodePath;
use crate::dom::runs::text_runs;
use crate::dom::span::{TextSpan, span_over_runs};
use crate::dom::tree::Document;

/// Re-resolves a descriptor's path and rebuilds the span it described.
///
/// Every `None` here is drift, not an error: the path no longer names a
/// node, or the container's text has shrunk below `text_offset +
/// text_length`. Callers must still compare the span's text against the
/// descriptor's `original_text`; a resolved span over changed text is as
/// stale as no span at all.
#[must_use]
pub fn locate(doc: &Document, descriptor: &LocationDescriptor) -> Option<TextSpan> {
    if descriptor.text_length == 0 {
        return None;
    }
    let path = match descriptor.path.parse::<NodePath>() {
        Ok(path) => path,
        Err(error) => {
            tracing::info!(path = %descriptor.path, %error, "stored path did not parse");
            return None;
        }
    };
    let Some(container) = path.resolve(doc) else {
        tracing::info!(path = %descriptor.path, "stored path no longer resolves");
        return None;
    };
    let runs = text_runs(doc, container);
    let span = span_over_runs(doc, &runs, descriptor.text_offset, descriptor.text_length);
    if span.is_none() {
        tracing::info!(
            path = %descriptor.path,
            offset = descriptor.text_offset,
            length = descriptor.text_length,
            "container text is shorter than the stored span"
        );
    }
    span
}
