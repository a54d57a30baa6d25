use crate::dom::runs::text_runs;
use crate::dom::tree::{Document, NodeId, NodeKind};

/// One end of a text span: a text run and a character offset into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpanPoint {
    pub run: NodeId,
    /// Character offset within the run, `0..=len`.
    pub offset: usize,
}

/// A contiguous stretch of document text between two points.
///
/// The points may sit in different runs under different parents; the covered
/// text is everything between them in document order. Spans are disposable
/// values, they are rebuilt on every relocation rather than stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSpan {
    pub start: SpanPoint,
    pub end: SpanPoint,
}

impl TextSpan {
    /// A span covering `[start, start + len)` within a single run.
    #[must_use]
    pub fn within_run(run: NodeId, start: usize, len: usize) -> Self {
        Self {
            start: SpanPoint { run, offset: start },
            end: SpanPoint {
                run,
                offset: start + len,
            },
        }
    }

    /// True when the span selects nothing.
    #[must_use]
    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

/// Byte index of the `chars`-th character of `s`.
///
/// `chars == s.chars().count()` maps to `s.len()`; anything past that is
/// `None`.
pub(crate) fn char_to_byte(s: &str, chars: usize) -> Option<usize> {
    if chars == 0 {
        return Some(0);
    }
    let mut seen = 0;
    for (byte, _) in s.char_indices() {
        if seen == chars {
            return Some(byte);
        }
        seen += 1;
    }
    (seen == chars).then_some(s.len())
}

/// Slice of `s` between two character offsets.
pub(crate) fn char_slice(s: &str, from: usize, to: usize) -> Option<&str> {
    let start = char_to_byte(s, from)?;
    let end = char_to_byte(s, to)?;
    (start <= end).then(|| &s[start..end])
}

/// Root of the tree holding `node`: the document root, the nearest
/// enclosing shadow root, or the top of a detached sub-tree. A shadow
/// root's parent link points at its host, but the host's tree is a
/// different tree; the climb must not cross that boundary.
pub(crate) fn tree_root_of(doc: &Document, node: NodeId) -> NodeId {
    let mut current = node;
    loop {
        if matches!(doc.kind(current), NodeKind::ShadowRoot) {
            return current;
        }
        match doc.parent(current) {
            Some(parent) => current = parent,
            None => return current,
        }
    }
}

/// The ordered list of runs a span covers, with the covered character range
/// of each. Returns `None` when the endpoints are not in the same tree or
/// appear out of order.
pub(crate) fn covered_runs(doc: &Document, span: &TextSpan) -> Option<Vec<(NodeId, usize, usize)>> {
    let root = tree_root_of(doc, span.start.run);
    let runs = text_runs(doc, root);
    let start_index = runs.iter().position(|&r| r == span.start.run)?;
    let end_index = runs.iter().position(|&r| r == span.end.run)?;
    if end_index < start_index {
        return None;
    }
    if start_index == end_index {
        if span.end.offset < span.start.offset {
            return None;
        }
        return Some(vec![(span.start.run, span.start.offset, span.end.offset)]);
    }
    let mut covered = Vec::with_capacity(end_index - start_index + 1);
    for (i, &run) in runs[start_index..=end_index].iter().enumerate() {
        let len = doc.text(run).map(|t| t.chars().count())?;
        let (from, to) = if i == 0 {
            (span.start.offset, len)
        } else if start_index + i == end_index {
            (0, span.end.offset)
        } else {
            (0, len)
        };
        covered.push((run, from, to));
    }
    Some(covered)
}

/// Builds the span covering `len` characters starting `start` characters
/// into the concatenated text of `runs`, walking run lengths the same way
/// offsets were accumulated when the position was recorded.
///
/// `None` when `len` is zero or the runs hold fewer than `start + len`
/// characters.
pub(crate) fn span_over_runs(
    doc: &Document,
    runs: &[NodeId],
    start: usize,
    len: usize,
) -> Option<TextSpan> {
    if len == 0 {
        return None;
    }
    let mut iter = runs.iter().copied();
    let mut local = start;
    let (start_run, start_offset, start_run_len) = loop {
        let run = iter.next()?;
        let run_len = doc.text(run)?.chars().count();
        if local < run_len {
            break (run, local, run_len);
        }
        local -= run_len;
    };
    let available = start_run_len - start_offset;
    if len <= available {
        return Some(TextSpan::within_run(start_run, start_offset, len));
    }
    let mut remaining = len - available;
    loop {
        let run = iter.next()?;
        let run_len = doc.text(run)?.chars().count();
        if remaining <= run_len {
            return Some(TextSpan {
                start: SpanPoint {
                    run: start_run,
                    offset: start_offset,
                },
                end: SpanPoint {
                    run,
                    offset: remaining,
                },
            });
        }
        remaining -= run_len;
    }
}

/// Reconstructs the text a span covers.
///
/// `None` signals a stale span: an endpoint run is gone from its tree, an
/// offset is past the end of its run, or the endpoints are reversed.
#[must_use]
pub fn span_text(doc: &Document, span: &TextSpan) -> Option<String> {
    let covered = covered_runs(doc, span)?;
    let mut out = String::new();
    for (run, from, to) in covered {
        let text = doc.text(run)?;
        out.push_str(char_slice(text, from, to)?);
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_to_byte_handles_multibyte() {
        assert_eq!(char_to_byte("héllo", 0), Some(0));
        assert_eq!(char_to_byte("héllo", 1), Some(1));
        assert_eq!(char_to_byte("héllo", 2), Some(3));
        assert_eq!(char_to_byte("héllo", 5), Some(6));
        assert_eq!(char_to_byte("héllo", 6), None);
    }

    #[test]
    fn span_text_within_one_run() {
        let mut doc = Document::new();
        let body = doc.create_element("body");
        let run = doc.create_text("Hello world");
        doc.append_child(doc.root(), body).unwrap();
        doc.append_child(body, run).unwrap();

        let span = TextSpan::within_run(run, 6, 5);
        assert_eq!(span_text(&doc, &span), Some("world".to_string()));
        assert!(!span.is_collapsed());
    }

    #[test]
    fn span_text_across_runs() {
        let mut doc = Document::new();
        let body = doc.create_element("body");
        let p = doc.create_element("p");
        let a = doc.create_text("Hello ");
        let em = doc.create_element("em");
        let b = doc.create_text("wide");
        let c = doc.create_text(" world");
        doc.append_child(doc.root(), body).unwrap();
        doc.append_child(body, p).unwrap();
        doc.append_child(p, a).unwrap();
        doc.append_child(p, em).unwrap();
        doc.append_child(em, b).unwrap();
        doc.append_child(p, c).unwrap();

        let span = TextSpan {
            start: SpanPoint { run: a, offset: 2 },
            end: SpanPoint { run: c, offset: 3 },
        };
        assert_eq!(span_text(&doc, &span), Some("llo wide wo".to_string()));
    }

    #[test]
    fn reversed_span_is_rejected() {
        let mut doc = Document::new();
        let body = doc.create_element("body");
        let a = doc.create_text("one");
        let b = doc.create_text("two");
        doc.append_child(doc.root(), body).unwrap();
        doc.append_child(body, a).unwrap();
        doc.append_child(body, b).unwrap();

        let span = TextSpan {
            start: SpanPoint { run: b, offset: 0 },
            end: SpanPoint { run: a, offset: 2 },
        };
        assert_eq!(span_text(&doc, &span), None);
    }

    #[test]
    fn offset_past_run_end_is_rejected() {
        let mut doc = Document::new();
        let run = doc.create_text("ab");
        doc.append_child(doc.root(), run).unwrap();
        let span = TextSpan::within_run(run, 1, 5);
        assert_eq!(span_text(&doc, &span), None);
    }

    #[test]
    fn shadow_spans_read_against_their_own_root() {
        let mut doc = Document::new();
        let body = doc.create_element("body");
        let host = doc.create_element("div");
        doc.append_child(doc.root(), body).unwrap();
        doc.append_child(body, host).unwrap();
        let shadow = doc.attach_shadow_root(host).unwrap();
        let a = doc.create_text("dark ");
        let b = doc.create_text("side");
        doc.append_child(shadow, a).unwrap();
        doc.append_child(shadow, b).unwrap();

        let span = TextSpan {
            start: SpanPoint { run: a, offset: 0 },
            end: SpanPoint { run: b, offset: 4 },
        };
        assert_eq!(span_text(&doc, &span), Some("dark side".to_string()));
    }

    #[test]
    fn span_over_runs_crosses_boundaries() {
        let mut doc = Document::new();
        let a = doc.create_text("abc");
        let b = doc.create_text("def");
        let c = doc.create_text("ghi");
        for run in [a, b, c] {
            doc.append_child(doc.root(), run).unwrap();
        }
        let runs = [a, b, c];

        // Starts exactly at a run boundary.
        let span = span_over_runs(&doc, &runs, 3, 2).unwrap();
        assert_eq!(span, TextSpan::within_run(b, 0, 2));

        // Ends exactly at a run boundary.
        let span = span_over_runs(&doc, &runs, 1, 5).unwrap();
        assert_eq!(span.start, SpanPoint { run: a, offset: 1 });
        assert_eq!(span.end, SpanPoint { run: b, offset: 3 });

        assert_eq!(span_text(&doc, &span), Some("bcdef".to_string()));
    }

    #[test]
    fn span_over_runs_rejects_overruns() {
        let mut doc = Document::new();
        let run = doc.create_text("short");
        doc.append_child(doc.root(), run).unwrap();
        let runs = [run];

        assert_eq!(span_over_runs(&doc, &runs, 0, 0), None);
        assert_eq!(span_over_runs(&doc, &runs, 5, 1), None);
        assert_eq!(span_over_runs(&doc, &runs, 2, 9), None);
    }
}
