use crate::anchor::descriptor::{MatchMethod, MatchResult};
use crate::anchor::tuning::Tuning;
use crate::dom::runs::{SearchRoot, eligible_runs, search_roots};
use crate::dom::span::span_over_runs;
use crate::dom::tree::{Document, NodeId};

/// Finds previously captured text by its surrounding context, with no
/// assumption that any stored path still resolves.
///
/// Three strategies run in decreasing confidence order, each across every
/// search root (the main tree, then each shadow root) before the next is
/// tried, so a weaker hit in the main tree can never shadow a stronger hit
/// elsewhere:
///
/// 1. literal `before + text + after` (confidence 1.0)
/// 2. the same needle with every whitespace run collapsed to one space,
///    matched through an index map back to original offsets (0.9)
/// 3. the bare text, literal first, then whitespace-tolerant (0.7);
///    skipped entirely for text shorter than the tuned minimum
///
/// Searches run over eligible runs only, so text inside `script`, `style`,
/// or hidden elements can never satisfy a match. This never fails loudly:
/// any unmatchable input produces the `none` result.
#[must_use]
pub fn match_by_context(
    doc: &Document,
    context_before: &str,
    text: &str,
    context_after: &str,
    tuning: &Tuning,
) -> MatchResult {
    let text = text.trim();
    if text.is_empty() {
        return MatchResult::none();
    }
    let scans: Vec<RootScan> = search_roots(doc)
        .into_iter()
        .map(|root| RootScan::of(doc, root))
        .collect();

    for scan in &scans {
        if let Some(result) = exact_tier(doc, scan, context_before, text, context_after) {
            return result;
        }
    }
    for scan in &scans {
        if let Some(result) = normalized_tier(doc, scan, context_before, text, context_after) {
            return result;
        }
    }
    if text.chars().count() >= tuning.min_text_match_chars {
        for scan in &scans {
            if let Some(result) = text_only_tier(doc, scan, text) {
                return result;
            }
        }
    }
    MatchResult::none()
}

/// One search root flattened to its eligible text.
struct RootScan {
    runs: Vec<NodeId>,
    text: String,
}

impl RootScan {
    fn of(doc: &Document, root: SearchRoot) -> Self {
        let runs = eligible_runs(doc, root);
        let mut text = String::new();
        for &run in &runs {
            if let Some(t) = doc.text(run) {
                text.push_str(t);
            }
        }
        Self { runs, text }
    }
}

fn exact_tier(
    doc: &Document,
    scan: &RootScan,
    before: &str,
    text: &str,
    after: &str,
) -> Option<MatchResult> {
    let needle = format!("{before}{text}{after}");
    let byte = scan.text.find(&needle)?;
    let start = scan.text[..byte].chars().count() + before.chars().count();
    let span = span_over_runs(doc, &scan.runs, start, text.chars().count())?;
    Some(MatchResult::hit(span, MatchMethod::Exact))
}

fn normalized_tier(
    doc: &Document,
    scan: &RootScan,
    before: &str,
    text: &str,
    after: &str,
) -> Option<MatchResult> {
    let (haystack, map) = collapse_with_map(&scan.text);
    let needle = collapse(&format!("{before}{text}{after}"));
    let byte = haystack.find(&needle)?;
    // The needle splits cleanly because `text` is trimmed: no whitespace
    // run crosses a piece boundary, so the collapsed prefix length locates
    // the collapsed text within the collapsed needle.
    let start = haystack[..byte].chars().count() + collapse(before).chars().count();
    let len = collapse(text).chars().count();
    let original_start = *map.get(start)?;
    let original_end = *map.get(start + len - 1)? + 1;
    let span = span_over_runs(doc, &scan.runs, original_start, original_end - original_start)?;
    Some(MatchResult::hit(span, MatchMethod::Normalized))
}

fn text_only_tier(doc: &Document, scan: &RootScan, text: &str) -> Option<MatchResult> {
    if let Some(byte) = scan.text.find(text) {
        let start = scan.text[..byte].chars().count();
        if let Some(span) = span_over_runs(doc, &scan.runs, start, text.chars().count()) {
            return Some(MatchResult::hit(span, MatchMethod::TextOnly));
        }
    }
    let haystack: Vec<char> = scan.text.chars().collect();
    let needle: Vec<char> = text.chars().collect();
    let (start, end) = whitespace_tolerant_find(&haystack, &needle)?;
    let span = span_over_runs(doc, &scan.runs, start, end - start)?;
    Some(MatchResult::hit(span, MatchMethod::TextOnly))
}

/// Collapses every whitespace run to a single space, keeping edge runs.
fn collapse(s: &str) -> String {
    let mut out = String::new();
    let mut in_whitespace = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                out.push(' ');
                in_whitespace = true;
            }
        } else {
            out.push(ch);
            in_whitespace = false;
        }
    }
    out
}

/// [`collapse`], plus a table mapping each collapsed character position to
/// the original character position it began at.
fn collapse_with_map(s: &str) -> (String, Vec<usize>) {
    let mut out = String::new();
    let mut map = Vec::new();
    let mut in_whitespace = false;
    for (i, ch) in s.chars().enumerate() {
        if ch.is_whitespace() {
            if !in_whitespace {
                out.push(' ');
                map.push(i);
                in_whitespace = true;
            }
        } else {
            out.push(ch);
            map.push(i);
            in_whitespace = false;
        }
    }
    (out, map)
}

/// Finds `needle` in `haystack` allowing any whitespace run in the source
/// wherever the needle has whitespace. Non-whitespace must match exactly.
/// Returns the matched character range.
fn whitespace_tolerant_find(haystack: &[char], needle: &[char]) -> Option<(usize, usize)> {
    let first = *needle.first()?;
    for start in 0..haystack.len() {
        if haystack[start] != first {
            continue;
        }
        if let Some(end) = tolerant_match_at(haystack, needle, start) {
            return Some((start, end));
        }
    }
    None
}

fn tolerant_match_at(haystack: &[char], needle: &[char], start: usize) -> Option<usize> {
    let mut h = start;
    let mut n = 0;
    while n < needle.len() {
        if needle[n].is_whitespace() {
            while n < needle.len() && needle[n].is_whitespace() {
                n += 1;
            }
            if h >= haystack.len() || !haystack[h].is_whitespace() {
                return None;
            }
            while h < haystack.len() && haystack[h].is_whitespace() {
                h += 1;
            }
        } else if h < haystack.len() && haystack[h] == needle[n] {
            h += 1;
            n += 1;
        } else {
            return None;
        }
    }
    Some(h)
}
