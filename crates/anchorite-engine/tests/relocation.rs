//! End-to-end relocation scenarios through the public API: capture a
//! selection, mutate the document the way a re-render would, and check that
//! the right fallback tier finds it again and that highlighting leaves no
//! trace behind.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use anchorite_engine::{
    Document, FailureNotifier, Highlighter, LocationDescriptor, NodeId, NullViewport,
    RelocateOutcome, RelocateRequest, RelocateResponse, Relocator, ResolutionMethod, SharedDocument,
    SpanPoint, TextSpan, Tuning, Viewport, capture, locate,
};
use pretty_assertions::assert_eq;

#[test]
fn round_trip_on_an_unchanged_document() {
    let doc = Document::parse_html(
        r#"<article id="a"><p>The quick brown fox jumps over the lazy dog</p></article>"#,
    );
    let article = doc.by_id("a").unwrap();
    let p = doc.children(article)[0];
    let run = doc.children(p)[0];
    let selection = TextSpan::within_run(run, 10, 9);

    let descriptor = capture(&doc, selection, &Tuning::default()).unwrap();
    assert_eq!(descriptor.original_text, "brown fox");
    assert_eq!(descriptor.path, r#"//*[@id="a"]/p"#);
    assert_eq!(descriptor.context_before, "The quick ");
    assert_eq!(descriptor.context_after, " jumps over the lazy dog");

    let relocated = locate(&doc, &descriptor).unwrap();
    assert_eq!(relocated, selection);

    use anchorite_engine::dom::span::span_text;
    assert_eq!(span_text(&doc, &relocated).as_deref(), Some("brown fox"));
}

#[tokio::test]
async fn relocation_survives_a_rerender() {
    let mut doc = Document::parse_html(r#"<div id="content"><p>Hello world</p></div>"#);
    let div = doc.by_id("content").unwrap();
    let p = doc.children(div)[0];
    let run = doc.children(p)[0];
    let descriptor = capture(&doc, TextSpan::within_run(run, 6, 5), &Tuning::default()).unwrap();

    // Same words, brand new markup. The stored path is now meaningless.
    doc.set_inner_html(div, "Hello <span>world</span>").unwrap();

    let shared: SharedDocument = Arc::new(Mutex::new(doc));
    let relocator = Relocator::new(
        Arc::clone(&shared),
        NullViewport,
        CountingNotifier::default(),
        fast_tuning(),
    );
    let response = expect_completed(relocator.relocate(primary_request(descriptor)).await);

    assert!(response.success);
    assert_eq!(response.method, ResolutionMethod::ContextExact);
    assert_eq!(response.confidence, Some(1.0));
    insta::assert_snapshot!(
        lock(&shared).to_html(),
        @r#"<div id="content">Hello <span><mark class="anchorite-highlight">world</mark></span></div>"#
    );
}

#[tokio::test]
async fn whitespace_reflow_degrades_to_a_normalized_match() {
    let mut doc = Document::parse_html(r#"<div id="c"><p>value of the constant</p></div>"#);
    let div = doc.by_id("c").unwrap();
    let p = doc.children(div)[0];
    let run = doc.children(p)[0];
    let descriptor = capture(&doc, TextSpan::within_run(run, 6, 6), &Tuning::default()).unwrap();
    assert_eq!(descriptor.original_text, "of the");

    // A pretty-printer reflowed the paragraph.
    doc.set_text(run, "value of\n    the constant").unwrap();

    let shared: SharedDocument = Arc::new(Mutex::new(doc));
    let relocator = Relocator::new(
        Arc::clone(&shared),
        NullViewport,
        CountingNotifier::default(),
        fast_tuning(),
    );
    let response = expect_completed(relocator.relocate(primary_request(descriptor)).await);

    assert!(response.success);
    assert_eq!(response.method, ResolutionMethod::ContextNormalized);
    assert_eq!(response.confidence, Some(0.9));

    // The highlight covers the drifted source text, whitespace and all.
    let html = lock(&shared).to_html();
    assert!(html.contains("<mark class=\"anchorite-highlight\">of\n    the</mark>"));
}

#[tokio::test]
async fn bare_text_still_relocates_without_its_context() {
    let mut doc = Document::parse_html(r#"<div id="c"><p>alpha unique-needle omega</p></div>"#);
    let div = doc.by_id("c").unwrap();
    let p = doc.children(div)[0];
    let run = doc.children(p)[0];
    let descriptor = capture(&doc, TextSpan::within_run(run, 6, 13), &Tuning::default()).unwrap();
    assert_eq!(descriptor.original_text, "unique-needle");

    // The surrounding prose is gone; only the selected words survive.
    doc.set_inner_html(div, "<ul><li>something else</li><li>unique-needle</li></ul>")
        .unwrap();

    let shared: SharedDocument = Arc::new(Mutex::new(doc));
    let relocator = Relocator::new(
        Arc::clone(&shared),
        NullViewport,
        CountingNotifier::default(),
        fast_tuning(),
    );
    let response = expect_completed(relocator.relocate(primary_request(descriptor)).await);

    assert!(response.success);
    assert_eq!(response.method, ResolutionMethod::ContextTextOnly);
    assert_eq!(response.confidence, Some(0.7));
    let html = lock(&shared).to_html();
    assert!(html.contains(r#"<li><mark class="anchorite-highlight">unique-needle</mark></li>"#));
}

#[tokio::test]
async fn a_vanished_selection_fails_without_touching_the_document() {
    let doc = Document::parse_html("<main><p>completely unrelated prose</p></main>");
    let pristine = doc.to_html();
    let descriptor = LocationDescriptor {
        path: "/main/article/p".to_string(),
        text_offset: 4,
        text_length: 7,
        context_before: "the ".to_string(),
        context_after: " clause".to_string(),
        original_text: "deleted".to_string(),
        source_url: None,
        source_title: None,
    };

    let shared: SharedDocument = Arc::new(Mutex::new(doc));
    let notifier = CountingNotifier::default();
    let relocator = Relocator::new(
        Arc::clone(&shared),
        NullViewport,
        notifier.clone(),
        fast_tuning(),
    );
    let response = expect_completed(relocator.relocate(primary_request(descriptor)).await);

    assert!(!response.success);
    assert!(!response.scrolled_to);
    assert_eq!(response.method, ResolutionMethod::None);
    assert_eq!(response.confidence, None);
    assert_eq!(notifier.0.load(Ordering::SeqCst), 1);
    assert_eq!(lock(&shared).to_html(), pristine);
}

#[test]
fn highlighting_is_fully_reversible() {
    let mut doc =
        Document::parse_html(r#"<p id="one">Hello <b>brave</b> world</p><p id="two">again</p>"#);
    let pristine = doc.to_html();
    let one = doc.by_id("one").unwrap();
    let hello = doc.children(one)[0];
    let brave = doc.children(doc.children(one)[1])[0];
    let span = TextSpan {
        start: SpanPoint {
            run: hello,
            offset: 3,
        },
        end: SpanPoint {
            run: brave,
            offset: 3,
        },
    };

    let mut highlighter = Highlighter::new(NullViewport);
    assert!(highlighter.apply(&mut doc, &span).applied);
    let first = highlighter.session_id().unwrap();
    assert_eq!(count_markers(&doc), 2);

    // A second apply replaces the first session outright.
    let two = doc.by_id("two").unwrap();
    let again = doc.children(two)[0];
    assert!(
        highlighter
            .apply(&mut doc, &TextSpan::within_run(again, 0, 5))
            .applied
    );
    let second = highlighter.session_id().unwrap();
    assert_ne!(first, second);
    assert_eq!(count_markers(&doc), 1);

    highlighter.clear(&mut doc);
    assert_eq!(highlighter.session_id(), None);
    assert_eq!(doc.to_html(), pristine);
}

#[tokio::test]
async fn a_live_viewport_reports_the_scroll() {
    struct AlwaysScrolls;
    impl Viewport for AlwaysScrolls {
        fn scroll_into_view(&mut self, _doc: &Document, _node: NodeId) -> bool {
            true
        }
    }

    let doc = Document::parse_html(r#"<div id="v"><p>scroll to here</p></div>"#);
    let descriptor = {
        let div = doc.by_id("v").unwrap();
        let p = doc.children(div)[0];
        let run = doc.children(p)[0];
        capture(&doc, TextSpan::within_run(run, 10, 4), &Tuning::default()).unwrap()
    };

    let shared: SharedDocument = Arc::new(Mutex::new(doc));
    let relocator = Relocator::new(
        Arc::clone(&shared),
        AlwaysScrolls,
        CountingNotifier::default(),
        fast_tuning(),
    );
    let response = expect_completed(relocator.relocate(primary_request(descriptor)).await);

    assert!(response.success);
    assert!(response.scrolled_to);
    assert_eq!(response.method, ResolutionMethod::Xpath);
}

#[tokio::test]
async fn a_persisted_descriptor_relocates_after_reload() {
    let doc = Document::parse_html(r#"<section id="s"><p>saved for later reading</p></section>"#);
    let descriptor = {
        let section = doc.by_id("s").unwrap();
        let p = doc.children(section)[0];
        let run = doc.children(p)[0];
        capture(&doc, TextSpan::within_run(run, 10, 5), &Tuning::default()).unwrap()
    };

    // Store and reload, the way a sidebar would across sessions.
    let stored = serde_json::to_string(&descriptor).unwrap();
    assert!(stored.contains(r#""textOffset":10"#));
    let reloaded: LocationDescriptor = serde_json::from_str(&stored).unwrap();

    let shared: SharedDocument = Arc::new(Mutex::new(doc));
    let relocator = Relocator::new(
        Arc::clone(&shared),
        NullViewport,
        CountingNotifier::default(),
        fast_tuning(),
    );
    let response = expect_completed(relocator.relocate(primary_request(reloaded)).await);

    assert!(response.success);
    assert_eq!(response.method, ResolutionMethod::Xpath);
    assert!(
        lock(&shared)
            .to_html()
            .contains(r#"<mark class="anchorite-highlight">later</mark>"#)
    );
}

// ============ helpers ============

#[derive(Clone, Default)]
struct CountingNotifier(Arc<AtomicUsize>);

impl FailureNotifier for CountingNotifier {
    fn notify_failure(&self, _page_kind: Option<&str>) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

fn fast_tuning() -> Tuning {
    Tuning {
        primary_settle_ms: 1,
        nested_settle_ms: 1,
        primary_retry_ms: 1,
        nested_retry_ms: 1,
        highlight_dwell_ms: 50,
        highlight_fade_ms: 10,
        ..Tuning::default()
    }
}

fn primary_request(descriptor: LocationDescriptor) -> RelocateRequest {
    RelocateRequest {
        descriptor,
        primary_context: true,
        page_kind: None,
    }
}

fn expect_completed(outcome: RelocateOutcome) -> RelocateResponse {
    match outcome {
        RelocateOutcome::Completed(response) => response,
        RelocateOutcome::Superseded => panic!("request was superseded"),
    }
}

fn lock(doc: &SharedDocument) -> MutexGuard<'_, Document> {
    doc.lock().unwrap()
}

fn count_markers(doc: &Document) -> usize {
    doc.to_html().matches("anchorite-highlight").count()
}
