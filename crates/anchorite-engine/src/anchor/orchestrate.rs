use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use uuid::Uuid;

use crate::anchor::descriptor::{RelocateRequest, RelocateResponse, ResolutionMethod};
use crate::anchor::highlight::{ApplyOutcome, Highlighter, Viewport};
use crate::anchor::locate::locate;
use crate::anchor::matching::match_by_context;
use crate::anchor::tuning::Tuning;
use crate::dom::span::{TextSpan, span_text};
use crate::dom::tree::Document;

/// The document as shared between the relocation loop and fade timers.
/// Locks are taken for single synchronous walks and never held across an
/// await point.
pub type SharedDocument = Arc<Mutex<Document>>;

/// Receives the one user-facing notice when relocation fails for good in
/// the primary context.
pub trait FailureNotifier: Send + Sync {
    /// `page_kind` is advisory and may only affect the wording.
    fn notify_failure(&self, page_kind: Option<&str>);
}

/// How one relocation request ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RelocateOutcome {
    Completed(RelocateResponse),
    /// A newer request arrived while this one was waiting; it stopped
    /// without touching the document again.
    Superseded,
}

/// Drives the full relocation sequence for one document: settle delay,
/// exact location with text verification, context fallback, bounded
/// retries, highlight, failure report.
///
/// Requests are sequenced by a monotonically increasing number; every
/// delayed continuation re-checks that it still belongs to the newest
/// request before acting, so rapid repeated requests cannot interleave
/// their side effects.
pub struct Relocator<V, N> {
    doc: SharedDocument,
    highlighter: Arc<Mutex<Highlighter<V>>>,
    notifier: N,
    tuning: Tuning,
    latest: AtomicU64,
}

impl<V: Viewport + 'static, N: FailureNotifier> Relocator<V, N> {
    #[must_use]
    pub fn new(doc: SharedDocument, viewport: V, notifier: N, tuning: Tuning) -> Self {
        Self {
            doc,
            highlighter: Arc::new(Mutex::new(Highlighter::new(viewport))),
            notifier,
            tuning,
            latest: AtomicU64::new(0),
        }
    }

    /// Runs one relocation request to completion.
    ///
    /// Attempt order per try: exact path resolution, its text verified
    /// against the captured original, then context matching. A hit goes
    /// straight to the highlighter; a failed attempt waits the retry delay
    /// while the page keeps rendering. A highlight that cannot be applied
    /// does not downgrade the response beyond `scrolled_to: false`; the
    /// text was found.
    pub async fn relocate(&self, request: RelocateRequest) -> RelocateOutcome {
        let seq = self.latest.fetch_add(1, Ordering::SeqCst) + 1;

        if !self.provenance_matches(&request) {
            tracing::debug!(
                url = request.descriptor.source_url.as_deref().unwrap_or(""),
                "descriptor was captured on a different page, not attempting"
            );
            return RelocateOutcome::Completed(failure_response());
        }

        {
            let mut doc = lock(&self.doc);
            lock(&self.highlighter).clear(&mut doc);
        }

        tokio::time::sleep(self.tuning.settle_delay(request.primary_context)).await;
        if self.superseded(seq) {
            return RelocateOutcome::Superseded;
        }

        for attempt in 1..=self.tuning.max_attempts {
            if let Some(response) = self.attempt(&request) {
                return RelocateOutcome::Completed(response);
            }
            if attempt < self.tuning.max_attempts {
                tracing::debug!(attempt, "relocation attempt failed, retrying");
                tokio::time::sleep(self.tuning.retry_delay(request.primary_context)).await;
                if self.superseded(seq) {
                    return RelocateOutcome::Superseded;
                }
            }
        }

        tracing::info!(
            path = %request.descriptor.path,
            attempts = self.tuning.max_attempts,
            "relocation failed on every attempt"
        );
        if request.primary_context {
            self.notifier.notify_failure(request.page_kind.as_deref());
        }
        RelocateOutcome::Completed(failure_response())
    }

    /// Clears any live highlight immediately.
    pub fn clear_highlight(&self) {
        let mut doc = lock(&self.doc);
        lock(&self.highlighter).clear(&mut doc);
    }

    fn attempt(&self, request: &RelocateRequest) -> Option<RelocateResponse> {
        let descriptor = &request.descriptor;
        let mut doc = lock(&self.doc);

        if let Some(span) = locate(&doc, descriptor)
            && span_text(&doc, &span).as_deref() == Some(descriptor.original_text.as_str())
        {
            let outcome = self.apply_highlight(&mut doc, &span);
            return Some(RelocateResponse {
                success: true,
                scrolled_to: outcome.applied && outcome.scrolled,
                method: ResolutionMethod::Xpath,
                confidence: None,
            });
        }

        let result = match_by_context(
            &doc,
            &descriptor.context_before,
            &descriptor.original_text,
            &descriptor.context_after,
            &self.tuning,
        );
        if result.found
            && let Some(span) = result.span
        {
            let outcome = self.apply_highlight(&mut doc, &span);
            return Some(RelocateResponse {
                success: true,
                scrolled_to: outcome.applied && outcome.scrolled,
                method: result.method.into(),
                confidence: Some(result.confidence),
            });
        }
        None
    }

    fn apply_highlight(&self, doc: &mut Document, span: &TextSpan) -> ApplyOutcome {
        let mut highlighter = lock(&self.highlighter);
        let outcome = highlighter.apply(doc, span);
        if outcome.applied
            && let Some(session) = highlighter.session_id()
        {
            drop(highlighter);
            self.schedule_fade(session);
        }
        outcome
    }

    /// Runs the dwell, fade, remove sequence for `session` on a spawned
    /// task. Skipped when no runtime is present; synchronous callers clear
    /// on their own schedule. Every step re-checks the session so a stale
    /// timer cannot touch a newer highlight.
    fn schedule_fade(&self, session: Uuid) {
        if tokio::runtime::Handle::try_current().is_err() {
            return;
        }
        let doc = Arc::clone(&self.doc);
        let highlighter = Arc::clone(&self.highlighter);
        let dwell = self.tuning.highlight_dwell();
        let fade = self.tuning.highlight_fade();
        tokio::spawn(async move {
            tokio::time::sleep(dwell).await;
            {
                let mut doc = lock(&doc);
                if !lock(&highlighter).begin_fade(&mut doc, session) {
                    return;
                }
            }
            tokio::time::sleep(fade).await;
            let mut doc = lock(&doc);
            lock(&highlighter).clear_if_current(&mut doc, session);
        });
    }

    /// A descriptor only relocates against the page it was captured on.
    /// The URL fragment is navigation state, not page identity. Missing
    /// provenance on either side attempts the relocation anyway.
    fn provenance_matches(&self, request: &RelocateRequest) -> bool {
        let doc = lock(&self.doc);
        match (&request.descriptor.source_url, &doc.source_url) {
            (Some(wanted), Some(actual)) => strip_fragment(wanted) == strip_fragment(actual),
            _ => true,
        }
    }

    fn superseded(&self, seq: u64) -> bool {
        self.latest.load(Ordering::SeqCst) != seq
    }
}

fn failure_response() -> RelocateResponse {
    RelocateResponse {
        success: false,
        scrolled_to: false,
        method: ResolutionMethod::None,
        confidence: None,
    }
}

fn strip_fragment(url: &str) -> &str {
    url.split_once('#').map_or(url, |(base, _)| base)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
