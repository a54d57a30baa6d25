use serde::{Deserialize, Serialize};

use crate::dom::span::TextSpan;

/// Everything needed to re-find a span of text later, in a document that
/// may have changed shape in the meantime.
///
/// Captured once, then immutable; the persisted JSON shape uses camelCase
/// field names. `path` is the string form of a
/// [`NodePath`](crate::anchor::path::NodePath); offsets and lengths count
/// characters within the container's concatenated text, after whitespace
/// trimming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationDescriptor {
    /// Structural path to the container element.
    pub path: String,
    /// Character offset of the selection within the container's text.
    pub text_offset: usize,
    /// Character length of the selection. Always at least 1.
    pub text_length: usize,
    /// Up to a window of characters immediately before the selection.
    pub context_before: String,
    /// Up to a window of characters immediately after the selection.
    pub context_after: String,
    /// The selected text itself, whitespace-trimmed.
    pub original_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_title: Option<String>,
}

/// How a fallback search found its span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchMethod {
    /// Literal context + text + context hit.
    Exact,
    /// Hit after collapsing whitespace runs on both sides.
    Normalized,
    /// The bare text was found without its context.
    TextOnly,
    /// Nothing matched.
    None,
}

impl MatchMethod {
    /// The fixed confidence score of this tier.
    #[must_use]
    pub fn confidence(self) -> f32 {
        match self {
            MatchMethod::Exact => 1.0,
            MatchMethod::Normalized => 0.9,
            MatchMethod::TextOnly => 0.7,
            MatchMethod::None => 0.0,
        }
    }
}

/// Outcome of a fallback search. Never an error: a search that finds
/// nothing reports `found: false` with zero confidence.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub found: bool,
    pub span: Option<TextSpan>,
    pub confidence: f32,
    pub method: MatchMethod,
}

impl MatchResult {
    /// The clean no-match result.
    #[must_use]
    pub fn none() -> Self {
        Self {
            found: false,
            span: None,
            confidence: 0.0,
            method: MatchMethod::None,
        }
    }

    pub(crate) fn hit(span: TextSpan, method: MatchMethod) -> Self {
        Self {
            found: true,
            span: Some(span),
            confidence: method.confidence(),
            method,
        }
    }
}

/// How a completed relocation found its target, as reported outward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionMethod {
    /// The structural path still resolved and the text verified.
    Xpath,
    ContextExact,
    ContextNormalized,
    ContextTextOnly,
    None,
}

impl From<MatchMethod> for ResolutionMethod {
    fn from(method: MatchMethod) -> Self {
        match method {
            MatchMethod::Exact => ResolutionMethod::ContextExact,
            MatchMethod::Normalized => ResolutionMethod::ContextNormalized,
            MatchMethod::TextOnly => ResolutionMethod::ContextTextOnly,
            MatchMethod::None => ResolutionMethod::None,
        }
    }
}

/// An inbound request to re-anchor a previously captured descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelocateRequest {
    pub descriptor: LocationDescriptor,
    /// True when this engine runs in the top-level document rather than an
    /// embedded context. Governs delay lengths and who may surface failure.
    pub primary_context: bool,
    /// Free-form page classification, only ever used to word failure
    /// notices.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_kind: Option<String>,
}

/// The outward response for a completed relocation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelocateResponse {
    pub success: bool,
    /// Whether the view was moved to a fresh highlight.
    pub scrolled_to: bool,
    pub method: ResolutionMethod,
    /// Present for context-tier methods, absent for `xpath` and `none`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}
