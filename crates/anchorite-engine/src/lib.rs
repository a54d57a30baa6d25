pub mod anchor;
pub mod dom;

// Re-export key types for easier usage
pub use anchor::{
    capture::capture,
    descriptor::{
        LocationDescriptor, MatchMethod, MatchResult, RelocateRequest, RelocateResponse,
        ResolutionMethod,
    },
    highlight::{ApplyOutcome, Highlighter, NullViewport, Viewport},
    locate::locate,
    matching::match_by_context,
    orchestrate::{FailureNotifier, RelocateOutcome, Relocator, SharedDocument},
    path::NodePath,
    tuning::Tuning,
};
pub use dom::{Document, NodeId, NodeKind, SearchRoot, SpanPoint, TextSpan};
