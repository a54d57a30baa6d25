/*!
 * # Anchoring and Relocation
 *
 * This module turns a live selection into a portable [`LocationDescriptor`]
 * and later turns that descriptor back into a highlighted span, even when
 * the document has been re-rendered or mutated in between.
 *
 * ## Pipeline
 *
 * Capture side: [`capture::capture`] names the selection's container with a
 * structural path ([`path::NodePath`]), records the selection as a
 * character offset and length relative to the container's text, and wraps
 * it in short context strings taken from the nearest block-level ancestor.
 *
 * Relocation side, in order of preference:
 *
 * 1. **Exact**: [`locate::locate`] re-resolves the path and rebuilds the
 *    span by pure offset arithmetic. Cheap, byte-exact, and the caller
 *    verifies the text before trusting it.
 * 2. **Context fallback**: [`matching::match_by_context`] searches every
 *    [`SearchRoot`](crate::dom::SearchRoot) for context + text, first
 *    literally, then whitespace-normalized, then text-only. Each tier
 *    reports a fixed confidence; the tiers never throw, they degrade.
 * 3. **Give up**: a clean not-found result. Drift is an expected outcome
 *    here, not an error.
 *
 * [`highlight::Highlighter`] wraps whatever span won in marker elements
 * and later unwraps them, restoring the exact pre-highlight structure.
 * [`orchestrate::Relocator`] sequences the whole thing with settle delays,
 * a small retry budget, and a newest-request-wins sequence guard.
 *
 * All offsets at this layer are character offsets. Tuned thresholds live
 * in [`tuning`] rather than inline.
 */

pub mod capture;
pub mod descriptor;
pub mod highlight;
pub mod locate;
pub mod matching;
pub mod orchestrate;
pub mod path;
pub mod tuning;

pub use descriptor::{LocationDescriptor, MatchMethod, MatchResult, ResolutionMethod};
pub use highlight::Highlighter;
pub use orchestrate::Relocator;
pub use path::NodePath;
pub use tuning::Tuning;
