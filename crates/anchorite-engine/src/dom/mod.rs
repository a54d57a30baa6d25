/*!
 * # Document Tree Substrate
 *
 * An arena-backed HTML document tree built for anchoring work: nodes are
 * stored in a flat `Vec` owned by [`Document`] and addressed by [`NodeId`],
 * so structural edits never invalidate references held elsewhere. Detached
 * nodes stay in the arena; [`Document::is_attached`] answers whether a node
 * still reaches the document root.
 *
 * ## Module Structure
 *
 * - **`tree`**: `Document`, `Node`, `NodeKind` and the mutation surface
 *   (create/append/insert/detach/split/normalize) plus the `id` attribute
 *   index
 * - **`parse`**: recovering single-pass HTML parser, including declarative
 *   shadow roots (`<template shadowrootmode="open">`)
 * - **`serialize`**: deterministic HTML writer used for round-trip checks
 * - **`runs`**: text-run enumeration, both raw (`textContent` semantics)
 *   and eligible-only (what a reader can see), and search-root discovery
 * - **`span`**: `TextSpan` endpoints into text runs and span text
 *   reconstruction
 *
 * Offsets are character offsets throughout, never bytes. The parser keeps
 * whitespace text verbatim; whitespace drift between captures is the whole
 * reason the anchor layer exists.
 */

pub mod parse;
pub mod runs;
pub mod serialize;
pub mod span;
pub mod tree;

pub use runs::SearchRoot;
pub use span::{SpanPoint, TextSpan};
pub use tree::{Document, DomError, ElementData, Node, NodeId, NodeKind};
