use std::collections::HashMap;

use crate::dom::span::char_to_byte;

/// Index of a node in the document arena.
///
/// Ids are stable for the lifetime of the [`Document`]: nodes are detached,
/// never freed, so a held `NodeId` can always be dereferenced even after the
/// node has left the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Element name plus attributes in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementData {
    /// Lowercase tag name.
    pub tag_name: String,
    /// Attributes in the order they were written or set.
    pub attrs: Vec<(String, String)>,
}

impl ElementData {
    /// Returns the value of the named attribute, if present.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// The document root. Exactly one per arena, created by [`Document::new`].
    Document,
    Element(ElementData),
    /// A text run. The string is decoded text, offsets into it are characters.
    Text(String),
    Comment(String),
    /// Root of an isolated sub-tree owned by a host element.
    ShadowRoot,
}

impl NodeKind {
    /// True for kinds that may hold children.
    #[must_use]
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            NodeKind::Document | NodeKind::Element(_) | NodeKind::ShadowRoot
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    /// Attached shadow root, elements only. Not part of `children`.
    pub(crate) shadow_root: Option<NodeId>,
}

#[derive(Debug, thiserror::Error)]
pub enum DomError {
    #[error("node {0:?} cannot contain children")]
    NotAContainer(NodeId),
    #[error("node {0:?} is not an element")]
    NotAnElement(NodeId),
    #[error("node {0:?} is not a text run")]
    NotAText(NodeId),
    #[error("reference node {reference:?} is not a child of {parent:?}")]
    NotAChild { parent: NodeId, reference: NodeId },
    #[error("inserting node {0:?} there would create a cycle")]
    WouldCycle(NodeId),
    #[error("offset {offset} is past the end of a {len} character run")]
    OffsetOutOfRange { offset: usize, len: usize },
    #[error("element {0:?} already has a shadow root")]
    ShadowRootExists(NodeId),
    #[error("the document root cannot be moved or detached")]
    RootImmovable,
}

/// An arena-backed document tree.
///
/// All structural state lives here; [`NodeId`]s handed out by the mutation
/// methods index into the arena. The `id` attribute index is maintained on
/// every attribute mutation so id lookups never rescan the tree.
#[derive(Debug, Clone)]
pub struct Document {
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: NodeId,
    pub(crate) id_index: HashMap<String, Vec<NodeId>>,
    /// URL the document was captured from, when known.
    pub source_url: Option<String>,
    /// Contents of the first `<title>` element seen by the parser.
    pub title: Option<String>,
}

impl Document {
    /// Creates an empty document containing only the root node.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
                shadow_root: None,
            }],
            root: NodeId(0),
            id_index: HashMap::new(),
            source_url: None,
            title: None,
        }
    }

    /// The document root node.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    #[must_use]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Element data of `id`, or `None` for non-element nodes.
    #[must_use]
    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.node(id).kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    #[must_use]
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.tag_name.as_str())
    }

    #[must_use]
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|e| e.attr(name))
    }

    /// Text of a text run, or `None` for other node kinds.
    #[must_use]
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Concatenated text of all descendant runs, in document order.
    ///
    /// Shadow content is not included; a shadow root is its own sub-tree.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        crate::dom::runs::text_content(self, id)
    }

    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    fn push_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
            shadow_root: None,
        });
        id
    }

    /// Creates a detached element. Tag names are normalized to lowercase.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push_node(NodeKind::Element(ElementData {
            tag_name: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
        }))
    }

    /// Creates a detached element with attributes, indexing any `id`.
    pub fn create_element_with_attrs(&mut self, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let id = self.push_node(NodeKind::Element(ElementData {
            tag_name: tag.to_ascii_lowercase(),
            attrs: attrs
                .iter()
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect(),
        }));
        if let Some(value) = self.attr(id, "id").map(str::to_string) {
            self.index_id(&value, id);
        }
        id
    }

    /// Creates a detached text run.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push_node(NodeKind::Text(text.to_string()))
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.push_node(NodeKind::Comment(text.to_string()))
    }

    // ------------------------------------------------------------------
    // Structure mutation
    // ------------------------------------------------------------------

    /// Appends `child` as the last child of `parent`, moving it if attached
    /// elsewhere.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.insert_before(parent, child, None)
    }

    /// Inserts `child` into `parent` before `reference`, or at the end when
    /// `reference` is `None`.
    ///
    /// The child is detached from any previous parent first. Fails when the
    /// parent cannot hold children, when the reference is not a child of the
    /// parent, or when the insertion would make a node its own ancestor.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DomError> {
        if !self.node(parent).kind.is_container() {
            return Err(DomError::NotAContainer(parent));
        }
        if child == self.root {
            return Err(DomError::RootImmovable);
        }
        if child == parent || self.is_ancestor_of(child, parent) {
            return Err(DomError::WouldCycle(child));
        }
        let position = match reference {
            Some(reference) => self
                .node(parent)
                .children
                .iter()
                .position(|&c| c == reference)
                .ok_or(DomError::NotAChild { parent, reference })?,
            None => self.node(parent).children.len(),
        };
        self.detach(child)?;
        // Detaching may have shifted sibling positions when moving within
        // the same parent; recompute against the reference node.
        let position = match reference {
            Some(reference) => self
                .node(parent)
                .children
                .iter()
                .position(|&c| c == reference)
                .unwrap_or(position),
            None => self.node(parent).children.len(),
        };
        self.node_mut(parent).children.insert(position, child);
        self.node_mut(child).parent = Some(parent);
        Ok(())
    }

    /// Removes `node` from its parent, leaving it (and its sub-tree) in the
    /// arena. Detaching an already detached node is a no-op.
    pub fn detach(&mut self, node: NodeId) -> Result<(), DomError> {
        if node == self.root {
            return Err(DomError::RootImmovable);
        }
        if let Some(parent) = self.node(node).parent {
            // A shadow root's parent link points at its host without being
            // in the host's child list; sever the host link instead.
            if self.node(parent).shadow_root == Some(node) {
                self.node_mut(parent).shadow_root = None;
            } else {
                self.node_mut(parent).children.retain(|&c| c != node);
            }
            self.node_mut(node).parent = None;
        }
        Ok(())
    }

    /// True when `node` is `ancestor` or a descendant of it, following
    /// parent links (which cross shadow boundaries via the host).
    #[must_use]
    pub fn is_ancestor_of(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.node(id).parent;
        }
        false
    }

    /// True when `node` still reaches the document root through parent links.
    #[must_use]
    pub fn is_attached(&self, node: NodeId) -> bool {
        self.is_ancestor_of(self.root, node)
    }

    /// Nearest node that is an ancestor of (or equal to) both `a` and `b`,
    /// or `None` when they live in unrelated detached trees.
    #[must_use]
    pub fn common_ancestor(&self, a: NodeId, b: NodeId) -> Option<NodeId> {
        let mut seen = Vec::new();
        let mut current = Some(a);
        while let Some(id) = current {
            seen.push(id);
            current = self.node(id).parent;
        }
        let mut current = Some(b);
        while let Some(id) = current {
            if seen.contains(&id) {
                return Some(id);
            }
            current = self.node(id).parent;
        }
        None
    }

    // ------------------------------------------------------------------
    // Attributes and the id index
    // ------------------------------------------------------------------

    /// Sets an attribute, replacing any previous value. `id` values are kept
    /// in the document id index.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        if name == "id"
            && let Some(old) = self.attr(id, "id").map(str::to_string)
        {
            self.unindex_id(&old, id);
        }
        let NodeKind::Element(data) = &mut self.node_mut(id).kind else {
            return Err(DomError::NotAnElement(id));
        };
        match data.attrs.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value.to_string(),
            None => data.attrs.push((name.to_string(), value.to_string())),
        }
        if name == "id" {
            self.index_id(value, id);
        }
        Ok(())
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> Result<(), DomError> {
        if name == "id"
            && let Some(old) = self.attr(id, "id").map(str::to_string)
        {
            self.unindex_id(&old, id);
        }
        let NodeKind::Element(data) = &mut self.node_mut(id).kind else {
            return Err(DomError::NotAnElement(id));
        };
        data.attrs.retain(|(n, _)| n != name);
        Ok(())
    }

    pub(crate) fn index_id(&mut self, value: &str, node: NodeId) {
        let slot = self.id_index.entry(value.to_string()).or_default();
        if !slot.contains(&node) {
            slot.push(node);
        }
    }

    fn unindex_id(&mut self, value: &str, node: NodeId) {
        if let Some(slot) = self.id_index.get_mut(value) {
            slot.retain(|&n| n != node);
            if slot.is_empty() {
                self.id_index.remove(value);
            }
        }
    }

    /// First attached element carrying `id="value"`.
    #[must_use]
    pub fn by_id(&self, value: &str) -> Option<NodeId> {
        self.id_index
            .get(value)?
            .iter()
            .copied()
            .find(|&n| self.is_attached(n))
    }

    /// True when exactly one attached element carries `id="value"`.
    #[must_use]
    pub fn id_is_unique(&self, value: &str) -> bool {
        match self.id_index.get(value) {
            Some(slot) => slot.iter().filter(|&&n| self.is_attached(n)).count() == 1,
            None => false,
        }
    }

    // ------------------------------------------------------------------
    // Text runs
    // ------------------------------------------------------------------

    /// Replaces the text of a run.
    pub fn set_text(&mut self, id: NodeId, value: &str) -> Result<(), DomError> {
        match &mut self.node_mut(id).kind {
            NodeKind::Text(text) => {
                *text = value.to_string();
                Ok(())
            }
            _ => Err(DomError::NotAText(id)),
        }
    }

    /// Splits a text run at a character offset.
    ///
    /// The run keeps `[0, offset)`; a new run holding the rest is inserted
    /// immediately after it and returned. Splitting a detached run leaves
    /// the new run detached.
    pub fn split_text(&mut self, run: NodeId, offset: usize) -> Result<NodeId, DomError> {
        let rest = {
            let NodeKind::Text(text) = &mut self.node_mut(run).kind else {
                return Err(DomError::NotAText(run));
            };
            let byte = char_to_byte(text, offset).ok_or(DomError::OffsetOutOfRange {
                offset,
                len: text.chars().count(),
            })?;
            let rest = text[byte..].to_string();
            text.truncate(byte);
            rest
        };
        let right = self.create_text(&rest);
        if let Some(parent) = self.node(run).parent {
            let position = self
                .node(parent)
                .children
                .iter()
                .position(|&c| c == run)
                .map(|p| p + 1);
            match position.and_then(|p| self.node(parent).children.get(p).copied()) {
                Some(next) => self.insert_before(parent, right, Some(next))?,
                None => self.append_child(parent, right)?,
            }
        }
        Ok(right)
    }

    /// Merges adjacent text runs and drops empty ones, recursively.
    ///
    /// The inverse of repeated [`Document::split_text`]: after a split and a
    /// normalize the serialized tree is byte-identical.
    pub fn normalize(&mut self, node: NodeId) {
        let children = self.node(node).children.clone();
        let mut kept: Vec<NodeId> = Vec::with_capacity(children.len());
        for child in children {
            let text = match &self.node(child).kind {
                NodeKind::Text(t) => Some(t.clone()),
                _ => None,
            };
            let Some(value) = text else {
                kept.push(child);
                self.normalize(child);
                continue;
            };
            if value.is_empty() {
                self.node_mut(child).parent = None;
                continue;
            }
            if let Some(&last) = kept.last()
                && let NodeKind::Text(prev) = &mut self.node_mut(last).kind
            {
                prev.push_str(&value);
                self.node_mut(child).parent = None;
                continue;
            }
            kept.push(child);
        }
        self.node_mut(node).children = kept;
    }

    // ------------------------------------------------------------------
    // Shadow roots
    // ------------------------------------------------------------------

    /// Attaches a shadow root to an element. An element can host only one.
    ///
    /// The shadow root's parent link points at the host so attachment checks
    /// cross the boundary, but it is not part of the host's child list and
    /// its content never shows up in the host's `text_content`.
    pub fn attach_shadow_root(&mut self, host: NodeId) -> Result<NodeId, DomError> {
        let NodeKind::Element(_) = self.node(host).kind else {
            return Err(DomError::NotAnElement(host));
        };
        if self.node(host).shadow_root.is_some() {
            return Err(DomError::ShadowRootExists(host));
        }
        let shadow = self.push_node(NodeKind::ShadowRoot);
        self.node_mut(shadow).parent = Some(host);
        self.node_mut(host).shadow_root = Some(shadow);
        Ok(shadow)
    }

    /// The shadow root attached to `host`, if any.
    #[must_use]
    pub fn shadow_root(&self, host: NodeId) -> Option<NodeId> {
        self.node(host).shadow_root
    }

    // ------------------------------------------------------------------
    // Fragment parsing and serialization (forwarded)
    // ------------------------------------------------------------------

    /// Replaces the children of `node` with the parse of an HTML fragment.
    pub fn set_inner_html(&mut self, node: NodeId, html: &str) -> Result<(), DomError> {
        if !self.node(node).kind.is_container() {
            return Err(DomError::NotAContainer(node));
        }
        let children = self.node(node).children.clone();
        for child in children {
            self.detach(child)?;
        }
        crate::dom::parse::parse_fragment(self, node, html);
        Ok(())
    }

    /// Serialized HTML of `node`'s children.
    #[must_use]
    pub fn inner_html(&self, node: NodeId) -> String {
        crate::dom::serialize::inner_html(self, node)
    }

    /// Serialized HTML of the whole document.
    #[must_use]
    pub fn to_html(&self) -> String {
        crate::dom::serialize::to_html(self, self.root)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with_body() -> (Document, NodeId) {
        let mut doc = Document::new();
        let body = doc.create_element("body");
        doc.append_child(doc.root(), body).unwrap();
        (doc, body)
    }

    // ============ Construction and traversal ============

    #[test]
    fn append_and_traverse() {
        let (mut doc, body) = doc_with_body();
        let p = doc.create_element("p");
        let text = doc.create_text("hello");
        doc.append_child(body, p).unwrap();
        doc.append_child(p, text).unwrap();

        assert_eq!(doc.children(body), &[p]);
        assert_eq!(doc.parent(text), Some(p));
        assert_eq!(doc.text(text), Some("hello"));
        assert_eq!(doc.tag_name(p), Some("p"));
    }

    #[test]
    fn tag_names_are_lowercased() {
        let mut doc = Document::new();
        let el = doc.create_element("DIV");
        assert_eq!(doc.tag_name(el), Some("div"));
    }

    #[test]
    fn insert_before_positions_child() {
        let (mut doc, body) = doc_with_body();
        let a = doc.create_element("a");
        let b = doc.create_element("b");
        let c = doc.create_element("c");
        doc.append_child(body, a).unwrap();
        doc.append_child(body, c).unwrap();
        doc.insert_before(body, b, Some(c)).unwrap();
        assert_eq!(doc.children(body), &[a, b, c]);
    }

    #[test]
    fn insert_before_rejects_foreign_reference() {
        let (mut doc, body) = doc_with_body();
        let other = doc.create_element("div");
        let child = doc.create_element("p");
        let result = doc.insert_before(body, child, Some(other));
        assert!(matches!(result, Err(DomError::NotAChild { .. })));
    }

    #[test]
    fn insert_rejects_cycles() {
        let (mut doc, body) = doc_with_body();
        let outer = doc.create_element("div");
        let inner = doc.create_element("div");
        doc.append_child(body, outer).unwrap();
        doc.append_child(outer, inner).unwrap();
        let result = doc.append_child(inner, outer);
        assert!(matches!(result, Err(DomError::WouldCycle(_))));
    }

    #[test]
    fn insert_moves_attached_node() {
        let (mut doc, body) = doc_with_body();
        let a = doc.create_element("div");
        let b = doc.create_element("div");
        let child = doc.create_element("p");
        doc.append_child(body, a).unwrap();
        doc.append_child(body, b).unwrap();
        doc.append_child(a, child).unwrap();

        doc.append_child(b, child).unwrap();
        assert!(doc.children(a).is_empty());
        assert_eq!(doc.children(b), &[child]);
        assert_eq!(doc.parent(child), Some(b));
    }

    #[test]
    fn text_cannot_hold_children() {
        let (mut doc, body) = doc_with_body();
        let text = doc.create_text("x");
        let child = doc.create_element("p");
        doc.append_child(body, text).unwrap();
        assert!(matches!(
            doc.append_child(text, child),
            Err(DomError::NotAContainer(_))
        ));
    }

    // ============ Detachment ============

    #[test]
    fn detach_keeps_node_in_arena() {
        let (mut doc, body) = doc_with_body();
        let p = doc.create_element("p");
        doc.append_child(body, p).unwrap();
        doc.detach(p).unwrap();

        assert!(doc.children(body).is_empty());
        assert_eq!(doc.parent(p), None);
        assert_eq!(doc.tag_name(p), Some("p"));
        assert!(!doc.is_attached(p));
    }

    #[test]
    fn detach_root_is_rejected() {
        let mut doc = Document::new();
        let root = doc.root();
        assert!(matches!(doc.detach(root), Err(DomError::RootImmovable)));
    }

    #[test]
    fn detach_is_idempotent() {
        let mut doc = Document::new();
        let p = doc.create_element("p");
        doc.detach(p).unwrap();
        doc.detach(p).unwrap();
    }

    #[test]
    fn common_ancestor_of_cousins() {
        let (mut doc, body) = doc_with_body();
        let left = doc.create_element("div");
        let right = doc.create_element("div");
        let a = doc.create_text("a");
        let b = doc.create_text("b");
        doc.append_child(body, left).unwrap();
        doc.append_child(body, right).unwrap();
        doc.append_child(left, a).unwrap();
        doc.append_child(right, b).unwrap();

        assert_eq!(doc.common_ancestor(a, b), Some(body));
        assert_eq!(doc.common_ancestor(a, a), Some(a));
        assert_eq!(doc.common_ancestor(a, left), Some(left));

        let stray = doc.create_text("loose");
        assert_eq!(doc.common_ancestor(a, stray), None);
    }

    // ============ Attributes and the id index ============

    #[test]
    fn set_attr_replaces_value() {
        let (mut doc, body) = doc_with_body();
        doc.set_attr(body, "class", "a").unwrap();
        doc.set_attr(body, "class", "b").unwrap();
        assert_eq!(doc.attr(body, "class"), Some("b"));
    }

    #[test]
    fn id_index_follows_attribute_changes() {
        let (mut doc, body) = doc_with_body();
        doc.set_attr(body, "id", "main").unwrap();
        assert_eq!(doc.by_id("main"), Some(body));
        assert!(doc.id_is_unique("main"));

        doc.set_attr(body, "id", "renamed").unwrap();
        assert_eq!(doc.by_id("main"), None);
        assert_eq!(doc.by_id("renamed"), Some(body));

        doc.remove_attr(body, "id").unwrap();
        assert_eq!(doc.by_id("renamed"), None);
    }

    #[test]
    fn duplicate_ids_are_not_unique() {
        let (mut doc, body) = doc_with_body();
        let a = doc.create_element_with_attrs("div", &[("id", "dup")]);
        let b = doc.create_element_with_attrs("div", &[("id", "dup")]);
        doc.append_child(body, a).unwrap();
        doc.append_child(body, b).unwrap();
        assert!(!doc.id_is_unique("dup"));
        assert_eq!(doc.by_id("dup"), Some(a));
    }

    #[test]
    fn detached_elements_do_not_satisfy_id_lookup() {
        let (mut doc, body) = doc_with_body();
        let el = doc.create_element_with_attrs("div", &[("id", "x")]);
        doc.append_child(body, el).unwrap();
        doc.detach(el).unwrap();
        assert_eq!(doc.by_id("x"), None);
        assert!(!doc.id_is_unique("x"));
    }

    // ============ Text runs ============

    #[test]
    fn split_text_divides_run() {
        let (mut doc, body) = doc_with_body();
        let run = doc.create_text("Hello world");
        doc.append_child(body, run).unwrap();

        let right = doc.split_text(run, 6).unwrap();
        assert_eq!(doc.text(run), Some("Hello "));
        assert_eq!(doc.text(right), Some("world"));
        assert_eq!(doc.children(body), &[run, right]);
    }

    #[test]
    fn split_text_counts_characters_not_bytes() {
        let (mut doc, body) = doc_with_body();
        let run = doc.create_text("héllo");
        doc.append_child(body, run).unwrap();
        let right = doc.split_text(run, 2).unwrap();
        assert_eq!(doc.text(run), Some("hé"));
        assert_eq!(doc.text(right), Some("llo"));
    }

    #[test]
    fn split_past_end_fails() {
        let mut doc = Document::new();
        let run = doc.create_text("ab");
        assert!(matches!(
            doc.split_text(run, 3),
            Err(DomError::OffsetOutOfRange { .. })
        ));
    }

    #[test]
    fn normalize_merges_adjacent_runs() {
        let (mut doc, body) = doc_with_body();
        let run = doc.create_text("Hello world");
        doc.append_child(body, run).unwrap();
        doc.split_text(run, 6).unwrap();

        doc.normalize(body);
        assert_eq!(doc.children(body).len(), 1);
        assert_eq!(doc.text(doc.children(body)[0]), Some("Hello world"));
    }

    #[test]
    fn normalize_drops_empty_runs() {
        let (mut doc, body) = doc_with_body();
        let empty = doc.create_text("");
        let full = doc.create_text("x");
        doc.append_child(body, empty).unwrap();
        doc.append_child(body, full).unwrap();
        doc.normalize(body);
        assert_eq!(doc.children(body), &[full]);
    }

    #[test]
    fn text_content_concatenates_descendants() {
        let (mut doc, body) = doc_with_body();
        let p = doc.create_element("p");
        let a = doc.create_text("Hello ");
        let em = doc.create_element("em");
        let b = doc.create_text("world");
        doc.append_child(body, p).unwrap();
        doc.append_child(p, a).unwrap();
        doc.append_child(p, em).unwrap();
        doc.append_child(em, b).unwrap();
        assert_eq!(doc.text_content(p), "Hello world");
    }

    // ============ Shadow roots ============

    #[test]
    fn shadow_root_attaches_once() {
        let (mut doc, body) = doc_with_body();
        let host = doc.create_element("div");
        doc.append_child(body, host).unwrap();

        let shadow = doc.attach_shadow_root(host).unwrap();
        assert_eq!(doc.shadow_root(host), Some(shadow));
        assert!(doc.is_attached(shadow));
        assert!(matches!(
            doc.attach_shadow_root(host),
            Err(DomError::ShadowRootExists(_))
        ));
    }

    #[test]
    fn shadow_content_is_not_in_host_text() {
        let (mut doc, body) = doc_with_body();
        let host = doc.create_element("div");
        let light = doc.create_text("light");
        doc.append_child(body, host).unwrap();
        doc.append_child(host, light).unwrap();

        let shadow = doc.attach_shadow_root(host).unwrap();
        let hidden = doc.create_text("shadow");
        doc.append_child(shadow, hidden).unwrap();

        assert_eq!(doc.text_content(host), "light");
        assert_eq!(doc.text_content(shadow), "shadow");
    }

    #[test]
    fn detaching_host_detaches_shadow_content() {
        let (mut doc, body) = doc_with_body();
        let host = doc.create_element("div");
        doc.append_child(body, host).unwrap();
        let shadow = doc.attach_shadow_root(host).unwrap();
        let text = doc.create_text("inside");
        doc.append_child(shadow, text).unwrap();

        doc.detach(host).unwrap();
        assert!(!doc.is_attached(text));
    }
}
