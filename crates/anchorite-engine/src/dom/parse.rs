use crate::dom::tree::{Document, NodeId};

/// Elements that never take a closing tag.
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose content is raw text up to the matching close tag.
const RAW_TEXT_TAGS: &[&str] = &["script", "style"];

impl Document {
    /// Parses a full HTML document.
    ///
    /// The parser is recovering rather than validating: unknown constructs
    /// are skipped, a mismatched close tag pops to the nearest open tag of
    /// that name (or is dropped when none is open), and whitespace text is
    /// kept verbatim. `<template shadowrootmode=…>` attaches a declarative
    /// shadow root to the enclosing element.
    #[must_use]
    pub fn parse_html(html: &str) -> Self {
        let mut doc = Document::new();
        let root = doc.root();
        parse_fragment(&mut doc, root, html);
        doc
    }
}

/// Parses `html` and appends the resulting nodes under `parent`.
pub(crate) fn parse_fragment(doc: &mut Document, parent: NodeId, html: &str) {
    Parser {
        doc,
        scanner: Scanner::new(html),
        context: parent,
        open: Vec::new(),
    }
    .run();
}

/// Byte scanner over the source. Text is decoded on extraction, so indices
/// here are byte positions into the raw input.
struct Scanner<'a> {
    s: &'a str,
    i: usize,
}

impl<'a> Scanner<'a> {
    fn new(s: &'a str) -> Self {
        Self { s, i: 0 }
    }

    fn eof(&self) -> bool {
        self.i >= self.s.len()
    }

    fn peek(&self) -> Option<u8> {
        self.s.as_bytes().get(self.i).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.s.as_bytes().get(self.i + ahead).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.i += 1;
        Some(b)
    }

    fn bump_n(&mut self, n: usize) {
        self.i = (self.i + n).min(self.s.len());
    }

    fn starts_with(&self, pat: &[u8]) -> bool {
        self.s.as_bytes()[self.i..].starts_with(pat)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b) if b.is_ascii_whitespace()) {
            self.i += 1;
        }
    }

    /// Consumes up to (not including) the first occurrence of `pat`, or the
    /// rest of the input when `pat` never occurs. Returns the consumed text.
    fn take_until(&mut self, pat: &[u8]) -> &'a str {
        let rest = &self.s[self.i..];
        let end = find_bytes(rest.as_bytes(), pat).unwrap_or(rest.len());
        self.i += end;
        &rest[..end]
    }

    /// Like `take_until`, but matches `pat` case-insensitively.
    fn take_until_ignore_case(&mut self, pat: &[u8]) -> &'a str {
        let rest = &self.s[self.i..];
        let end = find_bytes_ignore_case(rest.as_bytes(), pat).unwrap_or(rest.len());
        self.i += end;
        &rest[..end]
    }

    fn take_name(&mut self) -> &'a str {
        let start = self.i;
        while matches!(self.peek(), Some(b) if b.is_ascii_alphanumeric() || b == b'-' || b == b':')
        {
            self.i += 1;
        }
        &self.s[start..self.i]
    }
}

fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    (0..=haystack.len() - needle.len()).find(|&i| &haystack[i..i + needle.len()] == needle)
}

fn find_bytes_ignore_case(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    (0..=haystack.len() - needle.len())
        .find(|&i| haystack[i..i + needle.len()].eq_ignore_ascii_case(needle))
}

struct Parser<'a, 'd> {
    doc: &'d mut Document,
    scanner: Scanner<'a>,
    /// Insertion point when the open stack is empty.
    context: NodeId,
    /// Open elements (or declarative shadow roots) with their tag names.
    open: Vec<(NodeId, String)>,
}

impl Parser<'_, '_> {
    fn insertion_parent(&self) -> NodeId {
        self.open.last().map_or(self.context, |(id, _)| *id)
    }

    fn run(&mut self) {
        while !self.scanner.eof() {
            if self.scanner.starts_with(b"<!--") {
                self.comment();
            } else if self.scanner.starts_with(b"<!") {
                // Doctype or other markup declaration, skipped entirely.
                self.scanner.take_until(b">");
                self.scanner.bump();
            } else if self.scanner.starts_with(b"</") {
                self.close_tag();
            } else if self.scanner.peek() == Some(b'<')
                && matches!(self.scanner.peek_at(1), Some(b) if b.is_ascii_alphabetic())
            {
                self.open_tag();
            } else {
                // Anything else, including a lone '<', is literal text.
                self.text_until_next_tag();
            }
        }
        // Unclosed elements at EOF: capture any pending title.
        while let Some((id, tag)) = self.open.pop() {
            self.finish_element(id, &tag);
        }
    }

    fn comment(&mut self) {
        self.scanner.bump_n(4);
        let body = self.scanner.take_until(b"-->").to_string();
        self.scanner.bump_n(3);
        let parent = self.insertion_parent();
        let comment = self.doc.create_comment(&body);
        let _ = self.doc.append_child(parent, comment);
    }

    fn text_until_next_tag(&mut self) {
        // Consume at least one byte so a leading '<' cannot loop forever.
        let start = self.scanner.i;
        self.scanner.bump();
        loop {
            self.scanner.take_until(b"<");
            if self.scanner.eof()
                || self.scanner.starts_with(b"</")
                || self.scanner.starts_with(b"<!")
                || matches!(self.scanner.peek_at(1), Some(b) if b.is_ascii_alphabetic())
            {
                break;
            }
            self.scanner.bump();
        }
        let raw = &self.scanner.s[start..self.scanner.i];
        if raw.is_empty() {
            return;
        }
        let decoded = html_escape::decode_html_entities(raw).into_owned();
        let parent = self.insertion_parent();
        let text = self.doc.create_text(&decoded);
        let _ = self.doc.append_child(parent, text);
    }

    fn close_tag(&mut self) {
        self.scanner.bump_n(2);
        let name = self.scanner.take_name().to_ascii_lowercase();
        self.scanner.take_until(b">");
        self.scanner.bump();
        if name.is_empty() {
            return;
        }
        // Pop to the nearest open tag of this name; ignore strays.
        let Some(at) = self.open.iter().rposition(|(_, tag)| *tag == name) else {
            return;
        };
        while self.open.len() > at {
            if let Some((id, tag)) = self.open.pop() {
                self.finish_element(id, &tag);
            }
        }
    }

    fn finish_element(&mut self, id: NodeId, tag: &str) {
        if tag == "title" && self.doc.title.is_none() {
            self.doc.title = Some(self.doc.text_content(id));
        }
    }

    fn open_tag(&mut self) {
        self.scanner.bump();
        let name = self.scanner.take_name().to_ascii_lowercase();
        let (attrs, self_closing) = self.attributes();

        // Declarative shadow root: the template's content becomes an
        // isolated sub-tree on the enclosing element. When attachment is
        // impossible (no element host, or a second template) the tag falls
        // through to a regular element.
        if name == "template" && attrs.iter().any(|(n, _)| n == "shadowrootmode") {
            let host = self.insertion_parent();
            if let Ok(shadow) = self.doc.attach_shadow_root(host) {
                if !self_closing {
                    self.open.push((shadow, name));
                }
                return;
            }
        }

        let parent = self.insertion_parent();
        let attr_refs: Vec<(&str, &str)> = attrs
            .iter()
            .map(|(n, v)| (n.as_str(), v.as_str()))
            .collect();
        let element = self.doc.create_element_with_attrs(&name, &attr_refs);
        let _ = self.doc.append_child(parent, element);

        if self_closing || VOID_TAGS.contains(&name.as_str()) {
            return;
        }
        if RAW_TEXT_TAGS.contains(&name.as_str()) {
            self.raw_text(element, &name);
            return;
        }
        self.open.push((element, name));
    }

    /// Consumes everything up to the matching close tag as a single
    /// undecoded text run.
    fn raw_text(&mut self, element: NodeId, tag: &str) {
        let close = format!("</{tag}");
        let body = self
            .scanner
            .take_until_ignore_case(close.as_bytes())
            .to_string();
        if !self.scanner.eof() {
            self.scanner.bump_n(close.len());
            self.scanner.take_until(b">");
            self.scanner.bump();
        }
        if !body.is_empty() {
            let text = self.doc.create_text(&body);
            let _ = self.doc.append_child(element, text);
        }
    }

    fn attributes(&mut self) -> (Vec<(String, String)>, bool) {
        let mut attrs = Vec::new();
        let mut self_closing = false;
        loop {
            self.scanner.skip_whitespace();
            match self.scanner.peek() {
                None | Some(b'>') => {
                    self.scanner.bump();
                    break;
                }
                Some(b'/') => {
                    self.scanner.bump();
                    if self.scanner.peek() == Some(b'>') {
                        self.scanner.bump();
                        self_closing = true;
                        break;
                    }
                }
                Some(_) => {
                    let name = self.attr_name();
                    if name.is_empty() {
                        self.scanner.bump();
                        continue;
                    }
                    let value = self.attr_value();
                    attrs.push((name, value));
                }
            }
        }
        (attrs, self_closing)
    }

    fn attr_name(&mut self) -> String {
        let start = self.scanner.i;
        while matches!(
            self.scanner.peek(),
            Some(b) if !b.is_ascii_whitespace() && b != b'=' && b != b'>' && b != b'/'
        ) {
            self.scanner.i += 1;
        }
        self.scanner.s[start..self.scanner.i].to_ascii_lowercase()
    }

    fn attr_value(&mut self) -> String {
        self.scanner.skip_whitespace();
        if self.scanner.peek() != Some(b'=') {
            return String::new();
        }
        self.scanner.bump();
        self.scanner.skip_whitespace();
        let raw = match self.scanner.peek() {
            Some(quote @ (b'"' | b'\'')) => {
                self.scanner.bump();
                let value = self.scanner.take_until(&[quote]);
                self.scanner.bump();
                value
            }
            _ => {
                let start = self.scanner.i;
                while matches!(
                    self.scanner.peek(),
                    Some(b) if !b.is_ascii_whitespace() && b != b'>'
                ) {
                    self.scanner.i += 1;
                }
                &self.scanner.s[start..self.scanner.i]
            }
        };
        html_escape::decode_html_entities(raw).into_owned()
    }
}
