use crate::dom::tree::{Document, NodeId, NodeKind};

/// Serializes `node` and its sub-tree to HTML.
///
/// Output is deterministic for a given tree: attributes keep their stored
/// order, text and attribute values are escaped, raw-text elements are
/// emitted verbatim, and an attached shadow root is written back in its
/// declarative `<template shadowrootmode="open">` form. Parsing the output
/// reproduces the tree, which is what the highlight restoration checks
/// lean on.
#[must_use]
pub fn to_html(doc: &Document, node: NodeId) -> String {
    let mut out = String::new();
    write_node(doc, node, &mut out);
    out
}

/// Serialized HTML of `node`'s children only.
#[must_use]
pub fn inner_html(doc: &Document, node: NodeId) -> String {
    let mut out = String::new();
    write_children(doc, node, &mut out);
    out
}

fn write_children(doc: &Document, node: NodeId, out: &mut String) {
    for &child in doc.children(node) {
        write_node(doc, child, out);
    }
}

fn write_node(doc: &Document, node: NodeId, out: &mut String) {
    match doc.kind(node) {
        NodeKind::Document | NodeKind::ShadowRoot => write_children(doc, node, out),
        NodeKind::Text(text) => {
            if is_raw_text_parent(doc, node) {
                out.push_str(text);
            } else {
                out.push_str(&html_escape::encode_text(text));
            }
        }
        NodeKind::Comment(body) => {
            out.push_str("<!--");
            out.push_str(body);
            out.push_str("-->");
        }
        NodeKind::Element(data) => {
            out.push('<');
            out.push_str(&data.tag_name);
            for (name, value) in &data.attrs {
                out.push(' ');
                out.push_str(name);
                if !value.is_empty() {
                    out.push_str("=\"");
                    out.push_str(&html_escape::encode_double_quoted_attribute(value));
                    out.push('"');
                }
            }
            out.push('>');
            if is_void(&data.tag_name) {
                return;
            }
            if let Some(shadow) = doc.shadow_root(node) {
                out.push_str("<template shadowrootmode=\"open\">");
                write_children(doc, shadow, out);
                out.push_str("</template>");
            }
            write_children(doc, node, out);
            out.push_str("</");
            out.push_str(&data.tag_name);
            out.push('>');
        }
    }
}

fn is_void(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "source"
            | "track"
            | "wbr"
    )
}

fn is_raw_text_parent(doc: &Document, text: NodeId) -> bool {
    doc.parent(text)
        .and_then(|p| doc.tag_name(p))
        .is_some_and(|tag| matches!(tag, "script" | "style"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn round_trips_simple_markup() {
        let source = r#"<div id="main" class="note"><p>Hello <em>world</em></p></div>"#;
        let doc = Document::parse_html(source);
        assert_eq!(to_html(&doc, doc.root()), source);
    }

    #[test]
    fn round_trips_whitespace_exactly() {
        let source = "<ul>\n  <li>one</li>\n  <li>two</li>\n</ul>";
        let doc = Document::parse_html(source);
        assert_eq!(to_html(&doc, doc.root()), source);
    }

    #[test]
    fn escapes_text_and_attributes() {
        let mut doc = Document::new();
        let p = doc.create_element_with_attrs("p", &[("title", "a \"b\" & c")]);
        let text = doc.create_text("1 < 2 & 3");
        doc.append_child(doc.root(), p).unwrap();
        doc.append_child(p, text).unwrap();

        insta::assert_snapshot!(
            to_html(&doc, doc.root()),
            @r#"<p title="a &quot;b&quot; &amp; c">1 &lt; 2 &amp; 3</p>"#
        );
    }

    #[test]
    fn void_elements_have_no_close_tag() {
        let doc = Document::parse_html("<p>a<br>b</p>");
        insta::assert_snapshot!(to_html(&doc, doc.root()), @"<p>a<br>b</p>");
    }

    #[test]
    fn valueless_attributes_stay_valueless() {
        let doc = Document::parse_html("<input checked>");
        insta::assert_snapshot!(to_html(&doc, doc.root()), @"<input checked>");
    }

    #[test]
    fn script_bodies_are_not_escaped() {
        let source = "<script>if (a < b) { go(); }</script>";
        let doc = Document::parse_html(source);
        assert_eq!(to_html(&doc, doc.root()), source);
    }

    #[test]
    fn shadow_roots_serialize_declaratively() {
        let source = r#"<div><template shadowrootmode="open"><p>in</p></template>out</div>"#;
        let doc = Document::parse_html(source);
        assert_eq!(to_html(&doc, doc.root()), source);
    }

    #[test]
    fn comments_round_trip() {
        let source = "<div><!-- keep me -->x</div>";
        let doc = Document::parse_html(source);
        assert_eq!(to_html(&doc, doc.root()), source);
    }

    #[test]
    fn inner_html_omits_the_node_itself() {
        let doc = Document::parse_html("<div><p>x</p></div>");
        let div = doc.children(doc.root())[0];
        assert_eq!(inner_html(&doc, div), "<p>x</p>");
    }
}
