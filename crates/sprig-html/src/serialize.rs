//! Markup serialization for `innerHTML` / `outerHTML`.

use crate::RAW_TEXT_ELEMENTS;
use crate::VOID_ELEMENTS;
use sprig_dom::Document;
use sprig_dom::Element;
use sprig_dom::Namespace;
use sprig_dom::NodeId;
use sprig_dom::NodeKind;

pub fn inner_html(document: &Document, node: NodeId) -> String {
    let mut out = String::new();
    let raw = document.element(node).is_some_and(is_raw_text_parent);
    for child in document.children(node) {
        write_node(document, *child, raw, &mut out);
    }
    out
}

pub fn outer_html(document: &Document, node: NodeId) -> String {
    let mut out = String::new();
    write_node(document, node, false, &mut out);
    out
}

fn write_node(document: &Document, node: NodeId, raw_text: bool, out: &mut String) {
    let Some(kind) = document.node(node).map(|node| node.kind()) else {
        return;
    };

    match kind {
        NodeKind::Document => {
            for child in document.children(node) {
                write_node(document, *child, false, out);
            }
        }
        NodeKind::Text(text) if raw_text => out.push_str(text),
        NodeKind::Text(text) => escape_text(text, out),
        NodeKind::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        NodeKind::Element(element) => {
            out.push('<');
            out.push_str(element.tag_name());
            for attribute in element.attributes() {
                out.push(' ');
                out.push_str(&attribute.name);
                out.push_str("=\"");
                escape_attribute(&attribute.value, out);
                out.push('"');
            }
            out.push('>');

            if is_void(element) {
                return;
            }

            let raw = is_raw_text_parent(element);
            for child in document.children(node) {
                write_node(document, *child, raw, out);
            }

            out.push_str("</");
            out.push_str(element.tag_name());
            out.push('>');
        }
    }
}

fn is_void(element: &Element) -> bool {
    element.namespace() == Namespace::Html && VOID_ELEMENTS.contains(&element.tag_name())
}

fn is_raw_text_parent(element: &Element) -> bool {
    element.namespace() == Namespace::Html
        && RAW_TEXT_ELEMENTS[..2].contains(&element.tag_name())
}

fn escape_text(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}

fn escape_attribute(value: &str, out: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}
