//! Find-or-create resolution of parsed segments against a document.

use crate::segment::Segment;
use crate::segment::Token;
use crate::segment::parse;
use sprig_core::Error;
use sprig_core::SprigResult;
use sprig_css::query_selector;
use sprig_dom::Document;
use sprig_dom::Namespace;
use sprig_dom::NodeId;

/// Outcome of one resolution: the final node and every node created on
/// the way, in creation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub node: NodeId,
    pub created: Vec<NodeId>,
}

/// Walks `segments` from `root`. Each segment first looks for a matching
/// descendant of the current parent using its raw text as a selector;
/// otherwise a new element is built from its tokens and appended.
///
/// While the cursor is still the document node, new elements go under
/// `<body>`, which is created when missing.
pub fn resolve(
    document: &mut Document,
    segments: &[Segment],
    root: NodeId,
) -> SprigResult<Resolution> {
    if segments.is_empty() {
        return Err(Error::empty_selector());
    }

    let mut parent = root;
    let mut created = Vec::new();

    for segment in segments {
        if let Some(found) = query_selector(document, parent, &segment.source)? {
            parent = found;
            continue;
        }

        if !document.is_element(parent) {
            parent = document.ensure_body();
        }

        let node = build_element(document, segment);
        document.append_child(parent, node)?;
        log::debug!(
            "created <{}> for segment `{}` under node {}",
            document.element(node).map_or("?", |element| element.tag_name()),
            segment.source,
            parent.index()
        );

        created.push(node);
        parent = node;
    }

    Ok(Resolution {
        node: parent,
        created,
    })
}

/// Parses and resolves `selector` in one step.
pub fn resolve_selector(
    document: &mut Document,
    selector: &str,
    root: NodeId,
) -> SprigResult<Resolution> {
    let segments = parse(selector)?;
    resolve(document, &segments, root)
}

/// Creates a detached element for `segment`: `div` unless a tag token says
/// otherwise, then ids and classes in token order.
pub fn build_element(document: &mut Document, segment: &Segment) -> NodeId {
    let node = match segment.tag() {
        Some(Token::SvgTag(name)) => document.create_element_ns(Namespace::Svg, name),
        Some(Token::Tag(name)) => document.create_element(name),
        _ => document.create_element("div"),
    };

    if let Some(element) = document.element_mut(node) {
        for token in &segment.tokens {
            match token {
                Token::Id(id) => element.set_attribute("id", id),
                Token::Class(class) => {
                    element.add_class(class);
                }
                Token::Tag(_) | Token::SvgTag(_) => {}
            }
        }
    }

    node
}
