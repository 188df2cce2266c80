//! DOM tree data structures.
//!
//! Nodes live in an arena owned by [`Document`] and are addressed by
//! [`NodeId`]. Detached nodes stay in the arena so ids never dangle.

use sprig_core::Error;
use sprig_core::ErrorKind;
use sprig_core::SprigResult;

pub const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";
pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// ID used to address nodes in the DOM arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Element namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Html,
    Svg,
}

impl Namespace {
    pub fn uri(self) -> &'static str {
        match self {
            Self::Html => HTML_NAMESPACE,
            Self::Svg => SVG_NAMESPACE,
        }
    }
}

/// Single attribute, kept in insertion order on its element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// Element payload of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag_name: String,
    namespace: Namespace,
    attributes: Vec<Attribute>,
}

impl Element {
    /// HTML tag names are lowercased; SVG names keep their case.
    pub fn new(namespace: Namespace, tag_name: &str) -> Self {
        let tag_name = match namespace {
            Namespace::Html => tag_name.to_ascii_lowercase(),
            Namespace::Svg => tag_name.to_owned(),
        };

        Self {
            tag_name,
            namespace,
            attributes: Vec::new(),
        }
    }

    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }

    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    pub fn is_tag(&self, tag: &str) -> bool {
        self.tag_name.eq_ignore_ascii_case(tag)
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        let name = self.normalize_attribute_name(name);
        self.attributes
            .iter()
            .find(|attribute| attribute.name == name)
            .map(|attribute| attribute.value.as_str())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    pub fn set_attribute(&mut self, name: &str, value: &str) {
        let name = self.normalize_attribute_name(name);
        match self
            .attributes
            .iter_mut()
            .find(|attribute| attribute.name == name)
        {
            Some(existing) => existing.value = value.to_owned(),
            None => self.attributes.push(Attribute {
                name,
                value: value.to_owned(),
            }),
        }
    }

    pub fn remove_attribute(&mut self, name: &str) -> bool {
        let name = self.normalize_attribute_name(name);
        let before = self.attributes.len();
        self.attributes.retain(|attribute| attribute.name != name);
        self.attributes.len() != before
    }

    pub fn id(&self) -> Option<&str> {
        self.attribute("id")
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attribute("class")
            .unwrap_or_default()
            .split_ascii_whitespace()
    }

    pub fn has_class(&self, name: &str) -> bool {
        self.classes().any(|class| class == name)
    }

    /// Returns `true` when the class list changed. Blank names are ignored.
    pub fn add_class(&mut self, name: &str) -> bool {
        if !is_class_token(name) || self.has_class(name) {
            return false;
        }

        let mut classes: Vec<&str> = self.classes().collect();
        classes.push(name);
        let joined = classes.join(" ");
        self.set_attribute("class", &joined);
        true
    }

    /// Returns `true` when the class list changed. Blank names are ignored.
    pub fn remove_class(&mut self, name: &str) -> bool {
        if !is_class_token(name) || !self.has_class(name) {
            return false;
        }

        let joined = self
            .classes()
            .filter(|class| *class != name)
            .collect::<Vec<_>>()
            .join(" ");
        self.set_attribute("class", &joined);
        true
    }

    /// Returns whether the class is present afterwards.
    pub fn toggle_class(&mut self, name: &str) -> bool {
        if !is_class_token(name) {
            return self.has_class(name);
        }

        if self.has_class(name) {
            self.remove_class(name);
            false
        } else {
            self.add_class(name);
            true
        }
    }

    fn normalize_attribute_name(&self, name: &str) -> String {
        match self.namespace {
            Namespace::Html => name.to_ascii_lowercase(),
            Namespace::Svg => name.to_owned(),
        }
    }
}

fn is_class_token(name: &str) -> bool {
    !name.is_empty() && !name.chars().any(char::is_whitespace)
}

/// Node payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element(Element),
    Text(String),
    Comment(String),
}

/// Arena entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

impl Node {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn as_element(&self) -> Option<&Element> {
        match &self.kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self.kind, NodeKind::Element(_))
    }
}

/// In-memory document: the arena plus its root node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Document with the `html > (head, body)` skeleton.
    pub fn new() -> Self {
        let mut document = Self::empty();
        document.ensure_body();
        document
    }

    /// Document containing only the document node.
    pub fn empty() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                kind: NodeKind::Document,
            }],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        self.node(id).and_then(Node::as_element)
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match self.nodes.get_mut(id.0).map(|node| &mut node.kind) {
            Some(NodeKind::Element(element)) => Some(element),
            _ => None,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(Node::parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(Node::children).unwrap_or_default()
    }

    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|child| self.is_element(*child))
            .collect()
    }

    /// Element siblings before `id`, nearest first.
    pub fn preceding_element_siblings(&self, id: NodeId) -> Vec<NodeId> {
        let Some(parent) = self.parent(id) else {
            return Vec::new();
        };

        let siblings = self.children(parent);
        let Some(position) = siblings.iter().position(|sibling| *sibling == id) else {
            return Vec::new();
        };

        siblings[..position]
            .iter()
            .rev()
            .copied()
            .filter(|sibling| self.is_element(*sibling))
            .collect()
    }

    pub fn document_element(&self) -> Option<NodeId> {
        self.children(self.root)
            .iter()
            .copied()
            .find(|child| self.is_element(*child))
    }

    pub fn head(&self) -> Option<NodeId> {
        self.child_of_document_element("head")
    }

    pub fn body(&self) -> Option<NodeId> {
        self.child_of_document_element("body")
    }

    /// Returns `<body>`, creating `<html>` and `<body>` first when missing.
    pub fn ensure_body(&mut self) -> NodeId {
        if let Some(body) = self.body() {
            return body;
        }

        let html = match self.document_element() {
            Some(html) => html,
            None => {
                let html = self.create_element("html");
                self.attach(self.root, html);
                html
            }
        };

        if self.head().is_none() {
            let head = self.create_element("head");
            self.attach(html, head);
        }

        let body = self.create_element("body");
        self.attach(html, body);
        body
    }

    pub fn create_element(&mut self, tag_name: &str) -> NodeId {
        self.create_element_ns(Namespace::Html, tag_name)
    }

    pub fn create_element_ns(&mut self, namespace: Namespace, tag_name: &str) -> NodeId {
        self.push_node(NodeKind::Element(Element::new(namespace, tag_name)))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push_node(NodeKind::Text(text.to_owned()))
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.push_node(NodeKind::Comment(text.to_owned()))
    }

    /// Moves `child` (detaching it from any previous parent) to the end of
    /// `parent`'s children.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> SprigResult<()> {
        self.ensure_known(parent)?;
        self.ensure_known(child)?;

        if matches!(self.nodes[child.0].kind, NodeKind::Document) {
            return Err(hierarchy_error(
                "dom.append.document_child",
                "the document node cannot be appended",
            ));
        }

        if !matches!(
            self.nodes[parent.0].kind,
            NodeKind::Document | NodeKind::Element(_)
        ) {
            return Err(hierarchy_error(
                "dom.append.leaf_parent",
                format!("node {} cannot have children", parent.0),
            ));
        }

        if child == parent || self.is_ancestor(child, parent) {
            return Err(hierarchy_error(
                "dom.append.cycle",
                format!("node {} is an ancestor of node {}", child.0, parent.0),
            ));
        }

        self.detach(child);
        self.attach(parent, child);
        Ok(())
    }

    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> SprigResult<()> {
        self.ensure_known(parent)?;
        self.ensure_known(child)?;

        if self.nodes[child.0].parent != Some(parent) {
            return Err(hierarchy_error(
                "dom.remove.not_a_child",
                format!("node {} is not a child of node {}", child.0, parent.0),
            ));
        }

        self.detach(child);
        Ok(())
    }

    /// Detaches every child of `parent` and returns them in order.
    pub fn remove_children(&mut self, parent: NodeId) -> Vec<NodeId> {
        let Some(node) = self.nodes.get_mut(parent.0) else {
            return Vec::new();
        };

        let children = std::mem::take(&mut node.children);
        for child in &children {
            self.nodes[child.0].parent = None;
        }
        children
    }

    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = self.parent(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// Ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cursor = self.parent(id);
        while let Some(current) = cursor {
            out.push(current);
            cursor = self.parent(current);
        }
        out
    }

    /// Pre-order descendants of `id`, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();

        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }

        out
    }

    pub fn descendant_elements(&self, id: NodeId) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|node| self.is_element(*node))
            .collect()
    }

    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(NodeKind::Text(text)) = self.node(id).map(Node::kind) {
            return text.clone();
        }

        let mut out = String::new();
        for node in self.descendants(id) {
            if let Some(NodeKind::Text(text)) = self.node(node).map(Node::kind) {
                out.push_str(text);
            }
        }
        out
    }

    fn child_of_document_element(&self, tag: &str) -> Option<NodeId> {
        let html = self.document_element()?;
        self.children(html)
            .iter()
            .copied()
            .find(|child| self.element(*child).is_some_and(|element| element.is_tag(tag)))
    }

    fn push_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            kind,
        });
        id
    }

    fn attach(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    fn detach(&mut self, child: NodeId) {
        if let Some(old_parent) = self.nodes[child.0].parent.take() {
            self.nodes[old_parent.0]
                .children
                .retain(|sibling| *sibling != child);
        }
    }

    fn ensure_known(&self, id: NodeId) -> SprigResult<()> {
        if self.contains(id) {
            return Ok(());
        }

        Err(hierarchy_error(
            "dom.node.unknown",
            format!("node {} does not belong to this document", id.0),
        ))
    }
}

fn hierarchy_error(code: &'static str, message: impl Into<String>) -> Error {
    Error::new(ErrorKind::Hierarchy, code, message)
}

#[cfg(test)]
mod tests {
    use super::Document;
    use super::Namespace;
    use sprig_core::ErrorKind;

    #[test]
    fn new_document_has_html_head_and_body() {
        let doc = Document::new();
        let html = doc.document_element();
        assert!(html.is_some());
        assert!(doc.head().is_some());
        assert!(doc.body().is_some());
        assert_eq!(doc.node_count(), 4);
    }

    #[test]
    fn ensure_body_repairs_empty_document() {
        let mut doc = Document::empty();
        assert!(doc.body().is_none());
        let body = doc.ensure_body();
        assert_eq!(doc.body(), Some(body));
        assert_eq!(doc.ensure_body(), body);
    }

    #[test]
    fn append_child_moves_nodes_between_parents() {
        let mut doc = Document::new();
        let body = doc.ensure_body();
        let first = doc.create_element("div");
        let second = doc.create_element("section");
        let leaf = doc.create_element("span");

        assert!(doc.append_child(body, first).is_ok());
        assert!(doc.append_child(body, second).is_ok());
        assert!(doc.append_child(first, leaf).is_ok());
        assert!(doc.append_child(second, leaf).is_ok());

        assert!(doc.children(first).is_empty());
        assert_eq!(doc.children(second), &[leaf]);
        assert_eq!(doc.parent(leaf), Some(second));
    }

    #[test]
    fn append_child_rejects_cycles_and_text_parents() {
        let mut doc = Document::new();
        let body = doc.ensure_body();
        let outer = doc.create_element("div");
        let inner = doc.create_element("div");
        let text = doc.create_text("hi");
        assert!(doc.append_child(body, outer).is_ok());
        assert!(doc.append_child(outer, inner).is_ok());

        let cycle = doc.append_child(inner, outer);
        assert!(cycle.is_err_and(|error| error.kind == ErrorKind::Hierarchy));

        let leaf = doc.append_child(text, inner);
        assert!(leaf.is_err_and(|error| error.code == "dom.append.leaf_parent"));
    }

    #[test]
    fn class_list_mutations_report_changes() {
        let mut doc = Document::new();
        let id = doc.create_element("div");
        let Some(element) = doc.element_mut(id) else {
            panic!("element missing");
        };

        assert!(element.add_class("card"));
        assert!(!element.add_class("card"));
        assert!(element.add_class("wide"));
        assert_eq!(element.attribute("class"), Some("card wide"));
        assert!(!element.toggle_class("card"));
        assert!(element.toggle_class("card"));
        assert!(!element.remove_class("missing"));
        assert!(!element.add_class(""));
        assert_eq!(element.classes().collect::<Vec<_>>(), vec!["wide", "card"]);
    }

    #[test]
    fn svg_elements_keep_tag_case_and_namespace() {
        let mut doc = Document::new();
        let id = doc.create_element_ns(Namespace::Svg, "linearGradient");
        let Some(element) = doc.element(id) else {
            panic!("element missing");
        };
        assert_eq!(element.tag_name(), "linearGradient");
        assert_eq!(element.namespace().uri(), "http://www.w3.org/2000/svg");

        let html = doc.create_element("DIV");
        assert_eq!(doc.element(html).map(|element| element.tag_name()), Some("div"));
    }

    #[test]
    fn descendants_are_pre_order() {
        let mut doc = Document::empty();
        let root = doc.root();
        let a = doc.create_element("a");
        let b = doc.create_element("b");
        let c = doc.create_element("c");
        let text = doc.create_text("x");
        assert!(doc.append_child(root, a).is_ok());
        assert!(doc.append_child(a, b).is_ok());
        assert!(doc.append_child(b, text).is_ok());
        assert!(doc.append_child(a, c).is_ok());

        assert_eq!(doc.descendants(root), vec![a, b, text, c]);
        assert_eq!(doc.descendant_elements(a), vec![b, c]);
        assert_eq!(doc.text_content(a), "x");
        assert_eq!(doc.preceding_element_siblings(c), vec![b]);
        assert_eq!(doc.ancestors(text), vec![b, a, root]);
    }
}
