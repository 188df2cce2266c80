//! Shared document handle, lookup entry points and event dispatch.

use crate::event::Event;
use crate::resolve::resolve;
use crate::segment::parse;
use crate::selection::Selection;
use core::cell::RefCell;
use core::fmt;
use sprig_core::Error;
use sprig_core::ErrorKind;
use sprig_core::SprigResult;
use sprig_css::query_selector_all;
use sprig_dom::Document;
use sprig_dom::NodeId;
use sprig_html::HtmlParser;
use std::collections::HashMap;
use std::rc::Rc;

/// Event callback. The first argument wraps the element the listener was
/// registered on.
pub type Listener = Rc<dyn Fn(&Selection, &mut Event)>;

/// What to select: the document sentinel, a known node or a selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query<'a> {
    /// Selects the document element (`<html>`).
    Document,
    Node(NodeId),
    Selector(&'a str),
}

impl From<NodeId> for Query<'_> {
    fn from(node: NodeId) -> Self {
        Self::Node(node)
    }
}

impl<'a> From<&'a str> for Query<'a> {
    fn from(selector: &'a str) -> Self {
        Self::Selector(selector)
    }
}

impl<'a> From<&'a String> for Query<'a> {
    fn from(selector: &'a String) -> Self {
        Self::Selector(selector)
    }
}

#[derive(Default)]
struct Shared {
    document: RefCell<Document>,
    listeners: RefCell<HashMap<(NodeId, String), Vec<Listener>>>,
}

/// Cheaply clonable handle to one document and its event listeners.
///
/// Borrows of the document never outlive a single call, so listeners and
/// `each` callbacks may freely use the handle again.
#[derive(Clone)]
pub struct Dom {
    shared: Rc<Shared>,
}

impl Dom {
    /// A handle over an empty `html > (head, body)` skeleton.
    pub fn new() -> Self {
        Self::from_document(Document::new())
    }

    pub fn from_document(document: Document) -> Self {
        Self {
            shared: Rc::new(Shared {
                document: RefCell::new(document),
                listeners: RefCell::default(),
            }),
        }
    }

    pub fn parse_html(markup: &str) -> Self {
        Self::from_document(HtmlParser.parse(markup))
    }

    pub fn read<R>(&self, f: impl FnOnce(&Document) -> R) -> R {
        f(&*self.shared.document.borrow())
    }

    pub fn write<R>(&self, f: impl FnOnce(&mut Document) -> R) -> R {
        f(&mut *self.shared.document.borrow_mut())
    }

    /// Lookup-only selection. A selector that matches nothing is
    /// [`ErrorKind::NoMatchFound`]; nothing is ever created here.
    pub fn select<'a>(&self, query: impl Into<Query<'a>>) -> SprigResult<Selection> {
        match query.into() {
            Query::Document => {
                let root = self
                    .read(Document::document_element)
                    .ok_or_else(|| Error::no_match(":root"))?;
                Ok(Selection::single(self.clone(), root))
            }
            Query::Node(node) => {
                if !self.read(|document| document.is_element(node)) {
                    return Err(Error::new(
                        ErrorKind::Hierarchy,
                        "query.select.not_element",
                        format!("node {} is not an element", node.index()),
                    ));
                }
                Ok(Selection::single(self.clone(), node))
            }
            Query::Selector(selector) => {
                let nodes =
                    self.read(|document| query_selector_all(document, document.root(), selector))?;
                Selection::from_nodes(self.clone(), nodes).ok_or_else(|| Error::no_match(selector))
            }
        }
    }

    /// Find-or-create `selector` starting from the document. Elements
    /// created at the top level are appended to `<body>`.
    pub fn build(&self, selector: &str) -> SprigResult<Selection> {
        let segments = parse(selector)?;
        let resolution = self.write(|document| {
            let root = document.root();
            resolve(document, &segments, root)
        })?;
        Ok(Selection::single(self.clone(), resolution.node))
    }

    /// Appends `listener` to the listeners of `event_type` on `node`.
    pub fn add_listener(&self, node: NodeId, event_type: &str, listener: Listener) {
        self.shared
            .listeners
            .borrow_mut()
            .entry((node, event_type.to_owned()))
            .or_default()
            .push(listener);
    }

    pub fn listener_count(&self, node: NodeId, event_type: &str) -> usize {
        self.shared
            .listeners
            .borrow()
            .get(&(node, event_type.to_owned()))
            .map_or(0, Vec::len)
    }

    /// Runs listeners on `target`, then on each ancestor, until one stops
    /// propagation. Returns `false` when a listener prevented the default.
    pub fn dispatch(&self, target: NodeId, event: &mut Event) -> bool {
        event.target = Some(target);

        let mut path = vec![target];
        path.extend(self.read(|document| document.ancestors(target)));

        for node in path {
            // Cloned out so listeners can register more listeners.
            let listeners: Vec<Listener> = self
                .shared
                .listeners
                .borrow()
                .get(&(node, event.kind().to_owned()))
                .cloned()
                .unwrap_or_default();

            if listeners.is_empty() {
                continue;
            }

            event.current_target = Some(node);
            let receiver = Selection::single(self.clone(), node);
            for listener in listeners {
                log::trace!("dispatching `{}` on node {}", event.kind(), node.index());
                listener(&receiver, event);
            }

            if event.propagation_stopped() {
                break;
            }
        }

        event.current_target = None;
        !event.default_prevented()
    }

    /// Whether both handles point at the same document.
    pub fn same_document(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.shared, &other.shared)
    }
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Dom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dom")
            .field("nodes", &self.read(Document::node_count))
            .field("listeners", &self.shared.listeners.borrow().len())
            .finish()
    }
}
