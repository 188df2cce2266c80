//! The `Selection` wrapper and its operation set.
//!
//! A selection addresses one or more elements. Every operation walks the
//! addressed nodes through the same path, so a single element and many
//! elements accept exactly the same calls. Mutators return `&Self` for
//! chaining; read accessors look at the first element only.

use crate::dom::Dom;
use crate::dom::Listener;
use crate::event::Event;
use crate::resolve::resolve;
use crate::segment::parse;
use core::fmt;
use sprig_core::SprigResult;
use sprig_css::StyleInput;
use sprig_css::StyleValue;
use sprig_css::computed_style;
use sprig_css::set_inline_property;
use sprig_dom::NodeId;
use sprig_html::inner_html;
use sprig_html::set_inner_html;
use std::collections::HashSet;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassMode {
    Add,
    Remove,
    Toggle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Matched {
    Single(NodeId),
    /// Two or more nodes in discovery order.
    Many(Vec<NodeId>),
}

impl Matched {
    fn as_slice(&self) -> &[NodeId] {
        match self {
            Self::Single(node) => core::slice::from_ref(node),
            Self::Many(nodes) => nodes,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Selection {
    dom: Dom,
    matched: Matched,
}

impl Selection {
    pub(crate) fn single(dom: Dom, node: NodeId) -> Self {
        Self {
            dom,
            matched: Matched::Single(node),
        }
    }

    /// `None` for an empty node list.
    pub(crate) fn from_nodes(dom: Dom, mut nodes: Vec<NodeId>) -> Option<Self> {
        let mut seen = HashSet::new();
        nodes.retain(|node| seen.insert(*node));

        let matched = match nodes.len() {
            0 => return None,
            1 => Matched::Single(nodes[0]),
            _ => Matched::Many(nodes),
        };
        Some(Self { dom, matched })
    }

    pub fn dom(&self) -> &Dom {
        &self.dom
    }

    pub fn len(&self) -> usize {
        self.matched.as_slice().len()
    }

    /// Always `false`: an empty lookup is an error, not a selection.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn is_single(&self) -> bool {
        matches!(self.matched, Matched::Single(_))
    }

    pub fn nodes(&self) -> &[NodeId] {
        self.matched.as_slice()
    }

    pub fn node(&self, index: usize) -> Option<NodeId> {
        self.nodes().get(index).copied()
    }

    pub fn first_node(&self) -> NodeId {
        match &self.matched {
            Matched::Single(node) => *node,
            Matched::Many(nodes) => nodes[0],
        }
    }

    /// Length-1 selection over the node at `index`.
    pub fn get(&self, index: usize) -> Option<Self> {
        self.node(index)
            .map(|node| Self::single(self.dom.clone(), node))
    }

    pub fn first(&self) -> Self {
        Self::single(self.dom.clone(), self.first_node())
    }

    pub fn class(&self, mode: ClassMode, name: &str) -> &Self {
        self.dom.write(|document| {
            for node in self.nodes() {
                let Some(element) = document.element_mut(*node) else {
                    continue;
                };
                match mode {
                    ClassMode::Add => {
                        element.add_class(name);
                    }
                    ClassMode::Remove => {
                        element.remove_class(name);
                    }
                    ClassMode::Toggle => {
                        element.toggle_class(name);
                    }
                }
            }
        });
        self
    }

    pub fn add_class(&self, name: &str) -> &Self {
        self.class(ClassMode::Add, name)
    }

    pub fn remove_class(&self, name: &str) -> &Self {
        self.class(ClassMode::Remove, name)
    }

    pub fn toggle_class(&self, name: &str) -> &Self {
        self.class(ClassMode::Toggle, name)
    }

    pub fn has_class(&self, name: &str) -> bool {
        let first = self.first_node();
        self.dom.read(|document| {
            document
                .element(first)
                .is_some_and(|element| element.has_class(name))
        })
    }

    /// Computed value of `property` on the first element. Pixel lengths
    /// come back as [`StyleValue::Px`].
    pub fn css(&self, property: &str) -> StyleValue {
        let first = self.first_node();
        self.dom
            .read(|document| computed_style(document, first, property))
    }

    /// Assigns inline styles. Numbers get a `px` suffix unless the property
    /// name is listed in [`sprig_css::UNITLESS_PROPERTIES`].
    pub fn set_css<K, V>(&self, pairs: impl IntoIterator<Item = (K, V)>) -> &Self
    where
        K: AsRef<str>,
        V: Into<StyleInput>,
    {
        let assignments: Vec<(String, String)> = pairs
            .into_iter()
            .filter_map(|(property, value)| {
                let property = property.as_ref();
                value
                    .into()
                    .to_css_value(property)
                    .map(|value| (property.to_owned(), value))
            })
            .collect();

        self.dom.write(|document| {
            for node in self.nodes() {
                for (property, value) in &assignments {
                    set_inline_property(document, *node, property, value);
                }
            }
        });
        self
    }

    /// Calls `callback` with a length-1 selection and its index for each
    /// element. The document is not borrowed while the callback runs.
    pub fn each(&self, mut callback: impl FnMut(Self, usize)) -> &Self {
        for (index, node) in self.nodes().iter().enumerate() {
            callback(Self::single(self.dom.clone(), *node), index);
        }
        self
    }

    /// Appends `content` to every element. See [`Selection::append_with`].
    pub fn append(&self, content: &str) -> SprigResult<&Self> {
        self.append_with(content, Built::new())
    }

    /// Markup (`<` first, with a later `>`) is added after each element's
    /// existing children by re-parsing its inner HTML. Anything else is a
    /// selector resolved find-or-create with the element as root; `built`
    /// then sets attributes on the resolved node and runs its callback.
    pub fn append_with(&self, content: &str, mut built: Built) -> SprigResult<&Self> {
        if is_markup(content) {
            for node in self.nodes() {
                self.dom.write(|document| {
                    let markup = inner_html(document, *node) + content;
                    set_inner_html(document, *node, &markup)
                })?;
            }
            return Ok(self);
        }

        let segments = parse(content)?;
        for node in self.nodes() {
            let resolution = self.dom.write(|document| {
                let resolution = resolve(document, &segments, *node)?;
                if let Some(element) = document.element_mut(resolution.node) {
                    for (name, value) in &built.attributes {
                        element.set_attribute(name, value);
                    }
                }
                SprigResult::Ok(resolution)
            })?;

            if let Some(on_built) = built.on_built.as_mut() {
                on_built(Self::single(self.dom.clone(), resolution.node));
            }
        }

        Ok(self)
    }

    /// Registers `callback` for each space-separated event name on every
    /// element, in registration order.
    pub fn on(&self, events: &str, callback: impl Fn(&Self, &mut Event) + 'static) -> &Self {
        let listener: Listener = Rc::new(callback);
        for node in self.nodes() {
            for event_type in events.split_whitespace() {
                self.dom.add_listener(*node, event_type, Rc::clone(&listener));
            }
        }
        self
    }

    /// Dispatches a fresh `event_type` event at every element in order.
    pub fn trigger(&self, event_type: &str) -> &Self {
        for node in self.nodes() {
            self.dom.dispatch(*node, &mut Event::new(event_type));
        }
        self
    }

    pub fn attr(&self, name: &str) -> Option<String> {
        let first = self.first_node();
        self.dom.read(|document| {
            document
                .element(first)
                .and_then(|element| element.attribute(name))
                .map(str::to_owned)
        })
    }

    pub fn set_attr(&self, name: &str, value: &str) -> &Self {
        self.dom.write(|document| {
            for node in self.nodes() {
                if let Some(element) = document.element_mut(*node) {
                    element.set_attribute(name, value);
                }
            }
        });
        self
    }

    pub fn html(&self) -> String {
        let first = self.first_node();
        self.dom.read(|document| inner_html(document, first))
    }

    pub fn text(&self) -> String {
        let first = self.first_node();
        self.dom.read(|document| document.text_content(first))
    }
}

impl PartialEq for Selection {
    fn eq(&self, other: &Self) -> bool {
        self.dom.same_document(&other.dom) && self.nodes() == other.nodes()
    }
}

fn is_markup(content: &str) -> bool {
    content
        .trim_start()
        .strip_prefix('<')
        .is_some_and(|rest| rest.contains('>'))
}

/// Extras for a selector passed to [`Selection::append_with`]: literal
/// attributes, a callback receiving the resolved node, or both.
#[derive(Default)]
pub struct Built {
    attributes: Vec<(String, String)>,
    on_built: Option<Box<dyn FnMut(Selection)>>,
}

impl Built {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attributes<K, V>(attributes: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            attributes: attributes
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
            on_built: None,
        }
    }

    pub fn callback(on_built: impl FnMut(Selection) + 'static) -> Self {
        Self::new().on_built(on_built)
    }

    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn on_built(mut self, on_built: impl FnMut(Selection) + 'static) -> Self {
        self.on_built = Some(Box::new(on_built));
        self
    }
}

impl fmt::Debug for Built {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Built")
            .field("attributes", &self.attributes)
            .field("on_built", &self.on_built.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::Built;
    use super::ClassMode;
    use super::is_markup;
    use crate::dom::Dom;
    use core::cell::RefCell;
    use sprig_css::StyleInput;
    use sprig_css::StyleValue;
    use std::rc::Rc;

    fn dom_with_items() -> Dom {
        Dom::parse_html(r#"<ul><li class="a">1</li><li>2</li><li class="a">3</li></ul>"#)
    }

    #[test]
    fn markup_detection() {
        assert!(is_markup("<b>x</b>"));
        assert!(is_markup("  <br>"));
        assert!(!is_markup("<"));
        assert!(!is_markup("li.item"));
        assert!(!is_markup("a<b>"));
    }

    #[test]
    fn class_modes_reach_every_element() {
        let dom = dom_with_items();
        let items = match dom.select("li") {
            Ok(items) => items,
            Err(error) => panic!("{error}"),
        };
        assert_eq!(items.len(), 3);
        assert!(!items.is_single());

        items.class(ClassMode::Toggle, "a").add_class("b");
        let flags: Vec<(bool, bool)> = (0..items.len())
            .filter_map(|index| items.get(index))
            .map(|item| (item.has_class("a"), item.has_class("b")))
            .collect();
        assert_eq!(flags, [(false, true), (true, true), (false, true)]);

        items.remove_class("b");
        assert_eq!(items.attr("class").as_deref(), Some(""));
    }

    #[test]
    fn set_css_coerces_numbers_and_reads_back_pixels() {
        let dom = dom_with_items();
        let Ok(list) = dom.select("ul") else {
            panic!("missing <ul>");
        };
        list.set_css([("opacity", StyleInput::from(0.5)), ("width", StyleInput::from(10))]);

        assert_eq!(list.attr("style").as_deref(), Some("opacity: 0.5; width: 10px;"));
        assert_eq!(list.css("width"), StyleValue::Px(10.0));
        assert_eq!(list.css("opacity"), StyleValue::Raw("0.5".to_owned()));
    }

    #[test]
    fn each_passes_single_selections_in_order() {
        let dom = dom_with_items();
        let Ok(items) = dom.select("li") else {
            panic!("missing <li>");
        };
        let mut seen = Vec::new();
        items.each(|item, index| {
            assert!(item.is_single());
            seen.push((index, item.text()));
        });
        assert_eq!(
            seen,
            [(0, "1".to_owned()), (1, "2".to_owned()), (2, "3".to_owned())]
        );
    }

    #[test]
    fn append_markup_keeps_existing_children() {
        let dom = dom_with_items();
        let Ok(list) = dom.select("ul") else {
            panic!("missing <ul>");
        };
        if let Err(error) = list.append("<li>4</li>") {
            panic!("{error}");
        }
        assert_eq!(dom.select("li").map(|items| items.len()).ok(), Some(4));
        assert!(list.html().ends_with("<li>4</li>"));
    }

    #[test]
    fn append_selector_applies_attributes_and_callback() {
        let dom = Dom::new();
        let Ok(body) = dom.select("body") else {
            panic!("missing <body>");
        };
        let built = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&built);

        let result = body.append_with(
            "nav a.link",
            Built::attributes([("href", "/home")])
                .on_built(move |node| sink.borrow_mut().push(node.first_node())),
        );
        if let Err(error) = result {
            panic!("{error}");
        }

        let Ok(link) = dom.select("nav > a.link") else {
            panic!("link was not built");
        };
        assert_eq!(link.attr("href").as_deref(), Some("/home"));
        assert_eq!(*built.borrow(), [link.first_node()]);
    }

    #[test]
    fn append_rejects_blank_content() {
        let dom = Dom::new();
        let Ok(body) = dom.select("body") else {
            panic!("missing <body>");
        };
        assert!(body.append("  ").is_err());
    }
}
