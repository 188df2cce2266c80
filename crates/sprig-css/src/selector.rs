//! Selector parsing and matching with `querySelector` semantics.
//!
//! Supported: type and universal selectors, `#id`, `.class`, attribute
//! conditions (`[a]`, `=`, `~=`, `|=`, `^=`, `$=`, `*=`), the structural
//! pseudo-classes `:root`, `:empty`, `:first-child`, `:last-child`,
//! `:only-child`, `:not(compound)`, the four combinators and `,` groups.
//! Anything else is a syntax error.

use core::str::FromStr;
use sprig_core::Error;
use sprig_core::SprigResult;
use sprig_dom::Document;
use sprig_dom::Element;
use sprig_dom::Namespace;
use sprig_dom::NodeId;
use sprig_dom::NodeKind;

/// Selector specificity as `(ids, classes, types)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Specificity(pub u32, pub u32, pub u32);

impl core::ops::Add for Specificity {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(
            self.0.saturating_add(other.0),
            self.1.saturating_add(other.1),
            self.2.saturating_add(other.2),
        )
    }
}

/// Parsed comma-separated selector groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    source: String,
    groups: Vec<Complex>,
}

impl SelectorList {
    pub fn parse(input: &str) -> SprigResult<Self> {
        let groups = Parser::new(input).parse_list()?;
        Ok(Self {
            source: input.trim().to_owned(),
            groups,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, document: &Document, node: NodeId) -> bool {
        self.groups
            .iter()
            .any(|complex| complex.matches(document, node))
    }

    /// Highest specificity among the groups that match `node`.
    pub fn matching_specificity(&self, document: &Document, node: NodeId) -> Option<Specificity> {
        self.groups
            .iter()
            .filter(|complex| complex.matches(document, node))
            .map(Complex::specificity)
            .max()
    }

    /// Matching elements below `scope` in document order. `scope` itself is
    /// never returned, but its ancestors take part in matching.
    pub fn select_all(&self, document: &Document, scope: NodeId) -> Vec<NodeId> {
        document
            .descendant_elements(scope)
            .into_iter()
            .filter(|node| self.matches(document, *node))
            .collect()
    }

    pub fn select_first(&self, document: &Document, scope: NodeId) -> Option<NodeId> {
        document
            .descendant_elements(scope)
            .into_iter()
            .find(|node| self.matches(document, *node))
    }
}

impl FromStr for SelectorList {
    type Err = Error;

    fn from_str(input: &str) -> SprigResult<Self> {
        Self::parse(input)
    }
}

/// `scope.querySelector(selector)`.
pub fn query_selector(
    document: &Document,
    scope: NodeId,
    selector: &str,
) -> SprigResult<Option<NodeId>> {
    Ok(SelectorList::parse(selector)?.select_first(document, scope))
}

/// `scope.querySelectorAll(selector)`.
pub fn query_selector_all(
    document: &Document,
    scope: NodeId,
    selector: &str,
) -> SprigResult<Vec<NodeId>> {
    Ok(SelectorList::parse(selector)?.select_all(document, scope))
}

/// `element.matches(selector)`.
pub fn matches(document: &Document, node: NodeId, selector: &str) -> SprigResult<bool> {
    Ok(SelectorList::parse(selector)?.matches(document, node))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
    NextSibling,
    SubsequentSibling,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttributeOperator {
    Exists,
    Equals,
    Includes,
    DashMatch,
    Prefix,
    Suffix,
    Substring,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttributeCondition {
    name: String,
    operator: AttributeOperator,
    value: String,
}

impl AttributeCondition {
    fn matches(&self, element: &Element) -> bool {
        let Some(actual) = element.attribute(&self.name) else {
            return false;
        };

        let expected = self.value.as_str();
        match self.operator {
            AttributeOperator::Exists => true,
            AttributeOperator::Equals => actual == expected,
            AttributeOperator::Includes => actual
                .split_ascii_whitespace()
                .any(|token| token == expected),
            AttributeOperator::DashMatch => {
                actual == expected
                    || actual
                        .strip_prefix(expected)
                        .is_some_and(|rest| rest.starts_with('-'))
            }
            AttributeOperator::Prefix => !expected.is_empty() && actual.starts_with(expected),
            AttributeOperator::Suffix => !expected.is_empty() && actual.ends_with(expected),
            AttributeOperator::Substring => !expected.is_empty() && actual.contains(expected),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PseudoClass {
    Root,
    Empty,
    FirstChild,
    LastChild,
    OnlyChild,
    Not(Box<Compound>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    universal: bool,
    ids: Vec<String>,
    classes: Vec<String>,
    attributes: Vec<AttributeCondition>,
    pseudo_classes: Vec<PseudoClass>,
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none()
            && !self.universal
            && self.ids.is_empty()
            && self.classes.is_empty()
            && self.attributes.is_empty()
            && self.pseudo_classes.is_empty()
    }

    fn specificity(&self) -> Specificity {
        let mut specificity = Specificity(
            count(self.ids.len()),
            count(self.classes.len() + self.attributes.len()),
            u32::from(self.tag.is_some()),
        );

        for pseudo in &self.pseudo_classes {
            specificity = specificity
                + match pseudo {
                    PseudoClass::Not(inner) => inner.specificity(),
                    _ => Specificity(0, 1, 0),
                };
        }

        specificity
    }

    fn matches(&self, document: &Document, node: NodeId) -> bool {
        let Some(element) = document.element(node) else {
            return false;
        };

        if let Some(tag) = &self.tag {
            let same = match element.namespace() {
                Namespace::Html => element.tag_name().eq_ignore_ascii_case(tag),
                Namespace::Svg => element.tag_name() == tag,
            };
            if !same {
                return false;
            }
        }

        if self.ids.iter().any(|id| element.id() != Some(id.as_str())) {
            return false;
        }

        if self.classes.iter().any(|class| !element.has_class(class)) {
            return false;
        }

        if self
            .attributes
            .iter()
            .any(|condition| !condition.matches(element))
        {
            return false;
        }

        self.pseudo_classes
            .iter()
            .all(|pseudo| pseudo_matches(document, node, pseudo))
    }
}

fn pseudo_matches(document: &Document, node: NodeId, pseudo: &PseudoClass) -> bool {
    match pseudo {
        PseudoClass::Root => document
            .parent(node)
            .and_then(|parent| document.node(parent))
            .is_some_and(|parent| matches!(parent.kind(), NodeKind::Document)),
        PseudoClass::Empty => document.children(node).iter().all(|child| {
            match document.node(*child).map(|child| child.kind()) {
                Some(NodeKind::Comment(_)) => true,
                Some(NodeKind::Text(text)) => text.is_empty(),
                _ => false,
            }
        }),
        PseudoClass::FirstChild => {
            sibling_position(document, node).is_some_and(|(index, _)| index == 0)
        }
        PseudoClass::LastChild => {
            sibling_position(document, node).is_some_and(|(index, total)| index + 1 == total)
        }
        PseudoClass::OnlyChild => {
            sibling_position(document, node).is_some_and(|(_, total)| total == 1)
        }
        PseudoClass::Not(inner) => !inner.matches(document, node),
    }
}

/// Position among element siblings and the element sibling count.
fn sibling_position(document: &Document, node: NodeId) -> Option<(usize, usize)> {
    let parent = document.parent(node)?;
    let siblings = document.element_children(parent);
    let index = siblings.iter().position(|sibling| *sibling == node)?;
    Some((index, siblings.len()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    compounds: Vec<Compound>,
    // combinators[i] links compounds[i] (left) and compounds[i + 1] (right).
    combinators: Vec<Combinator>,
}

impl Complex {
    fn specificity(&self) -> Specificity {
        self.compounds
            .iter()
            .map(Compound::specificity)
            .fold(Specificity::default(), |total, next| total + next)
    }

    fn matches(&self, document: &Document, node: NodeId) -> bool {
        match self.compounds.len().checked_sub(1) {
            Some(last) => self.matches_from(document, node, last),
            None => false,
        }
    }

    fn matches_from(&self, document: &Document, node: NodeId, index: usize) -> bool {
        if !self.compounds[index].matches(document, node) {
            return false;
        }

        let Some(left) = index.checked_sub(1) else {
            return true;
        };

        match self.combinators[left] {
            Combinator::Descendant => document
                .ancestors(node)
                .into_iter()
                .any(|ancestor| self.matches_from(document, ancestor, left)),
            Combinator::Child => document
                .parent(node)
                .is_some_and(|parent| self.matches_from(document, parent, left)),
            Combinator::NextSibling => document
                .preceding_element_siblings(node)
                .first()
                .is_some_and(|sibling| self.matches_from(document, *sibling, left)),
            Combinator::SubsequentSibling => document
                .preceding_element_siblings(node)
                .into_iter()
                .any(|sibling| self.matches_from(document, sibling, left)),
        }
    }
}

fn count(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

struct Parser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, detail: impl core::fmt::Display) -> Error {
        Error::selector_syntax(self.source, detail)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        Some(ch)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            return true;
        }
        false
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos != start
    }

    fn parse_list(&mut self) -> SprigResult<Vec<Complex>> {
        let mut groups = Vec::new();

        loop {
            self.skip_whitespace();
            groups.push(self.parse_complex()?);
            self.skip_whitespace();

            match self.bump() {
                None => break,
                Some(',') => continue,
                Some(other) => return Err(self.error(format!("unexpected `{other}`"))),
            }
        }

        Ok(groups)
    }

    fn parse_complex(&mut self) -> SprigResult<Complex> {
        let mut compounds = vec![self.parse_required_compound()?];
        let mut combinators = Vec::new();

        loop {
            let had_whitespace = self.skip_whitespace();
            let combinator = match self.peek() {
                None | Some(',') => break,
                Some('>') => Combinator::Child,
                Some('+') => Combinator::NextSibling,
                Some('~') => Combinator::SubsequentSibling,
                Some(_) if had_whitespace => Combinator::Descendant,
                Some(other) => return Err(self.error(format!("unexpected `{other}`"))),
            };

            if combinator != Combinator::Descendant {
                self.pos += 1;
                self.skip_whitespace();
            }

            combinators.push(combinator);
            compounds.push(self.parse_required_compound()?);
        }

        Ok(Complex {
            compounds,
            combinators,
        })
    }

    fn parse_required_compound(&mut self) -> SprigResult<Compound> {
        let compound = self.parse_compound()?;
        if compound.is_empty() {
            return Err(match self.peek() {
                Some(other) => self.error(format!("expected a selector before `{other}`")),
                None => self.error("expected a selector"),
            });
        }
        Ok(compound)
    }

    fn parse_compound(&mut self) -> SprigResult<Compound> {
        let mut compound = Compound::default();

        while let Some(ch) = self.peek() {
            match ch {
                '*' => {
                    if !compound.is_empty() {
                        return Err(self.error("`*` must start a compound selector"));
                    }
                    self.pos += 1;
                    compound.universal = true;
                }
                '#' => {
                    self.pos += 1;
                    compound.ids.push(self.parse_ident("id")?);
                }
                '.' => {
                    self.pos += 1;
                    compound.classes.push(self.parse_ident("class name")?);
                }
                '[' => {
                    self.pos += 1;
                    compound.attributes.push(self.parse_attribute()?);
                }
                ':' => {
                    self.pos += 1;
                    compound.pseudo_classes.push(self.parse_pseudo_class()?);
                }
                _ if is_ident_start(ch) => {
                    if !compound.is_empty() {
                        return Err(self.error("type selector must start a compound selector"));
                    }
                    compound.tag = Some(self.parse_ident("type selector")?);
                }
                _ => break,
            }
        }

        Ok(compound)
    }

    fn parse_ident(&mut self, what: &str) -> SprigResult<String> {
        let mut ident = String::new();

        while let Some(ch) = self.peek() {
            if ch == '\\' {
                self.pos += 1;
                match self.bump() {
                    Some(escaped) => ident.push(escaped),
                    None => return Err(self.error("dangling escape")),
                }
                continue;
            }

            if !is_ident_char(ch) {
                break;
            }

            ident.push(ch);
            self.pos += 1;
        }

        let mut leading = ident.chars();
        let valid = match (leading.next(), leading.next()) {
            (None, _) => false,
            (Some(first), _) if first.is_ascii_digit() => false,
            (Some('-'), Some(second)) => !second.is_ascii_digit(),
            (Some('-'), None) => false,
            _ => true,
        };

        if !valid {
            return Err(self.error(format!("invalid {what} `{ident}`")));
        }

        Ok(ident)
    }

    fn parse_attribute(&mut self) -> SprigResult<AttributeCondition> {
        self.skip_whitespace();
        let name = self.parse_ident("attribute name")?;
        self.skip_whitespace();

        let operator = match self.bump() {
            Some(']') => {
                return Ok(AttributeCondition {
                    name,
                    operator: AttributeOperator::Exists,
                    value: String::new(),
                });
            }
            Some('=') => AttributeOperator::Equals,
            Some(prefix @ ('~' | '|' | '^' | '$' | '*')) => {
                if !self.eat('=') {
                    return Err(self.error(format!("expected `=` after `{prefix}`")));
                }
                match prefix {
                    '~' => AttributeOperator::Includes,
                    '|' => AttributeOperator::DashMatch,
                    '^' => AttributeOperator::Prefix,
                    '$' => AttributeOperator::Suffix,
                    _ => AttributeOperator::Substring,
                }
            }
            _ => return Err(self.error("malformed attribute selector")),
        };

        self.skip_whitespace();
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                let mut value = String::new();
                loop {
                    match self.bump() {
                        Some(ch) if ch == quote => break,
                        Some('\\') => match self.bump() {
                            Some(escaped) => value.push(escaped),
                            None => return Err(self.error("unterminated string")),
                        },
                        Some(ch) => value.push(ch),
                        None => return Err(self.error("unterminated string")),
                    }
                }
                value
            }
            _ => self.parse_ident("attribute value")?,
        };

        self.skip_whitespace();
        if !self.eat(']') {
            return Err(self.error("expected `]`"));
        }

        Ok(AttributeCondition {
            name,
            operator,
            value,
        })
    }

    fn parse_pseudo_class(&mut self) -> SprigResult<PseudoClass> {
        if self.peek() == Some(':') {
            return Err(self.error("pseudo-elements never match elements"));
        }

        let name = self.parse_ident("pseudo-class")?.to_ascii_lowercase();
        match name.as_str() {
            "root" => Ok(PseudoClass::Root),
            "empty" => Ok(PseudoClass::Empty),
            "first-child" => Ok(PseudoClass::FirstChild),
            "last-child" => Ok(PseudoClass::LastChild),
            "only-child" => Ok(PseudoClass::OnlyChild),
            "not" => {
                if !self.eat('(') {
                    return Err(self.error("expected `(` after `:not`"));
                }
                self.skip_whitespace();
                let inner = self.parse_required_compound()?;
                self.skip_whitespace();
                if !self.eat(')') {
                    return Err(self.error("expected `)`"));
                }
                Ok(PseudoClass::Not(Box::new(inner)))
            }
            other => Err(self.error(format!("unsupported pseudo-class `:{other}`"))),
        }
    }
}

fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || matches!(ch, '_' | '-' | '\\') || !ch.is_ascii()
}

fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-') || !ch.is_ascii()
}
