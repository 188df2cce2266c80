//! Stylesheet parsing into selector/declaration rules.

use crate::selector::SelectorList;
use sprig_dom::Document;
use sprig_dom::Namespace;

/// One `name: value` pair from a rule body or a `style` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub value: String,
    pub important: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRule {
    pub selector_text: String,
    /// `None` when the prelude is not a selector this engine understands;
    /// such a rule never matches.
    pub selectors: Option<SelectorList>,
    pub declarations: Vec<Declaration>,
}

/// Style rules compiled from source CSS.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleSheet {
    pub rules: Vec<StyleRule>,
}

impl StyleSheet {
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Every `<style>` element of `document`, in document order.
    pub fn from_document(document: &Document) -> Vec<Self> {
        document
            .descendant_elements(document.root())
            .into_iter()
            .filter(|node| {
                document.element(*node).is_some_and(|element| {
                    element.namespace() == Namespace::Html && element.is_tag("style")
                })
            })
            .map(|node| CssParser.parse(&document.text_content(node)))
            .collect()
    }
}

/// Parses CSS source text.
#[derive(Debug, Default)]
pub struct CssParser;

impl CssParser {
    pub fn parse(&self, input: &str) -> StyleSheet {
        let sanitized = strip_comments(input);
        let mut rules = Vec::new();
        parse_rules(&sanitized, &mut rules);
        StyleSheet { rules }
    }
}

/// Parses a declaration block such as the value of a `style` attribute.
/// Later duplicates are kept; callers pick the last one.
pub fn parse_declarations(input: &str) -> Vec<Declaration> {
    split_top_level(&strip_comments(input), b';')
        .into_iter()
        .filter_map(parse_declaration)
        .collect()
}

/// Serializes declarations back into `style` attribute form.
pub fn serialize_declarations(declarations: &[Declaration]) -> String {
    declarations
        .iter()
        .map(|declaration| {
            if declaration.important {
                format!("{}: {} !important;", declaration.name, declaration.value)
            } else {
                format!("{}: {};", declaration.name, declaration.value)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_declaration(raw: &str) -> Option<Declaration> {
    let trimmed = raw.trim();
    let colon = find_top_level(trimmed, 0, b':')?;

    let raw_name = trimmed[..colon].trim();
    let name = if raw_name.starts_with("--") {
        raw_name.to_owned()
    } else {
        raw_name.to_ascii_lowercase()
    };

    let mut value = normalize_value(&trimmed[colon + 1..]);
    let important = strip_important(&mut value);
    if name.is_empty() || value.is_empty() || name.contains(char::is_whitespace) {
        return None;
    }

    Some(Declaration {
        name,
        value,
        important,
    })
}

fn strip_important(value: &mut String) -> bool {
    let Some(bang) = value.rfind('!') else {
        return false;
    };

    if !value[bang + 1..].trim().eq_ignore_ascii_case("important") {
        return false;
    }

    value.truncate(bang);
    let kept = value.trim_end().len();
    value.truncate(kept);
    true
}

fn parse_rules(input: &str, out: &mut Vec<StyleRule>) {
    let mut cursor = 0_usize;

    while let Some((prelude_raw, body_raw, next_cursor)) = next_rule_block(input, cursor) {
        cursor = next_cursor;

        // `@import ...;` style statements can precede a block.
        let prelude_raw = split_top_level(prelude_raw, b';')
            .pop()
            .unwrap_or(prelude_raw);
        let prelude = normalize_ws(prelude_raw);
        if prelude.is_empty() {
            continue;
        }

        if prelude.starts_with('@') {
            if is_grouping_at_rule(&prelude) {
                parse_rules(body_raw, out);
            }
            continue;
        }

        let declarations = parse_declarations(body_raw);
        if declarations.is_empty() {
            continue;
        }

        out.push(StyleRule {
            selectors: SelectorList::parse(&prelude).ok(),
            selector_text: prelude,
            declarations,
        });
    }
}

fn next_rule_block(input: &str, from: usize) -> Option<(&str, &str, usize)> {
    let start = skip_rule_separators(input, from);
    if start >= input.len() {
        return None;
    }

    let open = find_top_level(input, start, b'{')?;
    // End of input closes any block still open.
    let close = find_matching_brace(input, open).unwrap_or(input.len());
    let next = close.saturating_add(1).min(input.len());
    Some((&input[start..open], &input[open + 1..close], next))
}

fn skip_rule_separators(input: &str, from: usize) -> usize {
    input.as_bytes()[from..]
        .iter()
        .position(|byte| !byte.is_ascii_whitespace() && *byte != b';')
        .map_or(input.len(), |offset| from.saturating_add(offset))
}

fn is_grouping_at_rule(prelude: &str) -> bool {
    let lower = prelude.to_ascii_lowercase();
    ["@media", "@supports", "@layer", "@document"]
        .iter()
        .any(|name| lower.starts_with(name))
}

/// Tracks string literals and bracket nesting while scanning CSS bytes.
#[derive(Debug, Default)]
struct Scanner {
    quote: Option<u8>,
    escape: bool,
    paren_depth: u32,
    bracket_depth: u32,
}

impl Scanner {
    /// Feeds one byte and reports whether it sits at the top level:
    /// outside strings, parentheses and square brackets.
    fn feed(&mut self, byte: u8) -> bool {
        if let Some(quote) = self.quote {
            if self.escape {
                self.escape = false;
            } else if byte == b'\\' {
                self.escape = true;
            } else if byte == quote {
                self.quote = None;
            }
            return false;
        }

        match byte {
            b'\'' | b'"' => {
                self.quote = Some(byte);
                false
            }
            b'(' => {
                self.paren_depth = self.paren_depth.saturating_add(1);
                false
            }
            b')' => {
                self.paren_depth = self.paren_depth.saturating_sub(1);
                false
            }
            b'[' => {
                self.bracket_depth = self.bracket_depth.saturating_add(1);
                false
            }
            b']' => {
                self.bracket_depth = self.bracket_depth.saturating_sub(1);
                false
            }
            _ => self.paren_depth == 0 && self.bracket_depth == 0,
        }
    }

    fn in_string(&self) -> bool {
        self.quote.is_some()
    }
}

fn find_top_level(input: &str, from: usize, target: u8) -> Option<usize> {
    let mut scanner = Scanner::default();
    input.as_bytes()[from..]
        .iter()
        .position(|byte| scanner.feed(*byte) && *byte == target)
        .map(|offset| from.saturating_add(offset))
}

fn find_matching_brace(input: &str, open_brace: usize) -> Option<usize> {
    let bytes = input.as_bytes();
    if bytes.get(open_brace).copied() != Some(b'{') {
        return None;
    }

    let mut scanner = Scanner::default();
    let mut depth = 1_u32;
    for (idx, byte) in bytes.iter().enumerate().skip(open_brace.saturating_add(1)) {
        if scanner.in_string() {
            scanner.feed(*byte);
            continue;
        }

        match byte {
            b'{' => depth = depth.saturating_add(1),
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {
                scanner.feed(*byte);
            }
        }
    }

    None
}

fn split_top_level(input: &str, delimiter: u8) -> Vec<&str> {
    let mut scanner = Scanner::default();
    let mut parts = Vec::new();
    let mut start = 0_usize;

    for (idx, byte) in input.bytes().enumerate() {
        if scanner.feed(byte) && byte == delimiter {
            parts.push(&input[start..idx]);
            start = idx.saturating_add(1);
        }
    }

    parts.push(&input[start..]);
    parts
}

fn strip_comments(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut scanner = Scanner::default();
    let mut out = Vec::with_capacity(bytes.len());
    let mut idx = 0_usize;

    while idx < bytes.len() {
        let byte = bytes[idx];
        if !scanner.in_string() && byte == b'/' && bytes.get(idx.saturating_add(1)) == Some(&b'*') {
            idx = match input[idx.saturating_add(2)..].find("*/") {
                Some(end) => idx.saturating_add(end).saturating_add(4),
                None => bytes.len(),
            };
            continue;
        }

        scanner.feed(byte);
        out.push(byte);
        idx = idx.saturating_add(1);
    }

    String::from_utf8_lossy(&out).into_owned()
}

fn normalize_ws(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Collapses whitespace runs outside string literals.
fn normalize_value(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut quote = None;
    let mut escape = false;
    let mut pending_space = false;

    for ch in input.trim().chars() {
        if let Some(open) = quote {
            out.push(ch);
            if escape {
                escape = false;
            } else if ch == '\\' {
                escape = true;
            } else if ch == open {
                quote = None;
            }
            continue;
        }

        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }

        if pending_space {
            out.push(' ');
            pending_space = false;
        }

        if ch == '\'' || ch == '"' {
            quote = Some(ch);
        }
        out.push(ch);
    }

    out
}
