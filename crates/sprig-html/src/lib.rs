//! Markup tokenization, tree building and serialization.

mod serialize;

pub use serialize::inner_html;
pub use serialize::outer_html;

use sprig_core::SprigResult;
use sprig_dom::Document;
use sprig_dom::Namespace;
use sprig_dom::NodeId;

const VOID_ELEMENTS: [&str; 13] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

const RAW_TEXT_ELEMENTS: [&str; 4] = ["script", "style", "title", "textarea"];

/// Parses markup into DOM nodes.
#[derive(Debug, Default)]
pub struct HtmlParser;

impl HtmlParser {
    /// Parses a whole page. Missing `html`/`head`/`body` are added after
    /// parsing.
    pub fn parse(&self, input: &str) -> Document {
        let mut document = Document::empty();
        let root = document.root();
        self.parse_fragment(&mut document, root, input);
        document.ensure_body();
        document
    }

    /// Parses `input` and appends the resulting nodes to `parent`. Returns
    /// the top-level nodes that were appended.
    pub fn parse_fragment(
        &self,
        document: &mut Document,
        parent: NodeId,
        input: &str,
    ) -> Vec<NodeId> {
        let mut builder = TreeBuilder::new(document, parent);
        builder.run(input);
        builder.top_level
    }
}

/// Replaces the children of `node` with the nodes parsed from `markup`.
pub fn set_inner_html(
    document: &mut Document,
    node: NodeId,
    markup: &str,
) -> SprigResult<Vec<NodeId>> {
    if !document.is_element(node) {
        return Err(sprig_core::Error::new(
            sprig_core::ErrorKind::Hierarchy,
            "html.inner.not_element",
            format!("node {} is not an element", node.index()),
        ));
    }

    document.remove_children(node);
    Ok(HtmlParser.parse_fragment(document, node, markup))
}

struct TreeBuilder<'a> {
    document: &'a mut Document,
    open: Vec<NodeId>,
    top_level: Vec<NodeId>,
}

impl<'a> TreeBuilder<'a> {
    fn new(document: &'a mut Document, parent: NodeId) -> Self {
        Self {
            document,
            open: vec![parent],
            top_level: Vec::new(),
        }
    }

    fn run(&mut self, input: &str) {
        let bytes = input.as_bytes();
        let mut idx = 0_usize;

        while idx < bytes.len() {
            if bytes[idx] != b'<' {
                let next = find_byte(bytes, idx.saturating_add(1), b'<').unwrap_or(bytes.len());
                self.insert_text(&decode_entities(&input[idx..next]));
                idx = next;
                continue;
            }

            if starts_with(bytes, idx, b"<!--") {
                let end = find_subslice(bytes, idx.saturating_add(4), b"-->");
                let body_end = end.unwrap_or(bytes.len());
                let body = input.get(idx.saturating_add(4)..body_end).unwrap_or_default();
                let comment = self.document.create_comment(body);
                self.insert(comment);
                idx = end.map(|end| end.saturating_add(3)).unwrap_or(bytes.len());
                continue;
            }

            if starts_with(bytes, idx, b"<!") {
                idx = skip_to_gt(bytes, idx.saturating_add(2));
                continue;
            }

            if starts_with(bytes, idx, b"<?") {
                idx = skip_processing_instruction(bytes, idx);
                continue;
            }

            let Some((tag, next_idx)) = parse_tag(input, idx) else {
                let next = find_byte(bytes, idx.saturating_add(1), b'<').unwrap_or(bytes.len());
                self.insert_text(&decode_entities(&input[idx..next]));
                idx = next;
                continue;
            };

            if tag.is_end {
                self.close(&tag.name);
                idx = next_idx;
                continue;
            }

            let element = self.create_element(&tag);
            self.insert(element);

            let lower = tag.name.to_ascii_lowercase();
            let is_html = self
                .document
                .element(element)
                .is_some_and(|element| element.namespace() == Namespace::Html);

            if tag.self_closing || (is_html && VOID_ELEMENTS.contains(&lower.as_str())) {
                idx = next_idx;
                continue;
            }

            if is_html && RAW_TEXT_ELEMENTS.contains(&lower.as_str()) {
                let (raw, after) = read_raw_text_until_end_tag(input, next_idx, &lower);
                if !raw.is_empty() {
                    let text = if lower == "script" || lower == "style" {
                        raw.to_owned()
                    } else {
                        decode_entities(raw)
                    };
                    let text = self.document.create_text(&text);
                    self.append(element, text);
                }
                idx = after;
                continue;
            }

            self.open.push(element);
            idx = next_idx;
        }
    }

    fn current(&self) -> NodeId {
        self.open
            .last()
            .copied()
            .unwrap_or_else(|| self.document.root())
    }

    fn create_element(&mut self, tag: &ParsedTag) -> NodeId {
        let parent_namespace = self
            .document
            .element(self.current())
            .filter(|element| !element.is_tag("foreignObject"))
            .map(|element| element.namespace());
        let namespace = if tag.name.eq_ignore_ascii_case("svg")
            || parent_namespace == Some(Namespace::Svg)
        {
            Namespace::Svg
        } else {
            Namespace::Html
        };

        let element = self.document.create_element_ns(namespace, &tag.name);
        if let Some(target) = self.document.element_mut(element) {
            for (name, value) in &tag.attributes {
                if !target.has_attribute(name) {
                    target.set_attribute(name, value);
                }
            }
        }
        element
    }

    fn insert_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }

        let text = self.document.create_text(text);
        self.insert(text);
    }

    fn insert(&mut self, node: NodeId) {
        let parent = self.current();
        self.append(parent, node);
        if self.open.len() == 1 {
            self.top_level.push(node);
        }
    }

    fn append(&mut self, parent: NodeId, node: NodeId) {
        // Fresh nodes under an open element can always be attached.
        let _ = self.document.append_child(parent, node);
    }

    /// Pops open elements up to the nearest one named `name`. Stray end
    /// tags are ignored; the fragment parent is never popped.
    fn close(&mut self, name: &str) {
        let position = self.open.iter().skip(1).rposition(|open| {
            self.document
                .element(*open)
                .is_some_and(|element| element.is_tag(name))
        });

        if let Some(position) = position {
            self.open.truncate(position.saturating_add(1));
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ParsedTag {
    name: String,
    attributes: Vec<(String, String)>,
    is_end: bool,
    self_closing: bool,
}

fn parse_tag(input: &str, start: usize) -> Option<(ParsedTag, usize)> {
    let bytes = input.as_bytes();
    if bytes.get(start).copied() != Some(b'<') {
        return None;
    }

    let mut idx = start.saturating_add(1);
    let mut is_end = false;
    if bytes.get(idx).copied() == Some(b'/') {
        is_end = true;
        idx = idx.saturating_add(1);
    }

    let name_start = idx;
    while idx < bytes.len() && is_tag_name_char(bytes[idx]) {
        idx = idx.saturating_add(1);
    }

    if idx == name_start || !bytes[name_start].is_ascii_alphabetic() {
        return None;
    }

    let name = input[name_start..idx].to_owned();
    let mut attributes = Vec::new();

    loop {
        idx = skip_spaces(bytes, idx);
        match bytes.get(idx).copied() {
            None => return None,
            Some(b'>') => {
                return Some((
                    ParsedTag {
                        name,
                        attributes,
                        is_end,
                        self_closing: false,
                    },
                    idx.saturating_add(1),
                ));
            }
            Some(b'/') => {
                let after = skip_spaces(bytes, idx.saturating_add(1));
                if bytes.get(after).copied() == Some(b'>') {
                    return Some((
                        ParsedTag {
                            name,
                            attributes,
                            is_end,
                            self_closing: true,
                        },
                        after.saturating_add(1),
                    ));
                }
                idx = idx.saturating_add(1);
            }
            Some(_) => {
                let (attribute, next) = parse_attribute(input, idx);
                if let Some(attribute) = attribute {
                    attributes.push(attribute);
                }
                idx = next;
            }
        }
    }
}

fn parse_attribute(input: &str, start: usize) -> (Option<(String, String)>, usize) {
    let bytes = input.as_bytes();
    let mut idx = start;
    while idx < bytes.len()
        && !bytes[idx].is_ascii_whitespace()
        && !matches!(bytes[idx], b'=' | b'>' | b'/')
    {
        idx = idx.saturating_add(1);
    }

    if idx == start {
        return (None, start.saturating_add(1));
    }

    let name = input[start..idx].to_owned();
    let after_name = skip_spaces(bytes, idx);
    if bytes.get(after_name).copied() != Some(b'=') {
        return (Some((name, String::new())), idx);
    }

    let value_start = skip_spaces(bytes, after_name.saturating_add(1));
    match bytes.get(value_start).copied() {
        Some(quote @ (b'"' | b'\'')) => {
            let body_start = value_start.saturating_add(1);
            let end = find_byte(bytes, body_start, quote).unwrap_or(bytes.len());
            let value = decode_entities(&input[body_start..end]);
            (Some((name, value)), end.saturating_add(1).min(bytes.len()))
        }
        _ => {
            let mut end = value_start;
            while end < bytes.len() && !bytes[end].is_ascii_whitespace() && bytes[end] != b'>' {
                end = end.saturating_add(1);
            }
            let value = decode_entities(&input[value_start..end]);
            (Some((name, value)), end)
        }
    }
}

fn read_raw_text_until_end_tag<'a>(
    input: &'a str,
    start: usize,
    tag_name: &str,
) -> (&'a str, usize) {
    let bytes = input.as_bytes();
    let tag_bytes = tag_name.as_bytes();
    let mut idx = start;

    while idx < bytes.len() {
        if bytes[idx] == b'<'
            && bytes.get(idx.saturating_add(1)).copied() == Some(b'/')
            && starts_with_ignore_ascii_case(bytes, idx.saturating_add(2), tag_bytes)
            && tag_name_boundary(bytes, idx.saturating_add(2 + tag_bytes.len()))
        {
            let end = skip_to_gt(bytes, idx.saturating_add(2));
            return (&input[start..idx], end);
        }

        idx = idx.saturating_add(1);
    }

    (&input[start..], bytes.len())
}

/// Decodes the handful of named references markup fragments use in
/// practice plus numeric references. Unknown references stay verbatim.
pub fn decode_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_owned();
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let candidate = &rest[amp..];
        let decoded = candidate
            .find(';')
            .filter(|semi| *semi <= 10)
            .and_then(|semi| decode_reference(&candidate[1..semi]).map(|ch| (ch, semi)));

        match decoded {
            Some((ch, semi)) => {
                out.push(ch);
                rest = &candidate[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &candidate[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn decode_reference(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let numeric = name.strip_prefix('#')?;
            let code = match numeric.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => numeric.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        }
    }
}

fn skip_processing_instruction(bytes: &[u8], start: usize) -> usize {
    if let Some(end) = find_subslice(bytes, start.saturating_add(2), b"?>") {
        return end.saturating_add(2);
    }

    skip_to_gt(bytes, start.saturating_add(2))
}

fn skip_to_gt(bytes: &[u8], mut idx: usize) -> usize {
    while idx < bytes.len() {
        if bytes[idx] == b'>' {
            return idx.saturating_add(1);
        }
        idx = idx.saturating_add(1);
    }

    bytes.len()
}

fn tag_name_boundary(bytes: &[u8], idx: usize) -> bool {
    match bytes.get(idx).copied() {
        None => true,
        Some(byte) => byte.is_ascii_whitespace() || byte == b'>' || byte == b'/',
    }
}

fn skip_spaces(bytes: &[u8], mut idx: usize) -> usize {
    while idx < bytes.len() && bytes[idx].is_ascii_whitespace() {
        idx = idx.saturating_add(1);
    }
    idx
}

fn is_tag_name_char(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b':')
}

fn starts_with(bytes: &[u8], idx: usize, pattern: &[u8]) -> bool {
    let end = idx.saturating_add(pattern.len());
    end <= bytes.len() && bytes[idx..end] == *pattern
}

fn starts_with_ignore_ascii_case(bytes: &[u8], idx: usize, pattern: &[u8]) -> bool {
    let end = idx.saturating_add(pattern.len());
    if end > bytes.len() {
        return false;
    }

    bytes[idx..end]
        .iter()
        .zip(pattern.iter())
        .all(|(left, right)| left.eq_ignore_ascii_case(right))
}

fn find_subslice(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    if from >= bytes.len() {
        return None;
    }

    bytes[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|offset| from + offset)
}

fn find_byte(bytes: &[u8], from: usize, byte: u8) -> Option<usize> {
    bytes
        .get(from..)?
        .iter()
        .position(|candidate| *candidate == byte)
        .map(|offset| from + offset)
}
