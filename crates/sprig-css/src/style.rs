//! Inline style access, number-to-length coercion and computed values.

use crate::selector::Specificity;
use crate::stylesheet::Declaration;
use crate::stylesheet::StyleSheet;
use crate::stylesheet::parse_declarations;
use crate::stylesheet::serialize_declarations;
use core::fmt;
use sprig_dom::Document;
use sprig_dom::NodeId;

/// Properties that take a bare number as-is. Matching is exact and
/// case-sensitive; both spellings are listed.
pub const UNITLESS_PROPERTIES: [&str; 21] = [
    "animation-iteration-count",
    "animationIterationCount",
    "column-count",
    "columnCount",
    "fill-opacity",
    "fillOpacity",
    "flex-grow",
    "flexGrow",
    "flex-shrink",
    "flexShrink",
    "font-weight",
    "fontWeight",
    "line-height",
    "lineHeight",
    "opacity",
    "order",
    "orphans",
    "widows",
    "z-index",
    "zIndex",
    "zoom",
];

pub fn is_unitless(property: &str) -> bool {
    UNITLESS_PROPERTIES.contains(&property)
}

/// Maps a script-style name (`zIndex`, `WebkitTransform`) to its CSS
/// spelling. Hyphenated and custom (`--x`) names pass through.
pub fn css_property_name(name: &str) -> String {
    if name.starts_with("--") || name.contains('-') {
        return name.to_owned();
    }

    let mut out = String::with_capacity(name.len().saturating_add(4));
    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }

    if out.starts_with("ms-") {
        out.insert(0, '-');
    }
    out
}

/// A read style value: pixel lengths come back as numbers.
#[derive(Debug, Clone, PartialEq)]
pub enum StyleValue {
    Px(f64),
    Raw(String),
}

impl StyleValue {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let px = trimmed
            .strip_suffix("px")
            .and_then(|number| number.parse::<f64>().ok())
            .filter(|number| number.is_finite());

        match px {
            Some(number) => Self::Px(number),
            None => Self::Raw(trimmed.to_owned()),
        }
    }

    pub fn as_px(&self) -> Option<f64> {
        match self {
            Self::Px(number) => Some(*number),
            Self::Raw(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Raw(raw) if raw.is_empty())
    }
}

impl fmt::Display for StyleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Px(number) => write!(f, "{number}px"),
            Self::Raw(raw) => f.write_str(raw),
        }
    }
}

/// A value to assign: numbers are coerced, text is used verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum StyleInput {
    Number(f64),
    Text(String),
}

impl StyleInput {
    /// `None` for non-finite numbers, which a style declaration rejects.
    pub fn to_css_value(&self, property: &str) -> Option<String> {
        match self {
            Self::Number(number) if !number.is_finite() => None,
            Self::Number(number) if is_unitless(property) => Some(number.to_string()),
            Self::Number(number) => Some(format!("{number}px")),
            Self::Text(text) => Some(text.clone()),
        }
    }
}

impl From<f64> for StyleInput {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<f32> for StyleInput {
    fn from(value: f32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<i32> for StyleInput {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<u32> for StyleInput {
    fn from(value: u32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for StyleInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for StyleInput {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

pub fn inline_declarations(document: &Document, node: NodeId) -> Vec<Declaration> {
    document
        .element(node)
        .and_then(|element| element.attribute("style"))
        .map(parse_declarations)
        .unwrap_or_default()
}

pub fn inline_property(document: &Document, node: NodeId, property: &str) -> Option<String> {
    let name = css_property_name(property);
    inline_declarations(document, node)
        .into_iter()
        .rev()
        .find(|declaration| declaration.name == name)
        .map(|declaration| declaration.value)
}

/// Writes `property: value` into the element's `style` attribute. An empty
/// value removes the property. Returns `false` for non-element nodes.
pub fn set_inline_property(
    document: &mut Document,
    node: NodeId,
    property: &str,
    value: &str,
) -> bool {
    let name = css_property_name(property);
    let mut declarations = inline_declarations(document, node);
    let Some(element) = document.element_mut(node) else {
        return false;
    };

    let value = value.trim();
    match declarations.iter().position(|declaration| declaration.name == name) {
        _ if value.is_empty() => declarations.retain(|declaration| declaration.name != name),
        Some(first) => {
            declarations[first].value = value.to_owned();
            declarations[first].important = false;
            let mut idx = 0_usize;
            declarations.retain(|declaration| {
                let keep = idx <= first || declaration.name != name;
                idx = idx.saturating_add(1);
                keep
            });
        }
        None => declarations.push(Declaration {
            name,
            value: value.to_owned(),
            important: false,
        }),
    }

    if declarations.is_empty() {
        element.remove_attribute("style");
    } else {
        element.set_attribute("style", &serialize_declarations(&declarations));
    }
    true
}

/// Cascaded value of `property` for `node`: matching rules ordered by
/// importance, then inline origin, then specificity, then source order.
pub fn computed_value(
    document: &Document,
    node: NodeId,
    sheets: &[StyleSheet],
    property: &str,
) -> Option<String> {
    let name = css_property_name(property);
    let mut winner: Option<((bool, bool, Specificity), String)> = None;
    let mut consider = |key: (bool, bool, Specificity), value: &str| {
        if winner.as_ref().is_none_or(|(best, _)| key >= *best) {
            winner = Some((key, value.to_owned()));
        }
    };

    for rule in sheets.iter().flat_map(|sheet| &sheet.rules) {
        let Some(specificity) = rule
            .selectors
            .as_ref()
            .and_then(|selectors| selectors.matching_specificity(document, node))
        else {
            continue;
        };

        for declaration in rule.declarations.iter().filter(|declaration| declaration.name == name) {
            consider((declaration.important, false, specificity), &declaration.value);
        }
    }

    for declaration in inline_declarations(document, node)
        .iter()
        .filter(|declaration| declaration.name == name)
    {
        consider(
            (declaration.important, true, Specificity::default()),
            &declaration.value,
        );
    }

    winner.map(|(_, value)| value)
}

/// Computed value against the document's own `<style>` elements. Unset
/// properties read as an empty raw value.
pub fn computed_style(document: &Document, node: NodeId, property: &str) -> StyleValue {
    let sheets = StyleSheet::from_document(document);
    computed_value(document, node, &sheets, property)
        .map_or_else(|| StyleValue::Raw(String::new()), |value| StyleValue::parse(&value))
}

#[cfg(test)]
mod tests {
    use super::StyleInput;
    use super::StyleValue;
    use super::computed_style;
    use super::css_property_name;
    use super::inline_property;
    use super::is_unitless;
    use super::set_inline_property;
    use sprig_dom::Document;
    use sprig_dom::NodeId;
    use sprig_html::HtmlParser;

    fn first_element(doc: &Document, tag: &str) -> NodeId {
        match doc
            .descendant_elements(doc.root())
            .into_iter()
            .find(|node| doc.element(*node).is_some_and(|element| element.is_tag(tag)))
        {
            Some(node) => node,
            None => panic!("no <{tag}>"),
        }
    }

    #[test]
    fn numbers_are_coerced_unless_whitelisted() {
        assert_eq!(StyleInput::from(10).to_css_value("width"), Some("10px".to_owned()));
        assert_eq!(StyleInput::from(0.5).to_css_value("opacity"), Some("0.5".to_owned()));
        assert_eq!(StyleInput::from(3).to_css_value("zIndex"), Some("3".to_owned()));
        assert_eq!(StyleInput::from(3).to_css_value("Z-INDEX"), Some("3px".to_owned()));
        assert_eq!(StyleInput::from("10").to_css_value("width"), Some("10".to_owned()));
        assert_eq!(StyleInput::from(f64::NAN).to_css_value("width"), None);
        assert!(is_unitless("flex-grow"));
        assert!(!is_unitless("FlexGrow"));
    }

    #[test]
    fn camel_case_names_map_to_css_names() {
        assert_eq!(css_property_name("zIndex"), "z-index");
        assert_eq!(css_property_name("backgroundColor"), "background-color");
        assert_eq!(css_property_name("WebkitTransform"), "-webkit-transform");
        assert_eq!(css_property_name("msFlex"), "-ms-flex");
        assert_eq!(css_property_name("--mainColor"), "--mainColor");
        assert_eq!(css_property_name("margin-top"), "margin-top");
    }

    #[test]
    fn style_values_parse_pixel_lengths() {
        assert_eq!(StyleValue::parse("12.5px"), StyleValue::Px(12.5));
        assert_eq!(StyleValue::parse(" 0px "), StyleValue::Px(0.0));
        assert_eq!(StyleValue::parse("1em"), StyleValue::Raw("1em".to_owned()));
        assert_eq!(StyleValue::parse("px"), StyleValue::Raw("px".to_owned()));
        assert_eq!(StyleValue::Px(4.0).to_string(), "4px");
    }

    #[test]
    fn inline_properties_are_replaced_in_place_and_removed_when_empty() {
        let mut doc =
            HtmlParser.parse(r#"<div style="color: red; width: 1px; color: blue"></div>"#);
        let div = first_element(&doc, "div");

        assert_eq!(inline_property(&doc, div, "color").as_deref(), Some("blue"));
        assert!(set_inline_property(&mut doc, div, "color", "green"));
        assert_eq!(
            doc.element(div).and_then(|element| element.attribute("style")),
            Some("color: green; width: 1px;")
        );

        assert!(set_inline_property(&mut doc, div, "zIndex", "2"));
        assert_eq!(inline_property(&doc, div, "z-index").as_deref(), Some("2"));

        set_inline_property(&mut doc, div, "color", "");
        set_inline_property(&mut doc, div, "width", "");
        set_inline_property(&mut doc, div, "z-index", "");
        assert!(!doc.element(div).is_some_and(|element| element.has_attribute("style")));
    }

    #[test]
    fn computed_style_cascades_rules_and_inline() {
        let doc = HtmlParser.parse(
            r#"<html><head><style>
                p { width: 5px; color: red; }
                #lead { width: 7px; }
                .note { width: 6px; margin: 1px !important; }
                p { color: green; }
            </style></head><body>
            <p id="lead" class="note" style="width: 9px; margin: 2px">x</p><p>y</p>
            </body></html>"#,
        );
        let paragraphs: Vec<NodeId> = doc
            .descendant_elements(doc.root())
            .into_iter()
            .filter(|node| doc.element(*node).is_some_and(|element| element.is_tag("p")))
            .collect();

        assert_eq!(computed_style(&doc, paragraphs[0], "width"), StyleValue::Px(9.0));
        assert_eq!(computed_style(&doc, paragraphs[0], "margin"), StyleValue::Px(1.0));
        assert_eq!(
            computed_style(&doc, paragraphs[0], "color"),
            StyleValue::Raw("green".to_owned())
        );
        assert_eq!(computed_style(&doc, paragraphs[1], "width"), StyleValue::Px(5.0));
        assert!(computed_style(&doc, paragraphs[1], "height").is_empty());
    }

    #[test]
    fn unterminated_style_rules_still_apply() {
        let doc = HtmlParser.parse("<style>p { width: 5px</style><p>x</p>");
        let paragraph = first_element(&doc, "p");
        assert_eq!(computed_style(&doc, paragraph, "width"), StyleValue::Px(5.0));
    }
}
