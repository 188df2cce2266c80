//! CSS for Sprig: selector matching, stylesheet parsing and style values.

mod selector;
mod style;
mod stylesheet;

pub use selector::SelectorList;
pub use selector::Specificity;
pub use selector::matches;
pub use selector::query_selector;
pub use selector::query_selector_all;
pub use style::StyleInput;
pub use style::StyleValue;
pub use style::UNITLESS_PROPERTIES;
pub use style::computed_style;
pub use style::computed_value;
pub use style::css_property_name;
pub use style::inline_declarations;
pub use style::inline_property;
pub use style::is_unitless;
pub use style::set_inline_property;
pub use stylesheet::CssParser;
pub use stylesheet::Declaration;
pub use stylesheet::StyleRule;
pub use stylesheet::StyleSheet;
pub use stylesheet::parse_declarations;
pub use stylesheet::serialize_declarations;
