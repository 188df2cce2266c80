//! Sprig: find-or-create DOM queries behind one chainable wrapper.
//!
//! ```
//! use sprig_query::Dom;
//!
//! # fn main() -> sprig_core::SprigResult<()> {
//! let dom = Dom::new();
//! dom.build("ul.menu li.item")?.add_class("active");
//! assert_eq!(dom.select("li.active")?.len(), 1);
//! # Ok(())
//! # }
//! ```

mod dom;
mod event;
mod resolve;
mod segment;
mod selection;
mod tap;

pub use dom::Dom;
pub use dom::Listener;
pub use dom::Query;
pub use event::Event;
pub use event::Touch;
pub use resolve::Resolution;
pub use resolve::build_element;
pub use resolve::resolve;
pub use resolve::resolve_selector;
pub use segment::SVG_TAGS;
pub use segment::Segment;
pub use segment::Token;
pub use segment::parse;
pub use selection::Built;
pub use selection::ClassMode;
pub use selection::Selection;
pub use sprig_css::StyleInput;
pub use sprig_css::StyleValue;
pub use tap::TapConfig;

use sprig_core::SprigResult;

/// Lookup-only entry point; same as [`Dom::select`].
pub fn select<'a>(dom: &Dom, query: impl Into<Query<'a>>) -> SprigResult<Selection> {
    dom.select(query)
}
