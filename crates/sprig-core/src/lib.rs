//! Shared primitives used across Sprig crates.

use core::fmt;

/// Result alias used across the workspace.
pub type SprigResult<T> = Result<T, Error>;

/// Broad failure category. The `code` on [`Error`] narrows it down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The selector string has no segments to resolve.
    EmptySelector,
    /// The selector engine rejected a lookup string.
    SelectorSyntax,
    /// A lookup-only query matched nothing.
    NoMatchFound,
    /// A tree mutation would break the document structure.
    Hierarchy,
    /// URL, DNS, transport, TLS or HTTP framing failure.
    Network,
    /// Content or payload decoding failure.
    Decode,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EmptySelector => "empty-selector",
            Self::SelectorSyntax => "selector-syntax",
            Self::NoMatchFound => "no-match-found",
            Self::Hierarchy => "hierarchy",
            Self::Network => "network",
            Self::Decode => "decode",
        }
    }
}

/// Workspace error: a category, a stable dotted code and a human message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    pub kind: ErrorKind,
    pub code: &'static str,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            code,
            message: message.into(),
        }
    }

    pub fn empty_selector() -> Self {
        Self::new(
            ErrorKind::EmptySelector,
            "query.selector.empty",
            "selector contains no segments",
        )
    }

    pub fn selector_syntax(selector: &str, detail: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::SelectorSyntax,
            "css.selector.syntax",
            format!("`{selector}` is not a valid selector: {detail}"),
        )
    }

    pub fn no_match(selector: &str) -> Self {
        Self::new(
            ErrorKind::NoMatchFound,
            "query.select.no_match",
            format!("no element matches `{selector}`"),
        )
    }

    pub fn network(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, code, message)
    }

    pub fn decode(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Decode, code, message)
    }

    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::Error;
    use super::ErrorKind;

    #[test]
    fn display_uses_code_and_message() {
        let error = Error::no_match("ul li");
        assert_eq!(error.to_string(), "query.select.no_match: no element matches `ul li`");
        assert!(error.is(ErrorKind::NoMatchFound));
    }

    #[test]
    fn syntax_errors_carry_selector_text() {
        let error = Error::selector_syntax("div..x", "empty class name");
        assert_eq!(error.kind, ErrorKind::SelectorSyntax);
        assert!(error.message.contains("div..x"));
        assert_eq!(error.kind.as_str(), "selector-syntax");
    }
}
