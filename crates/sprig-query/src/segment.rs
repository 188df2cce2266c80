//! Selector micro-grammar: whitespace-separated segments of `tag#id.class`.

use sprig_core::Error;
use sprig_core::SprigResult;

/// Tag names created in the SVG namespace.
pub const SVG_TAGS: [&str; 8] = [
    "svg", "circle", "ellipse", "line", "path", "polyline", "polygon", "rect",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Id(String),
    Class(String),
    Tag(String),
    SvgTag(String),
}

/// One nesting level of a selector string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// The raw segment text, used verbatim for the existing-node lookup.
    pub source: String,
    pub tokens: Vec<Token>,
}

impl Segment {
    pub fn tag(&self) -> Option<&Token> {
        self.tokens
            .iter()
            .find(|token| matches!(token, Token::Tag(_) | Token::SvgTag(_)))
    }
}

/// Splits `selector` into segments. Malformed pieces are kept as
/// best-effort names; only an input without any segment is rejected.
pub fn parse(selector: &str) -> SprigResult<Vec<Segment>> {
    let segments: Vec<Segment> = selector.split_whitespace().map(parse_segment).collect();
    if segments.is_empty() {
        return Err(Error::empty_selector());
    }
    Ok(segments)
}

fn parse_segment(source: &str) -> Segment {
    let mut tokens = Vec::new();

    let tag_end = source.find(['#', '.']).unwrap_or(source.len());
    let tag = &source[..tag_end];
    if !tag.is_empty() {
        tokens.push(if SVG_TAGS.contains(&tag) {
            Token::SvgTag(tag.to_owned())
        } else {
            Token::Tag(tag.to_owned())
        });
    }

    // An id token runs to the next `.` and keeps only the text before any
    // further `#`, so `#a#b` names the id `a`. A class runs to `#` or `.`.
    let mut rest = &source[tag_end..];
    while let Some(marker) = rest.chars().next() {
        let body = &rest[marker.len_utf8()..];
        let (end, token) = if marker == '#' {
            let end = body.find('.').unwrap_or(body.len());
            let name = body[..end].split('#').next().unwrap_or_default();
            (end, (!name.is_empty()).then(|| Token::Id(name.to_owned())))
        } else {
            let end = body.find(['#', '.']).unwrap_or(body.len());
            let name = &body[..end];
            (end, (!name.is_empty()).then(|| Token::Class(name.to_owned())))
        };

        tokens.extend(token);
        rest = &body[end..];
    }

    Segment {
        source: source.to_owned(),
        tokens,
    }
}

#[cfg(test)]
mod tests {
    use super::Token;
    use super::parse;
    use sprig_core::ErrorKind;

    #[test]
    fn tokenizes_compound_segments_in_order() {
        let segments = match parse("div.card#main.wide") {
            Ok(segments) => segments,
            Err(error) => panic!("{error}"),
        };
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].source, "div.card#main.wide");
        assert_eq!(
            segments[0].tokens,
            vec![
                Token::Tag("div".to_owned()),
                Token::Class("card".to_owned()),
                Token::Id("main".to_owned()),
                Token::Class("wide".to_owned()),
            ]
        );
    }

    #[test]
    fn splits_nesting_on_any_whitespace() {
        let segments = match parse("  ul\tli.item \n a ") {
            Ok(segments) => segments,
            Err(error) => panic!("{error}"),
        };
        let sources: Vec<&str> = segments
            .iter()
            .map(|segment| segment.source.as_str())
            .collect();
        assert_eq!(sources, ["ul", "li.item", "a"]);
    }

    #[test]
    fn svg_names_are_flagged() {
        let segments = match parse("svg circle.dot Rect g") {
            Ok(segments) => segments,
            Err(error) => panic!("{error}"),
        };
        assert_eq!(segments[0].tag(), Some(&Token::SvgTag("svg".to_owned())));
        assert_eq!(segments[1].tag(), Some(&Token::SvgTag("circle".to_owned())));
        assert_eq!(segments[2].tag(), Some(&Token::Tag("Rect".to_owned())));
        assert_eq!(segments[3].tag(), Some(&Token::Tag("g".to_owned())));
    }

    #[test]
    fn tagless_and_malformed_segments_are_tolerated() {
        let segments = match parse("#only ..x .") {
            Ok(segments) => segments,
            Err(error) => panic!("{error}"),
        };
        assert_eq!(segments[0].tag(), None);
        assert_eq!(segments[0].tokens, vec![Token::Id("only".to_owned())]);
        assert_eq!(segments[1].tokens, vec![Token::Class("x".to_owned())]);
        assert!(segments[2].tokens.is_empty());
    }

    #[test]
    fn repeated_ids_keep_the_first_name() {
        let segments = match parse("div#a#b.c") {
            Ok(segments) => segments,
            Err(error) => panic!("{error}"),
        };
        assert_eq!(
            segments[0].tokens,
            vec![
                Token::Tag("div".to_owned()),
                Token::Id("a".to_owned()),
                Token::Class("c".to_owned()),
            ]
        );
    }

    #[test]
    fn blank_input_is_an_empty_selector() {
        for blank in ["", "   ", "\n\t"] {
            assert!(parse(blank).is_err_and(|error| error.kind == ErrorKind::EmptySelector));
        }
    }
}
