//! Response data handed from a [`Fetch`](crate::Fetch) to classification.

/// Single response header. Names compare ASCII case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<Header>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push(Header::new(name, value));
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|header| header.name.eq_ignore_ascii_case(name))
            .map(|header| header.value.as_str())
    }

    pub fn content_type(&self) -> Option<ContentType> {
        self.header("content-type").map(ContentType::parse)
    }
}

/// Parsed `Content-Type` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// The raw header value.
    pub raw: String,
    /// Lowercased `type/subtype`.
    pub mime: String,
    pub charset: Option<String>,
}

impl ContentType {
    pub fn parse(raw: &str) -> Self {
        let mut parts = raw.split(';');
        let mime = parts
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        let charset = parts.find_map(|parameter| {
            let (name, value) = parameter.split_once('=')?;
            name.trim()
                .eq_ignore_ascii_case("charset")
                .then(|| value.trim().trim_matches('"').to_owned())
        });

        Self {
            raw: raw.to_owned(),
            mime,
            charset,
        }
    }

    /// Substring match on `application/json`, ignoring ASCII case.
    pub fn is_json(&self) -> bool {
        self.raw.to_ascii_lowercase().contains("application/json")
    }
}
