//! Request URL parsing and relative path resolution.

use sprig_core::Error;
use sprig_core::SprigResult;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }

    pub fn default_port(self) -> u16 {
        match self {
            Self::Http => 80,
            Self::Https => 443,
        }
    }
}

/// Absolute `http`/`https` URL without credentials or fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceUrl {
    parsed: Url,
    scheme: Scheme,
    host: String,
    port: u16,
}

impl ResourceUrl {
    pub fn parse(input: &str) -> SprigResult<Self> {
        let parsed = Url::parse(input).map_err(|error| {
            Error::network(
                "net.url.invalid",
                format!("failed to parse URL `{input}`: {error}"),
            )
        })?;
        Self::from_url(parsed)
    }

    /// Resolves `reference` against `base` the way a document resolves a
    /// relative link. Absolute references ignore the base.
    pub fn resolve(base: &str, reference: &str) -> SprigResult<Self> {
        let base = Url::parse(base).map_err(|error| {
            Error::network(
                "net.url.base_invalid",
                format!("failed to parse base URL `{base}`: {error}"),
            )
        })?;
        let joined = base.join(reference).map_err(|error| {
            Error::network(
                "net.url.invalid",
                format!("failed to resolve `{reference}` against `{base}`: {error}"),
            )
        })?;
        Self::from_url(joined)
    }

    fn from_url(mut parsed: Url) -> SprigResult<Self> {
        if !parsed.username().is_empty() || parsed.password().is_some() {
            return Err(Error::network(
                "net.url.credentials_disallowed",
                "URL userinfo (`username:password@`) is not allowed",
            ));
        }

        let scheme = match parsed.scheme() {
            "http" => Scheme::Http,
            "https" => Scheme::Https,
            other => {
                return Err(Error::network(
                    "net.url.scheme_unsupported",
                    format!("unsupported scheme `{other}`"),
                ));
            }
        };

        let host = parsed
            .host_str()
            .ok_or_else(|| Error::network("net.url.host_missing", "URL must include a host"))?
            .to_ascii_lowercase();
        let port = parsed.port().unwrap_or_else(|| scheme.default_port());

        // Fragments never go on the wire.
        parsed.set_fragment(None);

        Ok(Self {
            parsed,
            scheme,
            host,
            port,
        })
    }

    pub fn as_str(&self) -> &str {
        self.parsed.as_str()
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn is_secure(&self) -> bool {
        self.scheme == Scheme::Https
    }

    /// `host[:port]`, omitting the scheme's default port.
    pub fn authority(&self) -> String {
        if self.port == self.scheme.default_port() {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    pub fn path_and_query(&self) -> String {
        let path = match self.parsed.path() {
            "" => "/",
            path => path,
        };

        match self.parsed.query() {
            Some(query) => format!("{path}?{query}"),
            None => path.to_owned(),
        }
    }
}
