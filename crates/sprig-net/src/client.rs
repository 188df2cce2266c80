//! Blocking GET client backed by `ureq`.

use crate::ajax::Fetch;
use crate::http::Header;
use crate::http::HttpResponse;
use crate::url::ResourceUrl;
use core::fmt;
use sprig_core::Error;
use sprig_core::SprigResult;
use std::io::Read;
use std::time::Duration;

const ACCEPT: &str = "application/json, text/plain, */*";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpClientConfig {
    pub connect_timeout: Duration,
    pub user_agent: String,
    /// Upper bound on a response body.
    pub max_body_bytes: usize,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("sprig/{}", env!("CARGO_PKG_VERSION")),
            max_body_bytes: 8 * 1024 * 1024,
        }
    }
}

/// Networked [`Fetch`]. Non-2xx responses come back as responses, not
/// errors, so the caller sees their status.
#[derive(Clone)]
pub struct HttpClient {
    agent: ureq::Agent,
    config: HttpClientConfig,
}

impl HttpClient {
    pub fn new(config: HttpClientConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(config.connect_timeout)
            .user_agent(&config.user_agent)
            .build();
        Self { agent, config }
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new(HttpClientConfig::default())
    }
}

impl Fetch for HttpClient {
    fn get(&self, url: &ResourceUrl) -> SprigResult<HttpResponse> {
        let response = match self.agent.get(url.as_str()).set("Accept", ACCEPT).call() {
            Ok(response) | Err(ureq::Error::Status(_, response)) => response,
            Err(ureq::Error::Transport(transport)) => {
                return Err(Error::network(
                    "net.http.transport_failed",
                    format!("GET {} failed: {transport}", url.as_str()),
                ));
            }
        };
        read_response(response, self.config.max_body_bytes)
    }
}

fn read_response(response: ureq::Response, max_body_bytes: usize) -> SprigResult<HttpResponse> {
    let headers: Vec<Header> = response
        .headers_names()
        .into_iter()
        .filter_map(|name| {
            let value = response.header(&name)?.to_owned();
            Some(Header::new(name, value))
        })
        .collect();
    let status = response.status();

    let limit = u64::try_from(max_body_bytes.saturating_add(1)).unwrap_or(u64::MAX);
    let mut body = Vec::new();
    response
        .into_reader()
        .take(limit)
        .read_to_end(&mut body)
        .map_err(|error| {
            Error::network(
                "net.http.read_body_failed",
                format!("failed to read response body: {error}"),
            )
        })?;

    if body.len() > max_body_bytes {
        return Err(Error::network(
            "net.http.body_too_large",
            format!("response body exceeds {max_body_bytes} bytes"),
        ));
    }

    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::read_response;
    use sprig_core::ErrorKind;

    fn parsed(raw: &str) -> ureq::Response {
        match raw.parse::<ureq::Response>() {
            Ok(response) => response,
            Err(error) => panic!("{error}"),
        }
    }

    #[test]
    fn keeps_status_headers_and_body() {
        let raw = "HTTP/1.1 404 Not Found\r\nContent-Type: text/plain\r\n\r\nmissing";
        let response = match read_response(parsed(raw), 1024) {
            Ok(response) => response,
            Err(error) => panic!("{error}"),
        };

        assert_eq!(response.status, 404);
        assert_eq!(response.header("content-type"), Some("text/plain"));
        assert_eq!(response.body, b"missing");
    }

    #[test]
    fn oversized_bodies_are_rejected() {
        let raw = "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\n\r\n0123456789";
        let result = read_response(parsed(raw), 4);
        assert!(result.is_err_and(|error| {
            error.is(ErrorKind::Network) && error.code == "net.http.body_too_large"
        }));
    }
}
