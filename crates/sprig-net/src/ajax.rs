//! GET helper that classifies a response as JSON or text and hands it to
//! exactly one of a success or an error callback.

use crate::client::HttpClient;
use crate::client::HttpClientConfig;
use crate::http::HttpResponse;
use crate::url::ResourceUrl;
use core::fmt;
use encoding_rs::Encoding;
use encoding_rs::UTF_8;
use sprig_core::Error;
use sprig_core::SprigResult;
use std::time::Duration;

/// Issues one GET. [`HttpClient`] is the networked implementation.
pub trait Fetch {
    fn get(&self, url: &ResourceUrl) -> SprigResult<HttpResponse>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AjaxConfig {
    /// Base for relative request paths.
    pub base_url: Option<String>,
    pub connect_timeout: Duration,
    pub user_agent: String,
    pub max_body_bytes: usize,
}

impl Default for AjaxConfig {
    fn default() -> Self {
        let client = HttpClientConfig::default();
        Self {
            base_url: None,
            connect_timeout: client.connect_timeout,
            user_agent: client.user_agent,
            max_body_bytes: client.max_body_bytes,
        }
    }
}

impl AjaxConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
            ..Self::default()
        }
    }

    pub fn client_config(&self) -> HttpClientConfig {
        HttpClientConfig {
            connect_timeout: self.connect_timeout,
            user_agent: self.user_agent.clone(),
            max_body_bytes: self.max_body_bytes,
        }
    }

    /// Networked client carrying these settings.
    pub fn client(&self) -> HttpClient {
        HttpClient::new(self.client_config())
    }

    fn resolve(&self, path: &str) -> SprigResult<ResourceUrl> {
        if path.trim().is_empty() {
            return Err(Error::network("net.ajax.path_missing", "request path is empty"));
        }

        match &self.base_url {
            Some(base) => ResourceUrl::resolve(base, path),
            None => ResourceUrl::parse(path),
        }
    }
}

/// Successful response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(serde_json::Value),
    Text(String),
}

impl Payload {
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Json(_) => None,
            Self::Text(text) => Some(text),
        }
    }
}

/// What the error callback receives.
#[derive(Debug, Clone, PartialEq)]
pub struct AjaxFailure {
    /// The resolved URL, or the raw path when it could not be resolved.
    pub url: String,
    /// Present when a response arrived.
    pub status: Option<u16>,
    pub error: Error,
}

impl fmt::Display for AjaxFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "GET {} ({status}): {}", self.url, self.error),
            None => write!(f, "GET {}: {}", self.url, self.error),
        }
    }
}

impl std::error::Error for AjaxFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Which callback ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Succeeded,
    Failed,
}

pub struct Ajax;

impl Ajax {
    pub fn get<'a, F: Fetch + ?Sized>(fetcher: &'a F, path: &str) -> AjaxRequest<'a, F> {
        Self::get_with(fetcher, path, &AjaxConfig::default())
    }

    pub fn get_with<'a, F: Fetch + ?Sized>(
        fetcher: &'a F,
        path: &str,
        config: &AjaxConfig,
    ) -> AjaxRequest<'a, F> {
        AjaxRequest {
            fetcher,
            path: path.to_owned(),
            target: config.resolve(path),
            on_error: None,
        }
    }
}

type ErrorCallback<'a> = Box<dyn FnOnce(AjaxFailure) + 'a>;

/// Pending GET. Nothing is sent until [`AjaxRequest::success`] or
/// [`AjaxRequest::send`].
pub struct AjaxRequest<'a, F: Fetch + ?Sized> {
    fetcher: &'a F,
    path: String,
    target: SprigResult<ResourceUrl>,
    on_error: Option<ErrorCallback<'a>>,
}

impl<'a, F: Fetch + ?Sized> AjaxRequest<'a, F> {
    /// Replaces any earlier error callback. Register it before `success`.
    pub fn error(mut self, callback: impl FnOnce(AjaxFailure) + 'a) -> Self {
        self.on_error = Some(Box::new(callback));
        self
    }

    /// Sends the request and runs exactly one callback. Without an error
    /// callback, failures are only logged.
    pub fn success(mut self, callback: impl FnOnce(Payload)) -> Completion {
        let on_error = self.on_error.take();
        match self.send() {
            Ok(payload) => {
                callback(payload);
                Completion::Succeeded
            }
            Err(failure) => {
                if let Some(on_error) = on_error {
                    on_error(failure);
                }
                Completion::Failed
            }
        }
    }

    /// Sends the request and returns the classified outcome.
    pub fn send(self) -> Result<Payload, AjaxFailure> {
        let url = match self.target {
            Ok(url) => url,
            Err(error) => return Err(fail(self.path, None, error)),
        };

        log::debug!("GET {}", url.as_str());
        let response = match self.fetcher.get(&url) {
            Ok(response) => response,
            Err(error) => return Err(fail(url.as_str().to_owned(), None, error)),
        };

        let status = response.status;
        classify(&response).map_err(|error| fail(url.as_str().to_owned(), Some(status), error))
    }
}

impl<F: Fetch + ?Sized> fmt::Debug for AjaxRequest<'_, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AjaxRequest")
            .field("path", &self.path)
            .field("target", &self.target)
            .field("has_error_callback", &self.on_error.is_some())
            .finish()
    }
}

fn fail(url: String, status: Option<u16>, error: Error) -> AjaxFailure {
    let failure = AjaxFailure { url, status, error };
    log::warn!("{failure}");
    failure
}

/// Status 200 is required. JSON content types are parsed, anything else
/// is decoded as text using the declared charset.
pub fn classify(response: &HttpResponse) -> SprigResult<Payload> {
    let status = response.status;
    if status != 200 {
        return Err(Error::network(
            "net.ajax.status_unexpected",
            format!("expected status 200, got {status}"),
        ));
    }

    let content_type = response.content_type();
    if content_type.as_ref().is_some_and(|value| value.is_json()) {
        return serde_json::from_slice(&response.body)
            .map(Payload::Json)
            .map_err(|error| {
                Error::decode(
                    "net.ajax.json_invalid",
                    format!("response declared JSON but failed to parse: {error}"),
                )
            });
    }

    let encoding = content_type
        .and_then(|value| value.charset)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .unwrap_or(UTF_8);
    let (text, _, _) = encoding.decode(&response.body);
    Ok(Payload::Text(text.into_owned()))
}
