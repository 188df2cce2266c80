//! Networking for Sprig's AJAX helper: URL resolution, a blocking GET
//! client and JSON/text response classification.
//!
//! ```no_run
//! use sprig_net::Ajax;
//! use sprig_net::AjaxConfig;
//!
//! let config = AjaxConfig::with_base_url("https://example.com/app/");
//! let client = config.client();
//! Ajax::get_with(&client, "data/items.json", &config)
//!     .error(|failure| eprintln!("{failure}"))
//!     .success(|payload| println!("{payload:?}"));
//! ```

pub mod ajax;
pub mod client;
pub mod http;
pub mod url;

pub use ajax::Ajax;
pub use ajax::AjaxConfig;
pub use ajax::AjaxFailure;
pub use ajax::AjaxRequest;
pub use ajax::Completion;
pub use ajax::Fetch;
pub use ajax::Payload;
pub use ajax::classify;
pub use client::HttpClient;
pub use client::HttpClientConfig;
pub use http::ContentType;
pub use http::Header;
pub use http::HttpResponse;
pub use crate::url::ResourceUrl;
pub use crate::url::Scheme;
