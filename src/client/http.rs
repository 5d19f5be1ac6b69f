//! HTTP transport for vendor verification endpoints.
//!
//! The verifier talks to vendors through the [`Transport`] trait so the
//! request sequences can be exercised against canned responses. The
//! production implementation, [`ReqwestTransport`], uses a blocking reqwest
//! client and captures every cookie the vendor sets during the exchange,
//! including cookies set on redirect hops.

use crate::config::PanelwardenConfig;
use crate::PanelwardenError;
use reqwest::blocking::Client;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{COOKIE, USER_AGENT};
use reqwest::Url;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// HTTP method of a vendor request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Fetch a page.
    Get,
    /// Submit a url-encoded form.
    Post,
}

/// A single request to a vendor endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL.
    pub url: String,
    /// Url-encoded form fields (POST only).
    pub form: Vec<(String, String)>,
    /// Cookies to send, as `(name, value)`.
    pub cookies: Vec<(String, String)>,
}

impl VendorRequest {
    /// An anonymous GET.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            form: Vec::new(),
            cookies: Vec::new(),
        }
    }

    /// A form POST.
    pub fn post_form(url: impl Into<String>, form: &[(&str, &str)]) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            form: form
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            cookies: Vec::new(),
        }
    }

    /// Attach a cookie.
    pub fn with_cookie(mut self, name: &str, value: &str) -> Self {
        self.cookies.push((name.to_string(), value.to_string()));
        self
    }

    /// Value of a form field, if present.
    pub fn form_value(&self, name: &str) -> Option<&str> {
        lookup(&self.form, name)
    }

    /// Value of an attached cookie, if present.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        lookup(&self.cookies, name)
    }
}

/// A vendor response with the cookies it set and its text body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VendorResponse {
    /// HTTP status code.
    pub status: u16,
    /// Cookies set by the vendor during the exchange, as `(name, value)`.
    pub cookies: Vec<(String, String)>,
    /// Decoded text body.
    pub body: String,
}

impl VendorResponse {
    /// Value of a cookie the vendor set, if any.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        lookup(&self.cookies, name)
    }
}

fn lookup<'a>(pairs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    pairs
        .iter()
        .rev()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

/// Sends vendor requests.
///
/// Implementations must bound every call with a timeout and report
/// connection failures and timeouts as [`PanelwardenError::Transport`].
pub trait Transport: Send + Sync {
    /// Perform one request/response exchange.
    fn send(&self, request: &VendorRequest) -> Result<VendorResponse, PanelwardenError>;
}

/// Blocking reqwest transport.
///
/// Every call to [`Transport::send`] builds a fresh client with its own
/// cookie jar. Nothing is shared between exchanges, so a check never sees
/// another check's cookies.
pub struct ReqwestTransport {
    user_agent: String,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Create a transport from config.
    pub fn new(config: &PanelwardenConfig) -> Result<Self, PanelwardenError> {
        let transport = Self {
            user_agent: build_user_agent(),
            timeout: config.request_timeout,
        };
        // Surface TLS backend problems at startup rather than on the first check.
        transport.client(Arc::new(Jar::default()))?;
        Ok(transport)
    }

    /// Request timeout in effect.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    // The cookie provider is fixed at build time, so each exchange gets its
    // own client and jar. That costs a connection pool and a runtime thread
    // per request; checks are serial and human-paced, so it is not pooled.
    fn client(&self, jar: Arc<Jar>) -> Result<Client, PanelwardenError> {
        Client::builder()
            .timeout(self.timeout)
            .cookie_provider(jar)
            .build()
            .map_err(|e| PanelwardenError::ConfigError(format!("Failed to build HTTP client: {}", e)))
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: &VendorRequest) -> Result<VendorResponse, PanelwardenError> {
        let url = Url::parse(&request.url).map_err(|e| {
            PanelwardenError::Transport(format!("Invalid URL {}: {}", request.url, e))
        })?;

        let jar = Arc::new(Jar::default());
        let client = self.client(Arc::clone(&jar))?;

        let mut builder = match request.method {
            Method::Get => client.get(url.clone()),
            Method::Post => client.post(url.clone()).form(&request.form),
        };
        builder = builder.header(USER_AGENT, &self.user_agent);
        if !request.cookies.is_empty() {
            builder = builder.header(COOKIE, format_cookie_header(&request.cookies));
        }

        debug!(method = ?request.method, url = %url, "Sending vendor request");

        let response = builder
            .send()
            .map_err(|e| PanelwardenError::Transport(format!("Request to {} failed: {}", url, e)))?;

        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let body = response
            .text()
            .map_err(|e| PanelwardenError::Transport(format!("Failed to read body: {}", e)))?;

        let cookies = jar
            .cookies(&final_url)
            .and_then(|value| value.to_str().ok().map(parse_cookie_header))
            .unwrap_or_default();

        debug!(status, cookies = cookies.len(), bytes = body.len(), "Vendor responded");

        Ok(VendorResponse {
            status,
            cookies,
            body,
        })
    }
}

/// Build the User-Agent string.
///
/// Format: `panelwarden/<version>`
pub fn build_user_agent() -> String {
    format!("panelwarden/{}", env!("CARGO_PKG_VERSION"))
}

/// Render `(name, value)` pairs as a `Cookie` header value.
pub fn format_cookie_header(cookies: &[(String, String)]) -> String {
    cookies
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Parse a `Cookie` header value into `(name, value)` pairs.
pub fn parse_cookie_header(header: &str) -> Vec<(String, String)> {
    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().to_string()))
        })
        .collect()
}
