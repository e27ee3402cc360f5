//! Types for M2M API requests and responses.

use reqwest::header::HeaderMap;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Production API host.
pub const DEFAULT_API_URL: &str = "https://api.m2m.vodafone.com";

/// Path of the OAuth2 token endpoint.
pub const TOKEN_PATH: &str = "/m2m/v1/oauth2/access-token";

/// Prefix shared by every M2M resource path.
pub const API_PREFIX: &str = "/m2m/v1";

// =============================================================================
// Configuration Types
// =============================================================================

/// Account credentials for the client-credentials exchange.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    /// Application consumer key obtained from the operator
    pub client_id: String,
    /// Application consumer secret obtained from the operator
    pub client_secret: String,
}

impl Credentials {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// How the client obtains its bearer token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshMode {
    /// Fetch lazily on first use and refresh whenever the token has expired.
    #[default]
    Refreshing,
    /// Fetch once while building the client and reuse it as is.
    Eager,
}

/// Client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    /// Base URL of the API (e.g., "https://api.m2m.vodafone.com")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Log request and response bodies
    #[serde(default)]
    pub debug: bool,

    /// Scope sent with the token request
    #[serde(default)]
    pub scope: String,

    /// Resource under `/m2m/v1` serving the home document
    #[serde(default = "default_home")]
    pub home: String,

    #[serde(default)]
    pub refresh_mode: RefreshMode,
}

impl ClientConfig {
    /// Create a config pointing at the given API URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn with_home(mut self, home: impl Into<String>) -> Self {
        self.home = home.into();
        self
    }

    pub fn with_refresh_mode(mut self, refresh_mode: RefreshMode) -> Self {
        self.refresh_mode = refresh_mode;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            debug: false,
            scope: String::new(),
            home: default_home(),
            refresh_mode: RefreshMode::default(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_home() -> String {
    "devices".to_string()
}

// =============================================================================
// Request Types
// =============================================================================

/// Body of an [`ApiRequest`].
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Serialized as JSON
    Json(serde_json::Value),
    /// Sent as is (e.g. a form-encoded string)
    Text(String),
}

/// One call against the API, relative to the configured base URL.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub params: Vec<(String, String)>,
    /// When set, sent verbatim and no bearer token is attached
    pub headers: Option<HeaderMap>,
    pub body: Option<RequestBody>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: Vec::new(),
            headers: None,
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.body = Some(RequestBody::Text(body.into()));
        self
    }
}

// =============================================================================
// Device Types
// =============================================================================

/// Optional filters for the device history endpoint.
#[derive(Debug, Clone, Default)]
pub struct HistoryQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page_size: Option<u32>,
    pub page_number: Option<u32>,
}

impl HistoryQuery {
    /// Query parameters in the vendor's naming.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(start) = &self.start_date {
            params.push(("startDate".to_string(), start.clone()));
        }
        if let Some(end) = &self.end_date {
            params.push(("endDate".to_string(), end.clone()));
        }
        if let Some(size) = self.page_size {
            params.push(("pageSize".to_string(), size.to_string()));
        }
        if let Some(number) = self.page_number {
            params.push(("pageNumber".to_string(), number.to_string()));
        }
        params
    }
}

// =============================================================================
// Home Document Types
// =============================================================================

/// A link advertised by the home document.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Link {
    pub href: String,
    pub method: Option<String>,
    pub template: Option<String>,
    #[serde(rename = "type")]
    pub media_type: Option<String>,
}

/// Top-level resource listing URIs to all other resources.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HomeDocument {
    #[serde(default)]
    pub links: BTreeMap<String, Link>,
}

impl HomeDocument {
    pub fn links(&self) -> &BTreeMap<String, Link> {
        &self.links
    }

    /// Look up a link by relation; surrounding whitespace in the relation
    /// name is ignored since the API publishes some with a trailing space.
    pub fn link(&self, rel: &str) -> Option<&Link> {
        let rel = rel.trim();
        self.links
            .iter()
            .find(|(key, _)| key.trim() == rel)
            .map(|(_, link)| link)
    }
}
