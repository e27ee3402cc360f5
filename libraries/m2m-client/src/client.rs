//! Main M2M API client.

use crate::auth;
use crate::endpoints::Endpoint;
use crate::error::{M2mClientError, Result};
use crate::token::{AccessToken, Clock, SystemClock};
use crate::transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
use crate::types::{
    ApiRequest, ClientConfig, Credentials, HistoryQuery, HomeDocument, RefreshMode, RequestBody,
};
use crate::validation::validate_response;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Client for the M2M API.
///
/// Owns the account credentials and the cached bearer token. In
/// [`RefreshMode::Refreshing`] the token is fetched on first use and
/// refreshed whenever it has expired; in [`RefreshMode::Eager`] it is
/// fetched once while building the client.
///
/// # Example
///
/// ```ignore
/// use m2m_client::{ClientConfig, Credentials, M2mClient};
///
/// let credentials = Credentials::new("user", "password", "client-id", "client-secret");
/// let client = M2mClient::builder(credentials)
///     .config(ClientConfig::default().with_debug(true))
///     .build()
///     .await?;
///
/// let home = client.home_document().await?;
/// for (rel, link) in home.links() {
///     println!("{} -> {}", rel, link.href);
/// }
/// ```
pub struct M2mClient {
    transport: Arc<dyn Transport>,
    credentials: Credentials,
    config: ClientConfig,
    clock: Arc<dyn Clock>,
    token: Mutex<Option<AccessToken>>,
}

/// Builder for [`M2mClient`].
pub struct M2mClientBuilder {
    credentials: Credentials,
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
    clock: Arc<dyn Clock>,
}

impl M2mClientBuilder {
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a custom transport instead of the default `reqwest` one.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Validate the configuration and create the client.
    ///
    /// In eager mode this performs the token exchange and fails if it does.
    pub async fn build(self) -> Result<M2mClient> {
        let base_url = normalize_url(&self.config.base_url)?;
        let config = ClientConfig {
            base_url,
            ..self.config
        };

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new()?),
        };

        let client = M2mClient {
            transport,
            credentials: self.credentials,
            config,
            clock: self.clock,
            token: Mutex::new(None),
        };

        if client.config.refresh_mode == RefreshMode::Eager {
            client.acquire_token().await?;
        }

        Ok(client)
    }
}

fn normalize_url(url: &str) -> Result<String> {
    if url.is_empty() {
        return Err(M2mClientError::InvalidUrl("URL cannot be empty".into()));
    }

    let url = url.trim_end_matches('/').to_string();
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(M2mClientError::InvalidUrl(
            "URL must start with http:// or https://".into(),
        ));
    }

    Ok(url)
}

impl M2mClient {
    pub fn builder(credentials: Credentials) -> M2mClientBuilder {
        M2mClientBuilder {
            credentials,
            config: ClientConfig::default(),
            transport: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Create a client with the default transport.
    pub async fn connect(credentials: Credentials, config: ClientConfig) -> Result<Self> {
        Self::builder(credentials).config(config).build().await
    }

    /// Normalized API URL.
    pub fn url(&self) -> &str {
        &self.config.base_url
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Snapshot of the cached token, if any.
    pub async fn token(&self) -> Option<AccessToken> {
        self.token.lock().await.clone()
    }

    /// Exchange the stored credentials for a new token and cache it.
    pub async fn acquire_token(&self) -> Result<AccessToken> {
        let mut cached = self.token.lock().await;
        let token = self
            .fetch_token(&self.credentials.username, &self.credentials.password)
            .await?;
        *cached = Some(token.clone());
        Ok(token)
    }

    /// Exchange the given account for a new token and cache it.
    ///
    /// The client id and secret still come from the stored credentials.
    pub async fn acquire_token_with(&self, username: &str, password: &str) -> Result<AccessToken> {
        let mut cached = self.token.lock().await;
        let token = self.fetch_token(username, password).await?;
        *cached = Some(token.clone());
        Ok(token)
    }

    /// Return a valid access token, fetching a new one first if none is
    /// cached or the cached one has expired.
    ///
    /// The cache stays locked across the check and the refresh, so callers
    /// racing on an expired token share a single exchange.
    pub async fn ensure_fresh_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;

        if let Some(token) = cached.as_ref() {
            if !token.is_expired_at(self.clock.now()) {
                return Ok(token.access_token.clone());
            }
            debug!(expires_at = %token.expires_at(), "Access token expired");
        }

        let token = self
            .fetch_token(&self.credentials.username, &self.credentials.password)
            .await?;
        let access_token = token.access_token.clone();
        *cached = Some(token);

        Ok(access_token)
    }

    /// Token exchange without touching the cache.
    async fn fetch_token(&self, username: &str, password: &str) -> Result<AccessToken> {
        debug!(username = %username, "Requesting access token");

        let request =
            auth::token_request(username, password, &self.credentials, &self.config.scope)?;
        let body = self.send_verbatim(request).await.map_err(|e| {
            warn!(error = %e, "Token request failed");
            e
        })?;

        let token = AccessToken::from_response(&body, self.clock.now())?;
        info!(expires_in = token.expires_in, "Access token acquired");

        Ok(token)
    }

    async fn bearer_token(&self) -> Result<String> {
        match self.config.refresh_mode {
            RefreshMode::Refreshing => self.ensure_fresh_token().await,
            RefreshMode::Eager => self
                .token
                .lock()
                .await
                .as_ref()
                .map(|t| t.access_token.clone())
                .ok_or(M2mClientError::NotAuthenticated),
        }
    }

    /// Send a request and return its validated JSON body.
    ///
    /// Without explicit headers a bearer token is attached and the body is
    /// sent as JSON. With explicit headers, headers and body go out as given.
    pub async fn send_request(&self, request: ApiRequest) -> Result<Value> {
        if request.headers.is_some() {
            return self.send_verbatim(request).await;
        }

        let token = self.bearer_token().await?;
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| M2mClientError::Parse(format!("Invalid access token: {}", e)))?;
        headers.insert(AUTHORIZATION, bearer);

        let body = match request.body {
            Some(body) => {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                let value = match body {
                    RequestBody::Json(value) => value,
                    RequestBody::Text(text) => Value::String(text),
                };
                Some(serde_json::to_vec(&value).map_err(|e| {
                    M2mClientError::Parse(format!("Failed to serialize body: {}", e))
                })?)
            }
            None => None,
        };

        self.dispatch(request.method, &request.path, request.params, headers, body, false).await
    }

    /// Send with the request's own headers; never consults the token cache.
    ///
    /// These requests carry credentials (the token exchange form and its
    /// response), so their bodies are never logged.
    async fn send_verbatim(&self, request: ApiRequest) -> Result<Value> {
        let headers = request.headers.unwrap_or_default();
        let body = match request.body {
            Some(RequestBody::Text(text)) => Some(text.into_bytes()),
            Some(RequestBody::Json(value)) => Some(serde_json::to_vec(&value).map_err(|e| {
                M2mClientError::Parse(format!("Failed to serialize body: {}", e))
            })?),
            None => None,
        };

        self.dispatch(request.method, &request.path, request.params, headers, body, true).await
    }

    async fn dispatch(
        &self,
        method: Method,
        path: &str,
        params: Vec<(String, String)>,
        headers: HeaderMap,
        body: Option<Vec<u8>>,
        sensitive: bool,
    ) -> Result<Value> {
        let url = format!("{}{}", self.config.base_url, path);

        debug!(method = %method, url = %url, "Sending request");
        if self.config.debug {
            let body_len = body.as_ref().map_or(0, Vec::len);
            if sensitive {
                debug!(params = ?params, body_len, "Request details (body redacted)");
            } else {
                debug!(
                    params = ?params,
                    body = %body.as_deref().map(String::from_utf8_lossy).unwrap_or_default(),
                    "Request details"
                );
            }
        }

        let response = self
            .transport
            .execute(HttpRequest {
                method,
                url,
                query: params,
                headers,
                body,
            })
            .await?;

        if self.config.debug {
            if sensitive {
                debug!(
                    status = %response.status,
                    body_len = response.body.len(),
                    "Response received (body redacted)"
                );
            } else {
                debug!(status = %response.status, body = %response.text(), "Response received");
            }
        }

        handle_response(response)
    }

    /// Dispatch one of the fixed endpoints.
    pub async fn call(&self, endpoint: Endpoint) -> Result<Value> {
        self.send_request(endpoint.to_request(&self.config.home)).await
    }

    /// Fetch the top-level resource that links to all other resources.
    pub async fn home_document(&self) -> Result<HomeDocument> {
        let body = self.call(Endpoint::HomeDocument).await?;
        serde_json::from_value(body).map_err(|e| {
            M2mClientError::Parse(format!("Failed to parse home document: {}", e))
        })
    }

    /// Check that the API is reachable and the credentials are accepted.
    pub async fn ping(&self) -> Result<()> {
        self.call(Endpoint::Ping).await?;
        Ok(())
    }

    pub async fn device_details(&self, device_id: &str) -> Result<Value> {
        self.call(Endpoint::DeviceDetails {
            device_id: device_id.to_string(),
        })
        .await
    }

    pub async fn device_history(&self, device_id: &str, query: HistoryQuery) -> Result<Value> {
        self.call(Endpoint::DeviceHistory {
            device_id: device_id.to_string(),
            query,
        })
        .await
    }

    pub async fn device_registration(&self, device_id: &str) -> Result<Value> {
        self.call(Endpoint::DeviceRegistration {
            device_id: device_id.to_string(),
        })
        .await
    }
}

/// Parse and validate a raw response.
///
/// For error statuses a specific error found in the body wins over the
/// generic status error.
fn handle_response(response: HttpResponse) -> Result<Value> {
    let status = response.status;
    let parsed = if response.body.iter().all(u8::is_ascii_whitespace) {
        Ok(Value::Null)
    } else {
        serde_json::from_slice::<Value>(&response.body)
    };

    if !status.is_success() {
        if let Ok(body) = parsed {
            match validate_response(body) {
                Ok(_) | Err(M2mClientError::EmptyResponse) => {}
                Err(e) => return Err(e),
            }
        }
        return Err(M2mClientError::Status {
            status: status.as_u16(),
            message: response.text(),
        });
    }

    let body = parsed.map_err(|e| M2mClientError::Parse(format!("Invalid JSON body: {}", e)))?;
    validate_response(body)
}
