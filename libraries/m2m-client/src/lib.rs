//! M2M Client
//!
//! HTTP client library for the Vodafone M2M device management API.
//!
//! # Features
//!
//! - **Authentication**: OAuth2 client-credentials exchange with a cached,
//!   automatically refreshed bearer token
//! - **Requests**: generic `send_request` plus typed device endpoints
//! - **Validation**: vendor error envelopes surfaced as typed errors
//! - **Configuration**: programmatic, or loaded from `m2m.toml` and `M2M_*`
//!   environment variables
//!
//! # Example
//!
//! ```ignore
//! use m2m_client::{M2mClient, Settings};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::load()?;
//!     let client = M2mClient::connect(settings.credentials, settings.api).await?;
//!
//!     let home = client.home_document().await?;
//!     println!("API advertises {} links", home.links().len());
//!
//!     let device = client.device_details("8944100000000000001").await?;
//!     println!("{:#}", device);
//!
//!     Ok(())
//! }
//! ```

mod auth;
mod client;
mod endpoints;
mod error;
mod settings;
mod token;
mod transport;
mod types;
mod validation;

// Re-export main types
pub use client::{M2mClient, M2mClientBuilder};
pub use endpoints::Endpoint;
pub use error::{M2mClientError, Result};
pub use settings::Settings;
pub use token::{AccessToken, Clock, SystemClock};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
pub use types::{
    ApiRequest, ClientConfig, Credentials, HistoryQuery, HomeDocument, Link, RefreshMode,
    RequestBody, API_PREFIX, DEFAULT_API_URL, TOKEN_PATH,
};
pub use validation::validate_response;

// Exposed for callers building their own token requests
pub use auth::{basic_auth_value, token_form};
