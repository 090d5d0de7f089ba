//! Terminus API client.
//!
//! This crate provides a lightweight client for the platform REST API. It
//! focuses on:
//!
//! - Constructing an HTTP client with sensible defaults
//! - Discovering the signed-in session from the environment or the cache dir
//! - Validating the configured API host for safety
//! - Decoding JSON responses with useful errors
//!
//! The primary entry point is [`TerminusClient`]. It implements
//! [`ApiTransport`], the read seam used by the workflow poller.
//!
//! # Example
//!
//! ```ignore
//! use terminus_api::{ApiTransport, TerminusClient};
//! use terminus_util::TerminusConfig;
//!
//! async fn show(site_id: &str) -> anyhow::Result<()> {
//!     let client = TerminusClient::from_config(&TerminusConfig::load()?)?;
//!     let workflows = client.get_json(&format!("sites/{site_id}/workflows"), &[]).await?;
//!     println!("{workflows}");
//!     Ok(())
//! }
//! ```

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Url, header};
use serde_json::Value;
use terminus_util::{TerminusConfig, redact_sensitive};
use tracing::debug;

pub mod error;
pub mod response;
pub mod session;
pub mod transport;

pub use error::ApiError;
pub use session::Session;
pub use transport::{ApiTransport, HYDRATE_OPERATION_LOGS};

/// Allowed hostnames or base domains for non-local API hosts. Subdomains of
/// these domains are also allowed.
const ALLOWED_DOMAINS: &[&str] = &["pantheon.io", "getpantheon.com"];
/// Hostnames allowed for local development regardless of scheme.
const LOCALHOST_DOMAINS: &[&str] = &["localhost", "127.0.0.1"];

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Thin wrapper around a configured `reqwest::Client` for platform API access.
#[derive(Debug, Clone)]
pub struct TerminusClient {
    base_url: String,
    http: Client,
    user_agent: String,
    session: Option<Session>,
}

impl TerminusClient {
    /// Construct a client from resolved configuration, discovering the session
    /// from the environment or the configured cache directory.
    pub fn from_config(config: &TerminusConfig) -> Result<Self, ApiError> {
        let session = Session::discover(&config.cache_dir());
        Self::new(&config.host, session)
    }

    /// Construct a client against `base_url` with an optional session.
    ///
    /// Non-localhost hosts must use HTTPS and belong to an allowed platform
    /// domain.
    pub fn new(base_url: &str, session: Option<Session>) -> Result<Self, ApiError> {
        let base_url = normalize_base_url(base_url);
        validate_base_url(&base_url)?;

        let mut default_headers = header::HeaderMap::new();
        default_headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        if let Some(session) = &session {
            let mut authorization = header::HeaderValue::from_str(&format!("Bearer {}", session.session))?;
            authorization.set_sensitive(true);
            default_headers.insert(header::AUTHORIZATION, authorization);
        }

        let http = Client::builder()
            .default_headers(default_headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(ApiError::Client)?;

        Ok(Self {
            base_url,
            http,
            user_agent: format!("terminus-rs/{}; {}", env!("CARGO_PKG_VERSION"), env::consts::OS),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Id of the signed-in user, needed to address organization resources.
    pub fn current_user_id(&self) -> Option<&str> {
        self.session.as_ref().map(Session::user_id)
    }

    /// Build a `reqwest::RequestBuilder` for a method and API-relative path.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path.trim_start_matches('/'));
        debug!(%url, %method, "building request");

        self.http
            .request(method, url)
            .header(header::USER_AGENT, &self.user_agent)
    }

    /// GET `path` and decode the JSON body.
    pub async fn fetch_json(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, ApiError> {
        let mut builder = self.request(Method::GET, path);
        if !query.is_empty() {
            builder = builder.query(query);
        }

        let response = builder.send().await.map_err(ApiError::Network)?;
        let status = response.status();
        let text = response.text().await.map_err(ApiError::Network)?;
        debug!(%status, path, body_len = text.len(), "received response");

        if !status.is_success() {
            let message = response::describe_error_response(status, &text);
            debug!(%status, message = %redact_sensitive(&message), "request failed");
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response::decode_body(path, status, &text)?)
    }
}

#[async_trait]
impl ApiTransport for TerminusClient {
    async fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, ApiError> {
        self.fetch_json(path, query).await
    }
}

fn normalize_base_url(base: &str) -> String {
    let trimmed = base.trim();
    if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    }
}

/// Validate that a base URL is acceptable for use by the client.
///
/// Rules:
/// - `localhost` or `127.0.0.1`: any scheme is allowed
/// - otherwise: scheme must be HTTPS, and host must be one of the allowed
///   platform domains or a subdomain thereof
fn validate_base_url(base: &str) -> Result<(), ApiError> {
    let invalid = |reason: String| ApiError::InvalidBaseUrl {
        url: base.to_string(),
        reason,
    };
    let parsed_base_url = Url::parse(base).map_err(|error| invalid(error.to_string()))?;

    let host_name = parsed_base_url
        .host_str()
        .ok_or_else(|| invalid("the URL must include a host".into()))?;

    if LOCALHOST_DOMAINS
        .iter()
        .any(|&allowed| host_name.eq_ignore_ascii_case(allowed))
    {
        return Ok(());
    }

    if parsed_base_url.scheme() != "https" {
        return Err(invalid(format!(
            "non-localhost hosts must use https; got '{}://'",
            parsed_base_url.scheme()
        )));
    }

    let is_allowed_domain = ALLOWED_DOMAINS.iter().any(|&allowed_domain| {
        host_name.eq_ignore_ascii_case(allowed_domain) || host_name.to_ascii_lowercase().ends_with(&format!(".{allowed_domain}"))
    });
    if !is_allowed_domain {
        return Err(invalid(format!(
            "host '{host_name}' is not allowed; must be one of {ALLOWED_DOMAINS:?} or a subdomain, or localhost"
        )));
    }

    Ok(())
}
