//! HTTP client for the claim-review API.
//!
//! A client is either anonymous (login/register) or bound to one bearer token
//! at construction time. The token is installed as a default header, so every
//! request issued through an authenticated client carries it; switching
//! identity means building a new client.

mod error;

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

pub use self::error::{ApiError, ApiErrorKind, ApiResult};
use crate::config::Config;
use crate::models::{
    AnalysisResult, HistoryEntry, LoginRequest, RegisterRequest, TokenResponse, User,
};
use crate::workflow::CompleteUpload;

/// User-Agent sent with every request.
pub const USER_AGENT: &str = concat!("claimdesk/", env!("CARGO_PKG_VERSION"));

const LOGIN_PATH: &str = "/api/auth/login";
const REGISTER_PATH: &str = "/api/auth/register";
const ME_PATH: &str = "/api/auth/me";
const ANALYZE_PATH: &str = "/api/claims/analyze";
const HISTORY_PATH: &str = "/api/claims/history";

pub const EMPTY_ID_MESSAGE: &str = "Analysis id must not be empty.";
const CLAIMS_PATH: &str = "/api/claims";

/// Connection settings resolved from config + env.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiSettings {
    /// Origin without trailing slash.
    pub base_url: String,
    pub timeout: Option<Duration>,
}

impl ApiSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: None,
        }
    }

    /// # Errors
    /// Returns an error if the configured origin is invalid.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            base_url: config.effective_api_base_url()?,
            timeout: config.request_timeout(),
        })
    }
}

/// Claim-review API client.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    /// Client without credentials (login, register).
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn anonymous(settings: &ApiSettings) -> Result<Self> {
        Self::build(settings, None)
    }

    /// Client that sends `Authorization: Bearer <token>` on every request.
    ///
    /// # Errors
    /// Returns an error if the token is not a valid header value or the HTTP
    /// client cannot be built.
    pub fn with_token(settings: &ApiSettings, token: &str) -> Result<Self> {
        Self::build(settings, Some(token))
    }

    fn build(settings: &ApiSettings, token: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .context("Session token contains invalid header characters")?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let mut builder = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers);
        if let Some(timeout) = settings.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build().context("Failed to build HTTP client")?,
            base_url: settings.base_url.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// # Errors
    /// Returns an `ApiError` on transport failure, a non-2xx status or an
    /// unexpected body.
    pub async fn login(&self, request: &LoginRequest) -> ApiResult<TokenResponse> {
        self.post_json(LOGIN_PATH, request, "login response").await
    }

    /// # Errors
    /// Returns an `ApiError` on transport failure, a non-2xx status or an
    /// unexpected body.
    pub async fn register(&self, request: &RegisterRequest) -> ApiResult<TokenResponse> {
        self.post_json(REGISTER_PATH, request, "registration response")
            .await
    }

    /// Resolves the user owning the client's token.
    ///
    /// # Errors
    /// Returns an `ApiError`; a rejected token is a 401 `Status` error.
    pub async fn current_user(&self) -> ApiResult<User> {
        let builder = self.http.get(self.endpoint(ME_PATH));
        self.send(builder, "current user").await
    }

    /// Uploads the four documents and returns the backend's decision.
    ///
    /// # Errors
    /// Returns an `ApiError` if the multipart body cannot be built or the
    /// request fails.
    pub async fn analyze(&self, upload: &CompleteUpload) -> ApiResult<AnalysisResult> {
        let form = upload.to_form()?;
        tracing::info!(
            files = ?upload.file_names(),
            total_bytes = upload.total_bytes(),
            "submitting claim for analysis"
        );
        let builder = self.http.post(self.endpoint(ANALYZE_PATH)).multipart(form);
        self.send(builder, "analysis result").await
    }

    /// Past analyses, in server order.
    ///
    /// # Errors
    /// Returns an `ApiError` on transport failure, a non-2xx status or an
    /// unexpected body.
    pub async fn history(&self) -> ApiResult<Vec<HistoryEntry>> {
        let builder = self.http.get(self.endpoint(HISTORY_PATH));
        self.send(builder, "claim history").await
    }

    /// A single past analysis by id.
    ///
    /// # Errors
    /// Returns an `ApiError` for an empty id, a failed request, or a body that
    /// is not a single analysis.
    pub async fn claim(&self, id: &str) -> ApiResult<HistoryEntry> {
        if id.trim().is_empty() {
            return Err(ApiError::setup(&"empty analysis id").with_detail(EMPTY_ID_MESSAGE));
        }
        let mut url = Url::parse(&self.endpoint(CLAIMS_PATH))
            .map_err(|e| ApiError::parse("claim URL", &e))?;
        url.path_segments_mut()
            .map_err(|()| ApiError::parse("claim URL", &"base URL cannot have a path"))?
            .push(id);
        let builder = self.http.get(url);
        // Collection routes share the prefix (`/api/claims/history`) and answer with a list.
        let body: Value = self.send(builder, "claim").await?;
        if body.is_array() {
            return Err(ApiError::parse("claim", &"expected one analysis, got a list")
                .with_detail(format!("'{id}' is not an analysis id.")));
        }
        serde_json::from_value(body).map_err(|e| ApiError::parse("claim", &e))
    }

    async fn post_json<B, T>(&self, path: &str, body: &B, what: &str) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.http.post(self.endpoint(path)).json(body);
        self.send(builder, what).await
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder, what: &str) -> ApiResult<T> {
        let response = builder.send().await.map_err(|e| {
            tracing::warn!(error = %e, what, "request failed before a response");
            ApiError::transport(&e)
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| ApiError::transport(&e))?;

        if !status.is_success() {
            let err = ApiError::from_status(status.as_u16(), &body);
            tracing::warn!(status = status.as_u16(), what, error = %err, "request rejected");
            return Err(err);
        }

        tracing::debug!(status = status.as_u16(), what, "request succeeded");
        serde_json::from_str(&body).map_err(|e| ApiError::parse(what, &e))
    }
}
