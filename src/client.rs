//! Authenticated request executor
//!
//! `GarminClient::request` is the only I/O primitive offered to the data
//! layer. Every call makes sure the session is authenticated, then sends the
//! request with the bearer token. A 401 on the first attempt triggers one
//! refresh-or-relogin; 429 and 5xx are retried with exponential backoff.

use crate::auth::{LoginCredentials, MfaPrompt, Session};
use crate::config::{ClientConfig, Endpoints, USER_AGENT_MOBILE};
use crate::error::AppError;
use crate::http::api_client;
use crate::retry::{RetryDecision, RetryPolicy};
use crate::utils::resolve_endpoint;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::{Method, Request};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

/// Method, body and extra headers for one API call
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<Value>,
    /// Sent as-is and override the defaults on name clash
    pub headers: Vec<(String, String)>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            body: None,
            headers: Vec::new(),
        }
    }
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post(body: Value) -> Self {
        Self {
            method: Method::POST,
            body: Some(body),
            headers: Vec::new(),
        }
    }

    pub fn put(body: Value) -> Self {
        Self {
            method: Method::PUT,
            body: Some(body),
            headers: Vec::new(),
        }
    }

    pub fn delete() -> Self {
        Self {
            method: Method::DELETE,
            ..Self::default()
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Authenticated Garmin Connect client
pub struct GarminClient {
    session: Session,
    http: reqwest::Client,
    endpoints: Endpoints,
    retry: RetryPolicy,
}

impl GarminClient {
    /// Client configured from the environment (see [`ClientConfig::from_env`])
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        mfa_prompt: Option<MfaPrompt>,
    ) -> Result<Self, AppError> {
        Self::with_config(
            LoginCredentials::new(email, password),
            mfa_prompt,
            ClientConfig::from_env()?,
        )
    }

    pub fn with_config(
        credentials: LoginCredentials,
        mfa_prompt: Option<MfaPrompt>,
        config: ClientConfig,
    ) -> Result<Self, AppError> {
        let http = api_client(config.timeout)?;
        let endpoints = config.endpoints.clone();
        let retry = config.retry;
        let session = Session::new(credentials, mfa_prompt, http.clone(), config)?;

        Ok(Self {
            session,
            http,
            endpoints,
            retry,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Display name of the account, empty until the first authentication
    pub fn display_name(&self) -> String {
        self.session.display_name()
    }

    /// Numeric profile id of the account, zero until the first authentication
    pub fn user_profile_pk(&self) -> u64 {
        self.session.user_profile_pk()
    }

    /// Authenticate without issuing a data request
    pub async fn login(&self) -> Result<(), AppError> {
        self.session.ensure_authenticated().await.map(|_| ())
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, AppError> {
        self.request(endpoint, RequestOptions::get()).await
    }

    /// Send an authenticated request and deserialize the JSON response.
    /// Empty bodies deserialize from `null`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<T, AppError> {
        let url = resolve_endpoint(self.endpoints.api_root(), endpoint);
        let mut token = self.session.ensure_authenticated().await?;

        for attempt in 0..=self.retry.max_retries {
            let request = build_request(&self.http, &url, &token, &options)?;
            debug!("{} {} (attempt {})", options.method, url, attempt);

            let response = self.http.execute(request).await?;
            let status = response.status();
            let body = response.text().await?;

            if status.is_success() {
                return parse_body(&body);
            }

            match self.retry.decide(attempt, status) {
                RetryDecision::Reauthenticate => {
                    warn!("Got 401, refreshing token...");
                    token = self.session.refresh_or_relogin(&token).await?;
                }
                RetryDecision::Backoff(delay) => {
                    warn!(
                        "Got {}, retrying in {}ms (attempt {}/{})",
                        status.as_u16(),
                        delay.as_millis(),
                        attempt + 1,
                        self.retry.max_retries
                    );
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::GiveUp => return Err(AppError::http(status, body)),
            }
        }

        Err(AppError::MaxRetriesExceeded)
    }
}

/// Assemble one authenticated request. Caller headers win over the
/// defaults; JSON content type is added only for requests with a body.
pub fn build_request(
    http: &reqwest::Client,
    url: &str,
    access_token: &str,
    options: &RequestOptions,
) -> Result<Request, AppError> {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, header_value(&format!("Bearer {}", access_token))?);
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_MOBILE));

    for (name, value) in &options.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| AppError::InvalidInput(format!("Invalid header name: {}", name)))?;
        headers.insert(name, header_value(value)?);
    }

    let mut builder = http.request(options.method.clone(), url);
    if let Some(body) = &options.body {
        if !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        builder = match body {
            Value::String(raw) => builder.body(raw.clone()),
            other => builder.body(serde_json::to_vec(other)?),
        };
    }

    builder
        .headers(headers)
        .build()
        .map_err(|e| AppError::InvalidInput(format!("Invalid request: {}", e)))
}

fn header_value(value: &str) -> Result<HeaderValue, AppError> {
    HeaderValue::from_str(value)
        .map_err(|_| AppError::InvalidInput("Header value contains invalid characters".to_string()))
}

fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T, AppError> {
    if body.trim().is_empty() {
        return Ok(serde_json::from_value(Value::Null)?);
    }
    Ok(serde_json::from_str(body)?)
}
