//! Session-scoped HTTP context shared by every stage of a run.
//!
//! One [`ApiContext`] owns one `reqwest` blocking client bound to the API
//! base URL. It is opened once per run and disposed when dropped, so the
//! connection pool is released on every exit path, including early returns
//! from a failed stage.

use std::cell::Cell;

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::auth::BearerToken;
use crate::config::ApiConfig;
use crate::error::{ChainError, Result};

/// Longest body excerpt carried into error messages.
const BODY_EXCERPT_LEN: usize = 300;

pub struct ApiContext {
    base_url: String,
    http_client: reqwest::blocking::Client,
    requests_sent: Cell<usize>,
}

impl ApiContext {
    /// Open a session against `config.base_url`.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let accept = HeaderValue::from_str(&config.accept).map_err(|e| {
            ChainError::Config(format!("invalid accept header {:?}: {e}", config.accept))
        })?;
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, accept);

        let mut builder = reqwest::blocking::Client::builder()
            .default_headers(headers)
            .user_agent(concat!("hauto-e2e/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| ChainError::Config(format!("HTTP client error: {e}")))?;

        let base_url = config.base_url.trim_end_matches('/').to_string();
        info!(base_url = %base_url, "Opened API session");

        Ok(Self {
            base_url,
            http_client,
            requests_sent: Cell::new(0),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Number of requests issued through this session so far.
    pub fn requests_sent(&self) -> usize {
        self.requests_sent.get()
    }

    /// Absolute URL for an API path; leading slashes on `path` are optional.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// POST `body` as JSON to `path`.
    ///
    /// Any status is returned as-is; callers assert the one they expect.
    pub fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
        bearer: Option<&BearerToken>,
    ) -> Result<ApiResponse> {
        let url = self.url(path);
        let mut request = self.http_client.post(&url).json(body);
        if let Some(token) = bearer {
            request = request.header(AUTHORIZATION, token.header_value());
        }

        debug!(url = %url, authorized = bearer.is_some(), "POST");
        self.requests_sent.set(self.requests_sent.get() + 1);

        let response = request
            .send()
            .map_err(|e| ChainError::Http(format!("POST {url}: {e}")))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .map_err(|e| ChainError::Http(format!("read response from {url}: {e}")))?;

        debug!(url = %url, status, bytes = text.len(), "Response received");

        Ok(ApiResponse::from_text(path, status, &text))
    }

    /// Close the session explicitly. Dropping the context has the same effect.
    pub fn dispose(self) {}
}

impl Drop for ApiContext {
    fn drop(&mut self) {
        info!(
            base_url = %self.base_url,
            requests = self.requests_sent.get(),
            "Disposed API session"
        );
    }
}

/// Status and decoded body of one API call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub path: String,
    pub status: u16,
    /// Parsed JSON body; `Value::Null` for empty bodies, `Value::String`
    /// holding the raw text when the body is not JSON.
    pub body: Value,
}

impl ApiResponse {
    pub fn from_text(path: &str, status: u16, text: &str) -> Self {
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
        };
        Self {
            path: path.to_string(),
            status,
            body,
        }
    }

    /// Fail with [`ChainError::UnexpectedStatus`] unless the status matches.
    pub fn expect_status(&self, expected: u16) -> Result<&Self> {
        if self.status == expected {
            Ok(self)
        } else {
            Err(ChainError::UnexpectedStatus {
                path: self.path.clone(),
                expected,
                actual: self.status,
                body: self.body_excerpt(),
            })
        }
    }

    /// Non-empty string (or numeric) field of a JSON object body.
    pub fn required_field(&self, field: &str) -> Result<String> {
        match self.body.get(field) {
            Some(Value::String(value)) if !value.is_empty() => Ok(value.clone()),
            Some(Value::Number(value)) => Ok(value.to_string()),
            _ => Err(ChainError::MissingField {
                field: field.to_string(),
                path: self.path.clone(),
            }),
        }
    }

    /// Server-issued identifier of the created resource.
    pub fn id(&self) -> Result<String> {
        self.required_field("id")
    }

    pub fn body_excerpt(&self) -> String {
        let raw = match &self.body {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        if raw.chars().count() > BODY_EXCERPT_LEN {
            let cut: String = raw.chars().take(BODY_EXCERPT_LEN).collect();
            format!("{cut}...")
        } else {
            raw
        }
    }
}
