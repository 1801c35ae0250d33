//! Password login against `/api/v1/login`.
//!
//! The API has no refresh endpoint in use here. A "refreshed" token is a
//! second call to [`login`] made after the workspace exists, so the new
//! token carries the permissions granted by creating it.

use std::fmt;

use serde::Serialize;
use tracing::info;

use crate::client::{ApiContext, ApiResponse};
use crate::config::CredentialsConfig;
use crate::error::{ChainError, Result};

pub const LOGIN_PATH: &str = "/api/v1/login";

/// Account used to authenticate a run.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    pub org_id: String,
}

impl Credentials {
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        org_id: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            org_id: org_id.into(),
        }
    }
}

impl TryFrom<&CredentialsConfig> for Credentials {
    type Error = ChainError;

    fn try_from(config: &CredentialsConfig) -> Result<Self> {
        if config.email.trim().is_empty() {
            return Err(ChainError::MissingConfig(
                "credentials.email (or HAUTO_EMAIL)".to_string(),
            ));
        }
        if config.password.is_empty() {
            return Err(ChainError::MissingConfig(
                "credentials.password (or HAUTO_PASSWORD)".to_string(),
            ));
        }
        Ok(Self::new(&config.email, &config.password, &config.org_id))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"********")
            .field("org_id", &self.org_id)
            .finish()
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
    org_id: &'a str,
}

/// Opaque access token sent as `Authorization: bearer {token}`.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value of the `Authorization` header. The lowercase scheme is what the
    /// API has always been sent.
    pub fn header_value(&self) -> String {
        format!("bearer {}", self.0)
    }

    /// First characters of the token, safe for logs and reports.
    pub fn masked(&self) -> String {
        let visible: String = self.0.chars().take(6).collect();
        if self.0.chars().count() > 6 {
            format!("{visible}...")
        } else {
            "******".to_string()
        }
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BearerToken({})", self.masked())
    }
}

impl fmt::Display for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}

/// POST the credentials and return the raw response.
pub fn login_response(ctx: &ApiContext, credentials: &Credentials) -> Result<ApiResponse> {
    let request = LoginRequest {
        email: &credentials.email,
        password: &credentials.password,
        org_id: &credentials.org_id,
    };
    ctx.post_json(LOGIN_PATH, &request, None)
}

/// Extract `access_token` from a login response.
pub fn bearer_from_response(response: &ApiResponse) -> Result<BearerToken> {
    response
        .required_field("access_token")
        .map(BearerToken::new)
        .map_err(|_| {
            ChainError::Auth(format!(
                "login returned status {} without access_token: {}",
                response.status,
                response.body_excerpt()
            ))
        })
}

/// Log in and return the bearer token.
pub fn login(ctx: &ApiContext, credentials: &Credentials) -> Result<BearerToken> {
    let response = login_response(ctx, credentials)?;
    let token = bearer_from_response(&response)?;
    info!(email = %credentials.email, token = %token, "Logged in");
    Ok(token)
}
