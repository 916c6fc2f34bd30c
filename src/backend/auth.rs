//! Opaque auth service calls (signup, verify, login)
//!
//! The auth subsystem is an external collaborator: the rest of the tool only
//! cares that these calls yield a `Session` credential. Kept deliberately
//! thin.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::HttpGateway;
use crate::core::{GatewayError, Session};

#[derive(Debug, Error)]
pub enum AuthError {
    /// One-time code failed local validation; no request was made
    #[error("Verification code must be exactly 6 digits")]
    MalformedCode,

    /// Backend rejected the credentials
    #[error("{0}")]
    Rejected(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

#[derive(Debug, Serialize)]
struct SignupRequest<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct VerifyRequest<'a> {
    email: &'a str,
    code: &'a str,
    /// The backend requires this to be "signup" for registration flows
    r#type: &'a str,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    success: bool,
    #[serde(default)]
    message: String,
    data: Option<AuthData>,
}

#[derive(Debug, Deserialize)]
struct AuthData {
    token: String,
    #[serde(rename = "_id")]
    id: String,
    name: String,
    email: String,
}

impl AuthResponse {
    fn into_session(self) -> Result<Session, AuthError> {
        if !self.success {
            return Err(AuthError::Rejected(self.message));
        }
        let data = self
            .data
            .ok_or_else(|| AuthError::Gateway(GatewayError::Parse("Missing auth data".into())))?;
        Ok(Session::new(data.id, data.name, data.email, data.token))
    }
}

/// Local shape check for one-time codes, before any network call.
fn is_valid_code(code: &str) -> bool {
    code.len() == 6 && code.bytes().all(|b| b.is_ascii_digit())
}

impl HttpGateway {
    async fn auth_post<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<AuthResponse, AuthError> {
        let resp = self
            .client()
            .post(self.url_for(path))
            .header("Accept", "application/json")
            .json(body)
            .send()
            .await
            .map_err(GatewayError::from)?;

        let status = resp.status();
        let body: AuthResponse = resp
            .json()
            .await
            .map_err(|e| GatewayError::Parse(e.to_string()))?;

        if !status.is_success() {
            // Auth routes put the reason in the envelope even on error status
            return Err(AuthError::Rejected(if body.message.is_empty() {
                status.to_string()
            } else {
                body.message
            }));
        }
        Ok(body)
    }

    /// Register a new account. Succeeds with a pending verification; the
    /// session arrives from `verify`.
    pub async fn signup(&self, name: &str, email: &str, password: &str) -> Result<(), AuthError> {
        tracing::debug!(email, "Signing up");
        let body = self
            .auth_post("/api/auth/signup", &SignupRequest { name, email, password })
            .await?;
        if !body.success {
            return Err(AuthError::Rejected(body.message));
        }
        Ok(())
    }

    /// Exchange the emailed one-time code for a session.
    pub async fn verify(&self, email: &str, code: &str) -> Result<Session, AuthError> {
        if !is_valid_code(code) {
            return Err(AuthError::MalformedCode);
        }
        tracing::debug!(email, "Verifying one-time code");
        let body = self
            .auth_post(
                "/api/auth/verify",
                &VerifyRequest {
                    email,
                    code,
                    r#type: "signup",
                },
            )
            .await?;
        body.into_session()
    }

    /// Password login.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        tracing::debug!(email, "Logging in");
        let body = self
            .auth_post("/api/auth/login", &LoginRequest { email, password })
            .await?;
        body.into_session()
    }
}
