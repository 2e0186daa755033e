//! Login, logout, registration and password reset.
//!
//! These flows own the token lifecycle: login writes it into the session
//! store, logout clears it. Field checks that need no backend run before any
//! request is sent.

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::api::{ApiClient, Auth};
use crate::error::ApiError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Password dan konfirmasi password tidak sama.")]
    RegisterPasswordMismatch,
    #[error("Email harus diisi.")]
    MissingEmail,
    #[error("Password dan konfirmasi password tidak cocok.")]
    ResetPasswordMismatch,
    #[error("Username dan password harus diisi.")]
    MissingCredentials,
    #[error("Login berhasil tetapi token tidak ditemukan di respons")]
    MissingTokenInResponse,
    /// The backend answered 2xx but reported `success: false`.
    #[error("{0}")]
    Rejected(String),
    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct ResetPasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Token from a login response: `token`, `access_token`, or either nested
/// under `data`.
pub(crate) fn extract_token(body: &Value) -> Option<String> {
    let direct = ["token", "access_token"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str));
    direct
        .or_else(|| body.get("data").and_then(|data| {
            ["token", "access_token"]
                .iter()
                .find_map(|key| data.get(*key).and_then(Value::as_str))
        }))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Authenticate and store the returned token. Returns the full response body
/// (user profile and whatever else the backend sends).
pub async fn login(api: &ApiClient, username: &str, password: &str) -> Result<Value, AuthError> {
    if username.trim().is_empty() || password.is_empty() {
        return Err(AuthError::MissingCredentials);
    }
    let body = api
        .send(
            Method::POST,
            "login",
            Some(&LoginRequest { username, password }),
            Auth::Anonymous,
        )
        .await?;

    let token = extract_token(&body).ok_or(AuthError::MissingTokenInResponse)?;
    api.session()
        .set_token(&token)
        .map_err(|e| AuthError::Api(ApiError::Credential(e)))?;
    info!(username, "login succeeded");
    Ok(body)
}

/// Revoke the token server-side and clear it locally. The local token is
/// cleared even when the backend call fails, so a dead session never lingers.
pub async fn logout(api: &ApiClient) -> Result<Value, AuthError> {
    let result = api
        .send(Method::POST, "logout", Some(&serde_json::json!({})), Auth::Required)
        .await;

    if matches!(result, Err(ApiError::MissingToken)) {
        return Err(AuthError::Api(ApiError::MissingToken));
    }
    if let Err(e) = api.session().clear_token() {
        warn!(error = %e, "failed to clear stored auth token");
    }
    let body = result?;
    info!("logged out");
    Ok(body)
}

pub async fn register(
    api: &ApiClient,
    username: &str,
    email: &str,
    password: &str,
    confirm_password: &str,
) -> Result<Value, AuthError> {
    if password != confirm_password {
        return Err(AuthError::RegisterPasswordMismatch);
    }
    let body = api
        .send(
            Method::POST,
            "register",
            Some(&RegisterRequest {
                username,
                email,
                password,
            }),
            Auth::Anonymous,
        )
        .await?;

    if body.get("success").and_then(Value::as_bool) == Some(false) {
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Registrasi gagal");
        return Err(AuthError::Rejected(message.to_string()));
    }
    info!(username, "account registered");
    Ok(body)
}

pub async fn reset_password(
    api: &ApiClient,
    email: &str,
    new_password: &str,
    confirm_password: &str,
) -> Result<Value, AuthError> {
    if email.trim().is_empty() {
        return Err(AuthError::MissingEmail);
    }
    if new_password != confirm_password {
        return Err(AuthError::ResetPasswordMismatch);
    }
    let body = api
        .send(
            Method::POST,
            "reset-password",
            Some(&ResetPasswordRequest {
                email: email.trim(),
                password: new_password,
            }),
            Auth::Anonymous,
        )
        .await?;
    info!("password reset requested");
    Ok(body)
}
