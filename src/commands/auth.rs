use serde::Deserialize;
use serde_json::Value;

use crate::api::ApiClient;
use crate::auth::{self, AuthError};
use crate::notify::{Notice, Notifier};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginPayload {
    #[serde(alias = "user", alias = "email")]
    username: String,
    password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterPayload {
    #[serde(alias = "name")]
    username: String,
    #[serde(default)]
    email: String,
    password: String,
    #[serde(
        alias = "confirm_password",
        alias = "passwordConfirmation",
        alias = "password_confirmation"
    )]
    confirm_password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResetPasswordPayload {
    #[serde(default)]
    email: String,
    #[serde(alias = "new_password", alias = "password")]
    new_password: String,
    #[serde(
        alias = "confirm_password",
        alias = "passwordConfirmation",
        alias = "password_confirmation"
    )]
    confirm_password: String,
}

fn parse_payload<T: for<'de> Deserialize<'de>>(
    arg0: Option<Value>,
    what: &str,
) -> Result<T, String> {
    let payload = arg0.unwrap_or_else(|| serde_json::json!({}));
    serde_json::from_value(payload).map_err(|e| format!("Invalid {what} payload: {e}"))
}

pub async fn auth_login(api: &ApiClient, arg0: Option<Value>) -> Result<Value, String> {
    let payload: LoginPayload = parse_payload(arg0, "login")?;
    let body = auth::login(api, &payload.username, &payload.password)
        .await
        .map_err(|e| e.to_string())?;
    Ok(serde_json::json!({
        "success": true,
        "user": body.get("user").cloned().unwrap_or(Value::Null),
    }))
}

pub async fn auth_logout(api: &ApiClient) -> Result<Value, String> {
    auth::logout(api).await.map_err(|e| e.to_string())?;
    Ok(serde_json::json!({ "success": true }))
}

/// Notice for a failed auth form. Local checks and soft rejections show their
/// own text; backend errors go under `title` with the backend message.
fn failure_notice(title: &str, err: &AuthError) -> Notice {
    match err {
        AuthError::Api(e) => Notice::error(title).with_description(e.message()),
        other => Notice::error(other.to_string()),
    }
}

pub async fn auth_register(
    api: &ApiClient,
    notifier: &dyn Notifier,
    arg0: Option<Value>,
) -> Result<Value, String> {
    let payload: RegisterPayload = parse_payload(arg0, "register")?;
    let body = auth::register(
        api,
        &payload.username,
        &payload.email,
        &payload.password,
        &payload.confirm_password,
    )
    .await
    .map_err(|e| {
        notifier.notify(failure_notice("Registrasi gagal", &e));
        e.to_string()
    })?;
    notifier.notify(Notice::success("Registrasi berhasil! Silakan login."));
    Ok(serde_json::json!({
        "success": true,
        "message": body.get("message").cloned().unwrap_or(Value::Null),
    }))
}

pub async fn auth_reset_password(
    api: &ApiClient,
    notifier: &dyn Notifier,
    arg0: Option<Value>,
) -> Result<Value, String> {
    let payload: ResetPasswordPayload = parse_payload(arg0, "reset password")?;
    let body = auth::reset_password(
        api,
        &payload.email,
        &payload.new_password,
        &payload.confirm_password,
    )
    .await
    .map_err(|e| {
        notifier.notify(failure_notice("Gagal reset password", &e));
        e.to_string()
    })?;
    notifier.notify(Notice::success("Password berhasil direset!"));
    Ok(serde_json::json!({
        "success": true,
        "message": body.get("message").cloned().unwrap_or(Value::Null),
    }))
}
