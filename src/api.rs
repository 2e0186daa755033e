//! Inventory API client.
//!
//! Thin typed layer over the REST backend: generic CRUD per [`Resource`],
//! unauthenticated count endpoints for the dashboard, and the raw request
//! path used by the auth flows. The bearer token comes from the injected
//! [`SessionStore`].

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use zeroize::Zeroizing;

use crate::config::{normalize_api_url, ConsoleConfig};
use crate::error::{friendly_error, ApiError};
use crate::models::{Counted, EntityId, Resource};
use crate::storage::SessionStore;

/// Whether a request carries the bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Auth {
    /// Never attach a token (count, login, register, reset).
    Anonymous,
    /// Attach the token when one is stored (reads).
    Optional,
    /// Fail with [`ApiError::MissingToken`] before sending when no token is
    /// stored (mutations, logout).
    Required,
}

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    session: Arc<dyn SessionStore>,
}

impl ApiClient {
    pub fn new(config: &ConsoleConfig, session: Arc<dyn SessionStore>) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| ApiError::Transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: normalize_api_url(&config.api_url),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn bearer(&self, auth: Auth) -> Result<Option<Zeroizing<String>>, ApiError> {
        match auth {
            Auth::Anonymous => Ok(None),
            Auth::Optional => Ok(self.session.token()),
            Auth::Required => self.session.token().map(Some).ok_or(ApiError::MissingToken),
        }
    }

    /// Perform one request and return the JSON body (`Null` for an empty
    /// 2xx body).
    pub(crate) async fn send<B: Serialize + ?Sized + Sync>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        auth: Auth,
    ) -> Result<Value, ApiError> {
        let token = self.bearer(auth)?;
        let full_url = self.url(path);
        debug!(method = %method, path, "inventory API request");

        let mut req = self
            .http
            .request(method, &full_url)
            .header("Accept", "application/json");
        if let Some(token) = token.as_deref() {
            req = req.bearer_auth(token.as_str());
        }
        if let Some(b) = body {
            req = req.json(b);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| friendly_error(&self.base_url, &e))?;
        let status = resp.status();
        let body_text = resp.text().await.unwrap_or_default();

        if !status.is_success() {
            debug!(path, status = status.as_u16(), "inventory API request failed");
            return Err(ApiError::from_response(status, body_text));
        }

        if body_text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body_text).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// `GET /{COUNT_PATH}` for the dashboard cards.
    pub async fn count<R: Counted>(&self) -> Result<u64, ApiError> {
        let body = self
            .send(Method::GET, R::COUNT_PATH, None::<&()>, Auth::Anonymous)
            .await?;
        parse_count(&body)
            .ok_or_else(|| ApiError::Decode(format!("unexpected count body from {}", R::COUNT_PATH)))
    }
}

/// CRUD operations for one collection.
#[async_trait]
pub trait ResourceApi<R: Resource>: Send + Sync {
    async fn list(&self) -> Result<Vec<R>, ApiError>;
    async fn create(&self, draft: &R::Draft) -> Result<Value, ApiError>;
    async fn update(&self, id: &EntityId, draft: &R::Draft) -> Result<Value, ApiError>;
    async fn delete(&self, id: &EntityId) -> Result<(), ApiError>;
}

#[async_trait]
impl<R: Resource> ResourceApi<R> for ApiClient {
    async fn list(&self) -> Result<Vec<R>, ApiError> {
        let body = self
            .send(Method::GET, R::PATH, None::<&()>, Auth::Optional)
            .await?;
        serde_json::from_value(unwrap_collection(body)).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn create(&self, draft: &R::Draft) -> Result<Value, ApiError> {
        self.send(Method::POST, R::PATH, Some(draft), Auth::Required)
            .await
    }

    async fn update(&self, id: &EntityId, draft: &R::Draft) -> Result<Value, ApiError> {
        let path = format!("{}/{}", R::PATH, id);
        self.send(Method::PATCH, &path, Some(draft), Auth::Required)
            .await
    }

    async fn delete(&self, id: &EntityId) -> Result<(), ApiError> {
        let path = format!("{}/{}", R::PATH, id);
        self.send(Method::DELETE, &path, None::<&()>, Auth::Required)
            .await
            .map(|_| ())
    }
}

/// Lists arrive either bare (`[...]`) or wrapped (`{"data": [...]}`).
fn unwrap_collection(body: Value) -> Value {
    match body {
        Value::Object(mut obj) if obj.get("data").is_some_and(Value::is_array) => {
            obj.remove("data").unwrap_or(Value::Null)
        }
        Value::Null => Value::Array(Vec::new()),
        other => other,
    }
}

/// Count bodies: `42`, `"42"`, or an object with `count`/`total`/`data`.
pub(crate) fn parse_count(body: &Value) -> Option<u64> {
    match body {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        Value::Object(obj) => ["count", "total", "data"]
            .iter()
            .find_map(|key| obj.get(*key).and_then(parse_count)),
        _ => None,
    }
}
