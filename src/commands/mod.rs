//! Console command surface.
//!
//! Every command takes an optional JSON payload and answers with a JSON
//! object carrying `success`, the `notices` raised while it ran, and
//! command-specific fields. Payload keys are accepted in snake_case and
//! camelCase.

pub mod auth;
pub mod dashboard;
pub mod entities;
pub mod orders;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::api::ApiClient;
use crate::models::{Barang, Customer, EntityId, Stock, User};
use crate::notify::NoticeBuffer;

pub struct AppState {
    pub api: ApiClient,
    pub notices: NoticeBuffer,
}

impl AppState {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            notices: NoticeBuffer::new(),
        }
    }
}

/// Every command name [`dispatch`] understands.
pub const COMMANDS: &[&str] = &[
    "auth_login",
    "auth_logout",
    "auth_register",
    "auth_reset_password",
    "dashboard_summary",
    "user_list",
    "user_create",
    "user_update",
    "user_delete",
    "customer_list",
    "customer_create",
    "customer_update",
    "customer_delete",
    "barang_list",
    "barang_create",
    "barang_update",
    "barang_delete",
    "stock_list",
    "stock_create",
    "stock_update",
    "stock_delete",
    "order_list",
    "order_create",
    "order_update",
    "order_delete",
];

/// Run one command. A handler error becomes `{success: false, error}` so the
/// notices raised before it still reach the answer; only an unknown command
/// is an `Err`.
pub async fn dispatch(
    state: &AppState,
    command: &str,
    arg0: Option<Value>,
) -> Result<Value, String> {
    debug!(command, "dispatching console command");
    let api = &state.api;
    let notices = &state.notices;

    let result = match command {
        "auth_login" => auth::auth_login(api, arg0).await,
        "auth_logout" => auth::auth_logout(api).await,
        "auth_register" => auth::auth_register(api, notices, arg0).await,
        "auth_reset_password" => auth::auth_reset_password(api, notices, arg0).await,
        "dashboard_summary" => dashboard::dashboard_summary(api).await,

        "user_list" => Ok(entities::list::<User, _>(api).await),
        "user_create" => entities::create::<User, _>(api, notices, arg0).await,
        "user_update" => entities::update::<User, _>(api, notices, arg0).await,
        "user_delete" => entities::delete::<User, _>(api, notices, arg0).await,

        "customer_list" => Ok(entities::list::<Customer, _>(api).await),
        "customer_create" => entities::create::<Customer, _>(api, notices, arg0).await,
        "customer_update" => entities::update::<Customer, _>(api, notices, arg0).await,
        "customer_delete" => entities::delete::<Customer, _>(api, notices, arg0).await,

        "barang_list" => Ok(entities::list::<Barang, _>(api).await),
        "barang_create" => entities::create::<Barang, _>(api, notices, arg0).await,
        "barang_update" => entities::update::<Barang, _>(api, notices, arg0).await,
        "barang_delete" => entities::delete::<Barang, _>(api, notices, arg0).await,

        "stock_list" => Ok(entities::list::<Stock, _>(api).await),
        "stock_create" => entities::create::<Stock, _>(api, notices, arg0).await,
        "stock_update" => entities::update::<Stock, _>(api, notices, arg0).await,
        "stock_delete" => entities::delete::<Stock, _>(api, notices, arg0).await,

        "order_list" => Ok(orders::order_list(api).await),
        "order_create" => orders::order_create(api, notices, arg0).await,
        "order_update" => orders::order_update(api, notices, arg0).await,
        "order_delete" => orders::order_delete(api, notices, arg0).await,

        other => return Err(format!("Unknown command: {other}")),
    };

    Ok(answer(command, result, notices))
}

/// Final answer for a handler result, with the pending notices attached.
pub(crate) fn answer(command: &str, result: Result<Value, String>, notices: &NoticeBuffer) -> Value {
    let body = match result {
        Ok(body) => body,
        Err(error) => {
            warn!(command, error = %error, "command failed");
            serde_json::json!({ "success": false, "error": error })
        }
    };
    finish(body, notices)
}

/// Attach the drained notices. `success` defaults to `true` when the command
/// did not set it.
pub(crate) fn finish(body: Value, notices: &NoticeBuffer) -> Value {
    let mut obj = match body {
        Value::Object(obj) => obj,
        Value::Null => Map::new(),
        other => {
            let mut obj = Map::new();
            obj.insert("data".into(), other);
            obj
        }
    };
    obj.entry("success").or_insert(Value::Bool(true));
    obj.insert(
        "notices".into(),
        serde_json::to_value(notices.take()).unwrap_or_else(|_| Value::Array(Vec::new())),
    );
    Value::Object(obj)
}

// ---------------------------------------------------------------------------
// Payload helpers
// ---------------------------------------------------------------------------

pub(crate) fn value_str(v: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Some(s) = v.get(*key).and_then(|x| x.as_str()) {
            let trimmed = s.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
    }
    None
}

/// First non-empty id under `keys`; numbers are accepted.
pub(crate) fn value_id(v: &Value, keys: &[&str]) -> Option<EntityId> {
    keys.iter()
        .filter_map(|key| v.get(*key))
        .filter_map(|raw| serde_json::from_value::<EntityId>(raw.clone()).ok())
        .find(|id| !id.is_empty())
}

/// Id from a bare string/number payload or from an object under `keys`.
pub(crate) fn payload_id(arg0: Option<&Value>, keys: &[&str]) -> Option<EntityId> {
    match arg0 {
        Some(raw @ (Value::String(_) | Value::Number(_))) => {
            serde_json::from_value::<EntityId>(raw.clone())
                .ok()
                .filter(|id| !id.is_empty())
        }
        Some(obj @ Value::Object(_)) => value_id(obj, keys),
        _ => None,
    }
}

/// Payload object, or an empty object when none was given.
pub(crate) fn payload_object(arg0: Option<Value>) -> Result<Map<String, Value>, String> {
    match arg0 {
        Some(Value::Object(obj)) => Ok(obj),
        None | Some(Value::Null) => Ok(Map::new()),
        Some(_) => Err("Payload must be a JSON object".into()),
    }
}

/// Rows with their 1-based display index under `no`.
pub(crate) fn indexed_rows<'a, R, I>(rows: I) -> Vec<Value>
where
    R: Serialize + 'a,
    I: IntoIterator<Item = (usize, &'a R)>,
{
    rows.into_iter()
        .map(|(no, row)| {
            let mut value = serde_json::to_value(row).unwrap_or(Value::Null);
            if let Value::Object(obj) = &mut value {
                obj.insert("no".into(), Value::from(no));
            }
            value
        })
        .collect()
}

#[cfg(test)]
mod dto_tests {
    use super::*;
    use crate::notify::{Notice, Notifier};
    use serde_json::json;

    #[test]
    fn payload_id_supports_bare_and_object_forms() {
        let keys = &["id", "orderId"];
        assert_eq!(
            payload_id(Some(&json!("12")), keys),
            Some(EntityId::from("12"))
        );
        assert_eq!(payload_id(Some(&json!(12)), keys), Some(EntityId::from("12")));
        assert_eq!(
            payload_id(Some(&json!({ "orderId": 7 })), keys),
            Some(EntityId::from("7"))
        );
        assert_eq!(payload_id(Some(&json!({ "id": "" })), keys), None);
        assert_eq!(payload_id(None, keys), None);
    }

    #[test]
    fn payload_object_rejects_scalars() {
        assert!(payload_object(None).unwrap().is_empty());
        assert!(payload_object(Some(json!([1]))).is_err());
        assert_eq!(
            payload_object(Some(json!({ "a": 1 }))).unwrap().get("a"),
            Some(&json!(1))
        );
    }

    #[test]
    fn finish_attaches_notices_and_defaults_success() {
        let notices = NoticeBuffer::new();
        notices.notify(Notice::success("Barang berhasil dihapus"));

        let out = finish(json!({ "rows": [] }), &notices);
        assert_eq!(out["success"], true);
        assert_eq!(out["notices"][0]["title"], "Barang berhasil dihapus");
        assert_eq!(out["notices"][0]["level"], "success");

        let out = finish(json!({ "success": false }), &notices);
        assert_eq!(out["success"], false);
        assert_eq!(out["notices"], json!([]));
    }

    #[tokio::test]
    async fn handler_error_keeps_earlier_notices() {
        let api = crate::testing::FakeBackend::new();
        api.items.fail_next_list("timeout");
        let notices = NoticeBuffer::new();

        let result = orders::order_create(
            &api,
            &notices,
            Some(json!({ "itemId": "i1", "date": "besok" })),
        )
        .await;
        let out = answer("order_create", result, &notices);

        assert_eq!(out["success"], false);
        assert_eq!(out["error"], "Tanggal order tidak valid");
        assert_eq!(out["notices"][0]["title"], "Gagal mengambil data barang");
        assert_eq!(out["notices"][0]["level"], "error");
    }

    #[tokio::test]
    async fn dispatch_answers_failed_command_with_notices() {
        let config = crate::config::ConsoleConfig::default();
        let api = ApiClient::new(
            &config,
            std::sync::Arc::new(crate::storage::MemorySessionStore::new()),
        )
        .unwrap();
        let state = AppState::new(api);

        let out = dispatch(
            &state,
            "auth_register",
            Some(json!({ "username": "budi", "password": "a", "confirmPassword": "b" })),
        )
        .await
        .expect("known command answers");
        assert_eq!(out["success"], false);
        assert_eq!(out["error"], "Password dan konfirmasi password tidak sama.");
        assert_eq!(
            out["notices"][0]["title"],
            "Password dan konfirmasi password tidak sama."
        );
        assert!(dispatch(&state, "nope", None).await.is_err());
    }

    #[test]
    fn indexed_rows_add_display_number() {
        let rows = vec![json!({ "id": 4 }), json!({ "id": 9 })];
        let out = indexed_rows(rows.iter().enumerate().map(|(i, r)| (i + 1, r)));
        assert_eq!(out[0]["no"], 1);
        assert_eq!(out[1]["no"], 2);
        assert_eq!(out[1]["id"], 9);
    }

    #[test]
    fn command_list_has_no_duplicates() {
        let mut names = COMMANDS.to_vec();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), COMMANDS.len());
    }
}
