//! Generic list/create/update/delete commands for the plain collections.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::{indexed_rows, payload_id, payload_object};
use crate::api::ResourceApi;
use crate::models::{EntityId, Resource};
use crate::notify::Notifier;
use crate::resource_list::{Outcome, ResourceList};

const ID_KEYS: &[&str] = &["id", "recordId", "record_id"];

pub(crate) fn outcome_str(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Applied => "applied",
        Outcome::Warned => "warned",
        Outcome::Failed => "failed",
    }
}

pub(crate) fn list_body<R: Resource + Serialize>(list: &ResourceList<R>, loaded: bool) -> Value {
    serde_json::json!({
        "success": loaded,
        "loading": list.is_loading(),
        "rows": indexed_rows(list.indexed()),
    })
}

pub(crate) fn mutation_body<R: Resource + Serialize>(
    list: &ResourceList<R>,
    outcome: Outcome,
) -> Value {
    serde_json::json!({
        "success": outcome.is_applied(),
        "outcome": outcome_str(outcome),
        "rows": indexed_rows(list.indexed()),
    })
}

/// Split an update payload into its target id and the draft fields. The
/// fields are either the rest of the object or nested under `data`.
pub(crate) fn parse_update_payload(
    arg0: Option<Value>,
) -> Result<(EntityId, Value), String> {
    let id = payload_id(arg0.as_ref(), ID_KEYS).ok_or("Missing record id")?;
    let mut obj = payload_object(arg0)?;
    let fields = match obj.remove("data") {
        Some(data @ Value::Object(_)) => data,
        _ => {
            for key in ID_KEYS {
                obj.remove(*key);
            }
            Value::Object(obj)
        }
    };
    Ok((id, fields))
}

fn parse_draft<R>(fields: Value) -> Result<R::Draft, String>
where
    R: Resource,
    R::Draft: DeserializeOwned,
{
    serde_json::from_value(fields).map_err(|e| format!("Invalid {} payload: {e}", R::PATH))
}

pub async fn list<R, A>(api: &A) -> Value
where
    R: Resource + Serialize,
    A: ResourceApi<R> + ?Sized,
{
    let mut list = ResourceList::<R>::new();
    let loaded = list.load(api).await;
    list_body(&list, loaded)
}

pub async fn create<R, A>(
    api: &A,
    notifier: &dyn Notifier,
    arg0: Option<Value>,
) -> Result<Value, String>
where
    R: Resource + Serialize,
    R::Draft: DeserializeOwned,
    A: ResourceApi<R> + ?Sized,
{
    let draft = parse_draft::<R>(Value::Object(payload_object(arg0)?))?;
    let mut list = ResourceList::<R>::new();
    let outcome = list.create(api, &draft, notifier).await;
    Ok(mutation_body(&list, outcome))
}

pub async fn update<R, A>(
    api: &A,
    notifier: &dyn Notifier,
    arg0: Option<Value>,
) -> Result<Value, String>
where
    R: Resource + Serialize,
    R::Draft: DeserializeOwned,
    A: ResourceApi<R> + ?Sized,
{
    let (id, fields) = parse_update_payload(arg0)?;
    let draft = parse_draft::<R>(fields)?;
    let mut list = ResourceList::<R>::new();
    let outcome = list.update(api, &id, &draft, notifier).await;
    Ok(mutation_body(&list, outcome))
}

/// Loads the collection first so the answer shows the rows left after the
/// delete.
pub async fn delete<R, A>(
    api: &A,
    notifier: &dyn Notifier,
    arg0: Option<Value>,
) -> Result<Value, String>
where
    R: Resource + Serialize,
    A: ResourceApi<R> + ?Sized,
{
    let id = payload_id(arg0.as_ref(), ID_KEYS).ok_or("Missing record id")?;
    let mut list = ResourceList::<R>::new();
    list.load(api).await;
    let outcome = list.delete(api, &id, notifier).await;
    let mut body = mutation_body(&list, outcome);
    if let Value::Object(obj) = &mut body {
        obj.insert("id".into(), Value::String(id.to_string()));
    }
    Ok(body)
}

#[cfg(test)]
mod dto_tests {
    use super::*;
    use crate::models::{Barang, Customer, User};
    use crate::notify::NoticeBuffer;
    use crate::testing::{customer, item, FakeApi};
    use serde_json::json;

    #[test]
    fn update_payload_strips_id_from_fields() {
        let (id, fields) = parse_update_payload(Some(json!({
            "id": 3,
            "customerName": "Sari",
            "phone": "0812"
        })))
        .expect("update payload should parse");
        assert_eq!(id, EntityId::from("3"));
        assert_eq!(fields, json!({ "customerName": "Sari", "phone": "0812" }));

        let draft = parse_draft::<Customer>(fields).expect("draft parses");
        assert_eq!(draft.customer_name, "Sari");
        assert_eq!(draft.no_hp, "0812");
    }

    #[test]
    fn update_payload_supports_nested_data() {
        let (id, fields) = parse_update_payload(Some(json!({
            "record_id": "b-1",
            "data": { "nama_barang": "Kopi", "harga": "12500" }
        })))
        .expect("nested payload should parse");
        assert_eq!(id.as_str(), "b-1");
        let draft = parse_draft::<Barang>(fields).expect("draft parses");
        assert_eq!(draft.harga, 12500.0);
    }

    #[test]
    fn update_payload_rejects_missing_id() {
        let err = parse_update_payload(Some(json!({ "customer_name": "Sari" })))
            .expect_err("missing id");
        assert_eq!(err, "Missing record id");
    }

    #[test]
    fn draft_errors_name_the_collection() {
        let err = parse_draft::<Barang>(json!({ "harga": 1 })).expect_err("name missing");
        assert!(err.starts_with("Invalid barang payload"));
    }

    #[tokio::test]
    async fn list_numbers_rows() {
        let api = FakeApi::new(vec![item("b1", "Teh", 5000.0), item("b2", "Kopi", 8000.0)]);
        let body = list::<Barang, _>(&api).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["rows"][0]["no"], 1);
        assert_eq!(body["rows"][1]["nama_barang"], "Kopi");
        assert_eq!(body["rows"][1]["harga"], 8000);
    }

    #[tokio::test]
    async fn list_failure_reports_unsuccessful_without_notice() {
        let api = FakeApi::<Customer>::new(Vec::new());
        api.fail_next_list("offline");
        let body = list::<Customer, _>(&api).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["loading"], false);
        assert_eq!(body["rows"], json!([]));
    }

    #[tokio::test]
    async fn delete_reports_remaining_rows() {
        let api = FakeApi::new(vec![customer("1", "A"), customer("2", "B")]);
        let notices = NoticeBuffer::new();

        let body = delete::<Customer, _>(&api, &notices, Some(json!("1")))
            .await
            .expect("delete runs");
        assert_eq!(body["success"], true);
        assert_eq!(body["outcome"], "applied");
        assert_eq!(body["rows"].as_array().map(Vec::len), Some(1));
        assert_eq!(body["rows"][0]["id"], "2");
        assert_eq!(notices.take()[0].title, "Customer berhasil dihapus");
    }

    #[tokio::test]
    async fn create_failure_is_reported_in_body() {
        let api = FakeApi::<Barang>::new(Vec::new());
        let notices = NoticeBuffer::new();
        api.fail_next_mutation(500, "Server error");

        let body = create::<Barang, _>(
            &api,
            &notices,
            Some(json!({ "namaBarang": "Gula", "price": 15000, "quantity": "4" })),
        )
        .await
        .expect("create runs");
        assert_eq!(body["success"], false);
        assert_eq!(body["outcome"], "failed");
        assert_eq!(api.sent()[0], json!({ "nama_barang": "Gula", "harga": 15000, "stok": 4 }));
        assert_eq!(notices.take()[0].title, "Gagal menambahkan Barang");
    }

    #[tokio::test]
    async fn partial_user_update_sends_only_changed_fields() {
        let api = FakeApi::<User>::new(Vec::new());
        let notices = NoticeBuffer::new();

        let body = update::<User, _>(&api, &notices, Some(json!({ "id": 4, "email": "sari@toko.id" })))
            .await
            .expect("update runs");
        assert_eq!(body["success"], true);
        assert_eq!(api.calls(), vec!["update:4", "list"]);
        assert_eq!(api.sent()[0], json!({ "email": "sari@toko.id" }));
        assert_eq!(notices.take()[0].title, "User berhasil diupdate");
    }
}
