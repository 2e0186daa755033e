//! Order commands. Create and update drive the full order form: the form is
//! opened, its reference lists are fetched, payload fields are applied the
//! way the dialog inputs would apply them, and the validated submission goes
//! through the order list.

use serde_json::{Map, Value};
use tracing::debug;

use super::entities::{list_body, mutation_body};
use super::{payload_id, payload_object, value_id, value_str};
use crate::api::ResourceApi;
use crate::display::{format_order_date, format_rupiah, parse_order_datetime, DATE_INPUT_FORMAT};
use crate::models::{Barang, Customer, EntityId, Order};
use crate::notify::Notifier;
use crate::order_form::{DraftError, OrderForm};
use crate::resource_list::ResourceList;

const ORDER_ID_KEYS: &[&str] = &["id", "orderId", "order_id"];
const ITEM_KEYS: &[&str] = &["id_barang", "idBarang", "itemId", "item_id"];
const CUSTOMER_KEYS: &[&str] = &["id_customer", "idCustomer", "customerId", "customer_id"];
const QUANTITY_KEYS: &[&str] = &["jumlah_barang", "jumlahBarang", "quantity", "qty"];
const DATE_KEYS: &[&str] = &["order_date", "orderDate", "date"];

/// Order row as the table shows it: joined names, formatted date and total.
fn order_row(no: usize, order: &Order) -> Value {
    let mut value = serde_json::to_value(order).unwrap_or(Value::Null);
    if let Value::Object(obj) = &mut value {
        obj.insert("no".into(), Value::from(no));
        obj.insert(
            "customer_name".into(),
            order
                .customer
                .as_ref()
                .map(|c| Value::String(c.customer_name.clone()))
                .unwrap_or(Value::Null),
        );
        obj.insert(
            "nama_barang".into(),
            order
                .barang
                .as_ref()
                .map(|b| Value::String(b.nama_barang.clone()))
                .unwrap_or(Value::Null),
        );
        obj.insert(
            "order_date_label".into(),
            Value::String(format_order_date(&order.order_date)),
        );
        obj.insert("total_label".into(), Value::String(format_rupiah(order.total)));
    }
    value
}

fn order_body(list: &ResourceList<Order>, mut body: Value) -> Value {
    if let Value::Object(obj) = &mut body {
        let rows: Vec<Value> = list.indexed().map(|(no, o)| order_row(no, o)).collect();
        obj.insert("rows".into(), Value::Array(rows));
    }
    body
}

/// Feed payload fields into an open form, in dialog order. Fields that are
/// absent keep the draft's value.
fn apply_fields(form: &mut OrderForm, fields: &Map<String, Value>) -> Result<(), DraftError> {
    let payload = Value::Object(fields.clone());

    if let Some(item) = value_id(&payload, ITEM_KEYS) {
        form.select_item(item);
    }
    if let Some(customer) = value_id(&payload, CUSTOMER_KEYS) {
        form.select_customer(customer);
    }
    if let Some(raw) = QUANTITY_KEYS.iter().find_map(|k| payload.get(*k)) {
        match raw {
            Value::Number(n) => form.set_quantity(
                n.as_i64()
                    .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
                    .unwrap_or(0),
            ),
            Value::String(s) => form.set_quantity_input(s),
            _ => form.set_quantity(0),
        }
    }
    if let Some(raw) = value_str(&payload, DATE_KEYS) {
        apply_date(form, &raw)?;
    }
    Ok(())
}

/// A bare `YYYY-MM-DD` changes only the calendar date; a full timestamp
/// replaces the date and time.
fn apply_date(form: &mut OrderForm, raw: &str) -> Result<(), DraftError> {
    if chrono::NaiveDate::parse_from_str(raw, DATE_INPUT_FORMAT).is_ok() {
        return form.set_order_date_input(raw);
    }
    let datetime = parse_order_datetime(raw).ok_or(DraftError::InvalidDate)?;
    form.set_order_datetime(datetime);
    Ok(())
}

fn form_body(form: &OrderForm) -> Value {
    serde_json::json!({
        "title": form.title(),
        "submit_label": form.submit_label(),
        "order_date": form.date_input_value(),
        "total_label": form.total_label(),
    })
}

pub async fn order_list<A>(api: &A) -> Value
where
    A: ResourceApi<Order> + ?Sized,
{
    let mut list = ResourceList::<Order>::new();
    let loaded = list.load(api).await;
    order_body(&list, list_body(&list, loaded))
}

pub async fn order_create<A>(
    api: &A,
    notifier: &dyn Notifier,
    arg0: Option<Value>,
) -> Result<Value, String>
where
    A: ResourceApi<Order> + ResourceApi<Barang> + ResourceApi<Customer> + ?Sized,
{
    let fields = payload_object(arg0)?;
    let mut list = ResourceList::<Order>::new();
    list.load(api).await;

    let mut form = OrderForm::new();
    form.open(None);
    submit_form(api, notifier, &mut list, &mut form, &fields, None).await
}

pub async fn order_update<A>(
    api: &A,
    notifier: &dyn Notifier,
    arg0: Option<Value>,
) -> Result<Value, String>
where
    A: ResourceApi<Order> + ResourceApi<Barang> + ResourceApi<Customer> + ?Sized,
{
    let id = payload_id(arg0.as_ref(), ORDER_ID_KEYS).ok_or("Missing order id")?;
    let fields = payload_object(arg0)?;

    let mut list = ResourceList::<Order>::new();
    if !list.load(api).await {
        return Err("Gagal mengambil data order".into());
    }
    let source = list
        .rows()
        .iter()
        .find(|o| o.id == id)
        .cloned()
        .ok_or_else(|| format!("Order {id} tidak ditemukan"))?;

    let mut form = OrderForm::new();
    form.open(Some(&source));
    submit_form(api, notifier, &mut list, &mut form, &fields, Some(id)).await
}

async fn submit_form<A>(
    api: &A,
    notifier: &dyn Notifier,
    list: &mut ResourceList<Order>,
    form: &mut OrderForm,
    fields: &Map<String, Value>,
    target: Option<EntityId>,
) -> Result<Value, String>
where
    A: ResourceApi<Order> + ResourceApi<Barang> + ResourceApi<Customer> + ?Sized,
{
    form.load_references(api, notifier).await;
    apply_fields(form, fields).map_err(|e| e.to_string())?;
    let form_state = form_body(form);

    let Some(submission) = form.submit_with(notifier) else {
        debug!("order draft rejected by validation");
        let mut body = serde_json::json!({ "success": false, "outcome": "invalid" });
        body["form"] = form_state;
        return Ok(order_body(list, body));
    };

    let outcome = match &target {
        Some(id) => list.update(api, id, &submission, notifier).await,
        None => list.create(api, &submission, notifier).await,
    };
    let mut body = mutation_body(list, outcome);
    body["form"] = form_state;
    body["submitted"] = serde_json::to_value(&submission).unwrap_or(Value::Null);
    Ok(order_body(list, body))
}

pub async fn order_delete<A>(
    api: &A,
    notifier: &dyn Notifier,
    arg0: Option<Value>,
) -> Result<Value, String>
where
    A: ResourceApi<Order> + ?Sized,
{
    let id = payload_id(arg0.as_ref(), ORDER_ID_KEYS).ok_or("Missing order id")?;
    let mut list = ResourceList::<Order>::new();
    list.load(api).await;
    let outcome = list.delete(api, &id, notifier).await;
    let mut body = mutation_body(&list, outcome);
    body["id"] = Value::String(id.to_string());
    Ok(order_body(&list, body))
}
