//! Wire models for the inventory REST API.
//!
//! Field names follow the backend (`nama_barang`, `id_customer`, ...). The
//! backend is loose about scalar types: ids arrive as numbers or strings and
//! decimal columns arrive as strings, so the deserializers below accept both.

use std::fmt;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

use crate::notify::ListMessages;

// ---------------------------------------------------------------------------
// Scalars
// ---------------------------------------------------------------------------

/// Backend record identifier. Stored as text; numeric ids are rendered in
/// decimal so that `7` and `"7"` compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Int(i64),
            Null(()),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => EntityId::new(s),
            RawId::Int(n) => EntityId(n.to_string()),
            RawId::Null(()) => EntityId::default(),
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Float(f64),
    Text(String),
    Null(()),
}

/// Decimal column: number, numeric string, or null (treated as 0).
pub(crate) fn de_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    match RawNumber::deserialize(deserializer)? {
        RawNumber::Float(n) => Ok(n),
        RawNumber::Text(s) if s.trim().is_empty() => Ok(0.0),
        RawNumber::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| de::Error::custom(format!("invalid amount: {s:?}"))),
        RawNumber::Null(()) => Ok(0.0),
    }
}

/// Integer column: number, numeric string, or null (treated as 0).
pub(crate) fn de_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let value = de_amount(deserializer)?;
    if value.fract() != 0.0 || !value.is_finite() {
        return Err(de::Error::custom(format!("invalid count: {value}")));
    }
    Ok(value as i64)
}

/// Whole amounts go out as JSON integers (`3000`, not `3000.0`).
pub(crate) fn ser_amount<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

// ---------------------------------------------------------------------------
// Resource contract
// ---------------------------------------------------------------------------

/// A collection exposed by the API under `/{PATH}` with the standard
/// list/create/update/delete routes.
pub trait Resource: for<'de> Deserialize<'de> + Clone + Send + Sync + 'static {
    /// Route segment, e.g. `order` for `/order` and `/order/:id`.
    const PATH: &'static str;
    /// User-facing feedback for this collection's mutations.
    const MESSAGES: ListMessages;

    /// Body sent on create and update.
    type Draft: Serialize + Send + Sync;

    fn id(&self) -> &EntityId;
}

/// Resources with an unauthenticated `GET /{COUNT_PATH}` summary endpoint.
pub trait Counted: Resource {
    const COUNT_PATH: &'static str;
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct User {
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
}

/// User body for create and update. Absent fields are left out of the body,
/// so an update may carry only the fields being changed.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UserDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl Resource for User {
    const PATH: &'static str = "user";
    const MESSAGES: ListMessages = ListMessages {
        created: "User berhasil ditambahkan",
        create_failed: "Gagal menambahkan User",
        updated: "User berhasil diupdate",
        update_failed: "Gagal mengupdate User",
        deleted: "User berhasil dihapus",
        delete_failed: "Gagal menghapus User",
        insufficient_on_create: None,
        insufficient_on_update: None,
        log_update_failures: true,
    };
    type Draft = UserDraft;

    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl Counted for User {
    const COUNT_PATH: &'static str = "users/count";
}

// ---------------------------------------------------------------------------
// Customer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Customer {
    pub id: EntityId,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub alamat: String,
    #[serde(default)]
    pub no_hp: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CustomerDraft {
    #[serde(alias = "customerName", alias = "name")]
    pub customer_name: String,
    #[serde(default, alias = "address")]
    pub alamat: String,
    #[serde(default, alias = "phone", alias = "noHp")]
    pub no_hp: String,
}

impl Resource for Customer {
    const PATH: &'static str = "customer";
    const MESSAGES: ListMessages = ListMessages {
        created: "Customer berhasil ditambahkan",
        create_failed: "Gagal menambahkan Customer",
        updated: "Customer berhasil diupdate",
        update_failed: "Gagal mengupdate Customer",
        deleted: "Customer berhasil dihapus",
        delete_failed: "Gagal menghapus Customer",
        insufficient_on_create: None,
        insufficient_on_update: None,
        log_update_failures: true,
    };
    type Draft = CustomerDraft;

    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl Counted for Customer {
    const COUNT_PATH: &'static str = "customer/count";
}

// ---------------------------------------------------------------------------
// Barang (item)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Barang {
    pub id: EntityId,
    #[serde(default)]
    pub nama_barang: String,
    /// Unit price.
    #[serde(default, deserialize_with = "de_amount", serialize_with = "ser_amount")]
    pub harga: f64,
    /// Quantity on hand.
    #[serde(default, alias = "jumlah", alias = "jumlah_barang", deserialize_with = "de_count")]
    pub stok: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BarangDraft {
    #[serde(alias = "namaBarang", alias = "name")]
    pub nama_barang: String,
    #[serde(
        alias = "price",
        alias = "unitPrice",
        deserialize_with = "de_amount",
        serialize_with = "ser_amount"
    )]
    pub harga: f64,
    #[serde(default, alias = "quantity", deserialize_with = "de_count")]
    pub stok: i64,
}

impl Resource for Barang {
    const PATH: &'static str = "barang";
    const MESSAGES: ListMessages = ListMessages {
        created: "Barang berhasil ditambahkan",
        create_failed: "Gagal menambahkan Barang",
        updated: "Barang berhasil diupdate",
        update_failed: "Gagal mengupdate Barang",
        deleted: "Barang berhasil dihapus",
        delete_failed: "Gagal menghapus Barang",
        insufficient_on_create: None,
        insufficient_on_update: None,
        log_update_failures: true,
    };
    type Draft = BarangDraft;

    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl Counted for Barang {
    const COUNT_PATH: &'static str = "barang/count";
}

/// Joined item name on order and stock rows.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct BarangSummary {
    #[serde(default)]
    pub nama_barang: String,
}

/// Joined customer name on order rows.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct CustomerSummary {
    #[serde(default)]
    pub customer_name: String,
}

// ---------------------------------------------------------------------------
// Stock
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Stock {
    pub id: EntityId,
    #[serde(default)]
    pub id_barang: EntityId,
    #[serde(default, alias = "jumlah_barang", deserialize_with = "de_count")]
    pub jumlah: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keterangan: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barang: Option<BarangSummary>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StockDraft {
    #[serde(alias = "idBarang", alias = "itemId")]
    pub id_barang: EntityId,
    #[serde(alias = "quantity", alias = "jumlah_barang", deserialize_with = "de_count")]
    pub jumlah: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keterangan: Option<String>,
}

impl Resource for Stock {
    const PATH: &'static str = "stock";
    const MESSAGES: ListMessages = ListMessages {
        created: "Stock berhasil ditambahkan",
        create_failed: "Gagal menambahkan Stock",
        updated: "Stock berhasil diupdate",
        update_failed: "Gagal mengupdate Stock",
        deleted: "Stock berhasil dihapus",
        delete_failed: "Gagal menghapus Stock",
        insufficient_on_create: None,
        insufficient_on_update: None,
        log_update_failures: true,
    };
    type Draft = StockDraft;

    fn id(&self) -> &EntityId {
        &self.id
    }
}

// ---------------------------------------------------------------------------
// Order
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Order {
    pub id: EntityId,
    #[serde(default)]
    pub id_customer: EntityId,
    #[serde(default)]
    pub id_barang: EntityId,
    #[serde(default)]
    pub order_date: String,
    #[serde(default, deserialize_with = "de_count")]
    pub jumlah_barang: i64,
    #[serde(default, deserialize_with = "de_amount", serialize_with = "ser_amount")]
    pub total: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barang: Option<BarangSummary>,
}

/// Validated order payload produced by the order form.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OrderSubmission {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    pub id_customer: EntityId,
    pub id_barang: EntityId,
    /// `YYYY-MM-DD HH:mm:ss`, local time.
    pub order_date: String,
    pub jumlah_barang: i64,
    #[serde(serialize_with = "ser_amount")]
    pub total: f64,
}

impl Resource for Order {
    const PATH: &'static str = "order";
    const MESSAGES: ListMessages = ListMessages {
        created: "Order berhasil ditambahkan",
        create_failed: "Gagal menambahkan order",
        updated: "Order berhasil diperbarui",
        update_failed: "Gagal memperbarui order",
        deleted: "Order berhasil dihapus",
        delete_failed: "Gagal menghapus order",
        insufficient_on_create: Some("Stok barang tidak mencukupi untuk order ini."),
        insufficient_on_update: Some("Stok barang tidak mencukupi untuk update order."),
        // TODO: confirm with the product owner whether order update failures
        // should stay out of the log.
        log_update_failures: false,
    };
    type Draft = OrderSubmission;

    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl Counted for Order {
    const COUNT_PATH: &'static str = "order/count";
}
