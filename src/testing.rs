//! Test doubles: an in-memory backend for the gateway traits and a loopback
//! HTTP stub for wire-level checks.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use crate::api::ResourceApi;
use crate::error::ApiError;
use crate::models::{Barang, Customer, EntityId, Order, Resource, Stock, User};

// ---------------------------------------------------------------------------
// In-memory backend
// ---------------------------------------------------------------------------

/// Scriptable fake for one collection. Rows are what the "server" returns on
/// the next list; failures are one-shot.
pub(crate) struct FakeApi<R: Resource> {
    rows: Mutex<Vec<R>>,
    list_failure: Mutex<Option<String>>,
    mutation_failure: Mutex<Option<(u16, String)>>,
    hang_list: AtomicBool,
    calls: Mutex<Vec<String>>,
    sent: Mutex<Vec<Value>>,
}

impl<R: Resource> FakeApi<R> {
    pub fn new(rows: Vec<R>) -> Self {
        Self {
            rows: Mutex::new(rows),
            list_failure: Mutex::new(None),
            mutation_failure: Mutex::new(None),
            hang_list: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn set_rows(&self, rows: Vec<R>) {
        *self.rows.lock().unwrap() = rows;
    }

    pub fn fail_next_list(&self, message: &str) {
        *self.list_failure.lock().unwrap() = Some(message.to_string());
    }

    /// Next create/update/delete answers with `status` and a JSON body
    /// carrying `message`.
    pub fn fail_next_mutation(&self, status: u16, message: &str) {
        *self.mutation_failure.lock().unwrap() = Some((status, message.to_string()));
    }

    /// Every list call from now on never resolves.
    pub fn hang_lists(&self) {
        self.hang_list.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<Value> {
        self.sent.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn take_mutation_failure(&self) -> Result<(), ApiError> {
        match self.mutation_failure.lock().unwrap().take() {
            Some((status, message)) => Err(ApiError::from_response(
                StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                serde_json::json!({ "message": message }).to_string(),
            )),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl<R: Resource> ResourceApi<R> for FakeApi<R> {
    async fn list(&self) -> Result<Vec<R>, ApiError> {
        self.record("list".into());
        if self.hang_list.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if let Some(message) = self.list_failure.lock().unwrap().take() {
            return Err(ApiError::Transport(message));
        }
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn create(&self, draft: &R::Draft) -> Result<Value, ApiError> {
        self.record("create".into());
        self.sent
            .lock()
            .unwrap()
            .push(serde_json::to_value(draft).unwrap());
        self.take_mutation_failure()?;
        Ok(Value::Null)
    }

    async fn update(&self, id: &EntityId, draft: &R::Draft) -> Result<Value, ApiError> {
        self.record(format!("update:{id}"));
        self.sent
            .lock()
            .unwrap()
            .push(serde_json::to_value(draft).unwrap());
        self.take_mutation_failure()?;
        Ok(Value::Null)
    }

    async fn delete(&self, id: &EntityId) -> Result<(), ApiError> {
        self.record(format!("delete:{id}"));
        self.take_mutation_failure()
    }
}

/// All five collections behind one value, the way the real client serves
/// them.
pub(crate) struct FakeBackend {
    pub users: FakeApi<User>,
    pub customers: FakeApi<Customer>,
    pub items: FakeApi<Barang>,
    pub stock: FakeApi<Stock>,
    pub orders: FakeApi<Order>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            users: FakeApi::new(Vec::new()),
            customers: FakeApi::new(Vec::new()),
            items: FakeApi::new(Vec::new()),
            stock: FakeApi::new(Vec::new()),
            orders: FakeApi::new(Vec::new()),
        }
    }
}

macro_rules! delegate_fake {
    ($entity:ty, $field:ident) => {
        #[async_trait]
        impl ResourceApi<$entity> for FakeBackend {
            async fn list(&self) -> Result<Vec<$entity>, ApiError> {
                self.$field.list().await
            }
            async fn create(
                &self,
                draft: &<$entity as Resource>::Draft,
            ) -> Result<Value, ApiError> {
                self.$field.create(draft).await
            }
            async fn update(
                &self,
                id: &EntityId,
                draft: &<$entity as Resource>::Draft,
            ) -> Result<Value, ApiError> {
                self.$field.update(id, draft).await
            }
            async fn delete(&self, id: &EntityId) -> Result<(), ApiError> {
                self.$field.delete(id).await
            }
        }
    };
}

delegate_fake!(User, users);
delegate_fake!(Customer, customers);
delegate_fake!(Barang, items);
delegate_fake!(Stock, stock);
delegate_fake!(Order, orders);

pub(crate) fn item(id: &str, name: &str, price: f64) -> Barang {
    Barang {
        id: EntityId::from(id),
        nama_barang: name.to_string(),
        harga: price,
        stok: 100,
    }
}

pub(crate) fn customer(id: &str, name: &str) -> Customer {
    Customer {
        id: EntityId::from(id),
        customer_name: name.to_string(),
        alamat: String::new(),
        no_hp: String::new(),
    }
}

pub(crate) fn order(id: &str, customer_id: &str, item_id: &str, qty: i64, total: f64) -> Order {
    Order {
        id: EntityId::from(id),
        id_customer: EntityId::from(customer_id),
        id_barang: EntityId::from(item_id),
        order_date: "2024-03-05 09:05:03".to_string(),
        jumlah_barang: qty,
        total,
        customer: None,
        barang: None,
    }
}

// ---------------------------------------------------------------------------
// Loopback HTTP stub
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Answers one canned `(status, body)` per connection, in order, then stops
/// accepting. Every response closes its connection.
pub(crate) struct StubServer {
    pub url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl StubServer {
    pub async fn start(responses: Vec<(u16, &'static str)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
        let addr = listener.local_addr().expect("stub addr");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);
        let mut queue: VecDeque<(u16, &'static str)> = responses.into();

        tokio::spawn(async move {
            while let Some((status, body)) = queue.pop_front() {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                if let Some(request) = read_request(&mut socket).await {
                    recorded.lock().unwrap().push(request);
                }
                let reason = StatusCode::from_u16(status)
                    .ok()
                    .and_then(|s| s.canonical_reason())
                    .unwrap_or("Status");
                let response = format!(
                    "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        Self {
            url: format!("http://{addr}/api"),
            requests,
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> Option<RecordedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();

    let headers: Vec<(String, String)> = lines
        .filter_map(|line| {
            let (k, v) = line.split_once(':')?;
            Some((k.trim().to_string(), v.trim().to_string()))
        })
        .collect();

    let content_length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body_end = (header_end + content_length).min(buf.len());
    let body = String::from_utf8_lossy(&buf[header_end..body_end]).to_string();

    Some(RecordedRequest {
        method,
        path,
        headers,
        body,
    })
}
