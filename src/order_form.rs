//! Order entry workflow.
//!
//! One [`OrderForm`] backs the create/edit order dialog. Opening it seeds a
//! draft (from an existing order or from defaults) and starts a form session;
//! the item and customer reference lists are fetched fresh for every session.
//! The total is derived: it is recomputed as `unit price × quantity` whenever
//! the selected item, the quantity, or the item list changes.
//!
//! Reference fetches are tied to the session that started them through a
//! generation number and a [`CancellationToken`]. Closing or reopening the form
//! cancels in-flight fetches, and a result carrying an old generation is
//! dropped instead of being written into the new session.

use chrono::{Local, NaiveDate, NaiveDateTime};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::api::ResourceApi;
use crate::display::{format_order_datetime, format_rupiah, parse_order_datetime, DATE_INPUT_FORMAT};
use crate::error::ApiError;
use crate::models::{Barang, Customer, EntityId, Order, OrderSubmission};
use crate::notify::{Notice, Notifier};

pub const ITEMS_LOAD_FAILED: &str = "Gagal mengambil data barang";
pub const CUSTOMERS_LOAD_FAILED: &str = "Gagal mengambil data Customer";

/// Submit-time validation failures, in the order they are checked.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DraftError {
    #[error("Silakan pilih barang")]
    MissingItem,
    #[error("Silakan pilih pelanggan")]
    MissingCustomer,
    #[error("Jumlah barang harus lebih dari 0")]
    InvalidQuantity,
    #[error("Total harus lebih dari 0")]
    InvalidTotal,
    #[error("Tanggal order tidak valid")]
    InvalidDate,
    #[error("Form order tidak sedang dibuka")]
    Closed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderDraft {
    pub id: Option<EntityId>,
    pub id_customer: EntityId,
    pub id_barang: EntityId,
    pub order_date: NaiveDateTime,
    pub jumlah_barang: i64,
    pub total: f64,
}

impl OrderDraft {
    pub fn empty(now: NaiveDateTime) -> Self {
        Self {
            id: None,
            id_customer: EntityId::default(),
            id_barang: EntityId::default(),
            order_date: now,
            jumlah_barang: 0,
            total: 0.0,
        }
    }

    /// Seed from an existing order. An unreadable date falls back to `now`.
    pub fn from_order(order: &Order, now: NaiveDateTime) -> Self {
        Self {
            id: (!order.id.is_empty()).then(|| order.id.clone()),
            id_customer: order.id_customer.clone(),
            id_barang: order.id_barang.clone(),
            order_date: parse_order_datetime(&order.order_date).unwrap_or(now),
            jumlah_barang: order.jumlah_barang,
            total: order.total,
        }
    }

    /// Checks run in a fixed order; the first failure wins.
    pub fn validate(&self) -> Result<(), DraftError> {
        if self.id_barang.is_empty() {
            return Err(DraftError::MissingItem);
        }
        if self.id_customer.is_empty() {
            return Err(DraftError::MissingCustomer);
        }
        if self.jumlah_barang <= 0 {
            return Err(DraftError::InvalidQuantity);
        }
        if !self.total.is_finite() || self.total <= 0.0 {
            return Err(DraftError::InvalidTotal);
        }
        Ok(())
    }

    fn to_submission(&self) -> OrderSubmission {
        OrderSubmission {
            id: self.id.clone(),
            id_customer: self.id_customer.clone(),
            id_barang: self.id_barang.clone(),
            order_date: format_order_datetime(&self.order_date),
            jumlah_barang: self.jumlah_barang,
            total: self.total,
        }
    }
}

/// `(unit price of the selected item, or 0) × quantity`.
pub fn compute_total(items: &[Barang], item_id: &EntityId, quantity: i64) -> f64 {
    let unit_price = items
        .iter()
        .find(|b| &b.id == item_id)
        .map(|b| b.harga)
        .unwrap_or(0.0);
    unit_price * quantity as f64
}

/// Integer prefix of a quantity input: surrounding whitespace and a sign are
/// allowed, trailing garbage is ignored (`"12abc"` → 12). Anything without a
/// leading integer, including the empty string, becomes 0.
pub fn parse_quantity_input(raw: &str) -> i64 {
    let trimmed = raw.trim_start();
    let (sign, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1, &trimmed[1..]),
        Some(b'+') => (1, &trimmed[1..]),
        _ => (1, trimmed),
    };
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    digits.parse::<i64>().map(|n| sign * n).unwrap_or(0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormPhase {
    Closed,
    /// Open, at least one reference list still in flight.
    Loading,
    Editing,
}

/// Handle binding reference fetches to the session that started them.
#[derive(Debug, Clone)]
pub struct ReferenceTicket {
    generation: u64,
    cancel: CancellationToken,
}

impl ReferenceTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

struct FormSession {
    ticket: ReferenceTicket,
    editing_existing: bool,
    draft: OrderDraft,
    items: Vec<Barang>,
    customers: Vec<Customer>,
    items_pending: bool,
    customers_pending: bool,
}

impl FormSession {
    fn recompute_total(&mut self) {
        self.draft.total = compute_total(&self.items, &self.draft.id_barang, self.draft.jumlah_barang);
    }
}

#[derive(Default)]
pub struct OrderForm {
    generation: u64,
    session: Option<FormSession>,
}

impl OrderForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, source: Option<&Order>) -> ReferenceTicket {
        self.open_at(source, Local::now().naive_local())
    }

    /// Start a fresh session. Any previous session is cancelled and its draft
    /// discarded; the new draft comes from `source` or defaults, never from
    /// leftover state.
    pub fn open_at(&mut self, source: Option<&Order>, now: NaiveDateTime) -> ReferenceTicket {
        self.close();
        self.generation += 1;

        let ticket = ReferenceTicket {
            generation: self.generation,
            cancel: CancellationToken::new(),
        };
        let draft = match source {
            Some(order) => OrderDraft::from_order(order, now),
            None => OrderDraft::empty(now),
        };
        debug!(
            generation = self.generation,
            order_id = draft.id.as_ref().map(EntityId::as_str).unwrap_or(""),
            "order form opened"
        );

        self.session = Some(FormSession {
            ticket: ticket.clone(),
            editing_existing: source.is_some(),
            draft,
            items: Vec::new(),
            customers: Vec::new(),
            items_pending: true,
            customers_pending: true,
        });
        ticket
    }

    /// Discard the draft and cancel outstanding reference fetches.
    pub fn close(&mut self) {
        if let Some(session) = self.session.take() {
            session.ticket.cancel.cancel();
            debug!(generation = session.ticket.generation, "order form closed");
        }
    }

    pub fn phase(&self) -> FormPhase {
        match &self.session {
            None => FormPhase::Closed,
            Some(s) if s.items_pending || s.customers_pending => FormPhase::Loading,
            Some(_) => FormPhase::Editing,
        }
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn ticket(&self) -> Option<ReferenceTicket> {
        self.session.as_ref().map(|s| s.ticket.clone())
    }

    pub fn draft(&self) -> Option<&OrderDraft> {
        self.session.as_ref().map(|s| &s.draft)
    }

    pub fn items(&self) -> &[Barang] {
        self.session.as_ref().map(|s| s.items.as_slice()).unwrap_or(&[])
    }

    pub fn customers(&self) -> &[Customer] {
        self.session
            .as_ref()
            .map(|s| s.customers.as_slice())
            .unwrap_or(&[])
    }

    pub fn title(&self) -> &'static str {
        match &self.session {
            Some(s) if s.editing_existing => "Edit Order",
            _ => "Tambah Order",
        }
    }

    pub fn submit_label(&self) -> &'static str {
        match &self.session {
            Some(s) if s.editing_existing => "Simpan Perubahan",
            _ => "Tambah",
        }
    }

    pub fn total_label(&self) -> String {
        let total = self.draft().map(|d| d.total).unwrap_or(0.0);
        format!("Total Harga: {}", format_rupiah(total))
    }

    /// Current date as a date-input value (`YYYY-MM-DD`).
    pub fn date_input_value(&self) -> Option<String> {
        self.draft()
            .map(|d| d.order_date.format(DATE_INPUT_FORMAT).to_string())
    }

    // -- edits -------------------------------------------------------------

    fn session_mut(&mut self, field: &'static str) -> Option<&mut FormSession> {
        if self.session.is_none() {
            debug!(field, "edit ignored: order form is closed");
        }
        self.session.as_mut()
    }

    pub fn select_item(&mut self, id: impl Into<EntityId>) {
        if let Some(session) = self.session_mut("id_barang") {
            session.draft.id_barang = id.into();
            session.recompute_total();
        }
    }

    pub fn select_customer(&mut self, id: impl Into<EntityId>) {
        if let Some(session) = self.session_mut("id_customer") {
            session.draft.id_customer = id.into();
        }
    }

    pub fn set_quantity(&mut self, quantity: i64) {
        if let Some(session) = self.session_mut("jumlah_barang") {
            session.draft.jumlah_barang = quantity;
            session.recompute_total();
        }
    }

    /// Raw text from the quantity input; see [`parse_quantity_input`].
    pub fn set_quantity_input(&mut self, raw: &str) {
        self.set_quantity(parse_quantity_input(raw));
    }

    /// Change the calendar date, keeping the time of day.
    pub fn set_order_date(&mut self, date: NaiveDate) {
        if let Some(session) = self.session_mut("order_date") {
            session.draft.order_date = date.and_time(session.draft.order_date.time());
        }
    }

    pub fn set_order_datetime(&mut self, datetime: NaiveDateTime) {
        if let Some(session) = self.session_mut("order_date") {
            session.draft.order_date = datetime;
        }
    }

    /// Date-input text (`YYYY-MM-DD`). Invalid text leaves the date as is.
    pub fn set_order_date_input(&mut self, raw: &str) -> Result<(), DraftError> {
        let date = NaiveDate::parse_from_str(raw.trim(), DATE_INPUT_FORMAT)
            .map_err(|_| DraftError::InvalidDate)?;
        self.set_order_date(date);
        Ok(())
    }

    // -- reference lists ---------------------------------------------------

    fn live_session(&mut self, generation: u64, what: &'static str) -> Option<&mut FormSession> {
        match self.session.as_mut() {
            Some(s) if s.ticket.generation == generation => Some(s),
            _ => {
                debug!(generation, what, "dropping stale reference list");
                None
            }
        }
    }

    /// Apply an item-list fetch result. Returns `false` when the result
    /// belongs to a session that is no longer current.
    pub fn apply_items(
        &mut self,
        generation: u64,
        result: Result<Vec<Barang>, ApiError>,
        notifier: &dyn Notifier,
    ) -> bool {
        let Some(session) = self.live_session(generation, "items") else {
            return false;
        };
        session.items_pending = false;
        match result {
            Ok(items) => {
                session.items = items;
                session.recompute_total();
            }
            Err(e) => {
                info!(error = %e, "item reference list unavailable");
                notifier.notify(Notice::error(ITEMS_LOAD_FAILED));
            }
        }
        true
    }

    pub fn apply_customers(
        &mut self,
        generation: u64,
        result: Result<Vec<Customer>, ApiError>,
        notifier: &dyn Notifier,
    ) -> bool {
        let Some(session) = self.live_session(generation, "customers") else {
            return false;
        };
        session.customers_pending = false;
        match result {
            Ok(customers) => session.customers = customers,
            Err(e) => {
                info!(error = %e, "customer reference list unavailable");
                notifier.notify(Notice::error(CUSTOMERS_LOAD_FAILED));
            }
        }
        true
    }

    /// Fetch both reference lists concurrently for the current session and
    /// apply whatever arrives while the session is still current.
    pub async fn load_references<A>(&mut self, api: &A, notifier: &dyn Notifier)
    where
        A: ResourceApi<Barang> + ResourceApi<Customer> + ?Sized,
    {
        let Some(ticket) = self.ticket() else {
            return;
        };
        let (items, customers) =
            tokio::join!(fetch_items(api, &ticket), fetch_customers(api, &ticket));
        if let Some(items) = items {
            self.apply_items(ticket.generation, items, notifier);
        }
        if let Some(customers) = customers {
            self.apply_customers(ticket.generation, customers, notifier);
        }
    }

    // -- submit ------------------------------------------------------------

    pub fn validate(&self) -> Result<(), DraftError> {
        self.draft().ok_or(DraftError::Closed)?.validate()
    }

    /// Validate and hand off the payload with a normalized date. Success
    /// closes the form; failure leaves the draft untouched and the form open.
    pub fn submit(&mut self) -> Result<OrderSubmission, DraftError> {
        let draft = self.draft().ok_or(DraftError::Closed)?;
        draft.validate()?;
        let submission = draft.to_submission();
        info!(
            id_barang = %submission.id_barang,
            id_customer = %submission.id_customer,
            jumlah_barang = submission.jumlah_barang,
            "order draft submitted"
        );
        self.close();
        Ok(submission)
    }

    /// [`submit`](Self::submit), reporting a validation failure as an error
    /// notice.
    pub fn submit_with(&mut self, notifier: &dyn Notifier) -> Option<OrderSubmission> {
        match self.submit() {
            Ok(submission) => Some(submission),
            Err(e) => {
                notifier.notify(Notice::error(e.to_string()));
                None
            }
        }
    }
}

impl Drop for OrderForm {
    fn drop(&mut self) {
        self.close();
    }
}

/// Item list for a session, or `None` if the session was cancelled first.
pub async fn fetch_items<A>(
    api: &A,
    ticket: &ReferenceTicket,
) -> Option<Result<Vec<Barang>, ApiError>>
where
    A: ResourceApi<Barang> + ?Sized,
{
    tokio::select! {
        _ = ticket.cancel.cancelled() => None,
        result = api.list() => Some(result),
    }
}

pub async fn fetch_customers<A>(
    api: &A,
    ticket: &ReferenceTicket,
) -> Option<Result<Vec<Customer>, ApiError>>
where
    A: ResourceApi<Customer> + ?Sized,
{
    tokio::select! {
        _ = ticket.cancel.cancelled() => None,
        result = api.list() => Some(result),
    }
}
