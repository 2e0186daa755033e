//! Dashboard summary cards backed by the count endpoints.

use serde::Serialize;
use tracing::warn;

use crate::api::ApiClient;
use crate::error::ApiError;
use crate::models::{Barang, Customer, Order, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "lowercase")]
pub enum CardValue {
    Loading,
    Ready(u64),
    Failed,
}

impl CardValue {
    pub fn from_result(result: Result<u64, ApiError>, card: &str) -> Self {
        match result {
            Ok(count) => CardValue::Ready(count),
            Err(e) => {
                warn!(card, error = %e, "dashboard count unavailable");
                CardValue::Failed
            }
        }
    }

    pub fn label(&self) -> String {
        match self {
            CardValue::Loading => "Loading...".to_string(),
            CardValue::Ready(n) => n.to_string(),
            CardValue::Failed => "Error".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryCard {
    pub description: &'static str,
    pub href: &'static str,
    pub value: CardValue,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub users: SummaryCard,
    pub customers: SummaryCard,
    pub items: SummaryCard,
    pub orders: SummaryCard,
}

impl DashboardSummary {
    pub fn loading() -> Self {
        Self {
            users: card("Total Pengguna", "dashboard-full/user"),
            customers: card("Customer Baru", "dashboard-full/customer"),
            items: card("Total Barang", "dashboard-full/barang"),
            orders: card("Total Order", "dashboard-full/order"),
        }
    }

    pub fn cards(&self) -> [&SummaryCard; 4] {
        [&self.users, &self.customers, &self.items, &self.orders]
    }
}

fn card(description: &'static str, href: &'static str) -> SummaryCard {
    SummaryCard {
        description,
        href,
        value: CardValue::Loading,
    }
}

/// Fetch all four counts concurrently; each card settles on its own.
pub async fn load_summary(api: &ApiClient) -> DashboardSummary {
    let (users, customers, items, orders) = tokio::join!(
        api.count::<User>(),
        api.count::<Customer>(),
        api.count::<Barang>(),
        api.count::<Order>(),
    );

    let mut summary = DashboardSummary::loading();
    summary.users.value = CardValue::from_result(users, "users");
    summary.customers.value = CardValue::from_result(customers, "customers");
    summary.items.value = CardValue::from_result(items, "items");
    summary.orders.value = CardValue::from_result(orders, "orders");
    summary
}
