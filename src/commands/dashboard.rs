use serde_json::Value;

use crate::api::ApiClient;
use crate::dashboard::{load_summary, DashboardSummary};

fn summary_body(summary: &DashboardSummary) -> Value {
    let cards: Vec<Value> = summary
        .cards()
        .iter()
        .map(|card| {
            serde_json::json!({
                "description": card.description,
                "href": card.href,
                "value": card.value,
                "label": card.value.label(),
            })
        })
        .collect();
    serde_json::json!({ "success": true, "cards": cards })
}

pub async fn dashboard_summary(api: &ApiClient) -> Result<Value, String> {
    let summary = load_summary(api).await;
    Ok(summary_body(&summary))
}
