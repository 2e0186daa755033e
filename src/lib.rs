//! Barang Console - inventory and order administration client.
//!
//! Talks to the inventory REST backend (users, customers, items, stock,
//! orders) and exposes every screen operation as a console command. Command
//! names use snake_case (`order_create`, `dashboard_summary`, ...); each
//! command answers with one JSON object on stdout.

use std::sync::Arc;

use anyhow::Context;
use serde_json::Value;
use tracing::{error, info};

mod api;
mod auth;
pub mod commands;
mod config;
mod dashboard;
mod display;
mod error;
mod logging;
mod models;
mod notify;
mod order_form;
mod resource_list;
mod storage;
#[cfg(test)]
mod testing;

pub use api::{ApiClient, ResourceApi};
pub use config::{ConfigError, ConsoleConfig, SessionBackend};
pub use error::{ApiError, FailureKind};
pub use models::{
    Barang, BarangDraft, Customer, CustomerDraft, EntityId, Order, OrderSubmission, Resource,
    Stock, StockDraft, User, UserDraft,
};
pub use dashboard::{CardValue, DashboardSummary, SummaryCard};
pub use notify::{ListMessages, Notice, NoticeBuffer, NoticeLevel, Notifier, TracingNotifier};
pub use order_form::{DraftError, FormPhase, OrderDraft, OrderForm, ReferenceTicket};
pub use resource_list::{Outcome, ResourceList};
pub use storage::{KeyringSessionStore, MemorySessionStore, SessionStore};

pub fn session_store(backend: SessionBackend) -> Arc<dyn SessionStore> {
    match backend {
        SessionBackend::Keyring => Arc::new(KeyringSessionStore::default()),
        SessionBackend::Memory => Arc::new(MemorySessionStore::new()),
    }
}

/// Run one command against the configured backend.
pub async fn execute(
    config: &ConsoleConfig,
    command: &str,
    payload: Option<Value>,
) -> Result<Value, String> {
    let api = ApiClient::new(config, session_store(config.session_backend))
        .map_err(|e| e.to_string())?;
    let state = commands::AppState::new(api);
    commands::dispatch(&state, command, payload).await
}

fn usage() -> String {
    format!(
        "usage: barang-console <command> [json-payload]\n\ncommands:\n  {}",
        commands::COMMANDS.join("\n  ")
    )
}

/// Parse `<command> [json-payload]`. The payload may be any JSON value; text
/// that is not JSON is passed through as a string (a bare id, for instance).
pub fn parse_args<I: IntoIterator<Item = String>>(args: I) -> anyhow::Result<(String, Option<Value>)> {
    let mut args = args.into_iter();
    let command = args
        .next()
        .filter(|c| !c.trim().is_empty())
        .with_context(usage)?;
    let payload = args.next().map(|raw| {
        serde_json::from_str::<Value>(&raw).unwrap_or(Value::String(raw))
    });
    if args.next().is_some() {
        anyhow::bail!("too many arguments\n\n{}", usage());
    }
    Ok((command, payload))
}

// ============================================================================
// Console entry point
// ============================================================================

/// Returns whether the command succeeded; the caller maps it to the exit
/// status.
pub fn run() -> anyhow::Result<bool> {
    let config = ConsoleConfig::from_env().context("invalid configuration")?;
    let (command, payload) = parse_args(std::env::args().skip(1))?;

    let _log_guard = logging::init(&config.log_dir);
    info!(
        version = env!("CARGO_PKG_VERSION"),
        api_url = %config.api_url,
        command = %command,
        "Starting Barang Console"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let result = runtime.block_on(execute(&config, &command, payload));
    let (output, ok) = match result {
        Ok(body) => {
            let ok = body.get("success").and_then(Value::as_bool).unwrap_or(true);
            (body, ok)
        }
        Err(message) => {
            error!(command = %command, error = %message, "command failed");
            (
                serde_json::json!({ "success": false, "error": message }),
                false,
            )
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(ok)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubServer;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_args_reads_command_and_json() {
        let (command, payload) =
            parse_args(args(&["order_delete", r#"{"id":3}"#])).expect("args parse");
        assert_eq!(command, "order_delete");
        assert_eq!(payload, Some(serde_json::json!({ "id": 3 })));
    }

    #[test]
    fn parse_args_keeps_non_json_as_string() {
        let (_, payload) = parse_args(args(&["customer_delete", "c-1"])).expect("args parse");
        assert_eq!(payload, Some(Value::String("c-1".into())));
    }

    #[test]
    fn parse_args_requires_command() {
        let err = parse_args(Vec::new()).expect_err("no command");
        assert!(err.to_string().starts_with("usage: barang-console"));
        assert!(parse_args(args(&["a", "b", "c"])).is_err());
    }

    #[tokio::test]
    async fn unknown_command_is_rejected() {
        let config = ConsoleConfig {
            session_backend: SessionBackend::Memory,
            ..ConsoleConfig::default()
        };
        let err = execute(&config, "barang_export", None)
            .await
            .expect_err("unknown command");
        assert_eq!(err, "Unknown command: barang_export");
    }

    #[tokio::test]
    async fn execute_wraps_notices_into_result() {
        let server = StubServer::start(vec![(200, r#"[{"id":1,"customer_name":"Sari"}]"#)]).await;
        let config = ConsoleConfig {
            api_url: server.url.clone(),
            session_backend: SessionBackend::Memory,
            ..ConsoleConfig::default()
        };

        let out = execute(&config, "customer_list", None)
            .await
            .expect("list runs");
        assert_eq!(out["success"], true);
        assert_eq!(out["rows"][0]["customer_name"], "Sari");
        assert_eq!(out["notices"], serde_json::json!([]));
    }
}
