use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::{prelude::*, state::AppState};

#[derive(Debug, Serialize)]
pub struct Health {
  status: &'static str,
  version: &'static str,
}

pub async fn health() -> Json<Health> {
  Json(Health { status: "ok", version: env!("CARGO_PKG_VERSION") })
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Stats {
  pub users: u64,
  pub approved_users: u64,
  pub services: u64,
  pub pending_topups: u64,
  pub support_messages: u64,
  pub open_service_requests: usize,
  pub active_dialogs: usize,
}

async fn collect(app: &AppState) -> Result<Stats> {
  let sv = app.sv();

  Ok(Stats {
    users: sv.user.count().await?,
    approved_users: sv.user.count_approved().await?,
    services: sv.catalog.count().await?,
    pending_topups: sv.purchase.count_pending().await?,
    support_messages: sv.support.count().await?,
    open_service_requests: app.service_requests.len(),
    active_dialogs: app.dialogs.len(),
  })
}

pub async fn stats(
  State(app): State<Arc<AppState>>,
) -> Result<Json<Stats>, (StatusCode, Json<json::Value>)> {
  collect(&app).await.map(Json).map_err(|err| {
    error!("Failed to collect stats: {}", err);
    (
      StatusCode::INTERNAL_SERVER_ERROR,
      Json(json::json!({ "error": err.user_message() })),
    )
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{config::Config, dialog::Dialog, sv::test_utils::test_db};

  fn config() -> Config {
    Config {
      token: "123:test".into(),
      admin_id: 1,
      db_url: "sqlite::memory:".into(),
      port: 0,
      dialog_ttl: Duration::from_secs(60),
    }
  }

  #[tokio::test]
  async fn test_stats_counts_everything() {
    let db = test_db::setup().await;
    test_db::user(&db, 10, 0, true).await;
    test_db::user(&db, 11, 0, false).await;

    let app = Arc::new(AppState::with_db(config(), db));
    let sv = app.sv();
    sv.catalog.set_price("V2Ray", 50_000).await.unwrap();
    sv.purchase.create(10, 20_000, "card").await.unwrap();
    sv.support.record(11, "hi").await.unwrap();
    app.dialogs.set(11, Dialog::Support);
    app.service_requests.open(10, "V2Ray".into());

    let Json(stats) = stats(State(app)).await.unwrap();
    assert_eq!(
      stats,
      Stats {
        users: 2,
        approved_users: 1,
        services: 1,
        pending_topups: 1,
        support_messages: 1,
        open_service_requests: 1,
        active_dialogs: 1,
      }
    );
  }

  #[tokio::test]
  async fn test_health() {
    let Json(health) = health().await;
    assert_eq!(health.status, "ok");
  }
}
