use axum::Json;
use axum::extract::State;
use serde_json::{Value, json};

use crate::utils::AppState;

pub async fn health(State(state): State<AppState>) -> Json<Value> {
  let db_ok = state.db.ping().await.is_ok();

  Json(json!({
    "status": if db_ok { "ok" } else { "degraded" },
    "db": db_ok,
  }))
}
