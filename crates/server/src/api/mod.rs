use axum::{Router, routing::get};

use crate::utils::AppState;

mod health;

pub use health::health;

/// Retrieval/query HTTP routes and their request handling live outside this
/// crate's scope; this router exposes only what's needed to run the process
/// as a service.
pub fn app() -> Router<AppState> {
  Router::new().route("/health", get(health))
}
