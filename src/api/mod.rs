//! Superficie HTTP del pipeline.
//!
//! - `POST /process-weekly-payout` con `{ "action": ... }` ejecuta una etapa.
//! - `GET /health` para sondas de vida.

mod dto;
mod handlers;
mod state;

pub use dto::{HealthResponse, ProcessRequest, StageResponse};
pub use handlers::{health_check, process_weekly_payout};
pub use state::AppState;

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new().route("/health", get(health_check))
                 .route("/process-weekly-payout", post(process_weekly_payout))
                 .with_state(state)
}
