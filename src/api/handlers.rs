use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use chrono::Utc;
use clip_core::Action;
use log::{error, info};
use std::sync::Arc;

use super::dto::{HealthResponse, ProcessRequest, StageResponse};
use super::state::AppState;
use crate::errors::{ApiError, ApiResult};

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok".into(),
                          version: state.version.into() })
}

/// Ejecuta una etapa completa. El pipeline es síncrono y hace I/O
/// bloqueante, así que corre en `spawn_blocking`.
pub async fn process_weekly_payout(State(state): State<Arc<AppState>>,
                                   payload: Result<Json<ProcessRequest>, JsonRejection>)
                                   -> ApiResult<Json<StageResponse>> {
    let Json(req) = payload.map_err(|e| ApiError::validation(e.body_text()))?;
    let action: Action = req.action.trim().parse()?;
    info!("process-weekly-payout: action={action}");

    let runner = Arc::clone(&state.runner);
    let outcome = tokio::task::spawn_blocking(move || {
                      let mut runner = runner.lock()
                                             .map_err(|_| ApiError::internal("stage runner mutex poisoned"))?;
                      runner.run_action(action, Utc::now()).map_err(ApiError::from)
                  }).await
                    .map_err(|e| ApiError::internal(format!("stage task failed: {e}")))?;

    match outcome {
        Ok(report) => Ok(Json(StageResponse { ok: true, report })),
        Err(e) => {
            error!("process-weekly-payout: action={action} failed: {e}");
            Err(e)
        }
    }
}
