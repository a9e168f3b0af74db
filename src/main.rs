use clip_core::PayoutPipeline;
use clip_persistence::{build_pool, PgPayoutStore, PoolProvider};
use clipflow::{config, create_router, AppState, CoreError};
use log::{error, info};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("clipflow: {e}");
        eprintln!("clipflow: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CoreError> {
    let cfg = config()?;
    env_logger::Builder::new().parse_filters(&cfg.log_filter).init();

    let db = cfg.database.clone();
    let pool = tokio::task::spawn_blocking(move || build_pool(&db.url, db.min_connections, db.max_connections))
        .await
        .map_err(|e| CoreError::Internal(format!("pool task: {e}")))??;
    let pipeline = PayoutPipeline::new(PgPayoutStore::new(PoolProvider { pool }));
    let state = Arc::new(AppState::new(Box::new(pipeline)));

    let listener = tokio::net::TcpListener::bind(&cfg.listen_addr).await?;
    info!("clipflow listening on {}", cfg.listen_addr);
    axum::serve(listener, create_router(state)).await?;
    Ok(())
}
