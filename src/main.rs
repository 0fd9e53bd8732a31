use exam_attempt_backend::{
    config::{get_config, init_config},
    database::pool::create_pool,
    routes, AppState,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

/// How often the expiry sweeper re-derives remaining time from persisted
/// anchors. Attempts overdue between ticks are still finalized with the
/// correct deadline semantics because the anchor never moves.
const EXPIRY_SWEEP_INTERVAL_SECS: u64 = 15;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let pool = create_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let app_state = AppState::from_pool(pool);

    {
        let state = app_state.clone();
        tokio::spawn(async move {
            loop {
                if let Err(e) = state.attempt_service.sweep_expired().await {
                    tracing::error!("Expiry sweeper error: {:?}", e);
                }
                tokio::time::sleep(Duration::from_secs(EXPIRY_SWEEP_INTERVAL_SECS)).await;
            }
        });
    }

    let app = routes::app_router(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
