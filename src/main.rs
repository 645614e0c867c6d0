//! Workout Timer - a single-screen workout stopwatch
//! 
//! This is the main entry point for the workout-timer application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

use workout_timer::{
    api::create_router,
    config::Config,
    persistence::FileStore,
    state::{AppState, SystemClock},
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("workout_timer={},tower_http=info", config.log_level()))
        .init();

    info!("Starting workout-timer v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, data_file={}, tick={}ms",
          config.host, config.port, config.data_file.display(), config.tick_ms);

    // Durable label state from the previous run, if any
    let durable = FileStore::open_or_empty(&config.data_file);

    let state = Arc::new(AppState::new(
        config.port,
        config.host.clone(),
        config.tick_interval(),
        Arc::new(SystemClock),
        Box::new(durable),
    ));

    let app = create_router(Arc::clone(&state));

    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /start                - Start or resume the stopwatch");
    info!("  POST /pause                - Pause the stopwatch");
    info!("  POST /stop                 - Stop and record the workout");
    info!("  PUT  /workout-type         - Set the workout type");
    info!("  GET  /display              - Current timer display");
    info!("  POST /lifecycle/recreate   - Rebuild the screen (configuration change)");
    info!("  POST /lifecycle/background - Screen hidden, persist labels");
    info!("  POST /lifecycle/foreground - Screen visible again");
    info!("  GET  /status               - Display and server status");
    info!("  GET  /health               - Health check");

    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    if let Err(e) = state.leave_foreground() {
        error!("Failed to persist state on shutdown: {}", e);
    }

    info!("Server shutdown complete");
    Ok(())
}
