//! Winddown - A state-managed HTTP server for evening wind-down countdown timing
//!
//! This is the main entry point for the winddown application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use winddown::{
    api::create_router,
    config::Config,
    services::{CompletionNotifier, SettingsStore, SystemNotifier},
    state::AppState,
    tasks::countdown_task,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("winddown={},tower_http=info", config.log_level()))
        .init();

    info!("Starting winddown server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, settings={}",
          config.host, config.port, config.settings_file.display());

    // Seed the countdown duration from the persisted settings
    let settings = SettingsStore::new(config.settings_file.clone());
    let duration_minutes = settings.load_duration(config.duration).await;
    info!("Countdown duration seeded with {} minutes", duration_minutes);

    // Create application state and the notification surface
    let state = Arc::new(AppState::new(config.port, config.host.clone(), duration_minutes));
    let notifier: Arc<dyn CompletionNotifier> = Arc::new(SystemNotifier::new(!config.no_sound));

    // Start the countdown tick background task
    let timer_state = Arc::clone(&state);
    tokio::spawn(async move {
        countdown_task(timer_state, notifier).await;
    });

    // Create HTTP router with all endpoints
    let app = create_router(state, settings);

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /timer/start    - Start the countdown");
    info!("  POST /timer/pause    - Pause the countdown");
    info!("  POST /timer/resume   - Resume a paused countdown");
    info!("  POST /timer/stop     - Stop and reset the countdown");
    info!("  PUT  /timer/duration - Change the configured duration");
    info!("  GET  /timer          - Current timer snapshot");
    info!("  GET  /status         - Timer and server status");
    info!("  GET  /health         - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    info!("Server shutdown complete");
    Ok(())
}
