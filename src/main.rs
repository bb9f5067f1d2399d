use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use horserank::api;
use horserank::config::{AppSettings, SettingsStore};
use horserank::monitor::{run_monitor, LcuRuntime};
use horserank::score::config::{load_score_config, run_refresh_task};
use horserank::score::ConfigStore;
use horserank::shared::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "horserank=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting horserank companion service");

    let app_settings = AppSettings::from_env();
    let settings = SettingsStore::load(&app_settings.settings_path);

    // An incomplete scoring table would silently mis-score every match, so
    // startup refuses to continue instead.
    let score_config = match load_score_config(&app_settings.score_config_path) {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "invalid score configuration");
            std::process::exit(1);
        }
    };
    let scores = match ConfigStore::new(score_config) {
        Ok(store) => store,
        Err(err) => {
            error!(error = %err, "invalid score configuration");
            std::process::exit(1);
        }
    };

    let runtime = LcuRuntime::new();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(run_monitor(
        runtime.clone(),
        scores.clone(),
        settings.clone(),
        app_settings.lockfile_path.clone(),
        shutdown_rx,
    ));
    tokio::spawn(run_refresh_task(
        scores.clone(),
        app_settings.score_config_path.clone(),
    ));

    let state = AppState::new(runtime, scores, settings);
    let app = api::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = match tokio::net::TcpListener::bind(&app_settings.http_addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(addr = %app_settings.http_addr, error = %err, "failed to bind http api");
            std::process::exit(1);
        }
    };
    info!(addr = %app_settings.http_addr, "http api listening");

    let shutdown = async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("shutting down");
        let _ = shutdown_tx.send(true);
    };
    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
    {
        error!(error = %err, "http server error");
        std::process::exit(1);
    }
}
