use std::future::IntoFuture;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use gke_cleaner_backend::{
    handlers,
    services::{migrate, GkeClient, Reconciler, SqliteClusterStore},
    AppState, AuthService, Config,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_thread_names(true)
        .init();

    info!("🚀 Starting GKE cleaner...");

    // Load configuration
    let config = match Config::load() {
        Ok(config) => {
            info!("✅ Configuration loaded");
            config
        }
        Err(e) => {
            error!("❌ Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let connect_options = SqliteConnectOptions::from_str(&config.database_url)
        .with_context(|| format!("invalid DATABASE_URL '{}'", config.database_url))?
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(connect_options)
        .await
        .context("failed to open connection to database")?;

    // Schema must exist before the poller or the server run
    migrate::run(&pool).await.context("failed to migrate database")?;

    let cluster_store = Arc::new(SqliteClusterStore::new(pool));
    let gke_client = Arc::new(GkeClient::with_endpoint(
        config.credentials.clone(),
        config.gke_endpoint.clone(),
    ));
    let reconciler = Reconciler::from_config(&config, cluster_store.clone(), gke_client);

    let auth_service = AuthService::new(&config);
    if !auth_service.is_enabled() {
        warn!("⚠️ Basic auth is not configured, /clusters is open");
    }

    let app_state = AppState {
        config: config.clone(),
        auth_service,
        cluster_store,
    };
    let app = handlers::router(app_state);

    let listener = tokio::net::TcpListener::bind(&config.server_address)
        .await
        .with_context(|| format!("failed to bind to {}", config.server_address))?;
    info!("🌐 Server listening on {}", config.server_address);

    let cancel = CancellationToken::new();
    tokio::spawn(shutdown_on_signal(cancel.clone()));

    let server = axum::serve(listener, app).with_graceful_shutdown(cancel.clone().cancelled_owned());
    let (server_result, ()) = tokio::join!(server.into_future(), reconciler.run(cancel.clone()));

    if let Err(e) = server_result {
        error!("❌ Server error: {}", e);
        return Err(e.into());
    }

    info!("✅ Stopped gracefully");
    Ok(())
}

async fn shutdown_on_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for SIGINT: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("Shutdown signal received");
    cancel.cancel();
}
