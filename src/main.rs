use std::sync::Arc;
use std::time::Duration;

use dotenvy::dotenv;
use mailgo::app;
use sqlx::sqlite::SqlitePoolOptions;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (silently ignore if missing)
    dotenv().ok();

    // Initialise structured logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=debug,tower_http=debug", env!("CARGO_PKG_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load config from environment
    let config = app::config::Config::from_env().unwrap_or_else(|e| {
        tracing::error!("Failed to load config (check DATABASE_URL and other env vars): {}", e);
        std::process::exit(1);
    });

    // One dispatcher per database
    let _lock = app::single_writer::acquire(&config.database_url).unwrap_or_else(|e| {
        tracing::error!("{}", e);
        std::process::exit(1);
    });

    // Connect to SQLite
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(3))
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    // Enable WAL mode and set busy timeout
    sqlx::query("PRAGMA journal_mode=WAL")
        .execute(&pool)
        .await
        .expect("Failed to set WAL mode");

    sqlx::query("PRAGMA busy_timeout=5000")
        .execute(&pool)
        .await
        .expect("Failed to set busy timeout");

    // Run embedded migrations on startup
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    // Build the delivery adapter from config
    let delivery = app::mail::from_config(&config).unwrap_or_else(|e| {
        tracing::error!("Failed to initialize mail adapter: {}", e);
        std::process::exit(1);
    });

    let decryptor = app::credentials::RsaPasswordDecryptor::from_config(&config.smtp_key).unwrap_or_else(|e| {
        tracing::error!("Failed to load SMTP password key: {}", e);
        std::process::exit(1);
    });

    let port = config.port;

    // Build the application state
    let state = app::AppState {
        db: pool,
        delivery,
        sessions: app::sessions::SendSessionRegistry::new(),
        decryptor: Arc::new(decryptor),
        config,
    };

    // Start the campaign dispatcher
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let dispatcher = state.dispatcher().spawn(shutdown_rx);

    let router = mailgo::create_router(state);

    // Start the server
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to bind to port {}: {}", port, e);
            std::process::exit(1);
        });

    tracing::info!("{} listening on http://localhost:{}", app::APP_NAME, port);

    if let Err(e) = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("Server error: {}", e);
    }

    // Let the dispatcher persist its in-flight batch
    let _ = shutdown_tx.send(true);
    if let Err(e) = dispatcher.await {
        tracing::error!("Dispatcher task failed: {}", e);
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
