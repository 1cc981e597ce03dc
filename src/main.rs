// Main entry point for the ticket desk service

use ticket_desk::api::{create_router, AppState};
use ticket_desk::auth::audit_logger::AuditLogger;
use ticket_desk::config::Config;
use ticket_desk::store::seed::SeedData;
use ticket_desk::store::{MemoryStore, PgStore, Store};

use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load and validate configuration first (before any logging)
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // 2. Initialize tracing subscriber with config values
    init_tracing(&config)?;

    info!("Starting ticket desk");
    info!(
        bind_address = %config.bind_address,
        port = config.port,
        frontend_url = %config.frontend_url,
        "Configuration loaded"
    );

    // 3. Initialize storage (Postgres, or seeded in-memory store)
    let (store, db_pool): (Arc<dyn Store>, Option<Arc<sqlx::PgPool>>) =
        if let Some(ref database_url) = config.database_url {
            let pg = PgStore::connect(database_url).await.map_err(|e| {
                error!(error = %e, "Failed to connect to database");
                e
            })?;
            pg.migrate().await?;
            let pool = Arc::new(pg.pool().clone());
            info!("Postgres store initialized");
            (Arc::new(pg), Some(pool))
        } else if let Some(ref seed_path) = config.seed_yaml_path {
            let memory = MemoryStore::new();
            SeedData::from_file(seed_path)
                .map_err(|e| {
                    error!(error = %e, path = ?seed_path, "Failed to load seed file");
                    e
                })?
                .apply(&memory)
                .await?;
            warn!("Using in-memory store; data is lost on shutdown");
            (Arc::new(memory), None)
        } else {
            return Err("Either DATABASE_URL or SEED_YAML_PATH must be set".into());
        };

    // 4. Initialize audit logger
    let audit_logger = Arc::new(AuditLogger::new(db_pool));
    info!("Audit logger initialized");

    // 5. Create state and router
    let app_state = AppState::new(config.clone(), store, audit_logger)?;
    let auth_state = app_state.auth_state();
    let router = create_router(app_state, auth_state)?;
    info!("Router created");

    // 6. Start HTTP server
    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
        error!(error = %e, addr = %addr, "Failed to bind to address");
        e
    })?;

    info!(addr = %addr, "Server listening on {}", addr);

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!(error = %e, "Server error");
            e
        })?;

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing subscriber based on configuration
///
/// `RUST_LOG` wins over `LOG_LEVEL` when set.
fn init_tracing(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.to_lowercase()))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = fmt()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_env_filter(filter);

    if config.log_format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Ctrl+C received, starting graceful shutdown");
        },
        _ = terminate => {
            info!("SIGTERM received, starting graceful shutdown");
        },
    }
}
