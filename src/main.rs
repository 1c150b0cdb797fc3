//!
//! SmartStay booking backend server.
//! Reads configuration from TOML file (~/.config/smartstay/config.toml).

use std::sync::Arc;

use sea_orm_migration::MigratorTrait;
use tracing::{error, info, warn};

use smartstay::auth::{hash_password, JwtConfig};
use smartstay::domain::{RepositoryProvider, User};
use smartstay::infrastructure::database::Migrator;
use smartstay::infrastructure::email::TracingMailer;
use smartstay::shared::ShutdownCoordinator;
use smartstay::{
    create_api_router, create_event_bus, default_config_path, init_database, AppConfig, AppState,
    AuthGateway, DatabaseConfig, RateLimiter, SeaOrmRepositoryProvider, TokenService,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── Load configuration ─────────────────────────────────────
    let config_path = std::env::var("SMARTSTAY_CONFIG")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| default_config_path());
    let app_cfg = match AppConfig::load(&config_path) {
        Ok(cfg) => {
            // Initialize logging with configured level
            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cfg.logging.level)),
                )
                .init();
            info!("Configuration loaded from {}", config_path.display());
            cfg
        }
        Err(e) => {
            tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::new("info"))
                .init();
            error!("Failed to load config: {}. Using defaults.", e);
            AppConfig::default()
        }
    };

    info!("Starting SmartStay booking backend...");

    // ── Prometheus metrics recorder (must be installed before any metrics calls) ──
    let prometheus_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    info!("📊 Prometheus metrics recorder installed");

    // ── Database ───────────────────────────────────────────────
    let db_config = DatabaseConfig {
        url: app_cfg.database.connection_url(),
    };
    info!("Database: {}", db_config.url);

    let db = match init_database(&db_config).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            return Err(e.into());
        }
    };

    info!("Running database migrations...");
    if let Err(e) = Migrator::up(&db, None).await {
        error!("Failed to run migrations: {}", e);
        return Err(e.into());
    }
    info!("Migrations completed");

    let repos: Arc<dyn RepositoryProvider> = Arc::new(SeaOrmRepositoryProvider::new(db.clone()));

    // Seed the configured admin account when the database is empty
    create_default_admin(repos.as_ref(), &app_cfg).await;

    // ── Core services ──────────────────────────────────────────
    let jwt_config = JwtConfig {
        secret: app_cfg.security.jwt_secret.clone(),
        session_ttl_hours: app_cfg.security.session_ttl_hours,
        confirmation_ttl_hours: app_cfg.security.confirmation_ttl_hours,
        issuer: "smartstay".to_string(),
    };
    info!(
        "JWT configured: {}h sessions, {}h confirmation links",
        app_cfg.security.session_ttl_hours, app_cfg.security.confirmation_ttl_hours
    );

    let tokens = TokenService::new(jwt_config);
    let gateway = Arc::new(AuthGateway::new(tokens.clone(), Arc::clone(&repos)));
    let rate_limiter = Arc::new(RateLimiter::new(
        app_cfg.rate_limit.window_secs,
        app_cfg.rate_limit.max_requests,
    ));
    let mailer = Arc::new(TracingMailer::new(app_cfg.email.from.clone()));

    // Event bus for real-time notifications
    let event_bus = create_event_bus();
    info!("🔔 Event bus initialized for real-time notifications");

    // Shutdown coordinator listening for SIGTERM/SIGINT
    let shutdown = ShutdownCoordinator::new(app_cfg.server.shutdown_timeout);
    let shutdown_signal = shutdown.signal();
    shutdown.start_signal_listener();

    // ── REST API server ────────────────────────────────────────
    let state = AppState {
        repos,
        gateway,
        tokens,
        rate_limiter,
        mailer,
        event_bus,
        public_url: app_cfg.server.public_url.clone(),
    };
    let router = create_api_router(state, prometheus_handle);

    let api_addr = format!("{}:{}", app_cfg.server.host, app_cfg.server.port);
    let listener = tokio::net::TcpListener::bind(&api_addr).await?;
    info!("REST API server listening on http://{}", api_addr);
    info!("Swagger UI available at http://{}/docs/", api_addr);

    let api_shutdown = shutdown_signal.clone();
    let server = axum::serve(
        listener,
        router.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        api_shutdown.wait().await;
        info!("🛑 REST API server received shutdown signal");
    });

    info!("🚀 Server started. Press Ctrl+C to shutdown gracefully.");

    // Bound the connection drain: once shutdown is triggered, give open
    // connections `shutdown_timeout` seconds before dropping them
    let drain_timeout = std::time::Duration::from_secs(shutdown.timeout_secs());
    tokio::select! {
        result = server => {
            if let Err(e) = result {
                error!("REST API server error: {}", e);
            }
        }
        _ = async {
            shutdown_signal.wait().await;
            tokio::time::sleep(drain_timeout).await;
        } => {
            warn!(
                "Graceful shutdown timed out after {}s, dropping open connections",
                drain_timeout.as_secs()
            );
        }
    }

    // Perform final cleanup
    info!("🧹 Performing final cleanup...");

    if let Err(e) = db.close().await {
        warn!("Error closing database connection: {}", e);
    } else {
        info!("✅ Database connection closed");
    }

    info!("👋 SmartStay backend shutdown complete");
    Ok(())
}

/// Create the configured admin account if the users table is empty
async fn create_default_admin(repos: &dyn RepositoryProvider, app_cfg: &AppConfig) {
    let users = match repos.users().count().await {
        Ok(n) => n,
        Err(e) => {
            error!("Failed to count users: {}", e);
            return;
        }
    };
    if users > 0 {
        return;
    }

    info!("No users found, creating default admin account...");

    let mut admin = User::new(
        &app_cfg.admin.email,
        &app_cfg.admin.first_name,
        &app_cfg.admin.last_name,
        hash_password(&app_cfg.admin.password),
    );
    admin.is_admin = true;
    admin.is_confirmed = true;
    let email = admin.email.clone();

    match repos.users().save(admin).await {
        Ok(()) => {
            info!("Default admin created: {}", email);
            warn!("⚠️  Change the default admin password before going to production");
        }
        Err(e) => error!("Failed to create admin user: {}", e),
    }
}
