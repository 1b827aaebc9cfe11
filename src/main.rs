//! BrightPath backend - job application tracking API
//! Mission: Accounts, JWT sessions, application CRUD, and AI writing helpers

use anyhow::{Context, Result};
use dotenv::dotenv;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::interval;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use brightpath_backend::{router, AppConfig, AppState, RateLimiters};

#[tokio::main]
async fn main() -> Result<()> {
    load_env();
    init_tracing();

    let config = AppConfig::from_env()?;
    let environment = config.environment;
    let port = config.port;

    info!("🚀 BrightPath API starting ({environment:?})");

    let state = AppState::new(config)?;
    let limiters = RateLimiters::new(environment);
    let app = router(state, &limiters);

    // Evict expired rate-limit windows so the per-IP maps stay bounded.
    let sweeper = limiters.clone();
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(300));
        loop {
            ticker.tick().await;
            sweeper.cleanup_all();
        }
    });

    let addr = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("🎯 API server listening on {addr}");

    // ConnectInfo feeds the per-IP rate limiters and request logging.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}

fn load_env() {
    // Standard dotenv search (cwd + parents), then the crate directory so
    // running with --manifest-path from elsewhere still finds .env.
    let _ = dotenv();

    let manifest_env = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    if manifest_env.exists() {
        let _ = dotenv::from_path(&manifest_env);
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "brightpath_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
