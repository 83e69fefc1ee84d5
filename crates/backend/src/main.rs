pub mod api;
pub mod domain;
pub mod projections;
pub mod shared;
pub mod usecases;

use std::net::SocketAddr;

use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() -> anyhow::Result<()> {
    let log_dir = std::path::Path::new("target").join("logs");
    std::fs::create_dir_all(&log_dir)?;
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("backend.log"))?;

    // Console plus a plain-text file under target/logs.
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,sqlx=warn,sea_orm=warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::sync::Arc::new(log_file))
                .with_ansi(false),
        )
        .init();
    Ok(())
}

// One line per request: time | duration | status | method path
async fn request_logger(req: Request<Body>, next: Next) -> Response {
    let started = std::time::Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    let status = response.status().as_u16();
    let color = if status < 400 { "36" } else { "33" };
    println!(
        "\x1b[{}m{}\x1b[0m | {:>5}ms | {} {:>6} {}",
        color,
        chrono::Utc::now().format("%H:%M:%S"),
        started.elapsed().as_millis(),
        status,
        method,
        path
    );
    response
}

fn build_router(state: api::AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    Router::new()
        .route("/health", get(|| async { "ok" }))
        // Advisory duplicate pre-check; never blocks an import
        .route(
            "/api/imports/duplicate-check",
            post(api::handlers::imports::duplicate_check),
        )
        // Batch history
        .route(
            "/api/imports/batches",
            get(api::handlers::imports::list_batches),
        )
        .route(
            "/api/imports/batches/:id",
            get(api::handlers::imports::get_batch),
        )
        // File upload per import type
        .route(
            "/api/imports/:import_type",
            post(api::handlers::imports::upload),
        )
        .layer(middleware::from_fn(request_logger))
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let config = shared::config::get();
    let db = shared::data::db::connect(&config.database.path)
        .await
        .map_err(|e| anyhow::anyhow!("db init failed: {e}"))?;

    let app = build_router(api::AppState { db });

    let addr: SocketAddr = ([0, 0, 0, 0], config.server.port).into();
    let listener = TcpListener::bind(addr).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::AddrInUse {
            tracing::error!("Port {} is already in use", config.server.port);
        }
        anyhow::anyhow!("failed to bind {addr}: {e}")
    })?;
    tracing::info!("Import service listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
