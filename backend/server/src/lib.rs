//! Documentation of a RUT lookup page backed by a Google Sheet.
//!
//!
//!
//! # General Infrastructure
//! - Single axum server serves both the page and the JSON endpoint
//! - The sheet is the only data store, nothing is written anywhere
//! - Google access goes through a service account with read-only scope
//! - Every lookup reads the whole `A:AZ` range and filters in memory, a few thousand rows at most
//!
//!
//!
//! # Endpoints
//!
//! | Method | Path          | Purpose                                      |
//! |--------|---------------|----------------------------------------------|
//! | GET    | `/`           | Lookup page                                  |
//! | POST   | `/`           | Form fallback, renders results server side   |
//! | POST   | `/api/sheets` | `{ "rut": "..." }` to `{ "data", "headers" }` |
//!
//! Any other method on `/api/sheets` gets a 405 with a JSON error body. Errors are always
//! `{ "error": "<message>" }`:
//!
//! - 400 missing, empty or non-string `rut`
//! - 404 empty sheet, or no row with that RUT in column A
//! - 500 anything upstream, details only in the logs
//!
//!
//!
//! # Setup
//!
//! Environment (or `.env`, or `/run/secrets/<NAME>`):
//! - `GOOGLE_SERVICE_ACCOUNT_EMAIL`
//! - `GOOGLE_PRIVATE_KEY`, escaped `\n` are fine
//! - `GOOGLE_SHEET_ID`
//! - `RUST_PORT`, defaults to 1111
//!
//! Run with logs.
//! ```sh
//! RUST_LOG=info cargo run -p backend
//! ```
//!
//! Query a running server.
//! ```sh
//! cargo run -p tester -- 12345678-9
//! ```
use std::{io, sync::Arc, time::Duration};

use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::{any, get},
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod error;
pub mod lookup;
pub mod page;
pub mod routes;
pub mod state;

use routes::{form_handler, index_handler, sheets_handler};
use state::AppState;

pub async fn start_server() -> io::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        // logging is not up yet
        eprintln!("No .env loaded: {e}");
    }

    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = AppState::new();

    info!("Starting server...");

    let address = format!("0.0.0.0:{}", state.config.port);
    let app = app(state);

    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");

    Ok(())
}

pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/", get(index_handler).post(form_handler))
        .route("/api/sheets", any(sheets_handler))
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                warn!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install signal handler: {e}");
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
}
