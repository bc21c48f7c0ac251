//! HTTP surface of the disability-assistance platform.
//!
//! Every endpoint answers with the `{code, msg, data}` envelope. Sessions
//! travel in `Authorization: Bearer <token>` or the `satoken` header.

use std::{path::Path, time::Duration};

use ada_core::db::DbError;
use ada_core::LoggingError;
use ada_core::model::store::NewStoreItem;
use ada_core::service::store_service::{StoreError, StoreService};
use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method,
    },
    Router,
};
use log::{info, warn};
use rusqlite::Connection;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};

pub mod config;
pub mod error;
pub mod extract;
pub mod response;
pub mod routes;
pub mod state;

use config::ConfigError;
use extract::SESSION_HEADER;
use state::AppState;

#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Logging setup failed: {0}")]
    Logging(#[from] LoggingError),

    #[error("Database setup failed: {0}")]
    Database(#[from] DbError),

    #[error("Cannot read store seed {path}: {source}")]
    SeedRead {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid store seed {path}: {source}")]
    SeedParse {
        path: String,
        source: serde_json::Error,
    },

    #[error("Store seeding failed: {0}")]
    Seed(#[from] StoreError),

    #[error("Server I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Builds the full application with CORS applied.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.allowed_origins);
    routes::routes().layer(cors).with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("event=cors_origin module=http status=error origin={origin}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            CONTENT_TYPE,
            AUTHORIZATION,
            HeaderName::from_static(SESSION_HEADER),
        ])
        .max_age(Duration::from_secs(60 * 60))
}

/// Inserts the items in the JSON file at `path` when the catalog is empty.
pub fn seed_store(conn: &Connection, path: &Path) -> Result<usize, StartupError> {
    let display = path.display().to_string();
    let raw = std::fs::read_to_string(path).map_err(|source| StartupError::SeedRead {
        path: display.clone(),
        source,
    })?;
    let items: Vec<NewStoreItem> =
        serde_json::from_str(&raw).map_err(|source| StartupError::SeedParse {
            path: display,
            source,
        })?;
    Ok(StoreService::new(conn).seed_if_empty(&items)?)
}

/// Binds the configured address and serves until Ctrl-C or SIGTERM.
pub async fn serve(state: AppState) -> Result<(), StartupError> {
    let address = state.config.socket_addr();
    let app = build_router(state);

    let listener = TcpListener::bind(address).await?;
    info!("event=server_start module=http status=ok addr={address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("event=server_stop module=http status=ok");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("event=shutdown module=http status=start signal=ctrl_c"),
            Err(err) => {
                warn!("event=shutdown module=http status=error detail={err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("event=shutdown module=http status=start signal=terminate");
            }
            Err(err) => {
                warn!("event=shutdown module=http status=error detail={err}");
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
