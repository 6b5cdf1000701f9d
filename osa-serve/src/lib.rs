//! Axum HTTP server exposing the OSA external interface (spec §6):
//! newline-delimited SSE event streams plus a submit/cancel JSON endpoint
//! per session.
//!
//! **Public API**: [`run_serve`], [`run_serve_on_listener`], [`AppState`].

mod app;
mod error;
mod events;
mod session_runner;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::info;

pub use app::AppState;
use app::router;

const DEFAULT_ADDR: &str = "127.0.0.1:8080";

/// Runs the server on an existing listener. Used by tests (bind to
/// `127.0.0.1:0`, then pass the listener in). When `once` is true, the
/// server shuts down gracefully after the first submitted turn completes.
pub async fn run_serve_on_listener(
    listener: TcpListener,
    state: Arc<AppState>,
    once: bool,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = listener.local_addr()?;
    info!(%addr, "osa-serve listening");

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    if once {
        *state.shutdown_tx.lock().unwrap() = Some(shutdown_tx);
    }

    let app = router(state);
    if once {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await?;
        info!("connection done, exiting (once mode)");
    } else {
        axum::serve(listener, app).await?;
    }
    Ok(())
}

/// Runs the server. Listens on `addr` (default `127.0.0.1:8080`).
pub async fn run_serve(
    addr: Option<&str>,
    state: Arc<AppState>,
    once: bool,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = addr.unwrap_or(DEFAULT_ADDR);
    let listener = TcpListener::bind(addr).await?;
    run_serve_on_listener(listener, state, once).await
}
