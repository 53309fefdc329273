//! Server loop with bounded graceful shutdown

use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::Notify;

use super::router::router;
use super::state::AppState;

/// Serve until `shutdown` resolves, then drain and close storage.
///
/// After `shutdown` resolves the listener stops accepting and this waits at
/// most `grace` for in-flight requests. Storage is closed once the wait ends,
/// on every exit path including server errors. Connections are served on
/// their own tasks, so requests still running past `grace` are not
/// cancelled here: any further storage call they make fails, and they end
/// when the process exits.
///
/// # Errors
/// Returns the server's I/O error if it fails before shutdown.
pub async fn serve<F>(
    listener: TcpListener,
    state: AppState,
    grace: Duration,
    shutdown: F,
) -> io::Result<()>
where
    F: Future<Output = ()>,
{
    let storage = Arc::clone(&state.storage);

    let result = run(listener, state, grace, shutdown).await;

    storage.close().await;
    tracing::info!("Storage closed");

    result
}

async fn run<F>(listener: TcpListener, state: AppState, grace: Duration, shutdown: F) -> io::Result<()>
where
    F: Future<Output = ()>,
{
    let addr = listener.local_addr()?;
    let app = router(state);
    let stop = Arc::new(Notify::new());

    let mut server = {
        let stop = Arc::clone(&stop);
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { stop.notified().await })
                .await
        })
    };
    tracing::info!("Server started on {}", addr);

    tokio::select! {
        joined = &mut server => {
            tracing::error!("Server exited before shutdown was requested");
            return joined.map_err(io::Error::other)?;
        }
        () = shutdown => {
            tracing::info!("Shutting down the server");
        }
    }

    stop.notify_one();

    match tokio::time::timeout(grace, &mut server).await {
        Ok(joined) => joined.map_err(io::Error::other)??,
        Err(_) => {
            tracing::warn!(
                "In-flight requests still running after {:?}, closing storage under them",
                grace
            );
            server.abort();
        }
    }

    tracing::info!("Server shutdown successfully");
    Ok(())
}

/// Resolve on Ctrl-C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
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
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
