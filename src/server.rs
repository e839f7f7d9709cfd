use axum::Router;
use hyper::server::conn::http1;
use hyper_util::{
    rt::TokioIo,
    server::graceful::GracefulShutdown,
    service::TowerToHyperService,
};
use std::{future::Future, io, time::Duration};
use tokio::{net::TcpListener, signal, task::JoinSet};

/// serve
///
/// Runs the HTTP server on `listener` until `shutdown` resolves, then drains.
///
/// Every connection is served in its own task, owned by this function. Once `shutdown`
/// fires the listener is dropped, open connections are told to finish their current
/// request and close, and they get up to `grace` to do so. Connection tasks still
/// running after that are aborted, which drops the handler futures along with any store
/// call they were awaiting.
///
/// Returns only once no connection task is left. The caller owns any cleanup that must
/// happen after the last request, such as closing the repository.
pub async fn serve<F>(
    listener: TcpListener,
    app: Router,
    shutdown: F,
    grace: Duration,
) -> io::Result<()>
where
    F: Future<Output = ()> + Send,
{
    let graceful = GracefulShutdown::new();
    let mut connections = JoinSet::new();

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, remote) = match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to accept connection");
                        continue;
                    }
                };

                let service = TowerToHyperService::new(app.clone());
                let connection = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service);
                let connection = graceful.watch(connection);

                connections.spawn(async move {
                    if let Err(e) = connection.await {
                        tracing::debug!(%remote, error = %e, "Connection closed with error");
                    }
                });
            }
            // Reap finished connections so the set does not grow with every client.
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
            _ = &mut shutdown => break,
        }
    }

    drop(listener);
    tracing::info!(
        grace_secs = grace.as_secs_f64(),
        open_connections = connections.len(),
        "Shutdown requested, draining in-flight requests"
    );

    let drained = tokio::time::timeout(grace, async {
        graceful.shutdown().await;
        while connections.join_next().await.is_some() {}
    })
    .await;

    match drained {
        Ok(()) => tracing::info!("HTTP server drained"),
        Err(_) => {
            tracing::warn!(
                remaining = connections.len(),
                "Shutdown grace period elapsed, aborting remaining requests"
            );
            connections.abort_all();
            while connections.join_next().await.is_some() {}
        }
    }

    Ok(())
}

/// shutdown_signal
///
/// Resolves on Ctrl+C or, on unix, SIGTERM. If a handler cannot be installed that
/// source is logged and ignored, so the other one still works.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::warn!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::warn!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
