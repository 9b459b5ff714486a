use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::handlers::RequestHandler;
use crate::http::connection::{Connection, ConnectionSettings};

/// Binds the listening socket. This is the only step allowed to fail.
pub async fn bind(host: &str, port: u16) -> anyhow::Result<TcpListener> {
    let listener = TcpListener::bind((host, port))
        .await
        .with_context(|| format!("failed to listen on {}:{}", host, port))?;

    info!("Listening on {}", listener.local_addr()?);
    Ok(listener)
}

/// Accepts connections forever, one task per connection.
///
/// Accept failures are logged and skipped.
pub async fn serve(
    listener: TcpListener,
    handler: Arc<dyn RequestHandler>,
    settings: ConnectionSettings,
) -> anyhow::Result<()> {
    loop {
        let (socket, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                error!("Error accepting connection: {}", e);
                continue;
            }
        };
        info!("[{}] Connection accepted", peer);

        let handler = Arc::clone(&handler);
        tokio::spawn(async move {
            let conn = Connection::new(socket, peer, handler, settings);
            if let Err(e) = conn.run().await {
                warn!("Connection error from {}: {}", peer, e);
            }
        });
    }
}

/// Listens on `host:port` and serves with `handler` until the task is dropped.
pub async fn listen_and_serve(
    host: &str,
    port: u16,
    handler: Arc<dyn RequestHandler>,
    settings: ConnectionSettings,
) -> anyhow::Result<()> {
    let listener = bind(host, port).await?;
    serve(listener, handler, settings).await
}

pub async fn run(cfg: &Config) -> anyhow::Result<()> {
    listen_and_serve(
        &cfg.server.host,
        cfg.server.port,
        cfg.handler.build(),
        cfg.server.connection_settings(),
    )
    .await
}
