use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info, warn};

use crate::handlers::RequestHandler;
use crate::http::decoder::RequestDecoder;
use crate::http::parser::DecodeError;
use crate::http::request::{ConnectionStatus, Request};
use crate::http::response::Response;
use crate::http::writer::ResponseWriter;

/// Limits applied to every connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionSettings {
    /// Reading stops this long after the connection was accepted
    pub total_timeout: Duration,
    /// Longest wait for any single read to return data
    pub transfer_timeout: Duration,
    pub max_header_bytes: usize,
    pub max_body_bytes: usize,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            total_timeout: Duration::from_millis(10_000),
            transfer_timeout: Duration::from_millis(1_000),
            max_header_bytes: 8 * 1024,
            max_body_bytes: 8 * 1024 * 1024,
        }
    }
}

pub struct Connection<S> {
    stream: S,
    peer: SocketAddr,
    decoder: RequestDecoder,
    handler: Arc<dyn RequestHandler>,
    state: ConnectionState,
}

pub enum ConnectionState {
    Reading,
    Dispatching(Request),
    Writing(ResponseWriter, ConnectionStatus),
    Closed,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(
        stream: S,
        peer: SocketAddr,
        handler: Arc<dyn RequestHandler>,
        settings: ConnectionSettings,
    ) -> Self {
        Self {
            stream,
            peer,
            decoder: RequestDecoder::new(settings),
            handler,
            state: ConnectionState::Reading,
        }
    }

    /// Serves requests until the connection closes.
    ///
    /// The stream is shut down exactly once on the way out, whatever ended
    /// the session. Timeouts and clean disconnects are not errors.
    pub async fn run(mut self) -> anyhow::Result<()> {
        let outcome = self.drive().await;

        if let Err(e) = self.stream.shutdown().await {
            debug!(peer = %self.peer, error = %e, "Shutdown failed");
        }
        info!("[{}] Client disconnected", self.peer);

        outcome
    }

    async fn drive(&mut self) -> anyhow::Result<()> {
        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Reading => {
                    self.state = self.read_request().await?;
                }

                ConnectionState::Dispatching(req) => {
                    let response = self.dispatch(req).await?;
                    let status = response.connection_status;

                    self.state = ConnectionState::Writing(ResponseWriter::new(&response), status);
                }

                ConnectionState::Writing(mut writer, status) => {
                    writer.write_to_stream(&mut self.stream).await?;

                    self.state = match status {
                        ConnectionStatus::KeepAlive => ConnectionState::Reading,
                        ConnectionStatus::Close => ConnectionState::Closed,
                    };
                }

                ConnectionState::Closed => {
                    return Ok(());
                }
            }
        }
    }

    async fn read_request(&mut self) -> anyhow::Result<ConnectionState> {
        let err = match self.decoder.next_request(&mut self.stream, self.peer).await {
            Ok(Some(req)) => {
                debug!(
                    peer = %self.peer,
                    method = %req.method,
                    path = %req.request_uri,
                    "Request received"
                );
                return Ok(ConnectionState::Dispatching(req));
            }
            Ok(None) => return Ok(ConnectionState::Closed),
            Err(e) => e,
        };

        if err.is_connection_level() {
            debug!(
                peer = %self.peer,
                elapsed_ms = self.decoder.initiated().elapsed().as_millis() as u64,
                error = %err,
                "Closing connection"
            );
            return match err {
                DecodeError::Timeout => Ok(ConnectionState::Closed),
                other => Err(other.into()),
            };
        }

        warn!(peer = %self.peer, error = %err, "Bad request");

        Ok(match err.status() {
            Some(status) => {
                let mut response = Response::error_page(status);
                response.date = Some(SystemTime::now());
                ConnectionState::Writing(ResponseWriter::new(&response), ConnectionStatus::Close)
            }
            None => ConnectionState::Closed,
        })
    }

    /// Runs the handler off the async workers; file access may block.
    async fn dispatch(&mut self, req: Request) -> anyhow::Result<Response> {
        let dispatched_at = SystemTime::now();
        let handler = Arc::clone(&self.handler);
        let method = req.method.clone();
        let path = req.request_uri.clone();

        let mut response = tokio::task::spawn_blocking(move || handler.make_response(req))
            .await
            .map_err(|e| {
                error!(peer = %self.peer, method = %method, path = %path, "Handler failed: {}", e);
                anyhow::anyhow!("handler failed for {} {}: {}", method, path, e)
            })?;

        response.date.get_or_insert(dispatched_at);

        debug!(
            peer = %self.peer,
            method = %method,
            path = %path,
            status = response.status_code,
            connection = %response.connection_status,
            "Response ready"
        );

        Ok(response)
    }
}
