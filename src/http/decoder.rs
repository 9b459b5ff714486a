use std::io;
use std::net::SocketAddr;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::{Instant, timeout};

use crate::http::connection::ConnectionSettings;
use crate::http::parser::{DecodeError, RequestHead};
use crate::http::request::Request;

const READ_CHUNK: usize = 1024;

/// Pulls requests off one connection, a line at a time.
///
/// Bytes read past the end of a request stay in the buffer and are the start
/// of the next one. Every read is bounded by the per-transfer timeout and by
/// whatever is left of the total connection timeout, whichever is shorter.
pub struct RequestDecoder {
    buffer: BytesMut,
    initiated: Instant,
    settings: ConnectionSettings,
}

impl RequestDecoder {
    pub fn new(settings: ConnectionSettings) -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
            initiated: Instant::now(),
            settings,
        }
    }

    /// When the connection was opened. The total timeout counts from here.
    pub fn initiated(&self) -> Instant {
        self.initiated
    }

    /// Bytes received but not yet consumed by a request.
    pub fn buffered(&self) -> &[u8] {
        &self.buffer
    }

    /// Reads exactly one request.
    ///
    /// Returns `Ok(None)` if the peer closed the connection cleanly before
    /// sending anything of a new request.
    pub async fn next_request<R>(
        &mut self,
        src: &mut R,
        originator: SocketAddr,
    ) -> Result<Option<Request>, DecodeError>
    where
        R: AsyncRead + Unpin,
    {
        let mut header_bytes = 0;

        // Blank lines ahead of the request line are tolerated.
        let mut head = loop {
            let Some(line) = self.read_line(src, &mut header_bytes, true).await? else {
                return Ok(None);
            };
            if line.is_empty() {
                continue;
            }
            let line = std::str::from_utf8(&line).map_err(|_| {
                DecodeError::MalformedRequestLine(String::from_utf8_lossy(&line).into_owned())
            })?;
            break RequestHead::from_request_line(line)?;
        };

        loop {
            let Some(line) = self.read_line(src, &mut header_bytes, false).await? else {
                return Err(closed_mid_request());
            };
            if line.is_empty() {
                break;
            }
            head.push_field_line(&line)?;
        }

        let length = head.body_length()?;
        let body = self.read_body(src, length).await?;

        Ok(Some(head.into_request(body, originator)))
    }

    /// Returns the next line without its line ending.
    ///
    /// Lines end in `\r\n`; a bare `\n` is accepted as well.
    ///
    /// `consumed` tracks the size of the header block so far; the line is
    /// refused once it would push the block past the configured limit.
    async fn read_line<R>(
        &mut self,
        src: &mut R,
        consumed: &mut usize,
        at_boundary: bool,
    ) -> Result<Option<BytesMut>, DecodeError>
    where
        R: AsyncRead + Unpin,
    {
        let limit = self.settings.max_header_bytes;
        let mut scanned = 0;

        loop {
            if let Some(pos) = self.buffer[scanned..].iter().position(|&b| b == b'\n') {
                let end = scanned + pos + 1;
                if *consumed + end > limit {
                    return Err(DecodeError::HeaderTooLarge { limit });
                }
                *consumed += end;

                let mut line = self.buffer.split_to(end);
                line.truncate(end - 1);
                if line.last() == Some(&b'\r') {
                    line.truncate(line.len() - 1);
                }
                return Ok(Some(line));
            }

            scanned = self.buffer.len();
            if *consumed + scanned > limit {
                return Err(DecodeError::HeaderTooLarge { limit });
            }

            if self.fill(src).await? == 0 {
                if at_boundary && *consumed == 0 && self.buffer.is_empty() {
                    return Ok(None);
                }
                return Err(closed_mid_request());
            }
        }
    }

    async fn read_body<R>(&mut self, src: &mut R, length: usize) -> Result<Vec<u8>, DecodeError>
    where
        R: AsyncRead + Unpin,
    {
        let limit = self.settings.max_body_bytes;
        if length > limit {
            return Err(DecodeError::PayloadTooLarge { length, limit });
        }

        while self.buffer.len() < length {
            if self.fill(src).await? == 0 {
                return Err(closed_mid_request());
            }
        }

        Ok(self.buffer.split_to(length).to_vec())
    }

    /// One read from the source, appended to the buffer.
    async fn fill<R>(&mut self, src: &mut R) -> Result<usize, DecodeError>
    where
        R: AsyncRead + Unpin,
    {
        let deadline = self.initiated + self.settings.total_timeout;
        let remaining = deadline
            .checked_duration_since(Instant::now())
            .filter(|d| !d.is_zero())
            .ok_or(DecodeError::Timeout)?;
        let wait = remaining.min(self.settings.transfer_timeout);

        self.buffer.reserve(READ_CHUNK);
        match timeout(wait, src.read_buf(&mut self.buffer)).await {
            Ok(read) => Ok(read?),
            Err(_) => Err(DecodeError::Timeout),
        }
    }
}

fn closed_mid_request() -> DecodeError {
    DecodeError::Transport(io::Error::new(
        io::ErrorKind::UnexpectedEof,
        "connection closed in the middle of a request",
    ))
}
