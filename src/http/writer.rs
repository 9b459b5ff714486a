use std::time::SystemTime;

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::field::pascal_kebab_case;
use crate::http::response::Response;

const HTTP_VERSION: &str = "HTTP/1.1";

/// Field names the writer derives itself and never copies from `fields`.
const DERIVED_FIELDS: [&str; 3] = ["date", "connection", "content-length"];

/// Serializes a response into the exact bytes sent on the wire.
///
/// `Content-Length` always reflects the length of `content`. Fields are
/// written in name order; entries that would duplicate a derived header or
/// carry a line break are dropped.
pub fn serialize_response(resp: &Response) -> Vec<u8> {
    let date = resp.date.unwrap_or_else(SystemTime::now);
    let mut buf = Vec::with_capacity(128 + resp.content.len());

    let head = format!(
        "{} {} {}\r\nDate: {}\r\nConnection: {}\r\nContent-Length: {}\r\n",
        HTTP_VERSION,
        resp.status_code,
        resp.status_response,
        httpdate::fmt_http_date(date),
        resp.connection_status,
        resp.content.len()
    );
    buf.extend_from_slice(head.as_bytes());

    let mut fields: Vec<(&String, &String)> = resp.fields.iter().collect();
    fields.sort();

    for (name, value) in fields {
        let lower = name.to_ascii_lowercase();
        if DERIVED_FIELDS.contains(&lower.as_str()) {
            continue;
        }
        if has_line_break(name) || has_line_break(value) {
            tracing::warn!(field = %name, "Dropping header field containing a line break");
            continue;
        }

        buf.extend_from_slice(pascal_kebab_case(name).as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(value.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    // Header/body separator
    buf.extend_from_slice(b"\r\n");

    buf.extend_from_slice(&resp.content);

    buf
}

fn has_line_break(s: &str) -> bool {
    s.bytes().any(|b| b == b'\r' || b == b'\n')
}

/// A serialized response and how much of it has reached the peer.
pub struct ResponseWriter {
    buffer: Vec<u8>,
    written: usize,
}

impl ResponseWriter {
    pub fn new(response: &Response) -> Self {
        Self {
            buffer: serialize_response(response),
            written: 0,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub async fn write_to_stream<W>(&mut self, stream: &mut W) -> anyhow::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        while self.written < self.buffer.len() {
            let n = stream.write(&self.buffer[self.written..]).await?;

            if n == 0 {
                return Err(anyhow::anyhow!("connection closed while writing"));
            }

            self.written += n;
        }

        stream.flush().await?;
        Ok(())
    }
}
