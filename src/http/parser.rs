use std::collections::HashMap;
use std::net::SocketAddr;

use thiserror::Error;

use crate::http::request::{ConnectionStatus, Request};
use crate::http::response::StatusCode;
use crate::http::version::HttpVersion;

/// Everything that can go wrong while reading one request off a connection.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed HTTP version {0:?}")]
    MalformedVersion(String),

    #[error("malformed request line {0:?}")]
    MalformedRequestLine(String),

    #[error("malformed header field {0:?}")]
    MalformedHeaderField(String),

    #[error("header block exceeds {limit} bytes")]
    HeaderTooLarge { limit: usize },

    #[error("invalid content-length {0:?}")]
    InvalidContentLength(String),

    #[error("unsupported HTTP version {0}")]
    UnsupportedVersion(HttpVersion),

    #[error("unsupported transfer-encoding {0:?}")]
    UnsupportedEncoding(String),

    #[error("body of {length} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { length: usize, limit: usize },

    #[error("timed out waiting for request data")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),
}

impl DecodeError {
    /// Timeouts and transport failures end the connection without a reply.
    pub fn is_connection_level(&self) -> bool {
        matches!(self, DecodeError::Timeout | DecodeError::Transport(_))
    }

    /// The status a client is told before the connection is closed, or `None`
    /// when nothing should be written.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            DecodeError::MalformedVersion(_)
            | DecodeError::MalformedRequestLine(_)
            | DecodeError::MalformedHeaderField(_)
            | DecodeError::InvalidContentLength(_) => Some(StatusCode::BadRequest),
            DecodeError::HeaderTooLarge { .. } => Some(StatusCode::RequestHeaderFieldsTooLarge),
            DecodeError::PayloadTooLarge { .. } => Some(StatusCode::PayloadTooLarge),
            DecodeError::UnsupportedVersion(_) => Some(StatusCode::HttpVersionNotSupported),
            DecodeError::UnsupportedEncoding(_) => Some(StatusCode::NotImplemented),
            DecodeError::Timeout | DecodeError::Transport(_) => None,
        }
    }
}

/// The request line and header fields of a request, before its body is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHead {
    pub method: String,
    pub request_uri: String,
    pub version: HttpVersion,
    pub fields: HashMap<String, String>,
}

impl RequestHead {
    /// Parses `<method> <request-target> <version>`.
    ///
    /// Tokens are separated by single spaces and there must be exactly three
    /// of them. Versions other than HTTP/1.x are refused.
    pub fn from_request_line(line: &str) -> Result<Self, DecodeError> {
        let words: Vec<&str> = line.split(' ').collect();

        if words.len() != 3 || words.iter().any(|w| w.is_empty()) {
            return Err(DecodeError::MalformedRequestLine(line.to_string()));
        }

        let version = HttpVersion::parse(words[2])?;
        if !version.is_supported() {
            return Err(DecodeError::UnsupportedVersion(version));
        }

        Ok(Self {
            method: words[0].to_ascii_lowercase(),
            request_uri: words[1].to_string(),
            version,
            fields: HashMap::new(),
        })
    }

    /// Adds one `name: value` line to the field map.
    pub fn push_field_line(&mut self, line: impl AsRef<[u8]>) -> Result<(), DecodeError> {
        let (name, value) = parse_field_line(line)?;
        self.fields.insert(name, value);
        Ok(())
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|v| v.as_str())
    }

    /// Number of body bytes that follow the header block.
    ///
    /// Fails for any `Transfer-Encoding`, since only `Content-Length` framing
    /// is understood.
    pub fn body_length(&self) -> Result<usize, DecodeError> {
        if let Some(encoding) = self.field("transfer-encoding") {
            return Err(DecodeError::UnsupportedEncoding(encoding.to_string()));
        }

        match self.field("content-length") {
            None => Ok(0),
            Some(value) => parse_content_length(value),
        }
    }

    /// Defaults to close unless the client sent `Connection: keep-alive`.
    pub fn connection_status(&self) -> ConnectionStatus {
        self.field("connection")
            .map(ConnectionStatus::from_header_value)
            .unwrap_or_default()
    }

    pub fn into_request(self, body: Vec<u8>, originator: SocketAddr) -> Request {
        let connection_status = self.connection_status();

        Request {
            method: self.method,
            request_uri: self.request_uri,
            version: self.version,
            fields: self.fields,
            body,
            connection_status,
            originator,
        }
    }
}

/// Splits a field line on its first colon.
///
/// The name is lower-cased and must be a non-empty UTF-8 token; continuation
/// lines (leading whitespace) are rejected along with lines lacking a colon.
/// Value bytes outside UTF-8 (obs-text) are kept, replaced by U+FFFD.
pub fn parse_field_line(line: impl AsRef<[u8]>) -> Result<(String, String), DecodeError> {
    let line = line.as_ref();
    let malformed = || DecodeError::MalformedHeaderField(String::from_utf8_lossy(line).into_owned());

    let colon = line.iter().position(|&b| b == b':').ok_or_else(malformed)?;
    let name = std::str::from_utf8(&line[..colon]).map_err(|_| malformed())?;

    if name.is_empty() || name.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(malformed());
    }

    let value = String::from_utf8_lossy(&line[colon + 1..]);
    Ok((name.to_ascii_lowercase(), value.trim().to_string()))
}

fn parse_content_length(value: &str) -> Result<usize, DecodeError> {
    let invalid = || DecodeError::InvalidContentLength(value.to_string());

    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    value.parse::<usize>().map_err(|_| invalid())
}
