use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};

use crate::http::version::HttpVersion;

/// Whether a connection stays open after the current exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    /// Close after the response is written.
    #[default]
    Close,
    /// Keep reading requests on the same connection.
    KeepAlive,
}

impl ConnectionStatus {
    /// Interprets the value of a `Connection` header.
    ///
    /// The value is a comma-separated token list. A `keep-alive` token selects
    /// [`ConnectionStatus::KeepAlive`] unless a `close` token is also present.
    /// Anything else falls back to [`ConnectionStatus::Close`].
    pub fn from_header_value(value: &str) -> Self {
        let mut keep_alive = false;

        for token in value.split(',').map(str::trim) {
            if token.eq_ignore_ascii_case("close") {
                return ConnectionStatus::Close;
            }
            if token.eq_ignore_ascii_case("keep-alive") {
                keep_alive = true;
            }
        }

        if keep_alive {
            ConnectionStatus::KeepAlive
        } else {
            ConnectionStatus::Close
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Close => "close",
            ConnectionStatus::KeepAlive => "keep-alive",
        }
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents a parsed HTTP request from a client.
///
/// Built fresh for every request read off a connection and handed to the
/// handler by value.
#[derive(Debug, Clone)]
pub struct Request {
    /// Lower-cased method token ("get", "post", ...). Not validated.
    pub method: String,
    /// Request target exactly as it appeared on the request line
    pub request_uri: String,
    pub version: HttpVersion,
    /// Header fields keyed by lower-cased name; the last duplicate wins
    pub fields: HashMap<String, String>,
    /// Exactly `Content-Length` bytes, or empty
    pub body: Vec<u8>,
    pub connection_status: ConnectionStatus,
    /// Remote peer address captured at accept time
    pub originator: SocketAddr,
}

impl Request {
    /// Looks up a header field. The name is matched case-insensitively.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(&name.to_ascii_lowercase())
            .map(|v| v.as_str())
    }

    /// Whether the client asked for the connection to stay open.
    pub fn keep_alive(&self) -> bool {
        self.connection_status == ConnectionStatus::KeepAlive
    }

    /// Rebuilds the request line as it would appear on the wire.
    pub fn request_line(&self) -> String {
        format!(
            "{} {} {}",
            self.method.to_ascii_uppercase(),
            self.request_uri,
            self.version
        )
    }

    /// The request target without its query string.
    pub fn path(&self) -> &str {
        match self.request_uri.split_once('?') {
            Some((path, _)) => path,
            None => &self.request_uri,
        }
    }
}

/// Builder for constructing Request objects outside the decoder.
pub struct RequestBuilder {
    method: Option<String>,
    request_uri: Option<String>,
    version: HttpVersion,
    fields: HashMap<String, String>,
    body: Vec<u8>,
    connection_status: ConnectionStatus,
    originator: SocketAddr,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self {
            method: None,
            request_uri: None,
            version: HttpVersion::HTTP_11,
            fields: HashMap::new(),
            body: Vec::new(),
            connection_status: ConnectionStatus::Close,
            originator: SocketAddr::from((Ipv4Addr::LOCALHOST, 0)),
        }
    }

    pub fn method(mut self, method: &str) -> Self {
        self.method = Some(method.to_ascii_lowercase());
        self
    }

    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.request_uri = Some(uri.into());
        self
    }

    pub fn version(mut self, version: HttpVersion) -> Self {
        self.version = version;
        self
    }

    pub fn field(mut self, name: &str, value: impl Into<String>) -> Self {
        self.fields.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    pub fn connection(mut self, status: ConnectionStatus) -> Self {
        self.connection_status = status;
        self
    }

    pub fn originator(mut self, addr: SocketAddr) -> Self {
        self.originator = addr;
        self
    }

    pub fn build(self) -> Result<Request, &'static str> {
        Ok(Request {
            method: self.method.ok_or("method missing")?,
            request_uri: self.request_uri.ok_or("request uri missing")?,
            version: self.version,
            fields: self.fields,
            body: self.body,
            connection_status: self.connection_status,
            originator: self.originator,
        })
    }
}
