use std::collections::HashMap;
use std::time::SystemTime;

use crate::http::request::ConnectionStatus;

/// HTTP status codes the server and its built-in handlers emit.
///
/// Handlers are free to use any other code through
/// [`Response::with_reason`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 400 Bad Request
    BadRequest,
    /// 404 Not Found
    NotFound,
    /// 413 Payload Too Large
    PayloadTooLarge,
    /// 431 Request Header Fields Too Large
    RequestHeaderFieldsTooLarge,
    /// 500 Internal Server Error
    InternalServerError,
    /// 501 Not Implemented
    NotImplemented,
    /// 505 HTTP Version Not Supported
    HttpVersionNotSupported,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use homespun::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotImplemented.as_u16(), 501);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::BadRequest => 400,
            StatusCode::NotFound => 404,
            StatusCode::PayloadTooLarge => 413,
            StatusCode::RequestHeaderFieldsTooLarge => 431,
            StatusCode::InternalServerError => 500,
            StatusCode::NotImplemented => 501,
            StatusCode::HttpVersionNotSupported => 505,
        }
    }

    /// Returns the standard HTTP reason phrase for this status code.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::PayloadTooLarge => "Payload Too Large",
            StatusCode::RequestHeaderFieldsTooLarge => "Request Header Fields Too Large",
            StatusCode::InternalServerError => "Internal Server Error",
            StatusCode::NotImplemented => "Not Implemented",
            StatusCode::HttpVersionNotSupported => "HTTP Version Not Supported",
        }
    }
}

/// Represents a complete HTTP response ready to be sent to a client.
///
/// `Content-Length` is deliberately absent from `fields`: the writer derives
/// it from `content` when the response is serialized.
#[derive(Debug, Clone)]
pub struct Response {
    pub status_code: u16,
    pub status_response: String,
    /// Left unset by most handlers; the connection fills in the dispatch time
    pub date: Option<SystemTime>,
    /// Decides whether the connection keeps reading after this response
    pub connection_status: ConnectionStatus,
    /// Extra header fields keyed by lower-cased name
    pub fields: HashMap<String, String>,
    pub content: Vec<u8>,
}

impl Response {
    /// Creates an empty response with a well-known status.
    pub fn new(status: StatusCode) -> Self {
        Self::with_reason(status.as_u16(), status.reason_phrase())
    }

    /// Creates an empty response with an arbitrary status line.
    pub fn with_reason(code: u16, reason: impl Into<String>) -> Self {
        Self {
            status_code: code,
            status_response: reason.into(),
            date: None,
            connection_status: ConnectionStatus::Close,
            fields: HashMap::new(),
            content: Vec::new(),
        }
    }

    /// Sets the connection disposition, usually echoed from the request.
    pub fn with_connection(mut self, status: ConnectionStatus) -> Self {
        self.connection_status = status;
        self
    }

    /// Sets an HTML body along with its content type.
    pub fn set_content_text(&mut self, html: impl Into<String>) {
        self.set_field("content-type", "text/html; charset=utf-8");
        self.content = html.into().into_bytes();
    }

    /// Sets a raw body. The content type is left untouched.
    pub fn set_content(&mut self, content: impl Into<Vec<u8>>) {
        self.content = content.into();
    }

    /// Adds or replaces a header field. The name is stored lower-cased.
    pub fn set_field(&mut self, name: &str, value: impl Into<String>) {
        self.fields.insert(name.to_ascii_lowercase(), value.into());
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(&name.to_ascii_lowercase())
            .map(|v| v.as_str())
    }

    /// A short HTML reply for a status the server produces on its own.
    pub fn error_page(status: StatusCode) -> Self {
        let mut response = Self::new(status);
        response.set_content_text(format!(
            "<span>{} - {}</span>",
            status.as_u16(),
            status.reason_phrase()
        ));
        response
    }
}
