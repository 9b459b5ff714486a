//! Request handlers
//!
//! A handler turns one decoded [`Request`] into one [`Response`]. It never
//! touches the connection and never fails: anything that goes wrong while
//! serving a resource becomes a status code on the response.

pub mod basic;
pub mod files;

use crate::http::request::Request;
use crate::http::response::Response;

pub use basic::BasicHandler;
pub use files::FileHandler;

/// The single capability the connection needs from application code.
///
/// Handlers run on a blocking thread, so local file I/O is fine here.
pub trait RequestHandler: Send + Sync + 'static {
    fn make_response(&self, request: Request) -> Response;
}

impl<F> RequestHandler for F
where
    F: Fn(Request) -> Response + Send + Sync + 'static,
{
    fn make_response(&self, request: Request) -> Response {
        self(request)
    }
}
