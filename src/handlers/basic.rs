//! Fixed-page responder

use crate::handlers::RequestHandler;
use crate::http::request::Request;
use crate::http::response::{Response, StatusCode};

pub const GREETING: &str = "<span>This site runs on homespun server software</span>";

/// Answers every `GET` with the same small HTML page.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicHandler;

impl RequestHandler for BasicHandler {
    fn make_response(&self, request: Request) -> Response {
        match request.method.as_str() {
            "get" => {
                let mut response =
                    Response::new(StatusCode::Ok).with_connection(request.connection_status);
                response.set_content_text(GREETING);
                response
            }
            _ => Response::new(StatusCode::NotImplemented).with_connection(request.connection_status),
        }
    }
}
