//! Static file serving
//!
//! Maps the request target onto a directory on disk. Only regular files and
//! directories below the root are reachable; the target is validated before
//! it ever touches the filesystem.

use std::io;
use std::path::{Path, PathBuf};

use crate::handlers::RequestHandler;
use crate::http::request::Request;
use crate::http::response::{Response, StatusCode};

const INDEX_FILE: &str = "index.html";
const NOT_FOUND_PAGE: &str = "<span>404 - The file you are looking for is not here.</span>";
const DIRECTORY_PAGE: &str = "<span>This is a directory.</span>";
const ERROR_PAGE: &str = "<span>500 - Something went wrong reading that file.</span>";

/// Serves files below `root` for `GET` requests.
#[derive(Debug, Clone)]
pub struct FileHandler {
    root: PathBuf,
}

impl FileHandler {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn serve(&self, request: &Request) -> Response {
        let mut target = request.path().trim_start_matches('/');
        if target.is_empty() {
            target = INDEX_FILE;
        }

        if !is_valid_path(target) {
            tracing::debug!(target = %target, "Rejecting invalid path");
            return Response::new(StatusCode::BadRequest);
        }

        let path = self.root.join(target);

        let metadata = match std::fs::metadata(&path) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let mut response = Response::new(StatusCode::NotFound);
                response.set_content_text(NOT_FOUND_PAGE);
                return response;
            }
            Err(e) => return internal_error(&path, &e),
        };

        if metadata.is_dir() {
            let mut response = Response::new(StatusCode::Ok);
            response.set_content_text(DIRECTORY_PAGE);
            return response;
        }

        let data = match std::fs::read(&path) {
            Ok(data) => data,
            Err(e) => return internal_error(&path, &e),
        };

        let mut response = Response::new(StatusCode::Ok);
        if target.ends_with(".html") {
            response.set_field("content-type", "text/html; charset=utf-8");
        }
        response.set_content(data);
        response
    }
}

impl RequestHandler for FileHandler {
    fn make_response(&self, request: Request) -> Response {
        let response = match request.method.as_str() {
            "get" => self.serve(&request),
            _ => Response::new(StatusCode::NotImplemented),
        };

        response.with_connection(request.connection_status)
    }
}

fn internal_error(path: &Path, err: &io::Error) -> Response {
    tracing::error!(path = %path.display(), error = %err, "Failed to read file");

    let mut response = Response::new(StatusCode::InternalServerError);
    response.set_content_text(ERROR_PAGE);
    response
}

/// A relative, slash-separated path with no empty, `.` or `..` elements.
pub fn is_valid_path(target: &str) -> bool {
    if target.contains(['\\', '\0']) {
        return false;
    }

    target
        .split('/')
        .all(|segment| !segment.is_empty() && segment != "." && segment != "..")
}
