use homespun::http::request::{ConnectionStatus, RequestBuilder};
use homespun::http::version::HttpVersion;

#[test]
fn test_request_builder_lowercases_method_and_fields() {
    let req = RequestBuilder::new()
        .method("GET")
        .uri("/index.html")
        .field("Content-Type", "text/plain")
        .build()
        .unwrap();

    assert_eq!(req.method, "get");
    assert_eq!(req.version, HttpVersion::HTTP_11);
    assert_eq!(req.fields.get("content-type").unwrap(), "text/plain");
}

#[test]
fn test_request_builder_requires_method_and_uri() {
    assert!(RequestBuilder::new().uri("/").build().is_err());
    assert!(RequestBuilder::new().method("get").build().is_err());
}

#[test]
fn test_request_field_lookup_is_case_insensitive() {
    let req = RequestBuilder::new()
        .method("get")
        .uri("/")
        .field("host", "example.com")
        .build()
        .unwrap();

    assert_eq!(req.field("Host"), Some("example.com"));
    assert_eq!(req.field("HOST"), Some("example.com"));
    assert_eq!(req.field("missing"), None);
}

#[test]
fn test_request_defaults_to_close() {
    let req = RequestBuilder::new().method("get").uri("/").build().unwrap();

    assert_eq!(req.connection_status, ConnectionStatus::Close);
    assert!(!req.keep_alive());
}

#[test]
fn test_request_path_strips_query() {
    let req = RequestBuilder::new()
        .method("get")
        .uri("/docs/page.html?lang=da")
        .build()
        .unwrap();

    assert_eq!(req.path(), "/docs/page.html");
    assert_eq!(req.request_uri, "/docs/page.html?lang=da");
}

#[test]
fn test_connection_status_from_header_value() {
    assert_eq!(
        ConnectionStatus::from_header_value("keep-alive"),
        ConnectionStatus::KeepAlive
    );
    assert_eq!(
        ConnectionStatus::from_header_value("KEEP-ALIVE"),
        ConnectionStatus::KeepAlive
    );
    assert_eq!(
        ConnectionStatus::from_header_value("Upgrade, keep-alive"),
        ConnectionStatus::KeepAlive
    );
    assert_eq!(
        ConnectionStatus::from_header_value("keep-alive, close"),
        ConnectionStatus::Close
    );
    assert_eq!(ConnectionStatus::from_header_value("upgrade"), ConnectionStatus::Close);
}

#[test]
fn test_connection_status_display() {
    assert_eq!(ConnectionStatus::Close.to_string(), "close");
    assert_eq!(ConnectionStatus::KeepAlive.to_string(), "keep-alive");
}
