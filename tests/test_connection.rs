use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use homespun::handlers::{BasicHandler, RequestHandler};
use homespun::http::connection::{Connection, ConnectionSettings};
use homespun::http::request::{ConnectionStatus, Request};
use homespun::http::response::Response;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::task::JoinHandle;

fn peer() -> SocketAddr {
    "192.0.2.10:40000".parse().unwrap()
}

fn short_timeouts() -> ConnectionSettings {
    ConnectionSettings {
        total_timeout: Duration::from_millis(2_000),
        transfer_timeout: Duration::from_millis(100),
        ..ConnectionSettings::default()
    }
}

fn start(
    handler: Arc<dyn RequestHandler>,
    settings: ConnectionSettings,
) -> (DuplexStream, JoinHandle<anyhow::Result<()>>) {
    let (client, server) = tokio::io::duplex(64 * 1024);
    let task = tokio::spawn(Connection::new(server, peer(), handler, settings).run());
    (client, task)
}

struct Reply {
    status: u16,
    headers: Vec<String>,
    body: Vec<u8>,
}

impl Reply {
    fn header(&self, name: &str) -> Option<&str> {
        let prefix = format!("{}: ", name);
        self.headers
            .iter()
            .find_map(|h| h.strip_prefix(prefix.as_str()))
    }
}

/// Reads one framed response; `None` if the server closed first.
async fn read_reply(client: &mut DuplexStream, pending: &mut Vec<u8>) -> Option<Reply> {
    let mut chunk = [0u8; 1024];

    let head_end = loop {
        if let Some(pos) = pending.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
        let n = client.read(&mut chunk).await.unwrap();
        if n == 0 {
            return None;
        }
        pending.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8(pending[..head_end].to_vec()).unwrap();
    let mut lines = head.split("\r\n");
    let status = lines.next().unwrap().split(' ').nth(1).unwrap().parse().unwrap();
    let headers: Vec<String> = lines.map(str::to_string).collect();

    let length: usize = headers
        .iter()
        .find_map(|h| h.strip_prefix("Content-Length: "))
        .unwrap()
        .parse()
        .unwrap();

    pending.drain(..head_end + 4);
    while pending.len() < length {
        let n = client.read(&mut chunk).await.unwrap();
        assert!(n > 0, "closed inside a response body");
        pending.extend_from_slice(&chunk[..n]);
    }
    let body = pending.drain(..length).collect();

    Some(Reply { status, headers, body })
}

async fn assert_closed(client: &mut DuplexStream) {
    let mut rest = Vec::new();
    client.read_to_end(&mut rest).await.unwrap();
    assert!(rest.is_empty(), "unexpected bytes: {:?}", String::from_utf8_lossy(&rest));
}

#[tokio::test]
async fn test_single_request_then_close() {
    let (mut client, task) = start(Arc::new(BasicHandler), short_timeouts());

    client.write_all(b"GET / HTTP/1.1\r\nHost: test\r\n\r\n").await.unwrap();

    let mut pending = Vec::new();
    let reply = read_reply(&mut client, &mut pending).await.unwrap();
    assert_eq!(reply.status, 200);
    assert_eq!(reply.header("Connection"), Some("close"));
    assert!(reply.header("Date").is_some());
    assert_eq!(reply.header("Content-Type"), Some("text/html; charset=utf-8"));

    assert_closed(&mut client).await;
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_keep_alive_serves_requests_in_order() {
    let (mut client, task) = start(Arc::new(BasicHandler), short_timeouts());
    let mut pending = Vec::new();

    client
        .write_all(b"GET / HTTP/1.1\r\nConnection: keep-alive\r\n\r\n")
        .await
        .unwrap();
    let first = read_reply(&mut client, &mut pending).await.unwrap();
    assert_eq!(first.status, 200);
    assert_eq!(first.header("Connection"), Some("keep-alive"));

    client
        .write_all(b"GET / HTTP/1.1\r\nConnection: keep-alive\r\n\r\n")
        .await
        .unwrap();
    let second = read_reply(&mut client, &mut pending).await.unwrap();
    assert_eq!(second.status, 200);
    assert_eq!(second.body, first.body);

    client.write_all(b"GET / HTTP/1.1\r\n\r\n").await.unwrap();
    let third = read_reply(&mut client, &mut pending).await.unwrap();
    assert_eq!(third.header("Connection"), Some("close"));

    assert_closed(&mut client).await;
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_back_to_back_requests_in_one_write() {
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);
    let handler = move |req: Request| {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        let mut response = Response::with_reason(200, "OK").with_connection(req.connection_status);
        response.set_content(format!("{} {}", n, req.request_uri));
        response
    };
    let (mut client, task) = start(Arc::new(handler), short_timeouts());

    client
        .write_all(
            b"GET /a HTTP/1.1\r\nConnection: keep-alive\r\n\r\n\
              POST /b HTTP/1.1\r\nConnection: keep-alive\r\nContent-Length: 2\r\n\r\nhi\
              GET /c HTTP/1.1\r\n\r\n",
        )
        .await
        .unwrap();

    let mut pending = Vec::new();
    for expected in ["0 /a", "1 /b", "2 /c"] {
        let reply = read_reply(&mut client, &mut pending).await.unwrap();
        assert_eq!(reply.body, expected.as_bytes());
    }

    assert_closed(&mut client).await;
    task.await.unwrap().unwrap();
    assert_eq!(seen.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_partial_body_times_out_without_response() {
    let (mut client, task) = start(Arc::new(BasicHandler), short_timeouts());

    client
        .write_all(b"POST / HTTP/1.1\r\nContent-Length: 5\r\n\r\nabc")
        .await
        .unwrap();

    assert_closed(&mut client).await;
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_idle_connection_times_out() {
    let (mut client, task) = start(Arc::new(BasicHandler), short_timeouts());

    assert_closed(&mut client).await;
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_trickling_client_hits_total_timeout() {
    let settings = ConnectionSettings {
        total_timeout: Duration::from_millis(300),
        transfer_timeout: Duration::from_millis(200),
        ..ConnectionSettings::default()
    };
    let (mut client, task) = start(Arc::new(BasicHandler), settings);

    // Each byte arrives well inside the transfer timeout, but the request
    // never completes before the connection's total budget is spent.
    let writer = tokio::spawn(async move {
        for b in b"GET / HTTP/1.1\r\nX-Slow: aaaaaaaaaaaaaaaaaaaa" {
            if client.write_all(&[*b]).await.is_err() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        client
    });

    task.await.unwrap().unwrap();
    let mut client = writer.await.unwrap();
    assert_closed(&mut client).await;
}

#[tokio::test]
async fn test_malformed_header_gets_400_and_close() {
    let (mut client, task) = start(Arc::new(BasicHandler), short_timeouts());

    client
        .write_all(b"GET / HTTP/1.1\r\ngarbage\r\n\r\n")
        .await
        .unwrap();

    let mut pending = Vec::new();
    let reply = read_reply(&mut client, &mut pending).await.unwrap();
    assert_eq!(reply.status, 400);
    assert_eq!(reply.header("Connection"), Some("close"));

    assert_closed(&mut client).await;
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_unsupported_version_gets_505() {
    let (mut client, task) = start(Arc::new(BasicHandler), short_timeouts());

    client.write_all(b"GET / HTTP/2.0\r\n\r\n").await.unwrap();

    let mut pending = Vec::new();
    let reply = read_reply(&mut client, &mut pending).await.unwrap();
    assert_eq!(reply.status, 505);

    assert_closed(&mut client).await;
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_chunked_request_gets_501() {
    let (mut client, task) = start(Arc::new(BasicHandler), short_timeouts());

    client
        .write_all(b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\nConnection: keep-alive\r\n\r\n")
        .await
        .unwrap();

    let mut pending = Vec::new();
    let reply = read_reply(&mut client, &mut pending).await.unwrap();
    assert_eq!(reply.status, 501);
    assert_eq!(reply.header("Connection"), Some("close"));

    assert_closed(&mut client).await;
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_unknown_method_gets_501_and_keeps_connection() {
    let (mut client, task) = start(Arc::new(BasicHandler), short_timeouts());
    let mut pending = Vec::new();

    client
        .write_all(b"post / HTTP/1.1\r\nConnection: keep-alive\r\nContent-Length: 0\r\n\r\n")
        .await
        .unwrap();
    let reply = read_reply(&mut client, &mut pending).await.unwrap();
    assert_eq!(reply.status, 501);
    assert_eq!(reply.header("Connection"), Some("keep-alive"));

    client.write_all(b"GET / HTTP/1.1\r\n\r\n").await.unwrap();
    assert_eq!(read_reply(&mut client, &mut pending).await.unwrap().status, 200);

    assert_closed(&mut client).await;
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_response_overrides_request_keep_alive() {
    let handler = |_req: Request| Response::with_reason(204, "No Content");
    let (mut client, task) = start(Arc::new(handler), short_timeouts());

    client
        .write_all(b"GET / HTTP/1.1\r\nConnection: keep-alive\r\n\r\n")
        .await
        .unwrap();

    let mut pending = Vec::new();
    let reply = read_reply(&mut client, &mut pending).await.unwrap();
    assert_eq!(reply.status, 204);
    assert_eq!(reply.header("Connection"), Some("close"));

    assert_closed(&mut client).await;
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_handler_sees_peer_and_body() {
    let handler = |req: Request| {
        let mut response = Response::with_reason(200, "OK");
        response.set_content(format!("{} {}", req.originator, String::from_utf8_lossy(&req.body)));
        response
    };
    let (mut client, task) = start(Arc::new(handler), short_timeouts());

    client
        .write_all(b"PUT /x HTTP/1.1\r\nContent-Length: 4\r\n\r\nbody")
        .await
        .unwrap();

    let mut pending = Vec::new();
    let reply = read_reply(&mut client, &mut pending).await.unwrap();
    assert_eq!(reply.body, b"192.0.2.10:40000 body".to_vec());

    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_panicking_handler_closes_without_reply() {
    let handler = |req: Request| -> Response {
        if req.request_uri == "/boom" {
            panic!("handler bug");
        }
        Response::with_reason(200, "OK").with_connection(ConnectionStatus::KeepAlive)
    };
    let (mut client, task) = start(Arc::new(handler), short_timeouts());

    client.write_all(b"GET /boom HTTP/1.1\r\n\r\n").await.unwrap();

    assert_closed(&mut client).await;
    assert!(task.await.unwrap().is_err());
}

#[tokio::test]
async fn test_client_disconnect_is_clean() {
    let (client, task) = start(Arc::new(BasicHandler), short_timeouts());

    drop(client);

    task.await.unwrap().unwrap();
}
