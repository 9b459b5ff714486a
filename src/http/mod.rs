//! HTTP protocol implementation.
//!
//! This module implements a small HTTP/1.1 server engine with support for
//! keep-alive connections.
//!
//! # Architecture
//!
//! - **`connection`**: The per-connection request-response state machine
//! - **`decoder`**: Pulls one request at a time off a byte stream, under timeouts
//! - **`parser`**: Request line and header field parsing, plus the error taxonomy
//! - **`request`**: HTTP request representation
//! - **`response`**: HTTP response representation
//! - **`writer`**: Serializes and writes HTTP responses to the client
//! - **`version`**: `HTTP/<major>.<minor>` tokens
//! - **`field`**: Header field name casing
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Wait for incoming request data
//!        └──────┬──────┘
//!               │ Request received        (timeout / transport error → Closed)
//!               ▼                         (malformed request → Writing an error, then Closed)
//!        ┌──────────────────┐
//!        │   Dispatching    │ ← Handler builds the response
//!        └──────┬───────────┘
//!               │ Response ready
//!               ▼
//!        ┌──────────────────┐
//!        │    Writing       │ ← Send response to client
//!        └──────┬───────────┘
//!               │ Response sent
//!               ├─ keep-alive → Reading (same connection)
//!               └─ close → Closed
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use homespun::handlers::BasicHandler;
//! use homespun::http::connection::{Connection, ConnectionSettings};
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let listener = TcpListener::bind("127.0.0.1:8080").await?;
//!
//!     loop {
//!         let (socket, peer) = listener.accept().await?;
//!         tokio::spawn(async move {
//!             let conn = Connection::new(socket, peer, Arc::new(BasicHandler), ConnectionSettings::default());
//!             if let Err(e) = conn.run().await {
//!                 eprintln!("Connection error: {}", e);
//!             }
//!         });
//!     }
//! }
//! ```

pub mod connection;
pub mod decoder;
pub mod field;
pub mod parser;
pub mod request;
pub mod response;
pub mod version;
pub mod writer;
