//! Homespun - a small HTTP/1.1 server
//!
//! Core library for the connection engine, handlers and listener.

pub mod config;
pub mod handlers;
pub mod http;
pub mod server;
