//! Accepting connections

pub mod listener;

pub use listener::{bind, listen_and_serve, run, serve};
