//! Legacy JSON/HTTP adapter for the log.
//!
//! Exposes the log over two routes on `/`: `POST` produces a record and
//! returns its offset, `GET` consumes the record at a requested offset.
//! Reads outside the log's offset range map to `400 Bad Request`; every
//! other failure maps to `500 Internal Server Error`.

mod handlers;
mod http;

pub use http::LogServer;

/// HTTP adapter configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 11111 }
    }
}
