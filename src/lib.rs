//! Attachment download server
//!
//! Serves files below a configured directory at `GET /download/<filename>`
//! with `Content-Disposition: attachment`.

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
