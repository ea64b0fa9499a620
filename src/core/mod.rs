//! Core server framework module.
//!
//! - `server.rs`: tool dispatch envelope and HTTP server
//! - `config.rs`: environment-derived server configuration

pub mod config;
pub mod server;
