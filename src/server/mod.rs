//! Relay server
//!
//! Hosts the two transport surfaces in front of the hub:
//!
//! - `/{camera}/{stream|command}`: camera WebSocket connections
//! - `/camera/{camera}`: viewer `multipart/x-mixed-replace` streams

pub mod config;
pub mod handler;
mod http;
pub mod listener;
mod socket;

pub use config::{ServerConfig, DEFAULT_PORT};
pub use handler::{HubHandler, LoggingHandler};
pub use listener::HubServer;
