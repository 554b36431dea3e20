//! Relay wire formats
//!
//! `multipart` turns producer frames into viewer response chunks;
//! `signal` defines what the hub sends back to producers.

pub mod multipart;
pub mod signal;

pub use multipart::{encode_part, stream_content_type, stream_headers, DEFAULT_BOUNDARY};
pub use signal::{ProducerSignal, ACK_TOKEN, START_TOKEN, STOP_TOKEN};
