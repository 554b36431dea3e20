//! Camera relay hub
//!
//! Cameras push JPEG frames over a WebSocket; viewers pull them over a
//! long-lived `multipart/x-mixed-replace` HTTP response. The hub registers
//! producers by camera identity, attaches at most one viewer per camera,
//! frames each camera message as one multipart part, and evicts dead
//! connections on either side.
//!
//! # Example
//! ```no_run
//! use camrelay::{HubServer, LoggingHandler, ServerConfig};
//!
//! # async fn example() -> camrelay::error::Result<()> {
//! let config = ServerConfig::default().port(8999).signaling(true);
//! let server = HubServer::new(config, LoggingHandler);
//!
//! server
//!     .run_until(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod hub;
pub mod registry;
pub mod relay;
pub mod server;
pub mod stats;

pub use error::{Error, HubError, Result};
pub use hub::{ConsumerStream, HubConfig, HubHandle, ProducerSession, ProducerSignals, StreamPhase};
pub use registry::{CameraId, ChannelKind, ConnectionId};
pub use relay::ProducerSignal;
pub use server::{HubHandler, HubServer, LoggingHandler, ServerConfig};
pub use stats::HubStats;
