//! Connection registry
//!
//! Maps camera identities to their live producer connections (one per
//! channel kind) and to at most one pending consumer.
//!
//! ```text
//!                      ConnectionRegistry
//!              ┌──────────────────────────────────┐
//!              │ producers: CameraId -> {         │
//!              │     stream:  ProducerEntry?,     │
//!              │     command: ProducerEntry?,     │
//!              │ }                                │
//!              │ consumers: CameraId -> Consumer  │
//!              └──────────────────────────────────┘
//! ```
//!
//! The registry performs no I/O. Entries only hold channel senders; the
//! sockets themselves live in per-connection tasks.

pub mod entry;
pub mod key;
pub mod store;

pub use entry::{ConsumerEntry, ProducerEntry};
pub use key::{CameraId, ChannelKind, ConnectionId};
pub use store::ConnectionRegistry;
