//! Relay hub coordinator
//!
//! One coordinator task owns the connection registry. Producer connections
//! and viewer streams are served by their own tasks, which post typed events
//! to the coordinator and never share mutable state with each other.
//!
//! ```text
//!   [camera socket task] ──ProducerSession──┐
//!           ▲                               │ HubEvent
//!           └──────ProducerSignals◄──┐      ▼
//!                                 ┌──┴─────────────┐
//!   [camera socket task] ───────► │  Hub           │ ◄── liveness ticker
//!                                 │  (registry)    │
//!   [viewer HTTP body] ◄──chunks──┴────────────────┘
//!       ConsumerStream ──ConsumerClosed on drop──►
//! ```

pub mod config;
pub mod consumer;
pub(crate) mod coordinator;
pub(crate) mod event;
pub mod handle;
pub mod liveness;
pub mod producer;
pub mod state;

pub use config::HubConfig;
pub use consumer::ConsumerStream;
pub use handle::HubHandle;
pub use liveness::SweepReport;
pub use producer::{ProducerSession, ProducerSignals};
pub use state::StreamPhase;
