//! Relay statistics

pub mod metrics;

pub use metrics::HubStats;
pub(crate) use metrics::RelayCounters;
