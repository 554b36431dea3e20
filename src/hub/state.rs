//! Per-camera stream lifecycle

use std::fmt;

/// Lifecycle phase of one camera's stream channel
///
/// Derived from the registry rather than stored: the phase is whatever the
/// current producer and consumer entries say it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPhase {
    /// No stream producer registered
    NoProducer,
    /// Producer registered, nobody watching
    ProducerIdle,
    /// Producer registered and a viewer attached
    Streaming,
}

impl StreamPhase {
    /// Phase for the given registry occupancy
    pub fn from_occupancy(has_producer: bool, has_consumer: bool) -> Self {
        match (has_producer, has_consumer) {
            (false, _) => StreamPhase::NoProducer,
            (true, false) => StreamPhase::ProducerIdle,
            (true, true) => StreamPhase::Streaming,
        }
    }

    /// Whether frames currently reach a viewer
    pub fn is_streaming(&self) -> bool {
        *self == StreamPhase::Streaming
    }
}

impl fmt::Display for StreamPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StreamPhase::NoProducer => "no-producer",
            StreamPhase::ProducerIdle => "producer-idle",
            StreamPhase::Streaming => "streaming",
        };
        f.write_str(name)
    }
}
