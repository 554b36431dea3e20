//! Statistics for the relay hub

use std::time::{Duration, Instant};

/// Hub-wide statistics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HubStats {
    /// Registered `stream` producers
    pub stream_producers: usize,
    /// Registered `command` producers
    pub command_producers: usize,
    /// Registered consumers
    pub consumers: usize,
    /// Frames written to a consumer
    pub frames_relayed: u64,
    /// Frames dropped for want of a consumer
    pub frames_dropped: u64,
    /// Frame payload bytes written to consumers
    pub bytes_relayed: u64,
    /// Producers terminated by the liveness sweep
    pub terminations: u64,
    /// Time since the hub started
    pub uptime: Duration,
}

/// Running counters owned by the coordinator
#[derive(Debug, Clone)]
pub(crate) struct RelayCounters {
    pub frames_relayed: u64,
    pub frames_dropped: u64,
    pub bytes_relayed: u64,
    pub terminations: u64,
    pub started_at: Instant,
}

impl RelayCounters {
    pub fn new() -> Self {
        Self {
            frames_relayed: 0,
            frames_dropped: 0,
            bytes_relayed: 0,
            terminations: 0,
            started_at: Instant::now(),
        }
    }

    pub fn on_relayed(&mut self, size: usize) {
        self.frames_relayed += 1;
        self.bytes_relayed += size as u64;
    }

    pub fn on_dropped(&mut self) {
        self.frames_dropped += 1;
    }

    pub fn on_terminated(&mut self) {
        self.terminations += 1;
    }
}

impl HubStats {
    /// Average relayed frame size in bytes
    pub fn average_frame_size(&self) -> u64 {
        if self.frames_relayed > 0 {
            self.bytes_relayed / self.frames_relayed
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let mut counters = RelayCounters::new();

        counters.on_relayed(100);
        counters.on_relayed(300);
        counters.on_dropped();
        counters.on_terminated();

        assert_eq!(counters.frames_relayed, 2);
        assert_eq!(counters.bytes_relayed, 400);
        assert_eq!(counters.frames_dropped, 1);
        assert_eq!(counters.terminations, 1);
    }

    #[test]
    fn test_average_frame_size() {
        let stats = HubStats {
            frames_relayed: 4,
            bytes_relayed: 1000,
            ..HubStats::default()
        };
        assert_eq!(stats.average_frame_size(), 250);

        // With zero frames, average should be 0
        assert_eq!(HubStats::default().average_frame_size(), 0);
    }
}
