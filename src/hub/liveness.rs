//! Liveness sweep
//!
//! Two-sweep dead-peer detection. Each sweep clears every producer's alive
//! flag and pings it; any inbound message or pong sets the flag again. A
//! producer still marked dead at the next sweep missed a whole period and is
//! terminated. Registry cleanup then happens on the ordinary close path, when
//! the connection task exits.

use crate::relay::ProducerSignal;

use super::coordinator::Hub;

/// Outcome of one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Producers that were pinged
    pub probed: usize,
    /// Producers that were terminated
    pub terminated: usize,
}

impl Hub {
    /// Run one liveness sweep over every producer connection
    pub fn sweep(&mut self) -> SweepReport {
        let mut report = SweepReport::default();

        for (camera, kind, entry) in self.registry.producers_mut() {
            // Already cut off, waiting for its close event
            if entry.terminated {
                continue;
            }

            if !entry.alive {
                tracing::info!(
                    camera = %camera,
                    kind = %kind,
                    connection = %entry.id,
                    "Connection not alive, terminating"
                );
                entry.terminate();
                self.counters.on_terminated();
                report.terminated += 1;
                continue;
            }

            entry.alive = false;
            entry.signal(ProducerSignal::Ping);
            report.probed += 1;
        }

        let stats = self.stats();
        tracing::debug!(
            probed = report.probed,
            terminated = report.terminated,
            stream_producers = stats.stream_producers,
            command_producers = stats.command_producers,
            viewers = stats.consumers,
            frames_relayed = stats.frames_relayed,
            frames_dropped = stats.frames_dropped,
            "Liveness sweep"
        );

        report
    }
}
