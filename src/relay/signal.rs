//! Outbound signals to camera producers

/// Acknowledgement sent on registration and after each relayed frame
pub const ACK_TOKEN: &str = "OK";

/// Asks the camera to begin sending frames
pub const START_TOKEN: &str = "START";

/// Asks the camera to stop sending frames
pub const STOP_TOKEN: &str = "STOP";

/// Something the coordinator wants a producer connection to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProducerSignal {
    /// Send the acknowledgement token
    Ack,
    /// Send the START control token
    Start,
    /// Send the STOP control token
    Stop,
    /// Send a protocol-level liveness probe
    Ping,
    /// Drop the connection abruptly, without a close handshake
    Terminate,
}

impl ProducerSignal {
    /// Text token carried on the wire, if this signal is a text message
    pub fn token(&self) -> Option<&'static str> {
        match self {
            ProducerSignal::Ack => Some(ACK_TOKEN),
            ProducerSignal::Start => Some(START_TOKEN),
            ProducerSignal::Stop => Some(STOP_TOKEN),
            ProducerSignal::Ping | ProducerSignal::Terminate => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens() {
        assert_eq!(ProducerSignal::Ack.token(), Some("OK"));
        assert_eq!(ProducerSignal::Start.token(), Some("START"));
        assert_eq!(ProducerSignal::Stop.token(), Some("STOP"));
        assert_eq!(ProducerSignal::Ping.token(), None);
        assert_eq!(ProducerSignal::Terminate.token(), None);
    }
}
