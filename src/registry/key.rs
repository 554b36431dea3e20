//! Identity types for registry routing
//!
//! A camera is addressed by its `CameraId`; each camera may hold one
//! connection per `ChannelKind`. Every connection also gets a unique
//! `ConnectionId` so that a late close event from a replaced connection can
//! be told apart from the live one.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::HubError;

/// Opaque camera identity, the routing key for all lookups
///
/// Cheap to clone. Must be non-empty; no other validation is applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CameraId(Arc<str>);

impl CameraId {
    /// Create a camera identity, rejecting the empty string
    pub fn new(id: impl AsRef<str>) -> Result<Self, HubError> {
        let id = id.as_ref();
        if id.is_empty() {
            return Err(HubError::InvalidIdentity);
        }
        Ok(Self(Arc::from(id)))
    }

    /// Borrow the identity as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CameraId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CameraId {
    type Err = HubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Kind of producer channel a camera opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    /// Video frames, relayed to the viewer
    Stream,
    /// Out-of-band control messages, handed to the application
    Command,
}

impl ChannelKind {
    /// Path segment naming this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::Stream => "stream",
            ChannelKind::Command => "command",
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelKind {
    type Err = HubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stream" => Ok(ChannelKind::Stream),
            "command" => Ok(ChannelKind::Command),
            other => Err(HubError::UnknownChannel(other.to_string())),
        }
    }
}

/// Unique id of one producer connection or consumer stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_id_rejects_empty() {
        assert_eq!(CameraId::new(""), Err(HubError::InvalidIdentity));
        assert_eq!(CameraId::new("cam1").unwrap().as_str(), "cam1");
    }

    #[test]
    fn test_camera_id_accepts_anything_non_empty() {
        let id: CameraId = "front door/1 ".parse().unwrap();
        assert_eq!(id.to_string(), "front door/1 ");
    }

    #[test]
    fn test_channel_kind_parse() {
        assert_eq!("stream".parse::<ChannelKind>(), Ok(ChannelKind::Stream));
        assert_eq!("command".parse::<ChannelKind>(), Ok(ChannelKind::Command));
        assert_eq!(
            "video".parse::<ChannelKind>(),
            Err(HubError::UnknownChannel("video".into()))
        );
    }
}
