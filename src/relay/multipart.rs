//! Multipart framing for viewer responses
//!
//! Each frame becomes one `multipart/x-mixed-replace` part:
//!
//! ```text
//! --BOUNDARY\r\n
//! Content-Type: image/jpeg\r\n
//! Content-Length: N\r\n
//! \r\n
//! <N bytes>\r\n
//! ```
//!
//! Frame bytes are copied verbatim; the payload is never inspected.

use bytes::{BufMut, Bytes, BytesMut};

/// Boundary token shared with cameras and viewers out-of-band
pub const DEFAULT_BOUNDARY: &str = "MYBOUNDARY";

/// Content type of every part
pub const PART_CONTENT_TYPE: &str = "image/jpeg";

/// Encode one frame as a complete multipart chunk
pub fn encode_part(boundary: &str, frame: &[u8]) -> Bytes {
    let length = frame.len().to_string();
    let mut buf = BytesMut::with_capacity(
        boundary.len() + length.len() + frame.len() + PART_CONTENT_TYPE.len() + 48,
    );

    buf.put_slice(b"--");
    buf.put_slice(boundary.as_bytes());
    buf.put_slice(b"\r\n");
    buf.put_slice(b"Content-Type: ");
    buf.put_slice(PART_CONTENT_TYPE.as_bytes());
    buf.put_slice(b"\r\n");
    buf.put_slice(b"Content-Length: ");
    buf.put_slice(length.as_bytes());
    buf.put_slice(b"\r\n");
    buf.put_slice(b"\r\n");
    buf.put_slice(frame);
    buf.put_slice(b"\r\n");

    buf.freeze()
}

/// `Content-Type` of the viewer response
pub fn stream_content_type(boundary: &str) -> String {
    format!("multipart/x-mixed-replace;boundary=\"{}\"", boundary)
}

/// Headers of the viewer response, in wire order
///
/// Caching is disabled in every form browsers and proxies honour, since each
/// part replaces the last.
pub fn stream_headers(boundary: &str) -> [(&'static str, String); 5] {
    [
        (
            "Cache-Control",
            "no-cache, no-store, max-age=0, must-revalidate".to_string(),
        ),
        ("Connection", "keep-alive".to_string()),
        ("Content-Type", stream_content_type(boundary)),
        ("Expires", "0".to_string()),
        ("Pragma", "no-cache".to_string()),
    ]
}
