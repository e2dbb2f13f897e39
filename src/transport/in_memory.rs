use tokio::time::Duration;

use crate::config::MAX_LINE_LENGTH;
use crate::transport::Link;

/// Two connected links over an in-process byte pipe. Dropping or closing one
/// side is seen by the other as end of stream, exactly like a socket.
pub fn pair(timeout_duration: Duration) -> (Link, Link) {
    let (a, b) = tokio::io::duplex(MAX_LINE_LENGTH * 4);
    (
        Link::from_stream(a, timeout_duration),
        Link::from_stream(b, timeout_duration),
    )
}
