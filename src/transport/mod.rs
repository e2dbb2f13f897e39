//! Byte-stream plumbing for online matches.
//!
//! A connection is split in two. The write half is wrapped in a
//! `LineTransport` that frames outgoing messages as newline-terminated lines.
//! The read half is consumed by a background task that publishes every line
//! (and the final EOF or error) onto a channel, so the owner of the match
//! processes network input one item at a time, in order.

use bytes::BytesMut;
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};
use tokio_util::codec::{Decoder, FramedRead, FramedWrite, LinesCodec, LinesCodecError};

use crate::config::MAX_LINE_LENGTH;
use crate::protocol::Message;

pub mod in_memory;
pub mod tcp;

/// Capacity of the reader-to-owner channel.
const INBOUND_CAPACITY: usize = 64;

/// Outgoing half of a peer connection.
#[async_trait::async_trait]
pub trait Transport: Send {
    async fn send(&mut self, msg: &Message) -> anyhow::Result<()>;

    /// Flush and shut the stream down. Calling it again is a no-op.
    async fn close(&mut self) -> anyhow::Result<()>;
}

/// Newline-framed writer over any async byte sink.
pub struct LineTransport<W> {
    writer: FramedWrite<W, LinesCodec>,
    timeout_duration: Duration,
    closed: bool,
}

impl<W> LineTransport<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W, timeout_duration: Duration) -> Self {
        Self {
            writer: FramedWrite::new(writer, LinesCodec::new_with_max_length(MAX_LINE_LENGTH)),
            timeout_duration,
            closed: false,
        }
    }
}

#[async_trait::async_trait]
impl<W> Transport for LineTransport<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, msg: &Message) -> anyhow::Result<()> {
        if self.closed {
            anyhow::bail!("transport is closed");
        }
        let line = msg.encode();
        log::debug!("sending {}", line);
        timeout(self.timeout_duration, self.writer.send(line))
            .await
            .map_err(|_| anyhow::anyhow!("send timeout after {:?}", self.timeout_duration))?
            .map_err(|e| anyhow::anyhow!("write error: {}", e))
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        timeout(self.timeout_duration, SinkExt::<String>::close(&mut self.writer))
            .await
            .map_err(|_| anyhow::anyhow!("close timeout after {:?}", self.timeout_duration))?
            .map_err(|e| anyhow::anyhow!("shutdown error: {}", e))
    }
}

/// What the reader task publishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Line(String),
    /// Clean end of stream.
    Closed,
    /// Read error; the stream is unusable.
    Failed(String),
}

/// Line decoder for peer input. Over-long lines are skipped inside the
/// decoder, so the framed stream never sees an error and keeps decoding
/// whatever is already buffered behind them.
#[derive(Debug)]
struct PeerLines(LinesCodec);

impl PeerLines {
    fn new() -> Self {
        Self(LinesCodec::new_with_max_length(MAX_LINE_LENGTH))
    }

    fn skip_long_lines(
        &mut self,
        buf: &mut BytesMut,
        step: fn(&mut LinesCodec, &mut BytesMut) -> Result<Option<String>, LinesCodecError>,
    ) -> Result<Option<String>, LinesCodecError> {
        loop {
            match step(&mut self.0, buf) {
                Err(LinesCodecError::MaxLineLengthExceeded) => {
                    log::debug!("discarding line longer than {} bytes", MAX_LINE_LENGTH);
                }
                other => return other,
            }
        }
    }
}

impl Decoder for PeerLines {
    type Item = String;
    type Error = LinesCodecError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<String>, LinesCodecError> {
        self.skip_long_lines(buf, LinesCodec::decode)
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<String>, LinesCodecError> {
        self.skip_long_lines(buf, LinesCodec::decode_eof)
    }
}

/// Start the background reader for `reader`. The task ends after publishing
/// `Closed` or `Failed`, when the receiver is dropped, or when aborted.
pub fn spawn_reader<R>(reader: R) -> (mpsc::Receiver<Inbound>, JoinHandle<()>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(INBOUND_CAPACITY);
    let handle = tokio::spawn(async move {
        let mut lines = FramedRead::new(reader, PeerLines::new());
        loop {
            let item = match lines.next().await {
                Some(Ok(line)) => Inbound::Line(line),
                Some(Err(e)) => Inbound::Failed(e.to_string()),
                None => Inbound::Closed,
            };
            let last = !matches!(item, Inbound::Line(_));
            if tx.send(item).await.is_err() || last {
                break;
            }
        }
    });
    (rx, handle)
}

/// Both halves of one connection.
pub struct Link {
    pub transport: Box<dyn Transport>,
    pub inbound: mpsc::Receiver<Inbound>,
    pub reader: JoinHandle<()>,
}

impl Link {
    /// Split a duplex stream and start its reader task.
    pub fn from_stream<S>(stream: S, timeout_duration: Duration) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (read_half, write_half) = tokio::io::split(stream);
        let (inbound, reader) = spawn_reader(read_half);
        Self {
            transport: Box::new(LineTransport::new(write_half, timeout_duration)),
            inbound,
            reader,
        }
    }
}
