//! Unidirectional message relay.
//!
//! Reads complete messages from a source stream and writes each one, with
//! the same type and bytes, to a destination sink. Runs until the source
//! closes or any read or write fails. Never retries.

use std::fmt;
use std::time::Duration;

use futures_util::{Sink, SinkExt, Stream, StreamExt};

use crate::observability::metrics;
use crate::websocket::frame::{CloseReason, Frame, WireMessage};

/// How long to keep reading after a close frame so the reply can go out.
pub const CLOSE_REPLY_TIMEOUT: Duration = Duration::from_secs(1);

/// Which way a relay loop copies messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    ClientToBackend,
    BackendToClient,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::ClientToBackend => "client_to_backend",
            Direction::BackendToClient => "backend_to_client",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a relay loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayEnd {
    /// The source stream ended without a close frame.
    SourceEnded,
    /// The source sent a close frame.
    CloseReceived(Option<CloseReason>),
    /// Reading from the source failed.
    ReadError(String),
    /// Writing to the destination failed.
    WriteError(String),
}

/// Summary of a finished relay loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayOutcome {
    pub direction: Direction,
    pub messages: u64,
    pub bytes: u64,
    pub end: RelayEnd,
}

/// Copy messages from `source` to `sink` until either side fails.
///
/// Text and binary messages are forwarded one-for-one in arrival order.
/// Ping and pong frames are answered by each socket on its own and are not
/// forwarded. A close frame from the source ends the loop.
///
/// The socket library answers a close frame by queueing a reply that is only
/// written on the next read, so the source is polled once more before the
/// loop returns.
pub async fn relay_messages<Src, Dst, In, Out, ReadErr, WriteErr>(
    direction: Direction,
    mut source: Src,
    mut sink: Dst,
) -> RelayOutcome
where
    Src: Stream<Item = Result<In, ReadErr>> + Unpin,
    Dst: Sink<Out, Error = WriteErr> + Unpin,
    In: WireMessage,
    Out: WireMessage,
    ReadErr: fmt::Display,
    WriteErr: fmt::Display,
{
    let mut messages = 0u64;
    let mut bytes = 0u64;

    let end = loop {
        let message = match source.next().await {
            Some(Ok(message)) => message,
            Some(Err(e)) => {
                tracing::warn!(direction = %direction, error = %e, "Error while reading next message");
                break RelayEnd::ReadError(e.to_string());
            }
            None => {
                tracing::debug!(direction = %direction, "Source stream ended");
                break RelayEnd::SourceEnded;
            }
        };

        let Some(frame) = message.into_frame() else {
            continue;
        };

        match frame {
            Frame::Close(reason) => {
                tracing::debug!(direction = %direction, ?reason, "Close frame received");
                flush_close_reply(direction, &mut source).await;
                break RelayEnd::CloseReceived(reason);
            }
            Frame::Ping(_) | Frame::Pong(_) => {
                tracing::trace!(direction = %direction, kind = frame.kind().as_str(), "Control frame handled locally");
            }
            frame => {
                let kind = frame.kind();
                let len = frame.len();
                if let Err(e) = sink.send(Out::from_frame(frame)).await {
                    tracing::warn!(direction = %direction, error = %e, bytes = len, "Error while writing message");
                    break RelayEnd::WriteError(e.to_string());
                }
                messages += 1;
                bytes += len as u64;
                metrics::record_relayed_message(direction, kind);
                tracing::trace!(direction = %direction, kind = kind.as_str(), bytes = len, "Relayed message");
            }
        }
    };

    tracing::info!(
        direction = %direction,
        messages,
        bytes,
        reason = ?end,
        "Relay loop finished"
    );

    RelayOutcome {
        direction,
        messages,
        bytes,
        end,
    }
}

async fn flush_close_reply<Src, In, ReadErr>(direction: Direction, source: &mut Src)
where
    Src: Stream<Item = Result<In, ReadErr>> + Unpin,
    ReadErr: fmt::Display,
{
    match tokio::time::timeout(CLOSE_REPLY_TIMEOUT, source.next()).await {
        Ok(Some(Ok(_))) => {
            tracing::debug!(direction = %direction, "Discarded message received after close");
        }
        Ok(Some(Err(e))) => {
            tracing::trace!(direction = %direction, error = %e, "Close handshake finished");
        }
        Ok(None) => {}
        Err(_) => {
            tracing::debug!(direction = %direction, "Peer kept connection open after close");
        }
    }
}
