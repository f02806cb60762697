//! Library-neutral WebSocket message model.
//!
//! The client side of a tunnel is an axum `WebSocket` and the backend side a
//! tokio-tungstenite stream. Both message types convert through `Frame`, so
//! one relay loop serves both directions.

use axum::body::Bytes;
use axum::extract::ws::{CloseFrame as AxumCloseFrame, Message as AxumMessage};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame as TungsteniteCloseFrame;
use tokio_tungstenite::tungstenite::Message as TungsteniteMessage;

/// One complete message read from a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Bytes),
    Ping(Bytes),
    Pong(Bytes),
    Close(Option<CloseReason>),
}

/// Status code and reason carried by a close frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseReason {
    pub code: u16,
    pub reason: String,
}

/// Type tag of a frame, used for logging and metrics labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Text,
    Binary,
    Ping,
    Pong,
    Close,
}

impl FrameKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FrameKind::Text => "text",
            FrameKind::Binary => "binary",
            FrameKind::Ping => "ping",
            FrameKind::Pong => "pong",
            FrameKind::Close => "close",
        }
    }
}

impl Frame {
    pub fn kind(&self) -> FrameKind {
        match self {
            Frame::Text(_) => FrameKind::Text,
            Frame::Binary(_) => FrameKind::Binary,
            Frame::Ping(_) => FrameKind::Ping,
            Frame::Pong(_) => FrameKind::Pong,
            Frame::Close(_) => FrameKind::Close,
        }
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        match self {
            Frame::Text(text) => text.len(),
            Frame::Binary(data) | Frame::Ping(data) | Frame::Pong(data) => data.len(),
            Frame::Close(reason) => reason.as_ref().map_or(0, |r| r.reason.len() + 2),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Text and binary frames carry application data; the rest are control.
    pub fn is_data(&self) -> bool {
        matches!(self, Frame::Text(_) | Frame::Binary(_))
    }
}

/// A socket library's message type that can be relayed.
pub trait WireMessage: Sized {
    /// Convert into a frame. `None` for raw frames that are not complete messages.
    fn into_frame(self) -> Option<Frame>;

    fn from_frame(frame: Frame) -> Self;
}

impl WireMessage for AxumMessage {
    fn into_frame(self) -> Option<Frame> {
        Some(match self {
            AxumMessage::Text(text) => Frame::Text(text.as_str().to_owned()),
            AxumMessage::Binary(data) => Frame::Binary(data),
            AxumMessage::Ping(data) => Frame::Ping(data),
            AxumMessage::Pong(data) => Frame::Pong(data),
            AxumMessage::Close(close) => Frame::Close(close.map(|c| CloseReason {
                code: c.code,
                reason: c.reason.as_str().to_owned(),
            })),
        })
    }

    fn from_frame(frame: Frame) -> Self {
        match frame {
            Frame::Text(text) => AxumMessage::Text(text.into()),
            Frame::Binary(data) => AxumMessage::Binary(data),
            Frame::Ping(data) => AxumMessage::Ping(data),
            Frame::Pong(data) => AxumMessage::Pong(data),
            Frame::Close(close) => AxumMessage::Close(close.map(|c| AxumCloseFrame {
                code: c.code,
                reason: c.reason.into(),
            })),
        }
    }
}

impl WireMessage for TungsteniteMessage {
    fn into_frame(self) -> Option<Frame> {
        Some(match self {
            TungsteniteMessage::Text(text) => Frame::Text(text.as_str().to_owned()),
            TungsteniteMessage::Binary(data) => Frame::Binary(data),
            TungsteniteMessage::Ping(data) => Frame::Ping(data),
            TungsteniteMessage::Pong(data) => Frame::Pong(data),
            TungsteniteMessage::Close(close) => Frame::Close(close.map(|c| CloseReason {
                code: u16::from(c.code),
                reason: c.reason.as_str().to_owned(),
            })),
            TungsteniteMessage::Frame(_) => return None,
        })
    }

    fn from_frame(frame: Frame) -> Self {
        match frame {
            Frame::Text(text) => TungsteniteMessage::Text(text.into()),
            Frame::Binary(data) => TungsteniteMessage::Binary(data),
            Frame::Ping(data) => TungsteniteMessage::Ping(data),
            Frame::Pong(data) => TungsteniteMessage::Pong(data),
            Frame::Close(close) => TungsteniteMessage::Close(close.map(|c| TungsteniteCloseFrame {
                code: CloseCode::from(c.code),
                reason: c.reason.into(),
            })),
        }
    }
}
