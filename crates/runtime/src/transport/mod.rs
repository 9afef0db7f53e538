//! Transport seam between a session and the wire.
//!
//! A transport is split in two halves so that writes and reads can proceed
//! concurrently:
//! * [`TransportSink`] writes text frames and performs the closing handshake
//!   (inbound data frames arrive as bytes and are validated by the codec)
//! * [`TransportReceiver`] pumps [`TransportEvent`]s into the channel handed out
//!   in [`TransportParts::events`]
//!
//! Receivers emit [`TransportEvent::Opened`] first and finish with exactly one
//! [`TransportEvent::Closed`] or [`TransportEvent::Error`].

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;

use crate::error::WriteError;

pub mod fake;
pub mod websocket;

pub use fake::{FakeTransportBuilder, FakeTransportController};
pub use websocket::WebSocketTransport;

/// Something that happened on the transport, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
	/// The connection is established and frames may flow.
	Opened,
	/// A data frame from the peer, text or binary, as raw bytes.
	Message(Vec<u8>),
	/// The connection failed; no further frames will arrive.
	Error(String),
	/// The connection closed, with the close frame's code and reason when present.
	Closed { code: Option<u16>, reason: String },
}

impl TransportEvent {
	/// Message event carrying a text frame.
	pub fn text(frame: impl Into<String>) -> Self {
		TransportEvent::Message(frame.into().into_bytes())
	}

	/// Returns `true` for events after which the transport is gone.
	pub fn is_terminal(&self) -> bool {
		matches!(self, TransportEvent::Error(_) | TransportEvent::Closed { .. })
	}
}

/// Write half of a transport.
pub trait TransportSink: Send {
	/// Writes one text frame.
	fn send(&mut self, frame: String) -> Pin<Box<dyn Future<Output = Result<(), WriteError>> + Send + '_>>;

	/// Starts the closing handshake.
	fn close(&mut self) -> Pin<Box<dyn Future<Output = Result<(), WriteError>> + Send + '_>>;
}

/// Read half of a transport.
pub trait TransportReceiver: Send {
	/// Pumps events until the connection ends.
	fn run(self: Box<Self>) -> Pin<Box<dyn Future<Output = ()> + Send>>;
}

/// Both halves of a freshly opened transport plus its event channel.
pub struct TransportParts {
	pub sink: Box<dyn TransportSink>,
	pub receiver: Box<dyn TransportReceiver>,
	pub events: mpsc::UnboundedReceiver<TransportEvent>,
}
