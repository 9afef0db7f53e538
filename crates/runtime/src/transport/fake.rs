//! In-memory transport for exercising sessions without a server.
//!
//! # Example
//!
//! ```ignore
//! let (parts, controller) = FakeTransportBuilder::new().build();
//! let (handle, mut inbound) = wsauth_runtime::open(parts);
//!
//! controller.inject_json(json!({"type": "auth_required"}));
//! assert_eq!(inbound.next().await, Some(TransportEvent::Opened));
//!
//! handle.send_text("{\"type\":\"ping\",\"timestamp\":1}".into()).await?;
//! assert_eq!(controller.take_sent()[0]["type"], "ping");
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;
use serde_json::Value as JsonValue;
use tokio::sync::mpsc;

use super::{TransportEvent, TransportParts, TransportReceiver, TransportSink};
use crate::error::WriteError;

/// Close code the fake reports when the client side closes.
pub const NORMAL_CLOSURE: u16 = 1000;

/// Builder for fake transport instances.
pub struct FakeTransportBuilder {}

impl FakeTransportBuilder {
	/// Creates a new fake transport builder.
	pub fn new() -> Self {
		Self {}
	}

	/// Builds the fake transport.
	///
	/// Returns [`TransportParts`] to open a connection with and a
	/// [`FakeTransportController`] to play the server side.
	pub fn build(self) -> (TransportParts, FakeTransportController) {
		let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
		let (events_tx, events_rx) = mpsc::unbounded_channel();
		let shared = Arc::new(Shared::default());

		let sink = FakeTransportSink {
			shared: Arc::clone(&shared),
			inbound_tx: inbound_tx.clone(),
		};

		let receiver = FakeTransportReceiver {
			inbound_rx,
			events: events_tx,
		};

		let controller = FakeTransportController { inbound_tx, shared };

		let parts = TransportParts {
			sink: Box::new(sink),
			receiver: Box::new(receiver),
			events: events_rx,
		};

		(parts, controller)
	}
}

impl Default for FakeTransportBuilder {
	fn default() -> Self {
		Self::new()
	}
}

#[derive(Default)]
struct Shared {
	sent: Mutex<Vec<String>>,
	fail_writes: AtomicBool,
	closed: AtomicBool,
	close_calls: AtomicUsize,
}

/// Server-side controls for a fake transport.
pub struct FakeTransportController {
	inbound_tx: mpsc::UnboundedSender<TransportEvent>,
	shared: Arc<Shared>,
}

impl FakeTransportController {
	/// Delivers a raw text frame to the client.
	pub fn inject_text(&self, frame: &str) {
		let _ = self.inbound_tx.send(TransportEvent::text(frame));
	}

	/// Delivers a binary frame to the client.
	pub fn inject_binary(&self, frame: &[u8]) {
		let _ = self.inbound_tx.send(TransportEvent::Message(frame.to_vec()));
	}

	/// Delivers a JSON frame to the client.
	pub fn inject_json(&self, frame: JsonValue) {
		let _ = self.inbound_tx.send(TransportEvent::text(frame.to_string()));
	}

	/// Fails the connection with `detail`.
	pub fn inject_error(&self, detail: &str) {
		self.shared.closed.store(true, Ordering::SeqCst);
		let _ = self.inbound_tx.send(TransportEvent::Error(detail.to_string()));
	}

	/// Closes the connection from the server side.
	pub fn close_remote(&self, code: u16, reason: &str) {
		self.shared.closed.store(true, Ordering::SeqCst);
		let _ = self.inbound_tx.send(TransportEvent::Closed {
			code: Some(code),
			reason: reason.to_string(),
		});
	}

	/// Makes every following write fail with [`WriteError::Io`].
	pub fn fail_writes(&self, fail: bool) {
		self.shared.fail_writes.store(fail, Ordering::SeqCst);
	}

	/// Takes all sent frames, parsed as JSON, clearing the buffer.
	///
	/// Frames that are not JSON come back as [`JsonValue::String`].
	pub fn take_sent(&self) -> Vec<JsonValue> {
		std::mem::take(&mut *self.shared.sent.lock())
			.into_iter()
			.map(|frame| serde_json::from_str(&frame).unwrap_or(JsonValue::String(frame)))
			.collect()
	}

	/// Returns the number of frames sent so far without clearing them.
	pub fn sent_count(&self) -> usize {
		self.shared.sent.lock().len()
	}

	/// Returns how many times the client asked to close.
	pub fn close_calls(&self) -> usize {
		self.shared.close_calls.load(Ordering::SeqCst)
	}
}

struct FakeTransportSink {
	shared: Arc<Shared>,
	inbound_tx: mpsc::UnboundedSender<TransportEvent>,
}

impl TransportSink for FakeTransportSink {
	fn send(&mut self, frame: String) -> Pin<Box<dyn Future<Output = Result<(), WriteError>> + Send + '_>> {
		let shared = Arc::clone(&self.shared);
		Box::pin(async move {
			if shared.closed.load(Ordering::SeqCst) {
				return Err(WriteError::Closed);
			}
			if shared.fail_writes.load(Ordering::SeqCst) {
				return Err(WriteError::Io("injected write failure".to_string()));
			}
			shared.sent.lock().push(frame);
			Ok(())
		})
	}

	fn close(&mut self) -> Pin<Box<dyn Future<Output = Result<(), WriteError>> + Send + '_>> {
		let shared = Arc::clone(&self.shared);
		let inbound_tx = self.inbound_tx.clone();
		Box::pin(async move {
			shared.close_calls.fetch_add(1, Ordering::SeqCst);
			if shared.closed.swap(true, Ordering::SeqCst) {
				return Ok(());
			}
			// The peer acknowledges the close, which ends the reader.
			let _ = inbound_tx.send(TransportEvent::Closed {
				code: Some(NORMAL_CLOSURE),
				reason: "closed by client".to_string(),
			});
			Ok(())
		})
	}
}

struct FakeTransportReceiver {
	inbound_rx: mpsc::UnboundedReceiver<TransportEvent>,
	events: mpsc::UnboundedSender<TransportEvent>,
}

impl TransportReceiver for FakeTransportReceiver {
	fn run(mut self: Box<Self>) -> Pin<Box<dyn Future<Output = ()> + Send>> {
		Box::pin(async move {
			if self.events.send(TransportEvent::Opened).is_err() {
				return;
			}

			while let Some(event) = self.inbound_rx.recv().await {
				let terminal = event.is_terminal();
				if self.events.send(event).is_err() || terminal {
					return;
				}
			}

			let _ = self.events.send(TransportEvent::Closed {
				code: None,
				reason: String::new(),
			});
		})
	}
}
