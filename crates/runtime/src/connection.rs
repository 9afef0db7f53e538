//! Shared handle over an open transport.
//!
//! [`open`] splits [`TransportParts`] into:
//! * an [`Arc<TransportHandle>`] that any task may write through; writes are
//!   serialized behind one lock so frames never interleave
//! * an [`Inbound`] stream that yields [`TransportEvent`]s in arrival order to a
//!   single consumer
//!
//! The handle's open flag is the one cancellation signal: it drops to `false`
//! when [`Inbound`] sees the transport end, when a write fails, or when
//! [`TransportHandle::close`] runs. [`TransportHandle::closed`] wakes every waiter.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::error::WriteError;
use crate::transport::{TransportEvent, TransportParts, TransportSink};

/// Opens a connection over `parts` and starts its reader task.
pub fn open(parts: TransportParts) -> (Arc<TransportHandle>, Inbound) {
	let TransportParts { sink, receiver, events } = parts;
	let (open_tx, _) = watch::channel(true);

	let handle = Arc::new(TransportHandle {
		sink: Mutex::new(sink),
		open: open_tx,
	});

	let reader = tokio::spawn(receiver.run());
	let inbound = Inbound {
		handle: Arc::clone(&handle),
		events,
		reader,
	};

	(handle, inbound)
}

/// Write side and liveness state of one connection.
pub struct TransportHandle {
	sink: Mutex<Box<dyn TransportSink>>,
	open: watch::Sender<bool>,
}

impl TransportHandle {
	/// Returns `true` until the transport ends or is closed locally.
	pub fn is_open(&self) -> bool {
		*self.open.borrow()
	}

	/// Resolves once the handle is no longer open.
	pub async fn closed(&self) {
		let mut rx = self.open.subscribe();
		while *rx.borrow_and_update() {
			if rx.changed().await.is_err() {
				return;
			}
		}
	}

	/// Writes one text frame.
	///
	/// Concurrent callers are serialized. Fails with [`WriteError::Closed`] once
	/// the handle is closed; any write failure also closes the transport.
	pub async fn send_text(&self, frame: String) -> Result<(), WriteError> {
		let mut sink = self.sink.lock().await;
		if !self.is_open() {
			return Err(WriteError::Closed);
		}

		trace!(target = "wsauth.transport", %frame, "write");
		let result = sink.send(frame).await;
		if let Err(err) = &result {
			debug!(target = "wsauth.transport", error = %err, "write failed; closing transport");
			self.mark_closed();
			if let Err(close_err) = sink.close().await {
				trace!(target = "wsauth.transport", error = %close_err, "close after failed write");
			}
		}
		result
	}

	/// Requests an orderly close. Calling it on a closed handle is a no-op.
	///
	/// The handle reads as closed before the writer lock is taken, so
	/// [`closed`](Self::closed) waiters wake even while a write is stuck.
	pub async fn close(&self) -> Result<(), WriteError> {
		if !self.open.send_replace(false) {
			return Ok(());
		}

		debug!(target = "wsauth.transport", "closing transport");
		let mut sink = self.sink.lock().await;
		sink.close().await
	}

	fn mark_closed(&self) {
		self.open.send_replace(false);
	}
}

/// Ordered stream of transport events for a single consumer.
///
/// Dropping it stops the reader task.
pub struct Inbound {
	handle: Arc<TransportHandle>,
	events: mpsc::UnboundedReceiver<TransportEvent>,
	reader: JoinHandle<()>,
}

impl Inbound {
	/// Waits for the next event; `None` once the reader is done.
	pub async fn next(&mut self) -> Option<TransportEvent> {
		let event = self.events.recv().await;
		match &event {
			Some(event) if event.is_terminal() => self.handle.mark_closed(),
			None => self.handle.mark_closed(),
			Some(_) => {}
		}
		event
	}
}

impl Drop for Inbound {
	fn drop(&mut self) {
		self.reader.abort();
	}
}
