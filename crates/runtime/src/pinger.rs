//! Periodic heartbeat task.
//!
//! The pinger sleeps for one interval, then writes a `ping` frame if the handle
//! is still open. It never retries: a failed write ends the task, and so does a
//! closed handle, observed at the tick, while sleeping, or while a write is stuck.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::{debug, info, warn};
use wsauth_protocol::{OutboundMessage, encode};

use crate::connection::TransportHandle;
use crate::error::WriteError;

/// Default heartbeat period.
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(20);

/// Why the pinger stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PingExit {
	/// The handle was not open at a tick.
	Idle,
	/// The handle closed while the pinger was waiting.
	Cancelled,
	/// Writing a ping failed.
	WriteFailed(WriteError),
}

/// Summary returned when the pinger stops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingReport {
	pub sent: u64,
	pub exit: PingExit,
}

/// Heartbeat task bound to one transport handle.
pub struct Pinger {
	handle: Arc<TransportHandle>,
	interval: Duration,
	last_timestamp: u64,
}

impl Pinger {
	pub fn new(handle: Arc<TransportHandle>, interval: Duration) -> Self {
		Self {
			handle,
			interval,
			last_timestamp: 0,
		}
	}

	/// Runs until the handle closes or a write fails.
	pub async fn run(mut self) -> PingReport {
		let mut sent = 0;
		debug!(target = "wsauth.ping", interval_ms = self.interval.as_millis() as u64, "ping task started");

		let exit = loop {
			tokio::select! {
				_ = tokio::time::sleep(self.interval) => {}
				_ = self.handle.closed() => break PingExit::Cancelled,
			}

			if !self.handle.is_open() {
				break PingExit::Idle;
			}

			let timestamp = self.next_timestamp();
			let frame = encode(&OutboundMessage::Ping { timestamp });
			let written = tokio::select! {
				biased;
				result = self.handle.send_text(frame) => result,
				_ = self.handle.closed() => break PingExit::Cancelled,
			};
			match written {
				Ok(()) => {
					sent += 1;
					debug!(target = "wsauth.ping", timestamp, "ping sent");
				}
				Err(err) => {
					warn!(target = "wsauth.ping", error = %err, "ping failed");
					break PingExit::WriteFailed(err);
				}
			}
		};

		info!(target = "wsauth.ping", sent, exit = ?exit, "ping task ended");
		PingReport { sent, exit }
	}

	/// Wall-clock milliseconds, bumped when needed so stamps strictly increase.
	fn next_timestamp(&mut self) -> u64 {
		let now = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or(0);
		self.last_timestamp = now.max(self.last_timestamp + 1);
		self.last_timestamp
	}
}
