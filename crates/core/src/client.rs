//! Session lifecycle: open, run, shut down.
//!
//! [`Client::run`] connects over WebSocket; [`Client::run_with`] accepts any
//! [`TransportParts`], which is how tests drive a session without a server.
//!
//! # Shutdown
//!
//! The session runs until either the caller's shutdown future resolves or the
//! transport closes. The client then closes the transport if it is still open.
//! The closing handshake and the wait for the dispatcher and pinger share one
//! `shutdown_timeout` budget; tasks still running after it are aborted.

use std::future::Future;
use std::pin::pin;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, timeout, timeout_at};
use tracing::{debug, info, warn};
use wsauth_runtime::transport::WebSocketTransport;
use wsauth_runtime::{PingReport, Pinger, TransportError, TransportParts};

use crate::config::ClientConfig;
use crate::dispatcher::{Dispatcher, publish};
use crate::error::Result;
use crate::session::{Session, SessionEvent};

/// What ended the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
	/// The caller's shutdown signal fired.
	Interrupted,
	/// The transport closed or failed on its own.
	TransportClosed,
}

/// Final state of a finished session.
#[derive(Debug)]
pub struct Outcome {
	pub termination: Termination,
	/// Session as the dispatcher left it; `None` if it had to be aborted or
	/// never started.
	pub session: Option<Session>,
	/// Pinger summary; `None` if it had to be aborted.
	pub ping: Option<PingReport>,
}

/// Lifecycle controller for one session.
pub struct Client {
	config: ClientConfig,
	observer: Option<mpsc::UnboundedSender<SessionEvent>>,
}

impl Client {
	pub fn new(config: ClientConfig) -> Self {
		Self { config, observer: None }
	}

	/// Forwards every session event to `observer`.
	pub fn with_observer(mut self, observer: mpsc::UnboundedSender<SessionEvent>) -> Self {
		self.observer = Some(observer);
		self
	}

	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	/// Connects to the configured endpoint and runs the session until
	/// `shutdown` resolves or the server goes away.
	///
	/// Fails only if the configuration is invalid or the connection cannot be
	/// opened within `connect_timeout`. A shutdown during the connect attempt
	/// returns an interrupted [`Outcome`] with no session.
	pub async fn run<F>(&self, shutdown: F) -> Result<Outcome>
	where
		F: Future<Output = ()>,
	{
		self.config.validate()?;

		info!(
			target = "wsauth.client",
			url = %self.config.url,
			channel = %self.config.channel,
			"connecting"
		);
		let mut shutdown = pin!(shutdown);
		let connect = timeout(self.config.connect_timeout, WebSocketTransport::connect(&self.config.url));
		let parts = tokio::select! {
			connected = connect => match connected {
				Ok(parts) => parts?,
				Err(_) => {
					return Err(TransportError::ConnectTimeout {
						url: self.config.url.clone(),
						timeout_ms: self.config.connect_timeout.as_millis() as u64,
					}
					.into());
				}
			},
			_ = &mut shutdown => {
				info!(target = "wsauth.client", "interrupted while connecting");
				return Ok(Outcome {
					termination: Termination::Interrupted,
					session: None,
					ping: None,
				});
			}
		};
		Ok(self.run_with(parts, shutdown).await)
	}

	/// Runs the session over an already opened transport.
	pub async fn run_with<F>(&self, parts: TransportParts, shutdown: F) -> Outcome
	where
		F: Future<Output = ()>,
	{
		let (handle, mut inbound) = wsauth_runtime::open(parts);

		let pinger = tokio::spawn(Pinger::new(Arc::clone(&handle), self.config.ping_interval).run());

		let session = Session::new(self.config.credentials()).with_subscriptions(self.config.subscribe.clone());
		let mut dispatcher = Dispatcher::new(session, Arc::clone(&handle));
		if let Some(observer) = &self.observer {
			dispatcher = dispatcher.with_observer(observer.clone());
		}
		let dispatch = tokio::spawn(async move {
			dispatcher.run(&mut inbound).await;
			dispatcher.into_session()
		});

		let termination = tokio::select! {
			_ = shutdown => Termination::Interrupted,
			_ = handle.closed() => Termination::TransportClosed,
		};
		info!(target = "wsauth.client", ?termination, "shutting down");

		// Everything from here on, the closing handshake included, shares one deadline.
		let deadline = Instant::now() + self.config.shutdown_timeout;
		if handle.is_open() {
			debug!(target = "wsauth.client", "closing connection");
			match timeout_at(deadline, handle.close()).await {
				Ok(Ok(())) => {}
				Ok(Err(err)) => warn!(target = "wsauth.client", error = %err, "close failed"),
				Err(_) => warn!(target = "wsauth.client", "closing handshake did not finish in time"),
			}
		}

		let session = join_by(dispatch, deadline, "dispatcher").await;
		let ping = join_by(pinger, deadline, "pinger").await;

		if let Some(report) = &ping {
			publish(self.observer.as_ref(), SessionEvent::PingTaskEnded { report: report.clone() });
		}

		info!(target = "wsauth.client", "shutdown complete");
		Outcome { termination, session, ping }
	}
}

/// Waits for `task` until `deadline`, aborting it if it is still running.
async fn join_by<T>(mut task: JoinHandle<T>, deadline: Instant, name: &'static str) -> Option<T> {
	match timeout_at(deadline, &mut task).await {
		Ok(Ok(value)) => Some(value),
		Ok(Err(err)) => {
			warn!(target = "wsauth.client", task = name, error = %err, "background task failed");
			None
		}
		Err(_) => {
			warn!(target = "wsauth.client", task = name, "background task did not stop in time; aborting");
			task.abort();
			None
		}
	}
}
