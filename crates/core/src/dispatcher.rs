//! Routes transport events through the session.
//!
//! The dispatcher is the only owner of the [`Session`]: it decodes inbound
//! frames, applies the resulting [`Transition`], writes the outbound frames and
//! publishes each [`SessionEvent`] to the log and to an optional observer.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};
use wsauth_protocol::{decode, encode};
use wsauth_runtime::{Inbound, TransportEvent, TransportHandle};

use crate::session::{ConnectionState, EndReason, Session, SessionEvent, Transition};

/// Event-driven driver for one session.
pub struct Dispatcher {
	session: Session,
	handle: Arc<TransportHandle>,
	observer: Option<mpsc::UnboundedSender<SessionEvent>>,
}

impl Dispatcher {
	pub fn new(session: Session, handle: Arc<TransportHandle>) -> Self {
		Self {
			session,
			handle,
			observer: None,
		}
	}

	/// Forwards every published event to `observer` as well as the log.
	pub fn with_observer(mut self, observer: mpsc::UnboundedSender<SessionEvent>) -> Self {
		self.observer = Some(observer);
		self
	}

	pub fn session(&self) -> &Session {
		&self.session
	}

	pub fn into_session(self) -> Session {
		self.session
	}

	/// Dispatches events from `inbound` until the transport ends.
	pub async fn run(&mut self, inbound: &mut Inbound) {
		while let Some(event) = inbound.next().await {
			if self.dispatch(event).await.is_break() {
				return;
			}
		}

		// Reader went away without a close or error event.
		if self.session.state() != ConnectionState::Disconnected {
			let transition = self.session.end(EndReason::Closed {
				code: None,
				reason: "transport ended".to_string(),
			});
			self.apply(transition).await;
		}
	}

	/// Handles one transport event. Breaks once the transport is gone.
	pub async fn dispatch(&mut self, event: TransportEvent) -> ControlFlow<()> {
		match event {
			TransportEvent::Opened => {
				let transition = self.session.open();
				self.apply(transition).await;
				ControlFlow::Continue(())
			}
			TransportEvent::Message(frame) => {
				trace!(target = "wsauth.session", frame = %String::from_utf8_lossy(&frame), "received");
				match decode(&frame) {
					Ok(message) => {
						let transition = self.session.receive(message);
						self.apply(transition).await;
					}
					Err(error) => self.publish(SessionEvent::DecodeFailed { error }),
				}
				ControlFlow::Continue(())
			}
			TransportEvent::Error(detail) => {
				let transition = self.session.end(EndReason::Error { detail });
				self.apply(transition).await;
				ControlFlow::Break(())
			}
			TransportEvent::Closed { code, reason } => {
				let transition = self.session.end(EndReason::Closed { code, reason });
				self.apply(transition).await;
				ControlFlow::Break(())
			}
		}
	}

	async fn apply(&mut self, transition: Transition) {
		let Transition { outbound, events } = transition;
		for event in events {
			self.publish(event);
		}

		for message in outbound {
			let kind = message.kind();
			match self.handle.send_text(encode(&message)).await {
				Ok(()) => debug!(target = "wsauth.session", kind, "sent"),
				Err(error) => self.publish(SessionEvent::SendFailed { kind, error }),
			}
		}
	}

	fn publish(&self, event: SessionEvent) {
		publish(self.observer.as_ref(), event);
	}
}

/// Logs `event` and forwards it to `observer` when there is one.
pub(crate) fn publish(observer: Option<&mpsc::UnboundedSender<SessionEvent>>, event: SessionEvent) {
	log_event(&event);
	if let Some(observer) = observer {
		let _ = observer.send(event);
	}
}

fn log_event(event: &SessionEvent) {
	match event {
		SessionEvent::Opened => info!(target = "wsauth.session", "connection opened"),
		SessionEvent::AuthRequested { channel } => {
			info!(target = "wsauth.session", %channel, "server requested authentication; sending credentials")
		}
		SessionEvent::AuthRequestIgnored { state } => {
			warn!(target = "wsauth.session", %state, "ignoring repeated auth_required")
		}
		SessionEvent::Authenticated { channel, client_id } => info!(
			target = "wsauth.session",
			%channel,
			client_id = client_id.as_deref().unwrap_or("-"),
			"authenticated"
		),
		SessionEvent::UnexpectedAuthSuccess { state } => {
			warn!(target = "wsauth.session", %state, "ignoring auth_success without pending auth")
		}
		SessionEvent::SubscriptionRequested { topic } => info!(target = "wsauth.session", %topic, "subscribing"),
		SessionEvent::HeartbeatAcknowledged { timestamp } => info!(
			target = "wsauth.session",
			timestamp,
			round_trip_ms = now_millis().saturating_sub(*timestamp),
			"heartbeat acknowledged"
		),
		SessionEvent::DecodeFailed { error } => warn!(target = "wsauth.session", %error, "dropping undecodable frame"),
		SessionEvent::SendFailed { kind, error } => error!(target = "wsauth.session", kind, %error, "send failed"),
		SessionEvent::Ended {
			reason: reason @ EndReason::Error { .. },
		} => warn!(target = "wsauth.session", %reason, "session ended"),
		SessionEvent::Ended { reason } => info!(target = "wsauth.session", %reason, "session ended"),
		SessionEvent::PingTaskEnded { report } => {
			info!(target = "wsauth.session", sent = report.sent, exit = ?report.exit, "ping task ended")
		}
	}
}

fn now_millis() -> u64 {
	SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or(0)
}

#[cfg(test)]
mod tests {
	use serde_json::json;
	use wsauth_protocol::DecodeError;
	use wsauth_runtime::transport::FakeTransportBuilder;
	use wsauth_runtime::{WriteError, open};

	use super::*;
	use crate::session::Credentials;

	fn dispatcher() -> (Dispatcher, wsauth_runtime::transport::FakeTransportController, mpsc::UnboundedReceiver<SessionEvent>) {
		let (parts, controller) = FakeTransportBuilder::new().build();
		let (handle, _inbound) = open(parts);
		let (tx, rx) = mpsc::unbounded_channel();
		let session = Session::new(Credentials {
			password: "secret".to_string(),
			channel: "EKAB".to_string(),
		});
		(Dispatcher::new(session, handle).with_observer(tx), controller, rx)
	}

	fn drain(rx: &mut mpsc::UnboundedReceiver<SessionEvent>) -> Vec<SessionEvent> {
		let mut events = Vec::new();
		while let Ok(event) = rx.try_recv() {
			events.push(event);
		}
		events
	}

	#[tokio::test]
	async fn opened_then_auth_required_writes_one_auth() {
		let (mut dispatcher, controller, mut rx) = dispatcher();

		assert!(dispatcher.dispatch(TransportEvent::Opened).await.is_continue());
		assert!(controller.take_sent().is_empty());

		let frame = json!({"type": "auth_required"}).to_string();
		assert!(dispatcher.dispatch(TransportEvent::text(frame)).await.is_continue());

		assert_eq!(dispatcher.session().state(), ConnectionState::AwaitingAuth);
		assert_eq!(
			controller.take_sent(),
			vec![json!({"type": "auth", "password": "secret", "channel": "EKAB"})]
		);
		assert_eq!(
			drain(&mut rx),
			vec![
				SessionEvent::Opened,
				SessionEvent::AuthRequested {
					channel: "EKAB".to_string()
				}
			]
		);
	}

	#[tokio::test]
	async fn handshake_then_heartbeat() {
		let (mut dispatcher, controller, mut rx) = dispatcher();
		dispatcher.dispatch(TransportEvent::Opened).await;
		dispatcher.dispatch(TransportEvent::text(r#"{"type":"auth_required"}"#)).await;
		dispatcher
			.dispatch(TransportEvent::text(r#"{"type":"auth_success","channel":"EKAB","clientId":"c1"}"#))
			.await;

		assert_eq!(dispatcher.session().state(), ConnectionState::Authenticated);
		assert_eq!(dispatcher.session().client_id(), Some("c1"));
		assert_eq!(controller.take_sent().len(), 1);
		drain(&mut rx);

		dispatcher
			.dispatch(TransportEvent::text(r#"{"type":"pong","timestamp":1700000000000}"#))
			.await;
		assert_eq!(
			drain(&mut rx),
			vec![SessionEvent::HeartbeatAcknowledged { timestamp: 1_700_000_000_000 }]
		);
		assert_eq!(dispatcher.session().state(), ConnectionState::Authenticated);
	}

	#[tokio::test]
	async fn undecodable_frames_leave_state_untouched() {
		let (mut dispatcher, controller, mut rx) = dispatcher();
		dispatcher.dispatch(TransportEvent::Opened).await;
		drain(&mut rx);

		for frame in ["", "{", "[]", "{\"kind\":\"auth_required\"}", "{\"type\":\"aircraft_data\"}"] {
			assert!(dispatcher.dispatch(TransportEvent::text(frame)).await.is_continue());
			assert_eq!(dispatcher.session().state(), ConnectionState::Connected);
		}
		assert!(dispatcher.dispatch(TransportEvent::Message(vec![0xff, 0xfe, 0x00])).await.is_continue());

		let events = drain(&mut rx);
		assert_eq!(events.len(), 6);
		assert!(events.iter().all(|event| matches!(event, SessionEvent::DecodeFailed { .. })));
		assert!(events.contains(&SessionEvent::DecodeFailed {
			error: DecodeError::UnknownType("aircraft_data".to_string())
		}));
		assert!(controller.take_sent().is_empty());
	}

	#[tokio::test]
	async fn failed_auth_write_is_reported() {
		let (mut dispatcher, controller, mut rx) = dispatcher();
		dispatcher.dispatch(TransportEvent::Opened).await;
		controller.fail_writes(true);

		dispatcher.dispatch(TransportEvent::text(r#"{"type":"auth_required"}"#)).await;

		let events = drain(&mut rx);
		assert!(matches!(
			events.last(),
			Some(SessionEvent::SendFailed {
				kind: "auth",
				error: WriteError::Io(_)
			})
		));
	}

	#[tokio::test]
	async fn close_and_error_end_the_session() {
		let (mut dispatcher, _controller, mut rx) = dispatcher();
		dispatcher.dispatch(TransportEvent::Opened).await;

		let flow = dispatcher
			.dispatch(TransportEvent::Closed {
				code: Some(1000),
				reason: "bye".to_string(),
			})
			.await;
		assert!(flow.is_break());
		assert_eq!(dispatcher.session().state(), ConnectionState::Disconnected);
		assert_eq!(
			drain(&mut rx).last(),
			Some(&SessionEvent::Ended {
				reason: EndReason::Closed {
					code: Some(1000),
					reason: "bye".to_string()
				}
			})
		);

		dispatcher.dispatch(TransportEvent::Opened).await;
		let flow = dispatcher.dispatch(TransportEvent::Error("connection reset".to_string())).await;
		assert!(flow.is_break());
		assert_eq!(dispatcher.session().state(), ConnectionState::Disconnected);
	}
}
