//! Human-readable session progress on stdout.

use tokio::sync::mpsc;
use wsauth::{Outcome, PingExit, SessionEvent, Termination};

/// One status line for `event`, or `None` for events only worth logging.
pub fn describe(event: &SessionEvent) -> Option<String> {
	match event {
		SessionEvent::Opened => Some("connected".to_string()),
		SessionEvent::AuthRequested { channel } => Some(format!("authenticating for channel {channel}")),
		SessionEvent::Authenticated { channel, client_id } => Some(match client_id {
			Some(id) => format!("authenticated on {channel} as {id}"),
			None => format!("authenticated on {channel}"),
		}),
		SessionEvent::SubscriptionRequested { topic } => Some(format!("subscribed to {topic}")),
		SessionEvent::HeartbeatAcknowledged { timestamp } => Some(format!("heartbeat acknowledged (sent at {timestamp})")),
		SessionEvent::Ended { reason } => Some(format!("connection {reason}")),
		SessionEvent::SendFailed { kind, error } => Some(format!("failed to send {kind}: {error}")),
		SessionEvent::AuthRequestIgnored { .. }
		| SessionEvent::UnexpectedAuthSuccess { .. }
		| SessionEvent::DecodeFailed { .. }
		| SessionEvent::PingTaskEnded { .. } => None,
	}
}

/// Prints events until every sender is gone.
pub async fn print_events(mut events: mpsc::UnboundedReceiver<SessionEvent>) {
	while let Some(event) = events.recv().await {
		if let Some(line) = describe(&event) {
			println!("{line}");
		}
	}
}

/// Closing line for a finished session.
pub fn summary(outcome: &Outcome) -> String {
	let cause = match outcome.termination {
		Termination::Interrupted => "interrupted",
		Termination::TransportClosed => "server closed the connection",
	};
	match &outcome.ping {
		Some(report) => {
			let pings = report.sent;
			match &report.exit {
				PingExit::WriteFailed(err) => format!("{cause}; {pings} heartbeat(s) sent, last failed: {err}"),
				PingExit::Idle | PingExit::Cancelled => format!("{cause}; {pings} heartbeat(s) sent"),
			}
		}
		None => format!("{cause}; heartbeat task aborted"),
	}
}

#[cfg(test)]
mod tests {
	use wsauth::{EndReason, PingReport};

	use super::*;

	#[test]
	fn describes_handshake_progress() {
		assert_eq!(describe(&SessionEvent::Opened).as_deref(), Some("connected"));
		assert_eq!(
			describe(&SessionEvent::Authenticated {
				channel: "EKAB".to_string(),
				client_id: Some("c1".to_string()),
			})
			.as_deref(),
			Some("authenticated on EKAB as c1")
		);
		assert_eq!(
			describe(&SessionEvent::Ended {
				reason: EndReason::Closed {
					code: Some(1001),
					reason: "restart".to_string(),
				},
			})
			.as_deref(),
			Some("connection closed (code 1001): restart")
		);
	}

	#[test]
	fn heartbeat_acknowledgements_are_shown() {
		assert_eq!(
			describe(&SessionEvent::HeartbeatAcknowledged { timestamp: 1_700_000_000_000 }).as_deref(),
			Some("heartbeat acknowledged (sent at 1700000000000)")
		);
	}

	#[test]
	fn protocol_noise_stays_in_the_log() {
		assert_eq!(describe(&SessionEvent::UnexpectedAuthSuccess { state: wsauth::ConnectionState::Connected }), None);
	}

	#[test]
	fn summary_mentions_cause_and_pings() {
		let outcome = Outcome {
			termination: Termination::Interrupted,
			session: None,
			ping: Some(PingReport {
				sent: 3,
				exit: PingExit::Cancelled,
			}),
		};
		assert_eq!(summary(&outcome), "interrupted; 3 heartbeat(s) sent");

		let outcome = Outcome {
			termination: Termination::TransportClosed,
			session: None,
			ping: None,
		};
		assert_eq!(summary(&outcome), "server closed the connection; heartbeat task aborted");
	}
}
