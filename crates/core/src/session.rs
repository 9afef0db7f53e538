//! Per-connection authentication state.
//!
//! ```text
//! Disconnected --open--> Connected --auth_required--> AwaitingAuth --auth_success--> Authenticated
//!      ^                                                                                  |
//!      +-------------------------- closed / error (from any state) ----------------------+
//! ```
//!
//! Transitions are pure: each returns a [`Transition`] listing the frames to
//! write and the events to report, and never touches the transport.

use std::fmt;

use wsauth_protocol::{DecodeError, InboundMessage, OutboundMessage};
use wsauth_runtime::{PingReport, WriteError};

/// Authentication progress of one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
	Disconnected,
	Connected,
	AwaitingAuth,
	Authenticated,
}

impl fmt::Display for ConnectionState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ConnectionState::Disconnected => write!(f, "disconnected"),
			ConnectionState::Connected => write!(f, "connected"),
			ConnectionState::AwaitingAuth => write!(f, "awaiting_auth"),
			ConnectionState::Authenticated => write!(f, "authenticated"),
		}
	}
}

/// Secret and channel presented when the server asks for authentication.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
	pub password: String,
	pub channel: String,
}

impl fmt::Debug for Credentials {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Credentials")
			.field("password", &"<redacted>")
			.field("channel", &self.channel)
			.finish()
	}
}

/// Why a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndReason {
	Closed { code: Option<u16>, reason: String },
	Error { detail: String },
}

impl fmt::Display for EndReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			EndReason::Closed { code: None, reason } if reason.is_empty() => write!(f, "closed"),
			EndReason::Closed { code: Some(code), reason } if reason.is_empty() => write!(f, "closed (code {code})"),
			EndReason::Closed { code: None, reason } => write!(f, "closed: {reason}"),
			EndReason::Closed { code: Some(code), reason } => write!(f, "closed (code {code}): {reason}"),
			EndReason::Error { detail } => write!(f, "error: {detail}"),
		}
	}
}

/// Observable things that happened to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
	Opened,
	/// `auth` was queued in response to `auth_required`.
	AuthRequested { channel: String },
	/// `auth_required` arrived while authentication was already underway or done.
	AuthRequestIgnored { state: ConnectionState },
	Authenticated { channel: String, client_id: Option<String> },
	/// `auth_success` arrived without a pending `auth`.
	UnexpectedAuthSuccess { state: ConnectionState },
	SubscriptionRequested { topic: String },
	HeartbeatAcknowledged { timestamp: u64 },
	DecodeFailed { error: DecodeError },
	SendFailed { kind: &'static str, error: WriteError },
	Ended { reason: EndReason },
	PingTaskEnded { report: PingReport },
}

/// Frames to write and events to report after one input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transition {
	pub outbound: Vec<OutboundMessage>,
	pub events: Vec<SessionEvent>,
}

impl Transition {
	fn event(event: SessionEvent) -> Self {
		Self {
			outbound: Vec::new(),
			events: vec![event],
		}
	}
}

/// Authentication and channel state for one transport connection.
#[derive(Debug, Clone)]
pub struct Session {
	state: ConnectionState,
	credentials: Credentials,
	subscriptions: Vec<String>,
	channel: String,
	client_id: Option<String>,
}

impl Session {
	pub fn new(credentials: Credentials) -> Self {
		Self {
			state: ConnectionState::Disconnected,
			channel: credentials.channel.clone(),
			credentials,
			subscriptions: Vec::new(),
			client_id: None,
		}
	}

	/// Topics to subscribe to once authenticated.
	pub fn with_subscriptions(mut self, topics: Vec<String>) -> Self {
		self.subscriptions = topics;
		self
	}

	pub fn state(&self) -> ConnectionState {
		self.state
	}

	/// Channel confirmed by the server, or the configured one until then.
	pub fn channel(&self) -> &str {
		&self.channel
	}

	pub fn client_id(&self) -> Option<&str> {
		self.client_id.as_deref()
	}

	/// The transport opened. The server is expected to start the handshake.
	pub fn open(&mut self) -> Transition {
		self.state = ConnectionState::Connected;
		self.channel = self.credentials.channel.clone();
		self.client_id = None;
		Transition::event(SessionEvent::Opened)
	}

	/// Applies one decoded server message.
	pub fn receive(&mut self, message: InboundMessage) -> Transition {
		match message {
			InboundMessage::AuthRequired => self.on_auth_required(),
			InboundMessage::AuthSuccess { channel, client_id } => self.on_auth_success(channel, client_id),
			InboundMessage::Pong { timestamp } => Transition::event(SessionEvent::HeartbeatAcknowledged { timestamp }),
		}
	}

	/// The transport closed or failed.
	pub fn end(&mut self, reason: EndReason) -> Transition {
		self.state = ConnectionState::Disconnected;
		Transition::event(SessionEvent::Ended { reason })
	}

	fn on_auth_required(&mut self) -> Transition {
		// Credentials go out at most once per open connection.
		if self.state != ConnectionState::Connected {
			return Transition::event(SessionEvent::AuthRequestIgnored { state: self.state });
		}

		self.state = ConnectionState::AwaitingAuth;
		Transition {
			outbound: vec![OutboundMessage::Auth {
				password: self.credentials.password.clone(),
				channel: self.credentials.channel.clone(),
			}],
			events: vec![SessionEvent::AuthRequested {
				channel: self.credentials.channel.clone(),
			}],
		}
	}

	fn on_auth_success(&mut self, channel: Option<String>, client_id: Option<String>) -> Transition {
		if self.state != ConnectionState::AwaitingAuth {
			return Transition::event(SessionEvent::UnexpectedAuthSuccess { state: self.state });
		}

		self.state = ConnectionState::Authenticated;
		if let Some(channel) = channel {
			self.channel = channel;
		}
		self.client_id = client_id;

		let mut transition = Transition::event(SessionEvent::Authenticated {
			channel: self.channel.clone(),
			client_id: self.client_id.clone(),
		});
		for topic in &self.subscriptions {
			transition.outbound.push(OutboundMessage::Subscribe { topic: topic.clone() });
			transition.events.push(SessionEvent::SubscriptionRequested { topic: topic.clone() });
		}
		transition
	}
}
