use serde::{Deserialize, Serialize};

/// Frame received from the server.
///
/// Tagged by the `type` field:
/// ```json
/// {"type": "auth_success", "channel": "EKAB", "clientId": "c1"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
	/// Server asks the client to authenticate.
	AuthRequired,
	/// Server accepted the credentials.
	AuthSuccess {
		#[serde(default)]
		channel: Option<String>,
		#[serde(default, rename = "clientId")]
		client_id: Option<String>,
	},
	/// Reply to a ping, echoing its timestamp (ms since epoch).
	Pong { timestamp: u64 },
}

impl InboundMessage {
	/// Discriminator values this crate can decode.
	pub const KNOWN_TYPES: [&'static str; 3] = ["auth_required", "auth_success", "pong"];

	/// Returns the wire discriminator for this message.
	pub fn kind(&self) -> &'static str {
		match self {
			InboundMessage::AuthRequired => "auth_required",
			InboundMessage::AuthSuccess { .. } => "auth_success",
			InboundMessage::Pong { .. } => "pong",
		}
	}
}

/// Frame sent to the server, tagged the same way as [`InboundMessage`].
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
	/// Credentials for the requested channel.
	Auth { password: String, channel: String },
	/// Liveness heartbeat stamped with the send time (ms since epoch).
	Ping { timestamp: u64 },
	/// Topic subscription sent once the session is authenticated.
	Subscribe { topic: String },
}

impl OutboundMessage {
	/// Returns the wire discriminator for this message.
	pub fn kind(&self) -> &'static str {
		match self {
			OutboundMessage::Auth { .. } => "auth",
			OutboundMessage::Ping { .. } => "ping",
			OutboundMessage::Subscribe { .. } => "subscribe",
		}
	}
}

impl std::fmt::Debug for OutboundMessage {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			OutboundMessage::Auth { channel, .. } => f.debug_struct("Auth").field("password", &"<redacted>").field("channel", channel).finish(),
			OutboundMessage::Ping { timestamp } => f.debug_struct("Ping").field("timestamp", timestamp).finish(),
			OutboundMessage::Subscribe { topic } => f.debug_struct("Subscribe").field("topic", topic).finish(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn auth_debug_hides_password() {
		let message = OutboundMessage::Auth {
			password: "hunter2".to_string(),
			channel: "EKAB".to_string(),
		};
		let rendered = format!("{message:?}");
		assert!(!rendered.contains("hunter2"));
		assert!(rendered.contains("EKAB"));
	}

	#[test]
	fn kinds_match_known_types() {
		let messages = [
			InboundMessage::AuthRequired,
			InboundMessage::AuthSuccess {
				channel: None,
				client_id: None,
			},
			InboundMessage::Pong { timestamp: 1 },
		];
		for message in messages {
			assert!(InboundMessage::KNOWN_TYPES.contains(&message.kind()));
		}
	}
}
