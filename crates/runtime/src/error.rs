use thiserror::Error;

/// Failure to establish a transport.
#[derive(Debug, Error)]
pub enum TransportError {
	#[error("invalid endpoint `{url}`: {reason}")]
	InvalidUrl { url: String, reason: String },

	#[error("failed to connect to {url}: {source}")]
	Connect {
		url: String,
		#[source]
		source: Box<tokio_tungstenite::tungstenite::Error>,
	},

	#[error("timed out after {timeout_ms} ms connecting to {url}")]
	ConnectTimeout { url: String, timeout_ms: u64 },
}

/// Failure to write a frame on an open (or formerly open) transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WriteError {
	#[error("transport is closed")]
	Closed,

	#[error("transport write failed: {0}")]
	Io(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for WriteError {
	fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
		use tokio_tungstenite::tungstenite::Error as WsError;
		match err {
			WsError::ConnectionClosed | WsError::AlreadyClosed => WriteError::Closed,
			other => WriteError::Io(other.to_string()),
		}
	}
}
