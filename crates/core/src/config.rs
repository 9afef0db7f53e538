//! Client configuration.

use std::fmt;
use std::time::Duration;

use thiserror::Error;
use url::Url;
pub use wsauth_runtime::pinger::DEFAULT_PING_INTERVAL;

use crate::session::Credentials;

pub const DEFAULT_URL: &str = "ws://localhost:3000/api/ws";
pub const DEFAULT_PASSWORD: &str = "websocket-password";
pub const DEFAULT_CHANNEL: &str = "EKAB";
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Invalid [`ClientConfig`] values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
	#[error("invalid server url `{url}`: {reason}")]
	InvalidUrl { url: String, reason: String },

	#[error("channel must not be empty")]
	EmptyChannel,

	#[error("ping interval must be greater than zero")]
	ZeroPingInterval,

	#[error("connect timeout must be greater than zero")]
	ZeroConnectTimeout,
}

/// Everything a [`Client`](crate::Client) needs for one session.
#[derive(Clone)]
pub struct ClientConfig {
	/// Server endpoint, `ws://` or `wss://`.
	pub url: String,
	/// Secret sent in the `auth` frame.
	pub password: String,
	/// Channel to authenticate for.
	pub channel: String,
	/// Delay between heartbeats.
	pub ping_interval: Duration,
	/// Budget for the closing handshake and background tasks on shutdown.
	pub shutdown_timeout: Duration,
	/// How long the WebSocket handshake may take.
	pub connect_timeout: Duration,
	/// Topics to subscribe to after authentication.
	pub subscribe: Vec<String>,
}

impl Default for ClientConfig {
	fn default() -> Self {
		Self {
			url: DEFAULT_URL.to_string(),
			password: DEFAULT_PASSWORD.to_string(),
			channel: DEFAULT_CHANNEL.to_string(),
			ping_interval: DEFAULT_PING_INTERVAL,
			shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
			connect_timeout: DEFAULT_CONNECT_TIMEOUT,
			subscribe: Vec::new(),
		}
	}
}

impl fmt::Debug for ClientConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ClientConfig")
			.field("url", &self.url)
			.field("password", &"<redacted>")
			.field("channel", &self.channel)
			.field("ping_interval", &self.ping_interval)
			.field("shutdown_timeout", &self.shutdown_timeout)
			.field("connect_timeout", &self.connect_timeout)
			.field("subscribe", &self.subscribe)
			.finish()
	}
}

impl ClientConfig {
	/// Checks the endpoint scheme and the values the session relies on.
	pub fn validate(&self) -> Result<(), ConfigError> {
		let invalid = |reason: String| ConfigError::InvalidUrl {
			url: self.url.clone(),
			reason,
		};

		let url = Url::parse(&self.url).map_err(|e| invalid(e.to_string()))?;
		if !matches!(url.scheme(), "ws" | "wss") {
			return Err(invalid(format!("unsupported scheme `{}`, expected ws or wss", url.scheme())));
		}
		if url.host_str().is_none_or(str::is_empty) {
			return Err(invalid("missing host".to_string()));
		}

		if self.channel.trim().is_empty() {
			return Err(ConfigError::EmptyChannel);
		}
		if self.ping_interval.is_zero() {
			return Err(ConfigError::ZeroPingInterval);
		}
		if self.connect_timeout.is_zero() {
			return Err(ConfigError::ZeroConnectTimeout);
		}
		Ok(())
	}

	pub fn credentials(&self) -> Credentials {
		Credentials {
			password: self.password.clone(),
			channel: self.channel.clone(),
		}
	}
}
