use std::time::Duration;

use clap::Parser;
use wsauth::ClientConfig;
use wsauth::config::{DEFAULT_CHANNEL, DEFAULT_CONNECT_TIMEOUT, DEFAULT_PASSWORD, DEFAULT_PING_INTERVAL, DEFAULT_SHUTDOWN_TIMEOUT, DEFAULT_URL};

#[derive(Parser, Debug)]
#[command(name = "wsauth")]
#[command(about = "Authenticate to a WebSocket server and keep the session alive")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug, -vvv frame trace)
	#[arg(short, long, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Server endpoint
	#[arg(long, env = "WSAUTH_URL", default_value = DEFAULT_URL)]
	pub url: String,

	/// Secret sent when the server asks for authentication
	#[arg(long, env = "WSAUTH_PASSWORD", default_value = DEFAULT_PASSWORD, hide_default_value = true, hide_env_values = true)]
	pub password: String,

	/// Channel to authenticate for
	#[arg(long, env = "WSAUTH_CHANNEL", default_value = DEFAULT_CHANNEL)]
	pub channel: String,

	/// Seconds between heartbeats
	#[arg(long, env = "WSAUTH_PING_INTERVAL", value_name = "SECS", default_value_t = DEFAULT_PING_INTERVAL.as_secs())]
	pub ping_interval: u64,

	/// Seconds to wait for background tasks on shutdown
	#[arg(long, env = "WSAUTH_SHUTDOWN_TIMEOUT", value_name = "SECS", default_value_t = DEFAULT_SHUTDOWN_TIMEOUT.as_secs())]
	pub shutdown_timeout: u64,

	/// Seconds to wait for the WebSocket handshake
	#[arg(long, env = "WSAUTH_CONNECT_TIMEOUT", value_name = "SECS", default_value_t = DEFAULT_CONNECT_TIMEOUT.as_secs())]
	pub connect_timeout: u64,

	/// Topics to subscribe to once authenticated (comma separated)
	#[arg(long, env = "WSAUTH_SUBSCRIBE", value_name = "TOPIC", value_delimiter = ',')]
	pub subscribe: Vec<String>,
}

impl Cli {
	pub fn into_config(self) -> ClientConfig {
		ClientConfig {
			url: self.url,
			password: self.password,
			channel: self.channel,
			ping_interval: Duration::from_secs(self.ping_interval),
			shutdown_timeout: Duration::from_secs(self.shutdown_timeout),
			connect_timeout: Duration::from_secs(self.connect_timeout),
			subscribe: self.subscribe.into_iter().map(|topic| topic.trim().to_string()).filter(|topic| !topic.is_empty()).collect(),
		}
	}
}
