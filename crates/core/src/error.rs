use thiserror::Error;

use crate::config::ConfigError;

/// Errors that stop a session before it starts.
///
/// Everything after the transport opens degrades to [`SessionEvent`](crate::SessionEvent)s
/// instead of errors.
#[derive(Debug, Error)]
pub enum Error {
	#[error(transparent)]
	Config(#[from] ConfigError),

	#[error(transparent)]
	Transport(#[from] wsauth_runtime::TransportError),
}

pub type Result<T> = std::result::Result<T, Error>;
