//! WebSocket session client with an authentication handshake and liveness pings.
//!
//! The pieces, leaves first:
//! * [`session`]: the per-connection state machine; pure transitions that return
//!   the frames to send and the events to report
//! * [`dispatcher`]: feeds transport events through the session and performs the
//!   resulting writes
//! * [`client`]: opens the transport, runs the dispatcher and the pinger, and
//!   shuts both down on interrupt or remote close
//!
//! # Example
//!
//! ```ignore
//! let config = ClientConfig {
//!     url: "ws://localhost:3000/api/ws".into(),
//!     ..Default::default()
//! };
//! let outcome = Client::new(config).run(async { tokio::signal::ctrl_c().await.ok(); }).await?;
//! println!("ended by {:?}", outcome.termination);
//! ```

pub mod client;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod session;

pub use client::{Client, Outcome, Termination};
pub use config::{ClientConfig, ConfigError};
pub use dispatcher::Dispatcher;
pub use error::{Error, Result};
pub use session::{ConnectionState, Credentials, EndReason, Session, SessionEvent, Transition};
pub use wsauth_protocol::{DecodeError, InboundMessage, OutboundMessage};
pub use wsauth_runtime::{PingExit, PingReport, TransportError, WriteError};
