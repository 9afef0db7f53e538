//! Connection plumbing for wsauth sessions.
//!
//! * [`transport`]: the seam between a session and the wire, with a
//!   `tokio-tungstenite` implementation and an in-memory fake for tests
//! * [`connection`]: the shared [`TransportHandle`] (serialized writes, open state)
//!   and the ordered [`Inbound`] event stream
//! * [`pinger`]: the periodic heartbeat task bound to a handle

pub mod connection;
pub mod error;
pub mod pinger;
pub mod transport;

pub use connection::{Inbound, TransportHandle, open};
pub use error::{TransportError, WriteError};
pub use pinger::{PingExit, PingReport, Pinger};
pub use transport::{TransportEvent, TransportParts, TransportReceiver, TransportSink};
