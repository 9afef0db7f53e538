//! Wire types for the wsauth session protocol.
//!
//! Every frame is a flat JSON object carried in a WebSocket text frame and
//! tagged by its `type` field. This crate only knows the shapes on the wire:
//! * [`InboundMessage`]: what the server sends (`auth_required`, `auth_success`, `pong`)
//! * [`OutboundMessage`]: what the client sends (`auth`, `ping`, `subscribe`)
//!
//! Session behavior lives in `wsauth-rs`; transports live in `wsauth-runtime`.

pub mod codec;
pub mod messages;

pub use codec::*;
pub use messages::*;
