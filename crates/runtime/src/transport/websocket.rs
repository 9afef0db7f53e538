//! WebSocket transport over `tokio-tungstenite`.
//!
//! Handles `ws://` and `wss://` endpoints. Ping/pong control frames are answered
//! by tungstenite itself; only data frames and the close frame surface as
//! [`TransportEvent`]s.

use std::future::Future;
use std::pin::Pin;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, trace};

use super::{TransportEvent, TransportParts, TransportReceiver, TransportSink};
use crate::error::{TransportError, WriteError};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsStream = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Connector for WebSocket endpoints.
pub struct WebSocketTransport;

impl WebSocketTransport {
	/// Performs the WebSocket handshake with `url`.
	///
	/// Returns the transport only once the connection is established.
	pub async fn connect(url: &str) -> Result<TransportParts, TransportError> {
		if !(url.starts_with("ws://") || url.starts_with("wss://")) {
			return Err(TransportError::InvalidUrl {
				url: url.to_string(),
				reason: "scheme must be ws:// or wss://".to_string(),
			});
		}

		debug!(target = "wsauth.transport", %url, "connecting");
		let (ws, response) = connect_async(url).await.map_err(|source| TransportError::Connect {
			url: url.to_string(),
			source: Box::new(source),
		})?;
		debug!(target = "wsauth.transport", %url, status = %response.status(), "connected");

		let (sink, stream) = ws.split();
		let (events_tx, events_rx) = mpsc::unbounded_channel();

		Ok(TransportParts {
			sink: Box::new(WebSocketSink { sink }),
			receiver: Box::new(WebSocketReceiver { stream, events: events_tx }),
			events: events_rx,
		})
	}
}

struct WebSocketSink {
	sink: WsSink,
}

impl TransportSink for WebSocketSink {
	fn send(&mut self, frame: String) -> Pin<Box<dyn Future<Output = Result<(), WriteError>> + Send + '_>> {
		Box::pin(async move {
			trace!(target = "wsauth.transport", %frame, "send");
			self.sink.send(Message::Text(frame)).await.map_err(WriteError::from)
		})
	}

	fn close(&mut self) -> Pin<Box<dyn Future<Output = Result<(), WriteError>> + Send + '_>> {
		Box::pin(async move { self.sink.close().await.map_err(WriteError::from) })
	}
}

struct WebSocketReceiver {
	stream: WsStream,
	events: mpsc::UnboundedSender<TransportEvent>,
}

impl TransportReceiver for WebSocketReceiver {
	fn run(self: Box<Self>) -> Pin<Box<dyn Future<Output = ()> + Send>> {
		let WebSocketReceiver { mut stream, events } = *self;
		Box::pin(async move {
			let _ = events.send(TransportEvent::Opened);

			let terminal = loop {
				let event = match stream.next().await {
					Some(Ok(Message::Text(text))) => TransportEvent::text(text),
					Some(Ok(Message::Binary(data))) => TransportEvent::Message(data),
					Some(Ok(Message::Close(frame))) => {
						break match frame {
							Some(frame) => TransportEvent::Closed {
								code: Some(u16::from(frame.code)),
								reason: frame.reason.to_string(),
							},
							None => TransportEvent::Closed {
								code: None,
								reason: String::new(),
							},
						};
					}
					Some(Ok(_)) => continue,
					Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) | None => {
						break TransportEvent::Closed {
							code: None,
							reason: String::new(),
						};
					}
					Some(Err(err)) => break TransportEvent::Error(err.to_string()),
				};

				if events.send(event).is_err() {
					debug!(target = "wsauth.transport", "event consumer gone; stopping reader");
					return;
				}
			};

			debug!(target = "wsauth.transport", event = ?terminal, "reader finished");
			let _ = events.send(terminal);
		})
	}
}
