//! JSON encoding and decoding of session frames.

use serde_json::Value;
use thiserror::Error;

use crate::messages::{InboundMessage, OutboundMessage};

/// Why an inbound frame could not be turned into an [`InboundMessage`].
///
/// Decode failures are local: the caller logs them and keeps the session as is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
	#[error("frame is not valid JSON: {0}")]
	InvalidJson(String),

	#[error("frame is not a JSON object")]
	NotAnObject,

	#[error("frame has no string `type` field")]
	MissingType,

	#[error("unrecognized message type `{0}`")]
	UnknownType(String),

	#[error("invalid `{kind}` payload: {detail}")]
	InvalidPayload { kind: String, detail: String },
}

/// Decodes a raw frame into an [`InboundMessage`].
///
/// Never panics: malformed JSON, a missing or unknown `type`, and payloads with
/// the wrong field types all come back as [`DecodeError`].
pub fn decode(bytes: &[u8]) -> Result<InboundMessage, DecodeError> {
	let value: Value = serde_json::from_slice(bytes).map_err(|e| DecodeError::InvalidJson(e.to_string()))?;

	let Some(object) = value.as_object() else {
		return Err(DecodeError::NotAnObject);
	};

	let kind = match object.get("type") {
		Some(Value::String(kind)) => kind.clone(),
		_ => return Err(DecodeError::MissingType),
	};

	if !InboundMessage::KNOWN_TYPES.contains(&kind.as_str()) {
		return Err(DecodeError::UnknownType(kind));
	}

	serde_json::from_value(value).map_err(|e| DecodeError::InvalidPayload { kind, detail: e.to_string() })
}

/// Encodes an [`OutboundMessage`] as a JSON text frame.
pub fn encode(message: &OutboundMessage) -> String {
	serde_json::to_string(message).expect("OutboundMessage is always serializable")
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn decodes_auth_required() {
		assert_eq!(decode(br#"{"type":"auth_required"}"#), Ok(InboundMessage::AuthRequired));
	}

	#[test]
	fn decodes_auth_success_with_client_id() {
		let message = decode(br#"{"type":"auth_success","channel":"EKAB","clientId":"c1"}"#).unwrap();
		assert_eq!(
			message,
			InboundMessage::AuthSuccess {
				channel: Some("EKAB".to_string()),
				client_id: Some("c1".to_string()),
			}
		);
	}

	#[test]
	fn auth_success_fields_are_optional() {
		let message = decode(br#"{"type":"auth_success"}"#).unwrap();
		assert_eq!(
			message,
			InboundMessage::AuthSuccess {
				channel: None,
				client_id: None,
			}
		);
	}

	#[test]
	fn pong_keeps_timestamp_exact() {
		let message = decode(br#"{"type":"pong","timestamp":1700000000000}"#).unwrap();
		assert_eq!(message, InboundMessage::Pong { timestamp: 1_700_000_000_000 });
	}

	#[test]
	fn extra_fields_are_ignored() {
		let message = decode(br#"{"type":"auth_required","message":"please authenticate","version":2}"#).unwrap();
		assert_eq!(message, InboundMessage::AuthRequired);
	}

	#[test]
	fn malformed_frames_are_rejected() {
		let cases: [(&[u8], fn(&DecodeError) -> bool); 9] = [
			(b"", |e| matches!(e, DecodeError::InvalidJson(_))),
			(b"not json", |e| matches!(e, DecodeError::InvalidJson(_))),
			(b"{\"type\":", |e| matches!(e, DecodeError::InvalidJson(_))),
			(&[0xff, 0xfe, 0x00], |e| matches!(e, DecodeError::InvalidJson(_))),
			(b"[1,2,3]", |e| matches!(e, DecodeError::NotAnObject)),
			(b"\"auth_required\"", |e| matches!(e, DecodeError::NotAnObject)),
			(b"{}", |e| matches!(e, DecodeError::MissingType)),
			(b"{\"type\":7}", |e| matches!(e, DecodeError::MissingType)),
			(b"{\"type\":\"aircraft_data\"}", |e| matches!(e, DecodeError::UnknownType(kind) if kind == "aircraft_data")),
		];

		for (frame, expected) in cases {
			let err = decode(frame).expect_err("frame should be rejected");
			assert!(expected(&err), "unexpected error for {:?}: {err:?}", String::from_utf8_lossy(frame));
		}
	}

	#[test]
	fn wrong_field_types_are_invalid_payloads() {
		let err = decode(br#"{"type":"pong","timestamp":"soon"}"#).unwrap_err();
		assert!(matches!(err, DecodeError::InvalidPayload { ref kind, .. } if kind == "pong"));

		let err = decode(br#"{"type":"pong"}"#).unwrap_err();
		assert!(matches!(err, DecodeError::InvalidPayload { ref kind, .. } if kind == "pong"));

		let err = decode(br#"{"type":"auth_success","clientId":42}"#).unwrap_err();
		assert!(matches!(err, DecodeError::InvalidPayload { ref kind, .. } if kind == "auth_success"));
	}

	#[test]
	fn encodes_auth_frame() {
		let frame = encode(&OutboundMessage::Auth {
			password: "websocket-password".to_string(),
			channel: "EKAB".to_string(),
		});
		let value: Value = serde_json::from_str(&frame).unwrap();
		assert_eq!(
			value,
			json!({"type": "auth", "password": "websocket-password", "channel": "EKAB"})
		);
	}

	#[test]
	fn encodes_ping_and_subscribe_frames() {
		let ping: Value = serde_json::from_str(&encode(&OutboundMessage::Ping { timestamp: 42 })).unwrap();
		assert_eq!(ping, json!({"type": "ping", "timestamp": 42}));

		let subscribe: Value = serde_json::from_str(&encode(&OutboundMessage::Subscribe {
			topic: "plane-tracker".to_string(),
		}))
		.unwrap();
		assert_eq!(subscribe, json!({"type": "subscribe", "topic": "plane-tracker"}));
	}

	#[test]
	fn encoded_tag_matches_kind() {
		let messages = [
			OutboundMessage::Auth {
				password: "p".to_string(),
				channel: "c".to_string(),
			},
			OutboundMessage::Ping { timestamp: 0 },
			OutboundMessage::Subscribe { topic: "t".to_string() },
		];
		for message in messages {
			let value: Value = serde_json::from_str(&encode(&message)).unwrap();
			assert_eq!(value["type"], message.kind());
		}
	}

	mod properties {
		use proptest::prelude::*;
		use serde_json::Map;

		use super::*;

		proptest! {
			#[test]
			fn decode_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
				let _ = decode(&bytes);
			}

			#[test]
			fn unlisted_types_are_unknown(
				kind in "[a-z_]{0,24}".prop_filter("listed type", |kind| !InboundMessage::KNOWN_TYPES.contains(&kind.as_str())),
				extra in proptest::collection::btree_map("[a-zA-Z]{1,8}", any::<String>(), 0..4),
			) {
				let mut object: Map<String, Value> = extra.into_iter().map(|(key, value)| (key, Value::String(value))).collect();
				object.insert("type".to_string(), Value::String(kind.clone()));
				let frame = Value::Object(object).to_string();
				prop_assert_eq!(decode(frame.as_bytes()), Err(DecodeError::UnknownType(kind)));
			}
		}
	}
}
