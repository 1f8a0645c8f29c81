//! Gateway message format
//!
//! Every frame on the socket is a JSON object `{op, t?, s?, d?}`.

use super::{BroadcastPayload, CloseCode, HelloPayload, JoinPayload, OpCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Gateway message format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayMessage {
    /// Operation code
    pub op: OpCode,

    /// Event type (only for op=0 Dispatch)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,

    /// Sequence number (only for op=0 Dispatch)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s: Option<u64>,

    /// Event data payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<Value>,
}

impl GatewayMessage {
    // === Server Messages ===

    /// Create a Dispatch message (op=0)
    #[must_use]
    pub fn dispatch(event_type: impl Into<String>, sequence: u64, data: Value) -> Self {
        Self {
            op: OpCode::Dispatch,
            t: Some(event_type.into()),
            s: Some(sequence),
            d: Some(data),
        }
    }

    /// Create a Hello message (op=10)
    #[must_use]
    pub fn hello(payload: HelloPayload) -> Self {
        Self {
            op: OpCode::Hello,
            t: None,
            s: None,
            d: Some(serde_json::to_value(payload).unwrap_or_default()),
        }
    }

    /// Create a Heartbeat ACK message (op=11)
    #[must_use]
    pub fn heartbeat_ack() -> Self {
        Self {
            op: OpCode::HeartbeatAck,
            t: None,
            s: None,
            d: None,
        }
    }

    // === Client Messages ===

    /// Create a Heartbeat message (op=1)
    #[must_use]
    pub fn heartbeat(last_sequence: Option<u64>) -> Self {
        Self {
            op: OpCode::Heartbeat,
            t: None,
            s: None,
            d: last_sequence.map(|s| Value::Number(s.into())),
        }
    }

    /// Create a Join message (op=2)
    #[must_use]
    pub fn join(payload: JoinPayload) -> Self {
        Self {
            op: OpCode::Join,
            t: None,
            s: None,
            d: Some(serde_json::to_value(payload).unwrap_or_default()),
        }
    }

    /// Create a Broadcast message (op=3)
    #[must_use]
    pub fn broadcast(payload: BroadcastPayload) -> Self {
        Self {
            op: OpCode::Broadcast,
            t: None,
            s: None,
            d: Some(serde_json::to_value(payload).unwrap_or_default()),
        }
    }

    // === Parsing Client Messages ===

    /// Try to parse as a Join payload (op=2); a missing `d` is an empty payload
    pub fn as_join(&self) -> Option<JoinPayload> {
        if self.op != OpCode::Join {
            return None;
        }
        match &self.d {
            None | Some(Value::Null) => Some(JoinPayload::default()),
            Some(d) => serde_json::from_value(d.clone()).ok(),
        }
    }

    /// Try to parse as a Broadcast payload (op=3)
    pub fn as_broadcast(&self) -> Option<BroadcastPayload> {
        if self.op != OpCode::Broadcast {
            return None;
        }
        self.d.as_ref().and_then(|d| serde_json::from_value(d.clone()).ok())
    }

    /// Try to parse the heartbeat sequence number (op=1)
    pub fn as_heartbeat_seq(&self) -> Option<Option<u64>> {
        if self.op != OpCode::Heartbeat {
            return None;
        }
        Some(self.d.as_ref().and_then(Value::as_u64))
    }

    // === Utilities ===

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Code and reason for a close frame
    #[must_use]
    pub fn close_frame(code: CloseCode) -> (u16, String) {
        (code.as_u16(), code.description().to_string())
    }
}

impl std::fmt::Display for GatewayMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(t) = &self.t {
            write!(f, "GatewayMessage(op={}, t={}", self.op, t)?;
            if let Some(s) = self.s {
                write!(f, ", s={s}")?;
            }
            write!(f, ")")
        } else {
            write!(f, "GatewayMessage(op={})", self.op)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confession_core::{BroadcastEvent, PostId};

    #[test]
    fn test_dispatch_message() {
        let msg = GatewayMessage::dispatch("LIKE", 42, serde_json::json!({"newCount": 3}));

        assert_eq!(msg.op, OpCode::Dispatch);
        assert_eq!(msg.t.as_deref(), Some("LIKE"));
        assert_eq!(msg.s, Some(42));

        let json = msg.to_json().unwrap();
        assert!(json.contains(r#""op":0"#));
        assert!(json.contains(r#""s":42"#));
    }

    #[test]
    fn test_hello_message() {
        let msg = GatewayMessage::hello(HelloPayload::with_interval(1_000));
        let json = msg.to_json().unwrap();

        assert!(json.contains(r#""op":10"#));
        assert!(json.contains(r#""heartbeat_interval":1000"#));
        assert!(!json.contains(r#""t""#));
    }

    #[test]
    fn test_heartbeat_ack_has_no_data() {
        let json = GatewayMessage::heartbeat_ack().to_json().unwrap();
        assert_eq!(json, r#"{"op":11}"#);
    }

    #[test]
    fn test_parse_heartbeat() {
        let msg = GatewayMessage::from_json(r#"{"op":1,"d":7}"#).unwrap();
        assert_eq!(msg.as_heartbeat_seq(), Some(Some(7)));

        let msg = GatewayMessage::from_json(r#"{"op":1,"d":null}"#).unwrap();
        assert_eq!(msg.as_heartbeat_seq(), Some(None));
    }

    #[test]
    fn test_parse_join_without_data() {
        let msg = GatewayMessage::from_json(r#"{"op":2}"#).unwrap();
        assert_eq!(msg.as_join().unwrap().self_delivery, None);

        let msg = GatewayMessage::join(JoinPayload {
            self_delivery: Some(true),
        });
        assert_eq!(msg.as_join().unwrap().self_delivery, Some(true));
    }

    #[test]
    fn test_parse_broadcast() {
        let event = BroadcastEvent::like(PostId::generate(), 9);
        let msg = GatewayMessage::broadcast(BroadcastPayload::from_event(&event));
        let parsed = GatewayMessage::from_json(&msg.to_json().unwrap()).unwrap();

        let payload = parsed.as_broadcast().unwrap();
        assert_eq!(payload.into_event().unwrap(), event);
        assert!(parsed.as_join().is_none());
    }

    #[test]
    fn test_invalid_op_is_a_decode_error() {
        assert!(GatewayMessage::from_json(r#"{"op":42}"#).is_err());
        assert!(GatewayMessage::from_json("not json").is_err());
    }

    #[test]
    fn test_display() {
        let msg = GatewayMessage::dispatch("POST_INSERT", 1, Value::Null);
        assert_eq!(msg.to_string(), "GatewayMessage(op=Dispatch (0), t=POST_INSERT, s=1)");
    }
}
