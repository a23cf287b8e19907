//! The payload shape that travels inside a frame.

use serde::{Deserialize, Serialize};
use tableforge_events::{Event, Fields};

/// One event as it appears on the wire: the name under the `"event"` key,
/// every field flattened alongside it.
///
/// ```json
/// { "event": "game-event-pawn-moved", "pawn": 7, "pos": [4, 2] }
/// ```
///
/// Deliberately *not* carried: the transport id. It is process-local
/// metadata; the receiving side mints a fresh one when it posts the
/// decoded event onto its own bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireEvent {
    /// The event name.
    #[serde(rename = "event")]
    pub name: String,
    /// The event's fields, flattened into the same map.
    #[serde(flatten)]
    pub fields: Fields,
}

impl WireEvent {
    /// Builds the wire form of a local event (fields are cloned; the
    /// transport id is left behind).
    pub fn from_event(event: &Event) -> Self {
        Self {
            name: event.name().to_string(),
            fields: event.fields().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tableforge_events::{Value, fields};

    #[test]
    fn test_wire_event_flattens_fields_next_to_name() {
        let wire = WireEvent {
            name: "game-event-pawn-moved".into(),
            fields: fields! { "pawn" => 7 },
        };
        let json: serde_json::Value = serde_json::to_value(&wire).unwrap();
        assert_eq!(json["event"], "game-event-pawn-moved");
        assert_eq!(json["pawn"], 7);
    }

    #[test]
    fn test_wire_event_round_trip() {
        let wire = WireEvent {
            name: "game-request-pawn-place".into(),
            fields: fields! { "x" => 4, "y" => 2, "label" => "goblin" },
        };
        let bytes = serde_json::to_vec(&wire).unwrap();
        let back: WireEvent = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, wire);
    }

    #[test]
    fn test_decode_without_event_key_fails() {
        let result: Result<WireEvent, _> =
            serde_json::from_str(r#"{ "pawn": 7 }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_extra_fields_land_in_the_map() {
        let wire: WireEvent =
            serde_json::from_str(r#"{ "event": "x", "a": 1, "b": "two" }"#).unwrap();
        assert_eq!(wire.fields["a"], Value::Int(1));
        assert_eq!(wire.fields["b"], Value::Str("two".into()));
    }
}
