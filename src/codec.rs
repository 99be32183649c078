//! JSON messages exchanged with the bridge

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::config::DeviceIdentity;

#[derive(Debug, Error)]
#[error("WS JSON parse error: {0}")]
pub struct CodecError(#[from] serde_json::Error);

/// Greeting sent once the session is open
#[derive(Debug, Serialize)]
struct Hello<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    device_id: &'a str,
    location: &'a str,
}

/// What the bridge asks the device to show
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundCommand {
    pub mood: Option<String>,
    pub text: Option<String>,
}

impl InboundCommand {
    pub fn new(mood: Option<&str>, text: Option<&str>) -> Self {
        Self {
            mood: mood.map(str::to_owned),
            text: text.map(str::to_owned),
        }
    }

    /// Neither a mood nor any text
    pub fn is_empty(&self) -> bool {
        self.mood.is_none() && self.text.is_none()
    }
}

/// `{"type":"hello","device_id":..,"location":..}`
pub fn encode_hello(identity: &DeviceIdentity) -> Result<String, CodecError> {
    let hello = Hello {
        kind: "hello",
        device_id: identity.device_id,
        location: identity.location,
    };
    Ok(serde_json::to_string(&hello)?)
}

/// Decode an inbound payload.
///
/// Any well formed JSON is accepted. `mood` and `text` are picked up when they
/// are strings and are otherwise treated as absent.
pub fn decode_command(payload: &str) -> Result<InboundCommand, CodecError> {
    let value: Value = serde_json::from_str(payload)?;
    let field = |name: &str| value.get(name).and_then(Value::as_str).map(str::to_owned);
    Ok(InboundCommand {
        mood: field("mood"),
        text: field("text"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_hello() {
        let identity = DeviceIdentity {
            device_id: "nobu-kitchen",
            location: "kitchen",
        };
        let hello = encode_hello(&identity).unwrap();
        assert_eq!(
            hello,
            r#"{"type":"hello","device_id":"nobu-kitchen","location":"kitchen"}"#
        );
    }

    #[test]
    fn test_encode_hello_escapes() {
        let identity = DeviceIdentity {
            device_id: "say \"hi\"",
            location: "hall",
        };
        let value: Value = serde_json::from_str(&encode_hello(&identity).unwrap()).unwrap();
        assert_eq!(value["device_id"], "say \"hi\"");
    }

    #[test]
    fn test_decode_mood_and_text() {
        let command = decode_command(r#"{"mood":"sad","text":"it is raining"}"#).unwrap();
        assert_eq!(command, InboundCommand::new(Some("sad"), Some("it is raining")));
    }

    #[test]
    fn test_decode_mood_only() {
        let command = decode_command(r#"{"mood":"sad"}"#).unwrap();
        assert_eq!(command.mood.as_deref(), Some("sad"));
        assert_eq!(command.text, None);
    }

    #[test]
    fn test_decode_ignores_non_string_fields() {
        let command = decode_command(r#"{"mood":5,"text":null,"type":"ack"}"#).unwrap();
        assert!(command.is_empty());

        let command = decode_command("[1, 2, 3]").unwrap();
        assert!(command.is_empty());
    }

    #[test]
    fn test_decode_rejects_malformed() {
        for payload in ["", "{", "mood: sad", r#"{"mood":"sad""#, "{'mood':'sad'}"] {
            assert!(decode_command(payload).is_err(), "{payload:?}");
        }
    }
}
