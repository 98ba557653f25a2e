//! Request and response envelopes exchanged over a relay channel

use serde_json::{Map, Value};

/// Payload of a request or response: a JSON object
pub type Payload = Map<String, Value>;

/// Payload key carrying the correlation id (the channel the response is emitted on)
pub const RESPONSE_CHANNEL_KEY: &str = "responseChannel";

/// Payload key marking a failed response
pub const ERROR_KEY: &str = "error";

/// A named request travelling from the renderer to the main side
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub channel: String,
    pub correlation_id: String,
    pub payload: Payload,
}

impl Request {
    /// Build a request from its wire form.
    ///
    /// A caller-supplied `responseChannel` becomes the correlation id and is taken
    /// out of the payload; otherwise a fresh id is generated.
    pub fn from_wire(channel: impl Into<String>, mut payload: Payload) -> Self {
        let channel = channel.into();
        let correlation_id = match payload.remove(RESPONSE_CHANNEL_KEY) {
            Some(Value::String(id)) if !id.is_empty() => id,
            _ => generate_correlation_id(&channel),
        };

        Self {
            channel,
            correlation_id,
            payload,
        }
    }

    /// Wire form: the payload with `responseChannel` put back in
    pub fn into_wire(self) -> (String, Payload) {
        let mut payload = self.payload;
        payload.insert(
            RESPONSE_CHANNEL_KEY.to_string(),
            Value::String(self.correlation_id),
        );
        (self.channel, payload)
    }
}

/// `<channel>_response_<uuid>`; unique among in-flight requests regardless of timing
pub fn generate_correlation_id(channel: &str) -> String {
    format!("{}_response_{}", channel, uuid::Uuid::new_v4().simple())
}

/// Error value of a response, if it carries one (`null` counts as no error)
pub fn response_error(payload: &Payload) -> Option<&Value> {
    payload.get(ERROR_KEY).filter(|v| !v.is_null())
}

/// Response payload for a failure
pub fn error_payload(message: impl Into<String>) -> Payload {
    let mut payload = Payload::new();
    payload.insert(ERROR_KEY.to_string(), Value::String(message.into()));
    payload
}

/// Convert any JSON value into a payload; non-objects are wrapped under `value`
pub fn into_payload(value: Value) -> Payload {
    match value {
        Value::Object(map) => map,
        Value::Null => Payload::new(),
        other => {
            let mut payload = Payload::new();
            payload.insert("value".to_string(), other);
            payload
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_supplied_correlation_id_is_kept() {
        let payload = into_payload(json!({ "responseChannel": "mine", "fingerprint": 7 }));
        let request = Request::from_wire("log_in", payload);

        assert_eq!(request.correlation_id, "mine");
        assert!(!request.payload.contains_key(RESPONSE_CHANNEL_KEY));
        assert_eq!(request.payload["fingerprint"], json!(7));
    }

    #[test]
    fn test_generated_ids_are_prefixed_and_distinct() {
        let a = Request::from_wire("get_dids", Payload::new());
        let b = Request::from_wire("get_dids", Payload::new());

        assert!(a.correlation_id.starts_with("get_dids_response_"));
        assert_ne!(a.correlation_id, b.correlation_id);
    }

    #[test]
    fn test_wire_form_restores_response_channel() {
        let request = Request::from_wire("connect", Payload::new());
        let id = request.correlation_id.clone();
        let (channel, payload) = request.into_wire();

        assert_eq!(channel, "connect");
        assert_eq!(payload[RESPONSE_CHANNEL_KEY], json!(id));
    }

    #[test]
    fn test_null_error_is_not_an_error() {
        let ok = into_payload(json!({ "error": null, "success": true }));
        let failed = into_payload(json!({ "error": "boom" }));

        assert!(response_error(&ok).is_none());
        assert_eq!(response_error(&failed), Some(&json!("boom")));
    }
}
