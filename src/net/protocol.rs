use crate::world::events::{Intent, ServerEvent};

/// Parses one `{"event": ..., "data": ...}` client message.
pub fn decode_intent(text: &str) -> Result<Intent, String> {
    serde_json::from_str(text).map_err(|err| format!("malformed intent: {}", err))
}

pub fn encode_event(event: &ServerEvent) -> Result<String, String> {
    serde_json::to_string(event).map_err(|err| format!("event encode failed: {}", err))
}
