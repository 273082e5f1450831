//! Venue response envelope.
//!
//! Every venue reply is `{"success": bool, "message": ..., "result": ...}`.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{GatewayError, GatewayResult};
use crate::transport::RawResponse;

#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(default)]
    pub message: Value,
    #[serde(default)]
    pub result: Value,
}

impl Envelope {
    /// Apply the response contract to a raw exchange.
    ///
    /// Non-2xx status, undecodable JSON and `success: false` are each mapped
    /// to their own error.
    pub fn from_response(response: &RawResponse) -> GatewayResult<Self> {
        if !response.is_success() {
            return Err(GatewayError::BadStatus {
                status: response.status,
                body: truncate(&response.body, 256),
            });
        }

        let envelope: Envelope = serde_json::from_str(&response.body)
            .map_err(|e| GatewayError::Decode(format!("invalid envelope: {e}")))?;

        if !envelope.success {
            return Err(GatewayError::Unsuccessful(envelope.message_text()));
        }
        Ok(envelope)
    }

    /// Decode the `result` field.
    pub fn into_result<T: DeserializeOwned>(self) -> GatewayResult<T> {
        serde_json::from_value(self.result)
            .map_err(|e| GatewayError::Decode(format!("invalid result: {e}")))
    }

    fn message_text(&self) -> String {
        match &self.message {
            Value::Null => "UNSUCCESSFUL_REQUEST".to_string(),
            Value::String(s) if s.is_empty() => "UNSUCCESSFUL_REQUEST".to_string(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

fn truncate(body: &str, max: usize) -> String {
    match body.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
