//! Request signing.
//!
//! A signed body is the compact JSON `{"request": <path>, "nonce": <n>, ...}`.
//! The payload header carries that JSON base64-encoded, and the signature
//! header carries hex(HMAC-SHA512(secret, payload)).

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde_json::{Map, Value};
use sha2::Sha512;
use zeroize::Zeroizing;

use crate::error::{GatewayError, GatewayResult};

type HmacSha512 = Hmac<Sha512>;

pub const APIKEY_HEADER: &str = "X-TXC-APIKEY";
pub const PAYLOAD_HEADER: &str = "X-TXC-PAYLOAD";
pub const SIGNATURE_HEADER: &str = "X-TXC-SIGNATURE";

/// One API key/secret pair.
///
/// The secret is wiped on drop and never printed.
#[derive(Clone)]
pub struct Credentials {
    key: String,
    secret: Zeroizing<String>,
}

impl Credentials {
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: Zeroizing::new(secret.into()),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Sign an already serialized request body.
    pub fn sign(&self, body: &str) -> GatewayResult<SignedPayload> {
        let payload = STANDARD.encode(body.as_bytes());
        let mut mac = HmacSha512::new_from_slice(self.secret.as_bytes())
            .map_err(|e| GatewayError::Encode(format!("HMAC key rejected: {e}")))?;
        mac.update(payload.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());

        Ok(SignedPayload {
            body: body.to_string(),
            payload,
            signature,
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("key", &self.key)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Body plus the two derived auth header values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedPayload {
    pub body: String,
    pub payload: String,
    pub signature: String,
}

/// Serialize `{request, nonce, ...fields}` in that key order.
///
/// `fields` must be a JSON object (or null for no extra fields).
pub fn signed_body(path: &str, nonce: u64, fields: &Value) -> GatewayResult<String> {
    let mut body = Map::new();
    body.insert("request".to_string(), Value::String(path.to_string()));
    body.insert("nonce".to_string(), Value::from(nonce));

    match fields {
        Value::Null => {}
        Value::Object(extra) => {
            for (k, v) in extra {
                if k == "request" || k == "nonce" {
                    return Err(GatewayError::Encode(format!("reserved field {k:?}")));
                }
                body.insert(k.clone(), v.clone());
            }
        }
        other => {
            return Err(GatewayError::Encode(format!(
                "request fields must be an object, got {other}"
            )))
        }
    }

    serde_json::to_string(&Value::Object(body)).map_err(|e| GatewayError::Encode(e.to_string()))
}
