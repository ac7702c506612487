//! Wire Codec
//!
//! Serializes the typed model into the management API's JSON envelope and
//! back. Absent fields are omitted on encode and stay absent on decode:
//! nothing is defaulted here, since decoded documents are server truth.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{CdnError, Result};
use crate::model::HttpResource;
use crate::schema::http_resource;
use crate::schema::walk::{describe, Policy, Walker};

/// Acknowledgment status meaning the request was accepted
pub const ACCEPTED: &str = "accept";

/// Reply to create, update and deactivate requests
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Acknowledgment {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub task_id: String,
    #[serde(default)]
    pub resource_id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub message: String,
}

impl Acknowledgment {
    pub fn is_accepted(&self) -> bool {
        self.status == ACCEPTED
    }
}

/// Encode a model; absent fields are omitted, empty collections kept
pub fn encode(resource: &HttpResource) -> Result<Vec<u8>> {
    let bytes = serde_json::to_vec(resource)?;
    debug!(bytes = bytes.len(), "Encoded http resource");
    Ok(bytes)
}

/// Partial document that only switches the resource off
pub fn encode_deactivation() -> Result<Vec<u8>> {
    encode(&HttpResource {
        active: Some(false),
        ..Default::default()
    })
}

/// Decode one resource document
pub fn decode(bytes: &[u8]) -> Result<HttpResource> {
    let document = parse(bytes)?;
    decode_value(&document)
}

/// Decode the collection listing
pub fn decode_list(bytes: &[u8]) -> Result<Vec<HttpResource>> {
    match parse(bytes)? {
        Value::Array(items) => items.iter().map(decode_value).collect(),
        other => Err(CdnError::MalformedPayload {
            path: "$".to_string(),
            expected: "array".to_string(),
            actual: describe(&other).to_string(),
        }),
    }
}

/// Decode an acknowledgment envelope
pub fn decode_acknowledgment(bytes: &[u8]) -> Result<Acknowledgment> {
    match parse(bytes)? {
        document @ Value::Object(_) => {
            serde_json::from_value(document).map_err(|e| CdnError::MalformedPayload {
                path: "$".to_string(),
                expected: "acknowledgment envelope".to_string(),
                actual: e.to_string(),
            })
        }
        other => Err(CdnError::MalformedPayload {
            path: "$".to_string(),
            expected: "object".to_string(),
            actual: describe(&other).to_string(),
        }),
    }
}

fn parse(bytes: &[u8]) -> Result<Value> {
    serde_json::from_slice(bytes).map_err(|e| CdnError::MalformedPayload {
        path: "$".to_string(),
        expected: "JSON document".to_string(),
        actual: e.to_string(),
    })
}

fn decode_value(document: &Value) -> Result<HttpResource> {
    let mut walker = Walker::new(Policy::payload());
    let normalized = walker.walk(http_resource(), document)?;
    for warning in walker.into_warnings() {
        debug!(%warning, "Skipped field in server payload");
    }

    serde_json::from_value(normalized).map_err(|e| CdnError::MalformedPayload {
        path: "$".to_string(),
        expected: "http resource".to_string(),
        actual: e.to_string(),
    })
}
