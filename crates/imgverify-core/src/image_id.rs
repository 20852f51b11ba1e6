//! Opaque image identifiers as returned by the upload endpoint.

use serde_json::Value;
use std::fmt;

/// Token the server hands back from `/upload`; the only key accepted by `/download/{id}`.
/// The shape is server-defined; the only local invariant is that it is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageId(String);

impl ImageId {
    /// Wraps an id obtained out of band (e.g. from the command line). Empty ids are rejected.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    /// Parses an upload response body.
    ///
    /// Accepts a bare JSON string (`"3f2a..."`), a bare JSON integer (`42`),
    /// or an envelope object carrying either under `id` (`{"id": "3f2a..."}`).
    pub fn from_json_body(body: &[u8]) -> Result<Self, String> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| format!("upload response is not JSON: {}", e))?;
        match &value {
            Value::Object(map) => match map.get("id") {
                Some(inner) => Self::from_scalar(inner),
                None => Err(format!("upload response object has no \"id\": {}", value)),
            },
            other => Self::from_scalar(other),
        }
    }

    fn from_scalar(value: &Value) -> Result<Self, String> {
        let raw = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) if n.is_u64() || n.is_i64() => n.to_string(),
            other => return Err(format!("unsupported image id: {}", other)),
        };
        Self::new(raw).ok_or_else(|| "upload response carried an empty image id".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
