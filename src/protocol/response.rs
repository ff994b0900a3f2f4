//! Typed view of the status JSON.
//!
//! The client returns the server's JSON text untouched; this module is for
//! callers who want fields out of it. Unknown fields are ignored and every
//! field a server may omit is optional.

use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ProtocolError, Result};

/// Check that `json` is a well-formed JSON document.
pub fn verify_json(json: &str) -> Result<()> {
    serde_json::from_str::<IgnoredAny>(json)
        .map(|_| ())
        .map_err(|e| ProtocolError::InvalidStatus(format!("not valid JSON: {e}")))
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerStatus {
    #[serde(default)]
    pub version: Option<Version>,
    #[serde(default)]
    pub players: Option<Players>,
    /// Chat component: a plain string or a `{ "text", "extra" }` tree
    #[serde(default)]
    pub description: Value,
    /// `data:image/png;base64,...`
    #[serde(default)]
    pub favicon: Option<String>,
    #[serde(default)]
    pub enforces_secure_chat: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Version {
    #[serde(default)]
    pub name: String,
    pub protocol: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Players {
    pub max: i64,
    pub online: i64,
    #[serde(default)]
    pub sample: Vec<PlayerSample>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PlayerSample {
    pub name: String,
    pub id: String,
}

impl ServerStatus {
    pub fn parse(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| ProtocolError::InvalidStatus(format!("unexpected status shape: {e}")))
    }

    /// The MOTD with formatting dropped.
    pub fn description_text(&self) -> String {
        let mut out = String::new();
        flatten_chat(&self.description, &mut out);
        out
    }
}

fn flatten_chat(component: &Value, out: &mut String) {
    match component {
        Value::String(text) => out.push_str(text),
        Value::Array(parts) => parts.iter().for_each(|part| flatten_chat(part, out)),
        Value::Object(fields) => {
            if let Some(Value::String(text)) = fields.get("text") {
                out.push_str(text);
            }
            if let Some(extra) = fields.get("extra") {
                flatten_chat(extra, out);
            }
        }
        _ => {}
    }
}
