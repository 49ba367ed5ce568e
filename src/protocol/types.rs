//! Tool and capability shapes advertised during `initialize` and `tools/list`

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One advertised meta-tool
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    /// `verify_*` identifier used in `tools/call`
    pub name: String,
    /// Display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Usage text shown to the model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema for `arguments`
    pub input_schema: Value,
    /// Behaviour hints
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<ToolAnnotations>,
}

/// Behaviour hints shown to the client.
///
/// Discovery tools are read-only; `verify_execute` is open-world and may be
/// destructive depending on the endpoint it is pointed at.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolAnnotations {
    /// Never changes tenant state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_only_hint: Option<bool>,
    /// May delete or overwrite tenant data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destructive_hint: Option<bool>,
    /// Talks to the remote tenant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_world_hint: Option<bool>,
}

/// A block of tool output. Every tool here answers with a single JSON text block.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Content {
    /// Serialized tool payload
    Text {
        /// Payload text
        text: String,
    },
}

impl Content {
    /// Wrap a payload string
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

/// `serverInfo` block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Info {
    /// Package name
    pub name: String,
    /// Package version
    pub version: String,
    /// Display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Capabilities announced in the `initialize` result; only tools are offered
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerCapabilities {
    /// Present when tools are served
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolsCapability>,
}

/// The tool set is fixed, so `listChanged` stays false
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsCapability {
    /// Whether `notifications/tools/list_changed` may be sent
    #[serde(default)]
    pub list_changed: bool,
}
