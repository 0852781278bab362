// ABOUTME: Built-in diagnostic tools exercising the dispatch path end-to-end
// ABOUTME: Deliberately generic; deployment-specific tools are registered by the embedding binary

use super::registry::{object_schema, ToolDescriptor, ToolError, ToolHandler};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

/// Echoes the provided message back to the caller
pub struct EchoTool;

#[async_trait::async_trait]
impl ToolHandler for EchoTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: "echo".into(),
            description: "Echo the provided message back to the caller".into(),
            input_schema: object_schema(
                json!({
                    "message": {
                        "type": "string",
                        "description": "Message to echo",
                    }
                }),
                &["message"],
            ),
        }
    }

    async fn call(&self, arguments: Value) -> Result<Value, ToolError> {
        let message = arguments
            .get("message")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidArguments("missing 'message' string".into()))?;

        Ok(json!({ "message": message }))
    }
}

/// Reports server identity and uptime
pub struct ServerStatusTool {
    started_at: DateTime<Utc>,
}

impl ServerStatusTool {
    /// Create the tool anchored on the server start time
    #[must_use]
    pub const fn new(started_at: DateTime<Utc>) -> Self {
        Self { started_at }
    }
}

#[async_trait::async_trait]
impl ToolHandler for ServerStatusTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: "server_status".into(),
            description: "Report server name, version, and uptime".into(),
            input_schema: object_schema(json!({}), &[]),
        }
    }

    async fn call(&self, _arguments: Value) -> Result<Value, ToolError> {
        let uptime = Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds();

        Ok(json!({
            "name": crate::constants::protocol::SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION"),
            "uptime_seconds": uptime,
        }))
    }
}
