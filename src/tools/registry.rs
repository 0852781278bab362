// ABOUTME: Tool handler trait and name-keyed registry for uniform dispatch
// ABOUTME: Each tool takes a validated JSON arguments object and returns a result or typed error
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Relay Tools

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Tool metadata advertised through `tools/list`
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    /// Unique tool name
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// JSON Schema of the arguments object
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Typed error surface for tool execution
#[derive(Debug, Error)]
pub enum ToolError {
    /// The arguments object did not match the tool's schema
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    /// The tool ran but failed
    #[error("tool execution failed: {0}")]
    Execution(String),
}

/// A named operation dispatchable by the protocol core
#[async_trait::async_trait]
pub trait ToolHandler: Send + Sync {
    /// Tool metadata for discovery
    fn descriptor(&self) -> ToolDescriptor;

    /// Execute the tool with the given arguments
    async fn call(&self, arguments: Value) -> Result<Value, ToolError>;
}

/// Registry of named tools
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool under its descriptor name
    pub fn register(&mut self, tool: Arc<dyn ToolHandler>) {
        let descriptor = tool.descriptor();
        self.tools.insert(descriptor.name, tool);
    }

    /// Look up a tool by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolHandler>> {
        self.tools.get(name).cloned()
    }

    /// Whether a tool with this name exists
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Descriptors of every registered tool
    #[must_use]
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools.values().map(|t| t.descriptor()).collect()
    }

    /// Number of registered tools
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Build an object schema from property definitions
#[must_use]
pub fn object_schema(properties: Value, required: &[&str]) -> Value {
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use serde_json::json;

    struct NoopTool;

    #[async_trait::async_trait]
    impl ToolHandler for NoopTool {
        fn descriptor(&self) -> ToolDescriptor {
            ToolDescriptor {
                name: "noop".into(),
                description: "does nothing".into(),
                input_schema: object_schema(json!({}), &[]),
            }
        }

        async fn call(&self, _arguments: Value) -> Result<Value, ToolError> {
            Ok(json!(null))
        }
    }

    #[tokio::test]
    async fn test_register_and_dispatch() {
        let mut registry = ToolRegistry::new();
        assert!(registry.is_empty());

        registry.register(Arc::new(NoopTool));
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("noop"));

        let tool = registry.get("noop").unwrap();
        let result = tool.call(json!({})).await.unwrap();
        assert_eq!(result, json!(null));
    }

    #[test]
    fn test_descriptor_schema_shape() {
        let schema = object_schema(json!({"message": {"type": "string"}}), &["message"]);
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"][0], "message");
    }
}
